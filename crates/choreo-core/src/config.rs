//! Stage configuration.

use serde::{Deserialize, Serialize};

/// Frame range and sizing hints for a choreography stage.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct StageConfig {
    pub frame_start: u32,
    pub frame_end: u32,
    pub frame_rate: f32,

    /// Initial capacity hints.
    pub actor_capacity: usize,
    pub event_capacity: usize,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            frame_start: 1,
            frame_end: 250,
            frame_rate: 24.0,
            actor_capacity: 32,
            event_capacity: 256,
        }
    }
}
