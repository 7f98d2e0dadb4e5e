//! Error types for choreography authoring and baking.

use serde::{Deserialize, Serialize};

use crate::ids::ActorId;
use crate::track::Channel;

/// Errors surfaced by authoring and bake operations.
///
/// All variants are fatal to the current authoring/bake run; none are
/// retried automatically. The caller corrects the schedule, tracks, or
/// configuration and re-invokes.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ChoreoError {
    /// Event-timing conflict (e.g. projectile impact windows would interleave).
    #[error("schedule overlap: {reason}")]
    ScheduleOverlap { reason: String },

    /// Duplicate sample at a frame without `replace`.
    #[error("duplicate keyframe on {channel:?} of actor {actor:?} at frame {frame}")]
    DuplicateKeyframe {
        actor: ActorId,
        channel: Channel,
        frame: u32,
    },

    /// Sample inserted below the channel's current tail frame.
    #[error(
        "out-of-order keyframe on {channel:?} of actor {actor:?}: frame {frame} after {last}"
    )]
    OutOfOrderKeyframe {
        actor: ActorId,
        channel: Channel,
        frame: u32,
        last: u32,
    },

    /// Scripted write to a channel after its authority transferred.
    #[error("authority conflict on actor {actor:?}: {reason}")]
    AuthorityConflict { actor: ActorId, reason: String },

    /// Bake produced non-finite or out-of-bound state.
    #[error("solver divergence at frame {frame}: {reason}")]
    SolverDivergence { frame: u32, reason: String },

    /// An operation referenced an unregistered actor.
    #[error("missing dependency: actor {actor:?} is not registered")]
    MissingDependency { actor: ActorId },
}

impl ChoreoError {
    /// Error category for logging.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::ScheduleOverlap { .. } => "schedule",
            Self::DuplicateKeyframe { .. } | Self::OutOfOrderKeyframe { .. } => "track",
            Self::AuthorityConflict { .. } => "authority",
            Self::SolverDivergence { .. } => "bake",
            Self::MissingDependency { .. } => "registry",
        }
    }
}
