//! Reference choreographies built on choreo-core.
//!
//! Three scenarios share one pattern: build actors, assign physics roles,
//! emit keyframed authority transitions, schedule reactive effects, and
//! hand the snapshot to the host solver for one deterministic bake.

pub mod ball;
pub mod dominoes;
pub mod tank;
