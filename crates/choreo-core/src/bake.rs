//! Bake/cache manager: triggers and memoizes the deterministic physics
//! bake over the declared frame range.
//!
//! The manager never auto-invalidates. Authoring mutations mark the cache
//! dirty and the caller re-invokes `bake`; a stale read is a caller bug
//! made visible through the explicit dirty marker.

use serde::{Deserialize, Serialize};

use crate::actor::Actor;
use crate::error::ChoreoError;
use crate::ids::ActorId;
use crate::schedule::Timeline;
use crate::track::TrackExport;
use crate::value::Vec3;

/// Global solver configuration forwarded to the host.
///
/// Substep and iteration counts are frame-stepped and fixed; any per-actor
/// jitter must be drawn from the explicit `seed`, never an ambient source,
/// so identical inputs always produce bit-identical bakes.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SolverConfig {
    pub gravity: Vec3,
    pub substeps_per_frame: u32,
    pub solver_iterations: u32,
    pub seed: u64,
    /// Positions beyond this magnitude are treated as divergence.
    pub max_position_magnitude: f32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, 0.0, -9.81),
            substeps_per_frame: 10,
            solver_iterations: 20,
            seed: 0,
            max_position_magnitude: 1.0e4,
        }
    }
}

/// Immutable snapshot of everything the bake depends on. Also the cache
/// key domain: two requests with equal serialized form bake identically.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BakeRequest {
    pub actors: Vec<Actor>,
    pub tracks: Vec<TrackExport>,
    pub timeline: Timeline,
    pub solver: SolverConfig,
}

/// Simulated pose for one actor at one frame.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct FramePose {
    pub position: Vec3,
    /// XYZ Euler rotation in radians.
    pub rotation: Vec3,
}

/// Per-frame transforms for one simulated actor, one pose per frame over
/// `[frame_start, frame_end]` inclusive.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BakedMotion {
    pub actor: ActorId,
    pub poses: Vec<FramePose>,
}

/// Result of a completed bake.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BakedSimulation {
    /// Content key of the request this bake was produced from.
    pub key: String,
    pub frame_start: u32,
    pub frame_end: u32,
    pub frame_rate: f32,
    pub motions: Vec<BakedMotion>,
}

/// Host-implemented rigid-body solver seam.
///
/// The host consumes actor physics parameters, scripted tracks, and the
/// solver configuration, and returns baked per-frame transforms for every
/// actor whose role is simulated. The call is blocking and synchronous;
/// there is no mid-bake cancellation.
pub trait RigidBodySolver {
    fn solve(&mut self, request: &BakeRequest) -> Vec<BakedMotion>;
}

/// Content key over the serialized request.
pub fn request_key(request: &BakeRequest) -> String {
    let bytes = serde_json::to_vec(request).unwrap_or_default();
    blake3::hash(&bytes).to_hex().to_string()
}

/// Memoizing bake front-end with an explicit staleness marker.
#[derive(Default, Debug)]
pub struct BakeManager {
    cached: Option<BakedSimulation>,
    dirty: bool,
}

impl BakeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called on every authoring mutation after a bake.
    pub fn mark_dirty(&mut self) {
        if self.cached.is_some() && !self.dirty {
            log::debug!("bake cache marked dirty");
        }
        self.dirty = true;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The cached bake, only while its inputs are unchanged. A dirty cache
    /// is never returned as valid.
    pub fn cached(&self) -> Option<&BakedSimulation> {
        if self.dirty {
            None
        } else {
            self.cached.as_ref()
        }
    }

    /// Run (or reuse) the bake for `request`.
    pub fn bake(
        &mut self,
        solver: &mut dyn RigidBodySolver,
        request: &BakeRequest,
    ) -> Result<&BakedSimulation, ChoreoError> {
        if request.timeline.frame_end < request.timeline.frame_start {
            return Err(ChoreoError::ScheduleOverlap {
                reason: format!(
                    "inverted frame range {}..={}",
                    request.timeline.frame_start, request.timeline.frame_end
                ),
            });
        }
        let key = request_key(request);
        let hit = !self.dirty
            && self
                .cached
                .as_ref()
                .map(|c| c.key == key)
                .unwrap_or(false);
        if !hit {
            log::info!(
                "baking frames {}..={} ({} actors, seed {})",
                request.timeline.frame_start,
                request.timeline.frame_end,
                request.actors.len(),
                request.solver.seed
            );
            let motions = solver.solve(request);
            validate_motions(request, &motions)?;
            self.cached = Some(BakedSimulation {
                key,
                frame_start: request.timeline.frame_start,
                frame_end: request.timeline.frame_end,
                frame_rate: request.timeline.frame_rate,
                motions,
            });
            self.dirty = false;
        }
        match self.cached.as_ref() {
            Some(baked) => Ok(baked),
            None => Err(ChoreoError::SolverDivergence {
                frame: request.timeline.frame_start,
                reason: "bake produced no result".into(),
            }),
        }
    }
}

/// Reject non-finite or out-of-bound poses, missing motions, and frame
/// count mismatches.
fn validate_motions(request: &BakeRequest, motions: &[BakedMotion]) -> Result<(), ChoreoError> {
    let frame_count = (request.timeline.frame_end - request.timeline.frame_start + 1) as usize;
    for actor in request.actors.iter().filter(|a| a.role.is_simulated()) {
        if !motions.iter().any(|m| m.actor == actor.id) {
            return Err(ChoreoError::SolverDivergence {
                frame: request.timeline.frame_start,
                reason: format!("solver returned no motion for simulated actor {:?}", actor.id),
            });
        }
    }
    for motion in motions {
        if motion.poses.len() != frame_count {
            return Err(ChoreoError::SolverDivergence {
                frame: request.timeline.frame_start,
                reason: format!(
                    "motion for actor {:?} has {} poses, expected {}",
                    motion.actor,
                    motion.poses.len(),
                    frame_count
                ),
            });
        }
        for (i, pose) in motion.poses.iter().enumerate() {
            let frame = request.timeline.frame_start + i as u32;
            if !pose.position.is_finite() || !pose.rotation.is_finite() {
                return Err(ChoreoError::SolverDivergence {
                    frame,
                    reason: format!("non-finite pose for actor {:?}", motion.actor),
                });
            }
            let magnitude = pose.position.length();
            if magnitude > request.solver.max_position_magnitude {
                return Err(ChoreoError::SolverDivergence {
                    frame,
                    reason: format!(
                        "position magnitude {magnitude} exceeds bound {} for actor {:?}",
                        request.solver.max_position_magnitude, motion.actor
                    ),
                });
            }
        }
    }
    Ok(())
}
