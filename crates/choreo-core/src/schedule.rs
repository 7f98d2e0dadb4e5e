//! Timeline scheduler: computes event frames for one or many actors from
//! global spacing parameters and validates that nothing overlaps.
//!
//! Cross-actor ordering at equal frames is resolved by stable registration
//! order; this is what makes effect spawning deterministic when two actors
//! reach a threshold on the same frame.

use serde::{Deserialize, Serialize};

use crate::actor::ActorRegistry;
use crate::error::ChoreoError;
use crate::ids::ActorId;
use crate::value::Vec3;

/// Discrete choreography events.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    /// Script hands transform authority to the solver.
    HandoffToPhysics,
    /// Script (re)takes authority: projectile launch or a terminal override.
    HandoffToScripted,
    /// Earliest frame an actor is struck / influenced.
    Impact,
    /// Anchor frame for an ephemeral reactive effect.
    EffectSpawn,
}

/// Optional event payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    #[default]
    None,
    /// Aim angle in radians (turret tracking).
    AimAngle(f32),
    /// Explicit spawn location overriding track lookup.
    Location(Vec3),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub frame: u32,
    pub kind: EventKind,
    pub actor: ActorId,
    #[serde(default)]
    pub payload: EventPayload,
}

/// Declared frame range plus the ordered event list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Timeline {
    pub frame_start: u32,
    pub frame_end: u32,
    pub frame_rate: f32,
    pub events: Vec<Event>,
}

impl Timeline {
    pub fn new(frame_start: u32, frame_end: u32, frame_rate: f32) -> Self {
        Self {
            frame_start,
            frame_end,
            frame_rate,
            events: Vec::new(),
        }
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Stable order: by frame, ties broken by actor registration order.
    pub fn sort_by_registration(&mut self, registry: &ActorRegistry) {
        self.events.sort_by_key(|e| {
            (
                e.frame,
                registry.index_of(e.actor).unwrap_or(usize::MAX),
            )
        });
    }

    pub fn events_of_kind(&self, kind: EventKind) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |e| e.kind == kind)
    }
}

/// Periodic multi-actor choreography: N projectiles fired at fixed
/// intervals, each reaching its target after `flight_duration` frames.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PeriodicParams {
    pub start_frame: u32,
    pub interval: u32,
    pub flight_duration: u32,
}

/// Linear chain of triggerable actors. Individual collision times are the
/// solver's business; the scheduler only fixes each actor's earliest
/// possible influence frame.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ChainParams {
    /// Frame the chain trigger hands off to physics.
    pub trigger_frame: u32,
    /// Lower-bound frames between successive actors being reached.
    pub propagation_hint: u32,
}

/// Plan fire/impact/effect events for `(projectile, target)` pairs.
///
/// `fire[i] = start + i * interval`, `impact[i] = fire[i] + flight_duration`.
/// Requires `interval >= flight_duration` so impact-processing windows of
/// successive projectiles never interleave.
pub fn plan_periodic(
    registry: &ActorRegistry,
    pairs: &[(ActorId, ActorId)],
    params: PeriodicParams,
) -> Result<Vec<Event>, ChoreoError> {
    if params.interval < params.flight_duration {
        return Err(ChoreoError::ScheduleOverlap {
            reason: format!(
                "interval {} is shorter than flight duration {}; impact windows would interleave",
                params.interval, params.flight_duration
            ),
        });
    }
    let mut events = Vec::with_capacity(pairs.len() * 3);
    for (i, &(projectile, target)) in pairs.iter().enumerate() {
        registry.ensure(projectile)?;
        registry.ensure(target)?;
        let fire = params.start_frame + i as u32 * params.interval;
        let impact = fire + params.flight_duration;
        events.push(Event {
            frame: fire,
            kind: EventKind::HandoffToScripted,
            actor: projectile,
            payload: EventPayload::None,
        });
        events.push(Event {
            frame: impact,
            kind: EventKind::Impact,
            actor: target,
            payload: EventPayload::None,
        });
        events.push(Event {
            frame: impact,
            kind: EventKind::EffectSpawn,
            actor: target,
            payload: EventPayload::None,
        });
    }
    log::debug!(
        "planned periodic schedule: {} pairs, interval {}, flight {}",
        pairs.len(),
        params.interval,
        params.flight_duration
    );
    Ok(events)
}

/// Plan earliest-influence events for a linear chain.
///
/// The chain slice must follow registration order: tie-breaking at equal
/// frames is by registration order, so adjacency and registration must
/// agree for spawn determinism.
pub fn plan_chain(
    registry: &ActorRegistry,
    chain: &[ActorId],
    params: ChainParams,
) -> Result<Vec<Event>, ChoreoError> {
    let mut prev_index: Option<usize> = None;
    for &actor in chain {
        registry.ensure(actor)?;
        let index = registry.index_of(actor).unwrap_or(usize::MAX);
        if let Some(prev) = prev_index {
            if index <= prev {
                return Err(ChoreoError::ScheduleOverlap {
                    reason: format!(
                        "chain order must match registration order (actor {actor:?} out of place)"
                    ),
                });
            }
        }
        prev_index = Some(index);
    }
    let events = chain
        .iter()
        .enumerate()
        .map(|(i, &actor)| Event {
            frame: params.trigger_frame + i as u32 * params.propagation_hint,
            kind: EventKind::Impact,
            actor,
            payload: EventPayload::None,
        })
        .collect();
    log::debug!(
        "planned chain schedule: {} actors from frame {}",
        chain.len(),
        params.trigger_frame
    );
    Ok(events)
}
