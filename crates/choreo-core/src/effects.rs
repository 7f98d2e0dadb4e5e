//! Effect spawner: ephemeral reactive effects anchored to schedule events.
//!
//! Instances are independent; there is no shared particle budget or
//! throttling across concurrently active effects.

use serde::{Deserialize, Serialize};

use crate::actor::ActorRegistry;
use crate::error::ChoreoError;
use crate::ids::{ActorId, EffectId, IdAllocator};
use crate::schedule::{Event, EventPayload};
use crate::track::{Channel, TrackStore};
use crate::value::Vec3;

/// Particle parameters for a dust-style burst, forwarded to the host.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EffectSpec {
    pub name: String,
    /// Lifetime window length in frames.
    pub duration: u32,
    pub particle_count: u32,
    pub particle_size: f32,
    pub size_random: f32,
    pub normal_factor: f32,
    pub factor_random: f32,
    pub particle_mass: f32,
    pub gravity_weight: f32,
    pub damping: f32,
}

impl Default for EffectSpec {
    fn default() -> Self {
        Self {
            name: "dust".into(),
            duration: 30,
            particle_count: 100,
            particle_size: 0.15,
            size_random: 0.5,
            normal_factor: 2.0,
            factor_random: 1.5,
            particle_mass: 0.1,
            gravity_weight: 0.5,
            damping: 0.5,
        }
    }
}

/// A scheduled effect instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EffectInstance {
    pub id: EffectId,
    pub actor: ActorId,
    pub frame: u32,
    pub location: Vec3,
    pub spec: EffectSpec,
}

impl EffectInstance {
    /// Lifetime window `[frame, frame + duration]`, inclusive.
    #[inline]
    pub fn window(&self) -> (u32, u32) {
        (self.frame, self.frame + self.spec.duration)
    }

    #[inline]
    pub fn active_at(&self, frame: u32) -> bool {
        let (start, end) = self.window();
        frame >= start && frame <= end
    }
}

/// Collects scheduled effect instances in spawn order.
#[derive(Default, Debug)]
pub struct EffectSpawner {
    instances: Vec<EffectInstance>,
}

impl EffectSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchor an effect at the trigger event's frame and the target actor's
    /// location at that frame (explicit payload location, else the last
    /// scripted position at or before the frame, else the rest position).
    pub fn schedule_effect(
        &mut self,
        ids: &mut IdAllocator,
        registry: &ActorRegistry,
        tracks: &TrackStore,
        event: &Event,
        spec: EffectSpec,
    ) -> Result<EffectId, ChoreoError> {
        let actor = registry.ensure(event.actor)?;
        let location = match event.payload {
            EventPayload::Location(loc) => loc,
            _ => tracks
                .track(actor.id, Channel::Position)
                .and_then(|t| t.sample_at_or_before(event.frame))
                .and_then(|k| k.value.as_vec3())
                .unwrap_or(actor.rest_position),
        };
        let id = ids.alloc_effect();
        log::debug!(
            "effect {:?} ({}) anchored to actor {:?} at frame {}",
            id,
            spec.name,
            actor.id,
            event.frame
        );
        self.instances.push(EffectInstance {
            id,
            actor: actor.id,
            frame: event.frame,
            location,
            spec,
        });
        Ok(id)
    }

    #[inline]
    pub fn instances(&self) -> &[EffectInstance] {
        &self.instances
    }

    pub fn active_at(&self, frame: u32) -> impl Iterator<Item = &EffectInstance> {
        self.instances.iter().filter(move |e| e.active_at(frame))
    }
}
