//! Stage: data ownership and the public authoring API.
//!
//! Every operation takes explicit actor ids and frame numbers; there is no
//! current-frame cursor and no active-object addressing, so call order
//! never changes meaning. Authoring strictly precedes the single blocking
//! bake pass.

use crate::actor::{Actor, ActorRegistry, ActorSpec};
use crate::authority::{AuthorityState, HandoffController, HandoffTransition};
use crate::bake::{BakeManager, BakeRequest, BakedSimulation, RigidBodySolver, SolverConfig};
use crate::config::StageConfig;
use crate::effects::{EffectInstance, EffectSpawner, EffectSpec};
use crate::error::ChoreoError;
use crate::ids::{ActorId, EffectId, IdAllocator};
use crate::rng::XorShift64;
use crate::schedule::{
    plan_chain, plan_periodic, ChainParams, Event, EventKind, EventPayload, PeriodicParams,
    Timeline,
};
use crate::track::{Channel, KeyframeTrack, TrackStore};
use crate::value::ChannelValue;

/// Owns registry, tracks, authority states, timeline, effects, and the
/// bake cache for one choreography.
#[derive(Debug)]
pub struct Stage {
    cfg: StageConfig,
    ids: IdAllocator,
    registry: ActorRegistry,
    tracks: TrackStore,
    authority: HandoffController,
    timeline: Timeline,
    effects: EffectSpawner,
    bake: BakeManager,
}

impl Stage {
    pub fn new(cfg: StageConfig) -> Self {
        let mut timeline = Timeline::new(cfg.frame_start, cfg.frame_end, cfg.frame_rate);
        timeline.events.reserve(cfg.event_capacity);
        Self {
            registry: ActorRegistry::with_capacity(cfg.actor_capacity),
            cfg,
            ids: IdAllocator::new(),
            tracks: TrackStore::new(),
            authority: HandoffController::new(),
            timeline,
            effects: EffectSpawner::new(),
            bake: BakeManager::new(),
        }
    }

    pub fn config(&self) -> &StageConfig {
        &self.cfg
    }

    /// Register a choreographed actor. Registration order is permanent and
    /// drives equal-frame event ordering.
    pub fn register_actor(&mut self, spec: ActorSpec) -> ActorId {
        let id = self.ids.alloc_actor();
        log::debug!("registered actor {:?} ({}) as {:?}", id, spec.name, spec.role);
        self.registry.insert(Actor {
            id,
            name: spec.name,
            role: spec.role,
            physics: spec.physics,
            rest_position: spec.rest_position,
            rest_scale: spec.rest_scale,
            geometry: spec.geometry,
            material: spec.material,
        });
        self.bake.mark_dirty();
        id
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.registry.get(id)
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.registry.iter()
    }

    pub fn authority_state(&self, actor: ActorId) -> AuthorityState {
        self.authority.state(actor)
    }

    pub fn track(&self, actor: ActorId, channel: Channel) -> Option<&KeyframeTrack> {
        self.tracks.track(actor, channel)
    }

    /// Insert a scripted keyframe sample.
    ///
    /// The kinematic channel is written through `set_kinematic`, never
    /// directly. A non-pose write on a simulated actor becomes its
    /// terminal ScriptedOverride and emits a HandoffToScripted event.
    pub fn add_keyframe(
        &mut self,
        actor: ActorId,
        channel: Channel,
        frame: u32,
        value: ChannelValue,
        replace: bool,
    ) -> Result<(), ChoreoError> {
        self.registry.ensure(actor)?;
        if channel == Channel::Kinematic {
            return Err(ChoreoError::AuthorityConflict {
                actor,
                reason: "kinematic flag keyframes go through set_kinematic".into(),
            });
        }
        self.authority.ensure_writable(actor, channel)?;
        let was_simulated = self.authority.state(actor) == AuthorityState::Simulated;
        self.tracks.add_sample(actor, channel, frame, value, replace)?;
        if channel.is_pose() {
            self.authority.note_scripted_write(actor);
        } else if was_simulated && self.authority.mark_override(actor) {
            self.timeline.push(Event {
                frame,
                kind: EventKind::HandoffToScripted,
                actor,
                payload: EventPayload::None,
            });
            self.timeline.sort_by_registration(&self.registry);
        }
        self.bake.mark_dirty();
        Ok(())
    }

    /// Write a kinematic-flag keyframe: the discrete authority cutover.
    ///
    /// `flag = false` at `frame` is the handoff to the solver; it must
    /// strictly follow the last scripted pose keyframe and every previous
    /// flag keyframe.
    pub fn set_kinematic(
        &mut self,
        actor: ActorId,
        flag: bool,
        frame: u32,
    ) -> Result<(), ChoreoError> {
        self.registry.ensure(actor)?;
        let last_flag = self
            .tracks
            .track(actor, Channel::Kinematic)
            .and_then(|t| t.last_frame());
        let last_pose = self.tracks.last_pose_frame(actor);
        let transition = self
            .authority
            .set_kinematic(actor, flag, frame, last_flag, last_pose)?;
        self.tracks
            .add_sample(actor, Channel::Kinematic, frame, ChannelValue::Flag(flag), false)?;
        match transition {
            HandoffTransition::ToSimulated => {
                log::debug!("actor {:?} hands off to physics at frame {}", actor, frame);
                self.timeline.push(Event {
                    frame,
                    kind: EventKind::HandoffToPhysics,
                    actor,
                    payload: EventPayload::None,
                });
                self.timeline.sort_by_registration(&self.registry);
            }
            HandoffTransition::ToScriptedOverride => {
                self.timeline.push(Event {
                    frame,
                    kind: EventKind::HandoffToScripted,
                    actor,
                    payload: EventPayload::None,
                });
                self.timeline.sort_by_registration(&self.registry);
            }
            HandoffTransition::None => {}
        }
        self.bake.mark_dirty();
        Ok(())
    }

    /// Plan a periodic fire/impact schedule over `(projectile, target)`
    /// pairs and merge it into the timeline.
    pub fn schedule_periodic(
        &mut self,
        pairs: &[(ActorId, ActorId)],
        params: PeriodicParams,
    ) -> Result<&Timeline, ChoreoError> {
        let events = plan_periodic(&self.registry, pairs, params)?;
        self.timeline.events.extend(events);
        self.timeline.sort_by_registration(&self.registry);
        self.bake.mark_dirty();
        Ok(&self.timeline)
    }

    /// Plan earliest-influence events for a linear chain and merge them
    /// into the timeline.
    pub fn schedule_chain(
        &mut self,
        chain: &[ActorId],
        params: ChainParams,
    ) -> Result<&Timeline, ChoreoError> {
        let events = plan_chain(&self.registry, chain, params)?;
        self.timeline.events.extend(events);
        self.timeline.sort_by_registration(&self.registry);
        self.bake.mark_dirty();
        Ok(&self.timeline)
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Anchor an effect to a schedule event.
    pub fn schedule_effect(
        &mut self,
        event: Event,
        spec: EffectSpec,
    ) -> Result<EffectId, ChoreoError> {
        self.effects
            .schedule_effect(&mut self.ids, &self.registry, &self.tracks, &event, spec)
    }

    pub fn effects(&self) -> &[EffectInstance] {
        self.effects.instances()
    }

    pub fn effects_active_at(&self, frame: u32) -> impl Iterator<Item = &EffectInstance> {
        self.effects.active_at(frame)
    }

    /// Seeded per-actor mass variance: `mass = base + variance * u`,
    /// `u ∈ [0, 1)` drawn per actor in slice order from `seed`.
    pub fn apply_mass_jitter(
        &mut self,
        actors: &[ActorId],
        base: f32,
        variance: f32,
        seed: u64,
    ) -> Result<(), ChoreoError> {
        let mut rng = XorShift64::new(seed);
        for &id in actors {
            self.registry.ensure(id)?;
            let mass = base + variance * rng.next_f32();
            if let Some(actor) = self.registry.get_mut(id) {
                actor.physics.mass = mass;
            }
        }
        self.bake.mark_dirty();
        Ok(())
    }

    /// Snapshot everything the bake depends on, in stable order.
    pub fn snapshot(&self, solver: SolverConfig) -> BakeRequest {
        BakeRequest {
            actors: self.registry.iter().cloned().collect(),
            tracks: self.tracks.export_ordered(&self.registry.ids_in_order()),
            timeline: self.timeline.clone(),
            solver,
        }
    }

    /// Run the blocking bake through the host solver and memoize the
    /// result. Deterministic for identical snapshots.
    pub fn bake(
        &mut self,
        solver: &mut dyn RigidBodySolver,
        config: SolverConfig,
    ) -> Result<&BakedSimulation, ChoreoError> {
        let request = self.snapshot(config);
        self.bake.bake(solver, &request)
    }

    /// The memoized bake, absent whenever inputs changed after it ran.
    pub fn baked(&self) -> Option<&BakedSimulation> {
        self.bake.cached()
    }

    /// Explicit staleness marker: true whenever actors, tracks, schedule,
    /// or jitter changed after the last bake.
    pub fn is_dirty(&self) -> bool {
        self.bake.is_dirty()
    }
}
