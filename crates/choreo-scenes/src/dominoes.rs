//! A trigger ball rolls into a line of dominoes; the chain reaction itself
//! is the solver's business, but registration order fixes adjacency so
//! equal-frame dust spawns stay deterministic.

use choreo_core::{
    ActorId, ActorSpec, ChainParams, Channel, ChoreoError, CollisionShape, EffectSpec, Event,
    EventKind, PhysicsParams, Role, SolverConfig, Stage, StageConfig, Vec3,
};

pub const DOMINO_COUNT: usize = 15;
pub const DOMINO_SPACING: f32 = 0.65;
pub const TRIGGER_HANDOFF_FRAME: u32 = 26;
/// Lower bound on frames between successive dominoes being reached.
pub const PROPAGATION_HINT: u32 = 4;

pub struct DominoScene {
    pub stage: Stage,
    pub trigger: ActorId,
    pub dominoes: Vec<ActorId>,
    pub ground: ActorId,
}

pub fn solver_config(seed: u64) -> SolverConfig {
    SolverConfig {
        substeps_per_frame: 10,
        solver_iterations: 20,
        seed,
        ..Default::default()
    }
}

fn dust_spec() -> EffectSpec {
    EffectSpec {
        name: "domino-dust".into(),
        duration: 50,
        particle_count: 40,
        particle_size: 0.02,
        size_random: 0.5,
        normal_factor: 0.1,
        factor_random: 0.5,
        particle_mass: 0.1,
        gravity_weight: 1.0,
        damping: 0.5,
    }
}

/// Build the domino scene. `seed` drives the per-domino mass variance
/// (`0.4 + 0.2 * u`); the same seed always yields the same masses.
pub fn build(seed: u64) -> Result<DominoScene, ChoreoError> {
    let mut stage = Stage::new(StageConfig {
        frame_start: 1,
        frame_end: 180,
        frame_rate: 24.0,
        ..Default::default()
    });

    let ground = stage.register_actor(ActorSpec {
        name: "Ground".into(),
        role: Role::StaticCollider,
        physics: PhysicsParams {
            friction: 0.8,
            shape: CollisionShape::Mesh,
            ..Default::default()
        },
        geometry: Some("primitive://plane?size=20".into()),
        material: Some("material://ground_wood".into()),
        ..Default::default()
    });

    // Dominoes registered left to right: physical adjacency must equal
    // registration order for the chain schedule.
    let mut dominoes = Vec::with_capacity(DOMINO_COUNT);
    for i in 0..DOMINO_COUNT {
        let x = -5.0 + i as f32 * DOMINO_SPACING;
        let id = stage.register_actor(ActorSpec {
            name: format!("Domino_{i:02}"),
            role: Role::PhysicsOnly,
            physics: PhysicsParams {
                mass: 0.5,
                friction: 0.4,
                restitution: 0.1,
                shape: CollisionShape::Box,
                ..Default::default()
            },
            rest_position: Vec3::new(x, 0.0, 1.0),
            rest_scale: Vec3::new(0.3, 0.8, 2.0),
            geometry: Some("primitive://cube".into()),
            material: Some(format!("material://domino_{i:02}")),
            ..Default::default()
        });
        dominoes.push(id);
    }
    stage.apply_mass_jitter(&dominoes, 0.4, 0.2, seed)?;

    let first_x = -5.0;
    let trigger = stage.register_actor(ActorSpec {
        name: "TriggerBall".into(),
        role: Role::ScriptedThenPhysics,
        physics: PhysicsParams {
            mass: 2.0,
            friction: 0.4,
            restitution: 0.5,
            shape: CollisionShape::Sphere,
            ..Default::default()
        },
        rest_position: Vec3::new(first_x - 3.0, 0.0, 1.0),
        geometry: Some("primitive://uv_sphere?radius=0.5".into()),
        material: Some("material://trigger_ball".into()),
        ..Default::default()
    });

    // Horizontal scripted push toward the first domino, then handoff.
    stage.set_kinematic(trigger, true, 1)?;
    stage.add_keyframe(
        trigger,
        Channel::Position,
        1,
        Vec3::new(first_x - 3.0, 0.0, 1.0).into(),
        false,
    )?;
    stage.set_kinematic(trigger, true, 25)?;
    stage.add_keyframe(
        trigger,
        Channel::Position,
        25,
        Vec3::new(first_x - 0.6, 0.0, 1.0).into(),
        false,
    )?;
    stage.set_kinematic(trigger, false, TRIGGER_HANDOFF_FRAME)?;

    stage.schedule_chain(
        &dominoes,
        ChainParams {
            trigger_frame: TRIGGER_HANDOFF_FRAME,
            propagation_hint: PROPAGATION_HINT,
        },
    )?;

    // Dust burst anchored to each domino's earliest-influence frame.
    let impacts: Vec<Event> = stage
        .timeline()
        .events_of_kind(EventKind::Impact)
        .copied()
        .collect();
    for event in impacts {
        stage.schedule_effect(event, dust_spec())?;
    }

    log::info!(
        "domino scene ready: {DOMINO_COUNT} dominoes, trigger handoff at frame {TRIGGER_HANDOFF_FRAME}, seed {seed}"
    );
    Ok(DominoScene {
        stage,
        trigger,
        dominoes,
        ground,
    })
}
