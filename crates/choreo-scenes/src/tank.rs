//! A tank fires timed missiles at a row of targets. Missiles fly under
//! scripted motion, hand off to the solver right after impact, and are
//! then collapsed to dust by a terminal scale override; the periodic
//! scheduler fixes the fire and impact frames everything anchors to.

use choreo_core::{
    ActorId, ActorSpec, Channel, ChoreoError, CollisionShape, EffectSpec, Event, EventKind,
    PeriodicParams, PhysicsParams, Role, SceneGraph, SolverConfig, Stage, StageConfig, Transform,
    Vec3,
};

pub const TARGET_COUNT: usize = 5;
pub const FIRE_START: u32 = 1;
pub const FIRE_INTERVAL: u32 = 50;
pub const FLIGHT_DURATION: u32 = 30;
/// Turret starts tracking this many frames before each shot.
pub const AIM_LEAD: u32 = 10;

const TANK_Y: f32 = -10.0;

pub struct TankScene {
    pub stage: Stage,
    pub graph: SceneGraph,
    pub body: ActorId,
    pub turret: ActorId,
    pub barrel: ActorId,
    pub targets: Vec<ActorId>,
    pub missiles: Vec<ActorId>,
}

pub fn solver_config() -> SolverConfig {
    SolverConfig {
        substeps_per_frame: 10,
        solver_iterations: 20,
        ..Default::default()
    }
}

/// World position of target `i`: an arc from -60 to +60 degrees, 15 units out.
fn target_position(i: usize) -> Vec3 {
    let angle = (-60.0 + i as f32 * 30.0).to_radians();
    Vec3::new(15.0 * angle.sin(), 15.0 * angle.cos(), 1.5)
}

fn rig_part(name: &str, geometry: &str, material: &str) -> ActorSpec {
    ActorSpec {
        name: name.into(),
        role: Role::StaticCollider,
        physics: PhysicsParams::default(),
        geometry: Some(geometry.into()),
        material: Some(material.into()),
        ..Default::default()
    }
}

pub fn build() -> Result<TankScene, ChoreoError> {
    let mut stage = Stage::new(StageConfig {
        frame_start: 1,
        frame_end: 300,
        frame_rate: 24.0,
        ..Default::default()
    });

    let _ground = stage.register_actor(ActorSpec {
        name: "Ground".into(),
        role: Role::StaticCollider,
        physics: PhysicsParams {
            friction: 0.8,
            shape: CollisionShape::Mesh,
            ..Default::default()
        },
        geometry: Some("primitive://plane?size=50".into()),
        material: Some("material://ground".into()),
        ..Default::default()
    });

    // Tank rig: turret and barrel carry offsets relative to the hull so a
    // hull move or turn carries the whole rig.
    let mut graph = SceneGraph::new();
    let body = stage.register_actor(ActorSpec {
        rest_position: Vec3::new(0.0, TANK_Y, 0.75),
        rest_scale: Vec3::new(3.0, 4.0, 1.5),
        ..rig_part("TankBody", "primitive://cube", "material://tank_body")
    });
    let body_node = graph.add_root(
        body,
        Transform::from_translation(Vec3::new(0.0, TANK_Y, 0.75)),
    );
    let turret = stage.register_actor(ActorSpec {
        rest_position: Vec3::new(0.0, TANK_Y, 2.0),
        ..rig_part(
            "TankTurret",
            "primitive://cylinder?radius=1.2&depth=1",
            "material://tank_turret",
        )
    });
    let turret_node = graph.add_child(
        body_node,
        turret,
        Transform::from_translation(Vec3::new(0.0, 0.0, 1.25)),
    );
    let barrel = stage.register_actor(ActorSpec {
        rest_position: Vec3::new(0.0, TANK_Y + 2.0, 2.0),
        ..rig_part(
            "TankBarrel",
            "primitive://cylinder?radius=0.3&depth=4",
            "material://tank_barrel",
        )
    });
    graph.add_child(
        turret_node,
        barrel,
        Transform::from_translation(Vec3::new(0.0, 2.0, 0.0)),
    );
    for (name, x) in [("LeftTrack", -1.8f32), ("RightTrack", 1.8f32)] {
        let track = stage.register_actor(ActorSpec {
            rest_position: Vec3::new(x, TANK_Y, 0.4),
            rest_scale: Vec3::new(0.5, 4.5, 0.8),
            ..rig_part(name, "primitive://cube", "material://tank_track")
        });
        graph.add_child(
            body_node,
            track,
            Transform::from_translation(Vec3::new(x, 0.0, -0.35)),
        );
    }

    let mut targets = Vec::with_capacity(TARGET_COUNT);
    for i in 0..TARGET_COUNT {
        let id = stage.register_actor(ActorSpec {
            name: format!("Target_{}", i + 1),
            role: Role::StaticCollider,
            physics: PhysicsParams {
                friction: 0.4,
                restitution: 0.1,
                shape: CollisionShape::Box,
                ..Default::default()
            },
            rest_position: target_position(i),
            rest_scale: Vec3::new(2.0, 2.0, 3.0),
            geometry: Some("primitive://cube".into()),
            material: Some(format!("material://target_{}", i + 1)),
            ..Default::default()
        });
        targets.push(id);
    }

    let mut missiles = Vec::with_capacity(TARGET_COUNT);
    for i in 0..TARGET_COUNT {
        let start = missile_start(i);
        let id = stage.register_actor(ActorSpec {
            name: format!("Missile_{}", i + 1),
            role: Role::ScriptedThenPhysics,
            physics: PhysicsParams {
                mass: 0.5,
                friction: 0.3,
                shape: CollisionShape::ConvexHull,
                ..Default::default()
            },
            rest_position: start,
            geometry: Some("primitive://cylinder?radius=0.2&depth=1.5".into()),
            material: Some("material://missile".into()),
            ..Default::default()
        });
        missiles.push(id);
    }

    let pairs: Vec<(ActorId, ActorId)> = missiles
        .iter()
        .copied()
        .zip(targets.iter().copied())
        .collect();
    stage.schedule_periodic(
        &pairs,
        PeriodicParams {
            start_frame: FIRE_START,
            interval: FIRE_INTERVAL,
            flight_duration: FLIGHT_DURATION,
        },
    )?;

    for i in 0..TARGET_COUNT {
        let fire = FIRE_START + i as u32 * FIRE_INTERVAL;
        let impact = fire + FLIGHT_DURATION;
        let target_pos = target_position(i);

        // Turret swings from rest to the firing solution; the reset key is
        // skipped for the first shot, which fires on the opening frame.
        let aim = -(target_pos.x).atan2(target_pos.y - TANK_Y);
        if fire > AIM_LEAD {
            stage.add_keyframe(turret, Channel::Rotation, fire - AIM_LEAD, Vec3::ZERO.into(), false)?;
        }
        stage.add_keyframe(
            turret,
            Channel::Rotation,
            fire,
            Vec3::new(0.0, 0.0, aim).into(),
            false,
        )?;

        // Scripted flight from barrel to target, then the solver takes the
        // missile for the impact response; the scale collapse right after
        // is its terminal override.
        let missile = missiles[i];
        stage.set_kinematic(missile, true, fire)?;
        stage.add_keyframe(missile, Channel::Position, fire, missile_start(i).into(), false)?;
        stage.add_keyframe(missile, Channel::Scale, fire, Vec3::ONE.into(), false)?;
        stage.add_keyframe(missile, Channel::Position, impact, target_pos.into(), false)?;
        stage.set_kinematic(missile, false, impact + 1)?;
        stage.add_keyframe(missile, Channel::Scale, impact + 1, Vec3::splat(0.01).into(), false)?;

        // Target holds full size through impact, then collapses to dust.
        let target = targets[i];
        stage.add_keyframe(
            target,
            Channel::Scale,
            impact,
            Vec3::new(2.0, 2.0, 3.0).into(),
            false,
        )?;
        stage.add_keyframe(target, Channel::Scale, impact + 1, Vec3::splat(0.01).into(), false)?;
    }

    let spawns: Vec<Event> = stage
        .timeline()
        .events_of_kind(EventKind::EffectSpawn)
        .copied()
        .collect();
    for event in spawns {
        stage.schedule_effect(event, EffectSpec::default())?;
    }

    log::info!("tank scene ready: {TARGET_COUNT} shots every {FIRE_INTERVAL} frames");
    Ok(TankScene {
        stage,
        graph,
        body,
        turret,
        barrel,
        targets,
        missiles,
    })
}

/// Missiles spawn near the barrel tip, nudged toward their target.
fn missile_start(i: usize) -> Vec3 {
    let target = target_position(i);
    Vec3::new(target.x * 0.1, TANK_Y + 4.0, 2.25)
}
