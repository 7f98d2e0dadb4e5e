//! A ball rolls toward a wall under scripted motion, then the solver takes
//! over one frame after the last scripted key and plays out the collision.

use choreo_core::{
    ActorId, ActorSpec, Channel, ChoreoError, CollisionShape, PhysicsParams, Role, SolverConfig,
    Stage, StageConfig, Vec3,
};

pub const HANDOFF_FRAME: u32 = 21;

pub struct BallScene {
    pub stage: Stage,
    pub ball: ActorId,
    pub obstacle: ActorId,
    pub ground: ActorId,
}

/// Solver settings matching the scenario: 120 steps per second at 24 fps.
pub fn solver_config() -> SolverConfig {
    SolverConfig {
        substeps_per_frame: 5,
        solver_iterations: 20,
        ..Default::default()
    }
}

pub fn build() -> Result<BallScene, ChoreoError> {
    let mut stage = Stage::new(StageConfig {
        frame_start: 1,
        frame_end: 120,
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
        material: Some("material://ground".into()),
        ..Default::default()
    });

    let obstacle = stage.register_actor(ActorSpec {
        name: "Obstacle".into(),
        role: Role::StaticCollider,
        physics: PhysicsParams {
            friction: 0.5,
            restitution: 0.3,
            shape: CollisionShape::Box,
            ..Default::default()
        },
        rest_position: Vec3::new(0.0, 0.0, 2.0),
        rest_scale: Vec3::new(2.0, 2.0, 4.0),
        geometry: Some("primitive://cube".into()),
        material: Some("material://obstacle".into()),
        ..Default::default()
    });

    let ball = stage.register_actor(ActorSpec {
        name: "Ball".into(),
        role: Role::ScriptedThenPhysics,
        physics: PhysicsParams {
            mass: 2.0,
            friction: 0.5,
            restitution: 0.8,
            shape: CollisionShape::Sphere,
            ..Default::default()
        },
        rest_position: Vec3::new(-8.0, 0.0, 1.0),
        geometry: Some("primitive://uv_sphere?radius=1".into()),
        material: Some("material://ball_striped".into()),
        ..Default::default()
    });

    // Scripted approach: two pose keys, kinematic flag held through both.
    stage.set_kinematic(ball, true, 1)?;
    stage.add_keyframe(ball, Channel::Position, 1, Vec3::new(-8.0, 0.0, 3.0).into(), false)?;
    stage.add_keyframe(ball, Channel::Rotation, 1, Vec3::ZERO.into(), false)?;
    stage.set_kinematic(ball, true, 20)?;
    stage.add_keyframe(ball, Channel::Position, 20, Vec3::new(-2.0, 0.0, 1.5).into(), false)?;
    stage.add_keyframe(
        ball,
        Channel::Rotation,
        20,
        Vec3::new(std::f32::consts::PI, 0.0, 0.0).into(),
        false,
    )?;

    // Single authoritative cutover to the solver.
    stage.set_kinematic(ball, false, HANDOFF_FRAME)?;

    log::info!("ball scene ready: handoff at frame {HANDOFF_FRAME}");
    Ok(BallScene {
        stage,
        ball,
        obstacle,
        ground,
    })
}
