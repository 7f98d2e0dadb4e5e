use approx::assert_abs_diff_eq;
use choreo_core::{
    AuthorityState, BakeRequest, BakedMotion, Channel, ChannelValue, EventKind, FramePose,
    RigidBodySolver, Vec3,
};
use choreo_scenes::{ball, dominoes, tank};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Deterministic stand-in for a host physics backend.
struct FallSolver;

impl RigidBodySolver for FallSolver {
    fn solve(&mut self, request: &BakeRequest) -> Vec<BakedMotion> {
        let frames =
            (request.timeline.frame_end - request.timeline.frame_start + 1) as usize;
        let dt = 1.0 / request.timeline.frame_rate;
        request
            .actors
            .iter()
            .filter(|a| a.role.is_simulated())
            .map(|a| {
                let mut pos = a.rest_position;
                let mut vel = Vec3::ZERO;
                let poses = (0..frames)
                    .map(|_| {
                        vel = vel + request.solver.gravity * dt;
                        pos = pos + vel * dt;
                        if pos.z < 0.0 {
                            pos.z = 0.0;
                            vel = Vec3::ZERO;
                        }
                        FramePose {
                            position: pos,
                            rotation: Vec3::ZERO,
                        }
                    })
                    .collect();
                BakedMotion { actor: a.id, poses }
            })
            .collect()
    }
}

/// it should cut the ball over to the solver one frame after the last pose key
#[test]
fn ball_handoff_follows_scripted_keys() {
    init();
    let scene = ball::build().unwrap();
    let stage = &scene.stage;

    assert_eq!(stage.authority_state(scene.ball), AuthorityState::Simulated);

    let flags = stage.track(scene.ball, Channel::Kinematic).unwrap();
    let samples: Vec<(u32, Option<bool>)> = flags
        .samples()
        .iter()
        .map(|k| (k.frame, k.value.as_flag()))
        .collect();
    assert_eq!(
        samples,
        vec![(1, Some(true)), (20, Some(true)), (21, Some(false))]
    );

    let handoffs: Vec<u32> = stage
        .timeline()
        .events_of_kind(EventKind::HandoffToPhysics)
        .map(|e| e.frame)
        .collect();
    assert_eq!(handoffs, vec![ball::HANDOFF_FRAME]);

    // Scripted keys all precede the handoff frame.
    let poses = stage.track(scene.ball, Channel::Position).unwrap();
    assert!(poses.last_frame().unwrap() < ball::HANDOFF_FRAME);
}

/// it should refuse pose edits on the ball once the solver owns it
#[test]
fn ball_rejects_late_pose_edit() {
    init();
    let mut scene = ball::build().unwrap();
    let err = scene
        .stage
        .add_keyframe(
            scene.ball,
            Channel::Position,
            30,
            Vec3::ZERO.into(),
            false,
        )
        .unwrap_err();
    assert_eq!(err.category(), "authority");
}

/// it should bake the ball scene to one pose per frame
#[test]
fn ball_bakes_full_range() {
    init();
    let mut scene = ball::build().unwrap();
    let ball_id = scene.ball;
    let baked = scene
        .stage
        .bake(&mut FallSolver, ball::solver_config())
        .unwrap();
    assert_eq!((baked.frame_start, baked.frame_end), (1, 120));
    let motion = baked.motions.iter().find(|m| m.actor == ball_id).unwrap();
    assert_eq!(motion.poses.len(), 120);
    assert!(!scene.stage.is_dirty());
}

/// it should stagger domino influence frames by the propagation hint
#[test]
fn dominoes_chain_is_monotonic() {
    init();
    let scene = dominoes::build(42).unwrap();
    let impacts: Vec<(u32, _)> = scene
        .stage
        .timeline()
        .events_of_kind(EventKind::Impact)
        .map(|e| (e.frame, e.actor))
        .collect();

    assert_eq!(impacts.len(), dominoes::DOMINO_COUNT);
    assert!(impacts.windows(2).all(|w| w[0].0 <= w[1].0));
    for (i, &(frame, actor)) in impacts.iter().enumerate() {
        assert_eq!(
            frame,
            dominoes::TRIGGER_HANDOFF_FRAME + i as u32 * dominoes::PROPAGATION_HINT
        );
        assert_eq!(actor, scene.dominoes[i]);
    }

    // The trigger's handoff shares frame 26 with the first impact; the
    // domino was registered earlier, so its event sorts first.
    let at_26: Vec<EventKind> = scene
        .stage
        .timeline()
        .events
        .iter()
        .filter(|e| e.frame == dominoes::TRIGGER_HANDOFF_FRAME)
        .map(|e| e.kind)
        .collect();
    assert_eq!(at_26, vec![EventKind::Impact, EventKind::HandoffToPhysics]);
}

/// it should anchor one dust burst per domino at its rest position
#[test]
fn dominoes_dust_per_impact() {
    init();
    let scene = dominoes::build(42).unwrap();
    let effects = scene.stage.effects();
    assert_eq!(effects.len(), dominoes::DOMINO_COUNT);

    for (i, effect) in effects.iter().enumerate() {
        let frame = dominoes::TRIGGER_HANDOFF_FRAME + i as u32 * dominoes::PROPAGATION_HINT;
        assert_eq!(effect.actor, scene.dominoes[i]);
        assert_eq!(effect.window(), (frame, frame + 50));
        let rest = scene.stage.actor(scene.dominoes[i]).unwrap().rest_position;
        assert_abs_diff_eq!(effect.location.x, rest.x);
        assert_abs_diff_eq!(effect.location.z, 1.0);
    }
    assert_abs_diff_eq!(effects[0].location.x, -5.0);
}

/// it should reproduce domino masses and snapshots from the seed alone
#[test]
fn dominoes_seeded_determinism() {
    init();
    let snapshot_json = |seed: u64| {
        let scene = dominoes::build(seed).unwrap();
        let snapshot = scene.stage.snapshot(dominoes::solver_config(seed));
        serde_json::to_string(&snapshot).unwrap()
    };
    assert_eq!(snapshot_json(42), snapshot_json(42));
    assert_ne!(snapshot_json(42), snapshot_json(7));

    let scene = dominoes::build(42).unwrap();
    for &id in &scene.dominoes {
        let mass = scene.stage.actor(id).unwrap().physics.mass;
        assert!((0.4..0.6).contains(&mass), "mass {mass} out of range");
    }
}

/// it should fire missiles on the periodic schedule and impact on time
#[test]
fn tank_fire_and_impact_schedule() {
    init();
    let scene = tank::build().unwrap();
    let timeline = scene.stage.timeline();

    // Launches at the fire frames, interleaved with each missile's
    // terminal override one frame after its impact.
    let scripted: Vec<u32> = timeline
        .events_of_kind(EventKind::HandoffToScripted)
        .map(|e| e.frame)
        .collect();
    assert_eq!(scripted, vec![1, 32, 51, 82, 101, 132, 151, 182, 201, 232]);

    let handoffs: Vec<u32> = timeline
        .events_of_kind(EventKind::HandoffToPhysics)
        .map(|e| e.frame)
        .collect();
    assert_eq!(handoffs, vec![32, 82, 132, 182, 232]);

    let impacts: Vec<(u32, _)> = timeline
        .events_of_kind(EventKind::Impact)
        .map(|e| (e.frame, e.actor))
        .collect();
    assert_eq!(impacts.len(), tank::TARGET_COUNT);
    for (i, &(frame, actor)) in impacts.iter().enumerate() {
        assert_eq!(frame, 31 + i as u32 * tank::FIRE_INTERVAL);
        assert_eq!(actor, scene.targets[i]);
    }
}

/// it should hand each missile to the solver after impact and bake it
#[test]
fn tank_missiles_hand_off_and_bake() {
    init();
    let mut scene = tank::build().unwrap();
    let missiles = scene.missiles.clone();

    // The scale collapse right after handoff is each missile's terminal
    // override; both transitions are spent during the build.
    for &missile in &missiles {
        assert_eq!(
            scene.stage.authority_state(missile),
            AuthorityState::ScriptedOverride
        );
        let flags = scene.stage.track(missile, Channel::Kinematic).unwrap();
        assert_eq!(flags.samples().last().unwrap().value.as_flag(), Some(false));
    }

    let baked = scene
        .stage
        .bake(&mut FallSolver, tank::solver_config())
        .unwrap();
    assert_eq!((baked.frame_start, baked.frame_end), (1, 300));
    for missile in missiles {
        let motion = baked.motions.iter().find(|m| m.actor == missile).unwrap();
        assert_eq!(motion.poses.len(), 300);
    }
}

/// it should aim the turret ahead of each shot and dead-center on the middle target
#[test]
fn tank_turret_aim_keys() {
    init();
    let scene = tank::build().unwrap();
    let rotation = scene.stage.track(scene.turret, Channel::Rotation).unwrap();

    // One aim key per shot plus a reset before every shot but the first.
    assert_eq!(rotation.samples().len(), 2 * tank::TARGET_COUNT - 1);

    // Middle target sits straight down the +Y axis from the tank.
    let middle_fire = tank::FIRE_START + 2 * tank::FIRE_INTERVAL;
    let aim = rotation
        .sample_at_or_before(middle_fire)
        .and_then(|k| k.value.as_vec3())
        .unwrap();
    assert_eq!(rotation.sample_at_or_before(middle_fire).unwrap().frame, middle_fire);
    assert_abs_diff_eq!(aim.z, 0.0, epsilon = 1e-6);

    // Leftmost target (negative x) needs a positive yaw.
    let first_aim = rotation
        .sample_at_or_before(tank::FIRE_START)
        .and_then(|k| k.value.as_vec3())
        .unwrap();
    assert!(first_aim.z > 0.0);
}

/// it should collapse missile and target scales one frame after impact
#[test]
fn tank_scale_overrides_after_impact() {
    init();
    let scene = tank::build().unwrap();
    for i in 0..tank::TARGET_COUNT {
        let impact = tank::FIRE_START + i as u32 * tank::FIRE_INTERVAL + tank::FLIGHT_DURATION;

        let missile_scale = scene.stage.track(scene.missiles[i], Channel::Scale).unwrap();
        let last = missile_scale.samples().last().unwrap();
        assert_eq!(last.frame, impact + 1);
        assert_eq!(last.value, ChannelValue::Vec3(Vec3::splat(0.01)));

        let target_scale = scene.stage.track(scene.targets[i], Channel::Scale).unwrap();
        let held = target_scale.sample_at_or_before(impact).unwrap();
        assert_eq!(held.frame, impact);
        assert_eq!(held.value, ChannelValue::Vec3(Vec3::new(2.0, 2.0, 3.0)));
        let gone = target_scale.sample_at_or_before(impact + 1).unwrap();
        assert_eq!(gone.value, ChannelValue::Vec3(Vec3::splat(0.01)));
    }
}

/// it should spawn one dust burst per destroyed target at its rest position
#[test]
fn tank_dust_per_target() {
    init();
    let scene = tank::build().unwrap();
    let effects = scene.stage.effects();
    assert_eq!(effects.len(), tank::TARGET_COUNT);
    for (i, effect) in effects.iter().enumerate() {
        assert_eq!(effect.actor, scene.targets[i]);
        assert_eq!(effect.spec.particle_count, 100);
        let rest = scene.stage.actor(scene.targets[i]).unwrap().rest_position;
        assert_abs_diff_eq!(effect.location.x, rest.x);
        assert_abs_diff_eq!(effect.location.y, rest.y);
        assert_abs_diff_eq!(effect.location.z, 1.5);
    }
}

/// it should place the barrel at the composed rig offset
#[test]
fn tank_rig_composition() {
    init();
    let scene = tank::build().unwrap();
    let graph = &scene.graph;
    assert_eq!(graph.len(), 5);

    let barrel_node = (0..graph.len())
        .find(|&n| graph.actor_of(n) == Some(scene.barrel))
        .unwrap();
    let world = graph.world_transform(barrel_node);
    // body (0,-10,0.75) + turret (0,0,1.25) + barrel (0,2,0)
    assert_abs_diff_eq!(world.translation.x, 0.0);
    assert_abs_diff_eq!(world.translation.y, -8.0);
    assert_abs_diff_eq!(world.translation.z, 2.0);
}
