//! choreo-core (host-agnostic)
//!
//! Timeline choreography and physics-authority handoff: an actor registry,
//! keyframe track builder, handoff state machine, timeline scheduler,
//! effect spawner, and a memoizing bake/cache manager. Rigid-body dynamics,
//! keyframe interpolation, and rendering belong to the host 3D engine; this
//! crate owns the bookkeeping that must stay consistent across the
//! scripted-to-simulated cutover.

pub mod actor;
pub mod authority;
pub mod bake;
pub mod config;
pub mod effects;
pub mod error;
pub mod ids;
pub mod rng;
pub mod scene;
pub mod schedule;
pub mod stage;
pub mod track;
pub mod value;

// Re-exports for consumers (hosts and scene builders)
pub use actor::{Actor, ActorRegistry, ActorSpec, CollisionShape, HostHandle, PhysicsParams, Role};
pub use authority::{AuthorityState, HandoffController, HandoffTransition};
pub use bake::{
    request_key, BakeManager, BakeRequest, BakedMotion, BakedSimulation, FramePose,
    RigidBodySolver, SolverConfig,
};
pub use config::StageConfig;
pub use effects::{EffectInstance, EffectSpawner, EffectSpec};
pub use error::ChoreoError;
pub use ids::{ActorId, EffectId, IdAllocator};
pub use rng::XorShift64;
pub use scene::{Mat3, NodeIndex, SceneGraph, Transform, WorldTransform};
pub use schedule::{ChainParams, Event, EventKind, EventPayload, PeriodicParams, Timeline};
pub use stage::Stage;
pub use track::{Channel, Keyframe, KeyframeTrack, TrackExport, TrackStore};
pub use value::{ChannelValue, Vec3};
