//! Actor registry: choreographed objects, their physics roles and parameters.

use serde::{Deserialize, Serialize};

use crate::error::ChoreoError;
use crate::ids::ActorId;
use crate::value::Vec3;

/// Opaque host-owned handle (geometry or material reference).
pub type HostHandle = String;

/// How an actor participates in the choreography.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Role {
    /// Scripted motion first, then authority hands off to the solver.
    ScriptedThenPhysics,
    /// Immovable collider (ground, walls, obstacles).
    StaticCollider,
    /// Solver-driven from the start (e.g. dominoes waiting to be struck).
    PhysicsOnly,
}

impl Role {
    /// Whether the solver produces baked transforms for this actor.
    #[inline]
    pub fn is_simulated(self) -> bool {
        matches!(self, Role::ScriptedThenPhysics | Role::PhysicsOnly)
    }
}

/// Collision shape handed to the host solver.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum CollisionShape {
    Sphere,
    Box,
    ConvexHull,
    Mesh,
}

/// Rigid-body parameters forwarded to the host solver.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct PhysicsParams {
    pub mass: f32,
    pub friction: f32,
    pub restitution: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub shape: CollisionShape,
    pub collision_margin: f32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            mass: 1.0,
            friction: 0.5,
            restitution: 0.0,
            linear_damping: 0.1,
            angular_damping: 0.1,
            shape: CollisionShape::Box,
            collision_margin: 0.01,
        }
    }
}

/// Construction parameters for `Stage::register_actor`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActorSpec {
    pub name: String,
    pub role: Role,
    pub physics: PhysicsParams,
    /// Placement before any keyframes apply; also the fallback anchor for
    /// effects when no position track exists.
    pub rest_position: Vec3,
    pub rest_scale: Vec3,
    pub geometry: Option<HostHandle>,
    pub material: Option<HostHandle>,
}

impl Default for ActorSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            role: Role::StaticCollider,
            physics: PhysicsParams::default(),
            rest_position: Vec3::ZERO,
            rest_scale: Vec3::ONE,
            geometry: None,
            material: None,
        }
    }
}

/// One choreographed object.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub role: Role,
    pub physics: PhysicsParams,
    pub rest_position: Vec3,
    pub rest_scale: Vec3,
    pub geometry: Option<HostHandle>,
    pub material: Option<HostHandle>,
}

/// Registration-ordered actor storage.
#[derive(Default, Debug)]
pub struct ActorRegistry {
    items: Vec<Actor>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, actor: Actor) {
        self.items.push(actor);
    }

    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.items.iter().find(|a| a.id == id)
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.items.iter_mut().find(|a| a.id == id)
    }

    /// Lookup that surfaces `MissingDependency` for unknown ids.
    pub fn ensure(&self, id: ActorId) -> Result<&Actor, ChoreoError> {
        self.get(id).ok_or(ChoreoError::MissingDependency { actor: id })
    }

    /// Position in registration order; used for event tie-breaking.
    pub fn index_of(&self, id: ActorId) -> Option<usize> {
        self.items.iter().position(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.items.iter()
    }

    pub fn ids_in_order(&self) -> Vec<ActorId> {
        self.items.iter().map(|a| a.id).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_unknown_is_missing_dependency() {
        let reg = ActorRegistry::new();
        let err = reg.ensure(ActorId(9)).unwrap_err();
        assert_eq!(err, ChoreoError::MissingDependency { actor: ActorId(9) });
    }

    #[test]
    fn registration_order_preserved() {
        let mut reg = ActorRegistry::new();
        for i in 0..3u32 {
            reg.insert(Actor {
                id: ActorId(i),
                name: format!("a{i}"),
                role: Role::PhysicsOnly,
                physics: PhysicsParams::default(),
                rest_position: Vec3::ZERO,
                rest_scale: Vec3::ONE,
                geometry: None,
                material: None,
            });
        }
        assert_eq!(reg.index_of(ActorId(2)), Some(2));
        assert_eq!(reg.ids_in_order(), vec![ActorId(0), ActorId(1), ActorId(2)]);
    }
}
