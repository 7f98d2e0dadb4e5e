//! Scene graph: explicit parent/child tree with relative offsets.
//!
//! World transforms are computed by composition, never by imperative
//! reassignment, so parenting a turret to a hull survives later edits of
//! either local transform.

use serde::{Deserialize, Serialize};

use crate::ids::ActorId;
use crate::value::Vec3;

/// Local transform: translation, XYZ Euler rotation (radians), scale.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }
}

/// Row-major 3x3 rotation basis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat3(pub [[f32; 3]; 3]);

impl Mat3 {
    pub const IDENTITY: Mat3 = Mat3([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);

    /// Basis from XYZ Euler angles, applied in X then Y then Z order.
    pub fn from_euler_xyz(e: Vec3) -> Self {
        let (sx, cx) = e.x.sin_cos();
        let (sy, cy) = e.y.sin_cos();
        let (sz, cz) = e.z.sin_cos();
        let rx = Mat3([[1.0, 0.0, 0.0], [0.0, cx, -sx], [0.0, sx, cx]]);
        let ry = Mat3([[cy, 0.0, sy], [0.0, 1.0, 0.0], [-sy, 0.0, cy]]);
        let rz = Mat3([[cz, -sz, 0.0], [sz, cz, 0.0], [0.0, 0.0, 1.0]]);
        rz.mul(&ry).mul(&rx)
    }

    pub fn mul(&self, rhs: &Mat3) -> Mat3 {
        let mut out = [[0.0f32; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.0[i][k] * rhs.0[k][j]).sum();
            }
        }
        Mat3(out)
    }

    pub fn mul_vec3(&self, v: Vec3) -> Vec3 {
        Vec3::new(
            self.0[0][0] * v.x + self.0[0][1] * v.y + self.0[0][2] * v.z,
            self.0[1][0] * v.x + self.0[1][1] * v.y + self.0[1][2] * v.z,
            self.0[2][0] * v.x + self.0[2][1] * v.y + self.0[2][2] * v.z,
        )
    }
}

/// Composed world-space transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldTransform {
    pub translation: Vec3,
    pub basis: Mat3,
    pub scale: Vec3,
}

impl WorldTransform {
    pub const IDENTITY: WorldTransform = WorldTransform {
        translation: Vec3::ZERO,
        basis: Mat3::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Apply this transform to a point in local space.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.translation + self.basis.mul_vec3(self.scale.mul_components(p))
    }
}

pub type NodeIndex = usize;

#[derive(Clone, Debug)]
struct SceneNode {
    actor: ActorId,
    parent: Option<NodeIndex>,
    local: Transform,
}

/// Parent/child tree of actors with relative offsets.
#[derive(Default, Debug)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, actor: ActorId, local: Transform) -> NodeIndex {
        self.nodes.push(SceneNode {
            actor,
            parent: None,
            local,
        });
        self.nodes.len() - 1
    }

    /// Child nodes store offsets relative to their parent. Parent indices
    /// always precede children, so composition is a simple walk up.
    pub fn add_child(&mut self, parent: NodeIndex, actor: ActorId, local: Transform) -> NodeIndex {
        debug_assert!(parent < self.nodes.len());
        self.nodes.push(SceneNode {
            actor,
            parent: Some(parent),
            local,
        });
        self.nodes.len() - 1
    }

    pub fn set_local(&mut self, node: NodeIndex, local: Transform) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.local = local;
        }
    }

    pub fn actor_of(&self, node: NodeIndex) -> Option<ActorId> {
        self.nodes.get(node).map(|n| n.actor)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// World transform by composition from the root down.
    pub fn world_transform(&self, node: NodeIndex) -> WorldTransform {
        let Some(n) = self.nodes.get(node) else {
            return WorldTransform::IDENTITY;
        };
        let parent = match n.parent {
            Some(p) => self.world_transform(p),
            None => WorldTransform::IDENTITY,
        };
        let local_basis = Mat3::from_euler_xyz(n.local.rotation);
        WorldTransform {
            translation: parent.transform_point(n.local.translation),
            basis: parent.basis.mul(&local_basis),
            scale: parent.scale.mul_components(n.local.scale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_2;

    fn approx_vec(a: Vec3, b: Vec3) {
        assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-5);
        assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-5);
        assert_abs_diff_eq!(a.z, b.z, epsilon = 1e-5);
    }

    #[test]
    fn child_offset_composes_with_parent_translation() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(
            ActorId(0),
            Transform::from_translation(Vec3::new(0.0, -10.0, 0.75)),
        );
        let child = graph.add_child(
            root,
            ActorId(1),
            Transform::from_translation(Vec3::new(0.0, 0.0, 1.25)),
        );
        let world = graph.world_transform(child);
        approx_vec(world.translation, Vec3::new(0.0, -10.0, 2.0));
    }

    #[test]
    fn parent_rotation_rotates_child_offset() {
        let mut graph = SceneGraph::new();
        let mut root_local = Transform::default();
        root_local.rotation = Vec3::new(0.0, 0.0, FRAC_PI_2);
        let root = graph.add_root(ActorId(0), root_local);
        let child = graph.add_child(
            root,
            ActorId(1),
            Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)),
        );
        // +X offset under a 90 degree Z rotation lands on +Y.
        let world = graph.world_transform(child);
        approx_vec(world.translation, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn scale_composes_componentwise() {
        let mut graph = SceneGraph::new();
        let mut root_local = Transform::default();
        root_local.scale = Vec3::new(2.0, 2.0, 2.0);
        let root = graph.add_root(ActorId(0), root_local);
        let child = graph.add_child(
            root,
            ActorId(1),
            Transform::from_translation(Vec3::new(0.0, 0.0, 1.0)),
        );
        let world = graph.world_transform(child);
        approx_vec(world.translation, Vec3::new(0.0, 0.0, 2.0));
        approx_vec(world.scale, Vec3::new(2.0, 2.0, 2.0));
    }
}
