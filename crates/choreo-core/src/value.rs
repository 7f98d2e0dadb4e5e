//! Channel value types shared by tracks, events, and baked output.

use serde::{Deserialize, Serialize};

/// 3D vector (positions, Euler rotations in radians, scales).
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const ONE: Vec3 = Vec3 {
        x: 1.0,
        y: 1.0,
        z: 1.0,
    };

    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    #[inline]
    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Component-wise product (used for scale composition).
    #[inline]
    pub fn mul_components(&self, other: Vec3) -> Vec3 {
        Vec3::new(self.x * other.x, self.y * other.y, self.z * other.z)
    }
}

impl std::ops::Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Value stored in a keyframe sample.
///
/// Pose channels (position/rotation) and scale carry `Vec3`; the kinematic
/// authority channel carries `Flag`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub enum ChannelValue {
    Vec3(Vec3),
    Flag(bool),
}

impl ChannelValue {
    #[inline]
    pub fn is_finite(&self) -> bool {
        match self {
            ChannelValue::Vec3(v) => v.is_finite(),
            ChannelValue::Flag(_) => true,
        }
    }

    #[inline]
    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            ChannelValue::Vec3(v) => Some(*v),
            ChannelValue::Flag(_) => None,
        }
    }

    #[inline]
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            ChannelValue::Flag(f) => Some(*f),
            ChannelValue::Vec3(_) => None,
        }
    }
}

impl From<Vec3> for ChannelValue {
    fn from(v: Vec3) -> Self {
        ChannelValue::Vec3(v)
    }
}

impl From<bool> for ChannelValue {
    fn from(f: bool) -> Self {
        ChannelValue::Flag(f)
    }
}
