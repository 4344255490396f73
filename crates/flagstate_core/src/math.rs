//! Small vector and rotation types used by component payloads.
//!
//! All types are `Pod` so component tables can hand out byte views.

use bytemuck::{Pod, Zeroable};

/// 3D vector - position, velocity, scale
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// All ones
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Length squared (avoids sqrt)
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Unit vector in the same direction; zero stays zero.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON {
            return Self::ZERO;
        }
        self * (1.0 / len)
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Quaternion for rotations
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Quaternion {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
    /// W component
    pub w: f32,
}

impl Quaternion {
    /// Creates a new quaternion
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Identity rotation
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Rotation of `angle` radians about a unit `axis`.
    #[must_use]
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let (sin, cos) = (angle * 0.5).sin_cos();
        Self::new(axis.x * sin, axis.y * sin, axis.z * sin, cos)
    }

    /// Returns the unit quaternion pointing the same way.
    ///
    /// A degenerate (zero-length) quaternion normalizes to identity.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt();
        if len <= f32::EPSILON {
            return Self::IDENTITY;
        }
        Self::new(self.x / len, self.y / len, self.z / len, self.w / len)
    }

    /// Rotation described by a rotation vector (axis times radians).
    #[must_use]
    pub fn from_rotation_vector(v: Vec3) -> Self {
        let angle = v.length();
        if angle <= f32::EPSILON {
            return Self::IDENTITY;
        }
        Self::from_axis_angle(v * (1.0 / angle), angle)
    }

    /// Rotates a vector by this (unit) quaternion.
    #[must_use]
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let t = u.cross(v) * 2.0;
        v + t * self.w + u.cross(t)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl std::ops::Mul for Quaternion {
    type Output = Self;
    /// Hamilton product; `a * b` applies `b` first.
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        let sum = a + b;
        assert_eq!(sum, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(a.dot(b), 32.0); // 1*4 + 2*5 + 3*6
    }

    #[test]
    fn test_quaternion_rotation() {
        let quarter =
            Quaternion::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), std::f32::consts::FRAC_PI_2);
        let rotated = quarter.rotate(Vec3::new(1.0, 0.0, 0.0));
        assert!(approx(rotated, Vec3::new(0.0, 1.0, 0.0)));

        let half = (quarter * quarter).normalized();
        assert!(approx(half.rotate(Vec3::new(1.0, 0.0, 0.0)), Vec3::new(-1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_identity_is_neutral() {
        let q = Quaternion::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), 0.3);
        assert_eq!(Quaternion::IDENTITY * q, q);
        assert_eq!(Quaternion::new(0.0, 0.0, 0.0, 0.0).normalized(), Quaternion::IDENTITY);
    }

    #[test]
    fn test_rotation_vector() {
        let q = Quaternion::from_rotation_vector(Vec3::new(0.0, 0.0, std::f32::consts::PI));
        assert!(approx(q.rotate(Vec3::new(1.0, 0.0, 0.0)), Vec3::new(-1.0, 0.0, 0.0)));
        assert_eq!(Quaternion::from_rotation_vector(Vec3::ZERO), Quaternion::IDENTITY);
        assert_eq!(Vec3::ZERO.normalized(), Vec3::ZERO);
        assert!(approx(Vec3::new(3.0, 0.0, 4.0).normalized(), Vec3::new(0.6, 0.0, 0.8)));
    }

    #[test]
    fn test_bytemuck_sizes() {
        assert_eq!(bytemuck::bytes_of(&Vec3::ONE).len(), 12);
        assert_eq!(bytemuck::bytes_of(&Quaternion::IDENTITY).len(), 16);
    }
}
