//! Local transform component.
//!
//! A [`Transform`] holds position, rotation and scale relative to the
//! owning object's parent. Hierarchy lives in the
//! [`World`](crate::graph::World); composing local matrices along the
//! parent chain is done there.

use glam::{Mat4, Quat, Vec3};

/// Position, rotation and scale relative to the parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Position in parent space.
    pub position: Vec3,
    /// Rotation as a quaternion.
    pub rotation: Quat,
    /// Scale factor.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Creates an identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transform at the given position.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Sets the position.
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Sets the rotation.
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets the scale.
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Returns the matrix mapping this transform's space into parent space.
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Returns the forward direction vector.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Returns the right direction vector.
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Returns the up direction vector.
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_default() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.local_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_transform_builder() {
        let t = Transform::new()
            .with_position(Vec3::new(1.0, 2.0, 3.0))
            .with_scale(Vec3::splat(2.0));

        assert_eq!(t.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(t.scale, Vec3::splat(2.0));
    }

    #[test]
    fn test_local_matrix_composition() {
        let t = Transform::from_position(Vec3::new(5.0, 0.0, 0.0)).with_scale(Vec3::splat(2.0));
        let p = t.local_matrix().transform_point3(Vec3::new(1.0, 0.0, 0.0));

        // Scale applies before translation
        assert!((p - Vec3::new(7.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_direction_vectors() {
        let t = Transform::default();

        // Default orientation: -Z forward, +X right, +Y up
        assert_eq!(t.forward(), Vec3::NEG_Z);
        assert_eq!(t.right(), Vec3::X);
        assert_eq!(t.up(), Vec3::Y);
    }

    #[test]
    fn test_rotated_directions() {
        let t = Transform::new().with_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let forward = t.forward();

        // 90 degrees around Y turns -Z into -X
        assert!((forward - Vec3::NEG_X).length() < 1e-5);
    }
}
