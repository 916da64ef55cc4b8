//! Scene camera.

use glam::{Mat4, Quat, Vec3, Vec4};

/// Projection of a [`Camera`].
#[derive(Clone, Copy, Debug)]
pub enum Projection {
    /// Perspective projection.
    Perspective {
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    /// Symmetric orthographic projection centered on the view axis.
    Orthographic {
        width: f32,
        height: f32,
        near: f32,
        far: f32,
    },
}

/// Viewpoint the main pass renders from.
///
/// The camera feeds the per-pass constants each frame: view and projection
/// matrices plus the eye position.
#[derive(Clone, Debug)]
pub struct Camera {
    /// Position in world space.
    pub position: Vec3,
    /// Orientation; identity looks down -Z.
    pub rotation: Quat,
    /// Projection settings.
    pub projection: Projection,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            projection: Projection::Perspective {
                fov_y: 60.0_f32.to_radians(),
                aspect: 16.0 / 9.0,
                near: 0.1,
                far: 1000.0,
            },
        }
    }
}

impl Camera {
    /// Creates a camera at the origin looking down -Z.
    pub fn new() -> Self {
        Self::default()
    }

    /// Switches to a perspective projection.
    pub fn set_perspective(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) {
        self.projection = Projection::Perspective {
            fov_y,
            aspect,
            near,
            far,
        };
    }

    /// Switches to a symmetric orthographic projection.
    pub fn set_orthographic(&mut self, width: f32, height: f32, near: f32, far: f32) {
        self.projection = Projection::Orthographic {
            width,
            height,
            near,
            far,
        };
    }

    /// Updates the aspect ratio of a perspective projection.
    ///
    /// Orthographic projections are left unchanged.
    pub fn set_aspect(&mut self, aspect: f32) {
        if let Projection::Perspective {
            fov_y, near, far, ..
        } = self.projection
        {
            self.projection = Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            };
        }
    }

    /// Rotates the camera to face `target`.
    pub fn look_at(&mut self, target: Vec3) {
        let forward = (target - self.position).normalize_or_zero();
        if forward != Vec3::ZERO {
            self.rotation = Quat::from_rotation_arc(Vec3::NEG_Z, forward);
        }
    }

    /// Returns the view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        let target = self.position + self.rotation * Vec3::NEG_Z;
        Mat4::look_at_rh(self.position, target, Vec3::Y)
    }

    /// Returns the projection matrix with the Vulkan Y-flip applied.
    pub fn projection_matrix(&self) -> Mat4 {
        let mut proj = match self.projection {
            Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => Mat4::perspective_rh(fov_y, aspect, near, far),
            Projection::Orthographic {
                width,
                height,
                near,
                far,
            } => {
                let (hw, hh) = (width * 0.5, height * 0.5);
                Mat4::orthographic_rh(-hw, hw, -hh, hh, near, far)
            }
        };
        // Clip space is Y-down in Vulkan
        proj.y_axis.y *= -1.0;
        proj
    }

    /// Returns the combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Returns the eye position as written into the pass constants.
    pub fn eye_position(&self) -> Vec4 {
        self.position.extend(1.0)
    }

    /// Returns the forward direction vector.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_y_flip() {
        let camera = Camera::new();
        let proj = camera.projection_matrix();

        // Vulkan clip space has Y pointing down
        assert!(proj.y_axis.y > 0.0 || proj.y_axis.y < 0.0);
        let reference = match camera.projection {
            Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => Mat4::perspective_rh(fov_y, aspect, near, far),
            _ => unreachable!(),
        };
        assert_eq!(proj.y_axis.y, -reference.y_axis.y);
    }

    #[test]
    fn test_look_at_faces_target() {
        let mut camera = Camera::new();
        camera.position = Vec3::new(0.0, 0.0, 10.0);
        camera.look_at(Vec3::ZERO);

        let forward = camera.forward();
        assert!((forward - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_look_at_self_is_noop() {
        let mut camera = Camera::new();
        camera.position = Vec3::new(3.0, 1.0, 2.0);
        let before = camera.rotation;
        camera.look_at(camera.position);

        assert_eq!(camera.rotation, before);
    }

    #[test]
    fn test_view_matrix_moves_world_opposite() {
        let mut camera = Camera::new();
        camera.position = Vec3::new(0.0, 0.0, 5.0);

        let view = camera.view_matrix();
        let origin_in_view = view.transform_point3(Vec3::ZERO);

        // World origin sits 5 units in front of the camera (-Z in view space)
        assert!((origin_in_view - Vec3::new(0.0, 0.0, -5.0)).length() < 1e-5);
    }

    #[test]
    fn test_orthographic_projection() {
        let mut camera = Camera::new();
        camera.set_orthographic(20.0, 10.0, 0.1, 100.0);

        let proj = camera.projection_matrix();
        let reference = Mat4::orthographic_rh(-10.0, 10.0, -5.0, 5.0, 0.1, 100.0);
        assert_eq!(proj.x_axis.x, reference.x_axis.x);
        assert_eq!(proj.y_axis.y, -reference.y_axis.y);
    }

    #[test]
    fn test_set_aspect_preserves_other_fields() {
        let mut camera = Camera::new();
        camera.set_perspective(1.0, 1.0, 0.5, 50.0);
        camera.set_aspect(2.0);

        match camera.projection {
            Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => {
                assert_eq!(fov_y, 1.0);
                assert_eq!(aspect, 2.0);
                assert_eq!(near, 0.5);
                assert_eq!(far, 50.0);
            }
            _ => panic!("projection changed kind"),
        }
    }

    #[test]
    fn test_eye_position_w() {
        let mut camera = Camera::new();
        camera.position = Vec3::new(1.0, 2.0, 3.0);

        assert_eq!(camera.eye_position(), Vec4::new(1.0, 2.0, 3.0, 1.0));
    }
}
