//! Directional shadow volume math.
//!
//! The shadow pass renders the scene from the primary light's point of view
//! into a depth-only target. The volume computed here is an orthographic
//! frustum fitted around the scene's bounding sphere, plus the matrix that
//! takes world-space positions into shadow-map texture coordinates for
//! sampling during the lit passes.

use glam::{Mat4, Vec3};

/// Sphere enclosing the shadow-casting geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a sphere from its center and radius.
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Fits a sphere around a point cloud.
    ///
    /// The center is the midpoint of the axis-aligned bounds and the radius
    /// the largest distance from that center. An empty cloud yields the
    /// default unit sphere.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Vec3> + Clone,
    {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        let mut any = false;
        for p in points.clone() {
            min = min.min(p);
            max = max.max(p);
            any = true;
        }
        if !any {
            return Self::default();
        }

        let center = (min + max) * 0.5;
        let mut radius_sq = 0.0f32;
        for p in points {
            radius_sq = radius_sq.max(center.distance_squared(p));
        }
        Self {
            center,
            radius: radius_sq.sqrt().max(f32::EPSILON),
        }
    }
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            radius: 1.0,
        }
    }
}

/// Light-space matrices for one directional shadow pass.
#[derive(Clone, Copy, Debug)]
pub struct ShadowVolume {
    /// Light eye position the pass renders from.
    pub eye: Vec3,
    /// World to light-view matrix.
    pub view: Mat4,
    /// Orthographic projection fitted to the bounding sphere.
    pub proj: Mat4,
    /// World to shadow-map texture coordinates, for sampling.
    pub transform: Mat4,
}

impl ShadowVolume {
    /// Fits an orthographic volume around `bounds` looking along `direction`.
    ///
    /// The eye sits two radii behind the sphere's center so the whole sphere
    /// lies between one and three radii in front of it. A zero direction
    /// falls back to straight down.
    pub fn compute(bounds: BoundingSphere, direction: Vec3) -> Self {
        let dir = direction.normalize_or_zero();
        let dir = if dir == Vec3::ZERO { Vec3::NEG_Y } else { dir };

        let radius = bounds.radius.max(f32::EPSILON);
        let eye = bounds.center - dir * (2.0 * radius);

        // A light pointing straight up or down would be parallel to the
        // default up vector.
        let up = if dir.dot(Vec3::Y).abs() > 0.99 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(eye, bounds.center, up);

        let mut proj = Mat4::orthographic_rh(
            -radius,
            radius,
            -radius,
            radius,
            radius,
            3.0 * radius,
        );
        // Clip space is Y-down in Vulkan.
        proj.y_axis.y *= -1.0;

        // NDC [-1, 1] to texture [0, 1] on x/y; depth is already [0, 1].
        let tex = Mat4::from_translation(Vec3::new(0.5, 0.5, 0.0))
            * Mat4::from_scale(Vec3::new(0.5, 0.5, 1.0));

        Self {
            eye,
            view,
            proj,
            transform: tex * proj * view,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!(a.distance(b) < 1e-4, "{a} != {b}");
    }

    #[test]
    fn test_center_maps_to_texture_middle() {
        let bounds = BoundingSphere::new(Vec3::new(3.0, 1.0, -2.0), 5.0);
        let volume = ShadowVolume::compute(bounds, Vec3::new(1.0, -1.0, 0.5));

        let uv = volume.transform.project_point3(bounds.center);
        assert_close(uv, Vec3::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_sphere_fits_in_texture_bounds() {
        let bounds = BoundingSphere::new(Vec3::new(-1.0, 4.0, 2.0), 3.0);
        let volume = ShadowVolume::compute(bounds, Vec3::new(0.3, -0.8, 0.2));

        for offset in [
            Vec3::X,
            Vec3::NEG_X,
            Vec3::Y,
            Vec3::NEG_Y,
            Vec3::Z,
            Vec3::NEG_Z,
        ] {
            let point = bounds.center + offset * bounds.radius;
            let uv = volume.transform.project_point3(point);
            assert!((-1e-4..=1.0001).contains(&uv.x), "u out of range: {uv}");
            assert!((-1e-4..=1.0001).contains(&uv.y), "v out of range: {uv}");
            assert!((-1e-4..=1.0001).contains(&uv.z), "depth out of range: {uv}");
        }
    }

    #[test]
    fn test_eye_sits_two_radii_back() {
        let bounds = BoundingSphere::new(Vec3::ZERO, 4.0);
        let volume = ShadowVolume::compute(bounds, Vec3::NEG_Z);

        assert_close(volume.eye, Vec3::new(0.0, 0.0, 8.0));
        // The eye is the view-space origin.
        assert_close(volume.view.transform_point3(volume.eye), Vec3::ZERO);
    }

    #[test]
    fn test_vertical_light_avoids_degenerate_up() {
        let bounds = BoundingSphere::new(Vec3::ZERO, 2.0);
        let volume = ShadowVolume::compute(bounds, Vec3::NEG_Y);

        let uv = volume.transform.project_point3(Vec3::ZERO);
        assert!(uv.is_finite());
        assert_close(uv, Vec3::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_zero_direction_falls_back() {
        let volume = ShadowVolume::compute(BoundingSphere::default(), Vec3::ZERO);
        assert_close(volume.eye, Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_from_points_encloses_cloud() {
        let points = vec![
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(3.0, -1.0, -1.0),
            Vec3::new(-1.0, 3.0, -1.0),
            Vec3::new(3.0, 3.0, 3.0),
        ];
        let sphere = BoundingSphere::from_points(points.iter().copied());

        assert_close(sphere.center, Vec3::new(1.0, 1.0, 1.0));
        for p in &points {
            assert!(sphere.center.distance(*p) <= sphere.radius + 1e-4);
        }
    }

    #[test]
    fn test_from_points_empty_is_default() {
        let sphere = BoundingSphere::from_points(std::iter::empty());
        assert_eq!(sphere, BoundingSphere::default());
    }
}
