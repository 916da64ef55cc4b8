//! Constant-block structures for shader data.
//!
//! This module defines the data structures written into constant buffers.
//! All structures use `#[repr(C)]` for correct memory layout and implement
//! `bytemuck::Pod` and `bytemuck::Zeroable` for safe byte-level operations.
//!
//! # Overview
//!
//! - [`PassConstants`] contains camera, shadow, ambient and light data for one render pass
//! - [`ObjectConstants`] contains per-object transformation matrices
//! - [`MaterialConstants`] contains per-material shading parameters
//! - [`SkinnedConstants`] contains the bone palette of one skinned model
//! - [`GpuLight`] is the packed representation of a single light
//!
//! # GPU Memory Layout
//!
//! All structures follow std140 layout rules for uniform buffers:
//! - `Mat4` is 64 bytes (16 floats)
//! - `Vec3` is 12 bytes and is paired with a trailing scalar to fill 16 bytes
//! - No implicit padding: every field lands on its declared offset
//!
//! # Example
//!
//! ```
//! use ember_resources::constants::{ObjectConstants, PassConstants};
//! use glam::{Mat4, Vec3};
//!
//! let mut pass = PassConstants::default();
//! pass.view = Mat4::look_at_rh(Vec3::new(0.0, 4.0, 10.0), Vec3::ZERO, Vec3::Y);
//!
//! let object = ObjectConstants::new(Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)));
//!
//! // Convert to bytes for GPU upload
//! let pass_bytes: &[u8] = bytemuck::bytes_of(&pass);
//! let object_bytes: &[u8] = bytemuck::bytes_of(&object);
//! ```

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

/// Number of directional lights in the packed light array.
pub const MAX_DIRECTIONAL_LIGHTS: usize = 1;
/// Number of point lights in the packed light array.
pub const MAX_POINT_LIGHTS: usize = 10;
/// Number of spot lights in the packed light array.
pub const MAX_SPOT_LIGHTS: usize = 1;
/// Total light array length.
///
/// The array is packed by kind: the directional light at index 0, point
/// lights at `1..11`, the spot light at index 11.
pub const MAX_LIGHTS: usize = MAX_DIRECTIONAL_LIGHTS + MAX_POINT_LIGHTS + MAX_SPOT_LIGHTS;

/// Maximum bone count of a skinned model.
pub const MAX_BONES: usize = 500;

/// Packed representation of a single light.
///
/// One layout serves all three light kinds; unused fields are zero.
/// Directional lights use `strength` and `direction`, point lights use
/// `strength`, `position` and the falloff interval, spot lights use all
/// fields.
///
/// # Memory Layout (std140)
///
/// | Offset | Size | Field |
/// |--------|------|-------|
/// | 0      | 12   | strength |
/// | 12     | 4    | falloff_start |
/// | 16     | 12   | direction |
/// | 28     | 4    | falloff_end |
/// | 32     | 12   | position |
/// | 44     | 4    | spot_power |
///
/// Total size: 48 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct GpuLight {
    /// Light color scaled by intensity.
    pub strength: Vec3,
    /// Distance at which attenuation begins (point/spot).
    pub falloff_start: f32,
    /// Direction the light shines along (directional/spot).
    pub direction: Vec3,
    /// Distance at which the light reaches zero (point/spot).
    pub falloff_end: f32,
    /// Light position in world space (point/spot).
    pub position: Vec3,
    /// Spotlight cone exponent.
    pub spot_power: f32,
}

impl GpuLight {
    /// Creates a directional light.
    ///
    /// # Arguments
    ///
    /// * `strength` - Light color scaled by intensity
    /// * `direction` - Direction the light shines along (will be normalized)
    #[inline]
    pub fn directional(strength: Vec3, direction: Vec3) -> Self {
        Self {
            strength,
            // normalize_or_zero avoids NaN propagation to shaders
            direction: direction.normalize_or_zero(),
            ..Self::default()
        }
    }

    /// Creates a point light.
    ///
    /// # Arguments
    ///
    /// * `strength` - Light color scaled by intensity
    /// * `position` - Light position in world space
    /// * `falloff_start` - Distance at which attenuation begins
    /// * `falloff_end` - Distance at which the light reaches zero
    #[inline]
    pub fn point(strength: Vec3, position: Vec3, falloff_start: f32, falloff_end: f32) -> Self {
        Self {
            strength,
            position,
            falloff_start,
            falloff_end,
            ..Self::default()
        }
    }

    /// Creates a spot light.
    ///
    /// # Arguments
    ///
    /// * `strength` - Light color scaled by intensity
    /// * `position` - Light position in world space
    /// * `direction` - Cone axis (will be normalized)
    /// * `falloff_start` - Distance at which attenuation begins
    /// * `falloff_end` - Distance at which the light reaches zero
    /// * `spot_power` - Cone exponent; larger values narrow the cone
    #[inline]
    pub fn spot(
        strength: Vec3,
        position: Vec3,
        direction: Vec3,
        falloff_start: f32,
        falloff_end: f32,
        spot_power: f32,
    ) -> Self {
        Self {
            strength,
            falloff_start,
            direction: direction.normalize_or_zero(),
            falloff_end,
            position,
            spot_power,
        }
    }

    /// Returns the size of this structure in bytes.
    #[inline]
    pub const fn size() -> usize {
        std::mem::size_of::<Self>()
    }
}

/// Per-pass constant block.
///
/// Written once per render pass per frame: element 0 carries the main
/// camera's view, element 1 the shadow camera's. The shadow transform maps
/// world space into shadow-map texture space and is only meaningful in the
/// main-pass element.
///
/// # Memory Layout (std140)
///
/// | Offset | Size | Field |
/// |--------|------|-------|
/// | 0      | 64   | view |
/// | 64     | 64   | proj |
/// | 128    | 64   | shadow_transform |
/// | 192    | 16   | eye_pos |
/// | 208    | 16   | ambient_light |
/// | 224    | 576  | lights |
///
/// Total size: 800 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct PassConstants {
    /// View matrix (world space to camera space transformation).
    pub view: Mat4,
    /// Projection matrix (camera space to clip space transformation).
    pub proj: Mat4,
    /// World space to shadow-map texture space transformation.
    pub shadow_transform: Mat4,
    /// Camera position in world space (w unused).
    pub eye_pos: Vec4,
    /// Ambient light color.
    pub ambient_light: Vec4,
    /// Packed light array; see [`MAX_LIGHTS`] for the slot convention.
    pub lights: [GpuLight; MAX_LIGHTS],
}

impl PassConstants {
    /// Returns the size of this structure in bytes.
    ///
    /// This is useful when creating constant buffers.
    #[inline]
    pub const fn size() -> usize {
        std::mem::size_of::<Self>()
    }
}

/// Per-object constant block.
///
/// Contains per-object transformation data:
/// - World matrix (object space to world space)
/// - Inverse-transpose world matrix (for transforming normals correctly)
///
/// # Inverse Transpose
///
/// The inverse transpose of the world matrix is needed to transform normal
/// vectors correctly when the world matrix contains non-uniform scaling.
///
/// # Memory Layout (std140)
///
/// | Offset | Size | Field |
/// |--------|------|-------|
/// | 0      | 64   | world |
/// | 64     | 64   | world_inv_transpose |
///
/// Total size: 128 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct ObjectConstants {
    /// World matrix (object space to world space transformation).
    pub world: Mat4,
    /// Inverse transpose of the world matrix.
    ///
    /// Stored as Mat4 for alignment, but only the upper-left 3x3 is used.
    pub world_inv_transpose: Mat4,
}

impl ObjectConstants {
    /// Creates a new object constant block from the given world matrix.
    ///
    /// The inverse-transpose matrix is computed automatically.
    #[inline]
    pub fn new(world: Mat4) -> Self {
        Self {
            world,
            world_inv_transpose: Self::compute_inv_transpose(world),
        }
    }

    /// Computes the inverse transpose of a world matrix.
    ///
    /// # Non-invertible matrices
    ///
    /// If the world matrix is not invertible (e.g., contains zero scale),
    /// the identity matrix is returned as a fallback to avoid NaN/Inf values
    /// propagating to shaders.
    #[inline]
    pub fn compute_inv_transpose(world: Mat4) -> Mat4 {
        const EPSILON: f32 = 1e-6;
        let det = world.determinant();

        if det.abs() < EPSILON {
            Mat4::IDENTITY
        } else {
            world.inverse().transpose()
        }
    }

    /// Returns the size of this structure in bytes.
    #[inline]
    pub const fn size() -> usize {
        std::mem::size_of::<Self>()
    }
}

/// Per-material constant block.
///
/// # Memory Layout (std140)
///
/// | Offset | Size | Field |
/// |--------|------|-------|
/// | 0      | 64   | transform |
/// | 64     | 16   | diffuse_albedo |
/// | 80     | 12   | fresnel_r0 |
/// | 92     | 4    | roughness |
///
/// Total size: 96 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct MaterialConstants {
    /// Texture coordinate transform.
    pub transform: Mat4,
    /// Base diffuse color with opacity in the alpha channel.
    pub diffuse_albedo: Vec4,
    /// Fresnel reflectance at normal incidence.
    pub fresnel_r0: Vec3,
    /// Surface roughness in `[0, 1]`.
    pub roughness: f32,
}

impl MaterialConstants {
    /// Returns the size of this structure in bytes.
    #[inline]
    pub const fn size() -> usize {
        std::mem::size_of::<Self>()
    }
}

/// Bone palette of a skinned model.
///
/// Holds the final (object-space) bone transforms of one animated model and
/// their inverse transposes for normal skinning. The palette has a fixed
/// capacity of [`MAX_BONES`]; models with fewer bones leave the tail at
/// identity.
///
/// # Memory Layout (std140)
///
/// | Offset | Size  | Field |
/// |--------|-------|-------|
/// | 0      | 32000 | bone_transforms |
/// | 32000  | 32000 | bone_inv_transposes |
///
/// Total size: 64000 bytes
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct SkinnedConstants {
    /// Final bone transforms in object space.
    pub bone_transforms: [Mat4; MAX_BONES],
    /// Inverse transposes of the bone transforms.
    pub bone_inv_transposes: [Mat4; MAX_BONES],
}

impl SkinnedConstants {
    /// Writes a bone pose into the palette.
    ///
    /// Fills `bone_transforms[..bones.len()]` and the matching inverse
    /// transposes. Slots past the pose length keep their previous content.
    ///
    /// Callers must not pass more than [`MAX_BONES`] transforms; the excess
    /// is ignored in release builds.
    pub fn set_bones(&mut self, bones: &[Mat4]) {
        debug_assert!(
            bones.len() <= MAX_BONES,
            "bone pose of {} exceeds capacity {}",
            bones.len(),
            MAX_BONES
        );

        for (i, bone) in bones.iter().take(MAX_BONES).enumerate() {
            self.bone_transforms[i] = *bone;
            self.bone_inv_transposes[i] = ObjectConstants::compute_inv_transpose(*bone);
        }
    }

    /// Returns the size of this structure in bytes.
    #[inline]
    pub const fn size() -> usize {
        std::mem::size_of::<Self>()
    }
}

impl Default for SkinnedConstants {
    fn default() -> Self {
        Self {
            bone_transforms: [Mat4::IDENTITY; MAX_BONES],
            bone_inv_transposes: [Mat4::IDENTITY; MAX_BONES],
        }
    }
}

impl std::fmt::Debug for SkinnedConstants {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkinnedConstants")
            .field("capacity", &MAX_BONES)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn test_light_capacities() {
        assert_eq!(MAX_DIRECTIONAL_LIGHTS, 1);
        assert_eq!(MAX_POINT_LIGHTS, 10);
        assert_eq!(MAX_SPOT_LIGHTS, 1);
        assert_eq!(MAX_LIGHTS, 12);
    }

    #[test]
    fn test_gpu_light_size() {
        // 3 x Vec3 + 3 x f32 = 36 + 12 = 48 bytes
        assert_eq!(size_of::<GpuLight>(), 48);
        assert_eq!(GpuLight::size(), 48);
    }

    #[test]
    fn test_gpu_light_offsets() {
        assert_eq!(offset_of!(GpuLight, strength), 0);
        assert_eq!(offset_of!(GpuLight, falloff_start), 12);
        assert_eq!(offset_of!(GpuLight, direction), 16);
        assert_eq!(offset_of!(GpuLight, falloff_end), 28);
        assert_eq!(offset_of!(GpuLight, position), 32);
        assert_eq!(offset_of!(GpuLight, spot_power), 44);
    }

    #[test]
    fn test_gpu_light_directional() {
        let light = GpuLight::directional(Vec3::ONE, Vec3::new(0.0, -2.0, 0.0));

        assert_eq!(light.strength, Vec3::ONE);
        assert_eq!(light.direction, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(light.position, Vec3::ZERO);
        assert_eq!(light.spot_power, 0.0);
    }

    #[test]
    fn test_gpu_light_zero_direction() {
        // Zero-length direction should not produce NaN
        let light = GpuLight::directional(Vec3::ONE, Vec3::ZERO);

        assert_eq!(light.direction, Vec3::ZERO);
        assert!(!light.direction.x.is_nan());
        assert!(!light.direction.y.is_nan());
        assert!(!light.direction.z.is_nan());
    }

    #[test]
    fn test_gpu_light_point() {
        let light = GpuLight::point(Vec3::splat(0.8), Vec3::new(1.0, 2.0, 3.0), 1.0, 10.0);

        assert_eq!(light.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(light.falloff_start, 1.0);
        assert_eq!(light.falloff_end, 10.0);
        assert_eq!(light.direction, Vec3::ZERO);
    }

    #[test]
    fn test_gpu_light_spot() {
        let light = GpuLight::spot(
            Vec3::ONE,
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::new(0.0, -3.0, 0.0),
            1.0,
            20.0,
            64.0,
        );

        assert_eq!(light.direction, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(light.spot_power, 64.0);
    }

    #[test]
    fn test_pass_constants_size() {
        // 3 x Mat4 + 2 x Vec4 + 12 x GpuLight = 192 + 32 + 576 = 800 bytes
        assert_eq!(size_of::<PassConstants>(), 800);
        assert_eq!(PassConstants::size(), 800);
    }

    #[test]
    fn test_pass_constants_offsets() {
        assert_eq!(offset_of!(PassConstants, view), 0);
        assert_eq!(offset_of!(PassConstants, proj), 64);
        assert_eq!(offset_of!(PassConstants, shadow_transform), 128);
        assert_eq!(offset_of!(PassConstants, eye_pos), 192);
        assert_eq!(offset_of!(PassConstants, ambient_light), 208);
        assert_eq!(offset_of!(PassConstants, lights), 224);
    }

    #[test]
    fn test_object_constants_size() {
        // 2 x Mat4 = 128 bytes
        assert_eq!(size_of::<ObjectConstants>(), 128);
        assert_eq!(ObjectConstants::size(), 128);
    }

    #[test]
    fn test_object_constants_new() {
        let world = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let constants = ObjectConstants::new(world);

        assert_eq!(constants.world, world);
        let expected = world.inverse().transpose();
        assert_eq!(constants.world_inv_transpose, expected);
    }

    #[test]
    fn test_object_constants_inv_transpose_with_scale() {
        // Non-uniform scale should produce a different inverse transpose
        let world = Mat4::from_scale(Vec3::new(1.0, 2.0, 1.0));
        let constants = ObjectConstants::new(world);

        let expected = world.inverse().transpose();
        assert_eq!(constants.world_inv_transpose, expected);
        assert_ne!(constants.world_inv_transpose, world);
    }

    #[test]
    fn test_object_constants_non_invertible() {
        // Zero scale makes the matrix non-invertible
        let constants = ObjectConstants::new(Mat4::from_scale(Vec3::ZERO));

        // Should fall back to identity, not NaN
        assert_eq!(constants.world_inv_transpose, Mat4::IDENTITY);
    }

    #[test]
    fn test_material_constants_size() {
        // Mat4 + Vec4 + Vec3 + f32 = 64 + 16 + 12 + 4 = 96 bytes
        assert_eq!(size_of::<MaterialConstants>(), 96);
        assert_eq!(MaterialConstants::size(), 96);
    }

    #[test]
    fn test_material_constants_offsets() {
        assert_eq!(offset_of!(MaterialConstants, transform), 0);
        assert_eq!(offset_of!(MaterialConstants, diffuse_albedo), 64);
        assert_eq!(offset_of!(MaterialConstants, fresnel_r0), 80);
        assert_eq!(offset_of!(MaterialConstants, roughness), 92);
    }

    #[test]
    fn test_skinned_constants_size() {
        // 2 x 500 x Mat4 = 2 x 32000 = 64000 bytes
        assert_eq!(size_of::<SkinnedConstants>(), 64000);
        assert_eq!(SkinnedConstants::size(), 64000);
    }

    #[test]
    fn test_skinned_constants_default_is_identity() {
        let constants = SkinnedConstants::default();

        assert_eq!(constants.bone_transforms[0], Mat4::IDENTITY);
        assert_eq!(constants.bone_transforms[MAX_BONES - 1], Mat4::IDENTITY);
        assert_eq!(constants.bone_inv_transposes[250], Mat4::IDENTITY);
    }

    #[test]
    fn test_skinned_constants_set_bones() {
        let mut constants = SkinnedConstants::default();
        let pose = [
            Mat4::from_translation(Vec3::X),
            Mat4::from_scale(Vec3::splat(2.0)),
        ];

        constants.set_bones(&pose);

        assert_eq!(constants.bone_transforms[0], pose[0]);
        assert_eq!(constants.bone_transforms[1], pose[1]);
        assert_eq!(
            constants.bone_inv_transposes[1],
            pose[1].inverse().transpose()
        );
        // Untouched slots stay at identity
        assert_eq!(constants.bone_transforms[2], Mat4::IDENTITY);
    }

    #[test]
    fn test_bytemuck_cast() {
        // Verify that bytemuck can safely cast these types
        let pass = PassConstants::default();
        let bytes: &[u8] = bytemuck::bytes_of(&pass);
        assert_eq!(bytes.len(), PassConstants::size());

        let object = ObjectConstants::default();
        let bytes: &[u8] = bytemuck::bytes_of(&object);
        assert_eq!(bytes.len(), ObjectConstants::size());

        let material = MaterialConstants::default();
        let bytes: &[u8] = bytemuck::bytes_of(&material);
        assert_eq!(bytes.len(), MaterialConstants::size());

        let skinned = SkinnedConstants::default();
        let bytes: &[u8] = bytemuck::bytes_of(&skinned);
        assert_eq!(bytes.len(), SkinnedConstants::size());
    }
}
