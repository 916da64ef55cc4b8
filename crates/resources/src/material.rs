//! Material definitions.
//!
//! A [`Material`] is passive data: shading parameters plus the image views
//! the renderer binds for it. Uploading constants and writing descriptor
//! tables happens elsewhere; materials only describe what to bind.

use ember_rhi::vk;
use glam::{Mat4, Vec3, Vec4};

use crate::constants::MaterialConstants;

/// Shading model of a material.
///
/// The discriminant doubles as the specialization-constant value compiled
/// into the fragment shader, so G-buffer and forward pipelines exist once
/// per variant.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShadingModel {
    /// Albedo is emitted unmodified; lighting is skipped.
    Unlit = 0,
    /// Lambertian diffuse with the interpolated vertex normal.
    #[default]
    Diffuse = 1,
    /// Diffuse with the normal fetched from a tangent-space normal map.
    NormalMapped = 2,
}

impl ShadingModel {
    /// Every shading model, in specialization-value order.
    pub const ALL: [ShadingModel; 3] = [
        ShadingModel::Unlit,
        ShadingModel::Diffuse,
        ShadingModel::NormalMapped,
    ];

    /// Value written into specialization constant 0.
    #[inline]
    pub const fn specialization_value(self) -> u32 {
        self as u32
    }

    /// Short name for logging.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            ShadingModel::Unlit => "unlit",
            ShadingModel::Diffuse => "diffuse",
            ShadingModel::NormalMapped => "normal_mapped",
        }
    }
}

impl std::fmt::Display for ShadingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Sampler a material's textures are read through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SamplerKind {
    /// Linear filtering with repeat addressing.
    #[default]
    LinearRepeat,
    /// Linear filtering clamped to an opaque black border.
    LinearBorder,
}

/// Shading parameters and texture bindings of one material.
#[derive(Clone, Debug)]
pub struct Material {
    name: String,
    shading_model: ShadingModel,
    sampler: SamplerKind,
    /// Texture coordinate transform.
    pub transform: Mat4,
    /// Base diffuse color with opacity in the alpha channel.
    pub diffuse_albedo: Vec4,
    /// Fresnel reflectance at normal incidence.
    pub fresnel_r0: Vec3,
    /// Surface roughness in `[0, 1]`.
    pub roughness: f32,
    diffuse_view: vk::ImageView,
    normal_view: Option<vk::ImageView>,
}

impl Material {
    /// Creates a material with neutral parameters.
    ///
    /// # Arguments
    ///
    /// * `name` - Registry key; must be unique within a scene
    /// * `shading_model` - Shading model the material renders with
    /// * `diffuse_view` - View of the diffuse texture
    pub fn new(
        name: impl Into<String>,
        shading_model: ShadingModel,
        diffuse_view: vk::ImageView,
    ) -> Self {
        Self {
            name: name.into(),
            shading_model,
            sampler: SamplerKind::default(),
            transform: Mat4::IDENTITY,
            diffuse_albedo: Vec4::ONE,
            fresnel_r0: Vec3::splat(0.04),
            roughness: 0.5,
            diffuse_view,
            normal_view: None,
        }
    }

    /// Sets the normal-map view.
    pub fn with_normal_map(mut self, view: vk::ImageView) -> Self {
        self.normal_view = Some(view);
        self
    }

    /// Sets the diffuse albedo.
    pub fn with_albedo(mut self, albedo: Vec4) -> Self {
        self.diffuse_albedo = albedo;
        self
    }

    /// Sets the Fresnel reflectance at normal incidence.
    pub fn with_fresnel(mut self, fresnel_r0: Vec3) -> Self {
        self.fresnel_r0 = fresnel_r0;
        self
    }

    /// Sets the surface roughness.
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    /// Sets the texture coordinate transform.
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Sets the sampler the material's textures are read through.
    pub fn with_sampler(mut self, sampler: SamplerKind) -> Self {
        self.sampler = sampler;
        self
    }

    /// Returns the registry name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the shading model.
    #[inline]
    pub fn shading_model(&self) -> ShadingModel {
        self.shading_model
    }

    /// Returns the sampler kind.
    #[inline]
    pub fn sampler(&self) -> SamplerKind {
        self.sampler
    }

    /// Returns the diffuse texture view.
    #[inline]
    pub fn diffuse_view(&self) -> vk::ImageView {
        self.diffuse_view
    }

    /// Returns the view bound in the secondary texture slot.
    ///
    /// Materials without a normal map alias the diffuse view there so the
    /// slot is never unbound.
    #[inline]
    pub fn secondary_view(&self) -> vk::ImageView {
        self.normal_view.unwrap_or(self.diffuse_view)
    }

    /// Returns the constant block uploaded for this material.
    #[inline]
    pub fn constants(&self) -> MaterialConstants {
        MaterialConstants {
            transform: self.transform,
            diffuse_albedo: self.diffuse_albedo,
            fresnel_r0: self.fresnel_r0,
            roughness: self.roughness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shading_model_specialization_values() {
        assert_eq!(ShadingModel::Unlit.specialization_value(), 0);
        assert_eq!(ShadingModel::Diffuse.specialization_value(), 1);
        assert_eq!(ShadingModel::NormalMapped.specialization_value(), 2);
    }

    #[test]
    fn test_shading_model_all_ordering() {
        for (i, model) in ShadingModel::ALL.iter().enumerate() {
            assert_eq!(model.specialization_value(), i as u32);
        }
    }

    #[test]
    fn test_material_defaults() {
        let material = Material::new("brick", ShadingModel::Diffuse, vk::ImageView::null());

        assert_eq!(material.name(), "brick");
        assert_eq!(material.shading_model(), ShadingModel::Diffuse);
        assert_eq!(material.sampler(), SamplerKind::LinearRepeat);
        assert_eq!(material.transform, Mat4::IDENTITY);
        assert_eq!(material.diffuse_albedo, Vec4::ONE);
        assert_eq!(material.roughness, 0.5);
    }

    #[test]
    fn test_material_builder() {
        let material = Material::new("tile", ShadingModel::NormalMapped, vk::ImageView::null())
            .with_albedo(Vec4::new(0.9, 0.9, 1.0, 1.0))
            .with_fresnel(Vec3::splat(0.1))
            .with_roughness(0.2)
            .with_sampler(SamplerKind::LinearBorder);

        assert_eq!(material.diffuse_albedo, Vec4::new(0.9, 0.9, 1.0, 1.0));
        assert_eq!(material.fresnel_r0, Vec3::splat(0.1));
        assert_eq!(material.roughness, 0.2);
        assert_eq!(material.sampler(), SamplerKind::LinearBorder);
    }

    #[test]
    fn test_material_constants() {
        let material = Material::new("floor", ShadingModel::Diffuse, vk::ImageView::null())
            .with_transform(Mat4::from_scale(Vec3::splat(4.0)))
            .with_roughness(0.8);

        let constants = material.constants();
        assert_eq!(constants.transform, material.transform);
        assert_eq!(constants.diffuse_albedo, material.diffuse_albedo);
        assert_eq!(constants.roughness, 0.8);
    }

    #[test]
    fn test_secondary_view_falls_back_to_diffuse() {
        let plain = Material::new("plain", ShadingModel::Diffuse, vk::ImageView::null());
        assert_eq!(plain.secondary_view(), plain.diffuse_view());

        let mapped = Material::new("mapped", ShadingModel::NormalMapped, vk::ImageView::null())
            .with_normal_map(vk::ImageView::null());
        assert_eq!(mapped.secondary_view(), vk::ImageView::null());
    }
}
