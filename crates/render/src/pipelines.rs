//! Shader catalog, pipeline layouts and the scene pipeline set.
//!
//! Every pipeline the graph needs is built once at scene upload. Fragment
//! shaders that shade materials carry specialization constant 0, set to the
//! shading model they are compiled for, so each model gets its own pipeline
//! variant and the shader compiler can strip the unused paths.

use std::path::Path;
use std::sync::Arc;

use ember_resources::ShadingModel;
use ember_rhi::device::Device;
use ember_rhi::pipeline::{
    ColorBlendAttachment, CompareOp, CullMode, FrontFace, GraphicsPipelineBuilder, Pipeline,
    PipelineLayout, PrimitiveTopology,
};
use ember_rhi::shader::{Shader, ShaderStage};
use ember_rhi::vertex::{ParticleVertex, SkinnedVertex, Vertex};
use ember_rhi::{RhiResult, vk};
use tracing::info;

use crate::binding::SceneLayouts;
use crate::graph::{GEOMETRY_SUBPASS, LIGHTING_SUBPASS, RenderGraph};

/// Set index of the object table in the scene layout.
pub const OBJECT_SET: u32 = 0;
/// Set index of the material table in the scene layout.
pub const MATERIAL_SET: u32 = 1;
/// Set index of the pass table in the scene layout.
pub const PASS_SET: u32 = 2;
/// Set index of the shadow-sampling table in the scene layout.
pub const SHADOW_SET: u32 = 3;
/// Set index of the skinned table in the scene layout.
pub const SKINNED_SET: u32 = 4;

/// Depth bias applied while rendering the shadow map.
const SHADOW_DEPTH_BIAS: (f32, f32, f32) = (20.0, 0.0, 1.0);

/// Every shader module the passes use, loaded from one directory.
pub struct ShaderCatalog {
    pub(crate) static_vert: Shader,
    pub(crate) skinned_vert: Shader,
    pub(crate) gbuffer_frag: Shader,
    pub(crate) forward_frag: Shader,
    pub(crate) shadow_vert: Shader,
    pub(crate) shadow_skinned_vert: Shader,
    pub(crate) lighting_vert: Shader,
    pub(crate) lighting_frag: Shader,
    pub(crate) skybox_vert: Shader,
    pub(crate) skybox_frag: Shader,
    pub(crate) particle_vert: Shader,
    pub(crate) particle_geom: Shader,
    pub(crate) particle_frag: Shader,
}

impl ShaderCatalog {
    /// Loads every SPIR-V module from `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if a file is missing, malformed or module creation
    /// fails.
    pub fn load(device: &Arc<Device>, dir: &Path) -> RhiResult<Self> {
        let load = |file: &str, stage: ShaderStage| {
            Shader::from_spirv_file(device.clone(), &dir.join(file), stage, "main")
        };

        let catalog = Self {
            static_vert: load("static.vert.spv", ShaderStage::Vertex)?,
            skinned_vert: load("skinned.vert.spv", ShaderStage::Vertex)?,
            gbuffer_frag: load("gbuffer.frag.spv", ShaderStage::Fragment)?,
            forward_frag: load("forward.frag.spv", ShaderStage::Fragment)?,
            shadow_vert: load("shadow.vert.spv", ShaderStage::Vertex)?,
            shadow_skinned_vert: load("shadow_skinned.vert.spv", ShaderStage::Vertex)?,
            lighting_vert: load("lighting.vert.spv", ShaderStage::Vertex)?,
            lighting_frag: load("lighting.frag.spv", ShaderStage::Fragment)?,
            skybox_vert: load("skybox.vert.spv", ShaderStage::Vertex)?,
            skybox_frag: load("skybox.frag.spv", ShaderStage::Fragment)?,
            particle_vert: load("particle.vert.spv", ShaderStage::Vertex)?,
            particle_geom: load("particle.geom.spv", ShaderStage::Geometry)?,
            particle_frag: load("particle.frag.spv", ShaderStage::Fragment)?,
        };
        info!(dir = %dir.display(), "loaded shader catalog");
        Ok(catalog)
    }
}

/// The three pipeline layouts the passes share.
///
/// Mesh pipelines (shadow, G-buffer, forward skinned, particles) all use
/// the scene layout so descriptor bindings survive pipeline switches within
/// a pass.
pub struct PipelineLayouts {
    scene: PipelineLayout,
    lighting: PipelineLayout,
    skybox: PipelineLayout,
}

impl PipelineLayouts {
    /// Creates the layouts from the shared set layouts.
    ///
    /// # Errors
    ///
    /// Returns an error if layout creation fails.
    pub fn new(device: &Arc<Device>, layouts: &SceneLayouts) -> RhiResult<Self> {
        let scene = PipelineLayout::new(
            device.clone(),
            &[
                layouts.object().handle(),
                layouts.material().handle(),
                layouts.pass().handle(),
                layouts.shadow_sampling().handle(),
                layouts.skinned().handle(),
            ],
            &[],
        )?;
        let lighting = PipelineLayout::new(
            device.clone(),
            &[
                layouts.gbuffer_input().handle(),
                layouts.pass().handle(),
                layouts.shadow_sampling().handle(),
            ],
            &[],
        )?;
        let skybox = PipelineLayout::new(
            device.clone(),
            &[layouts.skybox().handle(), layouts.pass().handle()],
            &[],
        )?;

        Ok(Self {
            scene,
            lighting,
            skybox,
        })
    }

    /// Returns the layout mesh and particle pipelines bind with.
    #[inline]
    pub fn scene(&self) -> &PipelineLayout {
        &self.scene
    }

    /// Returns the lighting-subpass layout.
    #[inline]
    pub fn lighting(&self) -> &PipelineLayout {
        &self.lighting
    }

    /// Returns the skybox layout.
    #[inline]
    pub fn skybox(&self) -> &PipelineLayout {
        &self.skybox
    }
}

/// All graphics pipelines for the fixed pass sequence.
pub struct ScenePipelines {
    shadow_static: Pipeline,
    shadow_skinned: Pipeline,
    gbuffer: [Pipeline; 3],
    lighting: Pipeline,
    forward_skinned: [Pipeline; 3],
    skybox: Pipeline,
    particle_additive: Pipeline,
    particle_alpha: Pipeline,
}

impl ScenePipelines {
    /// Builds every pipeline against the graph's render passes.
    ///
    /// # Errors
    ///
    /// Returns an error if any pipeline fails to build.
    pub fn new(
        device: &Arc<Device>,
        shaders: &ShaderCatalog,
        layouts: &PipelineLayouts,
        graph: &RenderGraph,
    ) -> RhiResult<Self> {
        let gbuffer = [
            Self::build_gbuffer(device, shaders, layouts, graph, ShadingModel::Unlit)?,
            Self::build_gbuffer(device, shaders, layouts, graph, ShadingModel::Diffuse)?,
            Self::build_gbuffer(device, shaders, layouts, graph, ShadingModel::NormalMapped)?,
        ];
        let forward_skinned = [
            Self::build_forward_skinned(device, shaders, layouts, graph, ShadingModel::Unlit)?,
            Self::build_forward_skinned(device, shaders, layouts, graph, ShadingModel::Diffuse)?,
            Self::build_forward_skinned(
                device,
                shaders,
                layouts,
                graph,
                ShadingModel::NormalMapped,
            )?,
        ];

        let pipelines = Self {
            shadow_static: Self::build_shadow(device, shaders, layouts, graph, false)?,
            shadow_skinned: Self::build_shadow(device, shaders, layouts, graph, true)?,
            gbuffer,
            lighting: Self::build_lighting(device, shaders, layouts, graph)?,
            forward_skinned,
            skybox: Self::build_skybox(device, shaders, layouts, graph)?,
            particle_additive: Self::build_particle(device, shaders, layouts, graph, true)?,
            particle_alpha: Self::build_particle(device, shaders, layouts, graph, false)?,
        };
        info!("built scene pipelines");
        Ok(pipelines)
    }

    fn build_shadow(
        device: &Arc<Device>,
        shaders: &ShaderCatalog,
        layouts: &PipelineLayouts,
        graph: &RenderGraph,
        skinned: bool,
    ) -> RhiResult<Pipeline> {
        let (name, shader, binding, attributes) = if skinned {
            (
                "shadow_skinned",
                &shaders.shadow_skinned_vert,
                SkinnedVertex::binding_description(),
                SkinnedVertex::attribute_descriptions().to_vec(),
            )
        } else {
            (
                "shadow_static",
                &shaders.shadow_vert,
                Vertex::binding_description(),
                Vertex::attribute_descriptions().to_vec(),
            )
        };

        let (constant, clamp, slope) = SHADOW_DEPTH_BIAS;
        GraphicsPipelineBuilder::new()
            .name(name)
            .vertex_shader(shader)
            .vertex_binding(binding)
            .vertex_attributes(&attributes)
            .cull_mode(CullMode::None)
            .front_face(FrontFace::Clockwise)
            .depth_bias(constant, clamp, slope)
            .color_attachment_count(0)
            .render_pass(graph.shadow_render_pass().handle())
            .build(device.clone(), layouts.scene())
    }

    fn build_gbuffer(
        device: &Arc<Device>,
        shaders: &ShaderCatalog,
        layouts: &PipelineLayouts,
        graph: &RenderGraph,
        model: ShadingModel,
    ) -> RhiResult<Pipeline> {
        let entries = [specialization_entry()];
        let value = model.specialization_value().to_le_bytes();
        let spec = vk::SpecializationInfo::default()
            .map_entries(&entries)
            .data(&value);

        let name = format!("gbuffer_{model}");
        let attributes = Vertex::attribute_descriptions();
        GraphicsPipelineBuilder::new()
            .name(&name)
            .vertex_shader(&shaders.static_vert)
            .fragment_shader(&shaders.gbuffer_frag)
            .fragment_specialization(&spec)
            .vertex_binding(Vertex::binding_description())
            .vertex_attributes(&attributes)
            .cull_mode(CullMode::None)
            .front_face(FrontFace::Clockwise)
            .color_attachment_count(4)
            .render_pass(graph.deferred_render_pass().handle())
            .subpass(GEOMETRY_SUBPASS)
            .build(device.clone(), layouts.scene())
    }

    fn build_lighting(
        device: &Arc<Device>,
        shaders: &ShaderCatalog,
        layouts: &PipelineLayouts,
        graph: &RenderGraph,
    ) -> RhiResult<Pipeline> {
        // Fullscreen triangle strip generated in the vertex shader; no
        // vertex input at all.
        GraphicsPipelineBuilder::new()
            .name("deferred_lighting")
            .vertex_shader(&shaders.lighting_vert)
            .fragment_shader(&shaders.lighting_frag)
            .topology(PrimitiveTopology::TriangleStrip)
            .cull_mode(CullMode::None)
            .depth_test_enable(false)
            .depth_write_enable(false)
            .render_pass(graph.deferred_render_pass().handle())
            .subpass(LIGHTING_SUBPASS)
            .build(device.clone(), layouts.lighting())
    }

    fn build_forward_skinned(
        device: &Arc<Device>,
        shaders: &ShaderCatalog,
        layouts: &PipelineLayouts,
        graph: &RenderGraph,
        model: ShadingModel,
    ) -> RhiResult<Pipeline> {
        let entries = [specialization_entry()];
        let value = model.specialization_value().to_le_bytes();
        let spec = vk::SpecializationInfo::default()
            .map_entries(&entries)
            .data(&value);

        let name = format!("forward_skinned_{model}");
        let attributes = SkinnedVertex::attribute_descriptions();
        GraphicsPipelineBuilder::new()
            .name(&name)
            .vertex_shader(&shaders.skinned_vert)
            .fragment_shader(&shaders.forward_frag)
            .fragment_specialization(&spec)
            .vertex_binding(SkinnedVertex::binding_description())
            .vertex_attributes(&attributes)
            .cull_mode(CullMode::None)
            .front_face(FrontFace::Clockwise)
            .render_pass(graph.forward_render_pass().handle())
            .build(device.clone(), layouts.scene())
    }

    fn build_skybox(
        device: &Arc<Device>,
        shaders: &ShaderCatalog,
        layouts: &PipelineLayouts,
        graph: &RenderGraph,
    ) -> RhiResult<Pipeline> {
        let attributes = Vertex::attribute_descriptions();
        GraphicsPipelineBuilder::new()
            .name("skybox")
            .vertex_shader(&shaders.skybox_vert)
            .fragment_shader(&shaders.skybox_frag)
            .vertex_binding(Vertex::binding_description())
            .vertex_attributes(&attributes)
            .cull_mode(CullMode::None)
            .front_face(FrontFace::Clockwise)
            .depth_compare_op(CompareOp::LessOrEqual)
            .depth_write_enable(false)
            .render_pass(graph.forward_render_pass().handle())
            .build(device.clone(), layouts.skybox())
    }

    fn build_particle(
        device: &Arc<Device>,
        shaders: &ShaderCatalog,
        layouts: &PipelineLayouts,
        graph: &RenderGraph,
        additive: bool,
    ) -> RhiResult<Pipeline> {
        let (name, blend) = if additive {
            ("particle_additive", ColorBlendAttachment::additive_blend())
        } else {
            ("particle_alpha", ColorBlendAttachment::alpha_blend())
        };

        let attributes = ParticleVertex::attribute_descriptions();
        GraphicsPipelineBuilder::new()
            .name(name)
            .vertex_shader(&shaders.particle_vert)
            .geometry_shader(&shaders.particle_geom)
            .fragment_shader(&shaders.particle_frag)
            .vertex_binding(ParticleVertex::binding_description())
            .vertex_attributes(&attributes)
            .topology(PrimitiveTopology::PointList)
            .cull_mode(CullMode::None)
            .depth_compare_op(CompareOp::LessOrEqual)
            .depth_write_enable(false)
            .color_blend_attachment(blend)
            .render_pass(graph.forward_render_pass().handle())
            .build(device.clone(), layouts.scene())
    }

    #[inline]
    pub fn shadow_static(&self) -> &Pipeline {
        &self.shadow_static
    }

    #[inline]
    pub fn shadow_skinned(&self) -> &Pipeline {
        &self.shadow_skinned
    }

    /// Returns the G-buffer fill pipeline for a shading model.
    #[inline]
    pub fn gbuffer(&self, model: ShadingModel) -> &Pipeline {
        &self.gbuffer[model as usize]
    }

    #[inline]
    pub fn lighting(&self) -> &Pipeline {
        &self.lighting
    }

    /// Returns the forward skinned pipeline for a shading model.
    #[inline]
    pub fn forward_skinned(&self, model: ShadingModel) -> &Pipeline {
        &self.forward_skinned[model as usize]
    }

    #[inline]
    pub fn skybox(&self) -> &Pipeline {
        &self.skybox
    }

    #[inline]
    pub fn particle_additive(&self) -> &Pipeline {
        &self.particle_additive
    }

    #[inline]
    pub fn particle_alpha(&self) -> &Pipeline {
        &self.particle_alpha
    }
}

fn specialization_entry() -> vk::SpecializationMapEntry {
    vk::SpecializationMapEntry::default()
        .constant_id(0)
        .offset(0)
        .size(std::mem::size_of::<u32>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specialization_entry_is_constant_zero() {
        let entry = specialization_entry();
        assert_eq!(entry.constant_id, 0);
        assert_eq!(entry.offset, 0);
        assert_eq!(entry.size, 4);
    }

    #[test]
    fn test_shading_models_index_pipeline_arrays() {
        for (index, model) in ShadingModel::ALL.into_iter().enumerate() {
            assert_eq!(model as usize, index);
        }
    }
}
