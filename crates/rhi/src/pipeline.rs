//! Graphics pipeline management.
//!
//! This module handles VkPipeline and VkPipelineLayout creation for the
//! render passes of the frame graph.
//!
//! # Overview
//!
//! - [`PipelineLayout`] wraps VkPipelineLayout for descriptor set and push constant configuration
//! - [`Pipeline`] wraps VkPipeline for graphics pipeline state
//! - [`GraphicsPipelineBuilder`] provides a flexible builder for graphics pipeline creation
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::path::Path;
//! use ember_rhi::device::Device;
//! use ember_rhi::shader::{Shader, ShaderStage};
//! use ember_rhi::pipeline::{PipelineLayout, GraphicsPipelineBuilder};
//! use ember_rhi::vertex::Vertex;
//! use ash::vk;
//!
//! # fn example(device: Arc<Device>, render_pass: vk::RenderPass) -> Result<(), ember_rhi::RhiError> {
//! // Load shaders
//! let vertex_shader = Shader::from_spirv_file(
//!     device.clone(),
//!     Path::new("shaders/static.vert.spv"),
//!     ShaderStage::Vertex,
//!     "main",
//! )?;
//!
//! let fragment_shader = Shader::from_spirv_file(
//!     device.clone(),
//!     Path::new("shaders/gbuffer.frag.spv"),
//!     ShaderStage::Fragment,
//!     "main",
//! )?;
//!
//! // Create pipeline layout
//! let layout = PipelineLayout::new(device.clone(), &[], &[])?;
//!
//! // Build graphics pipeline against subpass 0 of the render pass
//! let pipeline = GraphicsPipelineBuilder::new()
//!     .name("example")
//!     .vertex_shader(&vertex_shader)
//!     .fragment_shader(&fragment_shader)
//!     .vertex_binding(Vertex::binding_description())
//!     .vertex_attributes(&Vertex::attribute_descriptions())
//!     .render_pass(render_pass)
//!     .build(device.clone(), &layout)?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::shader::Shader;

/// Vulkan pipeline layout wrapper.
///
/// A pipeline layout describes the complete set of resources that can be
/// accessed by a pipeline. This includes descriptor set layouts and push
/// constant ranges.
///
/// # Thread Safety
///
/// The pipeline layout is immutable after creation and can be safely shared
/// between threads.
pub struct PipelineLayout {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan pipeline layout handle.
    layout: vk::PipelineLayout,
}

impl PipelineLayout {
    /// Creates a new pipeline layout.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `descriptor_set_layouts` - Slice of descriptor set layout handles
    /// * `push_constant_ranges` - Slice of push constant ranges
    ///
    /// # Errors
    ///
    /// Returns an error if pipeline layout creation fails.
    pub fn new(
        device: Arc<Device>,
        descriptor_set_layouts: &[vk::DescriptorSetLayout],
        push_constant_ranges: &[vk::PushConstantRange],
    ) -> RhiResult<Self> {
        let create_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(descriptor_set_layouts)
            .push_constant_ranges(push_constant_ranges);

        let layout = unsafe { device.handle().create_pipeline_layout(&create_info, None)? };

        debug!(
            "Created pipeline layout with {} descriptor set layout(s) and {} push constant range(s)",
            descriptor_set_layouts.len(),
            push_constant_ranges.len()
        );

        Ok(Self { device, layout })
    }

    /// Returns the Vulkan pipeline layout handle.
    #[inline]
    pub fn handle(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for PipelineLayout {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_pipeline_layout(self.layout, None);
        }
        debug!("Pipeline layout destroyed");
    }
}

/// Vulkan graphics pipeline wrapper.
///
/// A pipeline encapsulates all the shader stages and fixed-function state
/// needed to process vertices and generate fragments.
///
/// # Thread Safety
///
/// The pipeline is immutable after creation and can be safely shared
/// between threads.
pub struct Pipeline {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan pipeline handle.
    pipeline: vk::Pipeline,
    /// Human-readable name used in logs.
    name: String,
}

impl Pipeline {
    /// Creates a graphics pipeline from a builder configuration.
    ///
    /// This is the internal constructor used by [`GraphicsPipelineBuilder`].
    fn create_graphics_internal(
        device: Arc<Device>,
        create_info: &vk::GraphicsPipelineCreateInfo,
        name: &str,
    ) -> RhiResult<Self> {
        let pipeline = unsafe {
            device
                .handle()
                .create_graphics_pipelines(vk::PipelineCache::null(), &[*create_info], None)
                .map_err(|(_, result)| result)?[0]
        };

        info!("Graphics pipeline '{}' created", name);

        Ok(Self {
            device,
            pipeline,
            name: name.to_owned(),
        })
    }

    /// Returns the Vulkan pipeline handle.
    #[inline]
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    /// Returns the pipeline name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_pipeline(self.pipeline, None);
        }
        debug!("Graphics pipeline '{}' destroyed", self.name);
    }
}

/// Primitive topology for input assembly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PrimitiveTopology {
    /// Independent points, expanded by a geometry shader.
    PointList,
    /// Independent triangles.
    #[default]
    TriangleList,
    /// Connected triangles with shared edges.
    TriangleStrip,
}

impl PrimitiveTopology {
    /// Converts to Vulkan primitive topology.
    pub fn to_vk(self) -> vk::PrimitiveTopology {
        match self {
            PrimitiveTopology::PointList => vk::PrimitiveTopology::POINT_LIST,
            PrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
            PrimitiveTopology::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
        }
    }
}

/// Face culling mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CullMode {
    /// Do not cull any faces.
    None,
    /// Cull front-facing triangles.
    Front,
    /// Cull back-facing triangles.
    #[default]
    Back,
}

impl CullMode {
    /// Converts to Vulkan cull mode flags.
    pub fn to_vk(self) -> vk::CullModeFlags {
        match self {
            CullMode::None => vk::CullModeFlags::NONE,
            CullMode::Front => vk::CullModeFlags::FRONT,
            CullMode::Back => vk::CullModeFlags::BACK,
        }
    }
}

/// Front face winding order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrontFace {
    /// Counter-clockwise winding is front-facing.
    #[default]
    CounterClockwise,
    /// Clockwise winding is front-facing.
    Clockwise,
}

impl FrontFace {
    /// Converts to Vulkan front face.
    pub fn to_vk(self) -> vk::FrontFace {
        match self {
            FrontFace::CounterClockwise => vk::FrontFace::COUNTER_CLOCKWISE,
            FrontFace::Clockwise => vk::FrontFace::CLOCKWISE,
        }
    }
}

/// Depth comparison operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompareOp {
    /// Never passes.
    Never,
    /// Passes if less than.
    #[default]
    Less,
    /// Passes if equal.
    Equal,
    /// Passes if less than or equal.
    LessOrEqual,
    /// Passes if greater than.
    Greater,
    /// Passes if not equal.
    NotEqual,
    /// Passes if greater than or equal.
    GreaterOrEqual,
    /// Always passes.
    Always,
}

impl CompareOp {
    /// Converts to Vulkan compare op.
    pub fn to_vk(self) -> vk::CompareOp {
        match self {
            CompareOp::Never => vk::CompareOp::NEVER,
            CompareOp::Less => vk::CompareOp::LESS,
            CompareOp::Equal => vk::CompareOp::EQUAL,
            CompareOp::LessOrEqual => vk::CompareOp::LESS_OR_EQUAL,
            CompareOp::Greater => vk::CompareOp::GREATER,
            CompareOp::NotEqual => vk::CompareOp::NOT_EQUAL,
            CompareOp::GreaterOrEqual => vk::CompareOp::GREATER_OR_EQUAL,
            CompareOp::Always => vk::CompareOp::ALWAYS,
        }
    }
}

/// Color blend attachment configuration.
#[derive(Clone, Copy, Debug)]
pub struct ColorBlendAttachment {
    /// Enable blending for this attachment.
    pub blend_enable: bool,
    /// Source color blend factor.
    pub src_color_blend_factor: vk::BlendFactor,
    /// Destination color blend factor.
    pub dst_color_blend_factor: vk::BlendFactor,
    /// Color blend operation.
    pub color_blend_op: vk::BlendOp,
    /// Source alpha blend factor.
    pub src_alpha_blend_factor: vk::BlendFactor,
    /// Destination alpha blend factor.
    pub dst_alpha_blend_factor: vk::BlendFactor,
    /// Alpha blend operation.
    pub alpha_blend_op: vk::BlendOp,
    /// Color write mask.
    pub color_write_mask: vk::ColorComponentFlags,
}

impl Default for ColorBlendAttachment {
    fn default() -> Self {
        Self {
            blend_enable: false,
            src_color_blend_factor: vk::BlendFactor::ONE,
            dst_color_blend_factor: vk::BlendFactor::ZERO,
            color_blend_op: vk::BlendOp::ADD,
            src_alpha_blend_factor: vk::BlendFactor::ONE,
            dst_alpha_blend_factor: vk::BlendFactor::ZERO,
            alpha_blend_op: vk::BlendOp::ADD,
            color_write_mask: vk::ColorComponentFlags::RGBA,
        }
    }
}

impl ColorBlendAttachment {
    /// Creates a blend attachment with alpha blending enabled.
    ///
    /// Uses standard alpha blending: `src * src_alpha + dst * (1 - src_alpha)`
    pub fn alpha_blend() -> Self {
        Self {
            blend_enable: true,
            src_color_blend_factor: vk::BlendFactor::SRC_ALPHA,
            dst_color_blend_factor: vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
            ..Self::default()
        }
    }

    /// Creates a blend attachment with additive blending enabled.
    ///
    /// Uses energy-accumulating blending: `src * src_alpha + dst`
    pub fn additive_blend() -> Self {
        Self {
            blend_enable: true,
            src_color_blend_factor: vk::BlendFactor::SRC_ALPHA,
            dst_color_blend_factor: vk::BlendFactor::ONE,
            ..Self::default()
        }
    }

    /// Converts to Vulkan pipeline color blend attachment state.
    pub fn to_vk(&self) -> vk::PipelineColorBlendAttachmentState {
        vk::PipelineColorBlendAttachmentState {
            blend_enable: self.blend_enable.into(),
            src_color_blend_factor: self.src_color_blend_factor,
            dst_color_blend_factor: self.dst_color_blend_factor,
            color_blend_op: self.color_blend_op,
            src_alpha_blend_factor: self.src_alpha_blend_factor,
            dst_alpha_blend_factor: self.dst_alpha_blend_factor,
            alpha_blend_op: self.alpha_blend_op,
            color_write_mask: self.color_write_mask,
        }
    }
}

/// Builder for creating graphics pipelines.
///
/// This builder provides a flexible way to configure all aspects of a
/// graphics pipeline. It uses sensible defaults for most settings:
///
/// - Primitive topology: Triangle list
/// - Cull mode: Back-face culling
/// - Front face: Counter-clockwise
/// - Depth test: Enabled
/// - Depth write: Enabled
/// - Depth compare op: Less
/// - Multisampling: 1 sample (no MSAA)
/// - Color attachments: 1, no blending
/// - Dynamic states: Viewport and Scissor
///
/// The vertex shader and render pass are required. The fragment shader is
/// optional so that depth-only pipelines can omit it, and a geometry shader
/// can be inserted for point expansion.
pub struct GraphicsPipelineBuilder<'a> {
    // Shader stages
    name: &'a str,
    vertex_shader: Option<&'a Shader>,
    geometry_shader: Option<&'a Shader>,
    fragment_shader: Option<&'a Shader>,
    fragment_specialization: Option<&'a vk::SpecializationInfo<'a>>,

    // Vertex input state
    vertex_bindings: Vec<vk::VertexInputBindingDescription>,
    vertex_attributes: Vec<vk::VertexInputAttributeDescription>,

    // Input assembly state
    topology: PrimitiveTopology,

    // Rasterization state
    cull_mode: CullMode,
    front_face: FrontFace,
    depth_bias_enable: bool,
    depth_bias_constant_factor: f32,
    depth_bias_clamp: f32,
    depth_bias_slope_factor: f32,

    // Depth/stencil state
    depth_test_enable: bool,
    depth_write_enable: bool,
    depth_compare_op: CompareOp,

    // Color blend state
    color_attachment_count: usize,
    color_blend_attachments: Vec<ColorBlendAttachment>,

    // Render pass target
    render_pass: vk::RenderPass,
    subpass: u32,

    // Dynamic state
    dynamic_states: Vec<vk::DynamicState>,
}

impl<'a> GraphicsPipelineBuilder<'a> {
    /// Creates a new graphics pipeline builder with default settings.
    pub fn new() -> Self {
        Self {
            name: "graphics",
            vertex_shader: None,
            geometry_shader: None,
            fragment_shader: None,
            fragment_specialization: None,

            vertex_bindings: Vec::new(),
            vertex_attributes: Vec::new(),

            topology: PrimitiveTopology::TriangleList,

            cull_mode: CullMode::Back,
            front_face: FrontFace::CounterClockwise,
            depth_bias_enable: false,
            depth_bias_constant_factor: 0.0,
            depth_bias_clamp: 0.0,
            depth_bias_slope_factor: 0.0,

            depth_test_enable: true,
            depth_write_enable: true,
            depth_compare_op: CompareOp::Less,

            color_attachment_count: 1,
            color_blend_attachments: Vec::new(),

            render_pass: vk::RenderPass::null(),
            subpass: 0,

            // Viewport and scissor are always set per frame
            dynamic_states: vec![vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR],
        }
    }

    /// Sets the pipeline name used in logs.
    pub fn name(mut self, name: &'a str) -> Self {
        self.name = name;
        self
    }

    /// Sets the vertex shader.
    ///
    /// The build will fail if no vertex shader is set.
    pub fn vertex_shader(mut self, shader: &'a Shader) -> Self {
        self.vertex_shader = Some(shader);
        self
    }

    /// Sets the geometry shader.
    pub fn geometry_shader(mut self, shader: &'a Shader) -> Self {
        self.geometry_shader = Some(shader);
        self
    }

    /// Sets the fragment shader.
    ///
    /// Pipelines without a fragment shader rasterize depth only.
    pub fn fragment_shader(mut self, shader: &'a Shader) -> Self {
        self.fragment_shader = Some(shader);
        self
    }

    /// Sets the specialization constants applied to the fragment stage.
    ///
    /// The referenced data must outlive the `build` call.
    pub fn fragment_specialization(mut self, info: &'a vk::SpecializationInfo<'a>) -> Self {
        self.fragment_specialization = Some(info);
        self
    }

    /// Adds a vertex input binding description.
    pub fn vertex_binding(mut self, binding: vk::VertexInputBindingDescription) -> Self {
        self.vertex_bindings.push(binding);
        self
    }

    /// Adds vertex input attribute descriptions.
    pub fn vertex_attributes(mut self, attributes: &[vk::VertexInputAttributeDescription]) -> Self {
        self.vertex_attributes.extend_from_slice(attributes);
        self
    }

    /// Sets the primitive topology.
    pub fn topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Sets the face culling mode.
    pub fn cull_mode(mut self, mode: CullMode) -> Self {
        self.cull_mode = mode;
        self
    }

    /// Sets the front face winding order.
    pub fn front_face(mut self, face: FrontFace) -> Self {
        self.front_face = face;
        self
    }

    /// Enables depth bias with the specified parameters.
    pub fn depth_bias(mut self, constant_factor: f32, clamp: f32, slope_factor: f32) -> Self {
        self.depth_bias_enable = true;
        self.depth_bias_constant_factor = constant_factor;
        self.depth_bias_clamp = clamp;
        self.depth_bias_slope_factor = slope_factor;
        self
    }

    /// Enables or disables depth testing.
    pub fn depth_test_enable(mut self, enable: bool) -> Self {
        self.depth_test_enable = enable;
        self
    }

    /// Enables or disables depth writing.
    pub fn depth_write_enable(mut self, enable: bool) -> Self {
        self.depth_write_enable = enable;
        self
    }

    /// Sets the depth comparison operation.
    pub fn depth_compare_op(mut self, op: CompareOp) -> Self {
        self.depth_compare_op = op;
        self
    }

    /// Sets the number of color attachments in the target subpass.
    ///
    /// Each attachment gets a no-blend state unless explicit blend
    /// attachments were added. Zero is valid for depth-only subpasses.
    pub fn color_attachment_count(mut self, count: usize) -> Self {
        self.color_attachment_count = count;
        self
    }

    /// Adds a color blend attachment configuration.
    ///
    /// When used, one attachment must be added per color attachment in the
    /// target subpass and `color_attachment_count` is ignored.
    pub fn color_blend_attachment(mut self, attachment: ColorBlendAttachment) -> Self {
        self.color_blend_attachments.push(attachment);
        self
    }

    /// Sets the render pass the pipeline will execute in.
    pub fn render_pass(mut self, render_pass: vk::RenderPass) -> Self {
        self.render_pass = render_pass;
        self
    }

    /// Sets the subpass index within the render pass. Defaults to 0.
    pub fn subpass(mut self, subpass: u32) -> Self {
        self.subpass = subpass;
        self
    }

    /// Builds the graphics pipeline.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `layout` - The pipeline layout
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The vertex shader is not set
    /// - The render pass is not set
    /// - Pipeline creation fails
    pub fn build(self, device: Arc<Device>, layout: &PipelineLayout) -> RhiResult<Pipeline> {
        // Validate required fields
        let vertex_shader = self.vertex_shader.ok_or_else(|| {
            RhiError::PipelineError(format!("Pipeline '{}': vertex shader is required", self.name))
        })?;

        if self.render_pass == vk::RenderPass::null() {
            return Err(RhiError::PipelineError(format!(
                "Pipeline '{}': render pass is required",
                self.name
            )));
        }

        // Assemble shader stage infos
        let mut shader_stages = vec![vertex_shader.stage_create_info()];

        if let Some(geometry_shader) = self.geometry_shader {
            shader_stages.push(geometry_shader.stage_create_info());
        }

        if let Some(fragment_shader) = self.fragment_shader {
            let mut stage = fragment_shader.stage_create_info();
            if let Some(specialization) = self.fragment_specialization {
                stage = stage.specialization_info(specialization);
            }
            shader_stages.push(stage);
        }

        // Vertex input state
        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&self.vertex_bindings)
            .vertex_attribute_descriptions(&self.vertex_attributes);

        // Input assembly state
        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(self.topology.to_vk())
            .primitive_restart_enable(false);

        // Viewport state (dynamic)
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        // Rasterization state
        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(self.cull_mode.to_vk())
            .front_face(self.front_face.to_vk())
            .depth_bias_enable(self.depth_bias_enable)
            .depth_bias_constant_factor(self.depth_bias_constant_factor)
            .depth_bias_clamp(self.depth_bias_clamp)
            .depth_bias_slope_factor(self.depth_bias_slope_factor);

        // Multisample state
        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        // Depth/stencil state
        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(self.depth_test_enable)
            .depth_write_enable(self.depth_write_enable)
            .depth_compare_op(self.depth_compare_op.to_vk())
            .max_depth_bounds(1.0);

        // Color blend attachments
        let color_blend_attachments: Vec<vk::PipelineColorBlendAttachmentState> =
            if self.color_blend_attachments.is_empty() {
                (0..self.color_attachment_count)
                    .map(|_| ColorBlendAttachment::default().to_vk())
                    .collect()
            } else {
                self.color_blend_attachments
                    .iter()
                    .map(|a| a.to_vk())
                    .collect()
            };

        // Color blend state
        let color_blend_state =
            vk::PipelineColorBlendStateCreateInfo::default().attachments(&color_blend_attachments);

        // Dynamic state
        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&self.dynamic_states);

        // Create pipeline
        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .depth_stencil_state(&depth_stencil_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(layout.handle())
            .render_pass(self.render_pass)
            .subpass(self.subpass);

        Pipeline::create_graphics_internal(device, &pipeline_info, self.name)
    }
}

impl Default for GraphicsPipelineBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_topology_to_vk() {
        assert_eq!(
            PrimitiveTopology::PointList.to_vk(),
            vk::PrimitiveTopology::POINT_LIST
        );
        assert_eq!(
            PrimitiveTopology::TriangleList.to_vk(),
            vk::PrimitiveTopology::TRIANGLE_LIST
        );
        assert_eq!(
            PrimitiveTopology::TriangleStrip.to_vk(),
            vk::PrimitiveTopology::TRIANGLE_STRIP
        );
    }

    #[test]
    fn test_cull_mode_to_vk() {
        assert_eq!(CullMode::None.to_vk(), vk::CullModeFlags::NONE);
        assert_eq!(CullMode::Front.to_vk(), vk::CullModeFlags::FRONT);
        assert_eq!(CullMode::Back.to_vk(), vk::CullModeFlags::BACK);
    }

    #[test]
    fn test_front_face_to_vk() {
        assert_eq!(
            FrontFace::CounterClockwise.to_vk(),
            vk::FrontFace::COUNTER_CLOCKWISE
        );
        assert_eq!(FrontFace::Clockwise.to_vk(), vk::FrontFace::CLOCKWISE);
    }

    #[test]
    fn test_compare_op_to_vk() {
        assert_eq!(CompareOp::Never.to_vk(), vk::CompareOp::NEVER);
        assert_eq!(CompareOp::Less.to_vk(), vk::CompareOp::LESS);
        assert_eq!(CompareOp::Equal.to_vk(), vk::CompareOp::EQUAL);
        assert_eq!(CompareOp::LessOrEqual.to_vk(), vk::CompareOp::LESS_OR_EQUAL);
        assert_eq!(CompareOp::Greater.to_vk(), vk::CompareOp::GREATER);
        assert_eq!(CompareOp::NotEqual.to_vk(), vk::CompareOp::NOT_EQUAL);
        assert_eq!(
            CompareOp::GreaterOrEqual.to_vk(),
            vk::CompareOp::GREATER_OR_EQUAL
        );
        assert_eq!(CompareOp::Always.to_vk(), vk::CompareOp::ALWAYS);
    }

    #[test]
    fn test_color_blend_attachment_default() {
        let attachment = ColorBlendAttachment::default();
        assert!(!attachment.blend_enable);
        assert_eq!(attachment.color_write_mask, vk::ColorComponentFlags::RGBA);
    }

    #[test]
    fn test_color_blend_attachment_alpha_blend() {
        let attachment = ColorBlendAttachment::alpha_blend();
        assert!(attachment.blend_enable);
        assert_eq!(attachment.src_color_blend_factor, vk::BlendFactor::SRC_ALPHA);
        assert_eq!(
            attachment.dst_color_blend_factor,
            vk::BlendFactor::ONE_MINUS_SRC_ALPHA
        );
    }

    #[test]
    fn test_color_blend_attachment_additive_blend() {
        let attachment = ColorBlendAttachment::additive_blend();
        assert!(attachment.blend_enable);
        assert_eq!(attachment.src_color_blend_factor, vk::BlendFactor::SRC_ALPHA);
        assert_eq!(attachment.dst_color_blend_factor, vk::BlendFactor::ONE);
        assert_eq!(attachment.color_blend_op, vk::BlendOp::ADD);
    }

    #[test]
    fn test_graphics_pipeline_builder_default() {
        let builder = GraphicsPipelineBuilder::new();
        assert!(builder.vertex_shader.is_none());
        assert!(builder.geometry_shader.is_none());
        assert!(builder.fragment_shader.is_none());
        assert!(builder.vertex_bindings.is_empty());
        assert!(builder.vertex_attributes.is_empty());
        assert_eq!(builder.topology, PrimitiveTopology::TriangleList);
        assert_eq!(builder.cull_mode, CullMode::Back);
        assert_eq!(builder.front_face, FrontFace::CounterClockwise);
        assert!(builder.depth_test_enable);
        assert!(builder.depth_write_enable);
        assert_eq!(builder.color_attachment_count, 1);
        assert_eq!(builder.render_pass, vk::RenderPass::null());
        assert_eq!(builder.subpass, 0);
        assert_eq!(builder.dynamic_states.len(), 2);
    }

    #[test]
    fn test_graphics_pipeline_builder_topology() {
        let builder = GraphicsPipelineBuilder::new().topology(PrimitiveTopology::PointList);
        assert_eq!(builder.topology, PrimitiveTopology::PointList);
    }

    #[test]
    fn test_graphics_pipeline_builder_depth_settings() {
        let builder = GraphicsPipelineBuilder::new()
            .depth_test_enable(false)
            .depth_write_enable(false)
            .depth_compare_op(CompareOp::Always);
        assert!(!builder.depth_test_enable);
        assert!(!builder.depth_write_enable);
        assert_eq!(builder.depth_compare_op, CompareOp::Always);
    }

    #[test]
    fn test_graphics_pipeline_builder_depth_bias() {
        let builder = GraphicsPipelineBuilder::new().depth_bias(20.0, 0.0, 1.0);
        assert!(builder.depth_bias_enable);
        assert_eq!(builder.depth_bias_constant_factor, 20.0);
        assert_eq!(builder.depth_bias_slope_factor, 1.0);
    }

    #[test]
    fn test_graphics_pipeline_builder_color_attachments() {
        let builder = GraphicsPipelineBuilder::new()
            .color_attachment_count(4)
            .subpass(1);
        assert_eq!(builder.color_attachment_count, 4);
        assert_eq!(builder.subpass, 1);
    }

    #[test]
    fn test_default_trait_implementations() {
        let topo: PrimitiveTopology = Default::default();
        assert_eq!(topo, PrimitiveTopology::TriangleList);

        let cull: CullMode = Default::default();
        assert_eq!(cull, CullMode::Back);

        let face: FrontFace = Default::default();
        assert_eq!(face, FrontFace::CounterClockwise);

        let op: CompareOp = Default::default();
        assert_eq!(op, CompareOp::Less);
    }
}
