//! Fixed multi-pass render graph.
//!
//! Three render passes run in order each frame:
//!
//! 1. **Shadow** renders scene depth from the primary light into a
//!    fixed-size map.
//! 2. **Deferred** holds two subpasses: geometry fills four G-buffer
//!    targets, then a lighting subpass reads them back as input attachments
//!    and resolves into the scene color target. The dependency between the
//!    subpasses is by-region, so tiled GPUs can keep the G-buffer on chip.
//! 3. **Forward** loads scene color and depth, then draws skinned meshes,
//!    the sky sphere and particles on top of the deferred result.
//!
//! After the forward pass the scene color target is left in shader-readable
//! layout; an external post or UI pass samples it through the post-input
//! table.

use std::sync::Arc;

use ember_rhi::command::CommandBuffer;
use ember_rhi::device::Device;
use ember_rhi::image::{AttachmentImage, AttachmentUsage};
use ember_rhi::render_pass::{Framebuffer, RenderPass};
use ember_rhi::{RhiResult, vk};
use tracing::{debug, info};

/// Shadow map edge length in texels.
pub const SHADOW_MAP_SIZE: u32 = 2048;

/// Depth format for the shadow map and the scene depth target.
pub const DEPTH_FORMAT: vk::Format = vk::Format::D32_SFLOAT;

/// G-buffer target formats: diffuse, normal, material, position.
pub const GBUFFER_FORMATS: [vk::Format; 4] = [
    vk::Format::R8G8B8A8_UNORM,
    vk::Format::R16G16B16A16_SFLOAT,
    vk::Format::R8G8B8A8_UNORM,
    vk::Format::R16G16B16A16_SFLOAT,
];

/// HDR scene color format.
pub const SCENE_COLOR_FORMAT: vk::Format = vk::Format::R16G16B16A16_SFLOAT;

/// Subpass index of the deferred geometry fill.
pub const GEOMETRY_SUBPASS: u32 = 0;
/// Subpass index of the deferred lighting resolve.
pub const LIGHTING_SUBPASS: u32 = 1;

/// The render targets, passes and framebuffers of one frame.
pub struct RenderGraph {
    device: Arc<Device>,
    extent: vk::Extent2D,
    shadow_framebuffer: Framebuffer,
    deferred_framebuffer: Framebuffer,
    forward_framebuffer: Framebuffer,
    shadow_map: AttachmentImage,
    gbuffer: [AttachmentImage; 4],
    scene_color: AttachmentImage,
    scene_depth: AttachmentImage,
    shadow_pass: RenderPass,
    deferred_pass: RenderPass,
    forward_pass: RenderPass,
}

impl RenderGraph {
    /// Creates every attachment, render pass and framebuffer.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `width` - Output width in pixels
    /// * `height` - Output height in pixels
    ///
    /// # Errors
    ///
    /// Returns an error if attachment, render pass or framebuffer creation
    /// fails.
    pub fn new(device: Arc<Device>, width: u32, height: u32) -> RhiResult<Self> {
        let shadow_map = AttachmentImage::new(
            device.clone(),
            "shadow_map",
            SHADOW_MAP_SIZE,
            SHADOW_MAP_SIZE,
            DEPTH_FORMAT,
            AttachmentUsage::DepthSampled,
        )?;
        let (gbuffer, scene_color, scene_depth) = Self::create_sized_targets(&device, width, height)?;

        let shadow_pass = Self::build_shadow_pass(&device)?;
        let deferred_pass = Self::build_deferred_pass(&device)?;
        let forward_pass = Self::build_forward_pass(&device)?;

        let shadow_framebuffer = Framebuffer::new(
            device.clone(),
            shadow_pass.handle(),
            &[shadow_map.view()],
            SHADOW_MAP_SIZE,
            SHADOW_MAP_SIZE,
            "shadow_framebuffer",
        )?;
        let (deferred_framebuffer, forward_framebuffer) = Self::create_framebuffers(
            &device,
            &deferred_pass,
            &forward_pass,
            &gbuffer,
            &scene_color,
            &scene_depth,
            width,
            height,
        )?;

        info!(width, height, "created render graph");

        Ok(Self {
            device,
            extent: vk::Extent2D { width, height },
            shadow_framebuffer,
            deferred_framebuffer,
            forward_framebuffer,
            shadow_map,
            gbuffer,
            scene_color,
            scene_depth,
            shadow_pass,
            deferred_pass,
            forward_pass,
        })
    }

    fn create_sized_targets(
        device: &Arc<Device>,
        width: u32,
        height: u32,
    ) -> RhiResult<([AttachmentImage; 4], AttachmentImage, AttachmentImage)> {
        let gbuffer = [
            AttachmentImage::new(
                device.clone(),
                "gbuffer_diffuse",
                width,
                height,
                GBUFFER_FORMATS[0],
                AttachmentUsage::ColorInput,
            )?,
            AttachmentImage::new(
                device.clone(),
                "gbuffer_normal",
                width,
                height,
                GBUFFER_FORMATS[1],
                AttachmentUsage::ColorInput,
            )?,
            AttachmentImage::new(
                device.clone(),
                "gbuffer_material",
                width,
                height,
                GBUFFER_FORMATS[2],
                AttachmentUsage::ColorInput,
            )?,
            AttachmentImage::new(
                device.clone(),
                "gbuffer_position",
                width,
                height,
                GBUFFER_FORMATS[3],
                AttachmentUsage::ColorInput,
            )?,
        ];
        let scene_color = AttachmentImage::new(
            device.clone(),
            "scene_color",
            width,
            height,
            SCENE_COLOR_FORMAT,
            AttachmentUsage::ColorSampled,
        )?;
        let scene_depth = AttachmentImage::new(
            device.clone(),
            "scene_depth",
            width,
            height,
            DEPTH_FORMAT,
            AttachmentUsage::Depth,
        )?;
        Ok((gbuffer, scene_color, scene_depth))
    }

    #[allow(clippy::too_many_arguments)]
    fn create_framebuffers(
        device: &Arc<Device>,
        deferred_pass: &RenderPass,
        forward_pass: &RenderPass,
        gbuffer: &[AttachmentImage; 4],
        scene_color: &AttachmentImage,
        scene_depth: &AttachmentImage,
        width: u32,
        height: u32,
    ) -> RhiResult<(Framebuffer, Framebuffer)> {
        let deferred_attachments = [
            gbuffer[0].view(),
            gbuffer[1].view(),
            gbuffer[2].view(),
            gbuffer[3].view(),
            scene_color.view(),
            scene_depth.view(),
        ];
        let deferred_framebuffer = Framebuffer::new(
            device.clone(),
            deferred_pass.handle(),
            &deferred_attachments,
            width,
            height,
            "deferred_framebuffer",
        )?;

        let forward_attachments = [scene_color.view(), scene_depth.view()];
        let forward_framebuffer = Framebuffer::new(
            device.clone(),
            forward_pass.handle(),
            &forward_attachments,
            width,
            height,
            "forward_framebuffer",
        )?;

        Ok((deferred_framebuffer, forward_framebuffer))
    }

    fn build_shadow_pass(device: &Arc<Device>) -> RhiResult<RenderPass> {
        let attachment = vk::AttachmentDescription::default()
            .format(DEPTH_FORMAT)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);

        let depth_ref = vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        };
        let subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .depth_stencil_attachment(&depth_ref);

        let dependencies = [
            // Last frame's sampling finishes before the clear.
            vk::SubpassDependency::default()
                .src_subpass(vk::SUBPASS_EXTERNAL)
                .dst_subpass(0)
                .src_stage_mask(vk::PipelineStageFlags::FRAGMENT_SHADER)
                .src_access_mask(vk::AccessFlags::SHADER_READ)
                .dst_stage_mask(vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS)
                .dst_access_mask(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE),
            // The map is complete before the lit passes sample it.
            vk::SubpassDependency::default()
                .src_subpass(0)
                .dst_subpass(vk::SUBPASS_EXTERNAL)
                .src_stage_mask(vk::PipelineStageFlags::LATE_FRAGMENT_TESTS)
                .src_access_mask(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE)
                .dst_stage_mask(vk::PipelineStageFlags::FRAGMENT_SHADER)
                .dst_access_mask(vk::AccessFlags::SHADER_READ),
        ];

        let info = vk::RenderPassCreateInfo::default()
            .attachments(std::slice::from_ref(&attachment))
            .subpasses(std::slice::from_ref(&subpass))
            .dependencies(&dependencies);
        RenderPass::new(device.clone(), &info, "shadow_pass")
    }

    fn build_deferred_pass(device: &Arc<Device>) -> RhiResult<RenderPass> {
        let color_template = vk::AttachmentDescription::default()
            .samples(vk::SampleCountFlags::TYPE_1)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let attachments = [
            // G-buffer targets live only within this pass.
            color_template
                .format(GBUFFER_FORMATS[0])
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::DONT_CARE)
                .final_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL),
            color_template
                .format(GBUFFER_FORMATS[1])
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::DONT_CARE)
                .final_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL),
            color_template
                .format(GBUFFER_FORMATS[2])
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::DONT_CARE)
                .final_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL),
            color_template
                .format(GBUFFER_FORMATS[3])
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::DONT_CARE)
                .final_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL),
            // Scene color continues into the forward pass.
            color_template
                .format(SCENE_COLOR_FORMAT)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::STORE)
                .final_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL),
            // Scene depth continues into the forward pass.
            color_template
                .format(DEPTH_FORMAT)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::STORE)
                .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
        ];

        let gbuffer_color_refs: [vk::AttachmentReference; 4] = std::array::from_fn(|i| {
            vk::AttachmentReference {
                attachment: i as u32,
                layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            }
        });
        let gbuffer_input_refs: [vk::AttachmentReference; 4] = std::array::from_fn(|i| {
            vk::AttachmentReference {
                attachment: i as u32,
                layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            }
        });
        let scene_color_ref = vk::AttachmentReference {
            attachment: 4,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        };
        let depth_ref = vk::AttachmentReference {
            attachment: 5,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        };

        let subpasses = [
            vk::SubpassDescription::default()
                .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                .color_attachments(&gbuffer_color_refs)
                .depth_stencil_attachment(&depth_ref),
            vk::SubpassDescription::default()
                .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                .input_attachments(&gbuffer_input_refs)
                .color_attachments(std::slice::from_ref(&scene_color_ref)),
        ];

        let dependencies = [
            vk::SubpassDependency::default()
                .src_subpass(vk::SUBPASS_EXTERNAL)
                .dst_subpass(GEOMETRY_SUBPASS)
                .src_stage_mask(
                    vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                        | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
                )
                .src_access_mask(vk::AccessFlags::empty())
                .dst_stage_mask(
                    vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                        | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
                )
                .dst_access_mask(
                    vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                        | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
                ),
            // G-buffer handoff to the lighting subpass, per region.
            vk::SubpassDependency::default()
                .src_subpass(GEOMETRY_SUBPASS)
                .dst_subpass(LIGHTING_SUBPASS)
                .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
                .src_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
                .dst_stage_mask(vk::PipelineStageFlags::FRAGMENT_SHADER)
                .dst_access_mask(vk::AccessFlags::INPUT_ATTACHMENT_READ)
                .dependency_flags(vk::DependencyFlags::BY_REGION),
            // Depth is complete before the forward pass tests against it.
            vk::SubpassDependency::default()
                .src_subpass(GEOMETRY_SUBPASS)
                .dst_subpass(vk::SUBPASS_EXTERNAL)
                .src_stage_mask(vk::PipelineStageFlags::LATE_FRAGMENT_TESTS)
                .src_access_mask(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE)
                .dst_stage_mask(vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS)
                .dst_access_mask(
                    vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
                        | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
                ),
            // Scene color is complete before the forward pass blends on top.
            vk::SubpassDependency::default()
                .src_subpass(LIGHTING_SUBPASS)
                .dst_subpass(vk::SUBPASS_EXTERNAL)
                .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
                .src_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
                .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
                .dst_access_mask(
                    vk::AccessFlags::COLOR_ATTACHMENT_READ
                        | vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
                ),
        ];

        let info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);
        RenderPass::new(device.clone(), &info, "deferred_pass")
    }

    fn build_forward_pass(device: &Arc<Device>) -> RhiResult<RenderPass> {
        let attachments = [
            vk::AttachmentDescription::default()
                .format(SCENE_COLOR_FORMAT)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::LOAD)
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                .final_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL),
            vk::AttachmentDescription::default()
                .format(DEPTH_FORMAT)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::LOAD)
                .store_op(vk::AttachmentStoreOp::DONT_CARE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
        ];

        let color_ref = vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        };
        let depth_ref = vk::AttachmentReference {
            attachment: 1,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        };
        let subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(std::slice::from_ref(&color_ref))
            .depth_stencil_attachment(&depth_ref);

        let dependencies = [
            vk::SubpassDependency::default()
                .src_subpass(vk::SUBPASS_EXTERNAL)
                .dst_subpass(0)
                .src_stage_mask(
                    vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                        | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
                )
                .src_access_mask(
                    vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                        | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
                )
                .dst_stage_mask(
                    vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                        | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
                )
                .dst_access_mask(
                    vk::AccessFlags::COLOR_ATTACHMENT_READ
                        | vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                        | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
                        | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
                ),
            // Scene color is readable by the external post pass.
            vk::SubpassDependency::default()
                .src_subpass(0)
                .dst_subpass(vk::SUBPASS_EXTERNAL)
                .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
                .src_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
                .dst_stage_mask(vk::PipelineStageFlags::FRAGMENT_SHADER)
                .dst_access_mask(vk::AccessFlags::SHADER_READ),
        ];

        let info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(std::slice::from_ref(&subpass))
            .dependencies(&dependencies);
        RenderPass::new(device.clone(), &info, "forward_pass")
    }

    /// Recreates the window-sized targets and their framebuffers.
    ///
    /// The shadow map and all render passes survive a resize. A zero extent
    /// is ignored so a minimized window does not tear anything down. The
    /// caller must ensure the device is idle.
    ///
    /// # Errors
    ///
    /// Returns an error if attachment or framebuffer creation fails.
    pub fn resize(&mut self, width: u32, height: u32) -> RhiResult<()> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        if self.extent.width == width && self.extent.height == height {
            return Ok(());
        }

        let (gbuffer, scene_color, scene_depth) =
            Self::create_sized_targets(&self.device, width, height)?;
        let (deferred_framebuffer, forward_framebuffer) = Self::create_framebuffers(
            &self.device,
            &self.deferred_pass,
            &self.forward_pass,
            &gbuffer,
            &scene_color,
            &scene_depth,
            width,
            height,
        )?;

        self.gbuffer = gbuffer;
        self.scene_color = scene_color;
        self.scene_depth = scene_depth;
        self.deferred_framebuffer = deferred_framebuffer;
        self.forward_framebuffer = forward_framebuffer;
        self.extent = vk::Extent2D { width, height };

        debug!(width, height, "resized render graph targets");
        Ok(())
    }

    /// Begins the shadow pass, clearing the map to the far plane.
    pub fn begin_shadow(&self, cmd: &CommandBuffer) {
        let clears = [vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue {
                depth: 1.0,
                stencil: 0,
            },
        }];
        let info = vk::RenderPassBeginInfo::default()
            .render_pass(self.shadow_pass.handle())
            .framebuffer(self.shadow_framebuffer.handle())
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: self.shadow_extent(),
            })
            .clear_values(&clears);
        cmd.begin_render_pass(&info);
    }

    /// Begins the deferred pass, clearing every target.
    pub fn begin_deferred(&self, cmd: &CommandBuffer) {
        let zero = vk::ClearValue {
            color: vk::ClearColorValue {
                float32: [0.0, 0.0, 0.0, 0.0],
            },
        };
        let clears = [
            zero,
            zero,
            zero,
            zero,
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: [0.0, 0.0, 0.0, 1.0],
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            },
        ];
        let info = vk::RenderPassBeginInfo::default()
            .render_pass(self.deferred_pass.handle())
            .framebuffer(self.deferred_framebuffer.handle())
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: self.extent,
            })
            .clear_values(&clears);
        cmd.begin_render_pass(&info);
    }

    /// Begins the forward pass. Both attachments load the deferred result.
    pub fn begin_forward(&self, cmd: &CommandBuffer) {
        let info = vk::RenderPassBeginInfo::default()
            .render_pass(self.forward_pass.handle())
            .framebuffer(self.forward_framebuffer.handle())
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: self.extent,
            });
        cmd.begin_render_pass(&info);
    }

    /// Returns a full-extent viewport for the main passes.
    pub fn main_viewport(&self) -> vk::Viewport {
        Self::full_viewport(self.extent)
    }

    /// Returns a full-extent scissor for the main passes.
    pub fn main_scissor(&self) -> vk::Rect2D {
        vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: self.extent,
        }
    }

    /// Returns the shadow-map viewport.
    pub fn shadow_viewport(&self) -> vk::Viewport {
        Self::full_viewport(self.shadow_extent())
    }

    /// Returns the shadow-map scissor.
    pub fn shadow_scissor(&self) -> vk::Rect2D {
        vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: self.shadow_extent(),
        }
    }

    fn full_viewport(extent: vk::Extent2D) -> vk::Viewport {
        vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }

    fn shadow_extent(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: SHADOW_MAP_SIZE,
            height: SHADOW_MAP_SIZE,
        }
    }

    /// Returns the current output extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    #[inline]
    pub fn shadow_render_pass(&self) -> &RenderPass {
        &self.shadow_pass
    }

    #[inline]
    pub fn deferred_render_pass(&self) -> &RenderPass {
        &self.deferred_pass
    }

    /// Returns the forward pass, which external UI pipelines can target.
    #[inline]
    pub fn forward_render_pass(&self) -> &RenderPass {
        &self.forward_pass
    }

    /// Returns the forward framebuffer, for external passes that draw into
    /// the scene color target.
    #[inline]
    pub fn forward_framebuffer(&self) -> &Framebuffer {
        &self.forward_framebuffer
    }

    #[inline]
    pub fn shadow_map_view(&self) -> vk::ImageView {
        self.shadow_map.view()
    }

    /// Returns the four G-buffer views in subpass-input order.
    pub fn gbuffer_views(&self) -> [vk::ImageView; 4] {
        [
            self.gbuffer[0].view(),
            self.gbuffer[1].view(),
            self.gbuffer[2].view(),
            self.gbuffer[3].view(),
        ]
    }

    /// Returns the scene color view an external post pass samples.
    #[inline]
    pub fn scene_color_view(&self) -> vk::ImageView {
        self.scene_color.view()
    }
}
