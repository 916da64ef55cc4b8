//! Render pass and framebuffer objects.
//!
//! The frame is structured as classic Vulkan render passes: a deferred pass
//! whose lighting stage is a subpass reading the G-buffer as input
//! attachments, plus dedicated shadow and forward passes. [`RenderPass`] and
//! [`Framebuffer`] wrap the corresponding handles with device-lifetime
//! cleanup; the pass topology itself (attachments, subpasses, dependencies)
//! is described by the caller through the raw create info.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ash::vk;
//! use ember_rhi::device::Device;
//! use ember_rhi::render_pass::{Framebuffer, RenderPass};
//!
//! # fn example(device: Arc<Device>, create_info: vk::RenderPassCreateInfo, view: vk::ImageView) -> Result<(), ember_rhi::RhiError> {
//! let pass = RenderPass::new(device.clone(), &create_info, "forward")?;
//! let framebuffer = Framebuffer::new(device, pass.handle(), &[view], 1920, 1080, "forward")?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Vulkan render pass wrapper.
pub struct RenderPass {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan render pass handle.
    render_pass: vk::RenderPass,
    /// Debug name used in logs.
    name: String,
}

impl RenderPass {
    /// Creates a new render pass from a complete create info.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `create_info` - Attachment, subpass and dependency descriptions
    /// * `name` - Debug name used in logs
    ///
    /// # Errors
    ///
    /// Returns an error if render pass creation fails.
    pub fn new(
        device: Arc<Device>,
        create_info: &vk::RenderPassCreateInfo,
        name: &str,
    ) -> RhiResult<Self> {
        let render_pass = unsafe { device.handle().create_render_pass(create_info, None)? };

        debug!(
            "Created render pass '{}': {} attachment(s), {} subpass(es)",
            name, create_info.attachment_count, create_info.subpass_count
        );

        Ok(Self {
            device,
            render_pass,
            name: name.to_string(),
        })
    }

    /// Returns the Vulkan render pass handle.
    #[inline]
    pub fn handle(&self) -> vk::RenderPass {
        self.render_pass
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_render_pass(self.render_pass, None);
        }
        debug!("Destroyed render pass '{}'", self.name);
    }
}

/// Vulkan framebuffer wrapper binding attachment views to a render pass.
pub struct Framebuffer {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan framebuffer handle.
    framebuffer: vk::Framebuffer,
    /// Framebuffer dimensions.
    extent: vk::Extent2D,
    /// Debug name used in logs.
    name: String,
}

impl Framebuffer {
    /// Creates a new framebuffer.
    ///
    /// The attachment views must match the render pass's attachment list in
    /// order, count and format.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `render_pass` - The render pass the framebuffer is used with
    /// * `attachments` - One view per render pass attachment, in order
    /// * `width` - Width in pixels
    /// * `height` - Height in pixels
    /// * `name` - Debug name used in logs
    ///
    /// # Errors
    ///
    /// Returns an error if the dimensions are zero or framebuffer creation
    /// fails.
    pub fn new(
        device: Arc<Device>,
        render_pass: vk::RenderPass,
        attachments: &[vk::ImageView],
        width: u32,
        height: u32,
        name: &str,
    ) -> RhiResult<Self> {
        if width == 0 || height == 0 {
            return Err(RhiError::InvalidHandle(format!(
                "Framebuffer '{}' dimensions must be greater than 0",
                name
            )));
        }

        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass)
            .attachments(attachments)
            .width(width)
            .height(height)
            .layers(1);

        let framebuffer = unsafe { device.handle().create_framebuffer(&create_info, None)? };

        debug!(
            "Created framebuffer '{}': {}x{}, {} attachment(s)",
            name,
            width,
            height,
            attachments.len()
        );

        Ok(Self {
            device,
            framebuffer,
            extent: vk::Extent2D { width, height },
            name: name.to_string(),
        })
    }

    /// Returns the Vulkan framebuffer handle.
    #[inline]
    pub fn handle(&self) -> vk::Framebuffer {
        self.framebuffer
    }

    /// Returns the framebuffer extent (width and height).
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_framebuffer(self.framebuffer, None);
        }
        debug!("Destroyed framebuffer '{}'", self.name);
    }
}
