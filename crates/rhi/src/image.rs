//! Render-target image management.
//!
//! This module handles the offscreen images a frame is rendered into: color
//! targets, G-buffer layers read back as input attachments, depth buffers and
//! the sampled shadow map. Each [`AttachmentImage`] owns a VkImage, its
//! GPU-only memory allocation and a full-image view.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ember_rhi::device::Device;
//! use ember_rhi::image::{AttachmentImage, AttachmentUsage};
//! use ash::vk;
//!
//! # fn example(device: Arc<Device>) -> Result<(), ember_rhi::RhiError> {
//! let depth = AttachmentImage::new(
//!     device,
//!     "scene_depth",
//!     1920,
//!     1080,
//!     vk::Format::D32_SFLOAT,
//!     AttachmentUsage::Depth,
//! )?;
//!
//! let view = depth.view();
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::{debug, info};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// How an attachment image is consumed beyond being rendered into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachmentUsage {
    /// Color target only
    Color,
    /// Color target read back as a subpass input attachment
    ColorInput,
    /// Color target sampled by a later pass
    ColorSampled,
    /// Depth target only
    Depth,
    /// Depth target sampled by a later pass (shadow map)
    DepthSampled,
}

impl AttachmentUsage {
    /// Converts to Vulkan image usage flags.
    pub fn to_vk_usage(self) -> vk::ImageUsageFlags {
        match self {
            AttachmentUsage::Color => vk::ImageUsageFlags::COLOR_ATTACHMENT,
            AttachmentUsage::ColorInput => {
                vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::INPUT_ATTACHMENT
            }
            AttachmentUsage::ColorSampled => {
                vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::SAMPLED
            }
            AttachmentUsage::Depth => vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
            AttachmentUsage::DepthSampled => {
                vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT | vk::ImageUsageFlags::SAMPLED
            }
        }
    }

    /// Returns the image aspect covered by views of this attachment.
    pub fn aspect(self) -> vk::ImageAspectFlags {
        match self {
            AttachmentUsage::Color | AttachmentUsage::ColorInput | AttachmentUsage::ColorSampled => {
                vk::ImageAspectFlags::COLOR
            }
            AttachmentUsage::Depth | AttachmentUsage::DepthSampled => vk::ImageAspectFlags::DEPTH,
        }
    }
}

/// Offscreen render-target image with managed memory and a full-image view.
///
/// # Resource Destruction
///
/// Resources are destroyed in the following order:
/// 1. Image view
/// 2. Image
/// 3. Memory allocation
pub struct AttachmentImage {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan image handle.
    image: vk::Image,
    /// Vulkan image view handle.
    view: vk::ImageView,
    /// GPU memory allocation.
    allocation: Option<Allocation>,
    /// Image format.
    format: vk::Format,
    /// Image dimensions.
    extent: vk::Extent2D,
    /// Debug name used for allocation tracking and logs.
    name: String,
}

impl AttachmentImage {
    /// Creates a new attachment image with the specified dimensions, format
    /// and usage.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `name` - Debug name for allocation tracking and logs
    /// * `width` - Width in pixels
    /// * `height` - Height in pixels
    /// * `format` - Image format
    /// * `usage` - How the attachment is consumed
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The dimensions are zero
    /// - Image creation fails
    /// - Memory allocation fails
    /// - Image view creation fails
    pub fn new(
        device: Arc<Device>,
        name: &str,
        width: u32,
        height: u32,
        format: vk::Format,
        usage: AttachmentUsage,
    ) -> RhiResult<Self> {
        if width == 0 || height == 0 {
            return Err(RhiError::InvalidHandle(format!(
                "Attachment '{}' dimensions must be greater than 0",
                name
            )));
        }

        let extent = vk::Extent2D { width, height };

        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D {
                width,
                height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(usage.to_vk_usage())
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe { device.handle().create_image(&image_info, None)? };

        // Get memory requirements and allocate
        let requirements = unsafe { device.handle().get_image_memory_requirements(image) };

        let allocation = {
            let mut allocator = device.allocator().lock().unwrap();
            allocator.allocate(&AllocationCreateDesc {
                name,
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false, // Optimal tiling is not linear
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })?
        };

        // Bind memory to image
        unsafe {
            device
                .handle()
                .bind_image_memory(image, allocation.memory(), allocation.offset())?;
        }

        // Create image view
        let view_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(usage.aspect())
                    .base_mip_level(0)
                    .level_count(1)
                    .base_array_layer(0)
                    .layer_count(1),
            );

        let view = unsafe { device.handle().create_image_view(&view_info, None)? };

        info!(
            "Created attachment '{}': {}x{} ({:?})",
            name, width, height, format
        );

        Ok(Self {
            device,
            image,
            view,
            allocation: Some(allocation),
            format,
            extent,
            name: name.to_string(),
        })
    }

    /// Returns the Vulkan image handle.
    #[inline]
    pub fn image(&self) -> vk::Image {
        self.image
    }

    /// Returns the Vulkan image view handle.
    #[inline]
    pub fn view(&self) -> vk::ImageView {
        self.view
    }

    /// Returns the image format.
    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Returns the image extent (width and height).
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Returns the width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.extent.width
    }

    /// Returns the height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.extent.height
    }
}

impl Drop for AttachmentImage {
    fn drop(&mut self) {
        // Destroy resources in correct order:
        // 1. Image view (depends on image)
        // 2. Image (depends on allocation)
        // 3. Allocation (frees memory)
        unsafe {
            self.device.handle().destroy_image_view(self.view, None);
            self.device.handle().destroy_image(self.image, None);
        }

        // Free allocation
        if let Some(allocation) = self.allocation.take() {
            let mut allocator = self.device.allocator().lock().unwrap();
            if let Err(e) = allocator.free(allocation) {
                tracing::error!("Failed to free attachment allocation: {:?}", e);
            }
        }

        debug!(
            "Destroyed attachment '{}': {}x{}",
            self.name, self.extent.width, self.extent.height
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_flags() {
        assert_eq!(
            AttachmentUsage::Color.to_vk_usage(),
            vk::ImageUsageFlags::COLOR_ATTACHMENT
        );
        assert!(
            AttachmentUsage::ColorInput
                .to_vk_usage()
                .contains(vk::ImageUsageFlags::INPUT_ATTACHMENT)
        );
        assert!(
            AttachmentUsage::ColorSampled
                .to_vk_usage()
                .contains(vk::ImageUsageFlags::SAMPLED)
        );
        assert!(
            AttachmentUsage::DepthSampled
                .to_vk_usage()
                .contains(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
        );
    }

    #[test]
    fn test_usage_aspect() {
        assert_eq!(
            AttachmentUsage::Color.aspect(),
            vk::ImageAspectFlags::COLOR
        );
        assert_eq!(
            AttachmentUsage::ColorInput.aspect(),
            vk::ImageAspectFlags::COLOR
        );
        assert_eq!(AttachmentUsage::Depth.aspect(), vk::ImageAspectFlags::DEPTH);
        assert_eq!(
            AttachmentUsage::DepthSampled.aspect(),
            vk::ImageAspectFlags::DEPTH
        );
    }
}
