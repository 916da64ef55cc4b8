//! Texture samplers.
//!
//! The renderer uses a fixed set of samplers: linear-repeat for material
//! textures, linear-clamp-to-border for offscreen reads, and a comparison
//! sampler for shadow-map PCF. Each preset is a constructor on [`Sampler`].

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;

/// Vulkan sampler wrapper.
pub struct Sampler {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan sampler handle.
    sampler: vk::Sampler,
    /// Preset name for logs.
    kind: &'static str,
}

impl Sampler {
    /// Linear filtering with repeat addressing, for material textures.
    pub fn linear_repeat(device: Arc<Device>) -> RhiResult<Self> {
        let info = vk::SamplerCreateInfo::default()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
            .address_mode_u(vk::SamplerAddressMode::REPEAT)
            .address_mode_v(vk::SamplerAddressMode::REPEAT)
            .address_mode_w(vk::SamplerAddressMode::REPEAT)
            .min_lod(0.0)
            .max_lod(1.0);

        Self::new(device, &info, "linear_repeat")
    }

    /// Linear filtering clamped to an opaque black border, for reads of
    /// offscreen targets.
    pub fn linear_border(device: Arc<Device>) -> RhiResult<Self> {
        let info = vk::SamplerCreateInfo::default()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
            .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_BORDER)
            .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_BORDER)
            .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_BORDER)
            .border_color(vk::BorderColor::FLOAT_OPAQUE_BLACK)
            .min_lod(0.0)
            .max_lod(1.0);

        Self::new(device, &info, "linear_border")
    }

    /// Comparison sampler for shadow-map PCF.
    ///
    /// The opaque white border makes fragments outside the shadow volume
    /// resolve as lit.
    pub fn shadow_comparison(device: Arc<Device>) -> RhiResult<Self> {
        let info = vk::SamplerCreateInfo::default()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
            .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_BORDER)
            .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_BORDER)
            .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_BORDER)
            .border_color(vk::BorderColor::FLOAT_OPAQUE_WHITE)
            .compare_enable(true)
            .compare_op(vk::CompareOp::LESS_OR_EQUAL)
            .min_lod(0.0)
            .max_lod(1.0);

        Self::new(device, &info, "shadow_comparison")
    }

    fn new(
        device: Arc<Device>,
        info: &vk::SamplerCreateInfo,
        kind: &'static str,
    ) -> RhiResult<Self> {
        let sampler = unsafe { device.handle().create_sampler(info, None)? };

        debug!("Created {} sampler", kind);

        Ok(Self {
            device,
            sampler,
            kind,
        })
    }

    /// Returns the Vulkan sampler handle.
    #[inline]
    pub fn handle(&self) -> vk::Sampler {
        self.sampler
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_sampler(self.sampler, None);
        }
        debug!("Destroyed {} sampler", self.kind);
    }
}
