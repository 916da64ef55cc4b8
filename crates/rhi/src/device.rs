//! Vulkan logical device and queue management.
//!
//! This module handles VkDevice creation, queue retrieval, and gpu-allocator initialization.
//!
//! # Overview
//!
//! The [`Device`] struct provides a safe abstraction over the Vulkan logical device,
//! including:
//! - Logical device creation with required features
//! - Queue retrieval for graphics and transfer operations
//! - Memory allocation via gpu-allocator
//!
//! Every resource wrapper in this crate takes an `Arc<Device>`; the device is
//! the single explicit context threaded through the renderer.
//!
//! # Example
//!
//! ```no_run
//! use ember_rhi::instance::Instance;
//! use ember_rhi::physical_device::select_physical_device;
//! use ember_rhi::device::Device;
//!
//! let instance = Instance::new(false).expect("Failed to create instance");
//! let physical_device_info = select_physical_device(instance.handle())
//!     .expect("No suitable GPU found");
//!
//! let device = Device::new(&instance, &physical_device_info)
//!     .expect("Failed to create logical device");
//!
//! let graphics_queue = device.graphics_queue();
//! ```

use std::sync::{Arc, Mutex};

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use tracing::{debug, info};

use crate::error::RhiError;
use crate::instance::Instance;
use crate::physical_device::{PhysicalDeviceInfo, QueueFamilyIndices};

/// Vulkan logical device wrapper.
///
/// This struct manages the lifetime of the Vulkan logical device and its associated
/// resources including queues and the memory allocator.
///
/// # Thread Safety
///
/// The [`Device`] is designed to be shared across threads using `Arc`. The internal
/// allocator is protected by a `Mutex` for thread-safe memory allocation.
pub struct Device {
    /// Vulkan logical device handle.
    device: ash::Device,
    /// Physical device handle.
    physical_device: vk::PhysicalDevice,
    /// Physical device limits (alignments, max dimensions).
    limits: vk::PhysicalDeviceLimits,
    /// GPU memory allocator (thread-safe via Mutex).
    allocator: Mutex<Allocator>,
    /// Graphics queue handle.
    graphics_queue: vk::Queue,
    /// Transfer queue handle (may be the same as the graphics queue).
    transfer_queue: vk::Queue,
    /// Queue family indices.
    queue_families: QueueFamilyIndices,
}

impl Device {
    /// Creates a new logical device.
    ///
    /// This function creates a Vulkan logical device with the geometry-shader
    /// feature enabled (required by the particle pipelines) and initializes
    /// the gpu-allocator for memory management. No device extensions are
    /// required; the renderer draws into offscreen attachments through
    /// classic render passes.
    ///
    /// # Arguments
    ///
    /// * `instance` - The Vulkan instance
    /// * `physical_device_info` - Information about the selected physical device
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Device creation fails
    /// - Allocator initialization fails
    pub fn new(
        instance: &Instance,
        physical_device_info: &PhysicalDeviceInfo,
    ) -> Result<Arc<Self>, RhiError> {
        let queue_families = &physical_device_info.queue_families;

        // Create queue create infos for unique queue families
        let unique_families = queue_families.unique_families();
        let queue_priorities = [1.0f32];

        let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = unique_families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(family)
                    .queue_priorities(&queue_priorities)
            })
            .collect();

        debug!(
            "Creating {} queue(s) for families: {:?}",
            queue_create_infos.len(),
            unique_families
        );

        // Enable base device features
        let features = vk::PhysicalDeviceFeatures::default().geometry_shader(true);

        // Create device
        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_features(&features);

        let device = unsafe {
            instance
                .handle()
                .create_device(physical_device_info.device, &create_info, None)?
        };

        info!("Logical device created");

        // Retrieve queues; queue families are guaranteed complete by selection
        let graphics_family = queue_families
            .graphics_family
            .ok_or(RhiError::NoSuitableGpu)?;
        let transfer_family = queue_families
            .transfer_family
            .unwrap_or(graphics_family);

        let graphics_queue = unsafe { device.get_device_queue(graphics_family, 0) };
        debug!("Graphics queue retrieved from family {}", graphics_family);

        let transfer_queue = unsafe { device.get_device_queue(transfer_family, 0) };
        debug!("Transfer queue retrieved from family {}", transfer_family);

        // Initialize gpu-allocator
        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.handle().clone(),
            device: device.clone(),
            physical_device: physical_device_info.device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        })?;

        info!("GPU memory allocator initialized");

        Ok(Arc::new(Self {
            device,
            physical_device: physical_device_info.device,
            limits: physical_device_info.properties.limits,
            allocator: Mutex::new(allocator),
            graphics_queue,
            transfer_queue,
            queue_families: physical_device_info.queue_families,
        }))
    }

    /// Returns the Vulkan logical device handle.
    #[inline]
    pub fn handle(&self) -> &ash::Device {
        &self.device
    }

    /// Returns the physical device handle.
    #[inline]
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Returns the physical device limits.
    #[inline]
    pub fn limits(&self) -> &vk::PhysicalDeviceLimits {
        &self.limits
    }

    /// Returns the minimum alignment for uniform-buffer binding offsets.
    ///
    /// Element strides of constant buffers are rounded up to this value.
    #[inline]
    pub fn min_uniform_offset_alignment(&self) -> u64 {
        self.limits.min_uniform_buffer_offset_alignment
    }

    /// Returns the graphics queue handle.
    #[inline]
    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    /// Returns the transfer queue handle.
    ///
    /// This may be the same queue as the graphics queue if no dedicated
    /// transfer queue is available.
    #[inline]
    pub fn transfer_queue(&self) -> vk::Queue {
        self.transfer_queue
    }

    /// Returns the queue family indices.
    #[inline]
    pub fn queue_families(&self) -> &QueueFamilyIndices {
        &self.queue_families
    }

    /// Returns a reference to the GPU memory allocator.
    ///
    /// The allocator is protected by a Mutex for thread-safe access.
    #[inline]
    pub fn allocator(&self) -> &Mutex<Allocator> {
        &self.allocator
    }

    /// Waits for the device to become idle.
    ///
    /// This function blocks until all outstanding operations on all queues
    /// have completed. Useful before destroying resources.
    ///
    /// # Errors
    ///
    /// Returns an error if the wait fails.
    pub fn wait_idle(&self) -> Result<(), RhiError> {
        unsafe { self.device.device_wait_idle()? };
        Ok(())
    }

    /// Submits command buffers to the graphics queue.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    /// - All command buffers are valid and recorded
    /// - Synchronization is properly handled
    /// - The fence (if provided) is not in use
    ///
    /// # Arguments
    ///
    /// * `submit_infos` - Slice of submit info structures
    /// * `fence` - Optional fence to signal after completion
    ///
    /// # Errors
    ///
    /// Returns an error if the submission fails.
    pub unsafe fn submit_graphics(
        &self,
        submit_infos: &[vk::SubmitInfo],
        fence: vk::Fence,
    ) -> Result<(), RhiError> {
        unsafe {
            self.device
                .queue_submit(self.graphics_queue, submit_infos, fence)?;
        }
        Ok(())
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe {
            // Wait for all operations to complete before cleanup
            if let Err(e) = self.device.device_wait_idle() {
                tracing::error!("Failed to wait for device idle during drop: {:?}", e);
            }

            // Allocator is dropped automatically when the Mutex is dropped
            // The allocator should be empty at this point (all allocations freed)

            self.device.destroy_device(None);
        }
        info!("Logical device destroyed");
    }
}

// Safety: Device is Send+Sync because:
// - ash::Device is Send+Sync
// - vk::PhysicalDevice and vk::Queue are Copy types (handles)
// - Allocator is protected by Mutex
// - QueueFamilyIndices is Copy
unsafe impl Send for Device {}
unsafe impl Sync for Device {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_is_send_sync() {
        // Compile-time check that Device is Send + Sync
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Device>();
    }
}
