//! Typed constant (uniform) buffers.
//!
//! A [`ConstantBuffer`] is a GPU buffer holding an array of identical POD
//! elements, one per object/material/pass, each bound at its own aligned
//! offset. Element strides are rounded up to the device's uniform-offset
//! alignment so any element can be the start of a descriptor binding.
//!
//! # Mapping modes
//!
//! Buffers are created either *persistently mapped* (the CPU pointer is
//! resolved once at creation and cached; per-frame writes copy straight
//! through it) or *transient* (the mapping is looked up again on every
//! write). Persistent mapping is the mode for buffers rewritten every frame;
//! transient suits buffers written rarely.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ember_rhi::constant::ConstantBuffer;
//! use ember_rhi::device::Device;
//! use ember_rhi::{MemoryLocation, vk};
//!
//! # #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
//! # #[repr(C)]
//! # struct ObjectData { world: [f32; 16] }
//! # fn example(device: Arc<Device>) -> Result<(), ember_rhi::RhiError> {
//! let objects: ConstantBuffer<ObjectData> = ConstantBuffer::new(
//!     device,
//!     "objects",
//!     64,
//!     vk::BufferUsageFlags::UNIFORM_BUFFER,
//!     MemoryLocation::CpuToGpu,
//!     true,
//! )?;
//! objects.write(3, &[ObjectData { world: [0.0; 16] }])?;
//! # Ok(())
//! # }
//! ```

use std::marker::PhantomData;
use std::ptr::NonNull;
use std::sync::Arc;

use ash::vk;
use bytemuck::Pod;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Rounds `size` up to the next multiple of `alignment`.
///
/// `alignment` is expected to be a power of two; an alignment of zero is
/// treated as one.
#[inline]
pub fn aligned_stride(size: vk::DeviceSize, alignment: vk::DeviceSize) -> vk::DeviceSize {
    let alignment = alignment.max(1);
    debug_assert!(alignment.is_power_of_two());
    (size + alignment - 1) & !(alignment - 1)
}

/// GPU buffer holding an array of `element_count` POD elements of type `T`.
///
/// Elements are spaced `stride()` bytes apart, where the stride is the
/// element size rounded up to the uniform-offset alignment when the buffer
/// is used as a uniform buffer.
pub struct ConstantBuffer<T: Pod> {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan buffer handle.
    buffer: vk::Buffer,
    /// GPU memory allocation.
    allocation: Option<Allocation>,
    /// Cached CPU pointer when persistently mapped.
    mapped: Option<NonNull<u8>>,
    /// Number of elements.
    element_count: usize,
    /// Byte distance between consecutive elements.
    stride: vk::DeviceSize,
    /// Debug name used for allocation tracking and logs.
    name: String,
    _marker: PhantomData<T>,
}

impl<T: Pod> ConstantBuffer<T> {
    /// Creates a buffer for `element_count` elements of `T`.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `name` - Debug name for allocation tracking and logs
    /// * `element_count` - Number of elements; must be greater than 0
    /// * `usage` - Buffer usage flags (typically `UNIFORM_BUFFER`)
    /// * `location` - Memory kind; writes require a host-visible location
    /// * `persistently_mapped` - Resolve and cache the CPU pointer at creation
    ///
    /// # Errors
    ///
    /// Returns an error if the element count is zero, buffer or memory
    /// allocation fails, or persistent mapping is requested on memory that
    /// is not host-visible.
    pub fn new(
        device: Arc<Device>,
        name: &str,
        element_count: usize,
        usage: vk::BufferUsageFlags,
        location: MemoryLocation,
        persistently_mapped: bool,
    ) -> RhiResult<Self> {
        if element_count == 0 {
            return Err(RhiError::InvalidHandle(format!(
                "Constant buffer '{}' must have at least one element",
                name
            )));
        }

        let stride = if usage.contains(vk::BufferUsageFlags::UNIFORM_BUFFER) {
            aligned_stride(
                size_of::<T>() as vk::DeviceSize,
                device.min_uniform_offset_alignment(),
            )
        } else {
            size_of::<T>() as vk::DeviceSize
        };
        let size = stride * element_count as vk::DeviceSize;

        let buffer_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { device.handle().create_buffer(&buffer_info, None)? };

        let requirements = unsafe { device.handle().get_buffer_memory_requirements(buffer) };

        let allocation = {
            let mut allocator = device.allocator().lock().unwrap();
            allocator.allocate(&AllocationCreateDesc {
                name,
                requirements,
                location,
                linear: true,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })?
        };

        unsafe {
            device
                .handle()
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())?;
        }

        let mapped = if persistently_mapped {
            let ptr = allocation.mapped_ptr().ok_or_else(|| {
                RhiError::InvalidHandle(format!(
                    "Constant buffer '{}' requested persistent mapping on unmappable memory",
                    name
                ))
            })?;
            Some(ptr.cast::<u8>())
        } else {
            None
        };

        debug!(
            "Created constant buffer '{}': {} x {} bytes (stride {})",
            name,
            element_count,
            size_of::<T>(),
            stride
        );

        Ok(Self {
            device,
            buffer,
            allocation: Some(allocation),
            mapped,
            element_count,
            stride,
            name: name.to_string(),
            _marker: PhantomData,
        })
    }

    /// Writes `elements` starting at element `index`.
    ///
    /// Each element lands at its own stride-aligned slot. Staying within
    /// `element_count` is the caller's contract; it is checked only in debug
    /// builds.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer memory is not host-visible.
    pub fn write(&self, index: usize, elements: &[T]) -> RhiResult<()> {
        if elements.is_empty() {
            return Ok(());
        }
        debug_assert!(
            index + elements.len() <= self.element_count,
            "constant buffer '{}' write out of range: {} + {} > {}",
            self.name,
            index,
            elements.len(),
            self.element_count
        );

        let base = match self.mapped {
            Some(ptr) => ptr,
            // Transient mode: resolve the mapping on every write
            None => {
                let allocation = self.allocation.as_ref().ok_or_else(|| {
                    RhiError::InvalidHandle(format!(
                        "Constant buffer '{}' allocation is not available",
                        self.name
                    ))
                })?;
                allocation
                    .mapped_ptr()
                    .ok_or_else(|| {
                        RhiError::InvalidHandle(format!(
                            "Constant buffer '{}' memory is not mapped",
                            self.name
                        ))
                    })?
                    .cast::<u8>()
            }
        };

        for (i, element) in elements.iter().enumerate() {
            let offset = (index + i) as vk::DeviceSize * self.stride;
            let bytes = bytemuck::bytes_of(element);
            unsafe {
                let dst = base.as_ptr().add(offset as usize);
                std::ptr::copy_nonoverlapping(bytes.as_ptr(), dst, bytes.len());
            }
        }

        Ok(())
    }

    /// Returns the Vulkan buffer handle.
    #[inline]
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Returns the number of elements.
    #[inline]
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// Returns the byte distance between consecutive elements.
    #[inline]
    pub fn stride(&self) -> vk::DeviceSize {
        self.stride
    }

    /// Returns whether the CPU pointer was cached at creation.
    #[inline]
    pub fn is_persistently_mapped(&self) -> bool {
        self.mapped.is_some()
    }

    /// Returns the descriptor buffer info for one element.
    ///
    /// The range covers a single element, not the whole array.
    #[inline]
    pub fn descriptor_info(&self, index: usize) -> vk::DescriptorBufferInfo {
        vk::DescriptorBufferInfo::default()
            .buffer(self.buffer)
            .offset(index as vk::DeviceSize * self.stride)
            .range(size_of::<T>() as vk::DeviceSize)
    }
}

impl<T: Pod> Drop for ConstantBuffer<T> {
    fn drop(&mut self) {
        // Free allocation first, then destroy buffer
        if let Some(allocation) = self.allocation.take() {
            let mut allocator = self.device.allocator().lock().unwrap();
            if let Err(e) = allocator.free(allocation) {
                tracing::error!("Failed to free constant buffer allocation: {:?}", e);
            }
        }

        unsafe {
            self.device.handle().destroy_buffer(self.buffer, None);
        }

        debug!("Destroyed constant buffer '{}'", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_stride_rounds_up() {
        assert_eq!(aligned_stride(128, 256), 256);
        assert_eq!(aligned_stride(96, 256), 256);
        assert_eq!(aligned_stride(800, 256), 1024);
        assert_eq!(aligned_stride(256, 256), 256);
        assert_eq!(aligned_stride(64_000, 256), 64_000);
    }

    #[test]
    fn test_aligned_stride_small_alignment() {
        assert_eq!(aligned_stride(100, 4), 100);
        assert_eq!(aligned_stride(100, 64), 128);
        assert_eq!(aligned_stride(1, 1), 1);
    }

    #[test]
    fn test_aligned_stride_zero_alignment_is_identity() {
        assert_eq!(aligned_stride(100, 0), 100);
    }
}
