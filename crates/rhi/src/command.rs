//! Command pool and command buffer management.
//!
//! This module provides wrappers for VkCommandPool and VkCommandBuffer,
//! enabling safe recording and submission of Vulkan commands.
//!
//! # Overview
//!
//! - [`CommandPool`] manages VkCommandPool creation and command buffer allocation
//! - [`CommandBuffer`] wraps VkCommandBuffer with methods for recording commands
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ember_rhi::device::Device;
//! use ember_rhi::command::{CommandPool, CommandBuffer};
//!
//! # fn example(device: Arc<Device>) -> Result<(), ember_rhi::RhiError> {
//! // Create command pool for the graphics queue
//! let queue_family = device.queue_families().graphics_family.unwrap();
//! let pool = CommandPool::new(device.clone(), queue_family)?;
//!
//! // Allocate command buffer
//! let cmd = CommandBuffer::new(device.clone(), &pool)?;
//!
//! // Record commands
//! cmd.begin()?;
//! // ... record rendering commands ...
//! cmd.end()?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::info;

use crate::device::Device;
use crate::error::RhiResult;
use crate::pipeline::{Pipeline, PipelineLayout};

/// Vulkan command pool wrapper.
///
/// A command pool is used to allocate command buffers. Each pool is associated
/// with a specific queue family and can only allocate command buffers that
/// will be submitted to queues of that family.
///
/// # Thread Safety
///
/// Command pools are not thread-safe. For multi-threaded command recording,
/// create a separate pool per thread.
pub struct CommandPool {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan command pool handle.
    pool: vk::CommandPool,
    /// Queue family index this pool belongs to.
    queue_family_index: u32,
}

impl CommandPool {
    /// Creates a new command pool for the specified queue family.
    ///
    /// The pool is created with the `RESET_COMMAND_BUFFER` flag, allowing
    /// individual command buffers to be reset and re-recorded each frame.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `queue_family_index` - The queue family for command buffer submission
    ///
    /// # Errors
    ///
    /// Returns an error if command pool creation fails.
    pub fn new(device: Arc<Device>, queue_family_index: u32) -> RhiResult<Self> {
        let create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue_family_index)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        let pool = unsafe { device.handle().create_command_pool(&create_info, None)? };

        info!(
            "Command pool created for queue family {}",
            queue_family_index
        );

        Ok(Self {
            device,
            pool,
            queue_family_index,
        })
    }

    /// Returns the Vulkan command pool handle.
    #[inline]
    pub fn handle(&self) -> vk::CommandPool {
        self.pool
    }

    /// Allocates a primary command buffer from this pool.
    ///
    /// # Errors
    ///
    /// Returns an error if allocation fails.
    pub fn allocate_command_buffer(&self) -> RhiResult<vk::CommandBuffer> {
        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let buffers = unsafe { self.device.handle().allocate_command_buffers(&alloc_info)? };
        Ok(buffers[0])
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_command_pool(self.pool, None);
        }
        info!(
            "Command pool destroyed for queue family {}",
            self.queue_family_index
        );
    }
}

/// Vulkan command buffer wrapper.
///
/// Provides a safe interface for recording Vulkan commands. The command buffer
/// wraps the raw VkCommandBuffer handle and provides methods for the
/// operations the frame graph records.
///
/// # Command Recording
///
/// Commands are recorded between `begin()` and `end()` calls:
///
/// ```no_run
/// # use std::sync::Arc;
/// # use ember_rhi::device::Device;
/// # use ember_rhi::command::{CommandPool, CommandBuffer};
/// # fn example(device: Arc<Device>, pool: &CommandPool) -> Result<(), ember_rhi::RhiError> {
/// let cmd = CommandBuffer::new(device, pool)?;
///
/// cmd.begin()?;
/// // Record commands here...
/// cmd.end()?;
/// # Ok(())
/// # }
/// ```
///
/// # Note
///
/// The command buffer does NOT own the underlying VkCommandBuffer handle.
/// The handle is freed when the owning CommandPool is destroyed.
pub struct CommandBuffer {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan command buffer handle.
    buffer: vk::CommandBuffer,
}

impl CommandBuffer {
    /// Creates a new command buffer from the given pool.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `pool` - The command pool to allocate from
    ///
    /// # Errors
    ///
    /// Returns an error if allocation fails.
    pub fn new(device: Arc<Device>, pool: &CommandPool) -> RhiResult<Self> {
        let buffer = pool.allocate_command_buffer()?;
        Ok(Self { device, buffer })
    }

    /// Returns the raw Vulkan command buffer handle.
    #[inline]
    pub fn handle(&self) -> vk::CommandBuffer {
        self.buffer
    }

    // =========================================================================
    // Recording Control
    // =========================================================================

    /// Begins recording commands to the buffer.
    ///
    /// The buffer is set up for one-time submission; it is re-recorded
    /// every frame after the previous submission completes.
    ///
    /// # Errors
    ///
    /// Returns an error if beginning fails (e.g., if already recording).
    pub fn begin(&self) -> RhiResult<()> {
        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        unsafe {
            self.device
                .handle()
                .begin_command_buffer(self.buffer, &begin_info)?;
        }

        Ok(())
    }

    /// Ends recording commands to the buffer.
    ///
    /// After this call, the command buffer is ready for submission.
    ///
    /// # Errors
    ///
    /// Returns an error if ending fails (e.g., if not recording).
    pub fn end(&self) -> RhiResult<()> {
        unsafe {
            self.device.handle().end_command_buffer(self.buffer)?;
        }

        Ok(())
    }

    /// Resets the command buffer to its initial state.
    ///
    /// This allows the buffer to be re-recorded without reallocating.
    ///
    /// # Errors
    ///
    /// Returns an error if the reset fails.
    pub fn reset(&self) -> RhiResult<()> {
        unsafe {
            self.device
                .handle()
                .reset_command_buffer(self.buffer, vk::CommandBufferResetFlags::empty())?;
        }

        Ok(())
    }

    // =========================================================================
    // Render Pass Control
    // =========================================================================

    /// Begins a render pass instance.
    ///
    /// # Arguments
    ///
    /// * `begin_info` - Render pass, framebuffer, render area and clear values
    pub fn begin_render_pass(&self, begin_info: &vk::RenderPassBeginInfo) {
        unsafe {
            self.device.handle().cmd_begin_render_pass(
                self.buffer,
                begin_info,
                vk::SubpassContents::INLINE,
            );
        }
    }

    /// Transitions to the next subpass of the current render pass.
    pub fn next_subpass(&self) {
        unsafe {
            self.device
                .handle()
                .cmd_next_subpass(self.buffer, vk::SubpassContents::INLINE);
        }
    }

    /// Ends the current render pass instance.
    pub fn end_render_pass(&self) {
        unsafe {
            self.device.handle().cmd_end_render_pass(self.buffer);
        }
    }

    // =========================================================================
    // Binding
    // =========================================================================

    /// Binds a graphics pipeline to the command buffer.
    pub fn bind_pipeline(&self, pipeline: &Pipeline) {
        unsafe {
            self.device.handle().cmd_bind_pipeline(
                self.buffer,
                vk::PipelineBindPoint::GRAPHICS,
                pipeline.handle(),
            );
        }
    }

    /// Binds descriptor sets for graphics use.
    ///
    /// # Arguments
    ///
    /// * `layout` - The pipeline layout
    /// * `first_set` - First descriptor set slot to update
    /// * `descriptor_sets` - Slice of descriptor sets
    pub fn bind_descriptor_sets(
        &self,
        layout: &PipelineLayout,
        first_set: u32,
        descriptor_sets: &[vk::DescriptorSet],
    ) {
        unsafe {
            self.device.handle().cmd_bind_descriptor_sets(
                self.buffer,
                vk::PipelineBindPoint::GRAPHICS,
                layout.handle(),
                first_set,
                descriptor_sets,
                &[],
            );
        }
    }

    /// Binds vertex buffers to the command buffer.
    ///
    /// # Arguments
    ///
    /// * `first_binding` - First vertex input binding to update
    /// * `buffers` - Slice of buffer handles
    /// * `offsets` - Byte offsets into each buffer
    pub fn bind_vertex_buffers(
        &self,
        first_binding: u32,
        buffers: &[vk::Buffer],
        offsets: &[vk::DeviceSize],
    ) {
        unsafe {
            self.device.handle().cmd_bind_vertex_buffers(
                self.buffer,
                first_binding,
                buffers,
                offsets,
            );
        }
    }

    /// Binds an index buffer to the command buffer.
    ///
    /// # Arguments
    ///
    /// * `buffer` - The index buffer
    /// * `offset` - Byte offset into the buffer
    /// * `index_type` - Type of indices (UINT16 or UINT32)
    pub fn bind_index_buffer(
        &self,
        buffer: vk::Buffer,
        offset: vk::DeviceSize,
        index_type: vk::IndexType,
    ) {
        unsafe {
            self.device
                .handle()
                .cmd_bind_index_buffer(self.buffer, buffer, offset, index_type);
        }
    }

    // =========================================================================
    // Dynamic State
    // =========================================================================

    /// Sets the viewport dynamically.
    ///
    /// # Arguments
    ///
    /// * `viewport` - The viewport configuration
    pub fn set_viewport(&self, viewport: &vk::Viewport) {
        unsafe {
            self.device
                .handle()
                .cmd_set_viewport(self.buffer, 0, std::slice::from_ref(viewport));
        }
    }

    /// Sets the scissor rectangle dynamically.
    ///
    /// # Arguments
    ///
    /// * `scissor` - The scissor rectangle
    pub fn set_scissor(&self, scissor: &vk::Rect2D) {
        unsafe {
            self.device
                .handle()
                .cmd_set_scissor(self.buffer, 0, std::slice::from_ref(scissor));
        }
    }

    // =========================================================================
    // Drawing Commands
    // =========================================================================

    /// Issues a non-indexed draw command.
    ///
    /// # Arguments
    ///
    /// * `vertex_count` - Number of vertices to draw
    /// * `instance_count` - Number of instances to draw
    /// * `first_vertex` - Offset to the first vertex
    /// * `first_instance` - Offset to the first instance
    pub fn draw(
        &self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        unsafe {
            self.device.handle().cmd_draw(
                self.buffer,
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            );
        }
    }

    /// Issues an indexed draw command.
    ///
    /// # Arguments
    ///
    /// * `index_count` - Number of indices to draw
    /// * `instance_count` - Number of instances to draw
    /// * `first_index` - Offset to the first index
    /// * `vertex_offset` - Constant added to each index
    /// * `first_instance` - Offset to the first instance
    pub fn draw_indexed(
        &self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        unsafe {
            self.device.handle().cmd_draw_indexed(
                self.buffer,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_buffer_is_send() {
        // Compile-time check that CommandBuffer is Send
        fn assert_send<T: Send>() {}
        assert_send::<CommandBuffer>();
    }

    #[test]
    fn test_command_pool_is_send() {
        // Compile-time check that CommandPool is Send
        fn assert_send<T: Send>() {}
        assert_send::<CommandPool>();
    }
}
