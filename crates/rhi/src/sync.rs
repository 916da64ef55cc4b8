//! Synchronization primitives for Vulkan.
//!
//! This module provides the [`Fence`] wrapper for GPU-to-CPU synchronization.
//! The renderer drives a single queue from a single thread, so the only
//! synchronization the host needs is waiting for a submitted frame to finish
//! before touching its resources again.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ember_rhi::device::Device;
//! use ember_rhi::sync::Fence;
//!
//! # fn example(device: Arc<Device>) -> Result<(), ember_rhi::RhiError> {
//! // Create a fence for GPU-to-CPU synchronization
//! let frame_fence = Fence::new(device.clone(), false)?;
//!
//! // ... submit GPU work that signals the fence ...
//!
//! // Block until the submission completes
//! frame_fence.wait(u64::MAX)?;
//! frame_fence.reset()?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Vulkan fence wrapper.
///
/// Fences are used for GPU-to-CPU synchronization, allowing the host to wait
/// for GPU operations to complete. The frame loop submits its command buffer
/// with a fence and waits on it before the next update pass rewrites any
/// constant buffer the GPU was reading.
///
/// # Thread Safety
///
/// The fence is immutable after creation. Wait and reset operations can be
/// called from any thread, but proper synchronization is the caller's
/// responsibility when accessing fence state.
pub struct Fence {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan fence handle.
    fence: vk::Fence,
}

impl Fence {
    /// Creates a new fence.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `signaled` - If true, creates the fence in the signaled state.
    ///   This is useful for fences that are waited on before the first
    ///   GPU operation that would signal them.
    ///
    /// # Errors
    ///
    /// Returns an error if fence creation fails.
    pub fn new(device: Arc<Device>, signaled: bool) -> RhiResult<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };

        let create_info = vk::FenceCreateInfo::default().flags(flags);

        let fence = unsafe { device.handle().create_fence(&create_info, None)? };

        debug!(
            "Created fence ({})",
            if signaled { "signaled" } else { "unsignaled" }
        );

        Ok(Self { device, fence })
    }

    /// Returns the Vulkan fence handle.
    ///
    /// This handle can be used directly with Vulkan API calls.
    #[inline]
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }

    /// Waits for the fence to become signaled.
    ///
    /// This function blocks until the fence is signaled or the timeout expires.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Timeout in nanoseconds. Use `u64::MAX` for infinite wait.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The wait times out (`vk::Result::TIMEOUT`)
    /// - The wait fails for another reason
    pub fn wait(&self, timeout: u64) -> Result<(), RhiError> {
        let fences = [self.fence];
        unsafe {
            self.device
                .handle()
                .wait_for_fences(&fences, true, timeout)?
        };
        Ok(())
    }

    /// Resets the fence to the unsignaled state.
    ///
    /// The fence must not be in use by any queue operation when this is called.
    ///
    /// # Errors
    ///
    /// Returns an error if the reset operation fails.
    pub fn reset(&self) -> Result<(), RhiError> {
        let fences = [self.fence];
        unsafe { self.device.handle().reset_fences(&fences)? };
        Ok(())
    }

    /// Checks if the fence is currently signaled.
    ///
    /// This is a non-blocking operation that returns immediately.
    pub fn is_signaled(&self) -> bool {
        let result = unsafe { self.device.handle().get_fence_status(self.fence) };
        matches!(result, Ok(true))
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_fence(self.fence, None);
        }
        debug!("Destroyed fence");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fence_is_send_sync() {
        // Compile-time check that Fence is Send + Sync
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Fence>();
    }
}
