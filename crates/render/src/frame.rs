//! Single-threaded frame recording context.
//!
//! One [`FrameContext`] holds the command pool, one command buffer and the
//! fence that paces the CPU against the GPU. The owner drives the cycle:
//! `begin`, record through the scene renderer (and any external passes),
//! then `submit_and_wait`. The wait blocks until the GPU finishes, so one
//! frame is in flight at a time and host-visible buffers can be rewritten
//! immediately afterwards.

use std::sync::Arc;
use std::time::Instant;

use ember_core::FrameTimer;
use ember_rhi::command::{CommandBuffer, CommandPool};
use ember_rhi::device::Device;
use ember_rhi::sync::Fence;
use ember_rhi::{RhiError, vk};
use tracing::debug;

use crate::error::RenderResult;

/// How long to wait on the frame fence before giving up, in nanoseconds.
const FENCE_TIMEOUT_NS: u64 = 5_000_000_000;

/// Command recording and submission state for one frame at a time.
pub struct FrameContext {
    device: Arc<Device>,
    pool: CommandPool,
    cmd: CommandBuffer,
    fence: Fence,
    timer: FrameTimer,
}

impl FrameContext {
    /// Creates the pool, command buffer and fence on the graphics queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the device has no graphics queue family or if
    /// object creation fails.
    pub fn new(device: Arc<Device>) -> RenderResult<Self> {
        let family = device
            .queue_families()
            .graphics_family
            .ok_or_else(|| RhiError::InvalidHandle("graphics queue family".into()))?;
        let pool = CommandPool::new(device.clone(), family)?;
        let cmd = CommandBuffer::new(device.clone(), &pool)?;
        let fence = Fence::new(device.clone(), false)?;

        Ok(Self {
            device,
            pool,
            cmd,
            fence,
            timer: FrameTimer::new(),
        })
    }

    /// Resets the command buffer and starts recording a new frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the reset or begin fails.
    pub fn begin(&mut self) -> RenderResult<()> {
        self.cmd.reset()?;
        self.cmd.begin()?;
        Ok(())
    }

    /// Ends recording, submits to the graphics queue and blocks until the
    /// GPU has finished.
    ///
    /// # Errors
    ///
    /// Returns an error if submission fails or the fence wait times out.
    pub fn submit_and_wait(&mut self) -> RenderResult<()> {
        self.cmd.end()?;

        let buffers = [self.cmd.handle()];
        let submit = vk::SubmitInfo::default().command_buffers(&buffers);
        unsafe {
            self.device
                .submit_graphics(std::slice::from_ref(&submit), self.fence.handle())?;
        }

        let wait_start = Instant::now();
        self.fence.wait(FENCE_TIMEOUT_NS)?;
        self.fence.reset()?;

        let frame_time = self.timer.tick();
        debug!(
            frame = self.timer.frame_index(),
            gpu_wait_ms = wait_start.elapsed().as_secs_f64() * 1000.0,
            frame_ms = frame_time.as_secs_f64() * 1000.0,
            "frame submitted"
        );
        Ok(())
    }

    /// Returns the command buffer being recorded.
    #[inline]
    pub fn command_buffer(&self) -> &CommandBuffer {
        &self.cmd
    }

    /// Returns the pacing fence.
    #[inline]
    pub fn fence(&self) -> &Fence {
        &self.fence
    }

    /// Returns the pool the command buffer came from.
    #[inline]
    pub fn command_pool(&self) -> &CommandPool {
        &self.pool
    }

    /// Returns the frame index, counting submitted frames.
    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.timer.frame_index()
    }
}
