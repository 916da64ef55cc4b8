//! Vulkan abstraction layer (Render Hardware Interface).
//!
//! This crate provides a safe abstraction over Vulkan using the `ash` crate.
//! It handles:
//! - Instance and device creation
//! - Buffer, constant-buffer and attachment-image management
//! - Descriptor set layouts, pools and updates
//! - Render pass and framebuffer objects
//! - Pipeline creation
//! - Command buffer recording
//! - Synchronization primitives

mod error;

pub mod buffer;
pub mod command;
pub mod constant;
pub mod descriptor;
pub mod device;
pub mod image;
pub mod instance;
pub mod physical_device;
pub mod pipeline;
pub mod render_pass;
pub mod sampler;
pub mod shader;
pub mod sync;
pub mod vertex;

pub use error::{RhiError, RhiResult};

// Re-export the handle and memory-location types that users need
pub use ash::vk;
pub use gpu_allocator::MemoryLocation;
