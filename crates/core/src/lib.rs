//! Core utilities for the ember renderer workspace.
//!
//! This crate provides the small foundations shared by every other crate:
//! - Logging initialization
//! - Frame timing

mod logging;
mod timer;

pub use logging::init_logging;
pub use timer::FrameTimer;
