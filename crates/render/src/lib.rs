//! Multi-pass scene renderer.
//!
//! This crate turns a populated [`ember_scene::World`] into frames:
//! - Fixed pass sequence: shadow, deferred geometry plus lighting,
//!   forward for skinned meshes, skybox and particles
//! - Per-scene constant buffers and descriptor tables sized exactly to
//!   the population
//! - Dirty-driven per-frame constant updates
//! - One blocking command context per frame
//!
//! [`scene::SceneRenderer`] is the entry point; [`frame::FrameContext`]
//! carries the command buffer and fence it records into.

pub mod binding;
pub mod error;
pub mod frame;
pub mod frame_resources;
pub mod graph;
pub mod pipelines;
pub mod scene;
pub mod shadow;

pub use binding::{BindingCounts, SamplerSet, SceneDescriptors, SceneLayouts, SceneShape};
pub use error::{RenderError, RenderResult};
pub use frame::FrameContext;
pub use frame_resources::{
    FrameResourcePlan, FrameResources, MAIN_PASS, PASS_BUFFER_COUNT, SHADOW_PASS,
};
pub use graph::{
    DEPTH_FORMAT, GBUFFER_FORMATS, RenderGraph, SCENE_COLOR_FORMAT, SHADOW_MAP_SIZE,
};
pub use pipelines::{PipelineLayouts, ScenePipelines, ShaderCatalog};
pub use scene::{RendererConfig, SceneRenderer};
pub use shadow::{BoundingSphere, ShadowVolume};
