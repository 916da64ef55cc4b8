//! Scene resource data.
//!
//! This crate holds the CPU-side data the renderer uploads:
//! - Constant-block layouts shared with the shaders
//! - Material definitions
//! - Mesh data and geometry merging

pub mod constants;
pub mod material;
pub mod mesh;

pub use constants::{
    GpuLight, MaterialConstants, ObjectConstants, PassConstants, SkinnedConstants,
};
pub use material::{Material, SamplerKind, ShadingModel};
pub use mesh::{GeometryRange, MergedGeometry, MeshData, SkinnedMeshData, merge_geometry};
