//! Scene model: objects, lights, cameras and simulation.
//!
//! This crate is the CPU side of a scene:
//! - Game-object arena with name lookup and dirty tracking
//! - Camera and light definitions
//! - Skinned-animation instances
//! - CPU particle systems

pub mod camera;
pub mod error;
pub mod graph;
pub mod light;
pub mod particles;
pub mod skinned;
pub mod transform;

pub use camera::{Camera, Projection};
pub use error::{SceneError, SceneResult};
pub use graph::{
    GameObject, MaterialHandle, MeshHandle, MeshRenderer, ObjectId, SkinnedMeshHandle, World,
};
pub use light::{DirectionalLight, LightRig, PointLight, SpotLight};
pub use particles::{EmitterParams, ParticleEmitter, ParticleSystem};
pub use skinned::{SkinnedAnimation, SkinnedInstanceId, SkinnedModelInstance};
pub use transform::Transform;
