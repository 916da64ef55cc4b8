//! Scene population errors.

use thiserror::Error;

/// Errors raised while populating a scene.
///
/// Every variant is recoverable: the failing call logs a warning, leaves the
/// scene untouched and returns the error to the caller.
#[derive(Debug, Error)]
pub enum SceneError {
    /// An object with this name already exists.
    #[error("object name already in use: {0}")]
    DuplicateObject(String),

    /// A material with this name already exists.
    #[error("material name already in use: {0}")]
    DuplicateMaterial(String),

    /// No object with this name exists.
    #[error("no object named '{0}'")]
    UnknownObject(String),

    /// No material with this name exists.
    #[error("no material named '{0}'")]
    UnknownMaterial(String),

    /// The parent handle does not belong to this scene.
    #[error("parent handle out of range")]
    InvalidParent,

    /// A light kind is already at capacity.
    #[error("{kind} light capacity of {capacity} reached")]
    LightCapacityReached {
        kind: &'static str,
        capacity: usize,
    },

    /// A skinned animation reports more bones than the palette holds.
    #[error("bone count {bones} exceeds palette capacity {capacity}")]
    TooManyBones { bones: usize, capacity: usize },

    /// A skinned animation reports no bones at all.
    #[error("skinned animation provides an empty bone pose")]
    EmptyPose,
}

/// Result type for scene population.
pub type SceneResult<T> = Result<T, SceneError>;
