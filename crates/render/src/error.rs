//! Error types for the render crate.

use ember_rhi::RhiError;
use ember_scene::SceneError;
use thiserror::Error;

/// Errors reported by the scene renderer.
///
/// Scene population mistakes surface as [`RenderError::Scene`] and leave the
/// renderer untouched. Device and allocation failures surface as
/// [`RenderError::Rhi`] and are not recoverable mid-frame.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A device, allocation or recording call failed.
    #[error(transparent)]
    Rhi(#[from] RhiError),

    /// The scene description is invalid.
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// `update` or `draw` was called before `setup`.
    #[error("scene renderer has no uploaded scene; call setup first")]
    SetupRequired,
}

/// Result alias for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
