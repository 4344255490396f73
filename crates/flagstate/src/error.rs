//! Errors surfaced by the sandbox loop.

use flagstate_core::{ConfigError, EcsError, SystemError};
use thiserror::Error;

/// Anything that can stop the sandbox.
#[derive(Error, Debug)]
pub enum SandboxError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A state operation failed while building the scene.
    #[error("scene setup failed: {0}")]
    State(#[from] EcsError),

    /// A system rejected a lifecycle call.
    #[error(transparent)]
    System(#[from] SystemError),
}
