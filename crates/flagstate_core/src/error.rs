//! # State Error Types
//!
//! All errors that can occur when mutating or querying the state container.
//! Every failure is returned as a value; nothing in the core panics or retries.

use thiserror::Error;

use crate::ecs::{ComponentKind, ComponentMask, EntityId};

/// Flat result-code vocabulary shared with host code that only needs to
/// branch on the outcome class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResultCode {
    /// The operation completed.
    Success,
    /// The entity id has no existence record.
    NonexistentEnt,
    /// The component table has no entry for the entity.
    NonexistentComp,
    /// A required component is missing.
    PrereqFail,
    /// A dependent component is still attached.
    DependFail,
    /// The component is already attached.
    Redundant,
    /// The id allocator is exhausted.
    MaxIdReached,
}

/// Errors that can occur in the state container.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The operation referenced an id with no existence record.
    #[error("entity {0} does not exist")]
    NonexistentEntity(EntityId),

    /// `get`/`remove` referenced a table entry that does not exist.
    #[error("entity {id} has no {kind} component")]
    NonexistentComponent {
        /// The entity that was queried.
        id: EntityId,
        /// The missing component kind.
        kind: ComponentKind,
    },

    /// Adding the component would violate its required-components rule.
    #[error("cannot add {kind} to entity {id}: missing prerequisites {missing}")]
    PrerequisiteFailed {
        /// The target entity.
        id: EntityId,
        /// The kind being added.
        kind: ComponentKind,
        /// Required kinds absent from the entity.
        missing: ComponentMask,
    },

    /// Removing the component would strand a component that depends on it.
    #[error("cannot remove {kind} from entity {id}: still required by {blocking}")]
    DependencyFailed {
        /// The target entity.
        id: EntityId,
        /// The kind being removed.
        kind: ComponentKind,
        /// Attached kinds that depend on `kind`.
        blocking: ComponentMask,
    },

    /// The entity already has this component; remove it first.
    #[error("entity {id} already has a {kind} component")]
    Redundant {
        /// The target entity.
        id: EntityId,
        /// The duplicated kind.
        kind: ComponentKind,
    },

    /// No reclaimed ids are available and the counter reached its limit.
    #[error("entity id space exhausted (limit {limit})")]
    MaxIdReached {
        /// The exclusive id limit the allocator was configured with.
        limit: u32,
    },
}

impl EcsError {
    /// Returns the flat result code for this error.
    #[must_use]
    pub const fn code(&self) -> ResultCode {
        match self {
            Self::NonexistentEntity(_) => ResultCode::NonexistentEnt,
            Self::NonexistentComponent { .. } => ResultCode::NonexistentComp,
            Self::PrerequisiteFailed { .. } => ResultCode::PrereqFail,
            Self::DependencyFailed { .. } => ResultCode::DependFail,
            Self::Redundant { .. } => ResultCode::Redundant,
            Self::MaxIdReached { .. } => ResultCode::MaxIdReached,
        }
    }
}

/// Result type for state operations.
pub type EcsResult<T> = Result<T, EcsError>;

/// Maps any state result to its flat result code.
#[must_use]
pub fn result_code<T>(result: &EcsResult<T>) -> ResultCode {
    match result {
        Ok(_) => ResultCode::Success,
        Err(err) => err.code(),
    }
}

/// Errors raised by the system runner.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SystemError {
    /// The requested operation is not valid in the runner's current status.
    #[error("system {system}: cannot {operation} while {status:?}")]
    InvalidTransition {
        /// Name of the system.
        system: &'static str,
        /// The operation that was attempted.
        operation: &'static str,
        /// Status the runner was in.
        status: crate::ecs::SystemStatus,
    },

    /// Subsystem-specific setup failed.
    #[error("system {system}: setup failed: {reason}")]
    SetupFailed {
        /// Name of the system.
        system: &'static str,
        /// Why setup failed.
        reason: String,
    },

    /// A state operation failed during setup.
    #[error("system {system}: {source}")]
    State {
        /// Name of the system.
        system: &'static str,
        /// The underlying state error.
        #[source]
        source: EcsError,
    },
}

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config text is not valid TOML for the expected schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
