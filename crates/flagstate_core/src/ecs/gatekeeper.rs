//! # Mutation Gatekeeper
//!
//! Structural rules checked against an entity's mask *before* a table write:
//!
//! - add `K`: every kind in `K.required()` is already attached
//! - remove `K`: no kind in `K.dependents()` is still attached

use super::component::{ComponentKind, ComponentMask};
use super::entity::EntityId;
use crate::error::{EcsError, EcsResult};

/// Checks that `kind` may be added to an entity whose mask is `present`.
///
/// # Errors
///
/// [`EcsError::PrerequisiteFailed`] naming the missing kinds.
#[inline]
pub fn admit_addition(id: EntityId, present: ComponentMask, kind: ComponentKind) -> EcsResult<()> {
    let required = kind.required();
    if present.contains_all(required) {
        Ok(())
    } else {
        Err(EcsError::PrerequisiteFailed {
            id,
            kind,
            missing: required.difference(present),
        })
    }
}

/// Checks that `kind` may be removed from an entity whose mask is `present`.
///
/// # Errors
///
/// [`EcsError::DependencyFailed`] naming the attached dependents.
#[inline]
pub fn admit_removal(id: EntityId, present: ComponentMask, kind: ComponentKind) -> EcsResult<()> {
    let blocking = present & kind.dependents();
    if blocking.is_empty() {
        Ok(())
    } else {
        Err(EcsError::DependencyFailed { id, kind, blocking })
    }
}
