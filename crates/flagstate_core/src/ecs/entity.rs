//! # Entity Management
//!
//! Entities are plain positive integers. Id 0 is reserved as the null id.
//! Freed ids go onto a reclaim stack and are reissued most-recently-freed
//! first, so an id is NOT a stable handle across a delete.

use std::fmt;

use crate::error::{EcsError, EcsResult};

/// Unique identifier for a live entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// Null/invalid entity ID. Never issued by the allocator.
    pub const NULL: Self = Self(0);

    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw integer.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the id as a table index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues and reclaims entity ids.
///
/// New ids count up from 1. Ids strictly below `limit` are issuable; once the
/// counter would reach the limit and nothing has been reclaimed, allocation
/// fails without touching any state.
#[derive(Debug, Clone)]
pub struct EntityAllocator {
    /// Last id handed out by the monotonic counter (0 = none yet).
    last_issued: u32,
    /// Exclusive upper bound on issued ids.
    limit: u32,
    /// Reclaimed ids, most recently freed on top.
    reclaimed: Vec<EntityId>,
}

impl EntityAllocator {
    /// Creates an allocator that may issue every id below `u32::MAX`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(u32::MAX)
    }

    /// Creates an allocator with a custom exclusive id limit.
    #[must_use]
    pub fn with_limit(limit: u32) -> Self {
        Self {
            last_issued: 0,
            limit,
            reclaimed: Vec::new(),
        }
    }

    /// The exclusive id limit.
    #[inline]
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of ids waiting to be reissued.
    #[inline]
    #[must_use]
    pub fn reclaimed_len(&self) -> usize {
        self.reclaimed.len()
    }

    /// Issues an id, preferring the most recently freed one.
    ///
    /// # Errors
    ///
    /// [`EcsError::MaxIdReached`] when the reclaim stack is empty and the
    /// counter cannot advance. Repeated calls keep failing the same way.
    pub fn create(&mut self) -> EcsResult<EntityId> {
        if let Some(id) = self.reclaimed.pop() {
            return Ok(id);
        }
        match self.last_issued.checked_add(1) {
            Some(next) if next < self.limit => {
                self.last_issued = next;
                Ok(EntityId(next))
            }
            _ => Err(EcsError::MaxIdReached { limit: self.limit }),
        }
    }

    /// Returns an id to the reclaim stack.
    ///
    /// The caller guarantees no table still holds data for `id`.
    pub fn free(&mut self, id: EntityId) {
        debug_assert!(!id.is_null(), "freeing the null id");
        debug_assert!(!self.reclaimed.contains(&id), "double free of {id}");
        self.reclaimed.push(id);
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}
