//! # Existence Registry
//!
//! The distinguished table that defines which ids are alive. Every live entity
//! has exactly one [`Existence`] record holding the mask of attached kinds;
//! the record is created with an empty mask and only dropped on delete.

use super::component::{ComponentKind, ComponentMask};
use super::entity::EntityId;

/// Per-entity record of attached component kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Existence {
    /// Bitmask of attached components.
    pub components_present: ComponentMask,
}

impl Existence {
    /// Checks if this entity has a specific component.
    #[inline]
    #[must_use]
    pub const fn has(self, kind: ComponentKind) -> bool {
        self.components_present.contains(kind)
    }

    /// Sets the flag for `kind`.
    #[inline]
    pub fn turn_on(&mut self, kind: ComponentKind) {
        self.components_present = self.components_present.with(kind);
    }

    /// Clears the flag for `kind`.
    #[inline]
    pub fn turn_off(&mut self, kind: ComponentKind) {
        self.components_present = self.components_present.without(kind);
    }
}

/// Dense id-indexed store of existence records.
#[derive(Debug, Clone, Default)]
pub struct ExistenceRegistry {
    /// `records[id]` is `Some` iff `id` is alive. Slot 0 is never used.
    records: Vec<Option<Existence>>,
    /// Number of live records.
    alive_count: usize,
}

impl ExistenceRegistry {
    /// Creates a registry with room for `capacity` ids.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity + 1),
            alive_count: 0,
        }
    }

    /// Number of currently alive entities.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Checks if an entity is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Gets the record for `id`.
    #[inline]
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<Existence> {
        self.records.get(id.index()).copied().flatten()
    }

    /// Gets the record for `id` mutably.
    #[inline]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Existence> {
        self.records.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Creates a fresh record with an empty mask.
    ///
    /// Returns `false` (and changes nothing) if `id` is null or already alive.
    pub fn insert(&mut self, id: EntityId) -> bool {
        if id.is_null() || self.is_alive(id) {
            return false;
        }
        if self.records.len() <= id.index() {
            self.records.resize(id.index() + 1, None);
        }
        self.records[id.index()] = Some(Existence::default());
        self.alive_count += 1;
        true
    }

    /// Drops the record for `id`, returning it.
    pub fn remove(&mut self, id: EntityId) -> Option<Existence> {
        let record = self.records.get_mut(id.index())?.take()?;
        self.alive_count -= 1;
        Some(record)
    }

    /// Iterates the ids of all alive entities in id order.
    pub fn iter_alive(&self) -> impl Iterator<Item = (EntityId, Existence)> + '_ {
        self.records.iter().enumerate().filter_map(|(index, record)| {
            let id = EntityId::new(u32::try_from(index).ok()?);
            record.map(|existence| (id, existence))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existence_flags() {
        let mut existence = Existence::default();
        assert!(!existence.has(ComponentKind::Scale));

        existence.turn_on(ComponentKind::Scale);
        assert!(existence.has(ComponentKind::Scale));

        existence.turn_off(ComponentKind::Scale);
        assert!(!existence.has(ComponentKind::Scale));
        assert!(existence.components_present.is_empty());
    }

    #[test]
    fn test_registry_lifecycle() {
        let mut registry = ExistenceRegistry::with_capacity(4);
        let id = EntityId::new(3);

        assert!(!registry.is_alive(id));
        assert!(registry.insert(id));
        assert!(!registry.insert(id));
        assert!(!registry.insert(EntityId::NULL));
        assert_eq!(registry.alive_count(), 1);

        registry.get_mut(id).unwrap().turn_on(ComponentKind::Position);
        assert!(registry.get(id).unwrap().has(ComponentKind::Position));

        assert!(registry.remove(id).is_some());
        assert!(registry.remove(id).is_none());
        assert_eq!(registry.alive_count(), 0);
    }

    #[test]
    fn test_iter_alive_skips_dead_slots() {
        let mut registry = ExistenceRegistry::default();
        registry.insert(EntityId::new(1));
        registry.insert(EntityId::new(4));
        let ids: Vec<_> = registry.iter_alive().map(|(id, _)| id.raw()).collect();
        assert_eq!(ids, vec![1, 4]);
    }
}
