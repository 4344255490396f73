//! # ECS State
//!
//! The single owning context for all entities, components and subscriptions.
//! Systems never hold a copy; they receive `&mut State` for every call.
//!
//! Every mutation runs in three phases, in this order:
//!
//! 1. gatekeeper validation against the current mask
//! 2. the table write and mask update
//! 3. notification dispatch for the resulting mask change

use tracing::{debug, trace, warn};

use super::component::{Component, ComponentKind, ComponentMask};
use super::entity::{EntityAllocator, EntityId};
use super::existence::{Existence, ExistenceRegistry};
use super::gatekeeper::{admit_addition, admit_removal};
use super::notify::{Crossing, EntityHandler, ListenerId, MaskChange, NotificationFabric};
use super::storage::{ComponentTable, ComponentTables};
use crate::config::StateConfig;
use crate::error::{EcsError, EcsResult};

/// The ECS state container.
///
/// # Example
///
/// ```rust,ignore
/// let mut state = State::new();
///
/// let id = state.create_entity()?;
/// state.add(id, Position::new(1.0, 2.0, 3.0))?;
/// state.add(id, Velocity::new(0.0, 0.0, 1.0))?;
/// ```
#[derive(Debug)]
pub struct State {
    allocator: EntityAllocator,
    existence: ExistenceRegistry,
    tables: ComponentTables,
    fabric: NotificationFabric,
}

impl State {
    /// Creates a state with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&StateConfig::default())
    }

    /// Creates a state from a configuration.
    #[must_use]
    pub fn with_config(config: &StateConfig) -> Self {
        Self {
            allocator: EntityAllocator::with_limit(config.id_limit),
            existence: ExistenceRegistry::with_capacity(config.initial_capacity),
            tables: ComponentTables::with_capacity(config.initial_capacity),
            fabric: NotificationFabric::new(),
        }
    }

    // =========================================================================
    // Entity lifecycle
    // =========================================================================

    /// Creates a new entity with no components.
    ///
    /// # Errors
    ///
    /// [`EcsError::MaxIdReached`] when the id space is exhausted; no state
    /// changes in that case.
    pub fn create_entity(&mut self) -> EcsResult<EntityId> {
        let id = self.allocator.create().map_err(|err| {
            warn!(limit = self.allocator.limit(), "entity id space exhausted");
            err
        })?;
        self.existence.insert(id);
        debug!(%id, "entity created");
        self.notify(id, None, Some(ComponentMask::EMPTY));
        Ok(id)
    }

    /// Strips every component from an entity but keeps it alive.
    ///
    /// Clearing an already bare entity succeeds and changes nothing.
    ///
    /// # Errors
    ///
    /// [`EcsError::NonexistentEntity`] if `id` is not alive.
    pub fn clear_entity(&mut self, id: EntityId) -> EcsResult<()> {
        let old = self.strip(id)?;
        debug!(%id, stripped = %old, "entity cleared");
        self.notify(id, Some(old), Some(ComponentMask::EMPTY));
        Ok(())
    }

    /// Strips every component, drops the existence record and returns the id
    /// to the reclaim pool.
    ///
    /// # Errors
    ///
    /// [`EcsError::NonexistentEntity`] if `id` is not alive.
    pub fn delete_entity(&mut self, id: EntityId) -> EcsResult<()> {
        let old = self.strip(id)?;
        self.existence.remove(id);
        self.allocator.free(id);
        debug!(%id, stripped = %old, "entity deleted");
        self.notify(id, Some(old), None);
        Ok(())
    }

    /// Removes every component of `id` without gatekeeper checks (nothing is
    /// left behind to dangle) and resets its mask. Returns the old mask.
    fn strip(&mut self, id: EntityId) -> EcsResult<ComponentMask> {
        let existence = self
            .existence
            .get_mut(id)
            .ok_or(EcsError::NonexistentEntity(id))?;
        let old = std::mem::take(existence).components_present;
        for kind in old.kinds() {
            self.tables.erase(kind, id);
        }
        Ok(old)
    }

    /// Checks if an entity is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.existence.is_alive(id)
    }

    /// Number of currently alive entities.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.existence.alive_count()
    }

    /// The existence record of `id`.
    ///
    /// # Errors
    ///
    /// [`EcsError::NonexistentEntity`] if `id` is not alive.
    pub fn existence(&self, id: EntityId) -> EcsResult<Existence> {
        self.existence.get(id).ok_or(EcsError::NonexistentEntity(id))
    }

    /// The mask of components attached to `id`.
    ///
    /// # Errors
    ///
    /// [`EcsError::NonexistentEntity`] if `id` is not alive.
    pub fn mask_of(&self, id: EntityId) -> EcsResult<ComponentMask> {
        self.existence(id).map(|e| e.components_present)
    }

    /// Whether `id` is alive and has `kind` attached.
    #[must_use]
    pub fn has(&self, id: EntityId, kind: ComponentKind) -> bool {
        self.existence.get(id).is_some_and(|e| e.has(kind))
    }

    /// Iterates every alive entity with its existence record.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, Existence)> + '_ {
        self.existence.iter_alive()
    }

    // =========================================================================
    // Typed component access
    // =========================================================================

    /// Attaches a component.
    ///
    /// # Errors
    ///
    /// - [`EcsError::NonexistentEntity`] if `id` is not alive
    /// - [`EcsError::PrerequisiteFailed`] if a required kind is missing
    /// - [`EcsError::Redundant`] if `id` already has this kind
    ///
    /// Nothing changes on failure.
    pub fn add<C: Component>(&mut self, id: EntityId, value: C) -> EcsResult<()> {
        let kind = C::KIND;
        let existence = self.existence.get(id).ok_or(EcsError::NonexistentEntity(id))?;
        let old = existence.components_present;
        admit_addition(id, old, kind)?;
        if C::table_mut(&mut self.tables).insert(id, value).is_err() {
            return Err(EcsError::Redundant { id, kind });
        }
        let new = old.with(kind);
        if let Some(record) = self.existence.get_mut(id) {
            record.turn_on(kind);
        }
        trace!(%id, %kind, mask = %new, "component added");
        self.notify(id, Some(old), Some(new));
        Ok(())
    }

    /// Detaches a component, returning its value.
    ///
    /// # Errors
    ///
    /// - [`EcsError::NonexistentComponent`] if `id` has no such component
    /// - [`EcsError::DependencyFailed`] if an attached kind depends on it
    ///
    /// Nothing changes on failure.
    pub fn remove<C: Component>(&mut self, id: EntityId) -> EcsResult<C> {
        let kind = C::KIND;
        if !C::table(&self.tables).contains(id) {
            return Err(EcsError::NonexistentComponent { id, kind });
        }
        let existence = self.existence.get(id).ok_or(EcsError::NonexistentEntity(id))?;
        let old = existence.components_present;
        admit_removal(id, old, kind)?;
        let value = C::table_mut(&mut self.tables)
            .remove(id)
            .ok_or(EcsError::NonexistentComponent { id, kind })?;
        let new = old.without(kind);
        if let Some(record) = self.existence.get_mut(id) {
            record.turn_off(kind);
        }
        trace!(%id, %kind, mask = %new, "component removed");
        self.notify(id, Some(old), Some(new));
        Ok(value)
    }

    /// Borrows a component.
    ///
    /// # Errors
    ///
    /// [`EcsError::NonexistentComponent`] if `id` has no such component.
    pub fn get<C: Component>(&self, id: EntityId) -> EcsResult<&C> {
        C::table(&self.tables)
            .get(id)
            .ok_or(EcsError::NonexistentComponent { id, kind: C::KIND })
    }

    /// Borrows a component mutably. The borrow ends before the next
    /// structural change to the state.
    ///
    /// # Errors
    ///
    /// [`EcsError::NonexistentComponent`] if `id` has no such component.
    pub fn get_mut<C: Component>(&mut self, id: EntityId) -> EcsResult<&mut C> {
        C::table_mut(&mut self.tables)
            .get_mut(id)
            .ok_or(EcsError::NonexistentComponent { id, kind: C::KIND })
    }

    /// The whole table for a component type, for bulk reads.
    #[must_use]
    pub fn table<C: Component>(&self) -> &ComponentTable<C> {
        C::table(&self.tables)
    }

    /// The whole table for a component type, for bulk in-place updates.
    ///
    /// Values may be changed in place; inserting or removing through this
    /// handle is not possible because masks would go stale.
    pub fn table_mut<C: Component>(&mut self) -> TableMut<'_, C> {
        TableMut {
            table: C::table_mut(&mut self.tables),
        }
    }

    /// All component tables.
    #[must_use]
    pub const fn tables(&self) -> &ComponentTables {
        &self.tables
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Subscribes to entities whose mask contains `likeness`.
    ///
    /// Entities that already match are not replayed; register before
    /// populating the state. There is no unsubscribe.
    pub fn listen_for_like_entities(
        &mut self,
        likeness: ComponentMask,
        on_discover: EntityHandler,
        on_forget: EntityHandler,
    ) -> ListenerId {
        let listener = self.fabric.listen(likeness, on_discover, on_forget);
        debug!(listener = listener.index(), %likeness, "subscription registered");
        listener
    }

    /// Ids currently admitted by a subscription.
    ///
    /// The slice borrows the state; take [`matching_snapshot`](Self::matching_snapshot)
    /// to iterate while mutating.
    #[must_use]
    pub fn matching(&self, listener: ListenerId) -> &[EntityId] {
        self.fabric.matching(listener)
    }

    /// Owned copy of a subscription's ids.
    #[must_use]
    pub fn matching_snapshot(&self, listener: ListenerId) -> Vec<EntityId> {
        self.fabric.matching(listener).to_vec()
    }

    /// Empties a subscription's id list without running handlers.
    pub fn clear_matching(&mut self, listener: ListenerId) {
        self.fabric.clear_matching(listener);
    }

    /// Retires a subscription: its list is emptied and it receives no further
    /// notifications. The id stays registered.
    pub fn retire_listener(&mut self, listener: ListenerId) {
        self.fabric.retire(listener);
        debug!(listener = listener.index(), "subscription retired");
    }

    /// Number of registered subscriptions.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.fabric.listener_count()
    }

    /// The notification fabric, for inspection.
    #[must_use]
    pub const fn fabric(&self) -> &NotificationFabric {
        &self.fabric
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    fn notify(&mut self, id: EntityId, old: Option<ComponentMask>, new: Option<ComponentMask>) {
        if old == new {
            return;
        }
        self.fabric.enqueue(MaskChange { id, old, new });
        self.settle();
    }

    /// Drains pending mask changes. Nested calls (from inside a handler)
    /// return immediately; the outermost call does all the work.
    fn settle(&mut self) {
        if !self.fabric.begin_dispatch() {
            return;
        }
        while let Some(change) = self.fabric.next_change() {
            // Listeners registered by a handler join from the next change.
            let listeners = self.fabric.listener_count();
            for index in 0..listeners {
                if let Some((listener, crossing)) = self.fabric.crossing_at(index, &change) {
                    self.deliver(listener, crossing, change.id);
                }
            }
        }
        self.fabric.end_dispatch();
    }

    fn deliver(&mut self, listener: ListenerId, crossing: Crossing, id: EntityId) {
        if crossing == Crossing::Forget && !self.fabric.is_listed(listener, id) {
            return;
        }
        let verdict = match self.fabric.take_handler(listener, crossing) {
            Some(mut handler) => {
                let verdict = handler(self, id);
                self.fabric.restore_handler(listener, crossing, handler);
                verdict
            }
            None => {
                warn!(listener = listener.index(), ?crossing, "handler missing, accepting");
                true
            }
        };
        trace!(%id, listener = listener.index(), ?crossing, verdict, "notified");
        if verdict {
            match crossing {
                Crossing::Discover => self.fabric.admit(listener, id),
                Crossing::Forget => self.fabric.release(listener, id),
            }
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutable view of one component table that permits in-place edits only.
pub struct TableMut<'a, C> {
    table: &'a mut ComponentTable<C>,
}

impl<C> TableMut<'_, C> {
    /// Gets the value for `id` mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut C> {
        self.table.get_mut(id)
    }

    /// Iterates `(id, value)` pairs mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut C)> {
        self.table.iter_mut()
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
