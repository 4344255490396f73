//! # Notification Fabric
//!
//! Subscriptions keyed by a component mask. Whenever an entity's mask
//! crosses a subscription's satisfaction boundary the subscriber is told:
//!
//! ```text
//! old ⊉ M, new ⊇ M  → discover(id); admitted to the id list if it returns true
//! old ⊇ M, new ⊉ M  → forget(id) if listed; dropped from the list if true
//! anything else     → nothing
//! ```
//!
//! "Not alive" satisfies no mask, so creation and deletion are crossings for
//! every subscription, including the empty one.
//!
//! ## Re-entrancy
//!
//! Handlers get `&mut State` and may mutate it. Mutations never dispatch
//! directly: they enqueue a [`MaskChange`], and only the outermost call drains
//! the queue. A running handler is taken out of its slot, so it is never
//! re-entered, and changes it causes are evaluated after it returns, in order.
//!
//! ## Retirement
//!
//! A retired subscription stays registered (its [`ListenerId`] stays valid)
//! but is skipped by dispatch: its list is empty for good and its handlers
//! are dropped.

use std::collections::VecDeque;

use super::component::ComponentMask;
use super::entity::EntityId;
use super::state::State;

/// Callback invoked on discover/forget. The return value gates admission to
/// (or removal from) the subscription's id list.
pub type EntityHandler = Box<dyn FnMut(&mut State, EntityId) -> bool>;

/// Handler that admits or releases every entity unconditionally.
#[must_use]
pub fn accept_all() -> EntityHandler {
    Box::new(|_: &mut State, _: EntityId| true)
}

/// Handle to a registered subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

impl ListenerId {
    /// Position of the subscription in registration order.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Which way a mask change crossed a subscription's boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Crossing {
    /// The entity now satisfies the subscription.
    Discover,
    /// The entity no longer satisfies the subscription.
    Forget,
}

/// One pending mask transition. `None` means "not alive".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaskChange {
    /// The entity whose mask changed.
    pub id: EntityId,
    /// Mask before the mutation.
    pub old: Option<ComponentMask>,
    /// Mask after the mutation.
    pub new: Option<ComponentMask>,
}

impl MaskChange {
    /// Evaluates the change against a subscription mask.
    #[must_use]
    pub fn crossing(&self, likeness: ComponentMask) -> Option<Crossing> {
        let satisfied =
            |mask: Option<ComponentMask>| mask.is_some_and(|m| m.contains_all(likeness));
        match (satisfied(self.old), satisfied(self.new)) {
            (false, true) => Some(Crossing::Discover),
            (true, false) => Some(Crossing::Forget),
            _ => None,
        }
    }
}

/// A subscription: mask, handlers, and the maintained id list.
struct Listener {
    likeness: ComponentMask,
    ids: Vec<EntityId>,
    on_discover: Option<EntityHandler>,
    on_forget: Option<EntityHandler>,
    retired: bool,
}

/// Registry of subscriptions plus the pending-change queue.
#[derive(Default)]
pub struct NotificationFabric {
    listeners: Vec<Listener>,
    pending: VecDeque<MaskChange>,
    dispatching: bool,
}

impl NotificationFabric {
    /// Creates an empty fabric.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscription. Existing entities are not replayed.
    pub fn listen(
        &mut self,
        likeness: ComponentMask,
        on_discover: EntityHandler,
        on_forget: EntityHandler,
    ) -> ListenerId {
        self.listeners.push(Listener {
            likeness,
            ids: Vec::new(),
            on_discover: Some(on_discover),
            on_forget: Some(on_forget),
            retired: false,
        });
        ListenerId(self.listeners.len() - 1)
    }

    /// Number of registered subscriptions.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Mask of a subscription.
    #[must_use]
    pub fn likeness(&self, listener: ListenerId) -> Option<ComponentMask> {
        self.listeners.get(listener.0).map(|l| l.likeness)
    }

    /// Current id list of a subscription (empty for unknown ids).
    #[must_use]
    pub fn matching(&self, listener: ListenerId) -> &[EntityId] {
        self.listeners.get(listener.0).map(|l| l.ids.as_slice()).unwrap_or(&[])
    }

    /// Drops every id from a subscription's list. No handlers run.
    pub fn clear_matching(&mut self, listener: ListenerId) {
        if let Some(l) = self.listeners.get_mut(listener.0) {
            l.ids.clear();
        }
    }

    /// Stops a subscription for good: empties its list, drops its handlers
    /// and excludes it from every later dispatch.
    pub fn retire(&mut self, listener: ListenerId) {
        if let Some(l) = self.listeners.get_mut(listener.0) {
            l.retired = true;
            l.ids.clear();
            l.on_discover = None;
            l.on_forget = None;
        }
    }

    /// Whether the subscription has been retired.
    #[must_use]
    pub fn is_retired(&self, listener: ListenerId) -> bool {
        self.listeners.get(listener.0).is_some_and(|l| l.retired)
    }

    /// Whether `id` is in the subscription's list.
    #[must_use]
    pub fn is_listed(&self, listener: ListenerId, id: EntityId) -> bool {
        self.matching(listener).contains(&id)
    }

    pub(crate) fn enqueue(&mut self, change: MaskChange) {
        self.pending.push_back(change);
    }

    /// Marks the start of a drain. Returns `false` if one is already running.
    pub(crate) fn begin_dispatch(&mut self) -> bool {
        !std::mem::replace(&mut self.dispatching, true)
    }

    pub(crate) fn end_dispatch(&mut self) {
        self.dispatching = false;
    }

    pub(crate) fn next_change(&mut self) -> Option<MaskChange> {
        self.pending.pop_front()
    }

    pub(crate) fn crossing_at(
        &self,
        index: usize,
        change: &MaskChange,
    ) -> Option<(ListenerId, Crossing)> {
        let listener = self.listeners.get(index).filter(|l| !l.retired)?;
        change.crossing(listener.likeness).map(|c| (ListenerId(index), c))
    }

    pub(crate) fn take_handler(
        &mut self,
        listener: ListenerId,
        crossing: Crossing,
    ) -> Option<EntityHandler> {
        let l = self.listeners.get_mut(listener.0)?;
        match crossing {
            Crossing::Discover => l.on_discover.take(),
            Crossing::Forget => l.on_forget.take(),
        }
    }

    /// Puts a handler back after it ran. Retired subscriptions drop it.
    pub(crate) fn restore_handler(
        &mut self,
        listener: ListenerId,
        crossing: Crossing,
        handler: EntityHandler,
    ) {
        if let Some(l) = self.listeners.get_mut(listener.0).filter(|l| !l.retired) {
            match crossing {
                Crossing::Discover => l.on_discover = Some(handler),
                Crossing::Forget => l.on_forget = Some(handler),
            }
        }
    }

    /// Appends `id` unless already listed or the subscription is retired.
    pub(crate) fn admit(&mut self, listener: ListenerId, id: EntityId) {
        if let Some(l) = self.listeners.get_mut(listener.0).filter(|l| !l.retired) {
            if !l.ids.contains(&id) {
                l.ids.push(id);
            }
        }
    }

    /// Swap-removes `id` if listed.
    pub(crate) fn release(&mut self, listener: ListenerId, id: EntityId) {
        if let Some(l) = self.listeners.get_mut(listener.0) {
            if let Some(position) = l.ids.iter().position(|&listed| listed == id) {
                l.ids.swap_remove(position);
            }
        }
    }
}

impl std::fmt::Debug for NotificationFabric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationFabric")
            .field("listeners", &self.listeners.len())
            .field("pending", &self.pending.len())
            .field("dispatching", &self.dispatching)
            .finish()
    }
}
