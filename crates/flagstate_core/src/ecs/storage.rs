//! # Component Storage
//!
//! One densely packed table per component kind.
//!
//! Each table is a sparse set:
//! - `sparse[id]` holds the dense slot of the entity's value (or nothing)
//! - values live contiguously in `dense`, with `owners` mirroring their ids
//! - removal swaps the last value into the hole, so slots are not stable
//!   across mutations, but lookup, insert and remove are all O(1)

use bytemuck::Pod;

use super::component::{
    AngularVelocity, Component, ComponentKind, ComponentMask, MouseControls, Orientation, Physics,
    Position, ScalarMultFunc, Scale, Velocity, WasdControls,
};
use super::entity::EntityId;

/// Dense storage for a single component type, keyed by entity id.
///
/// # Example
///
/// ```rust,ignore
/// let mut table: ComponentTable<Position> = ComponentTable::with_capacity(1024);
/// table.insert(id, Position::new(1.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone)]
pub struct ComponentTable<C> {
    /// Entity id -> dense slot.
    sparse: Vec<Option<usize>>,
    /// The packed values.
    dense: Vec<C>,
    /// `owners[slot]` is the entity that owns `dense[slot]`.
    owners: Vec<EntityId>,
}

impl<C> ComponentTable<C> {
    /// Creates an empty table with room for `capacity` values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sparse: Vec::with_capacity(capacity + 1),
            dense: Vec::with_capacity(capacity),
            owners: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    fn slot(&self, id: EntityId) -> Option<usize> {
        self.sparse.get(id.index()).copied().flatten()
    }

    /// Number of stored values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Whether the table is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Whether `id` has a value here.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.slot(id).is_some()
    }

    /// Gets the value for `id`.
    #[inline]
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&C> {
        self.slot(id).map(|slot| &self.dense[slot])
    }

    /// Gets the value for `id` mutably.
    #[inline]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut C> {
        self.slot(id).map(move |slot| &mut self.dense[slot])
    }

    /// Inserts a value for `id`.
    ///
    /// Never overwrites: if `id` already has a value, the new one is handed
    /// back unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Err(value)` if `id` is already present.
    pub fn insert(&mut self, id: EntityId, value: C) -> Result<(), C> {
        if self.contains(id) {
            return Err(value);
        }
        if self.sparse.len() <= id.index() {
            self.sparse.resize(id.index() + 1, None);
        }
        self.sparse[id.index()] = Some(self.dense.len());
        self.dense.push(value);
        self.owners.push(id);
        Ok(())
    }

    /// Removes and returns the value for `id`.
    pub fn remove(&mut self, id: EntityId) -> Option<C> {
        let slot = self.slot(id)?;
        self.sparse[id.index()] = None;
        let value = self.dense.swap_remove(slot);
        self.owners.swap_remove(slot);
        if let Some(&moved) = self.owners.get(slot) {
            // The former last value now lives in the hole.
            self.sparse[moved.index()] = Some(slot);
        }
        Some(value)
    }

    /// Entity ids with a value, in storage order.
    #[inline]
    #[must_use]
    pub fn ids(&self) -> &[EntityId] {
        &self.owners
    }

    /// Values in storage order (parallel to [`ids`](Self::ids)).
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[C] {
        &self.dense
    }

    /// Iterates `(id, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &C)> {
        self.owners.iter().copied().zip(self.dense.iter())
    }

    /// Iterates `(id, value)` pairs mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut C)> {
        self.owners.iter().copied().zip(self.dense.iter_mut())
    }

    /// Drops every value.
    pub fn clear(&mut self) {
        self.sparse.clear();
        self.dense.clear();
        self.owners.clear();
    }
}

impl<C: Pod> ComponentTable<C> {
    /// Raw bytes of the packed values, for upload paths.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.dense)
    }
}

impl<C> Default for ComponentTable<C> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

/// Stamps out the table-of-tables: one field per kind, the [`Component`]
/// impl that routes a payload type to its field, and kind-tagged access for
/// code that only knows a [`ComponentKind`].
macro_rules! component_tables {
    ($($ty:ident => $field:ident),+ $(,)?) => {
        /// One table per component kind.
        #[derive(Debug, Clone, Default)]
        pub struct ComponentTables {
            $(
                #[doc = concat!("Table for [`", stringify!($ty), "`].")]
                pub $field: ComponentTable<$ty>,
            )+
        }

        impl ComponentTables {
            /// Creates every table with room for `capacity` values.
            #[must_use]
            pub fn with_capacity(capacity: usize) -> Self {
                Self {
                    $( $field: ComponentTable::with_capacity(capacity), )+
                }
            }

            /// Whether `id` has a value in the table for `kind`.
            #[must_use]
            pub fn contains(&self, kind: ComponentKind, id: EntityId) -> bool {
                match kind {
                    $( ComponentKind::$ty => self.$field.contains(id), )+
                }
            }

            /// Drops the value for `id` from the table for `kind`.
            ///
            /// Returns whether a value was present.
            pub fn erase(&mut self, kind: ComponentKind, id: EntityId) -> bool {
                match kind {
                    $( ComponentKind::$ty => self.$field.remove(id).is_some(), )+
                }
            }

            /// Number of values stored for `kind`.
            #[must_use]
            pub fn len_of(&self, kind: ComponentKind) -> usize {
                match kind {
                    $( ComponentKind::$ty => self.$field.len(), )+
                }
            }

            /// Rebuilds the mask of kinds held for `id` by probing every table.
            #[must_use]
            pub fn probe_mask(&self, id: EntityId) -> ComponentMask {
                let mut mask = ComponentMask::EMPTY;
                $(
                    if self.$field.contains(id) {
                        mask |= ComponentKind::$ty;
                    }
                )+
                mask
            }
        }

        $(
            impl Component for $ty {
                const KIND: ComponentKind = ComponentKind::$ty;

                #[inline]
                fn table(tables: &ComponentTables) -> &ComponentTable<Self> {
                    &tables.$field
                }

                #[inline]
                fn table_mut(tables: &mut ComponentTables) -> &mut ComponentTable<Self> {
                    &mut tables.$field
                }
            }
        )+
    };
}

// =========================================================================
// Component Tables - Add new component types here (and to ComponentKind)
// =========================================================================
component_tables! {
    Position => positions,
    Velocity => velocities,
    Orientation => orientations,
    AngularVelocity => angular_velocities,
    Scale => scales,
    ScalarMultFunc => scalar_mult_funcs,
    Physics => physics,
    WasdControls => wasd_controls,
    MouseControls => mouse_controls,
}
