//! # Entity Component System
//!
//! A flag-based state container: one sparse table per component kind, an
//! existence record per live entity, and mask subscriptions kept current by
//! discover/forget notifications.
//!
//! ## Design Philosophy
//!
//! - The set of component kinds is closed and known at compile time
//! - An entity's mask is the single source of truth for "what is attached"
//! - Structural rules are checked before any table is touched
//! - Subscribers learn about boundary crossings, never about every write

mod component;
mod entity;
mod existence;
mod gatekeeper;
mod notify;
mod state;
mod storage;
mod system;

pub use component::{
    AngularVelocity, BodyHandle, CollisionGeometry, Component, ComponentKind, ComponentMask,
    ControlStyle, MouseControls, Orientation, Physics, Position, ScalarMultFunc, Scale, Velocity,
    WasdControls,
};
pub use entity::{EntityAllocator, EntityId};
pub use existence::{Existence, ExistenceRegistry};
pub use gatekeeper::{admit_addition, admit_removal};
pub use notify::{accept_all, Crossing, EntityHandler, ListenerId, MaskChange, NotificationFabric};
pub use state::{State, TableMut};
pub use storage::{ComponentTable, ComponentTables};
pub use system::{Runner, Schedule, System, SystemLogic, SystemStatus};
