//! # Flagstate Core
//!
//! Entity-component state container for small simulations:
//! - Entities are `u32` ids with LIFO id reuse
//! - Components are one of a closed set of kinds, tracked per entity as a bitmask
//! - Adding/removing components is gated by required/dependent rules
//! - Systems subscribe to masks and keep their own id lists current
//!
//! ## Architecture Rules
//!
//! 1. **Errors are values** - Every rejected mutation leaves the state untouched
//! 2. **Masks are authoritative** - A bit is set iff the table holds a row
//! 3. **Notifications are queued** - Handlers may mutate; nothing re-enters
//!
//! ## Example
//!
//! ```rust
//! use flagstate_core::{ComponentKind, Position, State, Velocity};
//! use flagstate_core::ecs::accept_all;
//!
//! let mut state = State::new();
//! let movers = state.listen_for_like_entities(
//!     ComponentKind::Position | ComponentKind::Velocity,
//!     accept_all(),
//!     accept_all(),
//! );
//!
//! let id = state.create_entity()?;
//! state.add(id, Position::new(0.0, 0.0, 0.0))?;
//! state.add(id, Velocity::new(1.0, 0.0, 0.0))?;
//! assert_eq!(state.matching(movers), &[id]);
//! # Ok::<(), flagstate_core::EcsError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod math;

pub use config::StateConfig;
pub use ecs::{
    AngularVelocity, BodyHandle, CollisionGeometry, Component, ComponentKind, ComponentMask,
    ControlStyle, EntityId, ListenerId, MouseControls, Orientation, Physics, Position,
    ScalarMultFunc, Scale, Schedule, State, System, SystemLogic, SystemStatus, Velocity,
    WasdControls,
};
pub use error::{result_code, ConfigError, EcsError, EcsResult, ResultCode, SystemError};
pub use math::{Quaternion, Vec3};
