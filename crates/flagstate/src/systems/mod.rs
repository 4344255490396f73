//! # Systems
//!
//! Concrete [`SystemLogic`](flagstate_core::SystemLogic) implementations.
//! Register them with a [`Schedule`](flagstate_core::Schedule) in the order
//! they should tick; the sandbox uses control → kinematics → animation so
//! input lands in velocity before velocity lands in position.

mod animation;
mod control;
mod kinematics;

pub use animation::AnimationSystem;
pub use control::{ControlInput, ControlSystem, ControlTuning, InputHandle, MoveKeys};
pub use kinematics::KinematicsSystem;
