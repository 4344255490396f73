//! # FLAGSTATE
//!
//! Systems and a fixed-timestep loop on top of [`flagstate_core`].
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        GameLoop                              │
//! │                                                              │
//! │  InputHandle ──▶ ControlSystem ──▶ KinematicsSystem          │
//! │                        │                  │                  │
//! │                        ▼                  ▼                  │
//! │                ┌──────────────────────────────────┐          │
//! │                │   State (flagstate_core)         │◀─ Anim.  │
//! │                │   tables · masks · subscriptions │          │
//! │                └──────────────────────────────────┘          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `systems`: control, kinematics and animation logic
//! - `game_loop`: configuration, frame orchestration and timing
//! - `scene`: the demo scene the sandbox binary runs

pub mod error;
pub mod game_loop;
pub mod scene;
pub mod systems;

pub use flagstate_core as core;

pub use error::SandboxError;
pub use game_loop::{FrameStats, FrameStatsAccumulator, GameLoop, SandboxConfig};
pub use scene::Scene;
pub use systems::{
    AnimationSystem, ControlInput, ControlSystem, ControlTuning, InputHandle, KinematicsSystem,
    MoveKeys,
};
