//! Linear and angular integration.
//!
//! ```text
//! registry 0: Position | Velocity              → position += velocity·dt
//! registry 1: Orientation | AngularVelocity    → orientation = rot(ω·dt) · orientation
//! ```

use flagstate_core::ecs::ListenerId;
use flagstate_core::{
    AngularVelocity, ComponentKind, ComponentMask, Orientation, Position, Quaternion, State,
    SystemLogic, Velocity,
};

const MOVERS: usize = 0;
const SPINNERS: usize = 1;

/// Explicit Euler integration of linear and angular velocity.
#[derive(Debug, Default)]
pub struct KinematicsSystem {
    ticks: u64,
}

impl KinematicsSystem {
    /// Creates the system.
    #[must_use]
    pub const fn new() -> Self {
        Self { ticks: 0 }
    }

    /// Ticks processed so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl SystemLogic for KinematicsSystem {
    fn name(&self) -> &'static str {
        "kinematics"
    }

    fn required_components(&self) -> Vec<ComponentMask> {
        vec![
            ComponentKind::Position | ComponentKind::Velocity,
            ComponentKind::Orientation | ComponentKind::AngularVelocity,
        ]
    }

    fn on_tick(&mut self, state: &mut State, registries: &[ListenerId], dt: f32) {
        self.ticks += 1;

        for id in state.matching_snapshot(registries[MOVERS]) {
            let Ok(&velocity) = state.get::<Velocity>(id) else { continue };
            if let Ok(position) = state.get_mut::<Position>(id) {
                position.vec += velocity.vec * dt;
            }
        }

        for id in state.matching_snapshot(registries[SPINNERS]) {
            let Ok(&angular) = state.get::<AngularVelocity>(id) else { continue };
            if let Ok(orientation) = state.get_mut::<Orientation>(id) {
                let step = Quaternion::from_rotation_vector(angular.omega * dt);
                orientation.quat = (step * orientation.quat).normalized();
            }
        }
    }
}
