//! # Controls
//!
//! Turns held movement keys and look deltas into velocity and orientation.
//!
//! - registry 0, `WasdControls`: keys are rotated into the orienter's frame,
//!   normalized, scaled by the configured acceleration and integrated into
//!   `Velocity` with a speed cap and linear damping.
//! - registry 1, `MouseControls`: look deltas yaw about world Z and pitch
//!   about local X.
//!
//! Discovery of a WASD entity is refused when its orienter is neither the
//! entity itself nor alive with an `Orientation`. Forgetting one zeroes its
//! velocity so released entities coast to a stop immediately.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use flagstate_core::ecs::{accept_all, EntityHandler, ListenerId};
use flagstate_core::{
    ComponentKind, ComponentMask, ControlStyle, EntityId, MouseControls, Orientation, Quaternion,
    State, SystemLogic, Vec3, Velocity, WasdControls,
};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

const WASD: usize = 0;
const MOUSE: usize = 1;

/// Movement keys held during a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveKeys {
    /// Local +Y.
    pub forward: bool,
    /// Local -Y.
    pub back: bool,
    /// Local -X.
    pub left: bool,
    /// Local +X.
    pub right: bool,
    /// Local +Z.
    pub up: bool,
    /// Local -Z.
    pub down: bool,
}

impl MoveKeys {
    /// Sum of the held directions in the controller's local frame.
    #[must_use]
    pub fn direction(self) -> Vec3 {
        let axis = |pos: bool, neg: bool| f32::from(u8::from(pos)) - f32::from(u8::from(neg));
        Vec3::new(
            axis(self.right, self.left),
            axis(self.forward, self.back),
            axis(self.up, self.down),
        )
    }
}

/// Input sampled by the host for the next tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlInput {
    /// Held movement keys. Persist until the host changes them.
    pub keys: MoveKeys,
    /// Accumulated look delta in pixels `(dx, dy)`. Consumed every tick.
    pub look: (f32, f32),
}

/// Shared handle through which the host feeds [`ControlInput`].
pub type InputHandle = Rc<RefCell<ControlInput>>;

/// Control feel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlTuning {
    /// Acceleration magnitude while any key is held, units/s².
    pub acceleration: f32,
    /// Speed cap, units/s.
    pub max_speed: f32,
    /// Fraction of velocity shed per second.
    pub damping: f32,
    /// Degrees of rotation per pixel of look delta.
    pub look_sensitivity: f32,
}

impl Default for ControlTuning {
    fn default() -> Self {
        Self {
            acceleration: 8.0,
            max_speed: 4.0,
            damping: 2.0,
            look_sensitivity: 0.1,
        }
    }
}

/// WASD movement and mouse-look.
#[derive(Debug)]
pub struct ControlSystem {
    input: InputHandle,
    tuning: ControlTuning,
    refused: Rc<Cell<u32>>,
}

impl ControlSystem {
    /// Creates the system reading from `input`.
    #[must_use]
    pub fn new(input: InputHandle, tuning: ControlTuning) -> Self {
        Self {
            input,
            tuning,
            refused: Rc::new(Cell::new(0)),
        }
    }

    /// Number of WASD discoveries refused for a missing orienter.
    #[must_use]
    pub fn refused(&self) -> u32 {
        self.refused.get()
    }

    fn steer(&self, state: &mut State, ids: &[EntityId], keys: MoveKeys, dt: f32) {
        let tuning = self.tuning;
        for &id in ids {
            let Ok(&controls) = state.get::<WasdControls>(id) else { continue };
            let frame = state
                .get::<Orientation>(controls.orienter)
                .or_else(|_| state.get::<Orientation>(id))
                .map(|o| o.quat)
                .unwrap_or_default();

            let mut accel = frame.rotate(keys.direction());
            if controls.style == ControlStyle::RotateAboutZ {
                accel.z = 0.0;
            }
            let accel = accel.normalized() * tuning.acceleration;
            if let Ok(controls) = state.get_mut::<WasdControls>(id) {
                controls.accel = accel;
            }

            if let Ok(velocity) = state.get_mut::<Velocity>(id) {
                let mut vec = velocity.vec + accel * dt;
                if vec.length() > tuning.max_speed {
                    vec = vec.normalized() * tuning.max_speed;
                }
                velocity.vec = vec * (1.0 - tuning.damping * dt).clamp(0.0, 1.0);
            }
        }
    }

    fn look(&self, state: &mut State, ids: &[EntityId], (dx, dy): (f32, f32)) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        let per_pixel = self.tuning.look_sensitivity.to_radians();
        for &id in ids {
            let Ok(&mouse) = state.get::<MouseControls>(id) else { continue };
            let yaw_sign = if mouse.invert_x { 1.0 } else { -1.0 };
            let pitch_sign = if mouse.invert_y { 1.0 } else { -1.0 };
            let yaw =
                Quaternion::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), yaw_sign * dx * per_pixel);
            let pitch =
                Quaternion::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), pitch_sign * dy * per_pixel);
            if let Ok(orientation) = state.get_mut::<Orientation>(id) {
                orientation.quat = (yaw * orientation.quat * pitch).normalized();
            }
        }
    }
}

impl SystemLogic for ControlSystem {
    fn name(&self) -> &'static str {
        "control"
    }

    fn required_components(&self) -> Vec<ComponentMask> {
        vec![
            ComponentMask::of(ComponentKind::WasdControls),
            ComponentMask::of(ComponentKind::MouseControls),
        ]
    }

    fn handlers(&mut self, index: usize) -> (EntityHandler, EntityHandler) {
        if index != WASD {
            return (accept_all(), accept_all());
        }
        let refused = Rc::clone(&self.refused);
        let on_discover: EntityHandler = Box::new(move |state: &mut State, id: EntityId| {
            let Ok(controls) = state.get::<WasdControls>(id) else { return false };
            let orienter = controls.orienter;
            if orienter == id || state.has(orienter, ComponentKind::Orientation) {
                return true;
            }
            warn!(%id, %orienter, "orienter has no orientation, not controlling");
            refused.set(refused.get() + 1);
            false
        });
        let on_forget: EntityHandler = Box::new(|state: &mut State, id: EntityId| {
            if let Ok(velocity) = state.get_mut::<Velocity>(id) {
                velocity.vec = Vec3::ZERO;
            }
            trace!(%id, "released");
            true
        });
        (on_discover, on_forget)
    }

    fn on_tick(&mut self, state: &mut State, registries: &[ListenerId], dt: f32) {
        let input = {
            let mut input = self.input.borrow_mut();
            let sampled = *input;
            input.look = (0.0, 0.0);
            sampled
        };
        let looking = state.matching_snapshot(registries[MOUSE]);
        self.look(state, &looking, input.look);
        let steering = state.matching_snapshot(registries[WASD]);
        self.steer(state, &steering, input.keys, dt);
    }
}
