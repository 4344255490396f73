//! Time-driven scale animation.
//!
//! Every entity with `Scale | ScalarMultFunc` gets
//! `scale.vec = func(scale.last_vec, elapsed_ms)` each tick, where
//! `elapsed_ms` is the system's own clock, advanced only while running.

use std::time::Duration;

use flagstate_core::ecs::ListenerId;
use flagstate_core::{ComponentKind, ComponentMask, ScalarMultFunc, Scale, State, SystemLogic};
use tracing::warn;

/// Applies [`ScalarMultFunc`] curves to [`Scale`] baselines.
#[derive(Debug, Default)]
pub struct AnimationSystem {
    elapsed: Duration,
}

impl AnimationSystem {
    /// Creates the system with its clock at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { elapsed: Duration::ZERO }
    }

    /// Milliseconds of animation time, saturating at `u32::MAX`.
    #[must_use]
    pub fn elapsed_ms(&self) -> u32 {
        u32::try_from(self.elapsed.as_millis()).unwrap_or(u32::MAX)
    }
}

impl SystemLogic for AnimationSystem {
    fn name(&self) -> &'static str {
        "animation"
    }

    fn required_components(&self) -> Vec<ComponentMask> {
        vec![ComponentKind::Scale | ComponentKind::ScalarMultFunc]
    }

    fn on_tick(&mut self, state: &mut State, registries: &[ListenerId], dt: f32) {
        match Duration::try_from_secs_f32(dt) {
            Ok(step) => self.elapsed = self.elapsed.saturating_add(step),
            Err(err) => warn!(dt, error = %err, "ignoring invalid timestep"),
        }
        let time_ms = self.elapsed_ms();

        for id in state.matching_snapshot(registries[0]) {
            let Ok(&curve) = state.get::<ScalarMultFunc>(id) else { continue };
            if let Ok(scale) = state.get_mut::<Scale>(id) {
                scale.vec = curve.mult_by_func_of_time(scale.last_vec, time_ms);
            }
        }
    }
}
