//! Demo scene: a pyramid flown with WASD through a mouse-look gimbal, a
//! spinning top, a flickering thruster flame and a field of drifters.

use flagstate_core::{
    AngularVelocity, ControlStyle, EcsResult, EntityId, MouseControls, Orientation, Position,
    ScalarMultFunc, Scale, State, Vec3, Velocity, WasdControls,
};
use tracing::info;

/// Flame flicker: the z scale pulses around its baseline.
fn fire_wiggle(base: Vec3, time_ms: u32) -> Vec3 {
    let phase = (time_ms % 62_832) as f32 * 0.1;
    Vec3::new(base.x, base.y, base.z * (1.0 + phase.sin()))
}

/// Ids of the populated scene.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scene {
    /// WASD-driven body.
    pub pyramid: EntityId,
    /// Mouse-look orienter for the pyramid.
    pub gimbal: EntityId,
    /// Spins about Z.
    pub top: EntityId,
    /// Animated scale.
    pub fire: EntityId,
    /// Filler entities with constant velocity.
    pub drifters: Vec<EntityId>,
}

impl Scene {
    /// Populates `state`. Register systems first so they discover everything.
    ///
    /// # Errors
    ///
    /// Any state error, most likely [`MaxIdReached`](flagstate_core::EcsError::MaxIdReached)
    /// when `id_limit` is smaller than the scene.
    pub fn populate(state: &mut State, drifter_count: usize) -> EcsResult<Self> {
        let gimbal = state.create_entity()?;
        state.add(gimbal, Position::new(0.0, 0.0, 1.0))?;
        state.add(gimbal, Orientation::default())?;
        state.add(gimbal, MouseControls::new(false, false))?;

        let pyramid = state.create_entity()?;
        state.add(pyramid, Position::default())?;
        state.add(pyramid, Orientation::default())?;
        state.add(pyramid, Velocity::default())?;
        state.add(pyramid, WasdControls::new(gimbal, ControlStyle::RotateAboutZ))?;

        let top = state.create_entity()?;
        state.add(top, Position::new(0.0, 0.0, 0.5))?;
        state.add(top, Orientation::default())?;
        state.add(top, AngularVelocity::new(Vec3::new(0.0, 0.0, 0.1)))?;

        let fire = state.create_entity()?;
        state.add(fire, Position::new(0.0, 0.0, -0.85))?;
        state.add(fire, Scale::new(Vec3::new(0.105, 0.105, 0.25)))?;
        state.add(fire, ScalarMultFunc::new(fire_wiggle))?;

        let mut drifters = Vec::with_capacity(drifter_count);
        for i in 0..drifter_count {
            let f = i as f32;
            let id = state.create_entity()?;
            state.add(id, Position::new(f * 0.3, 0.0, 0.0))?;
            state.add(id, Velocity::new(0.0, (f * 0.7).sin(), (f * 0.3).cos() * 0.1))?;
            drifters.push(id);
        }

        info!(alive = state.alive_count(), drifters = drifter_count, "scene populated");
        Ok(Self {
            pyramid,
            gimbal,
            top,
            fire,
            drifters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flagstate_core::{ComponentKind, EcsError, StateConfig};

    #[test]
    fn test_populate() {
        let mut state = State::new();
        let scene = Scene::populate(&mut state, 8).unwrap();

        assert_eq!(state.alive_count(), 12);
        assert_eq!(scene.drifters.len(), 8);
        assert_eq!(state.get::<WasdControls>(scene.pyramid).unwrap().orienter, scene.gimbal);
        assert!(state.has(scene.fire, ComponentKind::ScalarMultFunc));
        assert!(!state.has(scene.top, ComponentKind::Velocity));
    }

    #[test]
    fn test_populate_reports_exhaustion() {
        let config = StateConfig {
            id_limit: 4,
            ..StateConfig::default()
        };
        let mut state = State::with_config(&config);
        assert_eq!(Scene::populate(&mut state, 0), Err(EcsError::MaxIdReached { limit: 4 }));
    }

    #[test]
    fn test_fire_wiggle_keeps_xy() {
        let base = Vec3::new(0.1, 0.2, 1.0);
        let scaled = fire_wiggle(base, 5);
        assert_eq!((scaled.x, scaled.y), (0.1, 0.2));
        assert!((scaled.z - (1.0 + 0.5f32.sin())).abs() < 1e-6);
    }
}
