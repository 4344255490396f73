//! # FLAGSTATE Sandbox
//!
//! Headless run of the demo scene. No window, no GPU; input is scripted.
//!
//! ```bash
//! # Defaults
//! cargo run --bin sandbox
//!
//! # With a config file and verbose state logging
//! RUST_LOG=flagstate_core=debug cargo run --bin sandbox -- sandbox.toml
//! ```

use flagstate::{ControlInput, GameLoop, SandboxConfig, SandboxError, Scene};
use flagstate::core::{Position, Scale};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Forward for the first half, a quarter turn of look at the quarter mark.
fn scripted_input(frame: u64, total: u64, input: &mut ControlInput) {
    input.keys.forward = frame < total / 2;
    if frame == total / 4 {
        input.look.0 -= 900.0;
    }
}

fn main() -> Result<(), SandboxError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match std::env::args().nth(1) {
        Some(path) => SandboxConfig::load(path)?,
        None => SandboxConfig::default(),
    };
    info!(tick_rate = config.tick_rate, ticks = config.ticks, "sandbox starting");

    let total = config.ticks;
    let mut game_loop = GameLoop::new(config.clone());
    game_loop.init()?;
    let scene = Scene::populate(game_loop.state_mut(), config.entity_count)?;

    let input = game_loop.input();
    for frame in 0..total {
        scripted_input(frame, total, &mut input.borrow_mut());

        // Retire the drifters halfway through; their ids go back to the pool.
        if frame == total / 2 {
            for &id in &scene.drifters {
                game_loop.state_mut().delete_entity(id)?;
            }
            info!(alive = game_loop.state().alive_count(), "drifters retired");
        }

        game_loop.step()?;
    }

    let state = game_loop.state();
    if let Ok(position) = state.get::<Position>(scene.pyramid) {
        info!(x = position.vec.x, y = position.vec.y, z = position.vec.z, "pyramid final position");
    }
    if let Ok(scale) = state.get::<Scale>(scene.fire) {
        info!(z = scale.vec.z, "flame final scale");
    }
    game_loop.stats().log_summary();
    game_loop.shutdown()
}
