//! # Game Loop
//!
//! Fixed-timestep driver over one [`State`] and one [`Schedule`]:
//! ```text
//! Frame N:
//! ┌──────────────────────────────────────────────────────────────┐
//! │ 1. HOST INPUT    write ControlInput through the InputHandle  │
//! │ 2. TICK          control → kinematics → animation            │
//! │ 3. RECORD        tick time, alive count, budget check        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//! The loop never sleeps; pacing is the host's business. `dt` is always
//! `1 / tick_rate`, regardless of wall-clock time.

use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

use flagstate_core::{ConfigError, Schedule, State, StateConfig, System};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::SandboxError;
use crate::systems::{
    AnimationSystem, ControlInput, ControlSystem, ControlTuning, InputHandle, KinematicsSystem,
};

/// Sandbox configuration.
///
/// ```toml
/// tick_rate = 60
/// ticks = 600
/// entity_count = 64
///
/// [state]
/// id_limit = 100000
///
/// [controls]
/// max_speed = 6.0
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SandboxConfig {
    /// Ticks per simulated second.
    pub tick_rate: u32,
    /// Ticks to run before shutting down.
    pub ticks: u64,
    /// Drifting filler entities to spawn next to the demo scene.
    pub entity_count: usize,
    /// State container settings.
    pub state: StateConfig,
    /// Control feel.
    pub controls: ControlTuning,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            ticks: 600,
            entity_count: 64,
            state: StateConfig::default(),
            controls: ControlTuning::default(),
        }
    }
}

impl SandboxConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML, [`ConfigError::Invalid`]
    /// for out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges, including the nested state settings.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::Invalid("tick_rate must be positive".into()));
        }
        if !(self.controls.max_speed >= 0.0 && self.controls.damping >= 0.0) {
            return Err(ConfigError::Invalid(
                "controls.max_speed and controls.damping must be non-negative".into(),
            ));
        }
        self.state.validate()
    }

    /// Seconds per tick.
    #[must_use]
    pub fn delta_time(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }

    /// Wall-clock budget for one tick at the configured rate.
    #[must_use]
    pub fn tick_budget(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate
    }
}

/// Timing for one tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameStats {
    /// Frame number, starting at 0.
    pub frame: u64,
    /// Wall-clock time spent in the schedule, microseconds.
    pub tick_us: u64,
    /// Live entities after the tick.
    pub alive: usize,
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of tick times.
    pub tick_us_sum: u64,
    /// Fastest tick.
    pub min_tick_us: u64,
    /// Slowest tick.
    pub max_tick_us: u64,
    /// Ticks that exceeded the budget.
    pub frames_over_budget: u64,
}

impl FrameStatsAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            frames_recorded: 0,
            tick_us_sum: 0,
            min_tick_us: u64::MAX,
            max_tick_us: 0,
            frames_over_budget: 0,
        }
    }

    /// Records one tick against `budget`.
    pub fn record(&mut self, stats: FrameStats, budget: Duration) {
        self.frames_recorded += 1;
        self.tick_us_sum += stats.tick_us;
        self.min_tick_us = self.min_tick_us.min(stats.tick_us);
        self.max_tick_us = self.max_tick_us.max(stats.tick_us);
        if u128::from(stats.tick_us) > budget.as_micros() {
            self.frames_over_budget += 1;
        }
    }

    /// Average tick time in milliseconds.
    #[must_use]
    pub fn avg_tick_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.tick_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Fraction of ticks over budget.
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }

    /// Logs a one-line summary.
    pub fn log_summary(&self) {
        let min_us = if self.frames_recorded == 0 { 0 } else { self.min_tick_us };
        info!(
            frames = self.frames_recorded,
            avg_ms = format_args!("{:.3}", self.avg_tick_ms()),
            min_us,
            max_us = self.max_tick_us,
            over_budget_pct = format_args!("{:.1}", self.over_budget_ratio() * 100.0),
            "frame statistics"
        );
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the state, the schedule and the input handle.
pub struct GameLoop {
    state: State,
    schedule: Schedule,
    input: InputHandle,
    config: SandboxConfig,
    frame_count: u64,
    stats: FrameStatsAccumulator,
}

impl GameLoop {
    /// Builds the state and registers control, kinematics and animation, in
    /// that order. Nothing is initialized yet.
    #[must_use]
    pub fn new(config: SandboxConfig) -> Self {
        let input = InputHandle::default();
        let mut schedule = Schedule::new();
        schedule
            .add(System::new(ControlSystem::new(Rc::clone(&input), config.controls)))
            .add(System::new(KinematicsSystem::new()))
            .add(System::new(AnimationSystem::new()));

        Self {
            state: State::with_config(&config.state),
            schedule,
            input,
            config,
            frame_count: 0,
            stats: FrameStatsAccumulator::new(),
        }
    }

    /// Initializes every system. Call before populating the state: existing
    /// entities are not replayed to new subscriptions.
    ///
    /// # Errors
    ///
    /// The first system's init error.
    pub fn init(&mut self) -> Result<(), SandboxError> {
        self.schedule.init(&mut self.state)?;
        debug!(systems = ?self.schedule, "schedule initialized");
        Ok(())
    }

    /// Runs one fixed-length tick.
    ///
    /// # Errors
    ///
    /// A system lifecycle error; the frame counter does not advance.
    pub fn step(&mut self) -> Result<FrameStats, SandboxError> {
        let start = Instant::now();
        self.schedule.tick(&mut self.state, self.config.delta_time())?;
        let elapsed = start.elapsed();

        let stats = FrameStats {
            frame: self.frame_count,
            tick_us: u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            alive: self.state.alive_count(),
        };
        let budget = self.config.tick_budget();
        if elapsed > budget {
            warn!(frame = stats.frame, tick_us = stats.tick_us, ?budget, "tick over budget");
        }
        self.stats.record(stats, budget);
        self.frame_count += 1;
        Ok(stats)
    }

    /// Runs `config.ticks` ticks, calling `before_tick` with the frame number
    /// and the input to fill in ahead of each one.
    ///
    /// # Errors
    ///
    /// As [`step`](Self::step).
    pub fn run(
        &mut self,
        mut before_tick: impl FnMut(u64, &mut ControlInput),
    ) -> Result<&FrameStatsAccumulator, SandboxError> {
        for _ in 0..self.config.ticks {
            before_tick(self.frame_count, &mut *self.input.borrow_mut());
            self.step()?;
        }
        Ok(&self.stats)
    }

    /// Cleans every system.
    ///
    /// # Errors
    ///
    /// The first system's clean error.
    pub fn shutdown(&mut self) -> Result<(), SandboxError> {
        self.schedule.clean(&mut self.state)?;
        info!(frames = self.frame_count, alive = self.state.alive_count(), "shut down");
        Ok(())
    }

    /// The state container.
    #[must_use]
    pub const fn state(&self) -> &State {
        &self.state
    }

    /// The state container, mutably (scene setup, host-side edits).
    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    /// The schedule, mutably (pause/resume by name).
    pub fn schedule_mut(&mut self) -> &mut Schedule {
        &mut self.schedule
    }

    /// Handle through which the host feeds input.
    #[must_use]
    pub fn input(&self) -> InputHandle {
        Rc::clone(&self.input)
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Ticks completed.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Accumulated statistics.
    #[must_use]
    pub const fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats
    }
}

impl std::fmt::Debug for GameLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLoop")
            .field("schedule", &self.schedule)
            .field("frame_count", &self.frame_count)
            .field("alive", &self.state.alive_count())
            .finish_non_exhaustive()
    }
}
