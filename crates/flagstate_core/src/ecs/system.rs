//! # Systems
//!
//! A system is per-frame logic over the entities matching one or more
//! component masks. The generic [`System`] runner owns the lifecycle:
//!
//! ```text
//! Uninitialized ──init──▶ Running ◀──resume/pause──▶ Paused
//!                            │                         │
//!                            └────────clean────────────┴──▶ Cleaned
//! ```
//!
//! `init` registers one subscription per declared mask, so the runner's id
//! lists are kept current by discover/forget notifications rather than by
//! scanning. `clean` is terminal: the subscriptions are retired, so the lists
//! are emptied and never refilled and the handlers never run again, although
//! the subscriptions stay registered.

use tracing::{debug, warn};

use super::component::ComponentMask;
use super::notify::{accept_all, EntityHandler, ListenerId};
use super::state::State;
use crate::error::SystemError;

/// Where a runner is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SystemStatus {
    /// Constructed, not yet registered.
    Uninitialized,
    /// Ticking every frame.
    Running,
    /// Registered, but ticks are skipped.
    Paused,
    /// Torn down; terminal.
    Cleaned,
}

/// Subsystem-specific behavior plugged into a [`System`] runner.
pub trait SystemLogic {
    /// Short name for logs and errors.
    fn name(&self) -> &'static str;

    /// One mask per id list the system needs. Registry `i` in the hooks
    /// below corresponds to entry `i` here.
    fn required_components(&self) -> Vec<ComponentMask>;

    /// Discover/forget handlers for registry `index`. Defaults to accepting
    /// every entity.
    fn handlers(&mut self, index: usize) -> (EntityHandler, EntityHandler) {
        let _ = index;
        (accept_all(), accept_all())
    }

    /// Setup, after subscriptions are registered.
    ///
    /// # Errors
    ///
    /// Any [`SystemError`]; the runner becomes [`SystemStatus::Cleaned`].
    fn on_init(&mut self, state: &mut State, registries: &[ListenerId]) -> Result<(), SystemError> {
        let _ = (state, registries);
        Ok(())
    }

    /// Per-frame work.
    fn on_tick(&mut self, state: &mut State, registries: &[ListenerId], dt: f32);

    /// Teardown, before the id lists are emptied.
    fn on_clean(&mut self, state: &mut State, registries: &[ListenerId]) {
        let _ = (state, registries);
    }
}

/// Lifecycle driver around a [`SystemLogic`].
#[derive(Debug)]
pub struct System<L> {
    logic: L,
    registries: Vec<ListenerId>,
    status: SystemStatus,
}

impl<L: SystemLogic> System<L> {
    /// Wraps logic in an uninitialized runner.
    #[must_use]
    pub fn new(logic: L) -> Self {
        Self {
            logic,
            registries: Vec::new(),
            status: SystemStatus::Uninitialized,
        }
    }

    fn invalid(&self, operation: &'static str) -> SystemError {
        warn!(system = self.logic.name(), operation, status = ?self.status, "rejected transition");
        SystemError::InvalidTransition {
            system: self.logic.name(),
            operation,
            status: self.status,
        }
    }

    /// Registers subscriptions and runs setup.
    ///
    /// # Errors
    ///
    /// [`SystemError::InvalidTransition`] unless uninitialized; otherwise
    /// whatever setup returns.
    pub fn init(&mut self, state: &mut State) -> Result<(), SystemError> {
        if self.status != SystemStatus::Uninitialized {
            return Err(self.invalid("init"));
        }
        for (index, likeness) in self.logic.required_components().into_iter().enumerate() {
            let (on_discover, on_forget) = self.logic.handlers(index);
            let listener = state.listen_for_like_entities(likeness, on_discover, on_forget);
            self.registries.push(listener);
        }
        match self.logic.on_init(state, &self.registries) {
            Ok(()) => {
                self.status = SystemStatus::Running;
                debug!(
                    system = self.logic.name(),
                    registries = self.registries.len(),
                    "system initialized"
                );
                Ok(())
            }
            Err(err) => {
                warn!(system = self.logic.name(), error = %err, "system setup failed");
                self.drop_view(state);
                Err(err)
            }
        }
    }

    /// Runs one frame unless paused.
    ///
    /// # Errors
    ///
    /// [`SystemError::InvalidTransition`] before init or after clean.
    pub fn tick(&mut self, state: &mut State, dt: f32) -> Result<(), SystemError> {
        match self.status {
            SystemStatus::Running => {
                self.logic.on_tick(state, &self.registries, dt);
                Ok(())
            }
            SystemStatus::Paused => Ok(()),
            SystemStatus::Uninitialized | SystemStatus::Cleaned => Err(self.invalid("tick")),
        }
    }

    /// Stops ticking. Pausing a paused runner is a no-op.
    ///
    /// # Errors
    ///
    /// [`SystemError::InvalidTransition`] before init or after clean.
    pub fn pause(&mut self) -> Result<(), SystemError> {
        match self.status {
            SystemStatus::Running | SystemStatus::Paused => {
                self.status = SystemStatus::Paused;
                Ok(())
            }
            SystemStatus::Uninitialized | SystemStatus::Cleaned => Err(self.invalid("pause")),
        }
    }

    /// Resumes ticking. Resuming a running runner is a no-op.
    ///
    /// # Errors
    ///
    /// [`SystemError::InvalidTransition`] before init or after clean.
    pub fn resume(&mut self) -> Result<(), SystemError> {
        match self.status {
            SystemStatus::Running | SystemStatus::Paused => {
                self.status = SystemStatus::Running;
                Ok(())
            }
            SystemStatus::Uninitialized | SystemStatus::Cleaned => Err(self.invalid("resume")),
        }
    }

    /// Runs teardown and empties the id lists. Cleaning twice is a no-op.
    ///
    /// # Errors
    ///
    /// [`SystemError::InvalidTransition`] before init.
    pub fn clean(&mut self, state: &mut State) -> Result<(), SystemError> {
        match self.status {
            SystemStatus::Running | SystemStatus::Paused => {
                self.logic.on_clean(state, &self.registries);
                self.drop_view(state);
                debug!(system = self.logic.name(), "system cleaned");
                Ok(())
            }
            SystemStatus::Cleaned => Ok(()),
            SystemStatus::Uninitialized => Err(self.invalid("clean")),
        }
    }

    fn drop_view(&mut self, state: &mut State) {
        for &listener in &self.registries {
            state.retire_listener(listener);
        }
        self.status = SystemStatus::Cleaned;
    }

    /// Current lifecycle status.
    #[must_use]
    pub const fn status(&self) -> SystemStatus {
        self.status
    }

    /// Whether ticks are currently skipped.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.status == SystemStatus::Paused
    }

    /// Subscriptions registered by `init`, in declaration order.
    #[must_use]
    pub fn registries(&self) -> &[ListenerId] {
        &self.registries
    }

    /// The wrapped logic.
    #[must_use]
    pub const fn logic(&self) -> &L {
        &self.logic
    }

    /// The wrapped logic, mutably.
    pub fn logic_mut(&mut self) -> &mut L {
        &mut self.logic
    }
}

/// Object-safe view of a runner, so heterogeneous systems can share a
/// [`Schedule`].
pub trait Runner {
    /// Name of the wrapped logic.
    fn name(&self) -> &'static str;
    /// See [`System::init`].
    ///
    /// # Errors
    ///
    /// As [`System::init`].
    fn init(&mut self, state: &mut State) -> Result<(), SystemError>;
    /// See [`System::tick`].
    ///
    /// # Errors
    ///
    /// As [`System::tick`].
    fn tick(&mut self, state: &mut State, dt: f32) -> Result<(), SystemError>;
    /// See [`System::pause`].
    ///
    /// # Errors
    ///
    /// As [`System::pause`].
    fn pause(&mut self) -> Result<(), SystemError>;
    /// See [`System::resume`].
    ///
    /// # Errors
    ///
    /// As [`System::resume`].
    fn resume(&mut self) -> Result<(), SystemError>;
    /// See [`System::clean`].
    ///
    /// # Errors
    ///
    /// As [`System::clean`].
    fn clean(&mut self, state: &mut State) -> Result<(), SystemError>;
    /// See [`System::status`].
    fn status(&self) -> SystemStatus;
}

impl<L: SystemLogic> Runner for System<L> {
    fn name(&self) -> &'static str {
        self.logic.name()
    }
    fn init(&mut self, state: &mut State) -> Result<(), SystemError> {
        System::init(self, state)
    }
    fn tick(&mut self, state: &mut State, dt: f32) -> Result<(), SystemError> {
        System::tick(self, state, dt)
    }
    fn pause(&mut self) -> Result<(), SystemError> {
        System::pause(self)
    }
    fn resume(&mut self) -> Result<(), SystemError> {
        System::resume(self)
    }
    fn clean(&mut self, state: &mut State) -> Result<(), SystemError> {
        System::clean(self, state)
    }
    fn status(&self) -> SystemStatus {
        System::status(self)
    }
}

/// Runners ticked in a fixed, insertion-defined order.
#[derive(Default)]
pub struct Schedule {
    runners: Vec<Box<dyn Runner>>,
}

impl Schedule {
    /// Creates an empty schedule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a runner; it ticks after every runner added before it.
    pub fn add(&mut self, runner: impl Runner + 'static) -> &mut Self {
        self.runners.push(Box::new(runner));
        self
    }

    /// Number of runners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.runners.len()
    }

    /// Whether the schedule is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runners.is_empty()
    }

    /// Initializes every runner in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// The first runner's init error.
    pub fn init(&mut self, state: &mut State) -> Result<(), SystemError> {
        self.runners.iter_mut().try_for_each(|runner| runner.init(state))
    }

    /// Ticks every runner in order. Paused runners are skipped.
    ///
    /// # Errors
    ///
    /// The first runner's tick error; later runners do not tick that frame.
    pub fn tick(&mut self, state: &mut State, dt: f32) -> Result<(), SystemError> {
        self.runners.iter_mut().try_for_each(|runner| runner.tick(state, dt))
    }

    /// Cleans every runner in order.
    ///
    /// # Errors
    ///
    /// The first runner's clean error.
    pub fn clean(&mut self, state: &mut State) -> Result<(), SystemError> {
        self.runners.iter_mut().try_for_each(|runner| runner.clean(state))
    }

    /// Looks a runner up by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn Runner + 'static)> {
        self.runners
            .iter_mut()
            .find(|runner| runner.name() == name)
            .map(|runner| &mut **runner)
    }

    /// Runner names in tick order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.runners.iter().map(|runner| runner.name())
    }
}

impl std::fmt::Debug for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
