//! The session lock state machine.
//!
//! `SessionController` sits above the vault and expires the unlocked
//! state after inactivity.  It never touches key material; when the
//! idle timeout fires it simply calls `Vault::lock()` and broadcasts
//! the transition.
//!
//! States cycle `Locked -> Unlocked -> TimingOut -> Locked`, with
//! `TimingOut -> Unlocked` via [`SessionController::extend_session`].
//! `TimingOut` is a warning state: the key is still held, it exists so
//! the UI can prompt the user before the hard lock.
//!
//! The controller is poll-driven: the host schedules periodic calls to
//! [`SessionController::poll`], which computes elapsed idle time and
//! performs any due transition.  There is no background thread.

use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::{DateTime, Duration, Utc};

use crate::errors::{CredVaultError, Result};
use crate::store::RecordStore;
use crate::vault::Vault;

use super::clock::{Clock, SystemClock};

/// Minimum accepted idle timeout in minutes.
pub const MIN_TIMEOUT_MINUTES: u32 = 5;

/// Maximum accepted idle timeout in minutes.
pub const MAX_TIMEOUT_MINUTES: u32 = 120;

/// Activity signals arriving closer together than this are ignored,
/// so a stream of pointer events does not reset the timer on every
/// single one.
const ACTIVITY_THROTTLE_MS: i64 = 1_000;

/// Lock state of the session, broadcast to observers on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// No key held; vault operations requiring a key fail.
    Locked,
    /// Key held, inactivity timer running.
    Unlocked,
    /// Idle long enough that the hard lock is imminent.  Key still
    /// held; the UI should prompt the user to extend.
    TimingOut,
}

/// Idle-timeout configuration.
///
/// Out-of-range values are rejected by [`SessionSettings::validate`],
/// never silently clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Minutes of inactivity until the hard lock (default 30).
    pub timeout_minutes: u32,
    /// Minutes before the hard lock at which `TimingOut` begins
    /// (default 5).
    pub warning_minutes: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            timeout_minutes: 30,
            warning_minutes: 5,
        }
    }
}

impl SessionSettings {
    pub fn validate(&self) -> Result<()> {
        if self.timeout_minutes < MIN_TIMEOUT_MINUTES || self.timeout_minutes > MAX_TIMEOUT_MINUTES
        {
            return Err(CredVaultError::InvalidSessionConfig(format!(
                "timeout_minutes must be between {MIN_TIMEOUT_MINUTES} and {MAX_TIMEOUT_MINUTES} (got {})",
                self.timeout_minutes
            )));
        }
        if self.warning_minutes == 0 {
            return Err(CredVaultError::InvalidSessionConfig(
                "warning_minutes must be at least 1".into(),
            ));
        }
        if self.warning_minutes >= self.timeout_minutes {
            return Err(CredVaultError::InvalidSessionConfig(format!(
                "warning_minutes ({}) must be less than timeout_minutes ({})",
                self.warning_minutes, self.timeout_minutes
            )));
        }
        Ok(())
    }
}

/// Handle returned by [`SessionController::subscribe`]; pass it to
/// [`SessionController::unsubscribe`] to deregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverHandle(u64);

type ObserverFn = Box<dyn FnMut(LockState)>;

/// The session controller.  Owns the vault and gates it behind the
/// idle-timeout state machine.
pub struct SessionController<S: RecordStore, C: Clock = SystemClock> {
    vault: Vault<S>,
    settings: SessionSettings,
    clock: C,
    state: LockState,
    last_activity: Option<DateTime<Utc>>,
    tracking: bool,
    observers: Vec<(u64, ObserverFn)>,
    next_observer: u64,
}

impl<S: RecordStore> SessionController<S, SystemClock> {
    /// Build a controller over `vault` using the system clock.
    pub fn new(vault: Vault<S>, settings: SessionSettings) -> Result<Self> {
        Self::with_clock(vault, settings, SystemClock)
    }
}

impl<S: RecordStore, C: Clock> SessionController<S, C> {
    /// Build a controller with an explicit time source.
    pub fn with_clock(vault: Vault<S>, settings: SessionSettings, clock: C) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            vault,
            settings,
            clock,
            state: LockState::Locked,
            last_activity: None,
            tracking: false,
            observers: Vec::new(),
            next_observer: 0,
        })
    }

    // ------------------------------------------------------------------
    // Vault access
    // ------------------------------------------------------------------

    pub fn vault(&self) -> &Vault<S> {
        &self.vault
    }

    pub fn vault_mut(&mut self) -> &mut Vault<S> {
        &mut self.vault
    }

    // ------------------------------------------------------------------
    // Lock lifecycle
    // ------------------------------------------------------------------

    /// Current lock state.  Call [`SessionController::poll`] first if
    /// elapsed time should be taken into account.
    pub fn state(&self) -> LockState {
        self.state
    }

    /// Set the initial passphrase and enter `Unlocked`.
    pub fn initialize_passphrase(&mut self, passphrase: &str) -> Result<()> {
        self.vault.initialize_passphrase(passphrase)?;
        self.enter_unlocked();
        Ok(())
    }

    /// Try to unlock the vault; on success enter `Unlocked` with a
    /// fresh activity timestamp.  A wrong passphrase returns
    /// `Ok(false)` and leaves the session locked.
    pub fn unlock(&mut self, passphrase: &str) -> Result<bool> {
        if self.vault.unlock(passphrase)? {
            self.enter_unlocked();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Lock the vault and enter `Locked`.  Idempotent.
    pub fn lock(&mut self) {
        self.vault.lock();
        self.last_activity = None;
        self.transition(LockState::Locked);
    }

    /// Advance the state machine against the clock.
    ///
    /// Performs `Unlocked -> TimingOut` once idle time passes
    /// `timeout - warning` minutes, and the hard transition to
    /// `Locked` (discarding the key) once it reaches `timeout`
    /// minutes.  Returns the state after any transition.
    pub fn poll(&mut self) -> LockState {
        if self.state == LockState::Locked {
            return self.state;
        }

        let last = match self.last_activity {
            Some(t) => t,
            None => {
                // Unlocked with no recorded activity should not happen;
                // treat it as activity now rather than locking early.
                self.last_activity = Some(self.clock.now());
                return self.state;
            }
        };

        let elapsed = self.clock.now() - last;
        let timeout = Duration::minutes(i64::from(self.settings.timeout_minutes));
        let warning = Duration::minutes(i64::from(self.settings.warning_minutes));

        if elapsed >= timeout {
            tracing::debug!("idle timeout reached, locking vault");
            self.lock();
        } else if elapsed >= timeout - warning && self.state == LockState::Unlocked {
            self.transition(LockState::TimingOut);
        }

        self.state
    }

    /// Reset the idle timer; from `TimingOut` this returns the session
    /// to `Unlocked`.  No-op while `Locked`.
    pub fn extend_session(&mut self) {
        if self.state == LockState::Locked {
            return;
        }
        self.last_activity = Some(self.clock.now());
        if self.state == LockState::TimingOut {
            self.transition(LockState::Unlocked);
        }
    }

    // ------------------------------------------------------------------
    // Activity tracking
    // ------------------------------------------------------------------

    /// Begin accepting activity signals.  Idempotent.
    pub fn start_tracking(&mut self) {
        self.tracking = true;
    }

    /// Stop accepting activity signals.  Safe to call twice.
    pub fn stop_tracking(&mut self) {
        self.tracking = false;
    }

    /// Record a user-interaction signal (pointer movement, key press).
    ///
    /// Only effective while tracking is started and the session is
    /// `Unlocked`; in `TimingOut` the user must explicitly extend.
    /// Signals are throttled to one timer reset per second.
    pub fn record_activity(&mut self) {
        if !self.tracking || self.state != LockState::Unlocked {
            return;
        }
        let now = self.clock.now();
        if let Some(last) = self.last_activity {
            if (now - last).num_milliseconds() < ACTIVITY_THROTTLE_MS {
                return;
            }
        }
        self.last_activity = Some(now);
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// Replace the idle-timeout configuration.  Out-of-range values
    /// are rejected with a validation error; the running timer keeps
    /// its activity timestamp and the new limits apply on next poll.
    pub fn update_settings(&mut self, settings: SessionSettings) -> Result<()> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Register an observer invoked synchronously on every state
    /// transition with the new state.
    pub fn subscribe(&mut self, callback: impl FnMut(LockState) + 'static) -> ObserverHandle {
        let handle = ObserverHandle(self.next_observer);
        self.next_observer += 1;
        self.observers.push((handle.0, Box::new(callback)));
        handle
    }

    /// Deregister an observer.  Unknown handles are ignored.
    pub fn unsubscribe(&mut self, handle: ObserverHandle) {
        self.observers.retain(|(id, _)| *id != handle.0);
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn enter_unlocked(&mut self) {
        self.last_activity = Some(self.clock.now());
        self.transition(LockState::Unlocked);
    }

    fn transition(&mut self, next: LockState) {
        if self.state == next {
            return;
        }
        tracing::debug!(from = ?self.state, to = ?next, "lock state transition");
        self.state = next;
        self.notify(next);
    }

    /// Invoke every observer with the new state.  Each call is wrapped
    /// in `catch_unwind` so one panicking observer cannot stop the
    /// others from being notified or crash the controller.
    fn notify(&mut self, state: LockState) {
        for (id, callback) in self.observers.iter_mut() {
            let result = catch_unwind(AssertUnwindSafe(|| callback(state)));
            if result.is_err() {
                tracing::warn!(observer = *id, "lock state observer panicked");
            }
        }
    }
}
