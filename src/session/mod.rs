//! Session lock controller: auto-expiry of the unlocked state.
//!
//! This module provides:
//! - The `Clock` abstraction and `SystemClock` (`clock`)
//! - The `SessionController` state machine, `LockState`,
//!   `SessionSettings`, and the observer subscription API
//!   (`controller`)

pub mod clock;
pub mod controller;

// Re-export the most commonly used items.
pub use clock::{Clock, SystemClock};
pub use controller::{
    LockState, ObserverHandle, SessionController, SessionSettings, MAX_TIMEOUT_MINUTES,
    MIN_TIMEOUT_MINUTES,
};
