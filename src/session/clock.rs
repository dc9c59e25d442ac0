//! Time source abstraction for the session controller.
//!
//! Idle-timeout transitions are computed against a `Clock` rather than
//! `Utc::now()` directly, so tests drive the state machine with a
//! manual clock instead of sleeping.

use chrono::{DateTime, Utc};

/// A wall-clock time source.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
