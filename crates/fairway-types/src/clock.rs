//! Clock and UTC time utilities.
//!
//! Every instant the core compares is a `DateTime<Utc>`. Values arriving with
//! an offset are normalized once, here, and never re-derived by callers.

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use parking_lot::Mutex;

use crate::constants;

/// Source of "now". Injected so every time-dependent decision is testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Normalize an offset timestamp (e.g. a course-local tee time) to UTC.
#[must_use]
pub fn to_utc(instant: DateTime<FixedOffset>) -> DateTime<Utc> {
    instant.with_timezone(&Utc)
}

/// The registration buffer for a number of minutes.
#[must_use]
pub fn buffer_minutes(minutes: i64) -> TimeDelta {
    TimeDelta::minutes(minutes)
}

/// The default registration buffer.
#[must_use]
pub fn default_registration_buffer() -> TimeDelta {
    buffer_minutes(constants::REGISTRATION_BUFFER_MINUTES)
}
