//! Clocks: the wall clock and a hand-driven one.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Duration, Local};

use smartswitch_app::ports::Clock;
use smartswitch_domain::time::{self, TimeOfDay, Timestamp};

/// Wall clock: local time of day for behaviour windows, UTC for the rest.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimeOfDay {
        TimeOfDay::of(&Local::now())
    }

    fn now_timestamp(&self) -> Timestamp {
        time::now()
    }
}

/// A clock that only moves when told to. The time of day is read from the
/// UTC timestamp.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: Timestamp) {
        *self.lock_now() = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.lock_now();
        *now += by;
    }

    fn lock_now(&self) -> MutexGuard<'_, Timestamp> {
        self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimeOfDay {
        TimeOfDay::of(&*self.lock_now())
    }

    fn now_timestamp(&self) -> Timestamp {
        *self.lock_now()
    }
}
