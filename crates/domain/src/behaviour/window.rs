//! Time window: a `[from, until)` span on the 24 hour wheel.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::time::{SECONDS_PER_DAY, TimeOfDay};

/// A half-open `[from, until)` span of the day.
///
/// `until < from` wraps past midnight. `from == until` is only valid as the
/// "always" window, written `00:00 - 00:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeWindow")]
pub struct TimeWindow {
    from: TimeOfDay,
    until: TimeOfDay,
}

#[derive(Deserialize)]
struct RawTimeWindow {
    from: TimeOfDay,
    until: TimeOfDay,
}

impl TryFrom<RawTimeWindow> for TimeWindow {
    type Error = ValidationError;

    fn try_from(raw: RawTimeWindow) -> Result<Self, Self::Error> {
        Self::new(raw.from, raw.until)
    }
}

impl TimeWindow {
    /// # Errors
    ///
    /// Returns [`ValidationError::ZeroLengthWindow`] when `from == until`
    /// and the pair is not the `00:00 - 00:00` "always" marker.
    pub fn new(from: TimeOfDay, until: TimeOfDay) -> Result<Self, ValidationError> {
        if from == until && from != TimeOfDay::MIDNIGHT {
            return Err(ValidationError::ZeroLengthWindow);
        }
        Ok(Self { from, until })
    }

    /// The full-day window.
    #[must_use]
    pub const fn always() -> Self {
        Self {
            from: TimeOfDay::MIDNIGHT,
            until: TimeOfDay::MIDNIGHT,
        }
    }

    #[must_use]
    pub fn is_always(&self) -> bool {
        self.from == self.until
    }

    #[must_use]
    pub const fn from(&self) -> TimeOfDay {
        self.from
    }

    #[must_use]
    pub const fn until(&self) -> TimeOfDay {
        self.until
    }

    #[must_use]
    pub fn wraps_midnight(&self) -> bool {
        self.until < self.from
    }

    #[must_use]
    pub fn contains(&self, now: TimeOfDay) -> bool {
        if self.is_always() {
            true
        } else if self.from < self.until {
            self.from <= now && now < self.until
        } else {
            self.from <= now || now < self.until
        }
    }

    /// Length of the window in seconds; a full day for [`Self::always`].
    #[must_use]
    pub fn duration_seconds(&self) -> u32 {
        if self.is_always() {
            SECONDS_PER_DAY
        } else {
            self.from.seconds_until(self.until)
        }
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::always()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.from, self.until)
    }
}
