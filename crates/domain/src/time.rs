//! Time and timestamp helpers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// UTC timestamp used for observations, override expiry and history.
pub type Timestamp = DateTime<Utc>;

/// Seconds on the 24 hour wheel.
pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// A time of day, in seconds since midnight, on a 24 hour wheel.
///
/// Serialized as `HH:MM:SS`; `HH:MM` is accepted on input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u32);

impl TimeOfDay {
    pub const MIDNIGHT: Self = Self(0);

    /// # Errors
    ///
    /// Returns [`ValidationError::TimeOfDayOutOfRange`] when `seconds` is a
    /// full day or more.
    pub fn new(seconds: u32) -> Result<Self, ValidationError> {
        if seconds >= SECONDS_PER_DAY {
            return Err(ValidationError::TimeOfDayOutOfRange { seconds });
        }
        Ok(Self(seconds))
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::TimeOfDayOutOfRange`] when the components
    /// do not denote a time within a single day.
    pub fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Result<Self, ValidationError> {
        let total = hours
            .saturating_mul(3600)
            .saturating_add(minutes.saturating_mul(60))
            .saturating_add(seconds);
        if minutes >= 60 || seconds >= 60 {
            return Err(ValidationError::TimeOfDayOutOfRange { seconds: total });
        }
        Self::new(total)
    }

    /// Time of day of any `chrono` time value (naive, local or UTC).
    #[must_use]
    pub fn of(time: &impl Timelike) -> Self {
        Self(time.num_seconds_from_midnight() % SECONDS_PER_DAY)
    }

    #[must_use]
    pub const fn seconds(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn hours(self) -> u32 {
        self.0 / 3600
    }

    #[must_use]
    pub const fn minutes(self) -> u32 {
        self.0 / 60 % 60
    }

    /// Seconds to travel forward on the wheel from `self` to `later`.
    #[must_use]
    pub const fn seconds_until(self, later: Self) -> u32 {
        (later.0 + SECONDS_PER_DAY - self.0) % SECONDS_PER_DAY
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours(),
            self.minutes(),
            self.0 % 60
        )
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
            .map(|time| Self::of(&time))
            .map_err(|_| ValidationError::MalformedTimeOfDay {
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_current_utc_time() {
        let before = Utc::now();
        let ts = now();
        let after = Utc::now();
        assert!(ts >= before);
        assert!(ts <= after);
    }

    #[test]
    fn should_reject_full_day() {
        assert_eq!(
            TimeOfDay::new(SECONDS_PER_DAY),
            Err(ValidationError::TimeOfDayOutOfRange {
                seconds: SECONDS_PER_DAY
            })
        );
    }

    #[test]
    fn should_build_from_hours_minutes_seconds() {
        let t = TimeOfDay::from_hms(7, 30, 15).unwrap();
        assert_eq!(t.seconds(), 7 * 3600 + 30 * 60 + 15);
        assert_eq!(t.to_string(), "07:30:15");
    }

    #[test]
    fn should_reject_sixty_minutes() {
        assert!(TimeOfDay::from_hms(7, 60, 0).is_err());
    }

    #[test]
    fn should_parse_hours_and_minutes() {
        let t: TimeOfDay = "22:05".parse().unwrap();
        assert_eq!(t, TimeOfDay::from_hms(22, 5, 0).unwrap());
    }

    #[test]
    fn should_return_error_when_parsing_garbage() {
        assert!(matches!(
            "late".parse::<TimeOfDay>(),
            Err(ValidationError::MalformedTimeOfDay { .. })
        ));
    }

    #[test]
    fn should_measure_forward_distance_across_midnight() {
        let late = TimeOfDay::from_hms(23, 0, 0).unwrap();
        let early = TimeOfDay::from_hms(1, 0, 0).unwrap();
        assert_eq!(late.seconds_until(early), 2 * 3600);
        assert_eq!(early.seconds_until(late), 22 * 3600);
    }

    #[test]
    fn should_take_time_of_day_from_timestamp() {
        let ts: Timestamp = "2024-03-01T18:45:00Z".parse().unwrap();
        assert_eq!(TimeOfDay::of(&ts), TimeOfDay::from_hms(18, 45, 0).unwrap());
    }

    #[test]
    fn should_roundtrip_through_serde_json_as_string() {
        let t = TimeOfDay::from_hms(6, 0, 0).unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"06:00:00\"");
        let parsed: TimeOfDay = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, t);
    }
}
