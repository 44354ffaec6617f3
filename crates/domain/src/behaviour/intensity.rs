//! Intensity: the target switch output.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Switch output from 0 (off) to 100 (fully on).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Intensity(u8);

impl Intensity {
    pub const OFF: Self = Self(0);
    pub const FULLY_ON: Self = Self(100);

    /// # Errors
    ///
    /// Returns [`ValidationError::IntensityOutOfRange`] above 100.
    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if value > Self::FULLY_ON.0 {
            return Err(ValidationError::IntensityOutOfRange { value });
        }
        Ok(Self(value))
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn is_on(self) -> bool {
        self.0 != 0
    }
}

impl TryFrom<u8> for Intensity {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Intensity> for u8 {
    fn from(value: Intensity) -> Self {
        value.0
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_accept_bounds() {
        assert_eq!(Intensity::new(0).unwrap(), Intensity::OFF);
        assert_eq!(Intensity::new(100).unwrap(), Intensity::FULLY_ON);
    }

    #[test]
    fn should_reject_above_hundred() {
        assert_eq!(
            Intensity::new(101),
            Err(ValidationError::IntensityOutOfRange { value: 101 })
        );
    }

    #[test]
    fn should_report_on_for_any_non_zero_value() {
        assert!(Intensity::new(1).unwrap().is_on());
        assert!(!Intensity::OFF.is_on());
    }

    #[test]
    fn should_reject_out_of_range_value_when_deserializing() {
        assert!(serde_json::from_str::<Intensity>("150").is_err());
    }
}
