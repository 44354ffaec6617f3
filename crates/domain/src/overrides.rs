//! Overrides: time-limited commands that supersede behaviour control.

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::behaviour::Intensity;
use crate::time::Timestamp;

/// Where an override comes from, in ascending priority order:
/// tap-to-toggle < switchcraft (tamper) < manual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideSource {
    /// An explicit user command (app, wall button, remote).
    Manual,
    /// Physical switch flicked on the mains side, detected by the device.
    Switchcraft,
    TapToToggle,
}

impl OverrideSource {
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Manual => 3,
            Self::Switchcraft => 2,
            Self::TapToToggle => 1,
        }
    }

    /// Whether an override from `self` may replace an active one from `active`.
    #[must_use]
    pub const fn can_supersede(self, active: Self) -> bool {
        self.priority() >= active.priority()
    }
}

impl fmt::Display for OverrideSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => f.write_str("manual"),
            Self::Switchcraft => f.write_str("switchcraft"),
            Self::TapToToggle => f.write_str("tap_to_toggle"),
        }
    }
}

/// What an override asks the switch to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideIntensity {
    /// Follow the behaviour intensity while it is non-zero, else fully on.
    /// Re-resolved on every evaluation.
    SmartOn,
    Fixed(Intensity),
}

impl OverrideIntensity {
    /// The intensity this override stands for, given the behaviour
    /// intensity currently resolved.
    #[must_use]
    pub fn resolve(self, behaviour: Option<Intensity>) -> Intensity {
        match self {
            Self::Fixed(intensity) => intensity,
            Self::SmartOn => behaviour
                .filter(|intensity| intensity.is_on())
                .unwrap_or(Intensity::FULLY_ON),
        }
    }

    #[must_use]
    pub fn is_on(self) -> bool {
        match self {
            Self::SmartOn => true,
            Self::Fixed(intensity) => intensity.is_on(),
        }
    }
}

impl From<Intensity> for OverrideIntensity {
    fn from(intensity: Intensity) -> Self {
        Self::Fixed(intensity)
    }
}

impl fmt::Display for OverrideIntensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SmartOn => f.write_str("smart_on"),
            Self::Fixed(intensity) => fmt::Display::fmt(intensity, f),
        }
    }
}

/// A request to override the switch, as received from a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverrideRequest {
    pub source: OverrideSource,
    pub target: OverrideIntensity,
    /// `None` keeps the override until superseded or cleared.
    pub ttl: Option<Duration>,
}

impl OverrideRequest {
    #[must_use]
    pub fn new(source: OverrideSource, target: impl Into<OverrideIntensity>) -> Self {
        Self {
            source,
            target: target.into(),
            ttl: None,
        }
    }

    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// The override this request establishes when accepted at `now`.
    #[must_use]
    pub fn activate(&self, now: Timestamp) -> OverrideState {
        OverrideState {
            source: self.source,
            target: self.target,
            expires_at: self.ttl.and_then(|ttl| now.checked_add_signed(ttl)),
        }
    }
}

/// The single active override held by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideState {
    pub source: OverrideSource,
    pub target: OverrideIntensity,
    pub expires_at: Option<Timestamp>,
}

impl OverrideState {
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}
