//! Switch history: what was applied, when, and why.

use serde::{Deserialize, Serialize};

use crate::behaviour::Intensity;
use crate::id::SlotId;
use crate::overrides::OverrideSource;
use crate::time::Timestamp;

/// Why the aggregator settled on an intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SwitchCause {
    /// The behaviour in `slot` won resolution.
    Behaviour { slot: SlotId },
    /// An active override decided.
    Override { source: OverrideSource },
    /// Nothing had an opinion; the previous intensity was kept.
    Held,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchHistoryItem {
    pub at: Timestamp,
    pub intensity: Intensity,
    pub cause: SwitchCause,
}

impl SwitchHistoryItem {
    /// Same intensity for the same reason, regardless of time.
    #[must_use]
    pub fn repeats(&self, other: &Self) -> bool {
        self.intensity == other.intensity && self.cause == other.cause
    }
}
