//! Resolution: a behaviour that is valid right now, with its ranking data.

use std::cmp::Reverse;

use crate::id::SlotId;
use crate::presence::Specificity;

use super::Intensity;

/// A time- and presence-valid behaviour, ready to be ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub slot: SlotId,
    pub intensity: Intensity,
    pub specificity: Specificity,
    pub window_seconds: u32,
}

impl Resolution {
    /// Ordering key: lowest key wins.
    ///
    /// Presence specificity first (descending), then window duration
    /// (ascending), then slot index (ascending).
    #[must_use]
    pub fn rank_key(&self) -> (Reverse<Specificity>, u32, SlotId) {
        (Reverse(self.specificity), self.window_seconds, self.slot)
    }
}
