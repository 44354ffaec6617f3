//! Presence registry: per-room occupancy with a debounced vacate.
//!
//! Any positive observation marks its room occupied at once. A room only
//! reads as vacated once the presence timeout has elapsed since the last
//! positive observation of every profile seen there, so a detector that
//! briefly loses track of someone does not make the switch flicker.

use std::collections::BTreeMap;

use chrono::Duration;
use tracing::{debug, trace};

use smartswitch_domain::id::ProfileId;
use smartswitch_domain::presence::PresenceSnapshot;
use smartswitch_domain::room::{RoomId, RoomMask};
use smartswitch_domain::time::Timestamp;

/// Grace period before a room reads as vacated, when none is configured.
pub const DEFAULT_PRESENCE_TIMEOUT_SECS: i64 = 5 * 60;

/// Tracks the last positive observation of each profile in each room.
#[derive(Debug, Clone)]
pub struct PresenceRegistry {
    timeout: Duration,
    last_positive: BTreeMap<RoomId, BTreeMap<ProfileId, Timestamp>>,
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_PRESENCE_TIMEOUT_SECS))
    }
}

impl PresenceRegistry {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_positive: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Observation from the room's default detector.
    pub fn observe(&mut self, room: RoomId, present: bool, at: Timestamp) {
        self.observe_profile(room, ProfileId::default(), present, at);
    }

    /// Observation from one profile in `room`.
    ///
    /// Negative observations never shorten the grace period, and an
    /// observation older than the recorded one does not move it back.
    pub fn observe_profile(
        &mut self,
        room: RoomId,
        profile: ProfileId,
        present: bool,
        at: Timestamp,
    ) {
        if !present {
            trace!(%room, %profile, "absence observed, waiting for grace period");
            return;
        }
        let was_occupied = self.is_occupied(room, at);
        let seen = self
            .last_positive
            .entry(room)
            .or_default()
            .entry(profile)
            .or_insert(at);
        if *seen < at {
            *seen = at;
        }
        if !was_occupied {
            debug!(%room, %profile, "room occupied");
        }
    }

    fn last_seen(&self, room: RoomId) -> Option<Timestamp> {
        self.last_positive
            .get(&room)
            .and_then(|profiles| profiles.values().max().copied())
    }

    fn within_grace(&self, seen: Timestamp, at: Timestamp) -> bool {
        at.signed_duration_since(seen) < self.timeout
    }

    /// Whether `room` reads as occupied at `at`.
    #[must_use]
    pub fn is_occupied(&self, room: RoomId, at: Timestamp) -> bool {
        self.last_seen(room)
            .is_some_and(|seen| self.within_grace(seen, at))
    }

    /// Occupancy of every room at `at`.
    #[must_use]
    pub fn snapshot(&self, at: Timestamp) -> PresenceSnapshot {
        let mut occupied = RoomMask::EMPTY;
        let mut last_seen = BTreeMap::new();
        for &room in self.last_positive.keys() {
            let Some(seen) = self.last_seen(room) else {
                continue;
            };
            if self.within_grace(seen, at) {
                occupied.insert(room);
            }
            last_seen.insert(room, seen);
        }
        PresenceSnapshot::new(occupied, last_seen)
    }

    /// Forget observations whose grace period is over. Returns how many
    /// profile entries were dropped.
    pub fn prune(&mut self, at: Timestamp) -> usize {
        let timeout = self.timeout;
        let mut dropped = 0;
        self.last_positive.retain(|_, profiles| {
            let before = profiles.len();
            profiles.retain(|_, seen| at.signed_duration_since(*seen) < timeout);
            dropped += before - profiles.len();
            !profiles.is_empty()
        });
        dropped
    }
}
