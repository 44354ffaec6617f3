//! Presence snapshot: occupancy of every room at one instant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::room::{RoomId, RoomMask};
use crate::time::Timestamp;

/// Occupancy bitmask plus the last time each room was seen occupied.
///
/// Built fresh for every evaluation and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceSnapshot {
    occupied: RoomMask,
    last_seen: BTreeMap<RoomId, Timestamp>,
}

impl PresenceSnapshot {
    #[must_use]
    pub fn new(occupied: RoomMask, last_seen: BTreeMap<RoomId, Timestamp>) -> Self {
        Self {
            occupied,
            last_seen,
        }
    }

    /// Snapshot of a sphere where nobody is present.
    #[must_use]
    pub fn vacant() -> Self {
        Self::default()
    }

    /// Snapshot carrying only an occupancy mask, without last-seen times.
    #[must_use]
    pub fn from_mask(occupied: RoomMask) -> Self {
        Self {
            occupied,
            last_seen: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn occupied(&self) -> RoomMask {
        self.occupied
    }

    /// Whether anyone is present anywhere in the sphere.
    #[must_use]
    pub fn is_anyone_present(&self) -> bool {
        !self.occupied.is_empty()
    }

    #[must_use]
    pub fn is_occupied(&self, room: RoomId) -> bool {
        self.occupied.contains(room)
    }

    /// Last positive observation in `room`, if it was ever seen occupied.
    #[must_use]
    pub fn last_seen(&self, room: RoomId) -> Option<Timestamp> {
        self.last_seen.get(&room).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_report_nobody_in_vacant_snapshot() {
        let snapshot = PresenceSnapshot::vacant();
        assert!(!snapshot.is_anyone_present());
        assert!(snapshot.occupied().is_empty());
    }

    #[test]
    fn should_expose_last_seen_per_room() {
        let room = RoomId::new(3).unwrap();
        let at: Timestamp = "2024-01-01T10:00:00Z".parse().unwrap();
        let snapshot =
            PresenceSnapshot::new(RoomMask::single(room), BTreeMap::from([(room, at)]));
        assert!(snapshot.is_occupied(room));
        assert_eq!(snapshot.last_seen(room), Some(at));
        assert_eq!(snapshot.last_seen(RoomId::new(4).unwrap()), None);
    }
}
