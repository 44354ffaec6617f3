//! Presence mutation: what changed between two consecutive snapshots.

use serde::{Deserialize, Serialize};

use crate::room::RoomMask;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceMutation {
    Unchanged,
    /// The sphere went from empty to occupied.
    FirstUserEnteredSphere,
    /// The sphere went from occupied to empty.
    LastUserExitedSphere,
    /// Rooms changed while the sphere stayed occupied.
    OccupancyChanged,
}

impl PresenceMutation {
    #[must_use]
    pub fn between(previous: RoomMask, current: RoomMask) -> Self {
        match (previous.is_empty(), current.is_empty()) {
            _ if previous == current => Self::Unchanged,
            (true, false) => Self::FirstUserEnteredSphere,
            (false, true) => Self::LastUserExitedSphere,
            _ => Self::OccupancyChanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_detect_first_entry_and_last_exit() {
        let one = RoomMask::from_bits(0b1);
        assert_eq!(
            PresenceMutation::between(RoomMask::EMPTY, one),
            PresenceMutation::FirstUserEnteredSphere
        );
        assert_eq!(
            PresenceMutation::between(one, RoomMask::EMPTY),
            PresenceMutation::LastUserExitedSphere
        );
    }

    #[test]
    fn should_report_occupancy_change_between_rooms() {
        assert_eq!(
            PresenceMutation::between(RoomMask::from_bits(0b01), RoomMask::from_bits(0b10)),
            PresenceMutation::OccupancyChanged
        );
        assert_eq!(
            PresenceMutation::between(RoomMask::from_bits(0b10), RoomMask::from_bits(0b10)),
            PresenceMutation::Unchanged
        );
    }
}
