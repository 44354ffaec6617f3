//! Presence condition: a predicate over a [`PresenceSnapshot`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::room::RoomMask;

use super::PresenceSnapshot;

/// How narrowly a condition scopes presence. Higher is more specific.
///
/// Trivial conditions rank lowest, sphere-wide conditions above them, and
/// room-scoped conditions above both, a smaller room set ranking higher
/// regardless of polarity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Specificity(u16);

impl Specificity {
    pub const TRIVIAL: Self = Self(0);
    pub const SPHERE: Self = Self(1);

    #[must_use]
    pub const fn rank(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Specificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A predicate over the current occupancy of the sphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PresenceCondition {
    /// Holds regardless of presence.
    VacuouslyTrue,
    AnyoneInSphere,
    NooneInSphere,
    AnyoneInSelectedRooms { rooms: RoomMask },
    NooneInSelectedRooms { rooms: RoomMask },
}

impl PresenceCondition {
    /// Check structural invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyRoomSelection`] for a room-scoped
    /// condition that names no room.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::AnyoneInSelectedRooms { rooms } | Self::NooneInSelectedRooms { rooms }
                if rooms.is_empty() =>
            {
                Err(ValidationError::EmptyRoomSelection)
            }
            _ => Ok(()),
        }
    }

    /// Evaluate the condition against a snapshot.
    #[must_use]
    pub fn holds(&self, snapshot: &PresenceSnapshot) -> bool {
        let occupied = snapshot.occupied();
        match self {
            Self::VacuouslyTrue => true,
            Self::AnyoneInSphere => !occupied.is_empty(),
            Self::NooneInSphere => occupied.is_empty(),
            Self::AnyoneInSelectedRooms { rooms } => occupied.intersects(*rooms),
            Self::NooneInSelectedRooms { rooms } => !occupied.intersects(*rooms),
        }
    }

    /// Rank of this condition in a sphere of `total_rooms` rooms.
    #[must_use]
    pub fn specificity(&self, total_rooms: u8) -> Specificity {
        match self {
            Self::VacuouslyTrue => Specificity::TRIVIAL,
            Self::AnyoneInSphere | Self::NooneInSphere => Specificity::SPHERE,
            Self::AnyoneInSelectedRooms { rooms } | Self::NooneInSelectedRooms { rooms } => {
                let named = u8::try_from(rooms.popcount()).unwrap_or(u8::MAX);
                Specificity(2 + u16::from(total_rooms.saturating_sub(named)))
            }
        }
    }

    /// Whether the condition can only hold while someone is present.
    #[must_use]
    pub const fn requires_presence(&self) -> bool {
        matches!(
            self,
            Self::AnyoneInSphere | Self::AnyoneInSelectedRooms { .. }
        )
    }

    /// Whether the condition can only hold while someone is absent.
    #[must_use]
    pub const fn requires_absence(&self) -> bool {
        matches!(self, Self::NooneInSphere | Self::NooneInSelectedRooms { .. })
    }
}

impl fmt::Display for PresenceCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VacuouslyTrue => f.write_str("always"),
            Self::AnyoneInSphere => f.write_str("anyone_in_sphere"),
            Self::NooneInSphere => f.write_str("noone_in_sphere"),
            Self::AnyoneInSelectedRooms { rooms } => write!(f, "anyone_in({rooms})"),
            Self::NooneInSelectedRooms { rooms } => write!(f, "noone_in({rooms})"),
        }
    }
}
