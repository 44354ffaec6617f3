//! Rooms and room sets.
//!
//! A sphere (the whole building) holds at most [`MAX_ROOMS`] rooms. Sets of
//! rooms are kept as a bitmask, one bit per room, wrapped in [`RoomMask`] so
//! they cannot be confused with other bit-flag fields.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Upper bound on the number of rooms in a sphere.
pub const MAX_ROOMS: u8 = 64;

/// A room (location) of the sphere, `0..MAX_ROOMS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct RoomId(u8);

impl RoomId {
    /// # Errors
    ///
    /// Returns [`ValidationError::RoomOutOfRange`] when `index >= MAX_ROOMS`.
    pub fn new(index: u8) -> Result<Self, ValidationError> {
        if index >= MAX_ROOMS {
            return Err(ValidationError::RoomOutOfRange { room: index });
        }
        Ok(Self(index))
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    const fn bit(self) -> u64 {
        1 << self.0
    }
}

impl TryFrom<u8> for RoomId {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoomId> for u8 {
    fn from(value: RoomId) -> Self {
        value.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room#{}", self.0)
    }
}

/// A set of rooms, one bit per [`RoomId`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomMask(u64);

impl RoomMask {
    pub const EMPTY: Self = Self(0);

    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn single(room: RoomId) -> Self {
        Self(room.bit())
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of rooms in the set.
    #[must_use]
    pub const fn popcount(self) -> u32 {
        self.0.count_ones()
    }

    #[must_use]
    pub const fn contains(self, room: RoomId) -> bool {
        self.0 & room.bit() != 0
    }

    pub fn insert(&mut self, room: RoomId) {
        self.0 |= room.bit();
    }

    pub fn remove(&mut self, room: RoomId) {
        self.0 &= !room.bit();
    }

    /// Whether at least one room is in both sets.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Iterate over the rooms in ascending order.
    pub fn rooms(self) -> impl Iterator<Item = RoomId> {
        (0..MAX_ROOMS)
            .map(RoomId)
            .filter(move |room| self.contains(*room))
    }
}

impl FromIterator<RoomId> for RoomMask {
    fn from_iter<T: IntoIterator<Item = RoomId>>(iter: T) -> Self {
        let mut mask = Self::EMPTY;
        for room in iter {
            mask.insert(room);
        }
        mask
    }
}

impl fmt::Display for RoomMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
