//! Typed small-integer identifiers.
//!
//! Slots and profiles are plain indices on the wire and in storage; the
//! newtypes keep them from being mixed up with each other or with intensities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_index {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u8);

        impl $name {
            /// Wrap a raw index.
            #[must_use]
            pub const fn new(index: u8) -> Self {
                Self(index)
            }

            /// Access the raw index.
            #[must_use]
            pub const fn get(self) -> u8 {
                self.0
            }

            /// The raw index, usable for array addressing.
            #[must_use]
            pub const fn as_usize(self) -> usize {
                self.0 as usize
            }
        }

        impl From<u8> for $name {
            fn from(index: u8) -> Self {
                Self(index)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }
    };
}

define_index!(
    /// Index of a behaviour in the [`BehaviourStore`](crate::behaviour::BehaviourStore).
    SlotId
);

define_index!(
    /// An independent presence observer (user profile, detector) within a room.
    ProfileId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_order_slots_by_index() {
        assert!(SlotId::new(1) < SlotId::new(2));
    }

    #[test]
    fn should_roundtrip_through_display_and_from_str() {
        let slot = SlotId::new(17);
        let parsed: SlotId = slot.to_string().parse().unwrap();
        assert_eq!(parsed, slot);
    }

    #[test]
    fn should_serialize_as_plain_number() {
        let json = serde_json::to_string(&ProfileId::new(3)).unwrap();
        assert_eq!(json, "3");
    }

    #[test]
    fn should_return_error_when_parsing_non_number() {
        assert!(SlotId::from_str("seven").is_err());
    }
}
