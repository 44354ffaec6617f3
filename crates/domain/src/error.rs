//! Common error types used across the workspace.
//!
//! Each failure has its own typed error and converts into
//! [`SmartSwitchError`] through `#[from]`. There are no `String` variants.
//!
//! A behaviour resolution that finds no candidate is **not** an error: it is
//! the regular `None` outcome of the resolver.

use crate::id::SlotId;
use crate::overrides::OverrideSource;

/// Top-level error for every fallible core operation.
#[derive(Debug, thiserror::Error)]
pub enum SmartSwitchError {
    /// A behaviour (or one of its parts) is structurally invalid.
    #[error("invalid behaviour definition")]
    InvalidBehaviour(#[from] ValidationError),

    /// A store operation addressed a slot beyond capacity.
    #[error(transparent)]
    SlotOutOfRange(#[from] SlotOutOfRangeError),

    /// An override was refused because a higher-priority one is active.
    #[error(transparent)]
    OverrideRejected(#[from] OverrideRejectedError),

    /// No free slot left in the behaviour store.
    #[error(transparent)]
    StoreFull(#[from] StoreFullError),
}

/// Structural validation failures, detected when a value is constructed or
/// written to the store, never at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// `from == until` on a window that is not the "always" window.
    #[error("time window has zero length")]
    ZeroLengthWindow,

    #[error("time of day out of range: {seconds}s")]
    TimeOfDayOutOfRange { seconds: u32 },

    #[error("unparsable time of day: {value:?}")]
    MalformedTimeOfDay { value: String },

    #[error("intensity out of range: {value}")]
    IntensityOutOfRange { value: u8 },

    #[error("room out of range: {room}")]
    RoomOutOfRange { room: u8 },

    /// A room-scoped presence condition names no room at all.
    #[error("presence condition selects no room")]
    EmptyRoomSelection,

    #[error("missing field: {field}")]
    MissingField { field: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("slot {slot} out of range (capacity {capacity})")]
pub struct SlotOutOfRangeError {
    pub slot: SlotId,
    pub capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("override from {requested} rejected while {active} override is active")]
pub struct OverrideRejectedError {
    pub requested: OverrideSource,
    pub active: OverrideSource,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("behaviour store is full (capacity {capacity})")]
pub struct StoreFullError {
    pub capacity: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_validation_error_into_invalid_behaviour() {
        let err: SmartSwitchError = ValidationError::ZeroLengthWindow.into();
        assert!(matches!(
            err,
            SmartSwitchError::InvalidBehaviour(ValidationError::ZeroLengthWindow)
        ));
    }

    #[test]
    fn should_describe_slot_out_of_range() {
        let err: SmartSwitchError = SlotOutOfRangeError {
            slot: SlotId::new(60),
            capacity: 50,
        }
        .into();
        assert_eq!(err.to_string(), "slot 60 out of range (capacity 50)");
    }

    #[test]
    fn should_describe_rejected_override() {
        let err = OverrideRejectedError {
            requested: OverrideSource::TapToToggle,
            active: OverrideSource::Manual,
        };
        assert_eq!(
            err.to_string(),
            "override from tap_to_toggle rejected while manual override is active"
        );
    }
}
