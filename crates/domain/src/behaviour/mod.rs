//! Behaviour: a scheduled rule mapping a time window and a presence
//! condition to a target intensity.
//!
//! Behaviours live in a fixed-capacity, slot-indexed [`BehaviourStore`].
//! Many behaviours may be valid at once; picking the one that governs the
//! switch is the job of the resolver in the application layer.

mod fingerprint;
mod intensity;
mod resolution;
mod store;
mod window;

pub use fingerprint::Fletcher32;
pub use intensity::Intensity;
pub use resolution::Resolution;
pub use store::{BehaviourStore, DEFAULT_CAPACITY};
pub use window::TimeWindow;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SmartSwitchError, ValidationError};
use crate::presence::PresenceCondition;
use crate::time::TimeOfDay;

/// A scheduled switch rule.
///
/// The slot it occupies is the key in the [`BehaviourStore`], which hands
/// out `(SlotId, &SwitchBehaviour)` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SwitchBehaviour {
    pub window: TimeWindow,
    pub intensity: Intensity,
    pub condition: PresenceCondition,
}

impl SwitchBehaviour {
    /// Create a builder for constructing a [`SwitchBehaviour`].
    #[must_use]
    pub fn builder() -> SwitchBehaviourBuilder {
        SwitchBehaviourBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// The window and intensity are valid by construction; the presence
    /// condition still needs a look since its room set is a plain mask.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyRoomSelection`] when a room-scoped
    /// condition names no room.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.condition.validate()
    }

    /// Whether the behaviour's window contains `now`.
    #[must_use]
    pub fn is_active_at(&self, now: TimeOfDay) -> bool {
        self.window.contains(now)
    }

    /// Fixed-layout encoding: from, until (LE u32), intensity, condition
    /// tag, room mask (LE u64).
    #[must_use]
    pub fn canonical_bytes(&self) -> [u8; 18] {
        let (tag, rooms) = match self.condition {
            PresenceCondition::VacuouslyTrue => (0u8, 0u64),
            PresenceCondition::AnyoneInSphere => (1, 0),
            PresenceCondition::NooneInSphere => (2, 0),
            PresenceCondition::AnyoneInSelectedRooms { rooms } => (3, rooms.bits()),
            PresenceCondition::NooneInSelectedRooms { rooms } => (4, rooms.bits()),
        };
        let mut out = [0u8; 18];
        out[0..4].copy_from_slice(&self.window.from().seconds().to_le_bytes());
        out[4..8].copy_from_slice(&self.window.until().seconds().to_le_bytes());
        out[8] = self.intensity.get();
        out[9] = tag;
        out[10..18].copy_from_slice(&rooms.to_le_bytes());
        out
    }
}

impl fmt::Display for SwitchBehaviour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} when {}", self.window, self.intensity, self.condition)
    }
}

/// Step-by-step builder for [`SwitchBehaviour`].
#[derive(Debug, Default)]
pub struct SwitchBehaviourBuilder {
    window: Option<(TimeOfDay, TimeOfDay)>,
    intensity: Option<u8>,
    condition: Option<PresenceCondition>,
}

impl SwitchBehaviourBuilder {
    #[must_use]
    pub fn window(mut self, from: TimeOfDay, until: TimeOfDay) -> Self {
        self.window = Some((from, until));
        self
    }

    #[must_use]
    pub fn intensity(mut self, intensity: u8) -> Self {
        self.intensity = Some(intensity);
        self
    }

    #[must_use]
    pub fn condition(mut self, condition: PresenceCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Consume the builder, validate, and return a [`SwitchBehaviour`].
    ///
    /// The window defaults to the full day and the condition to
    /// [`PresenceCondition::VacuouslyTrue`].
    ///
    /// # Errors
    ///
    /// Returns [`SmartSwitchError::InvalidBehaviour`] when the intensity is
    /// missing or out of range, the window has zero length, or the presence
    /// condition selects no room.
    pub fn build(self) -> Result<SwitchBehaviour, SmartSwitchError> {
        let window = match self.window {
            Some((from, until)) => TimeWindow::new(from, until)?,
            None => TimeWindow::always(),
        };
        let intensity = self
            .intensity
            .ok_or(ValidationError::MissingField { field: "intensity" })?;
        let behaviour = SwitchBehaviour {
            window,
            intensity: Intensity::new(intensity)?,
            condition: self.condition.unwrap_or(PresenceCondition::VacuouslyTrue),
        };
        behaviour.validate()?;
        Ok(behaviour)
    }
}
