//! Event: an immutable record of something the core decided.
//!
//! Events are emitted towards the rest of the firmware: the switch driver
//! listens for resolved intensities, the command layer for rejections.

use serde::{Deserialize, Serialize};

use crate::behaviour::Intensity;
use crate::history::SwitchCause;
use crate::id::SlotId;
use crate::overrides::OverrideSource;
use crate::presence::PresenceMutation;
use crate::room::RoomMask;
use crate::time::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SwitchEvent {
    /// A new target intensity was handed to the switch driver.
    IntensityResolved {
        intensity: Intensity,
        cause: SwitchCause,
        at: Timestamp,
    },
    OverrideRejected {
        requested: OverrideSource,
        active: OverrideSource,
        at: Timestamp,
    },
    /// A slot was written or cleared; `fingerprint` covers the whole store.
    BehaviourStoreMutated { slot: SlotId, fingerprint: u32 },
    PresenceMutated {
        mutation: PresenceMutation,
        occupied: RoomMask,
        at: Timestamp,
    },
}
