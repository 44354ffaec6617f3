//! Virtual switch: a simulated dimmer that records what it was told.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::info;

use smartswitch_app::ports::SwitchDriver;
use smartswitch_domain::behaviour::Intensity;

#[derive(Debug, Default)]
struct SwitchState {
    intensity: Intensity,
    applied: Vec<Intensity>,
}

/// A simulated relay/dimmer.
#[derive(Debug, Default)]
pub struct VirtualSwitch {
    state: Mutex<SwitchState>,
}

impl VirtualSwitch {
    /// Current output of the dimmer.
    #[must_use]
    pub fn intensity(&self) -> Intensity {
        self.lock_state().intensity
    }

    #[must_use]
    pub fn is_on(&self) -> bool {
        self.intensity().is_on()
    }

    /// Every intensity the driver received, oldest first.
    #[must_use]
    pub fn applied(&self) -> Vec<Intensity> {
        self.lock_state().applied.clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, SwitchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SwitchDriver for VirtualSwitch {
    fn apply(&self, intensity: Intensity) {
        let mut state = self.lock_state();
        info!(from = %state.intensity, to = %intensity, "virtual switch set");
        state.intensity = intensity;
        state.applied.push(intensity);
    }
}
