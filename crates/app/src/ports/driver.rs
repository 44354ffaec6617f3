//! Switch driver port: the hardware relay/dimmer.

use smartswitch_domain::behaviour::Intensity;

/// Receives the final target intensity.
///
/// Relay/dimmer safety arbitration (thermal, overcurrent, dimmer power-up)
/// happens behind this trait.
pub trait SwitchDriver {
    fn apply(&self, intensity: Intensity);
}

impl<T: SwitchDriver + ?Sized> SwitchDriver for std::sync::Arc<T> {
    fn apply(&self, intensity: Intensity) {
        (**self).apply(intensity);
    }
}
