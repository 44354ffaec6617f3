//! Event bus port: publish core events to the rest of the firmware.

use smartswitch_domain::event::SwitchEvent;

/// Publishes switch events to interested subscribers.
///
/// Delivery is fire-and-forget: the core does not react to delivery
/// failures.
pub trait EventPublisher {
    fn publish(&self, event: SwitchEvent);
}

impl<T: EventPublisher + ?Sized> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: SwitchEvent) {
        (**self).publish(event);
    }
}
