//! In-process event bus backed by a tokio broadcast channel.

use tokio::sync::broadcast;

use smartswitch_domain::event::SwitchEvent;

use crate::ports::EventPublisher;

/// In-process event bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped). Sending never blocks, so the bus can be
/// used from the synchronous switch core.
pub struct InProcessEventBus {
    sender: broadcast::Sender<SwitchEvent>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events on this bus.
    ///
    /// Returns a receiver that will get all events published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SwitchEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: SwitchEvent) {
        // broadcast::send fails only when there are zero receivers
        let _ = self.sender.send(event);
    }
}
