//! Storage port: persistent behaviour definitions, keyed by slot.

use smartswitch_domain::behaviour::SwitchBehaviour;
use smartswitch_domain::id::SlotId;

/// Synchronous key-value persistence for behaviours.
///
/// Write failures are reported as `false`. Retrying is the storage's own
/// concern, never the core's.
pub trait BehaviourStorage {
    /// Every persisted behaviour, in any order.
    fn load_all(&self) -> Vec<(SlotId, SwitchBehaviour)>;

    fn load(&self, slot: SlotId) -> Option<SwitchBehaviour>;

    fn replace(&self, slot: SlotId, behaviour: &SwitchBehaviour) -> bool;

    fn clear(&self, slot: SlotId) -> bool;
}

impl<T: BehaviourStorage + ?Sized> BehaviourStorage for std::sync::Arc<T> {
    fn load_all(&self) -> Vec<(SlotId, SwitchBehaviour)> {
        (**self).load_all()
    }

    fn load(&self, slot: SlotId) -> Option<SwitchBehaviour> {
        (**self).load(slot)
    }

    fn replace(&self, slot: SlotId, behaviour: &SwitchBehaviour) -> bool {
        (**self).replace(slot, behaviour)
    }

    fn clear(&self, slot: SlotId) -> bool {
        (**self).clear(slot)
    }
}
