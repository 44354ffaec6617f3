//! In-memory behaviour storage.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use smartswitch_app::ports::BehaviourStorage;
use smartswitch_domain::behaviour::SwitchBehaviour;
use smartswitch_domain::id::SlotId;

/// Slot-keyed behaviours held in memory.
///
/// Nothing is validated here: the store in front of it does that. Writes can
/// be made to fail, to exercise how the core reports storage trouble.
#[derive(Debug, Default)]
pub struct InMemoryBehaviourStorage {
    slots: Mutex<BTreeMap<SlotId, SwitchBehaviour>>,
    fail_writes: AtomicBool,
}

impl InMemoryBehaviourStorage {
    /// Storage pre-filled with `entries`.
    #[must_use]
    pub fn with_entries(entries: impl IntoIterator<Item = (SlotId, SwitchBehaviour)>) -> Self {
        Self {
            slots: Mutex::new(entries.into_iter().collect()),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every following write report failure (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Write `behaviour` directly, as another writer in the firmware would.
    pub fn put(&self, slot: SlotId, behaviour: SwitchBehaviour) {
        self.lock_slots().insert(slot, behaviour);
    }

    /// Remove `slot` directly, as another writer in the firmware would.
    pub fn remove(&self, slot: SlotId) {
        self.lock_slots().remove(&slot);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_slots().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_slots().is_empty()
    }

    fn lock_slots(&self) -> MutexGuard<'_, BTreeMap<SlotId, SwitchBehaviour>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn writes_fail(&self) -> bool {
        self.fail_writes.load(Ordering::Relaxed)
    }
}

impl BehaviourStorage for InMemoryBehaviourStorage {
    fn load_all(&self) -> Vec<(SlotId, SwitchBehaviour)> {
        self.lock_slots()
            .iter()
            .map(|(slot, behaviour)| (*slot, *behaviour))
            .collect()
    }

    fn load(&self, slot: SlotId) -> Option<SwitchBehaviour> {
        self.lock_slots().get(&slot).copied()
    }

    fn replace(&self, slot: SlotId, behaviour: &SwitchBehaviour) -> bool {
        if self.writes_fail() {
            return false;
        }
        self.put(slot, *behaviour);
        true
    }

    fn clear(&self, slot: SlotId) -> bool {
        if self.writes_fail() {
            return false;
        }
        self.remove(slot);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn behaviour(intensity: u8) -> SwitchBehaviour {
        SwitchBehaviour::builder().intensity(intensity).build().unwrap()
    }

    #[test]
    fn should_load_what_was_replaced() {
        let storage = InMemoryBehaviourStorage::default();
        assert!(storage.replace(SlotId::new(3), &behaviour(40)));
        assert_eq!(storage.load(SlotId::new(3)), Some(behaviour(40)));
        assert_eq!(storage.load(SlotId::new(4)), None);
    }

    #[test]
    fn should_load_all_in_slot_order() {
        let storage = InMemoryBehaviourStorage::with_entries([
            (SlotId::new(7), behaviour(70)),
            (SlotId::new(2), behaviour(20)),
        ]);
        let slots: Vec<u8> = storage
            .load_all()
            .into_iter()
            .map(|(slot, _)| slot.get())
            .collect();
        assert_eq!(slots, vec![2, 7]);
    }

    #[test]
    fn should_clear_slot() {
        let storage = InMemoryBehaviourStorage::with_entries([(SlotId::new(1), behaviour(10))]);
        assert!(storage.clear(SlotId::new(1)));
        assert!(storage.is_empty());
    }

    #[test]
    fn should_report_failure_when_writes_fail() {
        let storage = InMemoryBehaviourStorage::default();
        storage.set_fail_writes(true);
        assert!(!storage.replace(SlotId::new(0), &behaviour(10)));
        assert!(!storage.clear(SlotId::new(0)));
        assert_eq!(storage.len(), 0);

        storage.set_fail_writes(false);
        assert!(storage.replace(SlotId::new(0), &behaviour(10)));
        assert_eq!(storage.len(), 1);
    }
}
