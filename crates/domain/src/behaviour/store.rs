//! Behaviour store: fixed-capacity, slot-indexed behaviour collection.

use crate::error::{SlotOutOfRangeError, SmartSwitchError, StoreFullError};
use crate::id::SlotId;

use super::{Fletcher32, SwitchBehaviour};

/// Number of slots when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 50;

/// Slot addressing is `u8`, so no store holds more than this many slots.
const MAX_CAPACITY: usize = u8::MAX as usize + 1;

/// Slot-indexed behaviours.
///
/// Writes are validated before they land, so everything the resolver reads
/// is structurally sound. Iteration is in ascending slot order, which is the
/// final tie-breaker of conflict resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BehaviourStore {
    slots: Vec<Option<SwitchBehaviour>>,
}

impl Default for BehaviourStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl BehaviourStore {
    /// Create an empty store; `capacity` is capped at 256 slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.min(MAX_CAPACITY)],
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    fn check_slot(&self, slot: SlotId) -> Result<usize, SlotOutOfRangeError> {
        let index = slot.as_usize();
        if index >= self.slots.len() {
            return Err(SlotOutOfRangeError {
                slot,
                capacity: self.slots.len(),
            });
        }
        Ok(index)
    }

    /// Behaviour stored in `slot`, `None` when empty or out of range.
    #[must_use]
    pub fn get(&self, slot: SlotId) -> Option<&SwitchBehaviour> {
        self.slots.get(slot.as_usize()).and_then(Option::as_ref)
    }

    /// Put `behaviour` in `slot`, returning what was there before.
    ///
    /// # Errors
    ///
    /// Returns [`SmartSwitchError::SlotOutOfRange`] beyond capacity and
    /// [`SmartSwitchError::InvalidBehaviour`] when validation fails. The
    /// store is left untouched on error.
    pub fn replace(
        &mut self,
        slot: SlotId,
        behaviour: SwitchBehaviour,
    ) -> Result<Option<SwitchBehaviour>, SmartSwitchError> {
        let index = self.check_slot(slot)?;
        behaviour.validate()?;
        Ok(self.slots[index].replace(behaviour))
    }

    /// Empty `slot`, returning what was there. Clearing an empty slot is fine.
    ///
    /// # Errors
    ///
    /// Returns [`SmartSwitchError::SlotOutOfRange`] beyond capacity.
    pub fn clear(&mut self, slot: SlotId) -> Result<Option<SwitchBehaviour>, SmartSwitchError> {
        let index = self.check_slot(slot)?;
        Ok(self.slots[index].take())
    }

    /// Store `behaviour` in the first free slot.
    ///
    /// When an identical behaviour is already stored its slot is returned
    /// and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`SmartSwitchError::InvalidBehaviour`] when validation fails
    /// and [`SmartSwitchError::StoreFull`] when no slot is free.
    pub fn add(&mut self, behaviour: SwitchBehaviour) -> Result<SlotId, SmartSwitchError> {
        behaviour.validate()?;
        if let Some((slot, _)) = self.iter().find(|(_, stored)| **stored == behaviour) {
            return Ok(slot);
        }
        let slot = self
            .slot_ids()
            .find(|slot| self.slots[slot.as_usize()].is_none())
            .ok_or(StoreFullError {
                capacity: self.capacity(),
            })?;
        self.slots[slot.as_usize()] = Some(behaviour);
        Ok(slot)
    }

    fn slot_ids(&self) -> impl Iterator<Item = SlotId> + use<> {
        (0..self.slots.len()).filter_map(|index| u8::try_from(index).ok().map(SlotId::new))
    }

    /// Occupied slots with their behaviour, in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &SwitchBehaviour)> {
        self.slot_ids()
            .zip(&self.slots)
            .filter_map(|(slot, behaviour)| behaviour.as_ref().map(|b| (slot, b)))
    }

    /// Indices of the occupied slots.
    #[must_use]
    pub fn indices(&self) -> Vec<SlotId> {
        self.iter().map(|(slot, _)| slot).collect()
    }

    /// Fletcher-32 over every occupied `(slot, behaviour)` pair.
    ///
    /// Two stores with the same content in the same slots have the same
    /// fingerprint, whatever order the writes happened in.
    #[must_use]
    pub fn fingerprint(&self) -> u32 {
        let mut checksum = Fletcher32::new();
        for (slot, behaviour) in self.iter() {
            checksum.update(&[slot.get()]);
            checksum.update(&behaviour.canonical_bytes());
        }
        checksum.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviour::Intensity;
    use crate::error::ValidationError;
    use crate::presence::PresenceCondition;
    use crate::room::RoomMask;

    fn behaviour(intensity: u8) -> SwitchBehaviour {
        SwitchBehaviour::builder().intensity(intensity).build().unwrap()
    }

    #[test]
    fn should_start_empty_with_default_capacity() {
        let store = BehaviourStore::default();
        assert_eq!(store.capacity(), DEFAULT_CAPACITY);
        assert!(store.is_empty());
        assert_eq!(store.iter().count(), 0);
    }

    #[test]
    fn should_return_previous_behaviour_when_replacing_slot() {
        let mut store = BehaviourStore::new(4);
        assert_eq!(store.replace(SlotId::new(2), behaviour(10)).unwrap(), None);
        let previous = store.replace(SlotId::new(2), behaviour(20)).unwrap();
        assert_eq!(previous, Some(behaviour(10)));
        assert_eq!(
            store.get(SlotId::new(2)).map(|b| b.intensity),
            Some(Intensity::new(20).unwrap())
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn should_return_slot_out_of_range_beyond_capacity() {
        let mut store = BehaviourStore::new(4);
        let result = store.replace(SlotId::new(4), behaviour(10));
        assert!(matches!(
            result,
            Err(SmartSwitchError::SlotOutOfRange(SlotOutOfRangeError { capacity: 4, .. }))
        ));
        assert!(matches!(
            store.clear(SlotId::new(9)),
            Err(SmartSwitchError::SlotOutOfRange(_))
        ));
    }

    #[test]
    fn should_reject_invalid_behaviour_without_touching_slot() {
        let mut store = BehaviourStore::new(4);
        store.replace(SlotId::new(0), behaviour(10)).unwrap();
        let invalid = SwitchBehaviour {
            condition: PresenceCondition::AnyoneInSelectedRooms {
                rooms: RoomMask::EMPTY,
            },
            ..behaviour(99)
        };
        let result = store.replace(SlotId::new(0), invalid);
        assert!(matches!(
            result,
            Err(SmartSwitchError::InvalidBehaviour(
                ValidationError::EmptyRoomSelection
            ))
        ));
        assert_eq!(store.get(SlotId::new(0)), Some(&behaviour(10)));
    }

    #[test]
    fn should_clear_slot_idempotently() {
        let mut store = BehaviourStore::new(4);
        store.replace(SlotId::new(1), behaviour(10)).unwrap();
        assert_eq!(store.clear(SlotId::new(1)).unwrap(), Some(behaviour(10)));
        assert_eq!(store.clear(SlotId::new(1)).unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn should_iterate_in_ascending_slot_order() {
        let mut store = BehaviourStore::new(8);
        store.replace(SlotId::new(5), behaviour(50)).unwrap();
        store.replace(SlotId::new(1), behaviour(10)).unwrap();
        store.replace(SlotId::new(3), behaviour(30)).unwrap();
        assert_eq!(
            store.indices(),
            vec![SlotId::new(1), SlotId::new(3), SlotId::new(5)]
        );
    }

    #[test]
    fn should_add_to_first_free_slot() {
        let mut store = BehaviourStore::new(3);
        store.replace(SlotId::new(0), behaviour(10)).unwrap();
        assert_eq!(store.add(behaviour(20)).unwrap(), SlotId::new(1));
    }

    #[test]
    fn should_return_existing_slot_when_adding_duplicate() {
        let mut store = BehaviourStore::new(3);
        store.replace(SlotId::new(2), behaviour(10)).unwrap();
        assert_eq!(store.add(behaviour(10)).unwrap(), SlotId::new(2));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn should_return_store_full_when_no_free_slot() {
        let mut store = BehaviourStore::new(1);
        store.add(behaviour(10)).unwrap();
        assert!(matches!(
            store.add(behaviour(20)),
            Err(SmartSwitchError::StoreFull(StoreFullError { capacity: 1 }))
        ));
    }

    #[test]
    fn should_cap_capacity_at_addressable_slots() {
        assert_eq!(BehaviourStore::new(1000).capacity(), 256);
    }

    #[test]
    fn should_fingerprint_content_and_slot() {
        let mut a = BehaviourStore::new(4);
        let mut b = BehaviourStore::new(4);
        a.replace(SlotId::new(0), behaviour(10)).unwrap();
        a.replace(SlotId::new(1), behaviour(20)).unwrap();
        b.replace(SlotId::new(1), behaviour(20)).unwrap();
        b.replace(SlotId::new(0), behaviour(10)).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());

        b.clear(SlotId::new(0)).unwrap();
        b.replace(SlotId::new(2), behaviour(10)).unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
