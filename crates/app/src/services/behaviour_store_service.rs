//! Behaviour store service: use-cases for managing stored behaviours.
//!
//! The in-memory [`BehaviourStore`] is the source of truth for resolution;
//! the storage port mirrors it. Writes are validated against the store
//! first, so nothing invalid ever reaches storage.

use tracing::{info, warn};

use smartswitch_domain::behaviour::{BehaviourStore, SwitchBehaviour};
use smartswitch_domain::error::SmartSwitchError;
use smartswitch_domain::id::SlotId;

use crate::ports::BehaviourStorage;

/// Result of a store write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    pub slot: SlotId,
    /// Whether the storage accepted the write. The in-memory store is
    /// updated either way.
    pub persisted: bool,
    /// Fingerprint of the whole store after the write.
    pub fingerprint: u32,
}

/// Application service for behaviour slot operations.
pub struct BehaviourStoreService<S> {
    storage: S,
    store: BehaviourStore,
}

impl<S: BehaviourStorage> BehaviourStoreService<S> {
    /// Create a service with an empty store of `capacity` slots.
    /// Call [`Self::load`] to fill it from storage.
    pub fn new(storage: S, capacity: usize) -> Self {
        Self {
            storage,
            store: BehaviourStore::new(capacity),
        }
    }

    /// Replace the in-memory store with what storage holds.
    ///
    /// Entries that fail validation or sit beyond capacity are skipped.
    /// Returns the number of behaviours loaded.
    pub fn load(&mut self) -> usize {
        let mut store = BehaviourStore::new(self.store.capacity());
        for (slot, behaviour) in self.storage.load_all() {
            if let Err(err) = store.replace(slot, behaviour) {
                warn!(%slot, error = %err, "skipping persisted behaviour");
            }
        }
        self.store = store;
        let loaded = self.store.len();
        info!(
            loaded,
            fingerprint = self.store.fingerprint(),
            "behaviour store loaded"
        );
        loaded
    }

    #[must_use]
    pub fn store(&self) -> &BehaviourStore {
        &self.store
    }

    #[must_use]
    pub fn get(&self, slot: SlotId) -> Option<&SwitchBehaviour> {
        self.store.get(slot)
    }

    /// Put `behaviour` in `slot` and persist it.
    ///
    /// # Errors
    ///
    /// Returns [`SmartSwitchError::SlotOutOfRange`] or
    /// [`SmartSwitchError::InvalidBehaviour`]; storage is not touched then.
    pub fn replace(
        &mut self,
        slot: SlotId,
        behaviour: SwitchBehaviour,
    ) -> Result<WriteOutcome, SmartSwitchError> {
        self.store.replace(slot, behaviour)?;
        let persisted = self.storage.replace(slot, &behaviour);
        Ok(self.outcome(slot, persisted, "behaviour stored"))
    }

    /// Empty `slot` and remove it from storage.
    ///
    /// # Errors
    ///
    /// Returns [`SmartSwitchError::SlotOutOfRange`] beyond capacity.
    pub fn clear(&mut self, slot: SlotId) -> Result<WriteOutcome, SmartSwitchError> {
        self.store.clear(slot)?;
        let persisted = self.storage.clear(slot);
        Ok(self.outcome(slot, persisted, "behaviour cleared"))
    }

    /// Store `behaviour` in the first free slot, or find the slot already
    /// holding an identical one.
    ///
    /// # Errors
    ///
    /// Returns [`SmartSwitchError::InvalidBehaviour`] or
    /// [`SmartSwitchError::StoreFull`].
    pub fn add(&mut self, behaviour: SwitchBehaviour) -> Result<WriteOutcome, SmartSwitchError> {
        let slot = self.store.add(behaviour)?;
        let persisted = self.storage.replace(slot, &behaviour);
        Ok(self.outcome(slot, persisted, "behaviour added"))
    }

    /// Re-read `slot` from storage after it changed behind our back.
    ///
    /// # Errors
    ///
    /// Returns [`SmartSwitchError::SlotOutOfRange`] beyond capacity and
    /// [`SmartSwitchError::InvalidBehaviour`] when the stored entry is
    /// invalid; the slot keeps its previous content then.
    pub fn reload(&mut self, slot: SlotId) -> Result<(), SmartSwitchError> {
        match self.storage.load(slot) {
            Some(behaviour) => {
                self.store.replace(slot, behaviour)?;
            }
            None => {
                self.store.clear(slot)?;
            }
        }
        info!(%slot, fingerprint = self.store.fingerprint(), "behaviour slot reloaded");
        Ok(())
    }

    fn outcome(&self, slot: SlotId, persisted: bool, message: &'static str) -> WriteOutcome {
        let fingerprint = self.store.fingerprint();
        if persisted {
            info!(%slot, fingerprint, "{message}");
        } else {
            warn!(%slot, fingerprint, "{message}, storage write failed");
        }
        WriteOutcome {
            slot,
            persisted,
            fingerprint,
        }
    }
}
