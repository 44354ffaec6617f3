//! Behaviour resolver: picks the behaviour that governs the switch now.
//!
//! Resolution runs in a fixed order: keep behaviours whose time window
//! contains `now`, keep those whose presence condition holds on the
//! snapshot, then rank the survivors by presence specificity (descending),
//! window duration (ascending) and slot (ascending). The first one wins.
//!
//! Resolution is pure and cannot fail; "nothing governs the switch" is a
//! plain `None`.

use tracing::debug;

use smartswitch_domain::behaviour::{BehaviourStore, Intensity, Resolution};
use smartswitch_domain::presence::PresenceSnapshot;
use smartswitch_domain::room::MAX_ROOMS;
use smartswitch_domain::time::TimeOfDay;

/// Ranks the behaviours of a store against a presence snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BehaviourResolver {
    total_rooms: u8,
}

impl Default for BehaviourResolver {
    fn default() -> Self {
        Self::new(MAX_ROOMS)
    }
}

impl BehaviourResolver {
    /// `total_rooms` is the size of the sphere, used to rank room-scoped
    /// conditions.
    #[must_use]
    pub fn new(total_rooms: u8) -> Self {
        Self { total_rooms }
    }

    #[must_use]
    pub fn total_rooms(&self) -> u8 {
        self.total_rooms
    }

    /// Intensity of the winning behaviour, if any.
    #[must_use]
    pub fn resolve(
        &self,
        now: TimeOfDay,
        snapshot: &PresenceSnapshot,
        store: &BehaviourStore,
    ) -> Option<Intensity> {
        self.resolve_winner(now, snapshot, store)
            .map(|winner| winner.intensity)
    }

    /// The winning behaviour with its ranking data.
    #[must_use]
    pub fn resolve_winner(
        &self,
        now: TimeOfDay,
        snapshot: &PresenceSnapshot,
        store: &BehaviourStore,
    ) -> Option<Resolution> {
        let winner = self
            .valid(now, snapshot, store)
            .min_by_key(Resolution::rank_key);
        if let Some(winner) = &winner {
            debug!(
                slot = %winner.slot,
                intensity = %winner.intensity,
                specificity = winner.specificity.rank(),
                window_seconds = winner.window_seconds,
                "behaviour resolved"
            );
        }
        winner
    }

    /// Every valid behaviour, best first.
    #[must_use]
    pub fn candidates(
        &self,
        now: TimeOfDay,
        snapshot: &PresenceSnapshot,
        store: &BehaviourStore,
    ) -> Vec<Resolution> {
        let mut candidates: Vec<_> = self.valid(now, snapshot, store).collect();
        candidates.sort_by_key(Resolution::rank_key);
        candidates
    }

    fn valid<'a>(
        &self,
        now: TimeOfDay,
        snapshot: &'a PresenceSnapshot,
        store: &'a BehaviourStore,
    ) -> impl Iterator<Item = Resolution> + 'a {
        let total_rooms = self.total_rooms;
        store
            .iter()
            .filter(move |(_, behaviour)| behaviour.is_active_at(now))
            .filter(move |(_, behaviour)| behaviour.condition.holds(snapshot))
            .map(move |(slot, behaviour)| Resolution {
                slot,
                intensity: behaviour.intensity,
                specificity: behaviour.condition.specificity(total_rooms),
                window_seconds: behaviour.window.duration_seconds(),
            })
    }

    /// Whether a behaviour active at `now` can only hold while someone is
    /// present.
    #[must_use]
    pub fn requires_presence(&self, now: TimeOfDay, store: &BehaviourStore) -> bool {
        store
            .iter()
            .any(|(_, b)| b.is_active_at(now) && b.condition.requires_presence())
    }

    /// Whether a behaviour active at `now` can only hold while someone is
    /// absent.
    #[must_use]
    pub fn requires_absence(&self, now: TimeOfDay, store: &BehaviourStore) -> bool {
        store
            .iter()
            .any(|(_, b)| b.is_active_at(now) && b.condition.requires_absence())
    }
}
