//! Switch aggregator: merges the resolved behaviour with override sources
//! into the one intensity handed to the switch driver.
//!
//! The aggregator has two orthogonal axes of state: whether an override is
//! active, and whether a behaviour currently governs the switch. An active
//! override wins outright; otherwise the resolved behaviour does; with
//! neither, the previously applied intensity is held.

use std::collections::VecDeque;

use chrono::Duration;
use tracing::{debug, info, warn};

use smartswitch_domain::behaviour::{Intensity, Resolution};
use smartswitch_domain::error::{OverrideRejectedError, SmartSwitchError};
use smartswitch_domain::history::{SwitchCause, SwitchHistoryItem};
use smartswitch_domain::overrides::{
    OverrideIntensity, OverrideRequest, OverrideSource, OverrideState,
};
use smartswitch_domain::time::Timestamp;

/// Number of history entries kept when none is configured.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Two switchcraft toggles closer than this form a double tap.
pub const DEFAULT_DOUBLE_TAP_WINDOW_MS: i64 = 2000;

/// Dimmed value a double tap falls back to when no behaviour offers one.
pub const DEFAULT_DIM_PERCENT: u8 = 20;

/// How switchcraft toggles are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchcraftSettings {
    /// `None` disables double tap.
    pub double_tap_window: Option<Duration>,
    pub default_dim: Intensity,
}

impl Default for SwitchcraftSettings {
    fn default() -> Self {
        Self {
            double_tap_window: Some(Duration::milliseconds(DEFAULT_DOUBLE_TAP_WINDOW_MS)),
            default_dim: Intensity::new(DEFAULT_DIM_PERCENT).unwrap_or(Intensity::FULLY_ON),
        }
    }
}

/// Where the aggregator stands on its two axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorState {
    pub overridden: bool,
    pub behaviour_governed: bool,
}

#[derive(Debug, Clone)]
pub struct SwitchAggregator {
    applied: Intensity,
    cause: SwitchCause,
    active_override: Option<OverrideState>,
    behaviour_governed: bool,
    /// Behaviour intensity seen by the previous tick.
    behaviour: Option<Intensity>,
    release_override_on_behaviour_change: bool,
    switchcraft: SwitchcraftSettings,
    last_switchcraft_at: Option<Timestamp>,
    last_switchcraft_on: Intensity,
    history: VecDeque<SwitchHistoryItem>,
    history_capacity: usize,
}

impl Default for SwitchAggregator {
    fn default() -> Self {
        Self::new(Intensity::OFF, DEFAULT_HISTORY_CAPACITY)
    }
}

impl SwitchAggregator {
    /// `initial` is held until a behaviour or an override decides otherwise.
    #[must_use]
    pub fn new(initial: Intensity, history_capacity: usize) -> Self {
        Self {
            applied: initial,
            cause: SwitchCause::Held,
            active_override: None,
            behaviour_governed: false,
            behaviour: None,
            release_override_on_behaviour_change: false,
            switchcraft: SwitchcraftSettings::default(),
            last_switchcraft_at: None,
            last_switchcraft_on: Intensity::OFF,
            history: VecDeque::with_capacity(history_capacity),
            history_capacity,
        }
    }

    /// Drop an override once the behaviour intensity changes and asks for
    /// the opposite on/off state than the one the override holds.
    #[must_use]
    pub fn with_override_release(mut self, enabled: bool) -> Self {
        self.release_override_on_behaviour_change = enabled;
        self
    }

    #[must_use]
    pub fn with_switchcraft(mut self, settings: SwitchcraftSettings) -> Self {
        self.switchcraft = settings;
        self
    }

    /// Install an override.
    ///
    /// Accepted when no override is active, the active one has expired, or
    /// the new source's priority is at least the active one's.
    ///
    /// # Errors
    ///
    /// Returns [`SmartSwitchError::OverrideRejected`] when a higher-priority
    /// override is active. The active override is left untouched.
    pub fn request_override(
        &mut self,
        request: OverrideRequest,
        now: Timestamp,
    ) -> Result<(), SmartSwitchError> {
        if let Some(active) = self.active_override(now)
            && !request.source.can_supersede(active.source)
        {
            warn!(
                requested = %request.source,
                active = %active.source,
                "override rejected"
            );
            return Err(OverrideRejectedError {
                requested: request.source,
                active: active.source,
            }
            .into());
        }
        let state = request.activate(now);
        debug!(
            source = %state.source,
            target = %state.target,
            expires_at = ?state.expires_at,
            "override accepted"
        );
        self.active_override = Some(state);
        Ok(())
    }

    /// Drop the active override, handing control back to behaviours.
    /// Returns the override that was dropped.
    pub fn clear_override(&mut self) -> Option<OverrideState> {
        let cleared = self.active_override.take();
        if let Some(cleared) = &cleared {
            debug!(source = %cleared.source, "override cleared");
        }
        cleared
    }

    /// The override in force at `now`, ignoring an expired one.
    #[must_use]
    pub fn active_override(&self, now: Timestamp) -> Option<OverrideState> {
        self.active_override
            .filter(|state| !state.is_expired(now))
    }

    /// Settle on the intensity to apply at `now`.
    pub fn tick(&mut self, resolved: Option<&Resolution>, now: Timestamp) -> Intensity {
        if let Some(expired) = self.active_override.filter(|state| state.is_expired(now)) {
            debug!(source = %expired.source, "override expired");
            self.active_override = None;
        }
        let behaviour = resolved.map(|winner| winner.intensity);
        let behaviour_changed = behaviour != self.behaviour;
        self.behaviour = behaviour;
        self.behaviour_governed = resolved.is_some();

        if self.release_override_on_behaviour_change
            && behaviour_changed
            && let (Some(active), Some(behaviour)) = (self.active_override, behaviour)
            && active.target.is_on() == self.applied.is_on()
            && behaviour.is_on() != self.applied.is_on()
        {
            debug!(source = %active.source, %behaviour, "override released by behaviour");
            self.active_override = None;
        }

        let (intensity, cause) = match (self.active_override, resolved) {
            (Some(state), _) => (
                state.target.resolve(behaviour),
                SwitchCause::Override {
                    source: state.source,
                },
            ),
            (None, Some(winner)) => (
                winner.intensity,
                SwitchCause::Behaviour { slot: winner.slot },
            ),
            (None, None) => (self.applied, SwitchCause::Held),
        };

        if intensity != self.applied {
            info!(from = %self.applied, to = %intensity, ?cause, "switch intensity changed");
        }
        self.applied = intensity;
        self.cause = cause;
        self.record(SwitchHistoryItem {
            at: now,
            intensity,
            cause,
        });
        intensity
    }

    /// Target of a toggle command from `source` at `now`.
    ///
    /// Off when the switch is on, smart on otherwise. Switchcraft toggles
    /// also detect a double tap: turning on again right after turning off
    /// flips between fully on and a dimmed value, taken from `resolved`
    /// when it is dimmed, else the configured default.
    pub fn toggle_target(
        &mut self,
        source: OverrideSource,
        resolved: Option<Intensity>,
        now: Timestamp,
    ) -> OverrideIntensity {
        if source != OverrideSource::Switchcraft {
            return self.plain_toggle();
        }
        if self.applied.is_on() {
            self.last_switchcraft_on = self.applied;
        }
        let double_tap = self
            .switchcraft
            .double_tap_window
            .zip(self.last_switchcraft_at)
            .is_some_and(|(window, last)| now - last < window);
        self.last_switchcraft_at = Some(now);

        if self.applied.is_on() || !double_tap || !self.last_switchcraft_on.is_on() {
            return self.plain_toggle();
        }
        debug!(last_on = %self.last_switchcraft_on, "switchcraft double tap");
        if self.last_switchcraft_on != Intensity::FULLY_ON {
            return Intensity::FULLY_ON.into();
        }
        if resolved.is_some_and(|intensity| intensity.is_on() && intensity != Intensity::FULLY_ON) {
            OverrideIntensity::SmartOn
        } else {
            self.switchcraft.default_dim.into()
        }
    }

    fn plain_toggle(&self) -> OverrideIntensity {
        if self.applied.is_on() {
            Intensity::OFF.into()
        } else {
            OverrideIntensity::SmartOn
        }
    }

    #[must_use]
    pub fn state(&self, now: Timestamp) -> AggregatorState {
        AggregatorState {
            overridden: self.active_override(now).is_some(),
            behaviour_governed: self.behaviour_governed,
        }
    }

    /// The intensity settled on by the last tick.
    #[must_use]
    pub fn applied(&self) -> Intensity {
        self.applied
    }

    #[must_use]
    pub fn last_cause(&self) -> SwitchCause {
        self.cause
    }

    /// Recorded changes, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &SwitchHistoryItem> {
        self.history.iter()
    }

    fn record(&mut self, item: SwitchHistoryItem) {
        if self.history_capacity == 0
            || self.history.back().is_some_and(|last| last.repeats(&item))
        {
            return;
        }
        if self.history.len() == self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartswitch_domain::id::SlotId;
    use smartswitch_domain::presence::Specificity;

    fn at(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn intensity(value: u8) -> Intensity {
        Intensity::new(value).unwrap()
    }

    fn winner(slot: u8, value: u8) -> Resolution {
        Resolution {
            slot: SlotId::new(slot),
            intensity: intensity(value),
            specificity: Specificity::SPHERE,
            window_seconds: 3600,
        }
    }

    fn request(source: OverrideSource, value: u8) -> OverrideRequest {
        OverrideRequest::new(source, intensity(value))
    }

    #[test]
    fn should_hold_initial_intensity_when_nothing_resolved() {
        let mut aggregator = SwitchAggregator::new(intensity(25), 10);
        let applied = aggregator.tick(None, at("2024-01-01T12:00:00Z"));
        assert_eq!(applied, intensity(25));
        assert_eq!(aggregator.last_cause(), SwitchCause::Held);
    }

    #[test]
    fn should_apply_resolved_behaviour_when_no_override() {
        let mut aggregator = SwitchAggregator::default();
        let applied = aggregator.tick(Some(&winner(3, 60)), at("2024-01-01T12:00:00Z"));
        assert_eq!(applied, intensity(60));
        assert_eq!(
            aggregator.last_cause(),
            SwitchCause::Behaviour {
                slot: SlotId::new(3)
            }
        );
    }

    #[test]
    fn should_hold_previous_intensity_when_behaviour_stops_resolving() {
        let mut aggregator = SwitchAggregator::default();
        aggregator.tick(Some(&winner(3, 60)), at("2024-01-01T12:00:00Z"));
        let applied = aggregator.tick(None, at("2024-01-01T12:01:00Z"));
        assert_eq!(applied, intensity(60));
    }

    #[test]
    fn should_let_override_win_over_behaviour() {
        let mut aggregator = SwitchAggregator::default();
        let now = at("2024-01-01T12:00:00Z");
        aggregator
            .request_override(request(OverrideSource::TapToToggle, 0), now)
            .unwrap();
        assert_eq!(aggregator.tick(Some(&winner(1, 80)), now), Intensity::OFF);
        assert_eq!(
            aggregator.state(now),
            AggregatorState {
                overridden: true,
                behaviour_governed: true,
            }
        );
    }

    #[test]
    fn should_reject_lower_priority_override_while_higher_active() {
        let mut aggregator = SwitchAggregator::default();
        let now = at("2024-01-01T12:00:00Z");
        aggregator
            .request_override(request(OverrideSource::Manual, 40), now)
            .unwrap();

        let result = aggregator.request_override(request(OverrideSource::Switchcraft, 90), now);

        assert!(matches!(
            result,
            Err(SmartSwitchError::OverrideRejected(OverrideRejectedError {
                requested: OverrideSource::Switchcraft,
                active: OverrideSource::Manual,
            }))
        ));
        assert_eq!(aggregator.tick(None, now), intensity(40));
    }

    #[test]
    fn should_accept_equal_priority_override() {
        let mut aggregator = SwitchAggregator::default();
        let now = at("2024-01-01T12:00:00Z");
        aggregator
            .request_override(request(OverrideSource::Switchcraft, 40), now)
            .unwrap();
        aggregator
            .request_override(request(OverrideSource::Switchcraft, 70), now)
            .unwrap();
        assert_eq!(aggregator.tick(None, now), intensity(70));
    }

    #[test]
    fn should_accept_higher_priority_override() {
        let mut aggregator = SwitchAggregator::default();
        let now = at("2024-01-01T12:00:00Z");
        aggregator
            .request_override(request(OverrideSource::TapToToggle, 100), now)
            .unwrap();
        aggregator
            .request_override(request(OverrideSource::Manual, 10), now)
            .unwrap();
        assert_eq!(
            aggregator.active_override(now).map(|state| state.source),
            Some(OverrideSource::Manual)
        );
    }

    #[test]
    fn should_accept_lower_priority_override_when_active_one_expired() {
        let mut aggregator = SwitchAggregator::default();
        aggregator
            .request_override(
                request(OverrideSource::Manual, 40).with_ttl(Duration::minutes(10)),
                at("2024-01-01T12:00:00Z"),
            )
            .unwrap();

        let result = aggregator.request_override(
            request(OverrideSource::TapToToggle, 90),
            at("2024-01-01T12:10:00Z"),
        );

        assert!(result.is_ok());
    }

    #[test]
    fn should_return_to_behaviour_when_override_expires() {
        let mut aggregator = SwitchAggregator::default();
        aggregator
            .request_override(
                request(OverrideSource::Manual, 100).with_ttl(Duration::minutes(5)),
                at("2024-01-01T12:00:00Z"),
            )
            .unwrap();

        let behaviour = winner(2, 30);
        assert_eq!(
            aggregator.tick(Some(&behaviour), at("2024-01-01T12:04:59Z")),
            Intensity::FULLY_ON
        );
        assert_eq!(
            aggregator.tick(Some(&behaviour), at("2024-01-01T12:05:00Z")),
            intensity(30)
        );
        assert!(!aggregator.state(at("2024-01-01T12:05:00Z")).overridden);
    }

    #[test]
    fn should_hold_override_intensity_after_expiry_without_behaviour() {
        let mut aggregator = SwitchAggregator::default();
        aggregator
            .request_override(
                request(OverrideSource::Manual, 70).with_ttl(Duration::minutes(1)),
                at("2024-01-01T12:00:00Z"),
            )
            .unwrap();
        aggregator.tick(None, at("2024-01-01T12:00:30Z"));
        assert_eq!(aggregator.tick(None, at("2024-01-01T12:02:00Z")), intensity(70));
        assert_eq!(aggregator.last_cause(), SwitchCause::Held);
    }

    #[test]
    fn should_hand_back_control_when_override_cleared() {
        let mut aggregator = SwitchAggregator::default();
        let now = at("2024-01-01T12:00:00Z");
        aggregator
            .request_override(request(OverrideSource::Manual, 0), now)
            .unwrap();
        let cleared = aggregator.clear_override();
        assert_eq!(cleared.map(|state| state.source), Some(OverrideSource::Manual));
        assert_eq!(aggregator.tick(Some(&winner(0, 55)), now), intensity(55));
    }

    fn tap(aggregator: &mut SwitchAggregator, source: OverrideSource, now: Timestamp) {
        let target = aggregator.toggle_target(source, None, now);
        aggregator
            .request_override(OverrideRequest::new(source, target), now)
            .unwrap();
        aggregator.tick(None, now);
    }

    #[test]
    fn should_toggle_off_when_on() {
        let mut aggregator = SwitchAggregator::default();
        let now = at("2024-01-01T12:00:00Z");
        aggregator.tick(Some(&winner(0, 55)), now);
        assert_eq!(
            aggregator.toggle_target(OverrideSource::TapToToggle, Some(intensity(55)), now),
            OverrideIntensity::Fixed(Intensity::OFF)
        );
    }

    #[test]
    fn should_toggle_smart_on_when_off() {
        let mut aggregator = SwitchAggregator::default();
        let target =
            aggregator.toggle_target(OverrideSource::Manual, None, at("2024-01-01T12:00:00Z"));
        assert_eq!(target, OverrideIntensity::SmartOn);
    }

    #[test]
    fn should_resolve_smart_on_against_behaviour_on_every_tick() {
        let mut aggregator = SwitchAggregator::default();
        let now = at("2024-01-01T21:00:00Z");
        aggregator
            .request_override(
                OverrideRequest::new(OverrideSource::TapToToggle, OverrideIntensity::SmartOn),
                now,
            )
            .unwrap();

        assert_eq!(aggregator.tick(Some(&winner(0, 80)), now), intensity(80));
        assert_eq!(
            aggregator.tick(Some(&winner(1, 30)), at("2024-01-01T22:00:00Z")),
            intensity(30)
        );
        assert_eq!(
            aggregator.tick(Some(&winner(2, 0)), at("2024-01-01T23:00:00Z")),
            Intensity::FULLY_ON
        );
        assert!(aggregator.state(at("2024-01-01T23:00:00Z")).overridden);
    }

    #[test]
    fn should_keep_override_when_behaviour_changes_and_release_disabled() {
        let mut aggregator = SwitchAggregator::default();
        aggregator.tick(Some(&winner(0, 0)), at("2024-01-01T12:00:00Z"));
        aggregator
            .request_override(request(OverrideSource::Manual, 100), at("2024-01-01T12:00:00Z"))
            .unwrap();
        aggregator.tick(Some(&winner(0, 0)), at("2024-01-01T12:00:00Z"));

        aggregator.tick(Some(&winner(1, 60)), at("2024-01-01T18:00:00Z"));
        let applied = aggregator.tick(Some(&winner(0, 0)), at("2024-01-02T07:00:00Z"));

        assert_eq!(applied, Intensity::FULLY_ON);
    }

    #[test]
    fn should_release_override_when_behaviour_switches_to_opposite_state() {
        let mut aggregator = SwitchAggregator::default().with_override_release(true);
        aggregator.tick(Some(&winner(0, 0)), at("2024-01-01T12:00:00Z"));
        aggregator
            .request_override(request(OverrideSource::Manual, 100), at("2024-01-01T12:00:00Z"))
            .unwrap();
        assert_eq!(
            aggregator.tick(Some(&winner(0, 0)), at("2024-01-01T12:00:00Z")),
            Intensity::FULLY_ON
        );

        // Behaviour turns on while the override already holds the switch on.
        assert_eq!(
            aggregator.tick(Some(&winner(1, 60)), at("2024-01-01T18:00:00Z")),
            Intensity::FULLY_ON
        );
        assert!(aggregator.state(at("2024-01-01T18:00:00Z")).overridden);

        // Behaviour turns off: the override is dropped.
        assert_eq!(
            aggregator.tick(Some(&winner(0, 0)), at("2024-01-02T07:00:00Z")),
            Intensity::OFF
        );
        assert!(!aggregator.state(at("2024-01-02T07:00:00Z")).overridden);
    }

    #[test]
    fn should_not_release_override_when_behaviour_unchanged() {
        let mut aggregator = SwitchAggregator::default().with_override_release(true);
        let now = at("2024-01-01T12:00:00Z");
        aggregator.tick(Some(&winner(0, 60)), now);
        aggregator
            .request_override(request(OverrideSource::Manual, 0), now)
            .unwrap();
        aggregator.tick(Some(&winner(0, 60)), now);

        let applied = aggregator.tick(Some(&winner(0, 60)), at("2024-01-01T13:00:00Z"));

        assert_eq!(applied, Intensity::OFF);
    }

    #[test]
    fn should_go_fully_on_when_switchcraft_double_tapped_from_dimmed() {
        let mut aggregator = SwitchAggregator::default();
        aggregator.tick(Some(&winner(0, 40)), at("2024-01-01T12:00:00Z"));

        tap(&mut aggregator, OverrideSource::Switchcraft, at("2024-01-01T12:00:10Z"));
        assert_eq!(aggregator.applied(), Intensity::OFF);

        let target = aggregator.toggle_target(
            OverrideSource::Switchcraft,
            Some(intensity(40)),
            at("2024-01-01T12:00:11Z"),
        );
        assert_eq!(target, OverrideIntensity::Fixed(Intensity::FULLY_ON));
    }

    #[test]
    fn should_dim_when_switchcraft_double_tapped_from_fully_on() {
        let mut aggregator = SwitchAggregator::default().with_switchcraft(SwitchcraftSettings {
            default_dim: intensity(15),
            ..SwitchcraftSettings::default()
        });
        aggregator.tick(Some(&winner(0, 100)), at("2024-01-01T12:00:00Z"));

        tap(&mut aggregator, OverrideSource::Switchcraft, at("2024-01-01T12:00:10Z"));

        let target = aggregator.toggle_target(
            OverrideSource::Switchcraft,
            Some(Intensity::FULLY_ON),
            at("2024-01-01T12:00:11Z"),
        );
        assert_eq!(target, OverrideIntensity::Fixed(intensity(15)));
    }

    #[test]
    fn should_follow_dimmed_behaviour_when_double_tapped_from_fully_on() {
        let mut aggregator = SwitchAggregator::default();
        aggregator
            .request_override(request(OverrideSource::TapToToggle, 100), at("2024-01-01T12:00:00Z"))
            .unwrap();
        aggregator.tick(Some(&winner(0, 35)), at("2024-01-01T12:00:00Z"));

        tap(&mut aggregator, OverrideSource::Switchcraft, at("2024-01-01T12:00:10Z"));

        let target = aggregator.toggle_target(
            OverrideSource::Switchcraft,
            Some(intensity(35)),
            at("2024-01-01T12:00:11Z"),
        );
        assert_eq!(target, OverrideIntensity::SmartOn);
    }

    #[test]
    fn should_smart_on_when_switchcraft_taps_are_too_far_apart() {
        let mut aggregator = SwitchAggregator::default();
        aggregator.tick(Some(&winner(0, 40)), at("2024-01-01T12:00:00Z"));

        tap(&mut aggregator, OverrideSource::Switchcraft, at("2024-01-01T12:00:10Z"));

        let target = aggregator.toggle_target(
            OverrideSource::Switchcraft,
            Some(intensity(40)),
            at("2024-01-01T12:00:13Z"),
        );
        assert_eq!(target, OverrideIntensity::SmartOn);
    }

    #[test]
    fn should_smart_on_when_double_tap_disabled() {
        let mut aggregator = SwitchAggregator::default().with_switchcraft(SwitchcraftSettings {
            double_tap_window: None,
            ..SwitchcraftSettings::default()
        });
        aggregator.tick(Some(&winner(0, 40)), at("2024-01-01T12:00:00Z"));

        tap(&mut aggregator, OverrideSource::Switchcraft, at("2024-01-01T12:00:10Z"));

        let target = aggregator.toggle_target(
            OverrideSource::Switchcraft,
            Some(intensity(40)),
            at("2024-01-01T12:00:11Z"),
        );
        assert_eq!(target, OverrideIntensity::SmartOn);
    }

    #[test]
    fn should_suppress_consecutive_duplicate_history_entries() {
        let mut aggregator = SwitchAggregator::default();
        let behaviour = winner(1, 60);
        aggregator.tick(Some(&behaviour), at("2024-01-01T12:00:00Z"));
        aggregator.tick(Some(&behaviour), at("2024-01-01T12:00:01Z"));
        aggregator.tick(None, at("2024-01-01T12:00:02Z"));

        let causes: Vec<_> = aggregator.history().map(|item| item.cause).collect();
        assert_eq!(
            causes,
            vec![
                SwitchCause::Behaviour {
                    slot: SlotId::new(1)
                },
                SwitchCause::Held,
            ]
        );
    }

    #[test]
    fn should_drop_oldest_history_entry_when_full() {
        let mut aggregator = SwitchAggregator::new(Intensity::OFF, 2);
        aggregator.tick(Some(&winner(1, 10)), at("2024-01-01T12:00:00Z"));
        aggregator.tick(Some(&winner(2, 20)), at("2024-01-01T12:00:01Z"));
        aggregator.tick(Some(&winner(3, 30)), at("2024-01-01T12:00:02Z"));

        let values: Vec<u8> = aggregator.history().map(|item| item.intensity.get()).collect();
        assert_eq!(values, vec![20, 30]);
    }
}
