//! Switch controller: drives one evaluation of the switch core per input.
//!
//! The controller owns every stateful component (presence registry,
//! behaviour store, aggregator) and the ports. Each evaluation runs in a
//! fixed order: presence snapshot, behaviour resolution, aggregation, then
//! the driver is told about a changed target.

use chrono::Duration;
use tracing::{debug, info};

use smartswitch_domain::behaviour::{DEFAULT_CAPACITY, Intensity, Resolution, SwitchBehaviour};
use smartswitch_domain::error::SmartSwitchError;
use smartswitch_domain::event::SwitchEvent;
use smartswitch_domain::history::SwitchHistoryItem;
use smartswitch_domain::id::{ProfileId, SlotId};
use smartswitch_domain::overrides::{OverrideRequest, OverrideSource};
use smartswitch_domain::presence::{PresenceMutation, PresenceSnapshot};
use smartswitch_domain::room::{MAX_ROOMS, RoomId, RoomMask};
use smartswitch_domain::time::{TimeOfDay, Timestamp};

use crate::behaviour_resolver::BehaviourResolver;
use crate::ports::{BehaviourStorage, Clock, EventPublisher, SwitchDriver};
use crate::presence_registry::{DEFAULT_PRESENCE_TIMEOUT_SECS, PresenceRegistry};
use crate::services::{BehaviourStoreService, WriteOutcome};
use crate::switch_aggregator::{
    AggregatorState, DEFAULT_HISTORY_CAPACITY, SwitchAggregator, SwitchcraftSettings,
};

/// Tunables of the switch core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    pub presence_timeout: Duration,
    /// Rooms in the sphere, used to rank room-scoped conditions.
    pub room_count: u8,
    pub behaviour_capacity: usize,
    /// Held until a behaviour or an override decides otherwise.
    pub initial_intensity: Intensity,
    pub history_capacity: usize,
    /// When disabled, behaviours are never resolved and only overrides move
    /// the switch.
    pub behaviour_enabled: bool,
    /// Drop the active override when the last user leaves the sphere while
    /// a behaviour requiring presence is scheduled.
    pub clear_override_on_sphere_exit: bool,
    /// Drop the active override when the behaviour intensity changes to the
    /// opposite on/off state, so a manual "on" lasts until the next
    /// scheduled "off".
    pub release_override_on_behaviour_change: bool,
    /// Applied to override requests that carry no ttl of their own.
    pub default_override_ttl: Option<Duration>,
    pub switchcraft: SwitchcraftSettings,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            presence_timeout: Duration::seconds(DEFAULT_PRESENCE_TIMEOUT_SECS),
            room_count: MAX_ROOMS,
            behaviour_capacity: DEFAULT_CAPACITY,
            initial_intensity: Intensity::OFF,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            behaviour_enabled: true,
            clear_override_on_sphere_exit: false,
            release_override_on_behaviour_change: false,
            default_override_ttl: None,
            switchcraft: SwitchcraftSettings::default(),
        }
    }
}

/// An input the controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchInput {
    PresenceObserved {
        room: RoomId,
        profile: ProfileId,
        present: bool,
    },
    OverrideRequested(OverrideRequest),
    /// Flip the switch on behalf of `source`.
    ToggleRequested { source: OverrideSource },
    OverrideCleared,
    /// The slot was rewritten in storage by someone else.
    BehaviourStoreChanged { slot: SlotId },
    BehaviourEnabled(bool),
    Tick,
}

impl SwitchInput {
    fn is_presence(&self) -> bool {
        matches!(self, Self::PresenceObserved { .. })
    }
}

/// What came out of [`SwitchController::process_batch`].
#[derive(Debug)]
pub struct BatchOutcome {
    pub intensity: Intensity,
    /// Inputs that failed; the rest of the batch was still applied.
    pub errors: Vec<SmartSwitchError>,
}

pub struct SwitchController<S, C, D, P> {
    registry: PresenceRegistry,
    behaviours: BehaviourStoreService<S>,
    resolver: BehaviourResolver,
    aggregator: SwitchAggregator,
    clock: C,
    driver: D,
    publisher: P,
    settings: ControllerSettings,
    occupied: RoomMask,
    driven: Option<Intensity>,
}

impl<S, C, D, P> SwitchController<S, C, D, P>
where
    S: BehaviourStorage,
    C: Clock,
    D: SwitchDriver,
    P: EventPublisher,
{
    /// Build the controller and load behaviours from `storage`.
    ///
    /// Nothing is sent to the driver until the first evaluation.
    pub fn new(storage: S, clock: C, driver: D, publisher: P, settings: ControllerSettings) -> Self {
        let mut behaviours = BehaviourStoreService::new(storage, settings.behaviour_capacity);
        behaviours.load();
        Self {
            registry: PresenceRegistry::new(settings.presence_timeout),
            behaviours,
            resolver: BehaviourResolver::new(settings.room_count),
            aggregator: SwitchAggregator::new(
                settings.initial_intensity,
                settings.history_capacity,
            )
            .with_override_release(settings.release_override_on_behaviour_change)
            .with_switchcraft(settings.switchcraft),
            clock,
            driver,
            publisher,
            settings,
            occupied: RoomMask::EMPTY,
            driven: None,
        }
    }

    /// Apply one input, then evaluate.
    ///
    /// # Errors
    ///
    /// Returns the error of the input; the switch is not re-evaluated then.
    pub fn handle(&mut self, input: SwitchInput) -> Result<Intensity, SmartSwitchError> {
        self.apply(input)?;
        Ok(self.evaluate())
    }

    /// Apply a batch of inputs and evaluate once.
    ///
    /// Presence observations are applied before anything else, so overrides
    /// and toggles in the same batch see the up-to-date occupancy.
    pub fn process_batch(&mut self, inputs: impl IntoIterator<Item = SwitchInput>) -> BatchOutcome {
        let (presence, others): (Vec<_>, Vec<_>) =
            inputs.into_iter().partition(SwitchInput::is_presence);
        let errors = presence
            .into_iter()
            .chain(others)
            .filter_map(|input| self.apply(input).err())
            .collect();
        BatchOutcome {
            intensity: self.evaluate(),
            errors,
        }
    }

    fn apply(&mut self, input: SwitchInput) -> Result<(), SmartSwitchError> {
        let at = self.clock.now_timestamp();
        match input {
            SwitchInput::PresenceObserved {
                room,
                profile,
                present,
            } => {
                self.registry.observe_profile(room, profile, present, at);
                Ok(())
            }
            SwitchInput::OverrideRequested(request) => self.request_override(request, at),
            SwitchInput::ToggleRequested { source } => {
                let snapshot = self.registry.snapshot(at);
                let resolved = self
                    .resolution(self.clock.now(), &snapshot)
                    .map(|winner| winner.intensity);
                let target = self.aggregator.toggle_target(source, resolved, at);
                debug!(%source, %target, "toggle requested");
                self.request_override(OverrideRequest::new(source, target), at)
            }
            SwitchInput::OverrideCleared => {
                self.aggregator.clear_override();
                Ok(())
            }
            SwitchInput::BehaviourStoreChanged { slot } => {
                self.behaviours.reload(slot)?;
                self.publish_store_mutated(slot);
                Ok(())
            }
            SwitchInput::BehaviourEnabled(enabled) => {
                if enabled != self.settings.behaviour_enabled {
                    info!(enabled, "behaviour engine toggled");
                }
                self.settings.behaviour_enabled = enabled;
                Ok(())
            }
            SwitchInput::Tick => {
                self.registry.prune(at);
                Ok(())
            }
        }
    }

    fn request_override(
        &mut self,
        request: OverrideRequest,
        at: Timestamp,
    ) -> Result<(), SmartSwitchError> {
        let request = match (request.ttl, self.settings.default_override_ttl) {
            (None, Some(ttl)) => request.with_ttl(ttl),
            _ => request,
        };
        let result = self.aggregator.request_override(request, at);
        if let Err(SmartSwitchError::OverrideRejected(rejected)) = &result {
            self.publisher.publish(SwitchEvent::OverrideRejected {
                requested: rejected.requested,
                active: rejected.active,
                at,
            });
        }
        result
    }

    fn resolution(&self, now: TimeOfDay, snapshot: &PresenceSnapshot) -> Option<Resolution> {
        if !self.settings.behaviour_enabled {
            return None;
        }
        self.resolver
            .resolve_winner(now, snapshot, self.behaviours.store())
    }

    /// Run presence, resolution and aggregation once, and drive the switch
    /// when the target changed.
    pub fn evaluate(&mut self) -> Intensity {
        let now = self.clock.now();
        let at = self.clock.now_timestamp();

        let snapshot = self.registry.snapshot(at);
        let mutation = PresenceMutation::between(self.occupied, snapshot.occupied());
        if mutation != PresenceMutation::Unchanged {
            self.occupied = snapshot.occupied();
            self.publisher.publish(SwitchEvent::PresenceMutated {
                mutation,
                occupied: self.occupied,
                at,
            });
        }
        if mutation == PresenceMutation::LastUserExitedSphere
            && self.settings.clear_override_on_sphere_exit
            && self.resolver.requires_presence(now, self.behaviours.store())
            && let Some(cleared) = self.aggregator.clear_override()
        {
            info!(source = %cleared.source, "override cleared, sphere is empty");
        }

        let winner = self.resolution(now, &snapshot);
        let intensity = self.aggregator.tick(winner.as_ref(), at);

        if self.driven != Some(intensity) {
            self.driver.apply(intensity);
            self.driven = Some(intensity);
            self.publisher.publish(SwitchEvent::IntensityResolved {
                intensity,
                cause: self.aggregator.last_cause(),
                at,
            });
        }
        intensity
    }

    /// Store `behaviour` in `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`SmartSwitchError::SlotOutOfRange`] or
    /// [`SmartSwitchError::InvalidBehaviour`].
    pub fn replace_behaviour(
        &mut self,
        slot: SlotId,
        behaviour: SwitchBehaviour,
    ) -> Result<WriteOutcome, SmartSwitchError> {
        let outcome = self.behaviours.replace(slot, behaviour)?;
        self.publish_store_mutated(slot);
        Ok(outcome)
    }

    /// Empty `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`SmartSwitchError::SlotOutOfRange`] beyond capacity.
    pub fn clear_behaviour(&mut self, slot: SlotId) -> Result<WriteOutcome, SmartSwitchError> {
        let outcome = self.behaviours.clear(slot)?;
        self.publish_store_mutated(slot);
        Ok(outcome)
    }

    /// Store `behaviour` in the first free slot.
    ///
    /// # Errors
    ///
    /// Returns [`SmartSwitchError::InvalidBehaviour`] or
    /// [`SmartSwitchError::StoreFull`].
    pub fn add_behaviour(
        &mut self,
        behaviour: SwitchBehaviour,
    ) -> Result<WriteOutcome, SmartSwitchError> {
        let outcome = self.behaviours.add(behaviour)?;
        self.publish_store_mutated(outcome.slot);
        Ok(outcome)
    }

    fn publish_store_mutated(&self, slot: SlotId) {
        self.publisher.publish(SwitchEvent::BehaviourStoreMutated {
            slot,
            fingerprint: self.behaviours.store().fingerprint(),
        });
    }

    #[must_use]
    pub fn behaviours(&self) -> &BehaviourStoreService<S> {
        &self.behaviours
    }

    #[must_use]
    pub fn presence(&self) -> PresenceSnapshot {
        self.registry.snapshot(self.clock.now_timestamp())
    }

    #[must_use]
    pub fn state(&self) -> AggregatorState {
        self.aggregator.state(self.clock.now_timestamp())
    }

    /// The intensity settled on by the last evaluation.
    #[must_use]
    pub fn applied(&self) -> Intensity {
        self.aggregator.applied()
    }

    pub fn history(&self) -> impl Iterator<Item = &SwitchHistoryItem> {
        self.aggregator.history()
    }

    #[must_use]
    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }
}
