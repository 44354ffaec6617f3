//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `smartswitch.toml` in the working directory (or the path in
//! `SMARTSWITCH_CONFIG`). Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::collections::BTreeSet;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use smartswitch_app::switch_aggregator::SwitchcraftSettings;
use smartswitch_app::switch_controller::ControllerSettings;
use smartswitch_domain::behaviour::{Intensity, SwitchBehaviour};
use smartswitch_domain::error::SmartSwitchError;
use smartswitch_domain::id::SlotId;
use smartswitch_domain::presence::PresenceCondition;
use smartswitch_domain::room::{MAX_ROOMS, RoomId};
use smartswitch_domain::time::TimeOfDay;

const DEFAULT_PATH: &str = "smartswitch.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub presence: PresenceConfig,
    /// Behaviour engine settings.
    pub behaviour: BehaviourConfig,
    pub switch: SwitchConfig,
    pub tick: TickConfig,
    pub logging: LoggingConfig,
    /// Behaviours written to storage before the first evaluation.
    pub behaviours: Vec<BehaviourSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Seconds without a positive observation before a room reads as vacated.
    pub timeout_secs: u32,
    /// Rooms in the sphere.
    pub room_count: u8,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BehaviourConfig {
    pub enabled: bool,
    /// Number of behaviour slots.
    pub capacity: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SwitchConfig {
    /// Intensity held until a behaviour or an override decides.
    pub initial_intensity: u8,
    pub history_capacity: usize,
    /// Lifetime of overrides that do not carry their own.
    pub default_override_ttl_secs: Option<u32>,
    pub clear_override_on_sphere_exit: bool,
    /// Drop an override when the schedule switches to the opposite state.
    pub release_override_on_behaviour_change: bool,
    /// Two switchcraft toggles within this many milliseconds form a double
    /// tap; 0 disables it.
    pub double_tap_window_ms: u32,
    /// Dimmed intensity a double tap falls back to.
    pub default_dim: u8,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    pub interval_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// A behaviour as written in the configuration file.
///
/// Omitting `from` and `until` gives the full-day window.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BehaviourSeed {
    pub slot: u8,
    #[serde(default)]
    pub from: TimeOfDay,
    #[serde(default)]
    pub until: TimeOfDay,
    pub intensity: u8,
    #[serde(default)]
    pub condition: ConditionSeed,
}

/// Presence condition with rooms listed by index rather than as a mask.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionSeed {
    #[default]
    VacuouslyTrue,
    AnyoneInSphere,
    NooneInSphere,
    AnyoneInSelectedRooms {
        rooms: Vec<RoomId>,
    },
    NooneInSelectedRooms {
        rooms: Vec<RoomId>,
    },
}

impl From<&ConditionSeed> for PresenceCondition {
    fn from(seed: &ConditionSeed) -> Self {
        match seed {
            ConditionSeed::VacuouslyTrue => Self::VacuouslyTrue,
            ConditionSeed::AnyoneInSphere => Self::AnyoneInSphere,
            ConditionSeed::NooneInSphere => Self::NooneInSphere,
            ConditionSeed::AnyoneInSelectedRooms { rooms } => Self::AnyoneInSelectedRooms {
                rooms: rooms.iter().copied().collect(),
            },
            ConditionSeed::NooneInSelectedRooms { rooms } => Self::NooneInSelectedRooms {
                rooms: rooms.iter().copied().collect(),
            },
        }
    }
}

impl BehaviourSeed {
    /// Build the stored behaviour.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Behaviour`] when the behaviour is invalid.
    pub fn build(&self) -> Result<(SlotId, SwitchBehaviour), ConfigError> {
        SwitchBehaviour::builder()
            .window(self.from, self.until)
            .intensity(self.intensity)
            .condition(PresenceCondition::from(&self.condition))
            .build()
            .map(|behaviour| (SlotId::new(self.slot), behaviour))
            .map_err(|source| ConfigError::Behaviour {
                slot: self.slot,
                source,
            })
    }
}

impl Config {
    /// Load configuration from `smartswitch.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("SMARTSWITCH_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(secs) = parsed(&var, "SMARTSWITCH_PRESENCE_TIMEOUT_SECS") {
            self.presence.timeout_secs = secs;
        }
        if let Some(count) = parsed(&var, "SMARTSWITCH_ROOM_COUNT") {
            self.presence.room_count = count;
        }
        if let Some(enabled) = parsed(&var, "SMARTSWITCH_BEHAVIOUR_ENABLED") {
            self.behaviour.enabled = enabled;
        }
        if let Some(capacity) = parsed(&var, "SMARTSWITCH_BEHAVIOUR_CAPACITY") {
            self.behaviour.capacity = capacity;
        }
        if let Some(intensity) = parsed(&var, "SMARTSWITCH_INITIAL_INTENSITY") {
            self.switch.initial_intensity = intensity;
        }
        if let Some(capacity) = parsed(&var, "SMARTSWITCH_HISTORY_CAPACITY") {
            self.switch.history_capacity = capacity;
        }
        if let Some(secs) = parsed(&var, "SMARTSWITCH_DEFAULT_OVERRIDE_TTL_SECS") {
            self.switch.default_override_ttl_secs = Some(secs);
        }
        if let Some(enabled) = parsed(&var, "SMARTSWITCH_CLEAR_OVERRIDE_ON_SPHERE_EXIT") {
            self.switch.clear_override_on_sphere_exit = enabled;
        }
        if let Some(enabled) = parsed(&var, "SMARTSWITCH_RELEASE_OVERRIDE_ON_BEHAVIOUR_CHANGE") {
            self.switch.release_override_on_behaviour_change = enabled;
        }
        if let Some(ms) = parsed(&var, "SMARTSWITCH_DOUBLE_TAP_WINDOW_MS") {
            self.switch.double_tap_window_ms = ms;
        }
        if let Some(dim) = parsed(&var, "SMARTSWITCH_DEFAULT_DIM") {
            self.switch.default_dim = dim;
        }
        if let Some(ms) = parsed(&var, "SMARTSWITCH_TICK_INTERVAL_MS") {
            self.tick.interval_ms = ms;
        }
        if let Some(val) = var("SMARTSWITCH_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.presence.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "presence timeout must be non-zero".to_string(),
            ));
        }
        if !(1..=MAX_ROOMS).contains(&self.presence.room_count) {
            return Err(ConfigError::Validation(format!(
                "room count must be between 1 and {MAX_ROOMS}"
            )));
        }
        if !(1..=256).contains(&self.behaviour.capacity) {
            return Err(ConfigError::Validation(
                "behaviour capacity must be between 1 and 256".to_string(),
            ));
        }
        if self.tick.interval_ms == 0 {
            return Err(ConfigError::Validation(
                "tick interval must be non-zero".to_string(),
            ));
        }
        Intensity::new(self.switch.initial_intensity)
            .map_err(|err| ConfigError::Validation(format!("initial intensity: {err}")))?;
        if !(1..=100).contains(&self.switch.default_dim) {
            return Err(ConfigError::Validation(
                "default dim must be between 1 and 100".to_string(),
            ));
        }
        let mut slots = BTreeSet::new();
        for seed in &self.behaviours {
            if usize::from(seed.slot) >= self.behaviour.capacity {
                return Err(ConfigError::Validation(format!(
                    "behaviour slot {} beyond capacity {}",
                    seed.slot, self.behaviour.capacity
                )));
            }
            if !slots.insert(seed.slot) {
                return Err(ConfigError::Validation(format!(
                    "behaviour slot {} seeded more than once",
                    seed.slot
                )));
            }
            seed.build()?;
        }
        Ok(())
    }

    /// Settings of the switch core.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when the initial intensity or the
    /// default dim is out of range.
    pub fn controller_settings(&self) -> Result<ControllerSettings, ConfigError> {
        let initial_intensity = Intensity::new(self.switch.initial_intensity)
            .map_err(|err| ConfigError::Validation(format!("initial intensity: {err}")))?;
        let default_dim = Intensity::new(self.switch.default_dim)
            .map_err(|err| ConfigError::Validation(format!("default dim: {err}")))?;
        Ok(ControllerSettings {
            presence_timeout: chrono::Duration::seconds(i64::from(self.presence.timeout_secs)),
            room_count: self.presence.room_count,
            behaviour_capacity: self.behaviour.capacity,
            initial_intensity,
            history_capacity: self.switch.history_capacity,
            behaviour_enabled: self.behaviour.enabled,
            clear_override_on_sphere_exit: self.switch.clear_override_on_sphere_exit,
            release_override_on_behaviour_change: self.switch.release_override_on_behaviour_change,
            default_override_ttl: self
                .switch
                .default_override_ttl_secs
                .map(|secs| chrono::Duration::seconds(i64::from(secs))),
            switchcraft: SwitchcraftSettings {
                double_tap_window: (self.switch.double_tap_window_ms > 0).then(|| {
                    chrono::Duration::milliseconds(i64::from(self.switch.double_tap_window_ms))
                }),
                default_dim,
            },
        })
    }

    /// Behaviours to write to storage at boot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Behaviour`] for the first invalid seed.
    pub fn seed_behaviours(&self) -> Result<Vec<(SlotId, SwitchBehaviour)>, ConfigError> {
        self.behaviours.iter().map(BehaviourSeed::build).collect()
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick.interval_ms)
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            room_count: MAX_ROOMS,
        }
    }
}

impl Default for BehaviourConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 50,
        }
    }
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            initial_intensity: 0,
            history_capacity: 50,
            default_override_ttl_secs: None,
            clear_override_on_sphere_exit: false,
            release_override_on_behaviour_change: false,
            double_tap_window_ms: 2000,
            default_dim: 20,
        }
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "smartswitchd=info,smartswitch_app=info".to_string(),
        }
    }
}

fn parsed<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    var(key).and_then(|val| val.parse().ok())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// A seeded behaviour is invalid.
    #[error("invalid behaviour in slot {slot}")]
    Behaviour {
        slot: u8,
        #[source]
        source: SmartSwitchError,
    },
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
