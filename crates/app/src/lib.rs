//! # smartswitch-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `Clock`: time of day and absolute time
//!   - `EventPublisher`: emit switch events
//!   - `BehaviourStorage`: persisted behaviours, keyed by slot
//!   - `SwitchDriver`: the relay/dimmer
//! - Track presence per room with a debounced vacate (`PresenceRegistry`)
//! - Pick the governing behaviour (`BehaviourResolver`)
//! - Merge behaviours and overrides into one intensity (`SwitchAggregator`)
//! - Drive one evaluation per input in a fixed order (`SwitchController`)
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `smartswitch-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod behaviour_resolver;
pub mod event_bus;
pub mod ports;
pub mod presence_registry;
pub mod services;
pub mod switch_aggregator;
pub mod switch_controller;
