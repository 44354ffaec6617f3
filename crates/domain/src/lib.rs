//! # smartswitch-domain
//!
//! Pure domain model for the smart switch behaviour engine.
//!
//! ## Responsibilities
//! - Foundational types: typed indices, error conventions, time of day
//! - Define **Rooms** and room sets (bitmask per sphere)
//! - Define **Presence** snapshots and presence conditions with specificity
//! - Define **Behaviours** (time window + presence condition → intensity)
//!   and the slot-indexed behaviour store
//! - Define **Overrides** (manual, switchcraft, tap-to-toggle) and their
//!   priority order
//! - Define **Events** and switch history records
//! - Contain all invariant enforcement
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or IO crates, and it
//! does not log. All IO boundaries are traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod behaviour;
pub mod event;
pub mod history;
pub mod overrides;
pub mod presence;
pub mod room;
