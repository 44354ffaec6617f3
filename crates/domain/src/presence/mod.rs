//! Presence: who is where in the sphere.
//!
//! A [`PresenceSnapshot`] captures room occupancy at one instant. A
//! [`PresenceCondition`] is a predicate over such a snapshot; its
//! [`Specificity`] ranks how narrowly it scopes presence and drives
//! behaviour conflict resolution.

mod condition;
mod mutation;
mod snapshot;

pub use condition::{PresenceCondition, Specificity};
pub use mutation::PresenceMutation;
pub use snapshot::PresenceSnapshot;
