//! # smartswitch-adapter-virtual
//!
//! Virtual adapters that stand in for the firmware collaborators of the
//! switch core, for testing and demonstration purposes.
//!
//! ## Provided adapters
//!
//! | Adapter | Port | Behaviour |
//! |---------|------|-----------|
//! | [`InMemoryBehaviourStorage`] | `BehaviourStorage` | Slot map behind a mutex, optional write failures |
//! | [`VirtualSwitch`] | `SwitchDriver` | Remembers the current intensity and every applied value |
//! | [`SystemClock`] | `Clock` | Local time of day, UTC timestamps |
//! | [`ManualClock`] | `Clock` | Settable time, for deterministic runs |
//!
//! ## Dependency rule
//!
//! Depends on `smartswitch-app` (port traits) and `smartswitch-domain` only.

mod clock;
mod storage;
mod switch;

pub use clock::{ManualClock, SystemClock};
pub use storage::InMemoryBehaviourStorage;
pub use switch::VirtualSwitch;
