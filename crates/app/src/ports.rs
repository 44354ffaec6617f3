//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the switch core and the rest of the
//! firmware: wall clock, event bus, persistent behaviour storage and the
//! hardware switch driver. They are synchronous; the core never suspends.

pub mod clock;
pub mod driver;
pub mod event_bus;
pub mod storage;

pub use clock::Clock;
pub use driver::SwitchDriver;
pub use event_bus::EventPublisher;
pub use storage::BehaviourStorage;
