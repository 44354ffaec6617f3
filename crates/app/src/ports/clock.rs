//! Clock port: wall-clock time source.

use smartswitch_domain::time::{TimeOfDay, Timestamp};

/// Source of the current time.
///
/// Only monotonicity within a day is assumed; accuracy is the adapter's
/// business.
pub trait Clock {
    /// Local time of day, used to match behaviour windows.
    fn now(&self) -> TimeOfDay;

    /// Absolute time, used for presence debounce and override expiry.
    fn now_timestamp(&self) -> Timestamp;
}

impl<T: Clock + ?Sized> Clock for std::sync::Arc<T> {
    fn now(&self) -> TimeOfDay {
        (**self).now()
    }

    fn now_timestamp(&self) -> Timestamp {
        (**self).now_timestamp()
    }
}
