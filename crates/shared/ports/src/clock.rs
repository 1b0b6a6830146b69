use pumpstream_core::{EpochSeconds, Timestamp};

/// Port for time abstraction
///
/// Receipt timestamps come from this clock, never from the feed:
/// - Real system time for production
/// - Manually advanced time for deterministic tests
pub trait Clock: Send + Sync {
    /// Get the current time according to this clock
    fn now(&self) -> Timestamp;

    /// Current time truncated to whole seconds since the epoch
    fn epoch_seconds(&self) -> EpochSeconds {
        self.now().timestamp()
    }

    /// Get the clock's name/identifier for debugging
    fn name(&self) -> &str {
        "Clock"
    }
}
