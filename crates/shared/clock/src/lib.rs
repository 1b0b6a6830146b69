//! Pumpstream Clock Infrastructure
//!
//! - `SystemClock`: wall-clock time, used in production
//! - `ManualClock`: time that only moves when told to, for deterministic tests
//!
//! ```ignore
//! use pumpstream_clock::{Clock, ManualClock};
//! use chrono::Duration;
//!
//! let clock = ManualClock::at_epoch_seconds(1_700_000_000);
//! clock.advance(Duration::seconds(5));
//! assert_eq!(clock.epoch_seconds(), 1_700_000_005);
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use pumpstream_ports::Clock;
