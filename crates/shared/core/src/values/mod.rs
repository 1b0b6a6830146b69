use chrono::{DateTime, Utc};

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Whole seconds since the Unix epoch, the resolution records are stored at
pub type EpochSeconds = i64;
