//! Pumpstream Runner - feed ingestion process
//!
//! Wires the ingestion engine together:
//!
//! - **Config**: JSON file or embedded defaults, then `PUMPSTREAM_*` overrides
//! - **Ingestion loop**: decodes, validates, and routes feed frames into the store
//! - **Stats**: counters owned by the loop, logged by a background reporter
//!
//! ## Architecture
//!
//! ```text
//!   ConnectionSupervisor ──frames──► IngestionLoop ──writes──► EventStore
//!          ▲                              │                       │
//!          │ replay on connect            │ enqueue(mint)         │ list_all_mints
//!          │                              ▼                       │
//!          └─────────────────── SubscriptionReconciler ◄──────────┘
//!
//!   StatsReporter ──reads──► IngestStats, reconciler counts, store size
//! ```

pub mod config;
pub mod ingest;
pub mod stats;

// Re-export main types
pub use config::{ConfigError, IngestConfig, load_config, load_config_from_str, load_default_config};
pub use ingest::{IngestionLoop, MessageOutcome};
pub use stats::{IngestStats, StatsReport, StatsReporter, StatsSnapshot};
