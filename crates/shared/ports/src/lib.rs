//! Pumpstream Ports
//!
//! Port definitions (traits) for the pumpstream ingestion engine.
//! These define the boundaries between the ingestion logic and infrastructure
//! (the durable store and the wall clock).

mod clock;
mod error;
mod store;

pub use clock::Clock;
pub use error::{StoreError, StoreResult};
pub use store::EventStore;
