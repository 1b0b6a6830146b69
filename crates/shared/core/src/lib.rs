//! Pumpstream Core Domain
//!
//! Pure record types for the pumpstream ingestion engine.
//! This crate contains no async, no I/O, and is 100% unit testable.
//!
//! - **Entities**: `Token` (one row per discovered mint) and `TradeEvent`
//!   (append-only market actions referencing a token)
//! - **Feed**: decoding of inbound feed frames into typed `FeedEvent`s and the
//!   outbound `SubscribeCommand` wire shape

pub mod entities;
pub mod feed;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{MintId, Token, TradeEvent, TradeKind};
pub use feed::{FeedEvent, FeedMessage, MessageError, SubscribeCommand, ValidationError};
pub use values::{EpochSeconds, Timestamp};
