//! Pumpstream Store
//!
//! SQLite implementation of the `EventStore` port.
//!
//! ```text
//! tokens                       raw_txs
//! ┌──────────────────────┐     ┌──────────────────────────────┐
//! │ mint (PK)            │◄────│ mint (FK, indexed)           │
//! │ timestamp            │     │ id (autoincrement)           │
//! │ initial_sol_liquidity│     │ timestamp, tx_type, amounts, │
//! │ name, symbol         │     │ bonding curve snapshot       │
//! └──────────────────────┘     └──────────────────────────────┘
//! ```
//!
//! The connection runs in WAL mode with foreign keys enforced, so a trade
//! event for an unknown mint is rejected with `StoreError::Constraint`.

mod schema;
mod sqlite;

pub use sqlite::SqliteStore;
