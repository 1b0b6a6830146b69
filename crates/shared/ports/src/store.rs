use async_trait::async_trait;
use pumpstream_core::{MintId, Token, TradeEvent};

use crate::error::StoreResult;

/// Port for the durable record store
///
/// Two logical record sets: tokens (one row per mint, first write wins) and
/// trade events (append-only, foreign-keyed to tokens). Every write is its
/// own committed transaction; nothing spans two calls.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Ensure both record sets, the foreign key, and the per-mint index
    /// exist. Safe to call on every start.
    async fn initialize(&self) -> StoreResult<()>;

    /// Insert the token unless its mint is already present.
    /// Returns true when a row was written.
    async fn upsert_token_if_absent(&self, token: &Token) -> StoreResult<bool>;

    /// Append a trade event. Fails with `StoreError::Constraint` when the
    /// owning token does not exist.
    async fn append_trade_event(&self, event: &TradeEvent) -> StoreResult<()>;

    /// Every known mint, in no particular order. Used to seed subscriptions
    /// on each (re)connect.
    async fn list_all_mints(&self) -> StoreResult<Vec<MintId>>;

    /// Storage footprint in bytes. Best-effort: 0 when unknown.
    async fn size_on_disk(&self) -> u64;

    async fn find_token(&self, mint: &MintId) -> StoreResult<Option<Token>>;

    /// Trade events of one token, ordered by receipt time then insertion.
    async fn trade_events_for(&self, mint: &MintId) -> StoreResult<Vec<TradeEvent>>;

    async fn token_count(&self) -> StoreResult<u64>;
}
