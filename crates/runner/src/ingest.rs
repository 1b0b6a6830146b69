//! Ingestion loop
//!
//! Single consumer of inbound frames. Each frame is stamped with the local
//! receipt time, validated into a [`FeedEvent`], and routed:
//!
//! | kind           | store                          | reconciler | counter   |
//! |----------------|--------------------------------|------------|-----------|
//! | `create`       | token if absent, then the raw  | enqueue    | creations |
//! |                | creation record                |            |           |
//!
//! A creation whose token row is stored is enqueued and counted even when
//! its raw record then fails to write.
//! | `buy` / `sell` | trade event                    |            | trades    |
//! | anything else  |                                |            | ignored   |
//!
//! Nothing a frame contains can stop the loop; only shutdown does.

use pumpstream_core::{FeedEvent, FeedMessage, MintId, TradeEvent};
use pumpstream_gateway::{
    ConnectionSupervisor, FeedConnector, SubscriptionReconciler, TransportError,
};
use pumpstream_ports::{Clock, EventStore, StoreError};
use std::future::Future;
use std::sync::Arc;

use crate::stats::IngestStats;

/// What became of one inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum MessageOutcome {
    /// Creation processed; `inserted` is false for an already known token
    Created { mint: MintId, inserted: bool },
    Traded { mint: MintId },
    /// Valid frame of a kind that is not stored
    Ignored { tx_type: String },
    /// Decodable but missing a required field
    Rejected,
    Undecodable,
    /// A store write failed; the frame is dropped
    StoreFailed { mint: MintId, error: StoreError },
}

pub struct IngestionLoop<C: FeedConnector> {
    supervisor: ConnectionSupervisor<C>,
    store: Arc<dyn EventStore>,
    reconciler: Arc<SubscriptionReconciler>,
    stats: Arc<IngestStats>,
    clock: Arc<dyn Clock>,
}

impl<C: FeedConnector> IngestionLoop<C> {
    /// Wires the reconciler into the supervisor so every new connection
    /// replays subscriptions before frames are read from it.
    pub fn new(
        mut supervisor: ConnectionSupervisor<C>,
        store: Arc<dyn EventStore>,
        reconciler: Arc<SubscriptionReconciler>,
        stats: Arc<IngestStats>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        supervisor.add_observer(reconciler.clone());
        Self {
            supervisor,
            store,
            reconciler,
            stats,
            clock,
        }
    }

    pub fn supervisor(&self) -> &ConnectionSupervisor<C> {
        &self.supervisor
    }

    pub fn stats(&self) -> &Arc<IngestStats> {
        &self.stats
    }

    /// Connect and process frames until `shutdown` resolves, reconnecting
    /// whenever the link drops. On shutdown the live link is closed and
    /// nothing in flight is retried.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown requested before the feed connected");
                self.supervisor.close().await;
                return;
            }
            _ = self.supervisor.connect() => {}
        }

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, closing feed connection");
                    self.supervisor.close().await;
                    return;
                }
                frame = self.supervisor.receive() => match frame {
                    Ok(raw) => {
                        self.handle_message(&raw).await;
                    }
                    Err(TransportError::ConnectionClosed) => {
                        self.stats.record_reconnect();
                        tracing::info!("Feed connection lost, reconnecting");
                        tokio::select! {
                            _ = &mut shutdown => {
                                tracing::info!("Shutdown requested while reconnecting");
                                self.supervisor.close().await;
                                return;
                            }
                            _ = self.supervisor.connect() => {}
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Receive failed");
                    }
                },
            }
        }
    }

    /// Process one raw frame
    pub async fn handle_message(&self, raw: &str) -> MessageOutcome {
        let received_at = self.clock.epoch_seconds();

        let message = match FeedMessage::decode(raw) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, len = raw.len(), "Undecodable feed message");
                self.stats.record_undecodable();
                return MessageOutcome::Undecodable;
            }
        };
        let signature = message.signature.clone();
        let pool = message.pool.clone();

        let event = match message.into_event(received_at) {
            Ok(event) => event,
            Err(e) => {
                // Subscription acknowledgements land here too
                tracing::debug!(error = %e, raw, "Rejected feed message");
                self.stats.record_rejected();
                return MessageOutcome::Rejected;
            }
        };

        tracing::trace!(
            mint = %event.mint(),
            kind = event.tx_type(),
            signature = signature.as_deref(),
            pool = pool.as_deref(),
            "Routing feed event"
        );

        match event {
            FeedEvent::Created { token, trade, uri } => {
                let mint = token.mint.clone();
                let inserted = match self.store.upsert_token_if_absent(&token).await {
                    Ok(inserted) => inserted,
                    Err(error) => return self.store_failed(mint, "create", error),
                };
                if inserted {
                    tracing::info!(
                        mint = %mint,
                        name = %token.name,
                        symbol = %token.symbol,
                        uri = uri.as_deref(),
                        "New token"
                    );
                }
                // The token is stored, so its trades are wanted even if the
                // raw creation record is lost
                self.reconciler.enqueue(mint.clone());
                self.stats.record_creation();
                if let Err(error) = self.store.append_trade_event(&trade).await {
                    return self.store_failed(mint, "create", error);
                }
                MessageOutcome::Created { mint, inserted }
            }
            FeedEvent::Traded(trade) => self.store_trade(trade).await,
            FeedEvent::Unrecognized { mint, tx_type } => {
                tracing::trace!(mint = %mint, kind = %tx_type, "Ignoring unrecognized kind");
                self.stats.record_ignored();
                MessageOutcome::Ignored { tx_type }
            }
        }
    }

    async fn store_trade(&self, trade: TradeEvent) -> MessageOutcome {
        match self.store.append_trade_event(&trade).await {
            Ok(()) => {
                self.stats.record_trade();
                MessageOutcome::Traded { mint: trade.mint }
            }
            Err(error) => self.store_failed(trade.mint, trade.kind.as_str(), error),
        }
    }

    fn store_failed(&self, mint: MintId, kind: &str, error: StoreError) -> MessageOutcome {
        if error.is_constraint() {
            tracing::warn!(mint = %mint, kind, error = %error, "Store rejected write");
        } else {
            tracing::error!(mint = %mint, kind, error = %error, "Store write failed");
        }
        self.stats.record_store_failure();
        MessageOutcome::StoreFailed { mint, error }
    }
}
