//! Ingestion counters and the periodic stats reporter
//!
//! The ingestion loop owns an `Arc<IngestStats>` and is its only writer;
//! the reporter reads a [`StatsSnapshot`].

use pumpstream_gateway::SubscriptionReconciler;
use pumpstream_ports::EventStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub struct IngestStats {
    trades: AtomicU64,
    creations: AtomicU64,
    ignored: AtomicU64,
    rejected: AtomicU64,
    undecodable: AtomicU64,
    store_failures: AtomicU64,
    reconnects: AtomicU64,
}

/// Point-in-time copy of [`IngestStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Buy and sell events stored
    pub trades: u64,
    /// Creation messages processed
    pub creations: u64,
    /// Messages of a kind that is not stored
    pub ignored: u64,
    /// Decodable messages missing a required field
    pub rejected: u64,
    pub undecodable: u64,
    pub store_failures: u64,
    pub reconnects: u64,
}

impl IngestStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_trade(&self) {
        self.trades.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_creation(&self) {
        self.creations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_undecodable(&self) {
        self.undecodable.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_failure(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            trades: self.trades.load(Ordering::Relaxed),
            creations: self.creations.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            undecodable: self.undecodable.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
        }
    }
}

/// One line of the periodic report
#[derive(Debug, Clone, PartialEq)]
pub struct StatsReport {
    pub counters: StatsSnapshot,
    pub subscribed: usize,
    pub pending: usize,
    pub db_bytes: u64,
}

impl StatsReport {
    pub fn db_megabytes(&self) -> f64 {
        self.db_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Logs a [`StatsReport`] at a fixed interval
pub struct StatsReporter {
    stats: Arc<IngestStats>,
    reconciler: Arc<SubscriptionReconciler>,
    store: Arc<dyn EventStore>,
    interval: Duration,
}

impl StatsReporter {
    pub fn new(
        stats: Arc<IngestStats>,
        reconciler: Arc<SubscriptionReconciler>,
        store: Arc<dyn EventStore>,
        interval: Duration,
    ) -> Self {
        Self {
            stats,
            reconciler,
            store,
            interval,
        }
    }

    pub async fn report(&self) -> StatsReport {
        StatsReport {
            counters: self.stats.snapshot(),
            subscribed: self.reconciler.subscribed_count(),
            pending: self.reconciler.pending_count(),
            db_bytes: self.store.size_on_disk().await,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(self.interval).await;
                let report = self.report().await;
                tracing::info!(
                    subscribed = report.subscribed,
                    pending = report.pending,
                    trades = report.counters.trades,
                    creations = report.counters.creations,
                    rejected = report.counters.rejected,
                    undecodable = report.counters.undecodable,
                    store_failures = report.counters.store_failures,
                    reconnects = report.counters.reconnects,
                    db_mb = report.db_megabytes(),
                    "Ingestion stats"
                );
            }
        })
    }
}
