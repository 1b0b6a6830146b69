//! Subscription reconciler
//!
//! Owns the subscribed set and the pending queue. Producers only `enqueue`;
//! a single background task drains the queue onto the live link. Drains,
//! replays, and the reset on disconnect serialize on one async lock, so the
//! receive loop and the drain never race on the subscribed set.
//!
//! Between a disconnect and the end of the next replay the drain is paused:
//! the first command on every link is the creation-stream subscription.

use crate::error::{GatewayError, TransportError};
use crate::supervisor::ConnectionObserver;
use crate::transport::FeedSender;
use async_trait::async_trait;
use parking_lot::Mutex;
use pumpstream_core::{MintId, SubscribeCommand};
use pumpstream_ports::EventStore;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Drain pacing
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Sleep between drains of an empty queue
    pub idle_interval: Duration,
    /// Sleep after a failed subscribe command
    pub retry_delay: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            idle_interval: Duration::from_millis(100),
            retry_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Default)]
struct SubscriptionState {
    /// Mints with a subscribe command accepted on the current link
    subscribed: HashSet<MintId>,
    /// Mints awaiting a subscribe command, oldest first
    pending: VecDeque<MintId>,
    /// Membership index of `pending`, kept until the mint is subscribed
    queued: HashSet<MintId>,
}

pub struct SubscriptionReconciler {
    sender: FeedSender,
    store: Arc<dyn EventStore>,
    config: ReconcilerConfig,
    state: Mutex<SubscriptionState>,
    drain_lock: tokio::sync::Mutex<()>,
    /// False from a disconnect until the next replay completes
    link_ready: AtomicBool,
    commands_sent: AtomicU64,
}

impl SubscriptionReconciler {
    pub fn new(sender: FeedSender, store: Arc<dyn EventStore>, config: ReconcilerConfig) -> Self {
        Self {
            sender,
            store,
            config,
            state: Mutex::new(SubscriptionState::default()),
            drain_lock: tokio::sync::Mutex::new(()),
            link_ready: AtomicBool::new(true),
            commands_sent: AtomicU64::new(0),
        }
    }

    /// Queue a mint for subscription. Returns false when it is already
    /// subscribed or already queued. Never waits.
    pub fn enqueue(&self, mint: MintId) -> bool {
        let mut state = self.state.lock();
        if state.subscribed.contains(&mint) || state.queued.contains(&mint) {
            return false;
        }
        state.queued.insert(mint.clone());
        state.pending.push_back(mint);
        true
    }

    /// Send a subscribe command for every pending mint.
    ///
    /// Stops at the first send failure, leaving that mint at the head of the
    /// queue and unmarked. Does nothing while a replay is outstanding.
    /// Returns the number of commands sent.
    pub async fn drain_pending(&self) -> Result<usize, TransportError> {
        let _guard = self.drain_lock.lock().await;
        if !self.link_ready.load(Ordering::Acquire) {
            return Ok(0);
        }
        self.drain_locked().await
    }

    async fn drain_locked(&self) -> Result<usize, TransportError> {
        let mut sent = 0;
        loop {
            let next = {
                let mut state = self.state.lock();
                match state.pending.pop_front() {
                    Some(mint) if state.subscribed.contains(&mint) => {
                        state.queued.remove(&mint);
                        continue;
                    }
                    other => other,
                }
            };
            let Some(mint) = next else {
                return Ok(sent);
            };

            if let Err(e) = self.sender.send(&SubscribeCommand::token_trades([&mint])).await {
                let mut state = self.state.lock();
                state.pending.push_front(mint);
                return Err(e);
            }

            tracing::debug!(mint = %mint, "Subscribed to token trades");
            self.commands_sent.fetch_add(1, Ordering::Relaxed);
            sent += 1;

            let mut state = self.state.lock();
            state.queued.remove(&mint);
            state.subscribed.insert(mint);
        }
    }

    /// Subscribe to the creation stream, then to every known mint.
    ///
    /// Runs under the drain lock, so when it returns every known mint has a
    /// subscribe command on the current link.
    pub async fn replay_all(&self, known: Vec<MintId>) -> Result<usize, TransportError> {
        let _guard = self.drain_lock.lock().await;

        // Nothing is subscribed on a fresh link
        self.state.lock().subscribed.clear();
        self.sender.send(&SubscribeCommand::new_tokens()).await?;
        self.commands_sent.fetch_add(1, Ordering::Relaxed);

        let total = known.len();
        for mint in known {
            self.enqueue(mint);
        }
        let sent = self.drain_locked().await?;
        self.link_ready.store(true, Ordering::Release);

        tracing::info!(known = total, resubscribed = sent, "Replayed subscriptions");
        Ok(sent)
    }

    /// Start the background drain task
    pub fn spawn_drain(self: &Arc<Self>) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match this.drain_pending().await {
                    Ok(_) => tokio::time::sleep(this.config.idle_interval).await,
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            pending = this.pending_count(),
                            "Subscribe command failed, backing off"
                        );
                        tokio::time::sleep(this.config.retry_delay).await;
                    }
                }
            }
        })
    }

    pub fn subscribed_count(&self) -> usize {
        self.state.lock().subscribed.len()
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn is_subscribed(&self, mint: &MintId) -> bool {
        self.state.lock().subscribed.contains(mint)
    }

    /// Subscribe commands accepted by a link since creation, creation stream
    /// included
    pub fn commands_sent(&self) -> u64 {
        self.commands_sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ConnectionObserver for SubscriptionReconciler {
    async fn on_connected(&self) -> Result<(), GatewayError> {
        let known = self
            .store
            .list_all_mints()
            .await
            .map_err(|e| GatewayError::Replay(e.to_string()))?;
        self.replay_all(known).await?;
        Ok(())
    }

    /// Subscriptions die with the link
    async fn on_disconnected(&self) {
        let _guard = self.drain_lock.lock().await;
        self.link_ready.store(false, Ordering::Release);
        let mut state = self.state.lock();
        let dropped = state.subscribed.len();
        state.subscribed.clear();
        tracing::debug!(dropped, "Cleared subscribed set");
    }
}
