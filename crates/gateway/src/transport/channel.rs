//! Tokio channel-based connector for single-process mode
//!
//! Each successful `connect()` hands the far end of the new link, a
//! [`RemoteFeed`], to whoever holds the receiver returned by
//! [`ChannelConnector::new`]. Used to play the feed in tests and replays.

use crate::error::TransportError;
use crate::transport::{FeedConnector, FeedLink, LinkEvent, Outbound};
use async_trait::async_trait;
use pumpstream_core::SubscribeCommand;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::mpsc;

const DEFAULT_LINK_CAPACITY: usize = 1024;

/// Connector producing in-process links
pub struct ChannelConnector {
    remotes: mpsc::UnboundedSender<RemoteFeed>,
    failures_remaining: AtomicU32,
    attempts: AtomicU32,
    link_capacity: usize,
}

impl ChannelConnector {
    /// Create a connector and the receiver of the far ends of its links
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RemoteFeed>) {
        let (remotes, rx) = mpsc::unbounded_channel();
        (
            Self {
                remotes,
                failures_remaining: AtomicU32::new(0),
                attempts: AtomicU32::new(0),
                link_capacity: DEFAULT_LINK_CAPACITY,
            },
            rx,
        )
    }

    /// Buffer at most `capacity` frames each way on every link. A full
    /// outbound buffer blocks the sender until the far end reads.
    pub fn with_link_capacity(mut self, capacity: usize) -> Self {
        self.link_capacity = capacity.max(1);
        self
    }

    /// Make the next `n` connection attempts fail
    pub fn fail_next(&self, n: u32) {
        self.failures_remaining.store(n, Ordering::SeqCst);
    }

    /// Total connection attempts, failed or not
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedConnector for ChannelConnector {
    async fn connect(&self) -> Result<FeedLink, TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let scripted_failure = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if scripted_failure {
            return Err(TransportError::Connect("refused".to_string()));
        }

        let (outbound_tx, outbound_rx) = mpsc::channel(self.link_capacity);
        let (inbound_tx, inbound_rx) = mpsc::channel(self.link_capacity);

        self.remotes
            .send(RemoteFeed {
                outbound: outbound_rx,
                inbound: inbound_tx,
            })
            .map_err(|_| TransportError::Connect("no remote end listening".to_string()))?;

        Ok(FeedLink {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }

    fn endpoint(&self) -> &str {
        "channel://in-process"
    }
}

/// Far end of an in-process link
///
/// Dropping it closes the link as seen by the supervisor.
pub struct RemoteFeed {
    outbound: mpsc::Receiver<Outbound>,
    inbound: mpsc::Sender<LinkEvent>,
}

impl RemoteFeed {
    /// Deliver a text frame to the supervisor
    pub async fn push(&self, text: impl Into<String>) -> Result<(), TransportError> {
        self.inbound
            .send(LinkEvent::Text(text.into()))
            .await
            .map_err(|_| TransportError::Send("link dropped".to_string()))
    }

    /// Close the link from the feed side
    pub async fn close(&self) {
        let _ = self.inbound.send(LinkEvent::Closed).await;
    }

    /// Fail the link with an error
    pub async fn fail(&self, reason: impl Into<String>) {
        let _ = self.inbound.send(LinkEvent::Error(reason.into())).await;
    }

    /// Wait for the next frame sent by the supervisor side
    pub async fn next_outbound(&mut self) -> Option<Outbound> {
        self.outbound.recv().await
    }

    /// Every frame sent so far, without waiting
    pub fn drain_outbound(&mut self) -> Vec<Outbound> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.outbound.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Every subscription command sent so far, without waiting.
    /// Frames that are not subscription commands are skipped.
    pub fn drain_commands(&mut self) -> Vec<SubscribeCommand> {
        self.drain_outbound()
            .into_iter()
            .filter_map(|frame| match frame {
                Outbound::Text(text) => serde_json::from_str(&text).ok(),
                Outbound::Close => None,
            })
            .collect()
    }
}
