//! Connection supervisor
//!
//! ```text
//!                connect()               link + replay ok
//! Disconnected ───────────► Connecting ───────────────────► Connected
//!      ▲                       │  │                             │
//!      │      attempt failed:  │  │                             │ closed / error
//!      │      sleep backoff    ◄──┘                             │
//!      └────────────────────────────────────────────────────────┘
//! ```
//!
//! `connect()` never gives up. Observers (the subscription reconciler) run on
//! every new link before `connect()` returns, so the caller never reads from a
//! link whose subscriptions have not been replayed.

use crate::backoff::Backoff;
use crate::error::{GatewayError, TransportError};
use crate::transport::{FeedConnector, FeedSender, LinkEvent, Outbound};
use async_trait::async_trait;
use pumpstream_core::SubscribeCommand;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Lifecycle state of the live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Hook run around connection changes
#[async_trait]
pub trait ConnectionObserver: Send + Sync {
    /// Runs on every established link before it is handed to the reader.
    /// An error fails the attempt and sends the supervisor back to backoff.
    async fn on_connected(&self) -> Result<(), GatewayError>;

    /// Runs before each new connection is attempted, and after a link is
    /// abandoned because `on_connected` failed on it
    async fn on_disconnected(&self) {}
}

/// Owns the live feed connection
pub struct ConnectionSupervisor<C: FeedConnector> {
    connector: C,
    backoff: Backoff,
    sender: FeedSender,
    inbound: Option<mpsc::Receiver<LinkEvent>>,
    state: ConnectionState,
    observers: Vec<Arc<dyn ConnectionObserver>>,
    /// Successful connections since creation
    connections: u64,
}

impl<C: FeedConnector> ConnectionSupervisor<C> {
    pub fn new(connector: C, backoff: Backoff) -> Self {
        Self {
            connector,
            backoff,
            sender: FeedSender::new(),
            inbound: None,
            state: ConnectionState::Disconnected,
            observers: Vec::new(),
            connections: 0,
        }
    }

    /// Use an existing send handle (shared with components built earlier)
    pub fn with_sender(mut self, sender: FeedSender) -> Self {
        self.sender = sender;
        self
    }

    pub fn add_observer(&mut self, observer: Arc<dyn ConnectionObserver>) {
        self.observers.push(observer);
    }

    /// Send handle onto the live link, for components that send on their own
    pub fn sender(&self) -> FeedSender {
        self.sender.clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Consecutive failed attempts since the last success
    pub fn failed_attempts(&self) -> u32 {
        self.backoff.attempt()
    }

    pub fn connection_count(&self) -> u64 {
        self.connections
    }

    /// Connect, retrying with backoff until a link is up and every observer
    /// has run on it.
    pub async fn connect(&mut self) {
        self.drop_link();
        for observer in &self.observers {
            observer.on_disconnected().await;
        }

        loop {
            self.state = ConnectionState::Connecting;
            match self.establish().await {
                Ok(()) => {
                    self.backoff.reset();
                    self.state = ConnectionState::Connected;
                    self.connections += 1;
                    tracing::info!(
                        endpoint = self.connector.endpoint(),
                        connections = self.connections,
                        "Feed connected"
                    );
                    return;
                }
                Err(e) => {
                    self.state = ConnectionState::Disconnected;
                    let attempt = self.backoff.attempt() + 1;
                    let delay = self.backoff.next_delay();
                    tracing::warn!(
                        endpoint = self.connector.endpoint(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Connection failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn establish(&mut self) -> Result<(), GatewayError> {
        let link = self.connector.connect().await?;
        self.sender.attach(link.outbound);

        for observer in &self.observers {
            if let Err(e) = observer.on_connected().await {
                self.abandon_link().await;
                return Err(e);
            }
        }

        self.inbound = Some(link.inbound);
        Ok(())
    }

    /// Give up on a link whose replay failed. Observers are reset as for any
    /// other lost link, so the next attempt replays from scratch.
    async fn abandon_link(&mut self) {
        if let Some(tx) = self.sender.detach() {
            // A full or dead link just gets dropped
            let _ = tx.try_send(Outbound::Close);
        }
        for observer in &self.observers {
            observer.on_disconnected().await;
        }
    }

    /// Send a command on the live link. Fails when not connected; nothing is
    /// buffered for a later connection.
    pub async fn send(&self, command: &SubscribeCommand) -> Result<(), TransportError> {
        if self.state != ConnectionState::Connected {
            return Err(TransportError::NotConnected);
        }
        self.sender.send(command).await
    }

    /// Wait for the next text frame.
    ///
    /// Returns `TransportError::ConnectionClosed` once the link is gone, after
    /// which the caller is expected to `connect()` again.
    pub async fn receive(&mut self) -> Result<String, TransportError> {
        let Some(inbound) = self.inbound.as_mut() else {
            return Err(TransportError::ConnectionClosed);
        };

        match inbound.recv().await {
            Some(LinkEvent::Text(text)) => Ok(text),
            Some(LinkEvent::Error(reason)) => {
                tracing::warn!(reason = %reason, "Feed connection failed");
                self.drop_link();
                Err(TransportError::ConnectionClosed)
            }
            Some(LinkEvent::Closed) | None => {
                tracing::warn!("Feed connection closed");
                self.drop_link();
                Err(TransportError::ConnectionClosed)
            }
        }
    }

    /// Close the live link gracefully
    pub async fn close(&mut self) {
        if let Some(tx) = self.sender.detach() {
            let _ = tx.send(Outbound::Close).await;
        }
        self.inbound = None;
        self.state = ConnectionState::Disconnected;
    }

    fn drop_link(&mut self) {
        self.sender.detach();
        self.inbound = None;
        self.state = ConnectionState::Disconnected;
    }
}
