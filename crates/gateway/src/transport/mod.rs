//! Transport abstraction layer
//!
//! A connector produces a [`FeedLink`]: a bounded channel of outbound frames
//! and a channel of inbound events. Reader/writer tasks (or a test harness)
//! sit on the far side, so the supervisor never touches a socket directly.

pub mod channel;
pub mod websocket;

use crate::error::TransportError;
use async_trait::async_trait;
use parking_lot::RwLock;
use pumpstream_core::SubscribeCommand;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Frame sent towards the feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    /// Close the connection gracefully
    Close,
}

/// Event received from the feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Text(String),
    /// Remote closed the connection
    Closed,
    /// Connection failed; no further events follow
    Error(String),
}

/// An established connection
pub struct FeedLink {
    pub outbound: mpsc::Sender<Outbound>,
    pub inbound: mpsc::Receiver<LinkEvent>,
}

/// Connector - establishes connections to the feed endpoint
#[async_trait]
pub trait FeedConnector: Send + Sync {
    /// Attempt a single connection
    async fn connect(&self) -> Result<FeedLink, TransportError>;

    /// Endpoint description for logging
    fn endpoint(&self) -> &str;
}

/// Cloneable send handle onto whatever link is currently live
///
/// The supervisor attaches a link's outbound channel when it connects and
/// detaches it when the link is lost; sending in between fails with
/// `TransportError::NotConnected`. Nothing is buffered across links.
#[derive(Clone, Default)]
pub struct FeedSender {
    current: Arc<RwLock<Option<mpsc::Sender<Outbound>>>>,
}

impl FeedSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn attach(&self, tx: mpsc::Sender<Outbound>) {
        *self.current.write() = Some(tx);
    }

    pub(crate) fn detach(&self) -> Option<mpsc::Sender<Outbound>> {
        self.current.write().take()
    }

    /// True while a link is attached and its writer is still alive
    pub fn is_connected(&self) -> bool {
        self.current
            .read()
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Serialize and send a subscription command
    pub async fn send(&self, command: &SubscribeCommand) -> Result<(), TransportError> {
        let text = command.to_json()?;
        self.send_text(text).await
    }

    pub async fn send_text(&self, text: String) -> Result<(), TransportError> {
        // Clone out of the lock; never hold it across an await
        let tx = self
            .current
            .read()
            .clone()
            .ok_or(TransportError::NotConnected)?;
        tx.send(Outbound::Text(text))
            .await
            .map_err(|_| TransportError::NotConnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Ensure the connector trait is object-safe
    fn _assert_connector_object_safe(_: &dyn FeedConnector) {}

    #[tokio::test]
    async fn test_sender_without_link_is_not_connected() {
        let sender = FeedSender::new();
        assert!(!sender.is_connected());
        let err = sender
            .send(&SubscribeCommand::new_tokens())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::NotConnected));
    }

    #[tokio::test]
    async fn test_sender_forwards_to_attached_link() {
        let sender = FeedSender::new();
        let (tx, mut rx) = mpsc::channel(4);
        sender.attach(tx);

        sender.send(&SubscribeCommand::new_tokens()).await.unwrap();
        assert_eq!(
            rx.recv().await,
            Some(Outbound::Text(r#"{"method":"subscribeNewToken"}"#.to_string()))
        );

        sender.detach();
        assert!(!sender.is_connected());
        assert!(sender.send_text("x".into()).await.is_err());
    }

    #[tokio::test]
    async fn test_sender_detects_dead_writer() {
        let sender = FeedSender::new();
        let (tx, rx) = mpsc::channel(4);
        sender.attach(tx);
        drop(rx);

        assert!(!sender.is_connected());
        assert!(matches!(
            sender.send_text("x".into()).await,
            Err(TransportError::NotConnected)
        ));
    }
}
