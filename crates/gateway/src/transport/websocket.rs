use crate::error::TransportError;
use crate::transport::{FeedConnector, FeedLink, LinkEvent, Outbound};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// WebSocket connector for the live feed
/// Infrastructure component - handles WebSocket communication
pub struct WsConnector {
    url: String,
    connect_timeout: Duration,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        WsConnector {
            url: url.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[async_trait]
impl FeedConnector for WsConnector {
    /// Connect and spawn the reader/writer tasks for the new link
    async fn connect(&self) -> Result<FeedLink, TransportError> {
        let (ws_stream, _) = tokio::time::timeout(self.connect_timeout, connect_async(&self.url))
            .await
            .map_err(|_| TransportError::Connect(format!("timed out after {:?}", self.connect_timeout)))?
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        // Frames towards the feed
        let (out_tx, mut out_rx) = mpsc::channel::<Outbound>(256);

        // Events from the feed
        let (event_tx, event_rx) = mpsc::channel::<LinkEvent>(4096);

        // Spawn task to handle outgoing frames
        let event_tx_clone = event_tx.clone();
        tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                let result = match frame {
                    Outbound::Text(text) => write.send(Message::Text(text.into())).await,
                    Outbound::Close => {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                };

                if let Err(e) = result {
                    let _ = event_tx_clone.send(LinkEvent::Error(e.to_string())).await;
                    break;
                }
            }
        });

        // Spawn task to handle incoming frames
        tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                let event = match msg {
                    Ok(Message::Text(text)) => LinkEvent::Text(text.to_string()),
                    Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
                        Ok(text) => LinkEvent::Text(text),
                        Err(_) => {
                            // Forwarded so the reader counts it as undecodable
                            tracing::warn!(len = data.len(), "Non-UTF-8 binary frame from feed");
                            LinkEvent::Text(String::from_utf8_lossy(&data).into_owned())
                        }
                    },
                    Ok(Message::Close(frame)) => {
                        tracing::debug!(?frame, "Feed sent close frame");
                        let _ = event_tx.send(LinkEvent::Closed).await;
                        return;
                    }
                    Ok(Message::Ping(data)) => {
                        tracing::trace!("Received ping: {:?}", data);
                        continue;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        let _ = event_tx.send(LinkEvent::Error(e.to_string())).await;
                        return;
                    }
                };

                if event_tx.send(event).await.is_err() {
                    return;
                }
            }
            let _ = event_tx.send(LinkEvent::Closed).await;
        });

        Ok(FeedLink {
            outbound: out_tx,
            inbound: event_rx,
        })
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
