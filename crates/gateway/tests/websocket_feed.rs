//! Supervisor and reconciler against a real WebSocket endpoint
//!
//! A local tokio-tungstenite server plays the feed: it records every
//! subscribe command per connection and pushes scripted frames.

use futures_util::{SinkExt, StreamExt};
use pumpstream_core::{MintId, SubscribeCommand, Token};
use pumpstream_gateway::{
    Backoff, ConnectionState, ConnectionSupervisor, FeedConnector, LinkEvent, Outbound,
    ReconcilerConfig, SubscriptionReconciler, TransportError, WsConnector,
};
use pumpstream_ports::EventStore;
use pumpstream_store::SqliteStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// Commands received on one server-side connection
type Session = mpsc::UnboundedReceiver<SubscribeCommand>;

/// Accept connections forever. Each connection reports its commands on a
/// fresh channel; after `replay_len` commands the server pushes `frames`
/// and then closes the connection.
async fn spawn_feed(
    replay_len: usize,
    frames: Vec<String>,
) -> (String, mpsc::UnboundedReceiver<Session>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (sessions_tx, sessions_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let frames = frames.clone();
            let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
            if sessions_tx.send(cmd_rx).is_err() {
                return;
            }

            tokio::spawn(async move {
                let mut ws = accept_async(stream).await.unwrap();
                let mut seen = 0;
                while seen < replay_len {
                    match ws.next().await {
                        Some(Ok(Message::Text(text))) => {
                            let cmd: SubscribeCommand = serde_json::from_str(&text).unwrap();
                            let _ = cmd_tx.send(cmd);
                            seen += 1;
                        }
                        Some(Ok(_)) => continue,
                        _ => return,
                    }
                }
                for frame in frames {
                    ws.send(Message::Text(frame.into())).await.unwrap();
                }
                let _ = ws.close(None).await;
            });
        }
    });

    (format!("ws://{addr}"), sessions_rx)
}

async fn collect(session: &mut Session, n: usize) -> Vec<SubscribeCommand> {
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let cmd = tokio::time::timeout(Duration::from_secs(5), session.recv())
            .await
            .expect("timed out waiting for command")
            .expect("session ended");
        out.push(cmd);
    }
    out
}

#[tokio::test]
async fn test_ws_connector_round_trip() {
    let (url, mut sessions) = spawn_feed(1, vec![r#"{"mint":"A","txType":"buy"}"#.into()]).await;
    let connector = WsConnector::new(url.clone());
    assert_eq!(connector.endpoint(), url);

    let mut link = connector.connect().await.unwrap();
    link.outbound
        .send(Outbound::Text(SubscribeCommand::new_tokens().to_json().unwrap()))
        .await
        .unwrap();

    let mut session = sessions.recv().await.unwrap();
    assert_eq!(collect(&mut session, 1).await, vec![SubscribeCommand::new_tokens()]);

    assert_eq!(
        link.inbound.recv().await,
        Some(LinkEvent::Text(r#"{"mint":"A","txType":"buy"}"#.into()))
    );
    assert_eq!(link.inbound.recv().await, Some(LinkEvent::Closed));
}

#[tokio::test]
async fn test_ws_connector_refused() {
    // Bind then drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let connector = WsConnector::new(format!("ws://{addr}"));
    assert!(matches!(
        connector.connect().await,
        Err(TransportError::Connect(_))
    ));
}

#[tokio::test]
async fn test_reconnect_replays_known_mints() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.initialize().await.unwrap();
    for mint in ["A", "B"] {
        store.upsert_token_if_absent(&Token::new(mint, 1)).await.unwrap();
    }
    let store = Arc::new(store);

    // Creation stream plus A and B, then one frame and a close
    let (url, mut sessions) = spawn_feed(3, vec!["hello".into()]).await;

    let mut supervisor = ConnectionSupervisor::new(
        WsConnector::new(url),
        Backoff::new(Duration::from_millis(10), Duration::from_millis(100)),
    );
    let reconciler = Arc::new(SubscriptionReconciler::new(
        supervisor.sender(),
        store.clone(),
        ReconcilerConfig::default(),
    ));
    supervisor.add_observer(reconciler.clone());

    supervisor.connect().await;
    assert_eq!(supervisor.state(), ConnectionState::Connected);

    let mut first = sessions.recv().await.unwrap();
    let replay = collect(&mut first, 3).await;
    assert_eq!(replay[0], SubscribeCommand::new_tokens());
    assert_eq!(reconciler.subscribed_count(), 2);

    assert_eq!(supervisor.receive().await.unwrap(), "hello");
    assert!(matches!(
        supervisor.receive().await,
        Err(TransportError::ConnectionClosed)
    ));

    // A mint discovered while the old link was up is replayed too
    store.upsert_token_if_absent(&Token::new("C", 2)).await.unwrap();
    supervisor.connect().await;

    let mut second = sessions.recv().await.unwrap();
    let replay = collect(&mut second, 3).await;
    assert_eq!(replay[0], SubscribeCommand::new_tokens());
    let mut keys: Vec<String> = replay[1..].iter().flat_map(|c| c.keys().to_vec()).collect();
    keys.sort();
    assert_eq!(keys.len(), 2);
    assert!(reconciler.is_subscribed(&MintId::new("C")));
    assert_eq!(reconciler.subscribed_count(), 3);
    assert_eq!(supervisor.connection_count(), 2);
}

#[tokio::test]
async fn test_non_utf8_binary_frame_reaches_the_reader() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::Binary(vec![0xff, 0xfe, b'{'].into())).await.unwrap();
        ws.send(Message::Binary(br#"{"mint":"A"}"#.to_vec().into())).await.unwrap();
        let _ = ws.close(None).await;
    });

    let mut link = WsConnector::new(format!("ws://{addr}")).connect().await.unwrap();
    assert_eq!(
        link.inbound.recv().await,
        Some(LinkEvent::Text("\u{fffd}\u{fffd}{".into()))
    );
    assert_eq!(
        link.inbound.recv().await,
        Some(LinkEvent::Text(r#"{"mint":"A"}"#.into()))
    );
}
