//! End-to-end ingestion over an in-process feed
//!
//! The `ChannelConnector` hands each new link's far end to the test, which
//! plays the feed: it reads the subscribe commands and pushes frames.

use pumpstream_clock::ManualClock;
use pumpstream_core::{MintId, SubscribeCommand, TradeKind};
use pumpstream_gateway::{
    Backoff, ChannelConnector, ConnectionSupervisor, ReconcilerConfig, RemoteFeed,
    SubscriptionReconciler,
};
use pumpstream_ports::{EventStore, StoreError};
use pumpstream_runner::{IngestStats, IngestionLoop, MessageOutcome};
use pumpstream_store::SqliteStore;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

const CREATE_ABC: &str = r#"{"mint":"ABC","txType":"create","name":"Foo","symbol":"FOO","initialBuy":5}"#;

fn fast_reconciler() -> ReconcilerConfig {
    ReconcilerConfig {
        idle_interval: Duration::from_millis(5),
        retry_delay: Duration::from_millis(20),
    }
}

async fn open_store(path: Option<&Path>) -> Arc<SqliteStore> {
    let store = match path {
        Some(path) => SqliteStore::open(path).unwrap(),
        None => SqliteStore::open_in_memory().unwrap(),
    };
    store.initialize().await.unwrap();
    Arc::new(store)
}

fn build(
    store: Arc<SqliteStore>,
) -> (
    IngestionLoop<ChannelConnector>,
    Arc<SubscriptionReconciler>,
    mpsc::UnboundedReceiver<RemoteFeed>,
) {
    let (connector, remotes) = ChannelConnector::new();
    let supervisor = ConnectionSupervisor::new(
        connector,
        Backoff::new(Duration::from_millis(10), Duration::from_millis(50)),
    );
    let reconciler = Arc::new(SubscriptionReconciler::new(
        supervisor.sender(),
        store.clone(),
        fast_reconciler(),
    ));
    let ingestion = IngestionLoop::new(
        supervisor,
        store,
        reconciler.clone(),
        Arc::new(IngestStats::new()),
        Arc::new(ManualClock::at_epoch_seconds(1_700_000_000)),
    );
    (ingestion, reconciler, remotes)
}

/// A running ingestion loop
struct Running {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<IngestionLoop<ChannelConnector>>,
    drain: JoinHandle<()>,
}

impl Running {
    fn start(
        mut ingestion: IngestionLoop<ChannelConnector>,
        reconciler: &Arc<SubscriptionReconciler>,
    ) -> Self {
        let (shutdown, rx) = oneshot::channel::<()>();
        let drain = reconciler.spawn_drain();
        let handle = tokio::spawn(async move {
            ingestion
                .run(async {
                    let _ = rx.await;
                })
                .await;
            ingestion
        });
        Self {
            shutdown,
            handle,
            drain,
        }
    }

    async fn stop(self) -> IngestionLoop<ChannelConnector> {
        let _ = self.shutdown.send(());
        self.drain.abort();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("loop did not stop")
            .unwrap()
    }
}

async fn wait_for<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..500 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

async fn next_remote(remotes: &mut mpsc::UnboundedReceiver<RemoteFeed>) -> RemoteFeed {
    tokio::time::timeout(Duration::from_secs(5), remotes.recv())
        .await
        .expect("no connection")
        .expect("connector dropped")
}

fn trade_keys(commands: &[SubscribeCommand]) -> Vec<String> {
    let mut keys: Vec<String> = commands.iter().flat_map(|c| c.keys().to_vec()).collect();
    keys.sort();
    keys
}

#[tokio::test]
async fn test_create_is_stored_and_subscribed() {
    let store = open_store(None).await;
    let (ingestion, reconciler, mut remotes) = build(store.clone());
    let running = Running::start(ingestion, &reconciler);

    let mut remote = next_remote(&mut remotes).await;
    remote.push(CREATE_ABC).await.unwrap();

    let mut seen = Vec::new();
    wait_for("ABC subscription", || {
        seen.extend(remote.drain_commands());
        let subscribed = trade_keys(&seen) == ["ABC"];
        async move { subscribed }
    })
    .await;
    assert_eq!(seen[0], SubscribeCommand::new_tokens());

    let mint = MintId::new("ABC");
    let token = store.find_token(&mint).await.unwrap().unwrap();
    assert_eq!(token.name, "Foo");
    assert_eq!(token.symbol, "FOO");
    assert_eq!(token.initial_liquidity, 5.0);
    assert_eq!(token.discovered_at, 1_700_000_000);

    let events = store.trade_events_for(&mint).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, TradeKind::Creation);

    let ingestion = running.stop().await;
    assert_eq!(ingestion.stats().snapshot().creations, 1);
    assert!(reconciler.is_subscribed(&mint));
}

#[tokio::test]
async fn test_bad_frames_do_not_stop_the_loop() {
    let store = open_store(None).await;
    let (ingestion, reconciler, mut remotes) = build(store.clone());
    let running = Running::start(ingestion, &reconciler);

    let remote = next_remote(&mut remotes).await;
    for frame in [
        "not json at all",
        r#"{"mint":"ABC","name":"no kind"}"#,
        r#"{"mint":"ABC","txType":"migrate"}"#,
        "42",
        CREATE_ABC,
    ] {
        remote.push(frame).await.unwrap();
    }

    let mint = MintId::new("ABC");
    wait_for("ABC stored", || {
        let store = store.clone();
        let mint = mint.clone();
        async move {
            store.token_count().await.unwrap() == 1
                && !store.trade_events_for(&mint).await.unwrap().is_empty()
        }
    })
    .await;

    let ingestion = running.stop().await;
    let stats = ingestion.stats().snapshot();
    assert_eq!(stats.undecodable, 2);
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.ignored, 1);
    assert_eq!(stats.creations, 1);
    assert_eq!(stats.trades, 0);
    assert_eq!(store.trade_events_for(&mint).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_trade_for_unknown_token_is_dropped() {
    let store = open_store(None).await;
    let (ingestion, _reconciler, _remotes) = build(store.clone());

    let outcome = ingestion
        .handle_message(r#"{"mint":"XYZ","txType":"buy","solAmount":1.5}"#)
        .await;

    match outcome {
        MessageOutcome::StoreFailed { mint, error } => {
            assert_eq!(mint, MintId::new("XYZ"));
            assert!(matches!(error, StoreError::Constraint(_)));
        }
        other => panic!("expected a store failure, got {other:?}"),
    }
    assert!(store.trade_events_for(&MintId::new("XYZ")).await.unwrap().is_empty());
    let stats = ingestion.stats().snapshot();
    assert_eq!(stats.store_failures, 1);
    assert_eq!(stats.trades, 0);
}

#[tokio::test]
async fn test_reconnect_replays_and_resumes() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(Some(&dir.path().join("token_data.db"))).await;
    let (ingestion, reconciler, mut remotes) = build(store.clone());
    let running = Running::start(ingestion, &reconciler);
    let mint = MintId::new("ABC");

    let first = next_remote(&mut remotes).await;
    first.push(CREATE_ABC).await.unwrap();
    first
        .push(r#"{"mint":"ABC","txType":"buy","solAmount":1.5,"tokenAmount":1000}"#)
        .await
        .unwrap();
    wait_for("first buy", || {
        let store = store.clone();
        let mint = mint.clone();
        async move { store.trade_events_for(&mint).await.unwrap().len() == 2 }
    })
    .await;

    // Drop the feed side; the loop reconnects on its own
    first.close().await;
    drop(first);

    let mut second = next_remote(&mut remotes).await;
    second
        .push(r#"{"mint":"ABC","txType":"sell","solAmount":0.5}"#)
        .await
        .unwrap();
    wait_for("sell after reconnect", || {
        let store = store.clone();
        let mint = mint.clone();
        async move { store.trade_events_for(&mint).await.unwrap().len() == 3 }
    })
    .await;

    // The replay reached the new link before the sell was read
    let replay = second.drain_commands();
    assert_eq!(replay[0], SubscribeCommand::new_tokens());
    assert_eq!(trade_keys(&replay[1..]), ["ABC"]);

    let ingestion = running.stop().await;
    let stats = ingestion.stats().snapshot();
    assert_eq!(stats.reconnects, 1);
    assert_eq!(stats.creations, 1);
    assert_eq!(stats.trades, 2);
    assert_eq!(ingestion.supervisor().connection_count(), 2);

    // Nothing lost or repeated across the reconnect
    let kinds: Vec<TradeKind> = store
        .trade_events_for(&mint)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.kind)
        .collect();
    assert_eq!(kinds, [TradeKind::Creation, TradeKind::Buy, TradeKind::Sell]);
    assert_eq!(store.token_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_restart_resubscribes_known_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token_data.db");

    {
        let store = open_store(Some(&path)).await;
        let (ingestion, reconciler, mut remotes) = build(store.clone());
        let running = Running::start(ingestion, &reconciler);
        let remote = next_remote(&mut remotes).await;
        remote.push(CREATE_ABC).await.unwrap();
        remote
            .push(r#"{"mint":"DEF","txType":"create","name":"Bar","symbol":"BAR"}"#)
            .await
            .unwrap();
        wait_for("both tokens", || {
            let store = store.clone();
            async move { store.token_count().await.unwrap() == 2 }
        })
        .await;
        running.stop().await;
    }

    // A fresh process over the same file
    let store = open_store(Some(&path)).await;
    let (ingestion, reconciler, mut remotes) = build(store.clone());
    let running = Running::start(ingestion, &reconciler);
    let mut remote = next_remote(&mut remotes).await;

    let mut seen = Vec::new();
    wait_for("replay of stored tokens", || {
        seen.extend(remote.drain_commands());
        let done = seen.len() >= 3 && reconciler.subscribed_count() == 2;
        async move { done }
    })
    .await;
    assert_eq!(seen[0], SubscribeCommand::new_tokens());
    assert_eq!(trade_keys(&seen[1..]), ["ABC", "DEF"]);
    assert_eq!(reconciler.subscribed_count(), 2);

    running.stop().await;
}

#[tokio::test]
async fn test_shutdown_closes_the_link() {
    let store = open_store(None).await;
    let (ingestion, reconciler, mut remotes) = build(store);
    let running = Running::start(ingestion, &reconciler);

    let mut remote = next_remote(&mut remotes).await;
    let ingestion = running.stop().await;

    let frames = remote.drain_outbound();
    assert_eq!(frames.last(), Some(&pumpstream_gateway::Outbound::Close));
    assert_eq!(
        ingestion.supervisor().state(),
        pumpstream_gateway::ConnectionState::Disconnected
    );
}
