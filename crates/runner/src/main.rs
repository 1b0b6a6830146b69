use anyhow::Context;
use pumpstream_clock::SystemClock;
use pumpstream_gateway::{ConnectionSupervisor, SubscriptionReconciler, WsConnector};
use pumpstream_ports::EventStore;
use pumpstream_runner::{
    IngestConfig, IngestStats, IngestionLoop, StatsReporter, load_config, load_default_config,
};
use pumpstream_store::SqliteStore;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn print_help() {
    eprintln!(
        r#"pumpstream - token creation and trade feed ingestion

USAGE:
    pumpstream [OPTIONS]

OPTIONS:
    --config <PATH>     Load configuration from JSON file
    --help              Print this help message

ENVIRONMENT VARIABLES:
    PUMPSTREAM_WS_URI                       Feed endpoint (default: wss://pumpportal.fun/api/data)
    PUMPSTREAM_DB_PATH                      SQLite database file (default: token_data.db)
    PUMPSTREAM_INITIAL_RECONNECT_DELAY_MS   First reconnect delay (default: 1000)
    PUMPSTREAM_MAX_RECONNECT_DELAY_MS       Reconnect delay cap (default: 60000)
    PUMPSTREAM_STATS_INTERVAL_SECS          Stats log interval (default: 10)
    PUMPSTREAM_WRITE_BATCH_SIZE             Reserved (default: 50)
    RUST_LOG                                Log level filter

EXAMPLES:
    # Run with defaults
    pumpstream

    # Run with config file
    pumpstream --config ingest.json

    # Store somewhere else
    PUMPSTREAM_DB_PATH=/var/lib/pumpstream/tokens.db pumpstream
"#
    );
}

fn load(config_path: Option<String>) -> anyhow::Result<IngestConfig> {
    let mut config = match config_path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path);
            load_config(&path).with_context(|| format!("loading {path}"))?
        }
        None => load_default_config()?,
    };
    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Cannot listen for Ctrl-C; stop the process another way");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "pumpstream=info,pumpstream_runner=info,pumpstream_gateway=info,pumpstream_store=info"
                .into()
        }))
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
                config_path = Some(args[i].clone());
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config = load(config_path)?;
    tracing::info!(
        ws_uri = %config.ws_uri,
        db_path = %config.db_path.display(),
        "Starting pumpstream"
    );

    // wss needs a process-wide crypto provider; an error means one is already set
    let _ = rustls::crypto::ring::default_provider().install_default();

    let store = SqliteStore::open(&config.db_path)?;
    store.initialize().await.context("initializing token store")?;
    let known = store.token_count().await?;
    tracing::info!(known_tokens = known, "Token store ready");
    let store: Arc<dyn EventStore> = Arc::new(store);

    let supervisor = ConnectionSupervisor::new(WsConnector::new(&config.ws_uri), config.backoff());
    let reconciler = Arc::new(SubscriptionReconciler::new(
        supervisor.sender(),
        store.clone(),
        config.reconciler_config(),
    ));
    let stats = Arc::new(IngestStats::new());

    let drain = reconciler.spawn_drain();
    let reporter = StatsReporter::new(
        stats.clone(),
        reconciler.clone(),
        store.clone(),
        config.stats_interval(),
    )
    .spawn();

    let mut ingestion = IngestionLoop::new(
        supervisor,
        store,
        reconciler,
        stats.clone(),
        Arc::new(SystemClock::new()),
    );
    ingestion.run(shutdown_signal()).await;

    drain.abort();
    reporter.abort();

    let totals = stats.snapshot();
    tracing::info!(
        trades = totals.trades,
        creations = totals.creations,
        reconnects = totals.reconnects,
        "Stopped"
    );
    Ok(())
}
