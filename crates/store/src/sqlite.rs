use async_trait::async_trait;
use parking_lot::Mutex;
use pumpstream_core::{MintId, Token, TradeEvent, TradeKind};
use pumpstream_ports::{EventStore, StoreError, StoreResult};
use rusqlite::{Connection, ErrorCode, OpenFlags, OptionalExtension, Row, params};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::schema;

/// SQLite-backed event store
///
/// One connection guarded by a mutex; every call runs on tokio's blocking
/// pool and commits before returning (autocommit, one statement per call).
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    /// `None` for in-memory databases
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (creating if needed) a database file
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(|e| StoreError::Schema(format!("open {}: {e}", path.display())))?;
        Self::configure(&conn)?;

        tracing::info!(path = %path.display(), "Opened token store");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path),
        })
    }

    /// Private in-memory database, gone when the last clone drops
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Schema(e.to_string()))?;
        Self::configure(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn configure(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(schema::CONNECTION_PRAGMAS)
            .map_err(|e| StoreError::Schema(e.to_string()))
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Storage(format!("store task failed: {e}")))?
    }

    fn size_of(conn: &Connection, path: Option<&Path>) -> u64 {
        let pages: i64 = conn
            .query_row("PRAGMA page_count", [], |row| row.get(0))
            .unwrap_or(0);
        let page_size: i64 = conn
            .query_row("PRAGMA page_size", [], |row| row.get(0))
            .unwrap_or(0);
        let main = u64::try_from(pages.saturating_mul(page_size)).unwrap_or(0);

        // Committed pages not yet checkpointed live in the -wal file
        let wal = path
            .and_then(|p| {
                let mut wal = p.as_os_str().to_owned();
                wal.push("-wal");
                std::fs::metadata(PathBuf::from(wal)).ok()
            })
            .map(|m| m.len())
            .unwrap_or(0);

        main + wal
    }
}

/// Map a rusqlite error, singling out constraint violations
fn map_err(e: rusqlite::Error) -> StoreError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
            StoreError::Constraint(e.to_string())
        }
        _ => StoreError::Storage(e.to_string()),
    }
}

fn token_from_row(row: &Row<'_>) -> rusqlite::Result<Token> {
    Ok(Token {
        mint: MintId::new(row.get::<_, String>(0)?),
        discovered_at: row.get::<_, Option<i64>>(1)?.unwrap_or(0),
        initial_liquidity: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
        name: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        symbol: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
    })
}

fn trade_from_row(row: &Row<'_>) -> rusqlite::Result<TradeEvent> {
    let kind: Option<String> = row.get(3)?;
    let kind = kind
        .as_deref()
        .and_then(TradeKind::from_wire)
        .ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                format!("unknown tx_type {kind:?}").into(),
            )
        })?;

    Ok(TradeEvent {
        mint: MintId::new(row.get::<_, String>(0)?),
        received_at: row.get(1)?,
        trader: row.get(2)?,
        kind,
        token_amount: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
        sol_amount: row.get::<_, Option<f64>>(5)?.unwrap_or(0.0),
        new_token_balance: row.get::<_, Option<f64>>(6)?.unwrap_or(0.0),
        bonding_curve_key: row.get(7)?,
        curve_token_reserve: row.get::<_, Option<f64>>(8)?.unwrap_or(0.0),
        curve_sol_reserve: row.get::<_, Option<f64>>(9)?.unwrap_or(0.0),
        market_cap_sol: row.get::<_, Option<f64>>(10)?.unwrap_or(0.0),
    })
}

#[async_trait]
impl EventStore for SqliteStore {
    async fn initialize(&self) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute_batch(schema::CREATE_SCHEMA)
                .map_err(|e| StoreError::Schema(e.to_string()))
        })
        .await
    }

    async fn upsert_token_if_absent(&self, token: &Token) -> StoreResult<bool> {
        let token = token.clone();
        self.with_conn(move |conn| {
            let changed = conn
                .execute(
                    schema::INSERT_TOKEN,
                    params![
                        token.mint.as_str(),
                        token.discovered_at,
                        token.initial_liquidity,
                        token.name,
                        token.symbol,
                    ],
                )
                .map_err(map_err)?;
            Ok(changed == 1)
        })
        .await
    }

    async fn append_trade_event(&self, event: &TradeEvent) -> StoreResult<()> {
        let event = event.clone();
        self.with_conn(move |conn| {
            conn.execute(
                schema::INSERT_TRADE,
                params![
                    event.mint.as_str(),
                    event.received_at,
                    event.trader,
                    event.kind.as_str(),
                    event.token_amount,
                    event.sol_amount,
                    event.new_token_balance,
                    event.bonding_curve_key,
                    event.curve_token_reserve,
                    event.curve_sol_reserve,
                    event.market_cap_sol,
                ],
            )
            .map_err(map_err)?;
            Ok(())
        })
        .await
    }

    async fn list_all_mints(&self) -> StoreResult<Vec<MintId>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT mint FROM tokens").map_err(map_err)?;
            let mints = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(map_err)?
                .map(|r| r.map(MintId::new))
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_err)?;
            Ok(mints)
        })
        .await
    }

    async fn size_on_disk(&self) -> u64 {
        let path = self.path.clone();
        self.with_conn(move |conn| Ok(Self::size_of(conn, path.as_deref())))
            .await
            .unwrap_or(0)
    }

    async fn find_token(&self, mint: &MintId) -> StoreResult<Option<Token>> {
        let mint = mint.clone();
        self.with_conn(move |conn| {
            conn.query_row(schema::SELECT_TOKEN, params![mint.as_str()], token_from_row)
                .optional()
                .map_err(map_err)
        })
        .await
    }

    async fn trade_events_for(&self, mint: &MintId) -> StoreResult<Vec<TradeEvent>> {
        let mint = mint.clone();
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(schema::SELECT_TRADES_FOR_MINT)
                .map_err(map_err)?;
            let events = stmt
                .query_map(params![mint.as_str()], trade_from_row)
                .map_err(map_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_err)?;
            Ok(events)
        })
        .await
    }

    async fn token_count(&self) -> StoreResult<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM tokens", [], |row| row.get(0))
                .map_err(map_err)?;
            Ok(u64::try_from(count).unwrap_or(0))
        })
        .await
    }
}
