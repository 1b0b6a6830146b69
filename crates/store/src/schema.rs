//! Schema and connection settings

/// Applied on every connection open. Foreign keys are a per-connection
/// setting in SQLite.
pub(crate) const CONNECTION_PRAGMAS: &str = r#"
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
    PRAGMA foreign_keys = ON;
"#;

pub(crate) const CREATE_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS tokens (
        mint TEXT PRIMARY KEY,
        timestamp INTEGER,
        initial_sol_liquidity REAL,
        name TEXT,
        symbol TEXT
    );

    CREATE TABLE IF NOT EXISTS raw_txs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        mint TEXT NOT NULL,
        timestamp INTEGER NOT NULL,
        traderPublicKey TEXT,
        tx_type TEXT,
        token_amount REAL,
        sol_amount REAL,
        new_token_balance REAL,
        bondingCurveKey TEXT,
        vTokensInBondingCurve REAL,
        vSolInBondingCurve REAL,
        marketCapSol REAL,
        FOREIGN KEY(mint) REFERENCES tokens(mint)
    );

    CREATE INDEX IF NOT EXISTS idx_raw_txs_mint ON raw_txs(mint);
"#;

pub(crate) const INSERT_TOKEN: &str = "INSERT OR IGNORE INTO tokens
    (mint, timestamp, initial_sol_liquidity, name, symbol)
    VALUES (?1, ?2, ?3, ?4, ?5)";

pub(crate) const INSERT_TRADE: &str = "INSERT INTO raw_txs
    (mint, timestamp, traderPublicKey, tx_type, token_amount, sol_amount,
     new_token_balance, bondingCurveKey, vTokensInBondingCurve,
     vSolInBondingCurve, marketCapSol)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)";

pub(crate) const SELECT_TOKEN: &str = "SELECT mint, timestamp, initial_sol_liquidity, name, symbol
    FROM tokens WHERE mint = ?1";

pub(crate) const SELECT_TRADES_FOR_MINT: &str = "SELECT mint, timestamp, traderPublicKey, tx_type,
    token_amount, sol_amount, new_token_balance, bondingCurveKey,
    vTokensInBondingCurve, vSolInBondingCurve, marketCapSol
    FROM raw_txs WHERE mint = ?1 ORDER BY timestamp, id";
