//! SQLite connection handling for the snapshot and activity stores.
//!
//! The write side of this schema is a stream of small transactions: one log
//! append followed by one snapshot upsert per step transition. A single
//! writer connection serializes those without ever tripping SQLITE_BUSY,
//! while a read-only pool serves snapshot lookups and log scans concurrently
//! under WAL. Migrations run once, on the writer, before any reader opens.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

/// Connections a reader pool may hold open at once.
const READER_CONNECTIONS: u32 = 8;

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Paired pools over one SQLite file: `writer` is the single connection all
/// mutations go through, `reader` handles everything else.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open (creating the file if needed), migrate, and return both pools.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT)
            .create_if_missing(true);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts.clone())
            .await?;

        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(READER_CONNECTIONS)
            .connect_with(opts.read_only(true))
            .await?;

        Ok(Self { reader, writer })
    }
}

/// Database URL under `ENGRAM_DATA_DIR`, or `~/.engram/engram.db` when the
/// variable is unset.
pub fn default_database_url() -> String {
    let data_dir = std::env::var("ENGRAM_DATA_DIR").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        format!("{home}/.engram")
    });
    format!("sqlite://{data_dir}/engram.db")
}
