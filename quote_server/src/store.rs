//! SQLite persistence for fetched quotes.
//!
//! Each `save` opens its own connection, makes sure the `exchanges` table
//! exists and appends one row per quote entry, all within the persist budget.
//! The budget starts when `save` is called. SQLite work is blocking, so it runs
//! on the blocking pool; when the budget elapses the connection is interrupted
//! so the running statement aborts instead of finishing in the background.
//!
//! Rows are written one by one without a transaction: a failure stops the loop
//! and rows already written stay in the table.
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, info};
use quote_common::{CurrencyQuote, Quote, QuoteError, Result, Stage};
use rusqlite::{Connection, ErrorCode, InterruptHandle, params};
use tokio::sync::oneshot;

/// Destination for quotes once they have been sent to the caller.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Persist every entry of `quote`.
    async fn save(&self, quote: &Quote) -> Result<()>;
}

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS exchanges (
        code TEXT,
        codein TEXT,
        name TEXT,
        high TEXT,
        low TEXT,
        varBid TEXT,
        pctChange TEXT,
        bid TEXT,
        ask TEXT,
        timestamp TEXT,
        create_date TEXT
    )
"#;

const INSERT_ROW: &str = r#"
    INSERT INTO exchanges
        (code, codein, name, high, low, varBid, pctChange, bid, ask, timestamp, create_date)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
"#;

/// `QuoteStore` writing into a SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteQuoteStore {
    path: PathBuf,
    budget: Duration,
}

impl SqliteQuoteStore {
    /// Store writing to the database at `path`, bounded by `budget` per call.
    pub fn new(path: impl Into<PathBuf>, budget: Duration) -> Self {
        Self { path: path.into(), budget }
    }

    /// Database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl QuoteStore for SqliteQuoteStore {
    async fn save(&self, quote: &Quote) -> Result<()> {
        let budget = self.budget;
        let deadline = Instant::now() + budget;
        let path = self.path.clone();
        let rows: Vec<CurrencyQuote> = quote.iter().map(|(_, q)| q.clone()).collect();
        let (handle_tx, mut handle_rx) = oneshot::channel::<InterruptHandle>();

        let task = tokio::task::spawn_blocking(move || {
            let conn = open(&path, deadline, budget)?;
            let _ = handle_tx.send(conn.get_interrupt_handle());
            ensure_schema(&conn).map_err(|e| classify(e, deadline, budget, QuoteError::Schema))?;
            insert_rows(&conn, &rows, deadline, budget)
        });

        match tokio::time::timeout(budget, task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join)) => Err(QuoteError::Task(join.to_string())),
            Err(_) => {
                if let Ok(handle) = handle_rx.try_recv() {
                    handle.interrupt();
                }
                Err(QuoteError::deadline(Stage::Persist, budget))
            }
        }
    }
}

fn open(path: &Path, deadline: Instant, budget: Duration) -> Result<Connection> {
    let conn = Connection::open(path).map_err(|e| QuoteError::Connection(e.to_string()))?;
    // Lock waits may not outlive the budget.
    let remaining = deadline.saturating_duration_since(Instant::now());
    conn.busy_timeout(remaining)
        .map_err(|e| classify(e, deadline, budget, QuoteError::Connection))?;
    Ok(conn)
}

/// Create the `exchanges` table unless it already exists.
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_TABLE)
}

fn insert_rows(conn: &Connection, rows: &[CurrencyQuote], deadline: Instant, budget: Duration) -> Result<()> {
    let mut stmt = conn
        .prepare(INSERT_ROW)
        .map_err(|e| classify(e, deadline, budget, QuoteError::Write))?;

    for (written, q) in rows.iter().enumerate() {
        if Instant::now() >= deadline {
            return Err(QuoteError::deadline(Stage::Persist, budget));
        }
        stmt.execute(params![
            q.code,
            q.codein,
            q.name,
            q.high,
            q.low,
            q.var_bid,
            q.pct_change,
            q.bid,
            q.ask,
            q.timestamp,
            q.create_date,
        ])
        .map_err(|e| {
            debug!("Row {} of {} failed: {}", written + 1, rows.len(), e);
            classify(e, deadline, budget, QuoteError::Write)
        })?;
    }
    info!("Persisted {} quote rows", rows.len());
    Ok(())
}

/// Map a SQLite error: interruption, lock contention or anything past the
/// deadline is the budget elapsing; the rest is `fallback`.
fn classify(
    err: rusqlite::Error,
    deadline: Instant,
    budget: Duration,
    fallback: fn(String) -> QuoteError,
) -> QuoteError {
    let timed_out = matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::OperationInterrupted | ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    );
    if timed_out || Instant::now() >= deadline {
        QuoteError::deadline(Stage::Persist, budget)
    } else {
        fallback(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_support::sample_quote;

    fn row_count(conn: &Connection) -> rusqlite::Result<i64> {
        conn.query_row("SELECT COUNT(*) FROM exchanges", [], |row| row.get(0))
    }

    fn store_in(dir: &tempfile::TempDir, budget_ms: u64) -> SqliteQuoteStore {
        SqliteQuoteStore::new(dir.path().join("exchanges.db"), Duration::from_millis(budget_ms))
    }

    #[tokio::test]
    async fn persists_one_row_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, 2_000);
        let quote = sample_quote(&["EURBRL", "USDBRL", "GBPBRL"]);

        store.save(&quote).await.unwrap();

        let conn = Connection::open(store.path()).unwrap();
        assert_eq!(row_count(&conn).unwrap(), 3);
        let bid: String = conn
            .query_row("SELECT bid FROM exchanges WHERE code = 'USD'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(bid, "5.43");
    }

    #[tokio::test]
    async fn appends_on_every_call() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, 2_000);
        let quote = sample_quote(&["USDBRL"]);

        store.save(&quote).await.unwrap();
        store.save(&quote).await.unwrap();

        let conn = Connection::open(store.path()).unwrap();
        assert_eq!(row_count(&conn).unwrap(), 2);
    }

    #[test]
    fn ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'exchanges'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
        assert_eq!(row_count(&conn).unwrap(), 0);
    }

    #[tokio::test]
    async fn stops_at_first_failing_row() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, 2_000);
        {
            let conn = Connection::open(store.path()).unwrap();
            ensure_schema(&conn).unwrap();
            conn.execute_batch(
                "CREATE TRIGGER reject_eur BEFORE INSERT ON exchanges
                 WHEN NEW.code = 'EUR'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();
        }
        // Written in pair-code order: AUDBRL, EURBRL (fails), USDBRL.
        let quote = sample_quote(&["USDBRL", "EURBRL", "AUDBRL"]);

        let err = store.save(&quote).await.unwrap_err();
        assert!(matches!(err, QuoteError::Write(_)), "{:?}", err);

        let conn = Connection::open(store.path()).unwrap();
        assert_eq!(row_count(&conn).unwrap(), 1);
        let code: String = conn.query_row("SELECT code FROM exchanges", [], |row| row.get(0)).unwrap();
        assert_eq!(code, "AUD");
    }

    #[tokio::test]
    async fn unreachable_database_is_a_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteQuoteStore::new(
            dir.path().join("missing").join("exchanges.db"),
            Duration::from_millis(2_000),
        );

        let err = store.save(&sample_quote(&["USDBRL"])).await.unwrap_err();
        assert!(matches!(err, QuoteError::Connection(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn locked_database_exceeds_persist_budget() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, 50);
        let holder = Connection::open(store.path()).unwrap();
        ensure_schema(&holder).unwrap();
        holder.execute_batch("BEGIN EXCLUSIVE").unwrap();

        let started = Instant::now();
        let err = store.save(&sample_quote(&["USDBRL"])).await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, QuoteError::DeadlineExceeded { stage: Stage::Persist, .. }), "{:?}", err);
        assert!(elapsed < Duration::from_millis(50 + 450), "took {:?}", elapsed);

        holder.execute_batch("ROLLBACK").unwrap();
        assert_eq!(row_count(&holder).unwrap(), 0);
    }
}
