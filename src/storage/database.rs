//! SQLite database handle

use std::path::Path;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use rusqlite::{Connection, Params};

use crate::registry::Registry;
use crate::storage::statement::CompiledStatement;
use crate::Result;

/// Shared handle over one SQLite connection.
///
/// The connection sits behind a re-entrant lock: a thread holding an open
/// transaction keeps the connection until the transaction ends, and nested
/// calls from that thread run inside it.
pub struct Database {
    conn: ReentrantMutex<Connection>,
}

impl Database {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        tracing::debug!("Opened database at {}", path.display());
        Self::from_connection(conn)
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self {
            conn: ReentrantMutex::new(conn),
        })
    }

    /// Acquire the connection for the calling thread.
    pub(crate) fn lock(&self) -> ReentrantMutexGuard<'_, Connection> {
        self.conn.lock()
    }

    /// Run `f` with exclusive use of the connection.
    pub fn with_connection<R>(&self, f: impl FnOnce(&Connection) -> Result<R>) -> Result<R> {
        let conn = self.conn.lock();
        f(&conn)
    }

    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        let conn = self.conn.lock();
        Ok(conn.execute(sql, params)?)
    }

    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(sql)?;
        Ok(())
    }

    /// Validate `sql` against the engine and warm the statement cache.
    pub fn compile(&self, sql: &str) -> Result<CompiledStatement> {
        let conn = self.conn.lock();
        CompiledStatement::compile(&conn, sql)
    }

    /// Whether the calling thread owns an open transaction.
    pub fn in_transaction(&self) -> bool {
        // try_lock only fails when another thread holds the connection
        match self.conn.try_lock() {
            Some(conn) => !conn.is_autocommit(),
            None => false,
        }
    }

    /// Run `f` inside a transaction.
    ///
    /// Commits when `f` returns `Ok`, rolls back otherwise (including on
    /// unwind). If the calling thread already owns an open transaction, `f`
    /// runs inside it and the outer owner decides the outcome.
    pub fn transaction<R>(&self, f: impl FnOnce(&Connection) -> Result<R>) -> Result<R> {
        let conn = self.conn.lock();
        if !conn.is_autocommit() {
            return f(&conn);
        }

        let guard = TransactionGuard::begin(&conn)?;
        let result = f(&conn);
        match result {
            Ok(value) => {
                guard.commit()?;
                Ok(value)
            }
            Err(e) => {
                tracing::error!("Rolling back transaction: {}", e);
                drop(guard);
                Err(e)
            }
        }
    }

    /// Create every table, index and trigger of the registry in one transaction.
    pub fn create_schema(&self, registry: &Registry) -> Result<()> {
        self.transaction(|conn| {
            for definition in registry.definitions() {
                conn.execute_batch(&definition.ddl())?;
                tracing::info!("Created table {}", definition.table_name());
            }
            Ok(())
        })
    }

    /// Check whether a table exists in the main or temp schema.
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM (SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1 \
             UNION ALL SELECT name FROM sqlite_temp_master WHERE type = 'table' AND name = ?1)",
            [table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

/// Ends the transaction it opened: commit on request, rollback on drop.
struct TransactionGuard<'a> {
    conn: &'a Connection,
    done: bool,
}

impl<'a> TransactionGuard<'a> {
    fn begin(conn: &'a Connection) -> Result<Self> {
        conn.execute_batch("BEGIN")?;
        Ok(Self { conn, done: false })
    }

    fn commit(mut self) -> Result<()> {
        self.done = true;
        // a ROLLBACK conflict policy may already have ended the transaction
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if self.done || self.conn.is_autocommit() {
            return;
        }
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            tracing::warn!("Rollback failed: {}", e);
        }
    }
}
