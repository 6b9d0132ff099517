//! DuckDB store implementation
//!
//! Provides an embedded store backed by DuckDB. Every connection handed out
//! by a [`DuckDBStore`] is a clone of one base connection, so in-memory
//! stores share a single database across connections.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{
    DataStore, DatabaseError, DatabaseResult, SqlConnection, join_statements, statement_failed,
};

/// DuckDB store
///
/// Supports both file-based persistence and in-memory mode.
pub struct DuckDBStore {
    /// Path to the database file (None for in-memory)
    db_path: Option<PathBuf>,
    /// Base connection the handed-out connections are cloned from
    base: Mutex<duckdb::Connection>,
}

impl DuckDBStore {
    /// Open a file-based DuckDB store
    ///
    /// # Arguments
    /// * `db_path` - Path to the DuckDB database file, created if missing
    pub fn new(db_path: impl AsRef<Path>) -> DatabaseResult<Self> {
        let path = db_path.as_ref().to_path_buf();
        let connection = duckdb::Connection::open(&path).map_err(|e| {
            DatabaseError::ConnectionFailed(format!("Failed to open DuckDB: {}", e))
        })?;

        tracing::debug!(path = %path.display(), "Opened DuckDB store");
        Ok(Self {
            db_path: Some(path),
            base: Mutex::new(connection),
        })
    }

    /// Create an in-memory DuckDB store
    ///
    /// Useful for testing or throwaway schemas where persistence is not needed.
    pub fn in_memory() -> DatabaseResult<Self> {
        let connection = duckdb::Connection::open_in_memory().map_err(|e| {
            DatabaseError::ConnectionFailed(format!("Failed to create in-memory DuckDB: {}", e))
        })?;

        Ok(Self {
            db_path: None,
            base: Mutex::new(connection),
        })
    }

    /// Get the database file path (None for in-memory)
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Check if this is an in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.db_path.is_none()
    }
}

impl DataStore for DuckDBStore {
    type Connection = DuckDBConnection;

    fn connect(&self) -> DatabaseResult<DuckDBConnection> {
        let base = self
            .base
            .lock()
            .map_err(|e| DatabaseError::ConnectionFailed(format!("Lock error: {}", e)))?;
        let connection = base.try_clone().map_err(|e| {
            DatabaseError::ConnectionFailed(format!("Failed to clone DuckDB connection: {}", e))
        })?;
        Ok(DuckDBConnection::new(connection))
    }

    fn backend_type(&self) -> &'static str {
        "duckdb"
    }
}

/// One DuckDB connection with a statement batch buffer.
pub struct DuckDBConnection {
    connection: duckdb::Connection,
    batch: Vec<String>,
}

impl DuckDBConnection {
    pub fn new(connection: duckdb::Connection) -> Self {
        Self {
            connection,
            batch: Vec::new(),
        }
    }

    /// Underlying DuckDB connection, for queries outside the lifecycle.
    pub fn inner(&self) -> &duckdb::Connection {
        &self.connection
    }

    /// Number of statements waiting for the next flush
    pub fn pending_batch(&self) -> usize {
        self.batch.len()
    }
}

impl SqlConnection for DuckDBConnection {
    fn execute(&mut self, sql: &str) -> DatabaseResult<()> {
        self.connection
            .execute_batch(sql)
            .map_err(|e| statement_failed(sql, e))
    }

    fn supports_batch_updates(&self) -> bool {
        true
    }

    fn add_batch(&mut self, sql: &str) -> DatabaseResult<()> {
        self.batch.push(sql.to_string());
        Ok(())
    }

    fn execute_batch(&mut self) -> DatabaseResult<()> {
        let statements = std::mem::take(&mut self.batch);
        if statements.is_empty() {
            return Ok(());
        }
        let sql = join_statements(&statements);
        self.connection
            .execute_batch(&sql)
            .map_err(|e| statement_failed(&sql, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{CreateDatabase, Database};
    use crate::import::TextSource;

    fn count(conn: &DuckDBConnection, sql: &str) -> i64 {
        conn.inner().query_row(sql, [], |row| row.get(0)).unwrap()
    }

    #[test]
    fn test_in_memory_store() {
        let store = DuckDBStore::in_memory().unwrap();
        assert!(store.is_in_memory());
        assert!(store.db_path().is_none());
        assert_eq!(store.backend_type(), "duckdb");
    }

    #[test]
    fn test_connections_share_in_memory_database() {
        let store = DuckDBStore::in_memory().unwrap();
        let mut first = store.connect().unwrap();
        first.execute("CREATE TABLE shared (id integer)").unwrap();
        first.execute("INSERT INTO shared VALUES (1), (2)").unwrap();

        let second = store.connect().unwrap();
        assert_eq!(count(&second, "SELECT count(*) FROM shared"), 2);
    }

    #[test]
    fn test_builtin_create_and_drop() {
        let store = DuckDBStore::in_memory().unwrap();
        let mut conn = store.connect().unwrap();
        let db = Database::builtin();

        assert!(db.create(&mut conn));
        assert_eq!(count(&conn, "SELECT count(*) FROM Motivation"), 5);
        assert_eq!(count(&conn, "SELECT count(*) FROM MotivationSummary"), 5);

        // recreating starts from an empty schema again
        assert!(db.create(&mut conn));
        assert_eq!(count(&conn, "SELECT count(*) FROM Motivation"), 5);

        assert!(db.drop(&mut conn));
        assert!(conn.inner().prepare("SELECT * FROM Motivation").is_err());
    }

    #[test]
    fn test_failed_create_is_rolled_back() {
        let store = DuckDBStore::in_memory().unwrap();
        let mut conn = store.connect().unwrap();
        let db = Database::from_sources([
            TextSource::new("good.sql", "CREATE TABLE IF NOT EXISTS Good (\n id integer\n);\n"),
            TextSource::new("bad.sql", "CREATE TABLE IF NOT EXISTS Bad (\n id no_such_type\n);\n"),
        ]);

        assert!(!db.create(&mut conn));
        assert!(conn.inner().prepare("SELECT * FROM Good").is_err());
    }

    #[test]
    fn test_batch_bootstrap() {
        let dir = tempfile::tempdir().unwrap();
        let store = DuckDBStore::new(dir.path().join("bootstrap.duckdb")).unwrap();
        let bootstrap = CreateDatabase::from_database(&Database::builtin()).unwrap();

        assert!(bootstrap.create_database(&store));

        let conn = store.connect().unwrap();
        assert_eq!(count(&conn, "SELECT count(*) FROM Motivation"), 5);
        assert_eq!(count(&conn, "SELECT count(*) FROM Person"), 0);
    }

    #[test]
    fn test_batch_failure_reports_false() {
        let store = DuckDBStore::in_memory().unwrap();
        let bootstrap = CreateDatabase::new(
            vec!["CREATE TABLE IF NOT EXISTS Skill (id integer primary key)".to_string()],
            vec![],
            vec!["INSERT INTO Missing (id) VALUES (1)".to_string()],
        )
        .unwrap();

        assert!(!bootstrap.create_database(&store));
        let conn = store.connect().unwrap();
        assert_eq!(count(&conn, "SELECT count(*) FROM Skill"), 0);
    }
}
