//! Store abstraction and schema executors
//!
//! This module provides:
//! - [`SqlConnection`] / [`DataStore`]: the capabilities the executors need
//!   from a relational store (statement execution, transaction boundaries,
//!   optional batching)
//! - [`Database`]: parsed SQL definitions plus the transactional
//!   create/populate/drop lifecycle
//! - [`CreateDatabase`]: batch-or-sequential bootstrap from literal command lists
//! - DuckDB and PostgreSQL stores behind feature flags

use std::fmt;
use std::sync::Arc;

pub mod batch;
pub mod schema;

#[cfg(feature = "database")]
pub mod config;

#[cfg(feature = "duckdb-backend")]
pub mod duckdb;

#[cfg(feature = "postgres-backend")]
pub mod postgres;

pub use batch::{CreateDatabase, CreateDatabaseBuilder};
pub use schema::{Database, PopulateOutcome};

#[cfg(feature = "database")]
pub use config::DatabaseConfig;

#[cfg(feature = "duckdb-backend")]
pub use self::duckdb::{DuckDBConnection, DuckDBStore};

#[cfg(feature = "postgres-backend")]
pub use self::postgres::{PostgresConnection, PostgresStore};

/// Error type for database operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Statement execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction boundary failed
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// The connection cannot batch statements
    #[error("Batch updates are not supported by this connection")]
    BatchUnsupported,

    /// No source definition at the requested index
    #[error("Source index {index} out of range ({count} sources)")]
    SourceIndexOutOfRange { index: usize, count: usize },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Build a `QueryFailed` error naming the failing statement.
pub fn statement_failed(sql: &str, err: impl fmt::Display) -> DatabaseError {
    const MAX_STATEMENT_CHARS: usize = 200;
    let statement = sql.trim();
    let statement = match statement.char_indices().nth(MAX_STATEMENT_CHARS) {
        Some((end, _)) => format!("{}...", &statement[..end]),
        None => statement.to_string(),
    };
    DatabaseError::QueryFailed(format!("{} [{}]", err, statement))
}

/// Join statements into one `;`-terminated script.
#[cfg(any(feature = "duckdb-backend", feature = "postgres-backend"))]
pub(crate) fn join_statements(statements: &[String]) -> String {
    statements
        .iter()
        .map(|s| s.trim().trim_end_matches(';').trim_end())
        .filter(|s| !s.is_empty())
        .map(|s| format!("{};\n", s))
        .collect()
}

/// An open connection to a relational store.
///
/// `execute` receives a command block that may hold several `;`-separated
/// statements and runs it as one unit. Transaction boundaries default to
/// plain SQL commands.
pub trait SqlConnection {
    /// Execute one command block.
    fn execute(&mut self, sql: &str) -> DatabaseResult<()>;

    /// Start a transaction.
    fn begin(&mut self) -> DatabaseResult<()> {
        self.execute("BEGIN TRANSACTION")
            .map_err(|e| DatabaseError::TransactionFailed(format!("Begin failed: {}", e)))
    }

    /// Commit the current transaction.
    fn commit(&mut self) -> DatabaseResult<()> {
        self.execute("COMMIT")
            .map_err(|e| DatabaseError::TransactionFailed(format!("Commit failed: {}", e)))
    }

    /// Roll back the current transaction.
    fn rollback(&mut self) -> DatabaseResult<()> {
        self.execute("ROLLBACK")
            .map_err(|e| DatabaseError::TransactionFailed(format!("Rollback failed: {}", e)))
    }

    /// Whether statements can be queued with [`add_batch`](Self::add_batch).
    fn supports_batch_updates(&self) -> bool {
        false
    }

    /// Queue a statement for the next [`execute_batch`](Self::execute_batch).
    fn add_batch(&mut self, _sql: &str) -> DatabaseResult<()> {
        Err(DatabaseError::BatchUnsupported)
    }

    /// Execute and clear the queued statements.
    fn execute_batch(&mut self) -> DatabaseResult<()> {
        Err(DatabaseError::BatchUnsupported)
    }
}

impl<C: SqlConnection + ?Sized> SqlConnection for &mut C {
    fn execute(&mut self, sql: &str) -> DatabaseResult<()> {
        (**self).execute(sql)
    }

    fn begin(&mut self) -> DatabaseResult<()> {
        (**self).begin()
    }

    fn commit(&mut self) -> DatabaseResult<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> DatabaseResult<()> {
        (**self).rollback()
    }

    fn supports_batch_updates(&self) -> bool {
        (**self).supports_batch_updates()
    }

    fn add_batch(&mut self, sql: &str) -> DatabaseResult<()> {
        (**self).add_batch(sql)
    }

    fn execute_batch(&mut self) -> DatabaseResult<()> {
        (**self).execute_batch()
    }
}

/// A store handing out fresh connections.
pub trait DataStore {
    type Connection: SqlConnection;

    /// Open a new connection.
    fn connect(&self) -> DatabaseResult<Self::Connection>;

    /// Backend type name ("duckdb", "postgres", ...)
    fn backend_type(&self) -> &'static str {
        "custom"
    }
}

/// Receiver for phase-boundary messages.
///
/// Closures taking [`fmt::Arguments`] implement this directly:
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use schema_bootstrap::database::LogSink;
///
/// let lines = Arc::new(Mutex::new(Vec::new()));
/// let captured = lines.clone();
/// let sink = move |args: std::fmt::Arguments<'_>| captured.lock().unwrap().push(args.to_string());
/// sink.log(format_args!("Creating {} tables", 3));
/// assert_eq!(lines.lock().unwrap()[0], "Creating 3 tables");
/// ```
pub trait LogSink: Send + Sync {
    fn log(&self, args: fmt::Arguments<'_>);
}

impl<F> LogSink for F
where
    F: Fn(fmt::Arguments<'_>) + Send + Sync,
{
    fn log(&self, args: fmt::Arguments<'_>) {
        self(args)
    }
}

/// Shared handle to a log sink
pub type SharedLogSink = Arc<dyn LogSink>;

/// Send a phase message to tracing and to the optional sink.
pub(crate) fn announce(sink: Option<&SharedLogSink>, args: fmt::Arguments<'_>) {
    tracing::info!("{}", args);
    if let Some(sink) = sink {
        sink.log(args);
    }
}
