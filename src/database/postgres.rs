//! PostgreSQL store implementation
//!
//! Provides a PostgreSQL store for server deployments. The executors are
//! blocking, so each store owns a private tokio runtime and every
//! connection blocks on it.

use std::sync::Arc;

use tokio::runtime::Runtime;

use super::{
    DataStore, DatabaseError, DatabaseResult, SqlConnection, join_statements, statement_failed,
};

/// PostgreSQL store
pub struct PostgresStore {
    /// Connection string
    connection_string: String,
    runtime: Arc<Runtime>,
}

impl PostgresStore {
    /// Create a new PostgreSQL store
    ///
    /// No connection is opened until [`DataStore::connect`] is called.
    ///
    /// # Arguments
    /// * `connection_string` - PostgreSQL connection string
    pub fn new(connection_string: &str) -> DatabaseResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .map_err(|e| {
                DatabaseError::ConnectionFailed(format!("Failed to start runtime: {}", e))
            })?;

        Ok(Self {
            connection_string: connection_string.to_string(),
            runtime: Arc::new(runtime),
        })
    }

    /// Get the connection string (masked for security)
    pub fn connection_string_masked(&self) -> String {
        mask_password(&self.connection_string)
    }
}

fn mask_password(connection_string: &str) -> String {
    if let Some(at_pos) = connection_string.find('@')
        && let Some(colon_pos) = connection_string[..at_pos].rfind(':')
        && !connection_string[colon_pos..].starts_with("://")
    {
        let prefix = &connection_string[..colon_pos + 1];
        let suffix = &connection_string[at_pos..];
        return format!("{}****{}", prefix, suffix);
    }
    connection_string.to_string()
}

impl DataStore for PostgresStore {
    type Connection = PostgresConnection;

    fn connect(&self) -> DatabaseResult<PostgresConnection> {
        let (client, connection) = self
            .runtime
            .block_on(tokio_postgres::connect(
                &self.connection_string,
                tokio_postgres::NoTls,
            ))
            .map_err(|e| {
                DatabaseError::ConnectionFailed(format!(
                    "Failed to connect to PostgreSQL at {}: {}",
                    self.connection_string_masked(),
                    e
                ))
            })?;

        // Drive the connection in the background
        self.runtime.spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "PostgreSQL connection error");
            }
        });

        Ok(PostgresConnection {
            client,
            runtime: self.runtime.clone(),
            batch: Vec::new(),
        })
    }

    fn backend_type(&self) -> &'static str {
        "postgres"
    }
}

/// One PostgreSQL client with a statement batch buffer.
pub struct PostgresConnection {
    client: tokio_postgres::Client,
    runtime: Arc<Runtime>,
    batch: Vec<String>,
}

impl PostgresConnection {
    /// Number of statements waiting for the next flush
    pub fn pending_batch(&self) -> usize {
        self.batch.len()
    }

    /// Run a query returning a single `bigint`.
    pub fn query_count(&self, sql: &str) -> DatabaseResult<i64> {
        let row = self
            .runtime
            .block_on(self.client.query_one(sql, &[]))
            .map_err(|e| statement_failed(sql, e))?;
        row.try_get(0).map_err(|e| statement_failed(sql, e))
    }
}

impl SqlConnection for PostgresConnection {
    fn execute(&mut self, sql: &str) -> DatabaseResult<()> {
        self.runtime
            .block_on(self.client.batch_execute(sql))
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
        self.runtime
            .block_on(self.client.batch_execute(&sql))
            .map_err(|e| statement_failed(&sql, e))
    }
}
