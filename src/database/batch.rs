//! Batch-or-sequential bootstrap from literal command lists.
//!
//! [`CreateDatabase`] holds validated table, table initialization and view
//! commands. [`CreateDatabase::create_database`] feeds them to one
//! connection phase by phase. While the connection accepts batches the
//! commands are queued and flushed once per phase. The first failure turns
//! batching off for good and every later command is skipped. After a failure
//! the configured rollback commands are replayed, each on a fresh connection.

use std::sync::Arc;

use super::{DataStore, DatabaseError, LogSink, SharedLogSink, SqlConnection, announce};
use super::schema::Database;
use crate::models::{StatementKind, TableDefinition, ViewDefinition};
use crate::validation::input::{
    ValidationResult, validate_initialization_commands, validate_table_commands,
    validate_view_commands,
};

/// Validated command lists for a full bootstrap.
#[derive(Clone)]
pub struct CreateDatabase {
    tables: Vec<String>,
    views: Vec<String>,
    table_initializations: Vec<String>,
    rollback_commands: Vec<String>,
    log_sink: Option<SharedLogSink>,
}

impl std::fmt::Debug for CreateDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateDatabase")
            .field("tables", &self.tables)
            .field("views", &self.views)
            .field("table_initializations", &self.table_initializations)
            .field("rollback_commands", &self.rollback_commands)
            .finish_non_exhaustive()
    }
}

impl CreateDatabase {
    /// Create from literal command lists.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidStatement` for the first command that
    /// does not have the shape its list requires: create/drop table, create/drop
    /// view, or insert.
    ///
    /// # Example
    ///
    /// ```rust
    /// use schema_bootstrap::database::CreateDatabase;
    ///
    /// let bootstrap = CreateDatabase::new(
    ///     vec!["CREATE TABLE IF NOT EXISTS Skill (id integer primary key)".to_string()],
    ///     vec![],
    ///     vec!["INSERT INTO Skill (id) VALUES (1)".to_string()],
    /// )
    /// .unwrap();
    /// assert_eq!(bootstrap.tables().len(), 1);
    ///
    /// assert!(CreateDatabase::new(vec!["DELETE FROM Skill".to_string()], vec![], vec![]).is_err());
    /// ```
    pub fn new(
        tables: Vec<String>,
        views: Vec<String>,
        table_initializations: Vec<String>,
    ) -> ValidationResult<Self> {
        validate_table_commands(&tables)?;
        validate_view_commands(&views)?;
        validate_initialization_commands(&table_initializations)?;
        Ok(Self {
            tables,
            views,
            table_initializations,
            rollback_commands: Vec::new(),
            log_sink: None,
        })
    }

    pub fn builder() -> CreateDatabaseBuilder {
        CreateDatabaseBuilder::default()
    }

    /// Collect the statement blocks of a parsed database by kind.
    ///
    /// Comment and blank lines are stripped from each statement before
    /// validation.
    pub fn from_database(database: &Database) -> ValidationResult<Self> {
        let collect = |kind| {
            database
                .statements(kind)
                .map(|(_, statement)| statement.executable_sql())
                .collect::<Vec<_>>()
        };
        Self::new(
            collect(StatementKind::CreateTable),
            collect(StatementKind::CreateView),
            collect(StatementKind::Insert),
        )
    }

    /// Commands replayed after a failed bootstrap.
    ///
    /// Nothing generates these; they are taken as given.
    pub fn with_rollback_commands(mut self, commands: Vec<String>) -> Self {
        self.rollback_commands = commands;
        self
    }

    /// Attach a sink receiving every phase-boundary message.
    pub fn with_log_sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.log_sink = Some(Arc::new(sink));
        self
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn views(&self) -> &[String] {
        &self.views
    }

    pub fn table_initializations(&self) -> &[String] {
        &self.table_initializations
    }

    pub fn rollback_commands(&self) -> &[String] {
        &self.rollback_commands
    }

    /// Run tables, table initializations and views against one connection.
    ///
    /// Returns false if connecting, queueing, executing or flushing failed.
    pub fn create_database<S: DataStore>(&self, store: &S) -> bool {
        let mut connection = match store.connect() {
            Ok(connection) => connection,
            Err(e) => {
                tracing::error!(backend = store.backend_type(), error = %e, "Cannot open connection");
                self.replay_rollback(store);
                return false;
            }
        };

        let mut run = PhaseRun::new(connection.supports_batch_updates());
        tracing::debug!(batch = run.batch, "Starting bootstrap");

        let phases: [(&str, &[String]); 3] = [
            ("tables", &self.tables),
            ("table initializations", &self.table_initializations),
            ("views", &self.views),
        ];
        for (phase, commands) in phases {
            if run.failure.is_none() {
                announce(
                    self.log_sink.as_ref(),
                    format_args!("Creating {} ({} commands)", phase, commands.len()),
                );
            }
            for sql in commands {
                run.feed(&mut connection, sql);
            }
            run.flush(&mut connection);
        }

        match run.failure {
            None => {
                announce(self.log_sink.as_ref(), format_args!("Database created"));
                true
            }
            Some(e) => {
                tracing::error!(error = %e, "Bootstrap failed");
                announce(self.log_sink.as_ref(), format_args!("Bootstrap failed: {}", e));
                self.replay_rollback(store);
                false
            }
        }
    }

    fn replay_rollback<S: DataStore>(&self, store: &S) {
        if self.rollback_commands.is_empty() {
            return;
        }
        tracing::warn!(commands = self.rollback_commands.len(), "Replaying rollback commands");
        for sql in &self.rollback_commands {
            let result = store
                .connect()
                .and_then(|mut connection| connection.execute(sql));
            if let Err(e) = result {
                tracing::warn!(error = %e, sql = %sql, "Rollback command failed");
            }
        }
    }
}

/// Batch flag and first failure of one bootstrap run.
struct PhaseRun {
    batch: bool,
    failure: Option<DatabaseError>,
}

impl PhaseRun {
    fn new(batch: bool) -> Self {
        Self {
            batch,
            failure: None,
        }
    }

    fn feed<C: SqlConnection>(&mut self, connection: &mut C, sql: &str) {
        if self.failure.is_some() || sql.trim().is_empty() {
            return;
        }
        tracing::debug!(batch = self.batch, sql, "Feeding command");
        if self.batch {
            if let Err(e) = connection.add_batch(sql) {
                tracing::warn!(error = %e, "Batch rejected a command, batching disabled");
                self.batch = false;
                self.failure = Some(e);
            }
        } else if let Err(e) = connection.execute(sql) {
            self.failure = Some(e);
        }
    }

    fn flush<C: SqlConnection>(&mut self, connection: &mut C) {
        if self.failure.is_some() || !self.batch {
            return;
        }
        if let Err(e) = connection.execute_batch() {
            self.failure = Some(e);
        }
    }
}

/// Builder collecting literal definitions before validation.
#[derive(Debug, Default)]
pub struct CreateDatabaseBuilder {
    tables: Vec<String>,
    views: Vec<String>,
    table_initializations: Vec<String>,
    rollback_commands: Vec<String>,
}

impl CreateDatabaseBuilder {
    pub fn table(mut self, table: &TableDefinition) -> Self {
        self.tables.push(table.create_table());
        self
    }

    pub fn view(mut self, view: &ViewDefinition) -> Self {
        self.views.push(view.create_view());
        self
    }

    pub fn table_command(mut self, sql: impl Into<String>) -> Self {
        self.tables.push(sql.into());
        self
    }

    pub fn view_command(mut self, sql: impl Into<String>) -> Self {
        self.views.push(sql.into());
        self
    }

    pub fn initialization(mut self, sql: impl Into<String>) -> Self {
        self.table_initializations.push(sql.into());
        self
    }

    pub fn rollback_command(mut self, sql: impl Into<String>) -> Self {
        self.rollback_commands.push(sql.into());
        self
    }

    pub fn build(self) -> ValidationResult<CreateDatabase> {
        Ok(CreateDatabase::new(self.tables, self.views, self.table_initializations)?
            .with_rollback_commands(self.rollback_commands))
    }
}
