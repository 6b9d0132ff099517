//! Parsed schema definitions and the transactional lifecycle.
//!
//! A [`Database`] is built once from an ordered list of SQL sources. Each
//! source is parsed into a [`SourceDefinition`] holding its create, populate
//! and synthesized drop blocks, and the table/view names it introduced are
//! folded into one [`SchemaState`]. After construction the value is
//! read-only; lifecycle calls replay the stored blocks against a connection.
//!
//! # Default schema
//!
//! [`Database::builtin`] ingests the SQL shipped with the crate: `Person`,
//! `Motivation` and `PersonMotivations`, a motivation summary view and the
//! five default motivations.

use std::sync::Arc;

use super::{
    DatabaseError, DatabaseResult, LogSink, SharedLogSink, SqlConnection, announce,
};
use crate::export::DropCommandSynthesizer;
use crate::import::{SqlDefinitionParser, SqlSource, TextSource};
use crate::models::{SchemaState, SourceDefinition, StatementBlock, StatementKind};

const CREATE_TABLES_SQL: &str = include_str!("../../sql/create_tables.sql");
const CREATE_VIEWS_SQL: &str = include_str!("../../sql/create_views.sql");
const INIT_TABLES_SQL: &str = include_str!("../../sql/init_tables.sql");

/// Motivations inserted by the default schema
pub const DEFAULT_MOTIVATIONS: [&str; 5] = ["Duty", "Power", "Justice", "Truth", "Faith"];

/// Outcome of one insert statement during population.
#[derive(Debug)]
pub struct PopulateOutcome {
    /// Ingestion index of the source holding the statement
    pub source_index: usize,
    /// Target table of the insert header
    pub table: Option<String>,
    pub result: DatabaseResult<()>,
}

impl PopulateOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Parsed SQL definitions and their schema registry.
pub struct Database {
    schema: SchemaState,
    definitions: Vec<SourceDefinition>,
    log_sink: Option<SharedLogSink>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("schema", &self.schema)
            .field("definitions", &self.definitions)
            .field("log_sink", &self.log_sink.is_some())
            .finish()
    }
}

impl Database {
    /// Parse the sources in order.
    ///
    /// A source that cannot be opened or read is logged and contributes an
    /// absent definition; later sources are still parsed.
    ///
    /// # Example
    ///
    /// ```rust
    /// use schema_bootstrap::database::Database;
    /// use schema_bootstrap::import::TextSource;
    ///
    /// let db = Database::from_sources([
    ///     TextSource::new("a.sql", "CREATE TABLE IF NOT EXISTS A (\n id integer\n);\n"),
    ///     TextSource::new("b.sql", "CREATE TABLE A (\n id integer\n);\n"),
    /// ]);
    /// assert_eq!(db.table_names(), ["A"]);
    /// assert!(db.definitions()[1].drop.is_none());
    /// ```
    pub fn from_sources<I>(sources: I) -> Self
    where
        I: IntoIterator,
        I::Item: SqlSource,
    {
        let parser = SqlDefinitionParser::new();
        let mut schema = SchemaState::new();
        let mut definitions = Vec::new();

        for source in sources {
            let name = source.name();
            let parsed = source
                .open()
                .and_then(|reader| parser.parse(&name, reader));
            match parsed {
                Ok(parsed) => {
                    let merged = schema.merge(&parsed.declared);
                    let drop = DropCommandSynthesizer::synthesize(&schema, &merged);
                    definitions.push(parsed.into_definition(drop));
                    schema = merged;
                }
                Err(e) => {
                    tracing::warn!(source = %name, error = %e, "Skipping unreadable SQL source");
                    definitions.push(SourceDefinition::absent(name));
                }
            }
        }

        tracing::info!(
            sources = definitions.len(),
            tables = schema.tables().len(),
            views = schema.views().len(),
            "Loaded SQL definitions"
        );

        Self {
            schema,
            definitions,
            log_sink: None,
        }
    }

    /// The default schema compiled into the crate.
    pub fn builtin() -> Self {
        Self::from_sources([
            TextSource::new("create_tables.sql", CREATE_TABLES_SQL),
            TextSource::new("create_views.sql", CREATE_VIEWS_SQL),
            TextSource::new("init_tables.sql", INIT_TABLES_SQL),
        ])
    }

    /// Attach a sink receiving every phase-boundary message.
    pub fn with_log_sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.log_sink = Some(Arc::new(sink));
        self
    }

    /// Table names in first-introduction order
    pub fn table_names(&self) -> &[String] {
        self.schema.tables()
    }

    /// View names in first-introduction order
    pub fn view_names(&self) -> &[String] {
        self.schema.views()
    }

    pub fn schema(&self) -> &SchemaState {
        &self.schema
    }

    /// Source definitions in ingestion order
    pub fn definitions(&self) -> &[SourceDefinition] {
        &self.definitions
    }

    pub fn definition(&self, index: usize) -> Option<&SourceDefinition> {
        self.definitions.get(index)
    }

    pub fn source_count(&self) -> usize {
        self.definitions.len()
    }

    /// Statement blocks of one kind across all sources, in ingestion order.
    pub fn statements(&self, kind: StatementKind) -> impl Iterator<Item = (usize, &StatementBlock)> {
        self.definitions
            .iter()
            .enumerate()
            .flat_map(move |(index, def)| def.statements_of(kind).map(move |s| (index, s)))
    }

    fn announce(&self, args: std::fmt::Arguments<'_>) {
        announce(self.log_sink.as_ref(), args);
    }

    fn source(&self, index: usize) -> DatabaseResult<&SourceDefinition> {
        self.definitions
            .get(index)
            .ok_or(DatabaseError::SourceIndexOutOfRange {
                index,
                count: self.definitions.len(),
            })
    }

    /// Create every table, statement by statement.
    ///
    /// Runs outside any transaction and stops at the first failure.
    pub fn create_tables<C: SqlConnection>(&self, connection: &mut C) -> bool {
        self.announce(format_args!("Creating tables: {}", self.table_names().join(", ")));
        self.execute_statements(connection, StatementKind::CreateTable)
    }

    /// Create every view, statement by statement.
    ///
    /// Runs outside any transaction and stops at the first failure.
    pub fn create_views<C: SqlConnection>(&self, connection: &mut C) -> bool {
        self.announce(format_args!("Creating views: {}", self.view_names().join(", ")));
        self.execute_statements(connection, StatementKind::CreateView)
    }

    fn execute_statements<C: SqlConnection>(&self, connection: &mut C, kind: StatementKind) -> bool {
        for (index, statement) in self.statements(kind) {
            let name = statement.name.as_deref().unwrap_or("?");
            let sql = statement.executable_sql();
            tracing::debug!(source = index, %kind, name, sql = %sql, "Executing statement");
            if let Err(e) = connection.execute(&sql) {
                tracing::error!(source = index, %kind, name, error = %e, "Statement failed");
                self.announce(format_args!("Failed to {} {}: {}", kind, name, e));
                return false;
            }
            self.announce(format_args!("{} {} done", kind, name));
        }
        true
    }

    /// Run every insert statement and return true if any of them succeeded.
    pub fn populate_tables<C: SqlConnection>(&self, connection: &mut C) -> bool {
        self.populate_tables_report(connection)
            .iter()
            .any(PopulateOutcome::is_success)
    }

    /// Run every insert statement individually and collect the outcomes.
    ///
    /// A failed insert does not stop the remaining ones.
    pub fn populate_tables_report<C: SqlConnection>(&self, connection: &mut C) -> Vec<PopulateOutcome> {
        self.announce(format_args!("Populating tables"));
        let outcomes: Vec<PopulateOutcome> = self
            .statements(StatementKind::Insert)
            .map(|(source_index, statement)| {
                let result = connection.execute(&statement.executable_sql());
                match &result {
                    Ok(()) => self.announce(format_args!(
                        "Populated {}",
                        statement.name.as_deref().unwrap_or("?")
                    )),
                    Err(e) => tracing::warn!(
                        source = source_index,
                        table = statement.name.as_deref(),
                        error = %e,
                        "Insert failed"
                    ),
                }
                PopulateOutcome {
                    source_index,
                    table: statement.name.clone(),
                    result,
                }
            })
            .collect();

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        tracing::info!(inserts = outcomes.len(), failed, "Population finished");
        outcomes
    }

    /// Execute the create block of one source, then its populate block.
    ///
    /// Either block is skipped when absent. Returns whether a create block
    /// ran; the populate step never changes the outcome, so an absent or
    /// failing populate block still reports the source as created.
    ///
    /// # Errors
    ///
    /// Returns `SourceIndexOutOfRange` for an unknown index and `QueryFailed`
    /// when the create block fails.
    pub fn create_source<C: SqlConnection>(&self, index: usize, connection: &mut C) -> DatabaseResult<bool> {
        let definition = self.source(index)?;
        let created = match definition.create.as_deref() {
            Some(sql) => {
                self.announce(format_args!("Creating from source {} ({})", index, definition.source));
                tracing::debug!(source = index, sql, "Create commands");
                connection.execute(sql)?;
                true
            }
            None => false,
        };

        match self.populate_source(index, connection) {
            Ok(populated) => tracing::debug!(source = index, populated, "Populate step finished"),
            Err(e) => tracing::warn!(source = index, error = %e, "Populate step failed"),
        }
        Ok(created)
    }

    /// Execute the populate block of one source.
    ///
    /// Returns `Ok(false)` when the source has no populate block.
    pub fn populate_source<C: SqlConnection>(&self, index: usize, connection: &mut C) -> DatabaseResult<bool> {
        let definition = self.source(index)?;
        match definition.populate.as_deref() {
            Some(sql) => {
                self.announce(format_args!("Populating from source {} ({})", index, definition.source));
                connection.execute(sql)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Execute the synthesized drop block of one source.
    ///
    /// Returns `Ok(false)` when the source introduced no names.
    pub fn drop_source<C: SqlConnection>(&self, index: usize, connection: &mut C) -> DatabaseResult<bool> {
        let definition = self.source(index)?;
        match definition.drop.as_deref() {
            Some(sql) => {
                self.announce(format_args!("Dropping objects of source {} ({})", index, definition.source));
                connection.execute(sql)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drop and recreate the whole schema in one transaction.
    ///
    /// Returns true if at least one source created something and the
    /// transaction committed. On failure the transaction is rolled back; a
    /// failing rollback is only logged.
    pub fn create<C: SqlConnection>(&self, connection: &mut C) -> bool {
        let result = connection.begin().and_then(|()| {
            self.drop_objects(connection)?;
            let mut created = false;
            for index in 0..self.definitions.len() {
                created |= self.create_source(index, connection)?;
            }
            connection.commit()?;
            Ok(created)
        });

        match result {
            Ok(created) => {
                self.announce(format_args!("Database created"));
                created
            }
            Err(e) => {
                tracing::error!(error = %e, "Database creation failed");
                self.announce(format_args!("Creation failed: {}", e));
                self.rollback(connection);
                false
            }
        }
    }

    /// Drop every known table and view in one transaction.
    ///
    /// Names are dropped in introduction order, tables first.
    pub fn drop<C: SqlConnection>(&self, connection: &mut C) -> bool {
        let result = connection
            .begin()
            .and_then(|()| self.drop_objects(connection))
            .and_then(|()| connection.commit());

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Dropping database failed");
                self.announce(format_args!("Drop failed: {}", e));
                self.rollback(connection);
                false
            }
        }
    }

    fn drop_objects<C: SqlConnection>(&self, connection: &mut C) -> DatabaseResult<()> {
        self.announce(format_args!("Dropping tables: {}", self.table_names().join(", ")));
        for table in self.table_names() {
            let sql = DropCommandSynthesizer::drop_table_statement(table);
            tracing::debug!(table = %table, sql = %sql, "Dropping table");
            connection.execute(&sql)?;
        }

        self.announce(format_args!("Dropping views: {}", self.view_names().join(", ")));
        for view in self.view_names() {
            let sql = DropCommandSynthesizer::drop_view_statement(view);
            tracing::debug!(view = %view, sql = %sql, "Dropping view");
            connection.execute(&sql)?;
        }
        Ok(())
    }

    fn rollback<C: SqlConnection>(&self, connection: &mut C) {
        if let Err(e) = connection.rollback() {
            tracing::warn!(error = %e, "Rollback failed");
        }
    }
}
