//! Create, drop and bootstrap commands
//!
//! Runs the schema lifecycle against the store named in the workspace
//! configuration.

use std::fmt;
use std::path::PathBuf;

use crate::cli::commands::{load_config, load_database};
use crate::cli::error::CliError;
use crate::database::config::{DatabaseBackendType, DatabaseConfig};
use crate::database::{CreateDatabase, DataStore, Database};

/// Lifecycle operation to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Drop and recreate every object in one transaction, then populate
    Create,
    /// Drop every object in one transaction
    Drop,
    /// Batch bootstrap with sequential fallback
    Bootstrap,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Drop => write!(f, "drop"),
            Operation::Bootstrap => write!(f, "bootstrap"),
        }
    }
}

/// Lifecycle command arguments
#[derive(Debug, Clone)]
pub struct LifecycleArgs {
    /// Workspace path
    pub workspace: PathBuf,
    /// Explicit sources, overriding the configured ones
    pub sources: Vec<String>,
    /// Operation to run
    pub operation: Operation,
}

/// Run the operation, returning its success flag.
pub fn handle_lifecycle(args: &LifecycleArgs) -> Result<bool, CliError> {
    let config = load_config(&args.workspace)?;
    let database = load_database(&args.workspace, &args.sources, &config)?
        .with_log_sink(|message: fmt::Arguments<'_>| println!("{}", message));

    tracing::debug!(
        operation = %args.operation,
        backend = %config.database.backend,
        "Running lifecycle operation"
    );

    match config.database.backend {
        DatabaseBackendType::DuckDB => run_duckdb(args, &config, &database),
        DatabaseBackendType::Postgres => run_postgres(args, &config, &database),
    }
}

/// Run one operation against an open store.
pub fn run<S: DataStore>(
    store: &S,
    operation: Operation,
    database: &Database,
    config: &DatabaseConfig,
) -> Result<bool, CliError> {
    match operation {
        Operation::Create => {
            let mut connection = store.connect()?;
            Ok(database.create(&mut connection))
        }
        Operation::Drop => {
            let mut connection = store.connect()?;
            Ok(database.drop(&mut connection))
        }
        Operation::Bootstrap => {
            let bootstrap = CreateDatabase::from_database(database)?
                .with_rollback_commands(config.sources.rollback.clone())
                .with_log_sink(|message: fmt::Arguments<'_>| println!("{}", message));
            Ok(bootstrap.create_database(store))
        }
    }
}

#[cfg(feature = "duckdb-backend")]
fn run_duckdb(
    args: &LifecycleArgs,
    config: &DatabaseConfig,
    database: &Database,
) -> Result<bool, CliError> {
    let store = crate::database::DuckDBStore::new(config.get_duckdb_path(&args.workspace))?;
    run(&store, args.operation, database, config)
}

#[cfg(not(feature = "duckdb-backend"))]
fn run_duckdb(
    _args: &LifecycleArgs,
    _config: &DatabaseConfig,
    _database: &Database,
) -> Result<bool, CliError> {
    Err(CliError::InvalidArgument(
        "DuckDB backend not enabled. Build with --features duckdb-backend".to_string(),
    ))
}

#[cfg(feature = "postgres-backend")]
fn run_postgres(
    args: &LifecycleArgs,
    config: &DatabaseConfig,
    database: &Database,
) -> Result<bool, CliError> {
    let connection_string = config.get_postgres_connection_string().ok_or_else(|| {
        CliError::InvalidArgument("PostgreSQL connection string not configured".to_string())
    })?;
    let store = crate::database::PostgresStore::new(connection_string)?;
    run(&store, args.operation, database, config)
}

#[cfg(not(feature = "postgres-backend"))]
fn run_postgres(
    _args: &LifecycleArgs,
    _config: &DatabaseConfig,
    _database: &Database,
) -> Result<bool, CliError> {
    Err(CliError::InvalidArgument(
        "PostgreSQL backend not enabled. Build with --features postgres-backend".to_string(),
    ))
}
