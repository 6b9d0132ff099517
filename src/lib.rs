//! Schema bootstrap - discover and apply SQL schema definitions
//!
//! Provides unified interfaces for:
//! - Reading SQL definition sources (files, compiled-in text, URLs)
//! - Discovering the tables and views each source declares
//! - Synthesizing per-source drop statements
//! - Creating, populating and dropping the schema against a store
//! - Batch bootstrap from literal command lists with sequential fallback
//!
//! # Example
//!
//! ```
//! use schema_bootstrap::{Database, TextSource};
//!
//! let db = Database::from_sources([TextSource::new(
//!     "skills.sql",
//!     "CREATE TABLE IF NOT EXISTS Skill (\n  id integer primary key\n);\n",
//! )]);
//! assert_eq!(db.table_names(), ["Skill"]);
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod database;
pub mod export;
pub mod import;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use database::{
    CreateDatabase, CreateDatabaseBuilder, DataStore, Database, DatabaseError, DatabaseResult,
    LogSink, PopulateOutcome, SharedLogSink, SqlConnection,
};
pub use export::DropCommandSynthesizer;
#[cfg(feature = "remote-sources")]
pub use import::UrlSource;
pub use import::{FileSource, ImportError, SqlDefinitionParser, SqlSource, TextSource};
pub use models::{
    SchemaState, SourceDefinition, StatementBlock, StatementKind, TableDefinition, ViewDefinition,
};
pub use validation::{ValidationError, ValidationResult};

#[cfg(feature = "duckdb-backend")]
pub use database::{DuckDBConnection, DuckDBStore};
#[cfg(feature = "postgres-backend")]
pub use database::{PostgresConnection, PostgresStore};
