//! CLI command implementations

pub mod init;
pub mod inspect;
pub mod lifecycle;

use std::path::Path;

use crate::cli::error::CliError;
use crate::database::{Database, DatabaseConfig};
use crate::import::{SqlSource, from_location};

/// Build the schema registry from explicit sources, the configured sources,
/// or the built-in default schema, in that order of preference.
pub fn load_database(
    workspace: &Path,
    sources: &[String],
    config: &DatabaseConfig,
) -> Result<Database, CliError> {
    let locations = if sources.is_empty() {
        config.source_locations()
    } else {
        sources
    };

    if locations.is_empty() {
        tracing::info!("No sources configured, using the built-in schema");
        return Ok(Database::builtin());
    }

    let sources = locations
        .iter()
        .map(|location| from_location(location, Some(workspace)))
        .collect::<Result<Vec<Box<dyn SqlSource>>, _>>()?;

    Ok(Database::from_sources(sources))
}

/// Check the workspace directory and load its configuration.
pub fn load_config(workspace: &Path) -> Result<DatabaseConfig, CliError> {
    if !workspace.is_dir() {
        return Err(CliError::WorkspaceNotFound(workspace.to_path_buf()));
    }
    Ok(DatabaseConfig::load(workspace)?)
}
