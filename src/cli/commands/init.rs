//! Workspace initialization command
//!
//! Writes a `.schema-bootstrap.toml` describing the target store.

use std::path::PathBuf;

use crate::cli::error::CliError;
use crate::database::config::{CONFIG_FILENAME, DatabaseBackendType, DatabaseConfig};

/// Init command arguments
#[derive(Debug, Clone)]
pub struct InitArgs {
    /// Workspace path
    pub workspace: PathBuf,
    /// Store backend
    pub backend: DatabaseBackendType,
    /// PostgreSQL connection string
    pub connection_string: Option<String>,
    /// SQL definition sources to record
    pub sources: Vec<String>,
    /// Overwrite an existing configuration
    pub force: bool,
}

/// Write the workspace configuration, returning its path.
pub fn handle_init(args: &InitArgs) -> Result<PathBuf, CliError> {
    if !args.workspace.is_dir() {
        return Err(CliError::WorkspaceNotFound(args.workspace.clone()));
    }

    let config_path = args.workspace.join(CONFIG_FILENAME);
    if DatabaseConfig::exists(&args.workspace) && !args.force {
        return Err(CliError::ConfigExists(config_path));
    }

    let config = match args.backend {
        DatabaseBackendType::DuckDB => DatabaseConfig::new(),
        DatabaseBackendType::Postgres => {
            let connection_string = args.connection_string.as_deref().ok_or_else(|| {
                CliError::InvalidArgument(
                    "--connection-string is required for the postgres backend".to_string(),
                )
            })?;
            DatabaseConfig::postgres(connection_string)
        }
    }
    .with_sources(args.sources.iter().cloned());

    config.save(&args.workspace)?;
    tracing::info!(path = %config_path.display(), backend = %args.backend, "Wrote configuration");
    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(workspace: PathBuf) -> InitArgs {
        InitArgs {
            workspace,
            backend: DatabaseBackendType::DuckDB,
            connection_string: None,
            sources: vec!["schema.sql".to_string()],
            force: false,
        }
    }

    #[test]
    fn test_init_writes_config() {
        let dir = tempdir().unwrap();
        let path = handle_init(&args(dir.path().to_path_buf())).unwrap();
        assert!(path.exists());

        let config = DatabaseConfig::load(dir.path()).unwrap();
        assert_eq!(config.source_locations(), ["schema.sql"]);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let mut init = args(dir.path().to_path_buf());
        handle_init(&init).unwrap();

        assert!(matches!(handle_init(&init), Err(CliError::ConfigExists(_))));
        init.force = true;
        assert!(handle_init(&init).is_ok());
    }

    #[test]
    fn test_postgres_requires_connection_string() {
        let dir = tempdir().unwrap();
        let mut init = args(dir.path().to_path_buf());
        init.backend = DatabaseBackendType::Postgres;

        assert!(matches!(
            handle_init(&init),
            Err(CliError::InvalidArgument(_))
        ));
    }
}
