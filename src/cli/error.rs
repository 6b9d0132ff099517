//! CLI-specific error types

use crate::database::DatabaseError;
use crate::import::ImportError;
use crate::validation::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

/// CLI-specific error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Workspace not found: {0}")]
    WorkspaceNotFound(PathBuf),

    #[error("Configuration already exists at {0}. Use --force to overwrite.")]
    ConfigExists(PathBuf),

    #[error("Import error: {0}")]
    ImportError(#[from] ImportError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Invalid command list: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}
