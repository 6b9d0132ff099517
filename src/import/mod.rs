//! Import functionality
//!
//! Provides ingestion of SQL definition text:
//! - [`source`]: readable text sources (files, in-memory text, URLs)
//! - [`sql`]: the line-oriented definition parser and its header patterns

pub mod source;
pub mod sql;

/// Error during import
#[derive(Debug, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum ImportError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Invalid source: {0}")]
    InvalidSource(String),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::IoError(err.to_string())
    }
}

// Re-export for convenience
#[cfg(feature = "remote-sources")]
pub use source::UrlSource;
pub use source::{FileSource, SqlSource, TextSource, from_location};
pub use sql::{LineMatch, ParsedSource, PatternEffect, PatternEntry, SqlDefinitionParser};
