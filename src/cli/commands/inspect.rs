//! Schema inspection command
//!
//! Parses the sources without touching a store and prints what each one
//! contributes to the create, populate and drop phases.

use std::fmt::Write as _;
use std::path::PathBuf;

use serde::Serialize;

use crate::cli::commands::{load_config, load_database};
use crate::cli::error::CliError;
use crate::database::Database;
use crate::models::SourceDefinition;

/// Output format for inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}. Use 'text' or 'json'.", s)),
        }
    }
}

/// Inspect command arguments
#[derive(Debug, Clone)]
pub struct InspectArgs {
    /// Workspace path
    pub workspace: PathBuf,
    /// Explicit sources, overriding the configured ones
    pub sources: Vec<String>,
    /// Output format
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct InspectReport<'a> {
    tables: &'a [String],
    views: &'a [String],
    sources: &'a [SourceDefinition],
}

/// Parse the sources and print the discovered schema.
pub fn handle_inspect(args: &InspectArgs) -> Result<(), CliError> {
    let config = load_config(&args.workspace)?;
    let database = load_database(&args.workspace, &args.sources, &config)?;
    println!("{}", render(&database, args.format)?);
    Ok(())
}

/// Render the registry and per-source blocks.
pub fn render(database: &Database, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => {
            let report = InspectReport {
                tables: database.table_names(),
                views: database.view_names(),
                sources: database.definitions(),
            };
            serde_json::to_string_pretty(&report)
                .map_err(|e| CliError::SerializationError(e.to_string()))
        }
        OutputFormat::Text => Ok(render_text(database)),
    }
}

fn render_text(database: &Database) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Tables: {}", database.table_names().join(", "));
    let _ = writeln!(out, "Views: {}", database.view_names().join(", "));

    for (index, definition) in database.definitions().iter().enumerate() {
        let _ = writeln!(out, "\n[{}] {}", index, definition.source);
        if definition.is_absent() {
            let _ = writeln!(out, "  (nothing to create, populate or drop)");
            continue;
        }
        write_block(&mut out, "create", definition.create.as_deref());
        write_block(&mut out, "populate", definition.populate.as_deref());
        write_block(&mut out, "drop", definition.drop.as_deref());
    }
    out
}

fn write_block(out: &mut String, label: &str, block: Option<&str>) {
    match block {
        None => {
            let _ = writeln!(out, "  {}: -", label);
        }
        Some(text) => {
            let _ = writeln!(out, "  {}:", label);
            for line in text.lines() {
                let _ = writeln!(out, "    {}", line);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::TextSource;

    fn database() -> Database {
        Database::from_sources([
            TextSource::new(
                "skills.sql",
                "CREATE TABLE IF NOT EXISTS Skill (\n  id integer\n);\n",
            ),
            TextSource::new("empty.sql", "-- nothing here\n"),
        ])
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_render_text() {
        let text = render(&database(), OutputFormat::Text).unwrap();
        assert!(text.starts_with("Tables: Skill\nViews: \n"));
        assert!(text.contains("[0] skills.sql"));
        assert!(text.contains("    DROP TABLE IF EXISTS Skill CASCADE;"));
        assert!(text.contains("  populate: -"));
        assert!(text.contains("[1] empty.sql\n  (nothing to create, populate or drop)"));
    }

    #[test]
    fn test_render_json() {
        let json = render(&database(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["tables"][0], "Skill");
        assert_eq!(value["sources"].as_array().unwrap().len(), 2);
        assert!(value["sources"][1]["create"].is_null());
    }
}
