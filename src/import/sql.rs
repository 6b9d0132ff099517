//! SQL definition parsing
//!
//! Splits SQL definition text into a create block and a populate block by
//! classifying each line against an ordered list of statement header
//! patterns. Table and view names captured from create headers are
//! collected into a per-source [`SchemaState`].
//!
//! # Header patterns
//!
//! Headers are matched at the start of a line, after optional whitespace,
//! case-insensitively with Unicode-aware word characters:
//!
//! - `CREATE TABLE [IF NOT EXISTS] <name> (`
//! - `CREATE [OR REPLACE] VIEW <name> AS`
//! - `INSERT INTO <name> (<field>[, <field>]*)`
//!
//! A line is tested against every pattern, in that order. The block that
//! receives the line is decided by the last pattern that matched, so a line
//! matching several headers lands in the block of the latest one.

use std::io::BufRead;

use once_cell::sync::Lazy;
use regex::Regex;

use super::ImportError;
use crate::models::{SchemaState, SourceDefinition, StatementBlock, StatementKind};

// Static regex patterns compiled once for performance
static RE_CREATE_TABLE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*CREATE\s+TABLE(?:\s+IF\s+NOT\s+EXISTS)?\s+(?P<table>\w+)\s*\(")
        .expect("Invalid regex")
});
static RE_CREATE_VIEW_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*CREATE(?:\s+OR\s+REPLACE)?\s+VIEW\s+(?P<view>\w+)\s+AS(?:\s|$)")
        .expect("Invalid regex")
});
static RE_INSERT_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*INSERT\s+INTO\s+(?P<table>\w+)\s*\((?P<fields>\w+(?:\s*,\s*\w+)*)\)")
        .expect("Invalid regex")
});

/// What a matching header does to the parse state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternEffect {
    /// Switch to the create block and register the captured table name
    RegisterTable,
    /// Switch to the create block and register the captured view name
    RegisterView,
    /// Switch to the populate block and record the captured table name
    RecordPopulated,
}

impl PatternEffect {
    pub fn kind(self) -> StatementKind {
        match self {
            PatternEffect::RegisterTable => StatementKind::CreateTable,
            PatternEffect::RegisterView => StatementKind::CreateView,
            PatternEffect::RecordPopulated => StatementKind::Insert,
        }
    }
}

/// A statement header pattern with its capture group and effect.
#[derive(Debug)]
pub struct PatternEntry {
    pattern: &'static Lazy<Regex>,
    /// Capture group holding the object name, if any
    pub group: Option<&'static str>,
    pub effect: PatternEffect,
}

impl PatternEntry {
    pub fn regex(&self) -> &Regex {
        Lazy::force(self.pattern)
    }
}

static SQL_PATTERNS: [PatternEntry; 3] = [
    PatternEntry {
        pattern: &RE_CREATE_TABLE_HEADER,
        group: Some("table"),
        effect: PatternEffect::RegisterTable,
    },
    PatternEntry {
        pattern: &RE_CREATE_VIEW_HEADER,
        group: Some("view"),
        effect: PatternEffect::RegisterView,
    },
    PatternEntry {
        pattern: &RE_INSERT_HEADER,
        group: Some("table"),
        effect: PatternEffect::RecordPopulated,
    },
];

/// The header patterns in evaluation order.
pub fn sql_patterns() -> &'static [PatternEntry] {
    &SQL_PATTERNS
}

/// One pattern that matched a line.
#[derive(Debug, Clone, Copy)]
pub struct LineMatch<'a> {
    pub entry: &'static PatternEntry,
    /// Captured object name
    pub name: Option<&'a str>,
}

impl LineMatch<'_> {
    pub fn kind(&self) -> StatementKind {
        self.entry.effect.kind()
    }
}

/// Classify a line against every header pattern.
///
/// Returns all matching entries in evaluation order. No state is touched.
pub fn match_line(line: &str) -> Vec<LineMatch<'_>> {
    sql_patterns()
        .iter()
        .filter_map(|entry| {
            entry.regex().captures(line).map(|caps| LineMatch {
                entry,
                name: entry
                    .group
                    .and_then(|group| caps.name(group))
                    .map(|m| m.as_str()),
            })
        })
        .collect()
}

/// Result of one parse pass over a source.
#[derive(Debug, Clone, Default)]
pub struct ParsedSource {
    pub source: String,
    /// Names declared by this source, in first-seen order
    pub declared: SchemaState,
    pub create: Option<String>,
    pub populate: Option<String>,
    pub populated_tables: Vec<String>,
    pub statements: Vec<StatementBlock>,
}

impl ParsedSource {
    /// Attach the synthesized drop block and produce the source definition.
    pub fn into_definition(self, drop: Option<String>) -> SourceDefinition {
        SourceDefinition {
            source: self.source,
            create: self.create,
            populate: self.populate,
            drop,
            populated_tables: self.populated_tables,
            statements: self.statements,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Block {
    Create,
    Populate,
}

/// Line-oriented SQL definition parser
#[derive(Debug, Default)]
pub struct SqlDefinitionParser;

impl SqlDefinitionParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse SQL definition text.
    ///
    /// # Arguments
    ///
    /// * `source` - Source name recorded in the result
    /// * `reader` - Line reader over the source text
    ///
    /// # Errors
    ///
    /// Returns `ImportError::IoError` if the reader fails. Nothing read
    /// before the failure is kept. Bytes that are not valid UTF-8 are
    /// replaced with U+FFFD rather than failing the source.
    ///
    /// # Example
    ///
    /// ```rust
    /// use schema_bootstrap::import::SqlDefinitionParser;
    ///
    /// let sql = "CREATE TABLE IF NOT EXISTS Foo (\n id serial\n);\n";
    /// let parsed = SqlDefinitionParser::new().parse("inline", sql.as_bytes()).unwrap();
    /// assert_eq!(parsed.declared.tables(), ["Foo"]);
    /// assert_eq!(parsed.create.as_deref(), Some(sql));
    /// assert!(parsed.populate.is_none());
    /// ```
    pub fn parse<R: BufRead>(
        &self,
        source: &str,
        mut reader: R,
    ) -> Result<ParsedSource, ImportError> {
        let mut create = String::new();
        let mut populate = String::new();
        let mut current = Block::Create;
        let mut saw_create = false;
        let mut saw_populate = false;
        let mut declared = SchemaState::new();
        let mut populated_tables = Vec::new();
        let mut statements = Vec::new();
        let mut statement: Option<StatementBlock> = None;

        let mut raw = Vec::new();
        loop {
            raw.clear();
            let read = reader
                .read_until(b'\n', &mut raw)
                .map_err(|e| ImportError::IoError(format!("Failed to read {}: {}", source, e)))?;
            if read == 0 {
                break;
            }
            if raw.last() == Some(&b'\n') {
                raw.pop();
                if raw.last() == Some(&b'\r') {
                    raw.pop();
                }
            }
            let line = String::from_utf8_lossy(&raw);
            let matches = match_line(&line);

            if let Some(last) = matches.last() {
                statements.extend(statement.take());
                statement = Some(StatementBlock {
                    kind: last.kind(),
                    name: last.name.map(str::to_string),
                    sql: String::new(),
                });
            }

            for m in &matches {
                match m.entry.effect {
                    PatternEffect::RegisterTable => {
                        current = Block::Create;
                        saw_create = true;
                        if let Some(name) = m.name {
                            declared.register_table(name);
                        }
                    }
                    PatternEffect::RegisterView => {
                        current = Block::Create;
                        saw_create = true;
                        if let Some(name) = m.name {
                            declared.register_view(name);
                        }
                    }
                    PatternEffect::RecordPopulated => {
                        current = Block::Populate;
                        saw_populate = true;
                        if let Some(name) = m.name {
                            populated_tables.push(name.to_string());
                        }
                    }
                }
            }

            let buffer = match current {
                Block::Create => &mut create,
                Block::Populate => &mut populate,
            };
            buffer.push_str(&line);
            buffer.push('\n');

            if let Some(statement) = statement.as_mut() {
                statement.sql.push_str(&line);
                statement.sql.push('\n');
            }
        }
        statements.extend(statement);

        tracing::debug!(
            source,
            tables = ?declared.tables(),
            views = ?declared.views(),
            populated = ?populated_tables,
            "Parsed SQL definition"
        );

        Ok(ParsedSource {
            source: source.to_string(),
            declared,
            create: non_blank(create, saw_create),
            populate: non_blank(populate, saw_populate),
            populated_tables,
            statements,
        })
    }
}

fn non_blank(block: String, seen_header: bool) -> Option<String> {
    if seen_header && !block.trim().is_empty() {
        Some(block)
    } else {
        None
    }
}
