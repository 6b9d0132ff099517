//! Parsed source definitions and literal table/view definitions

use serde::{Deserialize, Serialize};

use crate::validation::input::{
    ValidationResult, validate_query_name, validate_query_string, validate_table_name,
};

/// Category of a statement header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    CreateTable,
    CreateView,
    Insert,
}

impl StatementKind {
    /// Whether statements of this kind belong to the create block.
    pub fn is_create(self) -> bool {
        matches!(self, StatementKind::CreateTable | StatementKind::CreateView)
    }
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatementKind::CreateTable => write!(f, "create table"),
            StatementKind::CreateView => write!(f, "create view"),
            StatementKind::Insert => write!(f, "insert"),
        }
    }
}

/// One statement: a header line and the lines up to the next header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementBlock {
    pub kind: StatementKind,
    /// Name captured from the header, if any
    pub name: Option<String>,
    /// Statement text, one `\n` after every line
    pub sql: String,
}

impl StatementBlock {
    /// Statement text without blank and `--` comment lines.
    pub fn executable_sql(&self) -> String {
        self.sql
            .lines()
            .filter(|line| {
                let trimmed = line.trim();
                !trimmed.is_empty() && !trimmed.starts_with("--")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The result of ingesting one SQL definition source.
///
/// The create, populate and drop blocks are `None` when the source
/// contributes nothing to that phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDefinition {
    /// Human readable source name (path, URL or label)
    pub source: String,
    /// Create-table and create-view text, verbatim
    pub create: Option<String>,
    /// Insert text, verbatim
    pub populate: Option<String>,
    /// Synthesized `DROP ... CASCADE` statements for newly introduced names
    pub drop: Option<String>,
    /// Target tables of insert headers, in order of appearance
    #[serde(default)]
    pub populated_tables: Vec<String>,
    /// Individual statements in order of appearance
    #[serde(default)]
    pub statements: Vec<StatementBlock>,
}

impl SourceDefinition {
    /// An entirely absent definition for a source that could not be read.
    pub fn absent(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// Whether the source contributes nothing to any phase.
    pub fn is_absent(&self) -> bool {
        self.create.is_none() && self.populate.is_none() && self.drop.is_none()
    }

    /// Statements of one kind, in order.
    pub fn statements_of(&self, kind: StatementKind) -> impl Iterator<Item = &StatementBlock> {
        self.statements.iter().filter(move |s| s.kind == kind)
    }
}

/// A literal table definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    name: String,
    columns: String,
}

impl TableDefinition {
    /// Create a table definition from a name and a column definition list.
    ///
    /// # Examples
    ///
    /// ```
    /// use schema_bootstrap::models::TableDefinition;
    ///
    /// let table = TableDefinition::new("Skill", "id integer primary key, name varchar(40)").unwrap();
    /// assert_eq!(table.remove_table(), "DROP TABLE IF EXISTS Skill CASCADE;");
    /// assert!(TableDefinition::new("Spell Fail", "id integer").is_err());
    /// ```
    pub fn new(name: impl Into<String>, columns: impl Into<String>) -> ValidationResult<Self> {
        let name = name.into();
        validate_table_name(&name)?;
        Ok(Self {
            name,
            columns: columns.into(),
        })
    }

    /// Whether `name` is acceptable as a table name.
    pub fn valid_table_name(name: &str) -> bool {
        validate_table_name(name).is_ok()
    }

    pub fn table_name(&self) -> &str {
        &self.name
    }

    /// SQL command creating the table
    pub fn create_table(&self) -> String {
        format!("CREATE TABLE IF NOT EXISTS {} ({});", self.name, self.columns)
    }

    /// SQL command removing the table
    pub fn remove_table(&self) -> String {
        format!("DROP TABLE IF EXISTS {} CASCADE;", self.name)
    }
}

/// A literal view definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDefinition {
    name: String,
    query: String,
}

impl ViewDefinition {
    /// Create a view definition from a query name and a `SELECT` query.
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> ValidationResult<Self> {
        let name = name.into();
        let query = query.into();
        validate_query_name(&name)?;
        validate_query_string(&query)?;
        Ok(Self { name, query })
    }

    pub fn view_name(&self) -> &str {
        &self.name
    }

    /// SQL command creating the view
    pub fn create_view(&self) -> String {
        format!("CREATE OR REPLACE VIEW {} AS {}", self.name, self.query)
    }

    /// SQL command removing the view
    pub fn remove_view(&self) -> String {
        format!("DROP VIEW IF EXISTS {}", self.name)
    }
}
