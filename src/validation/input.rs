//! Identifier and statement-shape validation.
//!
//! This module provides the predicates used to decide whether a literal SQL
//! fragment has the shape of a create-table, create-view, drop-table,
//! drop-view or insert statement, and whether a bare name is a legal
//! unquoted identifier. They gate construction of
//! [`CreateDatabase`](crate::database::CreateDatabase) and of the
//! table/view definition helpers.
//!
//! # Identifiers
//!
//! An unquoted identifier starts with a Unicode letter and continues with
//! Unicode word characters, so combining marks may follow the first letter.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length for identifiers in general
pub const MAX_IDENTIFIER_LENGTH: usize = 255;

/// Unquoted identifier: a letter followed by word characters.
const IDENTIFIER: &str = r"\p{L}\w*";

/// A single SQL literal accepted in an insert row.
const VALUE: &str = r#"(?:'(?:[^']|'')*'|"[^"]*"|[+-]?\d+(?:\.\d+)?|null|true|false|default)"#;

static RE_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^{IDENTIFIER}$")).expect("Invalid regex"));
static RE_QUOTED_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^"(?:[^"]|"")+"$"#).expect("Invalid regex"));
static RE_CREATE_TABLE_SQL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*create(?:\s+(?:local|global))?(?:\s+temp(?:orary)?)?\s+table\s+(?:if\s+not\s+exists\s+)?(?P<name>{IDENTIFIER})\s*\(.*\)\s*;?\s*$"
    ))
    .expect("Invalid regex")
});
static RE_CREATE_VIEW_SQL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*create(?:\s+or\s+replace)?(?:\s+temp(?:orary)?)?(?:\s+recursive)?\s+view\s+(?P<name>{IDENTIFIER})\s+as\s+(?P<query>select\s.*?)\s*;?\s*$"
    ))
    .expect("Invalid regex")
});
static RE_DROP_TABLE_SQL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*drop\s+table(?:\s+if\s+exists)?\s+(?P<names>{IDENTIFIER}(?:\s*,\s*{IDENTIFIER})*)(?:\s+(?P<propagation>cascade|restrict))?\s*;?\s*$"
    ))
    .expect("Invalid regex")
});
static RE_DROP_VIEW_SQL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*drop\s+view(?:\s+if\s+exists)?\s+(?P<names>{IDENTIFIER}(?:\s*,\s*{IDENTIFIER})*)(?:\s+(?P<propagation>cascade|restrict))?\s*;?\s*$"
    ))
    .expect("Invalid regex")
});
static RE_INSERT_SQL: Lazy<Regex> = Lazy::new(|| {
    let row = format!(r"\(\s*{VALUE}(?:\s*,\s*{VALUE})*\s*\)");
    Regex::new(&format!(
        r"(?is)^\s*insert\s+into\s+(?P<name>{IDENTIFIER})\s*\((?P<fields>{IDENTIFIER}(?:\s*,\s*{IDENTIFIER})*)?\)\s*values\s*(?P<rows>{row}(?:\s*,\s*{row})*)\s*;?\s*$"
    ))
    .expect("Invalid regex")
});

/// Errors that can occur during input validation.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ValidationError {
    /// Input is empty when a value is required
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    /// Input exceeds maximum allowed length
    #[error("{field} exceeds maximum length (max: {max}, got: {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    /// Input has invalid format
    #[error("{0}: {1}")]
    InvalidFormat(&'static str, String),

    /// A literal command does not have the expected statement shape
    #[error("Invalid {kind} command: {statement}")]
    InvalidStatement {
        kind: &'static str,
        statement: String,
    },
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Test whether a name is a legal unquoted SQL identifier.
///
/// # Examples
///
/// ```
/// use schema_bootstrap::validation::input::is_identifier;
///
/// assert!(is_identifier("Person"));
/// assert!(is_identifier("Äänestys_2"));
/// assert!(!is_identifier("Spell Fail"));
/// assert!(!is_identifier("2fast"));
/// ```
pub fn is_identifier(name: &str) -> bool {
    RE_IDENTIFIER.is_match(name)
}

/// Validate a table or view name.
///
/// # Rules
///
/// - Must not be empty
/// - Must be a letter followed by Unicode word characters
///
/// Keywords are legal here. Quoting them is left to the statement author.
///
/// # Examples
///
/// ```
/// use schema_bootstrap::validation::input::validate_table_name;
///
/// assert!(validate_table_name("Motivation").is_ok());
/// assert!(validate_table_name("person_motivations").is_ok());
/// assert!(validate_table_name("Key").is_ok());
/// assert!(validate_table_name("").is_err());
/// assert!(validate_table_name("_hidden").is_err());
/// ```
pub fn validate_table_name(name: &str) -> ValidationResult<()> {
    if name.is_empty() {
        return Err(ValidationError::Empty("table name"));
    }
    if !is_identifier(name) {
        return Err(ValidationError::InvalidFormat(
            "table name",
            format!("not an identifier: {}", name),
        ));
    }
    Ok(())
}

/// Validate a view query name.
///
/// Accepts an ASCII identifier or a double-quoted identifier with doubled
/// inner quotes.
pub fn validate_query_name(name: &str) -> ValidationResult<()> {
    if name.is_empty() {
        return Err(ValidationError::Empty("query name"));
    }
    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong {
            field: "query name",
            max: MAX_IDENTIFIER_LENGTH,
            actual: name.len(),
        });
    }

    let first = name.chars().next().unwrap_or_default();
    let plain = first.is_ascii_alphabetic()
        && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    if plain || RE_QUOTED_IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat(
            "query name",
            format!("not a valid view name: {}", name),
        ))
    }
}

/// Validate a view query string. The query must be a `SELECT`.
pub fn validate_query_string(query: &str) -> ValidationResult<()> {
    if query.to_uppercase().starts_with("SELECT ") {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat(
            "query string",
            "view query must start with SELECT".to_string(),
        ))
    }
}

/// Does the command have the shape of a `CREATE TABLE` statement.
pub fn is_create_table_statement(sql: &str) -> bool {
    RE_CREATE_TABLE_SQL.is_match(sql)
}

/// Does the command have the shape of a `CREATE VIEW` statement.
pub fn is_create_view_statement(sql: &str) -> bool {
    RE_CREATE_VIEW_SQL.is_match(sql)
}

/// Does the command have the shape of a `DROP TABLE` statement.
pub fn is_drop_table_statement(sql: &str) -> bool {
    RE_DROP_TABLE_SQL.is_match(sql)
}

/// Does the command have the shape of a `DROP VIEW` statement.
pub fn is_drop_view_statement(sql: &str) -> bool {
    RE_DROP_VIEW_SQL.is_match(sql)
}

/// Does the command have the shape of a literal-valued `INSERT` statement.
pub fn is_insert_statement(sql: &str) -> bool {
    RE_INSERT_SQL.is_match(sql)
}

/// Name of the view created by a `CREATE VIEW` command, if it has that shape.
pub fn created_view_name(sql: &str) -> Option<&str> {
    RE_CREATE_VIEW_SQL
        .captures(sql)
        .and_then(|caps| caps.name("name"))
        .map(|m| m.as_str())
}

/// Validate every table command: each must create or drop a table.
pub fn validate_table_commands<S: AsRef<str>>(commands: &[S]) -> ValidationResult<()> {
    validate_commands("table creation", commands, |sql| {
        is_create_table_statement(sql) || is_drop_table_statement(sql)
    })
}

/// Validate every view command: each must create or drop a view.
pub fn validate_view_commands<S: AsRef<str>>(commands: &[S]) -> ValidationResult<()> {
    validate_commands("view creation", commands, |sql| {
        is_create_view_statement(sql) || is_drop_view_statement(sql)
    })
}

/// Validate every table initialization command: each must be an insert, or blank.
pub fn validate_initialization_commands<S: AsRef<str>>(commands: &[S]) -> ValidationResult<()> {
    validate_commands("table initialization", commands, |sql| {
        sql.trim().is_empty() || is_insert_statement(sql)
    })
}

fn validate_commands<S, F>(kind: &'static str, commands: &[S], accepts: F) -> ValidationResult<()>
where
    S: AsRef<str>,
    F: Fn(&str) -> bool,
{
    match commands.iter().map(AsRef::as_ref).find(|sql| !accepts(sql)) {
        Some(sql) => Err(ValidationError::InvalidStatement {
            kind,
            statement: sql.to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_cases() {
        assert!(is_identifier("empty"));
        assert!(is_identifier("Art"));
        assert!(is_identifier("Spell"));
        assert!(!is_identifier("Spell Fail"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("_x"));
    }

    #[test]
    fn test_validate_table_name_errors() {
        assert_eq!(
            validate_table_name(""),
            Err(ValidationError::Empty("table name"))
        );
        assert!(matches!(
            validate_table_name("Spell Fail"),
            Err(ValidationError::InvalidFormat("table name", _))
        ));
        assert!(matches!(
            validate_table_name("9lives"),
            Err(ValidationError::InvalidFormat(..))
        ));
        assert!(validate_table_name("a-b").is_err());
    }

    #[test]
    fn test_keywords_are_legal_table_names() {
        for name in [
            "Key",
            "Index",
            "View",
            "Set",
            "Schema",
            "Transaction",
            "Begin",
            "End",
            "Check",
            "Table",
        ] {
            assert!(is_identifier(name), "{}", name);
            assert_eq!(validate_table_name(name), Ok(()), "{}", name);
        }
    }

    #[test]
    fn test_combining_marks_in_table_names() {
        // decomposed: 'e' followed by U+0301
        let name = "Cafe\u{301}";
        assert_eq!(name.chars().count(), 5);
        assert!(is_identifier(name));
        assert_eq!(validate_table_name(name), Ok(()));
        assert_eq!(validate_table_name("Caf\u{e9}"), Ok(()));
        assert!(validate_table_name("\u{301}Cafe").is_err());
    }

    #[test]
    fn test_create_table_shape() {
        assert!(is_create_table_statement(
            "CREATE TABLE IF NOT EXISTS Foo (\n id serial\n);\n"
        ));
        assert!(is_create_table_statement(
            "create temporary table scratch (id int)"
        ));
        assert!(is_create_table_statement("CREATE GLOBAL TEMP TABLE g (x int);"));
        assert!(!is_create_table_statement("CREATE TABLE Foo"));
        assert!(!is_create_table_statement("CREATE VIEW v AS SELECT 1"));
    }

    #[test]
    fn test_create_view_shape() {
        assert!(is_create_view_statement(
            "CREATE OR REPLACE VIEW names AS SELECT name FROM Person;"
        ));
        assert!(is_create_view_statement(
            "create view v as\n  select *\n  from t"
        ));
        assert!(!is_create_view_statement("CREATE VIEW v AS VALUES (1)"));
        assert_eq!(
            created_view_name("CREATE VIEW summary AS SELECT 1"),
            Some("summary")
        );
    }

    #[test]
    fn test_drop_shapes() {
        assert!(is_drop_table_statement("DROP TABLE IF EXISTS Foo CASCADE;"));
        assert!(is_drop_table_statement("drop table a, b, c"));
        assert!(is_drop_table_statement("DROP TABLE x RESTRICT;"));
        assert!(!is_drop_table_statement("DROP TABLE"));
        assert!(is_drop_view_statement("DROP VIEW IF EXISTS v CASCADE;"));
        assert!(!is_drop_view_statement("DROP TABLE t;"));
    }

    #[test]
    fn test_insert_shape() {
        assert!(is_insert_statement(
            "INSERT INTO Motivation (name) VALUES ('Duty');"
        ));
        assert!(is_insert_statement(
            "insert into t (a, b) values (1, 'x'), (-2.5, 'it''s')"
        ));
        assert!(is_insert_statement("INSERT INTO t () VALUES (default)"));
        assert!(!is_insert_statement(
            "INSERT INTO t (a) SELECT a FROM other"
        ));
    }

    #[test]
    fn test_command_list_validation() {
        assert!(validate_table_commands(&["CREATE TABLE a (id int);", "DROP TABLE a;"]).is_ok());
        let err = validate_table_commands(&["CREATE TABLE a (id int);", "SELECT 1"]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidStatement {
                kind: "table creation",
                statement: "SELECT 1".to_string(),
            }
        );
        assert!(validate_view_commands(&["CREATE VIEW v AS SELECT 1"]).is_ok());
        assert!(validate_view_commands(&["CREATE TABLE a (id int)"]).is_err());
        assert!(validate_initialization_commands(&["", "INSERT INTO a (id) VALUES (1);"]).is_ok());
        assert!(validate_initialization_commands(&["DELETE FROM a"]).is_err());
    }

    #[test]
    fn test_query_name_and_string() {
        assert!(validate_query_name("summary").is_ok());
        assert!(validate_query_name("\"Odd \"\"Name\"\"\"").is_ok());
        assert!(validate_query_name("1bad").is_err());
        assert!(validate_query_name("").is_err());
        assert!(validate_query_string("SELECT 1").is_ok());
        assert!(validate_query_string("select name from t").is_ok());
        assert!(validate_query_string("DELETE FROM t").is_err());
    }
}
