//! Drop statement synthesis.
//!
//! The drop block of a source removes exactly the names that source
//! introduced into the registry. Statements follow introduction order,
//! tables first and then views.

use crate::models::SchemaState;

/// Synthesizer for per-source `DROP ... CASCADE` blocks.
pub struct DropCommandSynthesizer;

impl DropCommandSynthesizer {
    /// Build the drop block for the names introduced between two snapshots.
    ///
    /// # Arguments
    ///
    /// * `before` - Registry immediately before the source was parsed
    /// * `after` - Registry immediately after the source was merged
    ///
    /// # Returns
    ///
    /// One statement per line, or `None` when the source introduced nothing.
    ///
    /// # Example
    ///
    /// ```rust
    /// use schema_bootstrap::export::DropCommandSynthesizer;
    /// use schema_bootstrap::models::SchemaState;
    ///
    /// let before = SchemaState::new();
    /// let after = SchemaState::from_names(["Foo"], ["FooView"]);
    /// assert_eq!(
    ///     DropCommandSynthesizer::synthesize(&before, &after).as_deref(),
    ///     Some("DROP TABLE IF EXISTS Foo CASCADE;\nDROP VIEW IF EXISTS FooView CASCADE;\n")
    /// );
    /// assert!(DropCommandSynthesizer::synthesize(&after, &after).is_none());
    /// ```
    pub fn synthesize(before: &SchemaState, after: &SchemaState) -> Option<String> {
        let (tables, views) = after.introduced_since(before);
        if tables.is_empty() && views.is_empty() {
            return None;
        }

        let mut sql = String::new();
        for table in tables {
            sql.push_str(&Self::drop_table_statement(table));
            sql.push('\n');
        }
        for view in views {
            sql.push_str(&Self::drop_view_statement(view));
            sql.push('\n');
        }
        Some(sql)
    }

    pub fn drop_table_statement(name: &str) -> String {
        format!("DROP TABLE IF EXISTS {} CASCADE;", name)
    }

    pub fn drop_view_statement(name: &str) -> String {
        format!("DROP VIEW IF EXISTS {} CASCADE;", name)
    }
}
