//! Schema registry model
//!
//! A [`SchemaState`] is an immutable snapshot of the table and view names
//! known so far, in first-introduction order. Each parse pass produces the
//! names one source declared; [`SchemaState::merge`] folds that into a new
//! registry without mutating the previous one.

use serde::{Deserialize, Serialize};

/// Ordered, de-duplicated table and view names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SchemaNames")]
pub struct SchemaState {
    tables: Vec<String>,
    views: Vec<String>,
}

/// Serialized name lists, de-duplicated on the way in.
#[derive(Deserialize)]
struct SchemaNames {
    #[serde(default)]
    tables: Vec<String>,
    #[serde(default)]
    views: Vec<String>,
}

impl From<SchemaNames> for SchemaState {
    fn from(names: SchemaNames) -> Self {
        SchemaState::from_names(names.tables, names.views)
    }
}

impl SchemaState {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from name lists, dropping repeated names.
    pub fn from_names<T, V>(tables: T, views: V) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        let mut state = Self::new();
        for table in tables {
            push_unique(&mut state.tables, table.into());
        }
        for view in views {
            push_unique(&mut state.views, view.into());
        }
        state
    }

    /// Table names in first-introduction order
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// View names in first-introduction order
    pub fn views(&self) -> &[String] {
        &self.views
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t == name)
    }

    pub fn contains_view(&self, name: &str) -> bool {
        self.views.iter().any(|v| v == name)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.views.is_empty()
    }

    /// Fold another snapshot into a new registry.
    ///
    /// Names already present keep their original position; names only in
    /// `other` are appended in `other`'s order.
    pub fn merge(&self, other: &SchemaState) -> SchemaState {
        let mut merged = self.clone();
        for table in &other.tables {
            push_unique(&mut merged.tables, table.clone());
        }
        for view in &other.views {
            push_unique(&mut merged.views, view.clone());
        }
        merged
    }

    /// Names present here but not in `before`, in this registry's order.
    ///
    /// Returns `(new_tables, new_views)`.
    pub fn introduced_since<'a>(&'a self, before: &SchemaState) -> (Vec<&'a str>, Vec<&'a str>) {
        let tables = self
            .tables
            .iter()
            .filter(|t| !before.contains_table(t))
            .map(String::as_str)
            .collect();
        let views = self
            .views
            .iter()
            .filter(|v| !before.contains_view(v))
            .map(String::as_str)
            .collect();
        (tables, views)
    }

    pub(crate) fn register_table(&mut self, name: &str) -> bool {
        push_unique(&mut self.tables, name.to_string())
    }

    pub(crate) fn register_view(&mut self, name: &str) -> bool {
        push_unique(&mut self.views, name.to_string())
    }
}

fn push_unique(names: &mut Vec<String>, name: String) -> bool {
    if names.contains(&name) {
        false
    } else {
        names.push(name);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_names_deduplicates() {
        let state = SchemaState::from_names(["A", "B", "A"], ["V", "V"]);
        assert_eq!(state.tables(), ["A", "B"]);
        assert_eq!(state.views(), ["V"]);
    }

    #[test]
    fn test_deserialize_drops_repeated_names() {
        let state: SchemaState =
            serde_json::from_str(r#"{"tables": ["A", "A", "B"], "views": ["V", "V"]}"#).unwrap();
        assert_eq!(state.tables(), ["A", "B"]);
        assert_eq!(state.views(), ["V"]);

        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"tables":["A","B"],"views":["V"]}"#);
        assert_eq!(serde_json::from_str::<SchemaState>(&json).unwrap(), state);

        let empty: SchemaState = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_merge_keeps_first_seen_order() {
        let first = SchemaState::from_names(["Person", "Motivation"], Vec::<String>::new());
        let second = SchemaState::from_names(["Skill", "Person"], ["summary"]);

        let merged = first.merge(&second);
        assert_eq!(merged.tables(), ["Person", "Motivation", "Skill"]);
        assert_eq!(merged.views(), ["summary"]);
        // the input snapshot is untouched
        assert_eq!(first.tables().len(), 2);
    }

    #[test]
    fn test_introduced_since() {
        let before = SchemaState::from_names(["A"], ["V"]);
        let after = before.merge(&SchemaState::from_names(["B", "A", "C"], ["V", "W"]));

        let (tables, views) = after.introduced_since(&before);
        assert_eq!(tables, vec!["B", "C"]);
        assert_eq!(views, vec!["W"]);

        let (tables, views) = after.introduced_since(&after);
        assert!(tables.is_empty());
        assert!(views.is_empty());
    }

    #[test]
    fn test_register_ignores_duplicates() {
        let mut state = SchemaState::new();
        assert!(state.register_table("A"));
        assert!(!state.register_table("A"));
        assert!(state.register_view("A"));
        assert_eq!(state.tables(), ["A"]);
        assert_eq!(state.views(), ["A"]);
        assert!(!state.is_empty());
    }
}
