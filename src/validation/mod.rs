//! Validation functionality
//!
//! Provides validation logic for:
//! - Literal command lists handed to the batch executor
//! - Identifier and query text checks

pub mod input;

pub use input::{
    ValidationError, ValidationResult, created_view_name, is_identifier,
    validate_initialization_commands, validate_query_name, validate_query_string,
    validate_table_commands, validate_table_name, validate_view_commands,
};
