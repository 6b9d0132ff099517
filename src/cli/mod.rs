//! CLI support for the `schema-bootstrap` binary

pub mod commands;
pub mod error;
