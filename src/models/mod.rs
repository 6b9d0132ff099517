//! Models for the schema bootstrap engine
//!
//! - [`SchemaState`]: ordered registry of table and view names
//! - [`SourceDefinition`]: create/populate/drop blocks of one parsed source
//! - [`TableDefinition`] / [`ViewDefinition`]: validated literal definitions

pub mod definition;
pub mod schema;

pub use definition::{
    SourceDefinition, StatementBlock, StatementKind, TableDefinition, ViewDefinition,
};
pub use schema::SchemaState;
