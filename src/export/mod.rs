//! Export functionality
//!
//! Renders SQL derived from parsed definitions:
//! - [`sql`]: per-source drop statements synthesized from registry snapshots

pub mod sql;

// Re-export for convenience
pub use sql::DropCommandSynthesizer;
