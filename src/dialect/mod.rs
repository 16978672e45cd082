//! Dialect Adapter Framework
//!
//! Each SQL dialect pairs an external grammar with its own classification
//! rules behind one contract. The aggregate and reporter never see
//! dialect-specific logic.

pub mod mysql;
pub mod postgres;

pub use mysql::MySqlAdapter;
pub use postgres::PostgresAdapter;

use crate::Result;
use crate::changes::BreakingChanges;

/// Trait for dialect adapters
///
/// Each dialect adapter is responsible for:
/// 1. Driving its external grammar over the full script
/// 2. Walking the parsed statements in source order
/// 3. Applying its classification rules and recording breaking entries
///
/// A `classify` call is a pure function of its input: it allocates and
/// returns a fresh [`BreakingChanges`], performs no I/O, and holds no
/// state across calls.
pub trait DialectAdapter {
    /// Selector name for display and CLI matching (e.g. "mysql").
    fn name(&self) -> &str;

    /// Classify the given DDL script, returning the breaking statements
    /// grouped by affected object.
    fn classify(&self, sql: &str) -> Result<BreakingChanges>;
}

/// Find the adapter registered under the given selector name.
pub fn adapter_for(name: &str) -> Option<Box<dyn DialectAdapter>> {
    match name {
        "mysql" => Some(Box::new(MySqlAdapter)),
        "pg" | "postgres" | "postgresql" => Some(Box::new(PostgresAdapter)),
        _ => None,
    }
}
