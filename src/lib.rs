//! # ddlguard - Breaking-change detection for SQL DDL
//!
//! ddlguard inspects DDL migration scripts and flags statements that cause
//! irreversible schema or data loss, so a migration can be reviewed or
//! blocked before it executes.
//!
//! ddlguard provides:
//! - Dialect adapters for MySQL and PostgreSQL, each driving an external
//!   SQL grammar
//! - Conservative classification rules for destructive statements
//! - A [`BreakingChanges`] aggregate grouped by the affected object
//! - A deterministic SQL-comment report for review and CI gating
//!
//! Classification is static: no statement is ever executed, simulated, or
//! rolled back.

pub mod changes;
pub mod dialect;

// Re-exports for convenient access
pub use changes::{BreakingChanges, ObjectScope, ScopeChanges};
pub use dialect::{DialectAdapter, MySqlAdapter, PostgresAdapter};

/// Result type alias for ddlguard operations
pub type Result<T> = std::result::Result<T, ParseError>;

/// Error raised when an external SQL grammar rejects the input.
///
/// Carries the parser's diagnostic verbatim, the name of the internal step
/// that triggered it, and the original error for chained inspection. This
/// is the only error the classification engine produces: statement kinds it
/// does not recognize are silent no-ops, not failures.
#[derive(Debug, thiserror::Error)]
#[error("error {step}: {message}")]
pub struct ParseError {
    /// Human-readable diagnostic, taken verbatim from the parser.
    pub message: String,
    step: &'static str,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl ParseError {
    pub(crate) fn new(
        step: &'static str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: source.to_string(),
            step,
            source: Box::new(source),
        }
    }

    /// Name of the internal step that produced the error.
    pub fn step(&self) -> &str {
        self.step
    }
}

/// Classify a MySQL DDL script, returning the breaking statements grouped
/// by affected object.
pub fn run_mysql(sql: &str) -> Result<BreakingChanges> {
    MySqlAdapter.classify(sql)
}

/// Classify a PostgreSQL DDL script, returning the breaking statements
/// grouped by affected object.
pub fn run_postgresql(sql: &str) -> Result<BreakingChanges> {
    PostgresAdapter.classify(sql)
}
