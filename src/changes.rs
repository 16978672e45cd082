//! Breaking-change aggregate and reporter
//!
//! [`BreakingChanges`] collects the destructive statements found during one
//! classification pass, grouped by the database object they affect. It is
//! built fresh inside each [`classify`](crate::DialectAdapter::classify)
//! call and treated as read-only once returned.

use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;

use serde::Serialize;

/// Category of schema object a breaking change affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectScope {
    Table,
    Database,
    Schema,
    Index,
}

impl ObjectScope {
    /// Section order of the SQL-comment report.
    pub const REPORT_ORDER: [ObjectScope; 4] = [
        ObjectScope::Table,
        ObjectScope::Index,
        ObjectScope::Schema,
        ObjectScope::Database,
    ];

    /// Scope label used in report headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectScope::Table => "Table",
            ObjectScope::Database => "Database",
            ObjectScope::Schema => "Schema",
            ObjectScope::Index => "Index",
        }
    }
}

impl fmt::Display for ObjectScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Breaking statements for the objects of one scope, keyed by qualified
/// name.
///
/// Statement sequences are append-only and keep source order; duplicate
/// texts are retained verbatim.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScopeChanges(BTreeMap<String, Vec<String>>);

impl ScopeChanges {
    fn add(&mut self, name: &str, statement: String) {
        self.0.entry(name.to_string()).or_default().push(statement);
    }

    /// Affected object names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Breaking statements recorded for the given object, in source order.
    pub fn statements(&self, name: &str) -> &[String] {
        self.0.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether any changes were recorded in this scope.
    pub fn exist(&self) -> bool {
        !self.0.is_empty()
    }
}

/// Breaking changes found in one classification pass, one mapping per
/// object scope.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BreakingChanges {
    pub tables: ScopeChanges,
    pub databases: ScopeChanges,
    pub schemas: ScopeChanges,
    pub indexes: ScopeChanges,
}

impl BreakingChanges {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one breaking statement against the named object. Appends to
    /// the object's existing sequence when the name was already seen.
    pub(crate) fn add(&mut self, scope: ObjectScope, name: &str, statement: String) {
        self.scope_mut(scope).add(name, statement);
    }

    /// The mapping for one scope.
    pub fn scope(&self, scope: ObjectScope) -> &ScopeChanges {
        match scope {
            ObjectScope::Table => &self.tables,
            ObjectScope::Database => &self.databases,
            ObjectScope::Schema => &self.schemas,
            ObjectScope::Index => &self.indexes,
        }
    }

    fn scope_mut(&mut self, scope: ObjectScope) -> &mut ScopeChanges {
        match scope {
            ObjectScope::Table => &mut self.tables,
            ObjectScope::Database => &mut self.databases,
            ObjectScope::Schema => &mut self.schemas,
            ObjectScope::Index => &mut self.indexes,
        }
    }

    /// Whether any breaking changes exist. All four scopes participate.
    pub fn exist(&self) -> bool {
        ObjectScope::REPORT_ORDER
            .iter()
            .any(|scope| self.scope(*scope).exist())
    }

    /// Render the changes as an SQL-comment report.
    ///
    /// Sections are ordered Table, Index, Schema, Database. Each affected
    /// object gets a `-- <Scope>: <name>` header followed by its breaking
    /// statements, one per line, indented eight spaces, in source order.
    /// An empty set renders as an empty string.
    pub fn format_sql(&self) -> String {
        let mut out = String::new();
        for scope in ObjectScope::REPORT_ORDER {
            let changes = self.scope(scope);
            for name in changes.names() {
                let _ = writeln!(out, "-- {scope}: {name}");
                for statement in changes.statements(name) {
                    let _ = writeln!(out, "        {statement}");
                }
            }
        }
        out
    }
}
