//! MySQL dialect adapter
//!
//! Classifies statements using the generic SQL grammar in `sqlparser`
//! configured for MySQL. Each parsed statement exposes its own canonical
//! text, so no span arithmetic is needed for this dialect.

use sqlparser::ast::{AlterTableOperation, ObjectName, ObjectNamePart, ObjectType, Statement};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

use super::DialectAdapter;
use crate::changes::{BreakingChanges, ObjectScope};
use crate::{ParseError, Result};

/// MySQL dialect adapter
pub struct MySqlAdapter;

impl DialectAdapter for MySqlAdapter {
    fn name(&self) -> &str {
        "mysql"
    }

    fn classify(&self, sql: &str) -> Result<BreakingChanges> {
        let statements = Parser::parse_sql(&MySqlDialect {}, sql)
            .map_err(|err| ParseError::new("parse", err))?;

        let mut changes = BreakingChanges::new();

        for statement in &statements {
            // Canonical text of the node, re-terminated with a single `;`.
            let text = format!("{statement};");
            tracing::debug!(statement = %text, "processing statement");

            match statement {
                Statement::Drop {
                    object_type: ObjectType::Database,
                    names,
                    ..
                } => {
                    for name in names {
                        changes.add(ObjectScope::Database, &object_name(name), text.clone());
                    }
                }
                Statement::Drop {
                    object_type: ObjectType::Table,
                    names,
                    ..
                } => {
                    for name in names {
                        changes.add(ObjectScope::Table, &object_name(name), text.clone());
                    }
                }
                Statement::Truncate(truncate) => {
                    for target in &truncate.table_names {
                        changes.add(ObjectScope::Table, &object_name(&target.name), text.clone());
                    }
                }
                Statement::RenameTable(renames) => {
                    // The vacated name is what breaks dependents.
                    for rename in renames {
                        changes.add(ObjectScope::Table, &object_name(&rename.old_name), text.clone());
                    }
                }
                Statement::AlterTable(alter) => {
                    if alter.operations.iter().any(is_breaking_alter_op) {
                        changes.add(ObjectScope::Table, &object_name(&alter.name), text.clone());
                    }
                }
                _ => {}
            }
        }

        Ok(changes)
    }
}

/// Breaking `ALTER TABLE` sub-clauses.
///
/// `MODIFY` and `CHANGE` column redefinitions are always flagged: the
/// column's prior declared type is not recoverable from the statement tree,
/// so the rule accepts false positives rather than miss a lossy type
/// change.
fn is_breaking_alter_op(operation: &AlterTableOperation) -> bool {
    matches!(
        operation,
        AlterTableOperation::DropColumn { .. }
            | AlterTableOperation::DropIndex { .. }
            | AlterTableOperation::DropForeignKey { .. }
            | AlterTableOperation::DropPrimaryKey { .. }
            | AlterTableOperation::ModifyColumn { .. }
            | AlterTableOperation::ChangeColumn { .. }
    )
}

/// MySQL entries are recorded unqualified: only the last identifier part
/// is kept when the source writes `db.table`.
fn object_name(name: &ObjectName) -> String {
    match name.0.last() {
        Some(ObjectNamePart::Identifier(ident)) => ident.value.clone(),
        _ => name.to_string(),
    }
}
