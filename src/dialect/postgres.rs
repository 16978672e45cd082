//! PostgreSQL dialect adapter
//!
//! Drives the native Postgres grammar via `pg_query`. Statement nodes carry
//! byte spans into the source rather than their own text, so the adapter
//! recovers each statement's exact text from its span.

use pg_query::NodeEnum;
use pg_query::protobuf::{self, AlterTableType, ObjectType, RangeVar, RawStmt};

use super::DialectAdapter;
use crate::changes::{BreakingChanges, ObjectScope};
use crate::{ParseError, Result};

/// PostgreSQL dialect adapter
pub struct PostgresAdapter;

impl DialectAdapter for PostgresAdapter {
    fn name(&self) -> &str {
        "pg"
    }

    fn classify(&self, sql: &str) -> Result<BreakingChanges> {
        // The grammar wants an explicit terminator on the final statement;
        // without one its reported span for that statement is unusable.
        let mut sql = sql.trim().to_string();
        if !sql.ends_with(';') {
            sql.push(';');
        }

        let parsed = pg_query::parse(&sql).map_err(|err| ParseError::new("parse", err))?;

        let mut changes = BreakingChanges::new();

        for raw in &parsed.protobuf.stmts {
            let Some(text) = statement_text(&sql, raw) else {
                tracing::warn!(
                    location = raw.stmt_location,
                    len = raw.stmt_len,
                    "skipping statement with degenerate span"
                );
                continue;
            };
            tracing::debug!(statement = %text, "processing statement");

            let Some(node) = raw.stmt.as_ref().and_then(|stmt| stmt.node.as_ref()) else {
                continue;
            };

            match node {
                NodeEnum::DropdbStmt(stmt) => {
                    changes.add(ObjectScope::Database, &stmt.dbname, text.clone());
                }
                NodeEnum::DropStmt(stmt) => match stmt.remove_type() {
                    ObjectType::ObjectSchema => {
                        for object in &stmt.objects {
                            if let Some(NodeEnum::String(name)) = &object.node {
                                changes.add(ObjectScope::Schema, &name.sval, text.clone());
                            }
                        }
                    }
                    ObjectType::ObjectTable => {
                        for name in qualified_names(&stmt.objects) {
                            changes.add(ObjectScope::Table, &name, text.clone());
                        }
                    }
                    ObjectType::ObjectIndex => {
                        for name in qualified_names(&stmt.objects) {
                            changes.add(ObjectScope::Index, &name, text.clone());
                        }
                    }
                    _ => {}
                },
                NodeEnum::TruncateStmt(stmt) => {
                    for relation in &stmt.relations {
                        if let Some(NodeEnum::RangeVar(rv)) = &relation.node {
                            changes.add(ObjectScope::Table, &relation_name(rv), text.clone());
                        }
                    }
                }
                NodeEnum::RenameStmt(stmt) => {
                    // Only table renames; the vacated name is recorded.
                    if stmt.rename_type() == ObjectType::ObjectTable {
                        if let Some(rv) = &stmt.relation {
                            changes.add(ObjectScope::Table, &relation_name(rv), text.clone());
                        }
                    }
                }
                NodeEnum::AlterTableStmt(stmt) => {
                    if let Some(rv) = &stmt.relation {
                        if stmt.cmds.iter().any(is_breaking_alter_cmd) {
                            changes.add(ObjectScope::Table, &relation_name(rv), text.clone());
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(changes)
    }
}

/// Breaking `ALTER TABLE` sub-commands: column drops, constraint drops,
/// and explicit column type changes.
fn is_breaking_alter_cmd(node: &protobuf::Node) -> bool {
    match &node.node {
        Some(NodeEnum::AlterTableCmd(cmd)) => matches!(
            cmd.subtype(),
            AlterTableType::AtDropColumn
                | AlterTableType::AtDropConstraint
                | AlterTableType::AtAlterColumnType
        ),
        _ => false,
    }
}

/// Recover one statement's exact text from its byte span, trimmed and
/// re-terminated with `;`.
///
/// Returns `None` when the span is degenerate (inverted, out of bounds,
/// off a character boundary, or empty once trimmed); such statements are
/// skipped, not reported as errors.
fn statement_text(sql: &str, raw: &RawStmt) -> Option<String> {
    let start = usize::try_from(raw.stmt_location).ok()?;
    let end = usize::try_from(raw.stmt_location.checked_add(raw.stmt_len)?).ok()?;
    let text = sql.get(start..end)?.trim();
    if text.is_empty() {
        return None;
    }
    Some(format!("{text};"))
}

/// Each dropped object is a list of identifier parts; all parts are joined
/// with `.` to form the recorded name.
fn qualified_names(objects: &[protobuf::Node]) -> Vec<String> {
    objects
        .iter()
        .filter_map(|object| match &object.node {
            Some(NodeEnum::List(list)) => {
                let parts: Vec<&str> = list
                    .items
                    .iter()
                    .filter_map(|item| match &item.node {
                        Some(NodeEnum::String(part)) => Some(part.sval.as_str()),
                        _ => None,
                    })
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join("."))
                }
            }
            _ => None,
        })
        .collect()
}

/// Relation name with a schema prefix only when one is written in the
/// source.
fn relation_name(relation: &RangeVar) -> String {
    if relation.schemaname.is_empty() {
        relation.relname.clone()
    } else {
        format!("{}.{}", relation.schemaname, relation.relname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(sql: &str) -> BreakingChanges {
        PostgresAdapter.classify(sql).expect("classification failed")
    }

    fn expected(entries: &[(ObjectScope, &str, &str)]) -> BreakingChanges {
        let mut changes = BreakingChanges::new();
        for (scope, name, statement) in entries {
            changes.add(*scope, name, (*statement).to_string());
        }
        changes
    }

    #[test]
    fn test_drop_database() {
        let got = classify("DROP DATABASE test_db;");
        assert_eq!(
            got,
            expected(&[(ObjectScope::Database, "test_db", "DROP DATABASE test_db;")])
        );
        assert!(got.exist());
    }

    #[test]
    fn test_drop_schema() {
        let got = classify("DROP SCHEMA test_schema;");
        assert_eq!(
            got,
            expected(&[(ObjectScope::Schema, "test_schema", "DROP SCHEMA test_schema;")])
        );
    }

    #[test]
    fn test_drop_table_joins_qualified_name() {
        let got = classify("DROP TABLE test_schema.test_table;");
        assert_eq!(
            got,
            expected(&[(
                ObjectScope::Table,
                "test_schema.test_table",
                "DROP TABLE test_schema.test_table;",
            )])
        );
    }

    #[test]
    fn test_drop_multiple_tables() {
        let got = classify("DROP TABLE table_a, table_b;");
        assert_eq!(
            got,
            expected(&[
                (ObjectScope::Table, "table_a", "DROP TABLE table_a, table_b;"),
                (ObjectScope::Table, "table_b", "DROP TABLE table_a, table_b;"),
            ])
        );
    }

    #[test]
    fn test_drop_index_joins_qualified_name() {
        let got = classify("DROP INDEX test_schema.test_index;");
        assert_eq!(
            got,
            expected(&[(
                ObjectScope::Index,
                "test_schema.test_index",
                "DROP INDEX test_schema.test_index;",
            )])
        );
    }

    #[test]
    fn test_truncate_table_keeps_schema_prefix_from_source() {
        let got = classify("TRUNCATE TABLE test_schema.test_table;");
        assert_eq!(
            got,
            expected(&[(
                ObjectScope::Table,
                "test_schema.test_table",
                "TRUNCATE TABLE test_schema.test_table;",
            )])
        );
    }

    #[test]
    fn test_truncate_unqualified_table_has_bare_name() {
        let got = classify("TRUNCATE TABLE test_table;");
        assert_eq!(
            got,
            expected(&[(ObjectScope::Table, "test_table", "TRUNCATE TABLE test_table;")])
        );
    }

    #[test]
    fn test_alter_table_rename_records_current_name() {
        let got = classify("ALTER TABLE test_schema.test_table_old RENAME TO test_table_new;");
        assert_eq!(
            got,
            expected(&[(
                ObjectScope::Table,
                "test_schema.test_table_old",
                "ALTER TABLE test_schema.test_table_old RENAME TO test_table_new;",
            )])
        );
    }

    #[test]
    fn test_alter_table_drop_column() {
        let got = classify("ALTER TABLE test_schema.test_table DROP COLUMN column_name;");
        assert_eq!(
            got,
            expected(&[(
                ObjectScope::Table,
                "test_schema.test_table",
                "ALTER TABLE test_schema.test_table DROP COLUMN column_name;",
            )])
        );
    }

    #[test]
    fn test_alter_table_drop_constraint() {
        let got = classify("ALTER TABLE test_schema.test_table DROP CONSTRAINT constraint_name;");
        assert_eq!(
            got,
            expected(&[(
                ObjectScope::Table,
                "test_schema.test_table",
                "ALTER TABLE test_schema.test_table DROP CONSTRAINT constraint_name;",
            )])
        );
    }

    #[test]
    fn test_alter_table_alter_column_type() {
        let got =
            classify("ALTER TABLE test_schema.test_table ALTER COLUMN column_name TYPE VARCHAR(255);");
        assert_eq!(
            got,
            expected(&[(
                ObjectScope::Table,
                "test_schema.test_table",
                "ALTER TABLE test_schema.test_table ALTER COLUMN column_name TYPE VARCHAR(255);",
            )])
        );
    }

    #[test]
    fn test_multiple_breaking_commands_collapse_to_one_entry() {
        let got = classify("ALTER TABLE test_table DROP COLUMN a, DROP COLUMN b;");
        assert_eq!(
            got,
            expected(&[(
                ObjectScope::Table,
                "test_table",
                "ALTER TABLE test_table DROP COLUMN a, DROP COLUMN b;",
            )])
        );
        assert_eq!(got.tables.statements("test_table").len(), 1);
    }

    #[test]
    fn test_create_table_is_not_breaking() {
        let got = classify("CREATE TABLE test_schema.test_table (id INT PRIMARY KEY);");
        assert_eq!(got, BreakingChanges::new());
        assert!(!got.exist());
    }

    #[test]
    fn test_add_column_is_not_breaking() {
        let got = classify("ALTER TABLE test_table ADD COLUMN new_column INT;");
        assert_eq!(got, BreakingChanges::new());
    }

    #[test]
    fn test_multiple_statements_cover_all_scopes() {
        let got = classify(
            "CREATE TABLE test_table (id INT PRIMARY KEY);\n\
             ALTER TABLE test_table DROP COLUMN id;\n\
             DROP INDEX test_index;\n\
             DROP SCHEMA test_schema;\n\
             DROP DATABASE test_db;",
        );
        assert_eq!(
            got,
            expected(&[
                (
                    ObjectScope::Table,
                    "test_table",
                    "ALTER TABLE test_table DROP COLUMN id;",
                ),
                (ObjectScope::Index, "test_index", "DROP INDEX test_index;"),
                (ObjectScope::Schema, "test_schema", "DROP SCHEMA test_schema;"),
                (ObjectScope::Database, "test_db", "DROP DATABASE test_db;"),
            ])
        );
    }

    #[test]
    fn test_statement_order_is_preserved_per_table() {
        let got = classify(
            "CREATE TABLE test_table (id INT PRIMARY KEY);\n\
             ALTER TABLE test_table ADD COLUMN new_column INT;\n\
             ALTER TABLE test_table DROP COLUMN id;\n\
             ALTER TABLE test_table DROP COLUMN new_column;\n\
             CREATE INDEX idx_new_column ON test_table (new_column);",
        );
        assert_eq!(
            got.tables.statements("test_table"),
            [
                "ALTER TABLE test_table DROP COLUMN id;",
                "ALTER TABLE test_table DROP COLUMN new_column;",
            ]
        );
    }

    #[test]
    fn test_missing_final_terminator_is_auto_appended() {
        let got = classify("DROP TABLE test_table");
        assert_eq!(
            got,
            expected(&[(ObjectScope::Table, "test_table", "DROP TABLE test_table;")])
        );
    }

    #[test]
    fn test_extracted_text_reparses_standalone() {
        let got = classify(
            "CREATE TABLE test_table (id INT PRIMARY KEY);\n\
             ALTER TABLE test_table DROP COLUMN id;\n\
             TRUNCATE TABLE test_table;\n\
             DROP DATABASE test_db;",
        );
        for scope in ObjectScope::REPORT_ORDER {
            let changes = got.scope(scope);
            for name in changes.names() {
                for statement in changes.statements(name) {
                    let reparsed = pg_query::parse(statement).expect("extracted text must parse");
                    assert_eq!(reparsed.protobuf.stmts.len(), 1, "statement: {statement}");
                }
            }
        }
    }

    #[test]
    fn test_classification_is_idempotent() {
        let sql = "ALTER TABLE test_table DROP COLUMN id; DROP DATABASE test_db;";
        assert_eq!(classify(sql), classify(sql));
    }

    #[test]
    fn test_invalid_sql_is_a_parse_error() {
        let err = PostgresAdapter
            .classify("INVALID SQL STATEMENT;")
            .expect_err("expected a parse error");
        assert_eq!(err.step(), "parse");
        assert!(err.to_string().starts_with("error parse:"));
    }

    #[test]
    fn test_degenerate_span_helper_rejects_bad_ranges() {
        let raw = RawStmt {
            stmt: None,
            stmt_location: 4,
            stmt_len: 0,
            ..Default::default()
        };
        assert_eq!(statement_text("ab; ", &raw), None);

        let raw = RawStmt {
            stmt: None,
            stmt_location: 0,
            stmt_len: 99,
            ..Default::default()
        };
        assert_eq!(statement_text("ab;", &raw), None);

        // Spans reported by the grammar end before the terminator; the
        // helper re-appends it.
        let raw = RawStmt {
            stmt: None,
            stmt_location: 0,
            stmt_len: 2,
            ..Default::default()
        };
        assert_eq!(statement_text("ab;", &raw).as_deref(), Some("ab;"));
    }
}
