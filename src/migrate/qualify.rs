//! Schema qualification.
//!
//! This is plain substring replacement, not a SQL tokenizer: the table name
//! is also rewritten inside string literals, comments and longer identifiers
//! that contain it. Pick table names that do not overlap.

use super::Operation;

/// `schema.table`
pub fn qualified_name(schema: &str, table: &str) -> String {
    format!("{}.{}", schema, table)
}

/// Rewrite `sql` so every occurrence of `table` reads `schema.table`.
///
/// For [`Operation::Drop`] every semicolon is removed and a single
/// ` CASCADE;` is appended, so a drop always removes dependent objects and
/// always ends in exactly one statement terminator.
pub fn qualify(sql: &str, schema: &str, table: &str, op: Operation) -> String {
    let sql = if table.is_empty() {
        sql.to_string()
    } else {
        sql.replace(table, &qualified_name(schema, table))
    };

    match op {
        Operation::Create => sql,
        Operation::Drop => {
            let body = sql.replace(';', "");
            let body = body.trim_end();
            // A `--` anywhere on the last line would comment the suffix out.
            let last_line = body.lines().last().unwrap_or_default();
            if last_line.contains("--") {
                format!("{}\n CASCADE;", body)
            } else {
                format!("{} CASCADE;", body)
            }
        }
    }
}
