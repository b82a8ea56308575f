//! Section extraction.

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::multispace0,
    combinator::{rest, value},
    sequence::{pair, preceded},
    IResult,
};
use tracing::debug;

use super::{Operation, Section, CREATE_MARKER, DROP_MARKER};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Create,
    Drop,
}

/// Parse a marker line, returning the marker kind and the untrimmed table name.
fn parse_marker(input: &str) -> IResult<&str, (Marker, &str)> {
    preceded(
        multispace0,
        pair(
            alt((
                value(Marker::Create, tag_no_case(CREATE_MARKER)),
                value(Marker::Drop, tag_no_case(DROP_MARKER)),
            )),
            rest,
        ),
    )(input)
}

/// Extract the section for `op` from raw migration file text.
///
/// The CREATE body runs from the line after `--create:` up to the `--drop:`
/// line (or end of file). The DROP body runs from the line after `--drop:` to
/// end of file. Body lines are returned exactly as written.
pub fn extract_section(text: &str, op: Operation) -> Result<Section> {
    let lines: Vec<&str> = text.split('\n').collect();

    let mut start = 0;
    let mut end = lines.len();
    let mut table: Option<&str> = None;

    for (i, line) in lines.iter().enumerate() {
        let Ok((_, (marker, name))) = parse_marker(line) else {
            continue;
        };
        let name = name.trim();

        match (marker, op) {
            (Marker::Create, Operation::Create) => {
                // First header wins; later ones stay in the body.
                if table.is_none() {
                    table = Some(name);
                    start = i + 1;
                }
            }
            (Marker::Create, Operation::Drop) => {}
            (Marker::Drop, Operation::Create) => {
                end = i;
                break;
            }
            (Marker::Drop, Operation::Drop) => {
                table = Some(name);
                start = i + 1;
                break;
            }
        }
    }

    let table = match table {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            return Err(Error::MissingTableMarker {
                marker: op.keyword(),
            });
        }
    };

    let sql = lines[start..end].join("\n");
    if !has_statement(&sql) {
        return Err(Error::EmptySqlBody { table });
    }

    debug!(%op, table = %table, lines = end - start, "extracted section");
    Ok(Section { table, sql })
}

/// True if the body has at least one line that is neither blank nor a comment.
fn has_statement(sql: &str) -> bool {
    strip_block_comments(sql).lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with("--")
    })
}

/// Remove `/* ... */` comments, including nested and multi-line ones.
/// An unterminated comment runs to the end of the text.
fn strip_block_comments(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut depth = 0usize;
    let mut rest = sql;

    while !rest.is_empty() {
        if depth == 0 && rest.starts_with("--") {
            // Line comments are copied whole; a `/*` inside one opens nothing.
            let end = rest.find('\n').unwrap_or(rest.len());
            out.push_str(&rest[..end]);
            rest = &rest[end..];
        } else if rest.starts_with("/*") {
            depth += 1;
            rest = &rest[2..];
        } else if depth > 0 && rest.starts_with("*/") {
            depth -= 1;
            rest = &rest[2..];
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                // Keep line breaks so line comments are still recognized per line.
                if depth == 0 || c == '\n' {
                    out.push(c);
                }
            }
            rest = chars.as_str();
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const WIDGETS: &str =
        "--create:widgets\nCREATE TABLE widgets (id int);\n--drop:widgets\nDROP TABLE widgets;";

    #[test]
    fn test_parse_marker() {
        let (_, (marker, name)) = parse_marker("  --CREATE:  users ").unwrap();
        assert_eq!(marker, Marker::Create);
        assert_eq!(name.trim(), "users");

        let (_, (marker, name)) = parse_marker("--Drop:Users").unwrap();
        assert_eq!(marker, Marker::Drop);
        assert_eq!(name, "Users");

        assert!(parse_marker("-- create: users").is_err());
        assert!(parse_marker("CREATE TABLE users (id int);").is_err());
    }

    #[test]
    fn test_create_section() {
        let section = extract_section(WIDGETS, Operation::Create).unwrap();
        assert_eq!(section.table, "widgets");
        assert_eq!(section.sql, "CREATE TABLE widgets (id int);");
    }

    #[test]
    fn test_drop_section() {
        let section = extract_section(WIDGETS, Operation::Drop).unwrap();
        assert_eq!(section.table, "widgets");
        assert_eq!(section.sql, "DROP TABLE widgets;");
    }

    #[test]
    fn test_create_excludes_drop_section() {
        let text = "--create:a\nCREATE TABLE a (id int);\n\n--drop:a\nDROP TABLE a;\n-- trailing\n";
        let section = extract_section(text, Operation::Create).unwrap();
        assert!(!section.sql.contains("--drop:"));
        assert!(!section.sql.contains("DROP TABLE"));
    }

    #[test]
    fn test_drop_runs_to_end_of_file() {
        let text = "--create:a\nCREATE TABLE a (id int);\n--drop:a\nDROP INDEX a_idx;\nDROP TABLE a;\n";
        let section = extract_section(text, Operation::Drop).unwrap();
        assert_eq!(section.sql, "DROP INDEX a_idx;\nDROP TABLE a;\n");
    }

    #[test]
    fn test_create_without_drop_marker_runs_to_end() {
        let text = "--create:a\nCREATE TABLE a (id int);\nCREATE INDEX a_idx ON a (id);";
        let section = extract_section(text, Operation::Create).unwrap();
        assert_eq!(
            section.sql,
            "CREATE TABLE a (id int);\nCREATE INDEX a_idx ON a (id);"
        );
    }

    #[test]
    fn test_table_name_keeps_case_and_is_trimmed() {
        let text = "  --CREATE:  Orders  \nCREATE TABLE Orders (id int);\n--DROP: Orders\nDROP TABLE Orders;";
        assert_eq!(extract_section(text, Operation::Create).unwrap().table, "Orders");
        assert_eq!(extract_section(text, Operation::Drop).unwrap().table, "Orders");
    }

    #[test]
    fn test_drop_marker_may_name_other_table() {
        let text = "--create:users\nCREATE TABLE users (id int);\n--drop:users_archive\nDROP TABLE users_archive;";
        assert_eq!(
            extract_section(text, Operation::Drop).unwrap().table,
            "users_archive"
        );
    }

    #[test]
    fn test_missing_markers() {
        let err = extract_section("CREATE TABLE a (id int);", Operation::Create).unwrap_err();
        assert!(matches!(err, Error::MissingTableMarker { marker: "create" }));

        let err = extract_section("CREATE TABLE a (id int);", Operation::Drop).unwrap_err();
        assert!(matches!(err, Error::MissingTableMarker { marker: "drop" }));
    }

    #[test]
    fn test_create_requested_without_create_marker() {
        let text = "--drop:a\nDROP TABLE a;";
        let err = extract_section(text, Operation::Create).unwrap_err();
        assert!(matches!(err, Error::MissingTableMarker { .. }));
    }

    #[test]
    fn test_create_marker_after_drop_marker_is_not_seen() {
        let text = "--drop:a\nDROP TABLE a;\n--create:a\nCREATE TABLE a (id int);";
        let err = extract_section(text, Operation::Create).unwrap_err();
        assert!(matches!(err, Error::MissingTableMarker { .. }));
    }

    #[test]
    fn test_marker_without_table_name() {
        let text = "--create:\nCREATE TABLE a (id int);\n--drop:a\nDROP TABLE a;";
        let err = extract_section(text, Operation::Create).unwrap_err();
        assert!(matches!(err, Error::MissingTableMarker { .. }));
    }

    #[test]
    fn test_whitespace_body_is_empty() {
        let text = "--create:a\n   \n\t\n--drop:a\nDROP TABLE a;";
        let err = extract_section(text, Operation::Create).unwrap_err();
        assert!(matches!(err, Error::EmptySqlBody { ref table } if table == "a"));
    }

    #[test]
    fn test_comment_only_body_is_empty() {
        let text = "--create:a\n--write your create query\n\n--drop:a\n  -- nothing here\n";
        assert!(matches!(
            extract_section(text, Operation::Create),
            Err(Error::EmptySqlBody { .. })
        ));
        assert!(matches!(
            extract_section(text, Operation::Drop),
            Err(Error::EmptySqlBody { .. })
        ));
    }

    #[test]
    fn test_block_comment_body_is_empty() {
        let text = "--create:a\n/* fill in later */\n--drop:a\nDROP TABLE a;";
        assert!(matches!(
            extract_section(text, Operation::Create),
            Err(Error::EmptySqlBody { .. })
        ));

        let text = "--create:a\nCREATE TABLE a (id int);\n--drop:a\n/* keep\n   for now /* nested */\n*/\n-- later\n";
        assert!(matches!(
            extract_section(text, Operation::Drop),
            Err(Error::EmptySqlBody { .. })
        ));
    }

    #[test]
    fn test_block_comment_around_statement_is_kept() {
        let text = "--create:a\n/* widgets */ CREATE TABLE a (id int);\n--drop:a\nDROP TABLE a;";
        let section = extract_section(text, Operation::Create).unwrap();
        assert_eq!(section.sql, "/* widgets */ CREATE TABLE a (id int);");
    }

    #[test]
    fn test_strip_block_comments() {
        assert_eq!(strip_block_comments("a /* b */ c"), "a  c");
        assert_eq!(strip_block_comments("a /* b\n c */ d"), "a \n d");
        assert_eq!(strip_block_comments("/* x /* y */ z */q"), "q");
        assert_eq!(strip_block_comments("a /* open"), "a ");
        assert_eq!(strip_block_comments("-- see /* x\nDROP"), "-- see /* x\nDROP");
    }

    #[test]
    fn test_first_create_marker_wins() {
        let text = "--create:a\nCREATE TABLE a (id int);\n--create:b\nCREATE TABLE b (id int);\n--drop:a\nDROP TABLE a;";
        let section = extract_section(text, Operation::Create).unwrap();
        assert_eq!(section.table, "a");
        assert!(section.sql.contains("--create:b"));
    }

    #[test]
    fn test_first_drop_marker_wins() {
        let text = "--create:a\nCREATE TABLE a (id int);\n--drop:a\nDROP TABLE a;\n--drop:b\nDROP TABLE b;";
        let section = extract_section(text, Operation::Drop).unwrap();
        assert_eq!(section.table, "a");
        assert_eq!(section.sql, "DROP TABLE a;\n--drop:b\nDROP TABLE b;");
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "--create:a\r\nCREATE TABLE a (id int);\r\n--drop:a\r\nDROP TABLE a;\r\n";
        let section = extract_section(text, Operation::Create).unwrap();
        assert_eq!(section.table, "a");
        assert_eq!(section.sql, "CREATE TABLE a (id int);\r");
    }
}
