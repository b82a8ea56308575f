//! Migration file handling.
//!
//! A migration file carries two sections, each introduced by a marker line:
//!
//! ```sql
//! --create:widgets
//! CREATE TABLE widgets (id int);
//!
//! --drop:widgets
//! DROP TABLE widgets;
//! ```
//!
//! Submodules:
//! - `section`: split a file into the section for one operation
//! - `qualify`: rewrite a section body to target a schema
//! - `template`: generate a new skeleton file
//! - `files`: list the migrations directory

mod files;
mod qualify;
mod section;
mod template;

pub use files::list_migration_files;
pub use qualify::{qualified_name, qualify};
pub use section::extract_section;
pub use template::{generate, generate_at, template_content};

use std::fmt;

/// Default migrations directory, relative to the working directory.
pub const DEFAULT_MIGRATIONS_DIR: &str = "sql/migrations";

/// Marker prefix introducing the CREATE section.
pub const CREATE_MARKER: &str = "--create:";

/// Marker prefix introducing the DROP section.
pub const DROP_MARKER: &str = "--drop:";

/// Which section of a migration file to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Drop,
}

impl Operation {
    /// Marker keyword without the leading dashes and trailing colon.
    pub fn keyword(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Drop => "drop",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.keyword().to_uppercase())
    }
}

/// The table name and SQL body extracted for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub table: String,
    pub sql: String,
}
