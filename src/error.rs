//! Error types for sqlrunner.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can stop a run.
///
/// None of these are retried: the binary reports the first one and exits.
#[derive(Debug, Error)]
pub enum Error {
    /// No `--create:` / `--drop:` header applies to the requested operation.
    #[error("table name not found in SQL header (expected a `--{marker}:<table>` line)")]
    MissingTableMarker { marker: &'static str },

    #[error("empty SQL body for table {table}")]
    EmptySqlBody { table: String },

    #[error("migration file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot connect to database {database}: {source}")]
    Connection {
        database: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("database {name:?} does not exist")]
    DatabaseMissing { name: String },

    #[error("cannot create schema {schema:?}: {source}")]
    SchemaCreation {
        schema: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("SQL execution failed for {file}: {source}")]
    Execution {
        file: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("file already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("{0}")]
    InvalidFlags(String),

    #[error("invalid migration name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Wrap an I/O error, mapping `NotFound` to [`Error::FileNotFound`].
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound { path }
        } else {
            Error::Io { path, source }
        }
    }
}
