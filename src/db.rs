//! PostgreSQL connectivity: existence checks, the run connection, and the
//! statement execution seam used by the runner.

use sqlx::{Connection, PgConnection};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};

/// Database used for the existence check, present on every server.
pub const MAINTENANCE_DATABASE: &str = "postgres";

/// Something that can run a raw SQL string.
///
/// Implemented for [`PgConnection`]; tests substitute a recorder.
#[allow(async_fn_in_trait)]
pub trait Execute {
    /// Run `sql` as-is and return the number of rows affected.
    async fn execute_sql(&mut self, sql: &str) -> std::result::Result<u64, sqlx::Error>;
}

impl Execute for PgConnection {
    async fn execute_sql(&mut self, sql: &str) -> std::result::Result<u64, sqlx::Error> {
        // No bind arguments: sqlx sends this over the simple query protocol,
        // so a body holding several statements runs as written.
        let done = sqlx::Executor::execute(&mut *self, sql).await?;
        Ok(done.rows_affected())
    }
}

/// Fail with [`Error::DatabaseMissing`] unless the configured database exists.
///
/// Connects to the maintenance database, never creates anything.
pub async fn ensure_database_exists(config: &Config) -> Result<()> {
    let options = config.connect_options(MAINTENANCE_DATABASE)?;
    let connection_error = |source| Error::Connection {
        database: MAINTENANCE_DATABASE.to_string(),
        source,
    };

    let mut conn = PgConnection::connect_with(&options)
        .await
        .map_err(connection_error)?;

    let exists: std::result::Result<bool, sqlx::Error> =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(&config.database)
            .fetch_one(&mut conn)
            .await;
    close(conn).await;

    if exists.map_err(connection_error)? {
        debug!(database = %config.database, "database exists");
        Ok(())
    } else {
        Err(Error::DatabaseMissing {
            name: config.database.clone(),
        })
    }
}

/// Open the single connection a run uses for every statement.
pub async fn connect(config: &Config) -> Result<PgConnection> {
    let options = config.connect_options(&config.database)?;
    let conn = PgConnection::connect_with(&options)
        .await
        .map_err(|source| Error::Connection {
            database: config.database.clone(),
            source,
        })?;
    debug!(%config, "connected");
    Ok(conn)
}

/// Make sure `schema` exists, creating it if needed. Returns `true` if it was created.
pub async fn ensure_schema_exists(conn: &mut PgConnection, schema: &str) -> Result<bool> {
    let schema_error = |source| Error::SchemaCreation {
        schema: schema.to_string(),
        source,
    };

    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM information_schema.schemata WHERE schema_name = $1)",
    )
    .bind(schema)
    .fetch_one(&mut *conn)
    .await
    .map_err(schema_error)?;

    if exists {
        return Ok(false);
    }

    conn.execute_sql(&format!("CREATE SCHEMA {}", quote_identifier(schema)))
        .await
        .map_err(schema_error)?;
    debug!(schema, "created schema");
    Ok(true)
}

/// Close a connection, logging instead of failing: the run result matters more.
pub async fn close(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        warn!(error = %e, "failed to close database connection cleanly");
    }
}

/// Double-quote an identifier, doubling any embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
