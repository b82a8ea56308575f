//! Connection configuration.
//!
//! Every value is resolved once at startup, in order of precedence:
//!
//! 1. environment variable (`DB_HOST`, `DB_PORT`, ...)
//! 2. TOML config file, `[database]` table
//! 3. built-in default
//!
//! ```toml
//! [database]
//! host = "db"
//! port = 5433
//! name = "appdb"
//! schema = "app"
//! sslmode = "require"
//! ```
//!
//! Blank values count as unset. A `DB_PORT` that is not a valid port number
//! is ignored.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::error::{Error, Result};

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "sqlrunner.toml";

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_USER: &str = "postgres";
pub const DEFAULT_PASSWORD: &str = "password";
pub const DEFAULT_DATABASE: &str = "postgres";
pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_SSL_MODE: &str = "disable";

/// Database connection parameters. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub schema: String,
    pub ssl_mode: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user: DEFAULT_USER.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            schema: DEFAULT_SCHEMA.to_string(),
            ssl_mode: DEFAULT_SSL_MODE.to_string(),
        }
    }
}

/// Shape of the config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub database: DatabaseSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub schema: Option<String>,
    pub sslmode: Option<String>,
}

impl FileConfig {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&content).map_err(|e| match e {
            Error::InvalidConfig(msg) => {
                Error::InvalidConfig(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }
}

impl Config {
    /// Build from the process environment only.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, without a config file.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::layered(lookup, &FileConfig::default())
    }

    /// Resolve every field: `lookup` first, then `file`, then the default.
    pub fn layered<F>(lookup: F, file: &FileConfig) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let db = &file.database;
        let pick = |key: &str, from_file: &Option<String>, default: &str| {
            non_blank(lookup(key))
                .or_else(|| non_blank(from_file.clone()))
                .unwrap_or_else(|| default.to_string())
        };

        let port = non_blank(lookup("DB_PORT"))
            .and_then(|p| p.trim().parse::<u16>().ok())
            .or(db.port)
            .unwrap_or(DEFAULT_PORT);

        Self {
            host: pick("DB_HOST", &db.host, DEFAULT_HOST),
            port,
            user: pick("DB_USER", &db.user, DEFAULT_USER),
            password: pick("DB_PASSWORD", &db.password, DEFAULT_PASSWORD),
            database: pick("DB_NAME", &db.name, DEFAULT_DATABASE),
            schema: pick("DB_SCHEMA", &db.schema, DEFAULT_SCHEMA),
            ssl_mode: pick("DB_SSLMODE", &db.sslmode, DEFAULT_SSL_MODE),
        }
    }

    /// Load from the environment layered over the config file, if one is found.
    ///
    /// An explicit `path` must exist. Without one, `./sqlrunner.toml` and then
    /// `<config dir>/sqlrunner/config.toml` are tried.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => FileConfig::read(path)?,
            None => match default_config_path() {
                Some(path) => FileConfig::read(&path)?,
                None => FileConfig::default(),
            },
        };
        Ok(Self::layered(|key| std::env::var(key).ok(), &file))
    }

    pub fn ssl_mode(&self) -> Result<PgSslMode> {
        match self.ssl_mode.trim().to_ascii_lowercase().as_str() {
            "disable" => Ok(PgSslMode::Disable),
            "allow" => Ok(PgSslMode::Allow),
            "prefer" => Ok(PgSslMode::Prefer),
            "require" => Ok(PgSslMode::Require),
            "verify-ca" => Ok(PgSslMode::VerifyCa),
            "verify-full" => Ok(PgSslMode::VerifyFull),
            other => Err(Error::InvalidConfig(format!("unknown sslmode {:?}", other))),
        }
    }

    /// Connection options targeting `database` (not necessarily `self.database`).
    pub fn connect_options(&self, database: &str) -> Result<PgConnectOptions> {
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(database)
            .ssl_mode(self.ssl_mode()?))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("sqlrunner").join("config.toml"))
        .filter(|path| path.is_file())
}

// Password stays out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "postgres://{}@{}:{}/{} (schema {}, sslmode {})",
            self.user, self.host, self.port, self.database, self.schema, self.ssl_mode
        )
    }
}
