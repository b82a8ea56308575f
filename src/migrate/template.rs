//! Migration template generation.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{CREATE_MARKER, DROP_MARKER};
use crate::error::{Error, Result};

/// Skeleton content for a new migration named `base`.
pub fn template_content(base: &str) -> String {
    format!(
        "{CREATE_MARKER}{base}\n\
         --replace table_name with your table\n\
         --write your create query\n\
         \n\
         {DROP_MARKER}{base}\n\
         --replace table_name with your table\n\
         --write your drop query\n"
    )
}

/// Generate `<unix-timestamp>-<base>.sql` in `dir`, stamped with the current time.
pub fn generate(dir: &Path, name: &str) -> Result<PathBuf> {
    generate_at(dir, name, chrono::Utc::now().timestamp())
}

/// Generate a template stamped with `timestamp` (seconds since the Unix epoch).
///
/// Never overwrites: if the target exists, fails with [`Error::AlreadyExists`]
/// and leaves the existing file untouched.
pub fn generate_at(dir: &Path, name: &str, timestamp: i64) -> Result<PathBuf> {
    let base = base_name(name)?;

    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let path = dir.join(format!("{}-{}.sql", timestamp, base));
    let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(Error::AlreadyExists { path });
        }
        Err(e) => return Err(Error::io(path, e)),
    };

    file.write_all(template_content(base).as_bytes())
        .map_err(|e| Error::io(&path, e))?;

    debug!(path = %path.display(), "generated migration template");
    Ok(path)
}

/// Strip an optional `.sql` suffix and validate what remains.
fn base_name(name: &str) -> Result<&str> {
    let base = name.trim();
    let base = base.strip_suffix(".sql").unwrap_or(base);

    if base.is_empty() {
        return Err(Error::InvalidName {
            name: name.to_string(),
            reason: "name is empty",
        });
    }
    if base.contains(['/', '\\']) {
        return Err(Error::InvalidName {
            name: name.to_string(),
            reason: "name must not contain path separators",
        });
    }

    Ok(base)
}
