//! Migrations directory listing.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Names of all non-directory entries in `dir`, sorted by file name.
///
/// The sort makes `-all` runs reproducible; it is byte order, so timestamped
/// names from the template generator sort oldest first as long as their
/// prefixes have the same number of digits.
pub fn list_migration_files(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let file_type = entry.file_type().map_err(|e| Error::io(entry.path(), e))?;
        if file_type.is_dir() {
            continue;
        }
        files.push(entry.file_name().to_string_lossy().into_owned());
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sorted_and_skips_directories() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("1700000002-b.sql"), "").unwrap();
        fs::write(tmp.path().join("1700000001-a.sql"), "").unwrap();
        fs::write(tmp.path().join("1700000003-c.sql"), "").unwrap();
        fs::create_dir(tmp.path().join("archive")).unwrap();

        let files = list_migration_files(tmp.path()).unwrap();
        assert_eq!(
            files,
            vec!["1700000001-a.sql", "1700000002-b.sql", "1700000003-c.sql"]
        );
    }

    #[test]
    fn test_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let err = list_migration_files(&tmp.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
