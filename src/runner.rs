//! Migration runner.
//!
//! Each file goes through read → extract → qualify → execute. The first
//! failure stops the run; files already executed stay applied.

use std::fs;
use std::path::{Path, PathBuf};

use colored::*;
use tracing::{debug, info};

use crate::config::Config;
use crate::db::Execute;
use crate::error::{Error, Result};
use crate::migrate::{extract_section, list_migration_files, qualify, Operation};

/// Which migration files a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// One file, relative to the migrations directory.
    File(String),
    /// Every file in the migrations directory, in file name order.
    All,
}

/// Qualified SQL ready to execute for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub file: String,
    pub table: String,
    pub sql: String,
}

/// Files executed by a run, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub executed: Vec<String>,
}

pub struct Runner<'a> {
    config: &'a Config,
    dir: PathBuf,
}

impl<'a> Runner<'a> {
    pub fn new(config: &'a Config, dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve the target to file names.
    pub fn files(&self, target: &Target) -> Result<Vec<String>> {
        match target {
            Target::File(name) => Ok(vec![name.clone()]),
            Target::All => list_migration_files(&self.dir),
        }
    }

    /// Read, extract and qualify one file.
    pub fn prepare(&self, file: &str, op: Operation) -> Result<Statement> {
        let path = self.dir.join(file);

        debug!(file, "reading");
        let text = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;

        debug!(file, "parsing");
        let section = extract_section(&text, op)?;

        debug!(file, table = %section.table, "qualifying");
        let sql = qualify(&section.sql, &self.config.schema, &section.table, op);

        Ok(Statement {
            file: file.to_string(),
            table: section.table,
            sql,
        })
    }

    /// Prepare every statement of `target` without executing anything.
    pub fn plan(&self, target: &Target, op: Operation) -> Result<Vec<Statement>> {
        self.files(target)?
            .iter()
            .map(|file| self.prepare(file, op))
            .collect()
    }

    /// Execute `target` one file at a time, stopping at the first error.
    pub async fn run<E: Execute>(
        &self,
        exec: &mut E,
        target: &Target,
        op: Operation,
    ) -> Result<RunReport> {
        let files = self.files(target)?;
        let mut report = RunReport::default();

        if files.is_empty() {
            println!("{} No migration files in {}", "!".yellow(), self.dir.display());
            return Ok(report);
        }

        for (i, file) in files.iter().enumerate() {
            println!(
                "  {} {} {}",
                format!("[{}/{}]", i + 1, files.len()).cyan(),
                op.to_string().yellow(),
                file
            );

            let statement = self.prepare(file, op)?;

            debug!(file = %statement.file, sql = %statement.sql, "executing");
            let rows = exec
                .execute_sql(&statement.sql)
                .await
                .map_err(|source| Error::Execution {
                    file: file.clone(),
                    source,
                })?;

            info!(file = %file, table = %statement.table, rows, "succeeded");
            println!("  {} SQL executed successfully: {}", "✓".green(), file);
            report.executed.push(file.clone());
        }

        Ok(report)
    }
}
