//! Command line surface.
//!
//! Flags follow the single-dash style (`-file users.sql -create`); the usual
//! `--file` spelling works too.

use std::path::PathBuf;

use clap::Parser;

use crate::error::{Error, Result};
use crate::migrate::{Operation, DEFAULT_MIGRATIONS_DIR};
use crate::runner::Target;

#[derive(Parser, Debug)]
#[command(
    name = "sqlrunner",
    version,
    about = "Run the CREATE or DROP section of hand-written SQL migration files"
)]
pub struct Cli {
    /// SQL file name (relative to the migrations directory)
    #[arg(long, value_name = "NAME", allow_hyphen_values = true)]
    pub file: Option<String>,

    /// Run the CREATE section
    #[arg(long)]
    pub create: bool,

    /// Run the DROP section
    #[arg(long)]
    pub drop: bool,

    /// Generate a SQL template file named after -file
    #[arg(long = "gen")]
    pub generate: bool,

    /// Run every file in the migrations directory
    #[arg(long)]
    pub all: bool,

    /// Print the qualified SQL instead of executing it
    #[arg(long)]
    pub plan: bool,

    /// Migrations directory
    #[arg(
        long,
        env = "SQLRUNNER_DIR",
        default_value = DEFAULT_MIGRATIONS_DIR,
        allow_hyphen_values = true
    )]
    pub dir: PathBuf,

    /// TOML config file (default: ./sqlrunner.toml if present)
    #[arg(long, value_name = "PATH", allow_hyphen_values = true)]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(long, short)]
    pub verbose: bool,
}

/// What a validated invocation asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Generate {
        name: String,
    },
    Run {
        op: Operation,
        target: Target,
        plan: bool,
    },
}

impl Cli {
    /// Parse `args` (including the program name), accepting single-dash long flags.
    pub fn parse_args<I>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = String>,
    {
        Self::try_parse_from(normalize_args(args))
    }

    /// Check flag combinations.
    pub fn command(&self) -> Result<Command> {
        let file = self
            .file
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty());

        if self.generate {
            if self.create || self.drop || self.all || self.plan {
                return Err(Error::InvalidFlags(
                    "-gen cannot be combined with -create, -drop, -all or -plan".into(),
                ));
            }
            let name = file.ok_or_else(|| {
                Error::InvalidFlags(
                    "-file <file_name> is required with -gen to generate .sql file".into(),
                )
            })?;
            return Ok(Command::Generate {
                name: name.to_string(),
            });
        }

        let op = match (self.create, self.drop) {
            (true, false) => Operation::Create,
            (false, true) => Operation::Drop,
            _ => {
                return Err(Error::InvalidFlags(
                    "Specify exactly one: -create OR -drop".into(),
                ));
            }
        };

        let target = match (self.all, file) {
            (true, None) => Target::All,
            (false, Some(name)) => Target::File(name.to_string()),
            (true, Some(_)) => {
                return Err(Error::InvalidFlags(
                    "-all runs every file; do not combine it with -file".into(),
                ));
            }
            (false, None) => {
                return Err(Error::InvalidFlags(
                    "Please provide a SQL file using -file, or -all".into(),
                ));
            }
        };

        Ok(Command::Run {
            op,
            target,
            plan: self.plan,
        })
    }
}

/// Flags that consume the following argument as their value.
const VALUE_FLAGS: [&str; 3] = ["--file", "--dir", "--config"];

/// Rewrite `-file` style flags to `--file`. Short flags (`-v`) and the value
/// after `-file`, `-dir` or `-config` are left alone.
pub fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out: Vec<String> = Vec::new();
    for (i, arg) in args.into_iter().enumerate() {
        let is_value = out
            .last()
            .is_some_and(|prev| VALUE_FLAGS.contains(&prev.as_str()));
        let single_dash_long = i > 0
            && !is_value
            && arg.len() > 2
            && arg.starts_with('-')
            && !arg.starts_with("--")
            && arg[1..].starts_with(|c: char| c.is_ascii_alphabetic());
        if single_dash_long {
            out.push(format!("-{}", arg));
        } else {
            out.push(arg);
        }
    }
    out
}
