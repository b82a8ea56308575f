//! sqlrunner - run the CREATE or DROP section of hand-written SQL migrations.
//!
//! # Example
//! ```
//! use sqlrunner::migrate::{extract_section, qualify, Operation};
//!
//! let text = "--create:widgets\nCREATE TABLE widgets (id int);\n--drop:widgets\nDROP TABLE widgets;";
//!
//! let section = extract_section(text, Operation::Drop).unwrap();
//! let sql = qualify(&section.sql, "app", &section.table, Operation::Drop);
//! assert_eq!(sql, "DROP TABLE app.widgets CASCADE;");
//! ```

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod migrate;
pub mod runner;

pub use config::Config;
pub use error::{Error, Result};
pub use migrate::{Operation, Section};
pub use runner::{RunReport, Runner, Statement, Target};
