use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::*;
use sqlx::PgConnection;
use tracing::debug;

use sqlrunner::cli::{Cli, Command};
use sqlrunner::{db, logging, migrate, Config, Operation, RunReport, Runner, Target};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::parse_args(std::env::args()) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(e.exit_code() as u8);
        }
    };

    let dotenv = dotenvy::dotenv();
    logging::init(cli.verbose);
    if dotenv.is_err() {
        debug!("no .env file found, using process environment");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command()? {
        Command::Generate { name } => {
            let path = migrate::generate(&cli.dir, &name).context("SQL file generation failed")?;
            println!(
                "{} SQL file generated successfully: {}",
                "✓".green(),
                path.display().to_string().yellow()
            );
            Ok(())
        }
        Command::Run { op, target, plan } => {
            let config =
                Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
            let runner = Runner::new(&config, &cli.dir);
            if plan {
                print_plan(&runner, &target, op)
            } else {
                apply(&config, &runner, &target, op).await
            }
        }
    }
}

/// Check the database, open one connection, run, and always close it.
async fn apply(config: &Config, runner: &Runner<'_>, target: &Target, op: Operation) -> Result<()> {
    println!(
        "{} {} {}",
        "Migrating".cyan().bold(),
        op.to_string().cyan().bold(),
        config.to_string().yellow()
    );

    db::ensure_database_exists(config)
        .await
        .context("Database not found")?;
    let mut conn = db::connect(config)
        .await
        .context("Database connection failed")?;

    let result = migrate_on(&mut conn, config, runner, target, op).await;
    db::close(conn).await;
    let report = result?;

    println!(
        "{}",
        format!("✓ {} file(s) executed", report.executed.len())
            .green()
            .bold()
    );
    Ok(())
}

async fn migrate_on(
    conn: &mut PgConnection,
    config: &Config,
    runner: &Runner<'_>,
    target: &Target,
    op: Operation,
) -> Result<RunReport> {
    if db::ensure_schema_exists(conn, &config.schema)
        .await
        .context("Schema does not exist")?
    {
        println!("  {} Created schema {}", "✓".green(), config.schema.cyan());
    }

    runner
        .run(conn, target, op)
        .await
        .context("Migration aborted")
}

fn print_plan(runner: &Runner<'_>, target: &Target, op: Operation) -> Result<()> {
    println!("{}", format!("📋 {} plan (dry-run)", op).cyan().bold());
    println!("  {}", runner.dir().display().to_string().dimmed());
    println!();

    let statements = runner.plan(target, op).context("Failed to prepare SQL")?;
    if statements.is_empty() {
        println!("{} No migration files found", "!".yellow());
        return Ok(());
    }

    for (i, stmt) in statements.iter().enumerate() {
        println!(
            "{} {} {}",
            format!("{}.", i + 1).cyan(),
            stmt.file.yellow(),
            format!("({})", stmt.table).dimmed()
        );
        for line in stmt.sql.lines() {
            println!("   {}", line);
        }
        println!();
    }

    println!(
        "{} Run again without -plan to execute",
        "💡".yellow()
    );
    Ok(())
}
