//! ddlguard CLI - flags destructive DDL before a migration runs

use std::io::Read;

use clap::Parser;
use ddlguard::dialect;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "ddlguard")]
#[command(version)]
#[command(about = "Breaking-change detector for SQL DDL migrations")]
#[command(long_about = r#"
ddlguard parses a DDL script and reports the statements that cause
irreversible schema or data loss (drops, truncations, renames, destructive
alters), grouped by the object they affect.

The exit status is 0 whenever classification succeeds, regardless of
findings; it is non-zero only on parse or I/O failure.

Example usage:
  ddlguard --dialect mysql --path migration.sql
  cat migration.sql | ddlguard --dialect pg
"#)]
struct Cli {
    /// SQL dialect of the input script (mysql, pg)
    #[arg(short, long, default_value = "mysql")]
    dialect: String,

    /// Path to the SQL file, or "-" for stdin
    #[arg(short, long, default_value = "-")]
    path: String,

    /// Output format (sql, json)
    #[arg(short, long, default_value = "sql")]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let adapter = dialect::adapter_for(&cli.dialect)
        .ok_or_else(|| anyhow::anyhow!("unsupported dialect: {}", cli.dialect))?;

    let sql = read_input(&cli.path)?;
    let changes = adapter.classify(&sql)?;

    if cli.format == "json" {
        println!("{}", serde_json::to_string_pretty(&changes)?);
    } else if changes.exist() {
        println!("-- Detected destructive changes:");
        print!("{}", changes.format_sql());
    } else {
        println!("-- No destructive changes detected. --");
    }

    Ok(())
}

/// Read the full DDL script from the given path, or from stdin for "-".
fn read_input(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}
