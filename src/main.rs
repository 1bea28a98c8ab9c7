//! Interactive SQL shell over CSV files.
//!
//! # Usage
//!
//! ```bash
//! # Load one table and start the shell
//! minisql employees data/employees.csv
//!
//! # Load several tables
//! minisql -t employees=data/employees.csv -t products=data/products.csv
//!
//! # Run a single query and exit
//! minisql employees data/employees.csv -c "SELECT COUNT(*) FROM employees"
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use minisql::Database;

mod formatter;
mod repl;

use repl::Repl;

/// Query CSV files with a small SQL dialect
#[derive(Parser, Debug)]
#[command(name = "minisql", version, about)]
struct Args {
    /// Name to register the positional CSV file under
    #[arg(requires = "csv_path")]
    table_name: Option<String>,

    /// CSV file loaded as TABLE_NAME
    csv_path: Option<PathBuf>,

    /// Additional table to load (repeatable)
    #[arg(short = 't', long = "table", value_name = "NAME=PATH", value_parser = parse_table_spec)]
    tables: Vec<TableSpec>,

    /// Execute a single query and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn", env = "MINISQL_LOG")]
    log_level: String,
}

#[derive(Debug, Clone)]
struct TableSpec {
    name: String,
    path: PathBuf,
}

fn parse_table_spec(s: &str) -> Result<TableSpec, String> {
    match s.split_once('=') {
        Some((name, path)) if !name.trim().is_empty() && !path.trim().is_empty() => Ok(TableSpec {
            name: name.trim().to_string(),
            path: PathBuf::from(path.trim()),
        }),
        _ => Err(format!("expected NAME=PATH, got '{s}'")),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut specs = Vec::new();
    if let (Some(name), Some(path)) = (args.table_name, args.csv_path) {
        specs.push(TableSpec { name, path });
    }
    specs.extend(args.tables);

    let Some(first) = specs.first() else {
        bail!("no table to load; usage: minisql <TABLE_NAME> <CSV_PATH> or --table NAME=PATH");
    };
    let example_table = first.name.clone();

    let mut db = Database::new();
    for spec in &specs {
        db.load_csv(&spec.name, &spec.path)
            .with_context(|| format!("Failed to load CSV for table '{}'", spec.name))?;
        if args.command.is_none() {
            println!("Loaded table '{}' from '{}'.", spec.name, spec.path.display());
        }
    }

    match args.command {
        Some(sql) => {
            let result = db.query(&sql)?;
            print!("{}", formatter::format_table(&result));
            Ok(())
        }
        None => Repl::new(db)?.run(&example_table),
    }
}
