//! coltab CLI
//!
//! Command-line interface for working with a coltab table directory.

use std::process;
use std::time::Duration;

use clap::{Args as ClapArgs, Parser, Subcommand};
use coltab::report::{self, ErrorMode, Outcome};
use coltab::{Config, Record, SearchQuery, Table, Value};
use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};

/// coltab CLI
#[derive(Parser, Debug)]
#[command(name = "coltab")]
#[command(about = "Embedded fixed-width column table store")]
#[command(version)]
struct Args {
    /// Table directory
    #[arg(short, long, default_value = "./coltab_data")]
    table: String,

    /// Print `false` on failure instead of a JSON error report
    #[arg(long)]
    silent: bool,

    /// Delay before the single lock retry, in milliseconds
    #[arg(long, default_value = "1000")]
    lock_retry_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the table directory and an empty digest
    CreateTable,

    /// Add a column to the table
    CreateColumn {
        /// Column name
        name: String,

        /// Maximum value length in bytes (clamped to 1..=100)
        #[arg(short, long, default_value = "50")]
        capacity: usize,
    },

    /// Insert a record from `column=value` pairs (`a|b` stores a list)
    Insert {
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Search and print matching records
    Search {
        #[command(flatten)]
        search: SearchArgs,

        /// Print every match instead of the first
        #[arg(long)]
        all: bool,
    },

    /// Overwrite (or append) a value on every matching record
    Update {
        #[command(flatten)]
        search: SearchArgs,

        /// New value
        #[arg(long)]
        value: String,

        /// Columns to write (default: all)
        #[arg(long = "target")]
        targets: Vec<String>,
    },

    /// Append an item to the list on every matching record
    Attach {
        #[command(flatten)]
        search: SearchArgs,

        /// Item to append
        #[arg(long)]
        item: String,

        /// Columns to write (default: all)
        #[arg(long = "target")]
        targets: Vec<String>,
    },

    /// Remove an item from the list on every matching record
    Detach {
        #[command(flatten)]
        search: SearchArgs,

        /// Item to remove
        #[arg(long)]
        item: String,

        /// Columns to write (default: all)
        #[arg(long = "target")]
        targets: Vec<String>,

        /// Match the item case-sensitively
        #[arg(long)]
        item_case_sensitive: bool,
    },
}

#[derive(ClapArgs, Debug)]
struct SearchArgs {
    /// Search term (omit to match every record)
    term: Option<String>,

    /// Column to search (repeatable, default: all)
    #[arg(short, long = "column")]
    columns: Vec<String>,

    /// Maximum number of matches (clamped to 1..=100)
    #[arg(short, long, default_value = "1")]
    limit: usize,

    /// Match the whole value instead of a substring
    #[arg(long)]
    whole: bool,

    /// Compare case-sensitively
    #[arg(long)]
    case_sensitive: bool,
}

impl SearchArgs {
    fn query(&self) -> SearchQuery {
        let query = match &self.term {
            Some(term) => SearchQuery::term(term.clone()),
            None => SearchQuery::all(),
        };
        query
            .columns(self.columns.iter().cloned())
            .limit(self.limit)
            .match_whole(self.whole)
            .case_sensitive(self.case_sensitive)
    }
}

fn main() {
    // Logs go to stderr, results to stdout
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,coltab=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mode = ErrorMode::from_flag(!args.silent);

    let config = Config::builder()
        .table_dir(&args.table)
        .lock_retry_delay(Duration::from_millis(args.lock_retry_ms))
        .error_mode(mode)
        .build();

    match report::settle(run(config, args.command), mode) {
        Outcome::Done(output) => println!("{}", output),
        Outcome::Failed => {
            println!("false");
            process::exit(1);
        }
        Outcome::Reported(report) => {
            match report.to_json() {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("{}: {}", report.kind, report.message),
            }
            process::exit(1);
        }
    }
}

fn run(config: Config, command: Commands) -> coltab::Result<String> {
    match command {
        Commands::CreateTable => {
            Table::create(config)?;
            Ok("true".to_string())
        }
        Commands::CreateColumn { name, capacity } => {
            Table::open(config)?.create_column(&name, capacity)?;
            Ok("true".to_string())
        }
        Commands::Insert { values } => {
            let table = Table::open(config)?;
            let pairs = values
                .iter()
                .map(|pair| match pair.split_once('=') {
                    Some((column, value)) => Ok((column, Value::from_raw(value))),
                    None => Err(coltab::CoreError::UnsafeInput(pair.clone())),
                })
                .collect::<coltab::Result<Vec<_>>>()?;
            let key = table.insert(pairs)?;
            Ok(key.to_string())
        }
        Commands::Search { search, all } => {
            let table = Table::open(config)?;
            let cursor = table.search(&search.query())?;
            if all {
                let records = table.read_all(&cursor)?;
                Ok(json!(records.iter().map(record_json).collect::<Vec<_>>()).to_string())
            } else {
                Ok(record_json(&table.read_first(&cursor)?).to_string())
            }
        }
        Commands::Update {
            search,
            value,
            targets,
        } => {
            let table = Table::open(config)?;
            let cursor = table.search(&search.query())?;
            table.overwrite_or_append(cursor, Value::from_raw(&value), &as_strs(&targets))?;
            Ok("true".to_string())
        }
        Commands::Attach {
            search,
            item,
            targets,
        } => {
            let table = Table::open(config)?;
            let cursor = table.search(&search.query())?;
            table.list_append(cursor, &item, &as_strs(&targets))?;
            Ok("true".to_string())
        }
        Commands::Detach {
            search,
            item,
            targets,
            item_case_sensitive,
        } => {
            let table = Table::open(config)?;
            let cursor = table.search(&search.query())?;
            table.list_remove(cursor, &item, &as_strs(&targets), item_case_sensitive)?;
            Ok("true".to_string())
        }
    }
}

fn as_strs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}

fn record_json(record: &Record) -> serde_json::Value {
    let fields: serde_json::Map<String, serde_json::Value> = record
        .fields()
        .iter()
        .map(|(name, value)| {
            let value = match value {
                Value::Scalar(s) => json!(s),
                Value::List(items) => json!(items),
            };
            (name.clone(), value)
        })
        .collect();

    json!({ "key": record.key().to_string(), "fields": fields })
}
