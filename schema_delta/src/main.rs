//! schema_delta command line interface

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use schema_delta::config::{self, DEFAULT_CONFIG_FILE};
use schema_delta::utils::logging::init_logging;
use schema_delta::{diff, render_summary, Schema, SchemaComparison, SchemaDeltaClient};

#[derive(Parser, Debug)]
#[command(name = "schema_delta")]
#[command(about = "Plans (and applies) the DDL that brings MySQL databases in line with a schema snapshot", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log at DEBUG level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Diff two snapshot files without touching a database
    Diff {
        /// Authoritative snapshot
        local: PathBuf,

        /// Snapshot of the database to update
        remote: PathBuf,

        /// Schema to pick when a snapshot holds several
        #[arg(long)]
        schema: Option<String>,

        /// Database name used in `ALTER DATABASE` statements
        #[arg(long)]
        database: Option<String>,

        /// Print the comparison as JSON
        #[arg(long, conflicts_with = "summarize")]
        json: bool,

        /// Print only the counters
        #[arg(long)]
        summarize: bool,
    },

    /// Compare configured connections against the local snapshot
    Compare {
        /// Local schema name (requires CONNECTION)
        #[arg(requires = "connection")]
        schema: Option<String>,

        /// Connection key
        connection: Option<String>,

        /// Print only the counters
        #[arg(long, conflicts_with = "json")]
        summarize: bool,

        /// Apply the changes after printing them
        #[arg(long)]
        apply: bool,

        /// Print the comparisons as JSON
        #[arg(long)]
        json: bool,
    },

    /// Import a connection's live schema into the local snapshot
    Import {
        /// Connection key
        connection: String,

        /// Write a standalone snapshot here instead of updating the local snapshot
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Diff {
            local,
            remote,
            schema,
            database,
            json,
            summarize,
        } => {
            let logging = if cli.config.exists() {
                load_config(&cli.config)?.logging
            } else {
                None
            };
            init_logging(&logging, cli.verbose).context("Failed to initialize logging")?;

            let local_schema = Schema::load_from_file(&local, schema.as_deref())
                .with_context(|| format!("Failed to load {}", local.display()))?;
            let remote_schema = Schema::load_from_file(&remote, schema.as_deref())
                .with_context(|| format!("Failed to load {}", remote.display()))?;

            let database = database.unwrap_or_else(|| local_schema.name.clone());
            let comparison = diff(&local_schema, &remote_schema, &database)?;
            print_comparisons(&[comparison], json, summarize)?;
        }
        Command::Compare {
            schema,
            connection,
            summarize,
            apply,
            json,
        } => {
            let client = SchemaDeltaClient::new(load_config(&cli.config)?);
            init_logging(&client.config().logging, cli.verbose)
                .context("Failed to initialize logging")?;

            let comparisons = match (schema, connection) {
                (Some(schema), Some(connection)) => {
                    vec![client.compare_single(&schema, &connection).await?]
                }
                _ => client.compare_all().await?,
            };
            print_comparisons(&comparisons, json, summarize)?;

            if apply {
                for comparison in comparisons.iter().filter(|c| !c.is_empty()) {
                    let report = client.apply(comparison).await.with_context(|| {
                        format!("Failed to apply changes to {}", comparison.database_key)
                    })?;
                    tracing::info!(
                        key = %comparison.database_key,
                        applied = report.applied,
                        skipped = report.skipped,
                        "apply finished"
                    );
                }
            }
        }
        Command::Import { connection, output } => {
            let client = SchemaDeltaClient::new(load_config(&cli.config)?);
            init_logging(&client.config().logging, cli.verbose)
                .context("Failed to initialize logging")?;

            let schema = client.import(&connection).await?;
            match output {
                Some(path) => {
                    schema
                        .save_to_file(&path)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!(path = %path.display(), tables = schema.tables.len(), "snapshot written");
                }
                None => client.store_local_schema(schema).with_context(|| {
                    format!("Failed to update {}", client.config().schema.path)
                })?,
            }
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<config::Config> {
    let path = path
        .to_str()
        .with_context(|| format!("Config path is not valid UTF-8: {}", path.display()))?;
    Ok(config::load_from_file(path)?)
}

fn print_comparisons(comparisons: &[SchemaComparison], json: bool, summarize: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(comparisons)?);
    } else if summarize {
        print!("{}", render_summary(comparisons));
    } else {
        for comparison in comparisons {
            print!("{}", comparison.to_sql_script());
        }
    }
    Ok(())
}
