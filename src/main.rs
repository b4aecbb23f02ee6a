//! Binary entry point for schemadex.
//!
//! This binary builds the schema index and serves it to agents over MCP.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use schemadex::catalog::open_catalog;
use schemadex::mcp::McpServer;
use schemadex::observability::{self, LoggingConfig, MetricsConfig};
use schemadex::{SchemaIndex, SchemadexConfig, SessionFactory};
use std::path::PathBuf;
use std::process::ExitCode;

/// Schemadex - a preloaded schema and business-rules index for SQL agents.
#[derive(Parser)]
#[command(name = "schemadex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "SCHEMADEX_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Scan the database, match guides, and write the index cache.
    Build,

    /// Build the index, then serve the exploration tools over stdio.
    Serve,

    /// Print schemas, a schema's tables, or a table description.
    Inspect {
        /// Read the cache file instead of scanning the database.
        #[arg(long)]
        cache: bool,

        /// Schema to list tables for.
        schema: Option<String>,

        /// Table to describe.
        table: Option<String>,
    },

    /// Print the business rules guide for a schema.
    Rules {
        /// Schema name.
        schema: String,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match SchemadexConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init(LoggingConfig::from_settings(&config.logging, cli.verbose))
    {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    if let Err(e) = observability::install_prometheus(&MetricsConfig::from_settings(&config.metrics))
    {
        eprintln!("Failed to start metrics exporter: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(command: Commands, config: &SchemadexConfig) -> Result<()> {
    match command {
        Commands::Build => cmd_build(config),
        Commands::Serve => cmd_serve(config),
        Commands::Inspect {
            cache,
            schema,
            table,
        } => cmd_inspect(config, cache, schema, table),
        Commands::Rules { schema } => cmd_rules(config, &schema),
    }
}

/// Scans the configured database and builds a fresh index.
fn build_index(config: &SchemadexConfig) -> Result<SchemaIndex> {
    let catalog = open_catalog(&config.database).context("opening database")?;
    SchemaIndex::build(catalog, &config.build_options()).context("building schema index")
}

fn cmd_build(config: &SchemadexConfig) -> Result<()> {
    let index = build_index(config)?;

    println!("Index built:");
    println!("  Schemas: {}", index.list_schemas().len());
    println!("  Tables:  {}", index.table_count());
    println!("  Guides:  {}", index.guide_topics().join(", "));
    println!("  Cache:   {}", config.cache_path.display());
    Ok(())
}

fn cmd_serve(config: &SchemadexConfig) -> Result<()> {
    let index = build_index(config)?;
    let factory = SessionFactory::new(index).with_max_columns(config.max_columns);

    tracing::info!("Serving MCP on stdio");
    let mut server = McpServer::new(factory.session());
    server.start().context("serving MCP")?;
    Ok(())
}

fn cmd_inspect(
    config: &SchemadexConfig,
    from_cache: bool,
    schema: Option<String>,
    table: Option<String>,
) -> Result<()> {
    let index = if from_cache {
        SchemaIndex::load_cache(&config.cache_path).context("loading index cache")?
    } else {
        build_index(config)?
    };

    match (schema, table) {
        (None, _) => {
            for name in index.list_schemas() {
                let marker = if index.guide(name).is_some() { " (guide)" } else { "" };
                println!("{name}{marker}: {} tables", index.list_tables(name).len());
            }
        },
        (Some(schema), None) => {
            if !index.has_schema(&schema) {
                bail!("schema '{schema}' not found");
            }
            for name in index.list_tables(&schema) {
                println!("{name}");
            }
        },
        (Some(schema), Some(table)) => {
            let Some(text) = index.describe_table(&schema, &table, config.max_columns) else {
                bail!("table '{schema}.{table}' not found");
            };
            println!("{text}");
        },
    }
    Ok(())
}

fn cmd_rules(config: &SchemadexConfig, schema: &str) -> Result<()> {
    let index = build_index(config)?;
    match index.guide(schema) {
        Some(guide) => {
            println!("# Source: {}\n", guide.file);
            println!("{}", guide.content);
            Ok(())
        },
        None => bail!(
            "no business rules guide for schema '{schema}' (topics: {})",
            index.guide_topics().join(", ")
        ),
    }
}
