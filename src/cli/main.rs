//! CLI binary entry point for schema-bootstrap

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use schema_bootstrap::cli::commands::init::{InitArgs, handle_init};
use schema_bootstrap::cli::commands::inspect::{InspectArgs, OutputFormat, handle_inspect};
use schema_bootstrap::cli::commands::lifecycle::{LifecycleArgs, Operation, handle_lifecycle};
use schema_bootstrap::database::config::DatabaseBackendType;

#[derive(Parser)]
#[command(name = "schema-bootstrap")]
#[command(about = "Create, populate and drop a schema from SQL definition files")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Workspace directory holding .schema-bootstrap.toml
    #[arg(short, long, global = true, default_value = ".")]
    workspace: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a workspace configuration
    Init {
        /// Store backend
        #[arg(long, value_enum, default_value = "duckdb")]
        backend: BackendArg,
        /// PostgreSQL connection string (postgres backend)
        #[arg(long)]
        connection_string: Option<String>,
        /// SQL definition sources to record, in ingestion order
        #[arg(long = "source")]
        sources: Vec<String>,
        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },
    /// Print the tables, views and per-source blocks without touching a store
    Inspect {
        /// SQL definition sources (defaults to the configured ones)
        sources: Vec<String>,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: FormatArg,
    },
    /// Drop and recreate the schema in one transaction, then populate it
    Create {
        /// SQL definition sources (defaults to the configured ones)
        sources: Vec<String>,
    },
    /// Drop every table and view the sources declare
    Drop {
        /// SQL definition sources (defaults to the configured ones)
        sources: Vec<String>,
    },
    /// Batch bootstrap, falling back to one statement at a time
    Bootstrap {
        /// SQL definition sources (defaults to the configured ones)
        sources: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Duckdb,
    Postgres,
}

impl From<BackendArg> for DatabaseBackendType {
    fn from(backend: BackendArg) -> Self {
        match backend {
            BackendArg::Duckdb => DatabaseBackendType::DuckDB,
            BackendArg::Postgres => DatabaseBackendType::Postgres,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();
}

fn run(cli: Cli) -> Result<bool> {
    let workspace = cli.workspace;
    let lifecycle = |sources: Vec<String>, operation: Operation| {
        handle_lifecycle(&LifecycleArgs {
            workspace: workspace.clone(),
            sources,
            operation,
        })
        .with_context(|| format!("{} failed", operation))
    };

    match cli.command {
        Commands::Init {
            backend,
            connection_string,
            sources,
            force,
        } => {
            let path = handle_init(&InitArgs {
                workspace: workspace.clone(),
                backend: backend.into(),
                connection_string,
                sources,
                force,
            })
            .context("Failed to write configuration")?;
            println!("Wrote {}", path.display());
            Ok(true)
        }
        Commands::Inspect { sources, format } => {
            handle_inspect(&InspectArgs {
                workspace: workspace.clone(),
                sources,
                format: format.into(),
            })
            .context("Failed to inspect sources")?;
            Ok(true)
        }
        Commands::Create { sources } => lifecycle(sources, Operation::Create),
        Commands::Drop { sources } => lifecycle(sources, Operation::Drop),
        Commands::Bootstrap { sources } => lifecycle(sources, Operation::Bootstrap),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            eprintln!("Error: operation did not complete, see log for details");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
