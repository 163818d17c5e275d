//! Tablemap CLI - compile entity declarations and create their SQLite tables

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tablemap::config;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "tablemap")]
#[command(version)]
#[command(about = "Declarative table mapping for SQLite")]
#[command(long_about = r#"
Tablemap compiles entity declarations into validated SQLite tables:
  • Column, table, index and trigger definitions with named constraints
  • Parameterized INSERT/UPDATE/DELETE statements with optimistic versioning

Example usage:
  tablemap init
  tablemap check --schema schema.toml
  tablemap ddl --schema schema.toml
  tablemap apply --schema schema.toml --database app.db
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print machine-readable JSON instead of styled text
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file (defaults to tablemap.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile every declaration and report errors per entity
    Check {
        /// Entity declaration file
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },

    /// Print the DDL of every declaration that compiles
    Ddl {
        /// Entity declaration file
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },

    /// Create the declared tables in a SQLite database
    Apply {
        /// Entity declaration file
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Write a starter tablemap.toml
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(self) -> bool {
        self == OutputMode::Human
    }
}

/// Print a JSON result envelope on stdout.
pub fn emit_success(command: &str, data: serde_json::Value) -> anyhow::Result<()> {
    let envelope = serde_json::json!({
        "command": command,
        "status": "ok",
        "data": data,
    });
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
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
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let settings = config::load_config(Some(&config_path))?.unwrap_or_default();

    let schema_file = |schema: Option<PathBuf>| {
        settings.schema_path(schema).ok_or_else(|| {
            anyhow::anyhow!("no schema file given (use --schema or set `schema` in tablemap.toml)")
        })
    };

    match cli.command {
        Commands::Check { schema } => {
            if !commands::run_check(&schema_file(schema)?, output_mode)? {
                std::process::exit(1);
            }
        }

        Commands::Ddl { schema } => {
            commands::run_ddl(&schema_file(schema)?, output_mode)?;
        }

        Commands::Apply { schema, database } => {
            let database = settings
                .database_path(database)
                .unwrap_or_else(config::default_database_path);
            tracing::info!("Applying schema to {}", database.display());
            commands::run_apply(&schema_file(schema)?, &database, output_mode)?;
        }

        Commands::Init { force } => {
            commands::run_init(&config_path, force, output_mode)?;
        }
    }

    Ok(())
}
