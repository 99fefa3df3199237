//! Tessera CLI - Command-line interface
//!
//! Inspects what the tile pipeline would do for a map configuration:
//! filtered queries and identities, tile geometry and aggregation queries.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tessera::config::ConfigFile;
use tessera::logging::{init_console_logging, init_logging, LoggingGuard, DEFAULT_LOG_LEVEL};

use commands::aggregation::AggregationArgs;
use commands::filter::FilterArgs;
use commands::geometry::GeometryArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "tessera")]
#[command(version, about = "Map tile pipeline inspection tool", long_about = None)]
struct Cli {
    /// Settings file (defaults to ~/.tessera/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to the configured log file
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply widget filters to a map configuration
    Filter(FilterArgs),

    /// Print the projected geometry of a tile
    Geometry(GeometryArgs),

    /// Build the aggregation query of a tile
    AggregationSql(AggregationArgs),
}

fn main() {
    let cli = Cli::parse();

    let settings = match commands::common::load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => e.exit(),
    };

    // Keep the guard alive until exit so buffered logs are flushed
    let _guard = match setup_logging(&cli, &settings) {
        Ok(guard) => guard,
        Err(e) => e.exit(),
    };

    let result = match cli.command {
        Commands::Filter(args) => commands::filter::run(args),
        Commands::Geometry(args) => commands::geometry::run(args, settings.tiling()),
        Commands::AggregationSql(args) => commands::aggregation::run(args, &settings),
    };

    if let Err(e) = result {
        e.exit();
    }
}

fn setup_logging(cli: &Cli, settings: &ConfigFile) -> Result<Option<LoggingGuard>, CliError> {
    let level = if cli.verbose { "debug" } else { DEFAULT_LOG_LEVEL };

    if cli.log_file {
        let guard = init_logging(&settings.logging.directory, &settings.logging.file, level)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;
        Ok(Some(guard))
    } else {
        init_console_logging(level).map_err(|e| CliError::LoggingInit(e.to_string()))?;
        Ok(None)
    }
}
