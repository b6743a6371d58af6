//! stratc CLI binary
//!
//! The command-line interface of the strategy transpiler. It compiles
//! decorated Python strategy files into Rust modules for the trading
//! engine and keeps the engine's strategy registry in sync.
//!
//! # Usage
//!
//! ```bash
//! # Compile a single strategy
//! stratc compile sure_bets
//!
//! # Compile everything under strategies/ and refresh the registry
//! stratc compile --all
//!
//! # Also emit integration test scaffolds
//! stratc compile --all --emit-tests
//!
//! # Validate without writing anything
//! stratc validate --all
//! stratc validate sure_bets --explain
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use stratc_cli::{
    commands::{self, compile::CompileArgs, validate::ValidateArgs},
    config::CliConfig,
    diagnostics::setup_error_reporting,
    Result,
};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "stratc",
    version = env!("CARGO_PKG_VERSION"),
    about = "Python-to-Rust strategy transpiler for the trading engine",
    long_about = r#"
stratc turns decorated Python strategy files into Rust modules the engine
compiles in, so strategies are prototyped in Python but run without a
Python runtime in the hot path.

EXAMPLES:
    stratc compile sure_bets              # Compile one strategy
    stratc compile --all --emit-tests     # Compile everything with tests
    stratc validate --all --explain       # Validate with source context
    "#
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Set log level (overrides --verbose/--quiet)
    #[arg(long, global = true, value_enum)]
    log: Option<LogLevel>,

    /// Set log output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    log_format: LogFormat,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    directory: Option<PathBuf>,

    /// Directory to scan for strategy sources (overrides config)
    #[arg(long, global = true)]
    strategies_dir: Option<PathBuf>,

    /// Directory for generated strategy modules (overrides config)
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,

    /// Directory for generated test scaffolds (overrides config)
    #[arg(long, global = true)]
    tests_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile Python strategies into engine modules
    Compile(CompileArgs),

    /// Validate strategies without generating code
    Validate(ValidateArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up error reporting
    setup_error_reporting()?;

    // Configure logging
    setup_logging(cli.verbose, cli.quiet, cli.log, cli.log_format)?;

    // Change working directory if specified
    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir).map_err(stratc_cli::CliError::Io)?;
    }

    // Load configuration, flags win over the file
    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.strategies_dir {
        config.paths.strategies = dir;
    }
    if let Some(dir) = cli.out_dir {
        config.paths.output = dir;
    }
    if let Some(dir) = cli.tests_dir {
        config.paths.tests = dir;
    }

    // Execute command
    let result = match cli.command {
        Commands::Compile(args) => commands::compile_command(args, &config),
        Commands::Validate(args) => commands::validate_command(args, &config),
    };

    match result {
        Ok(_) => {
            if cli.verbose > 0 {
                info!("Command completed successfully");
            }
            Ok(())
        }
        Err(e) => {
            use tracing::error;
            eprintln!("{} {}", console::style("error:").red().bold(), e);
            if cli.verbose > 0 {
                error!(?e, "detailed error context");
            }
            std::process::exit(1);
        }
    }
}

fn setup_logging(
    verbose: u8,
    quiet: bool,
    log_level: Option<LogLevel>,
    log_format: LogFormat,
) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if let Some(level) = log_level {
        EnvFilter::new(match level {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    } else if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let formatter = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_level(true);

    match log_format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(formatter)
                .with(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(formatter.json())
                .with(filter)
                .init();
        }
    }

    Ok(())
}
