#![deny(unsafe_code)]

mod commands;
mod config;
mod exit_code;
mod output;
mod progress;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mipdata_core::{Catalog, Error as CatalogError, UreqClient};

use crate::commands::{completions, download, info, libraries, list, remove};
use crate::config::{Config, Settings};

/// Browse and download MIPLIB benchmark instances
#[derive(Parser)]
#[command(name = "mipdata")]
#[command(author, version)]
#[command(propagate_version = true)]
#[command(after_help = "EXAMPLES:
    # List the benchmark set
    mipdata list miplib_benchmark

    # Only small binary problems that are easy to solve
    mipdata list miplib_benchmark -f 'type == \"BLP\"' -f 'n_vars < 10000' -f 'status == \"easy\"'

    # Download two instances into the cache
    mipdata download miplib_benchmark air05 markshare_4_0

    # Use a shared cache directory
    MIPDATA_CACHE_DIR=/data/mip mipdata list miplib_collection --refresh
")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Cache directory for metadata tables and downloaded instances
    #[arg(long, env = "MIPDATA_CACHE_DIR", value_name = "DIR", global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List instances of a library, optionally filtered
    List(list::Args),

    /// Show the metadata of one instance
    Info(info::Args),

    /// Download instance files into the cache
    Download(download::Args),

    /// Delete downloaded instance files
    Remove(remove::Args),

    /// List known libraries and whether they are supported
    Libraries(libraries::Args),

    /// Generate shell completions
    Completions(completions::Args),
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::from(exit_code::SUCCESS),
        Err(e) => {
            let code = categorize_error(&e);

            // Only print error if not quiet mode (quiet is parsed separately for this)
            let args: Vec<String> = std::env::args().collect();
            let is_quiet = args.iter().any(|a| a == "-q" || a == "--quiet");

            if !is_quiet {
                eprintln!("Error: {e:#}");
            }

            ExitCode::from(code)
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    let settings = config.settings(cli.cache_dir.as_deref(), cli.verbose);

    if !cli.quiet {
        setup_tracing(settings.verbosity);
    }
    tracing::debug!(?settings, "Resolved settings");

    match cli.command {
        Commands::Libraries(args) => libraries::execute(&args),
        Commands::Completions(args) => completions::execute(&args),
        Commands::List(args) => list::execute(&open_catalog(&settings, cli.quiet)?, &args, cli.quiet),
        Commands::Info(args) => info::execute(&open_catalog(&settings, cli.quiet)?, &args),
        Commands::Download(args) => download::execute(&open_catalog(&settings, cli.quiet)?, &args),
        Commands::Remove(args) => remove::execute(&open_catalog(&settings, cli.quiet)?, &args),
    }
}

/// Open the catalog below the configured cache directory
fn open_catalog(settings: &Settings, quiet: bool) -> Result<Catalog> {
    let catalog = Catalog::open(&settings.cache_dir)
        .with_context(|| format!("Failed to open cache directory {}", settings.cache_dir.display()))?
        .with_client(Arc::new(UreqClient::new(settings.http_timeout)))
        .with_lock_timeout(settings.lock_timeout);

    if quiet {
        Ok(catalog)
    } else {
        Ok(catalog.with_progress(progress::reporter()))
    }
}

fn setup_tracing(verbose: u8) {
    // Library warnings already reach the user as progress notices
    let filter = match verbose {
        0 => "warn,mipdata_core=error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();
}

fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(catalog_err) = cause.downcast_ref::<CatalogError>() {
            if matches!(catalog_err, CatalogError::NotImplemented(_)) {
                return exit_code::UNSUPPORTED;
            }
            if catalog_err.is_usage() {
                return exit_code::USAGE_ERROR;
            }
            if catalog_err.is_remote() {
                return exit_code::NETWORK_ERROR;
            }
            if catalog_err.is_data() {
                return exit_code::DATA_ERROR;
            }
        }

        if cause.downcast_ref::<toml::de::Error>().is_some() {
            return exit_code::USAGE_ERROR;
        }

        if let Some(io_err) = cause.downcast_ref::<io::Error>()
            && io_err.kind() == io::ErrorKind::NotFound
        {
            return exit_code::NOT_FOUND;
        }
    }

    // Fallback to string matching for errors raised by the commands themselves
    let msg = format!("{e:#}").to_lowercase();
    if msg.contains("not found") {
        exit_code::NOT_FOUND
    } else {
        exit_code::GENERAL_ERROR
    }
}
