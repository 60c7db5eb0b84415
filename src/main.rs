//! Reel-Dates main entry point
//!
//! This is the command-line interface for the Reel-Dates release-date lookup.

use anyhow::Context;
use clap::Parser;
use reel_dates::config::{load_config_with_hash, Config};
use reel_dates::{ReleasePipeline, ReleaseRequest, ReleaseResponse};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the catalogue token when the config has none
const TOKEN_ENV: &str = "TMDB_TOKEN";

/// Reel-Dates: earliest release dates for a film list
///
/// Reads the films of a public list or a spreadsheet, looks up their release
/// dates for one country and prints the sorted table as JSON.
#[derive(Parser, Debug)]
#[command(name = "reel-dates")]
#[command(version = "1.0.0")]
#[command(about = "Earliest release dates for a film list", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Owner of the list
    #[arg(long, requires = "list", conflicts_with_all = ["sheet", "request"])]
    user: Option<String>,

    /// Slug of the list
    #[arg(long, requires = "user")]
    list: Option<String>,

    /// Spreadsheet share or CSV export URL
    #[arg(long, conflicts_with_all = ["user", "request"])]
    sheet: Option<String>,

    /// Read the whole request from a JSON file
    #[arg(long, value_name = "FILE")]
    request: Option<PathBuf>,

    /// Two-letter country code for the country release date
    #[arg(long)]
    country: Option<String>,

    /// Ignore premiere events when computing the country release date
    #[arg(long)]
    exclude_premieres: bool,

    /// Pretty-print the JSON response
    #[arg(long)]
    pretty: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = load_configuration(cli.config.as_deref())?;
    if config.catalogue.token.is_none() {
        config.catalogue.token = std::env::var(TOKEN_ENV)
            .ok()
            .filter(|token| !token.trim().is_empty());
    }

    let request = build_request(&cli)?;
    let pipeline = ReleasePipeline::new(&config).context("Failed to build the pipeline")?;
    let response = pipeline.handle(&request).await;

    print_response(&response, cli.pretty)?;
    if !response.ok {
        std::process::exit(1);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout only carries the JSON response.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("reel_dates=info,warn"),
            1 => EnvFilter::new("reel_dates=debug,info"),
            2 => EnvFilter::new("reel_dates=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn load_configuration(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Builds the request from a JSON file or from flags
///
/// Flags given alongside `--request` override the file's values.
fn build_request(cli: &Cli) -> anyhow::Result<ReleaseRequest> {
    let mut request = match &cli.request {
        Some(path) => {
            let body = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read request file {}", path.display()))?;
            serde_json::from_str(&body)
                .with_context(|| format!("Failed to parse request file {}", path.display()))?
        }
        None => ReleaseRequest {
            username: cli.user.clone(),
            list_slug: cli.list.clone(),
            sheet_url: cli.sheet.clone(),
            ..ReleaseRequest::default()
        },
    };

    if let Some(country) = &cli.country {
        request.country = Some(country.clone());
    }
    if cli.exclude_premieres {
        request.exclude_premieres = true;
    }

    Ok(request)
}

fn print_response(response: &ReleaseResponse, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(response)?
    } else {
        serde_json::to_string(response)?
    };
    println!("{}", json);
    Ok(())
}
