//! RideRoute CLI
//!
//! Drives the location search and route planning services from a terminal.

#![allow(clippy::print_stdout)]

mod endpoint;
mod output;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use application::{LocationSearchService, RoutePlanningService};
use clap::{Parser, Subcommand};
use domain::Coordinate;
use infrastructure::{AppConfig, NominatimGeocodingAdapter, OsrmRoutingAdapter, init_logging};
use tracing::debug;

use crate::endpoint::Endpoint;

/// RideRoute CLI
#[derive(Debug, Parser)]
#[command(name = "rideroute-cli")]
#[command(author, version, about = "Location search and route planning for ride booking", long_about = None)]
struct Cli {
    /// Verbosity level (overrides the configured log filter)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (defaults to ./config.toml when present)
    #[arg(short, long, global = true, env = "RIDEROUTE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search for locations matching free text
    ///
    /// The text goes through the same debounced path as interactive typing.
    /// Example: rideroute-cli search "Connaught Place"
    Search {
        /// Text to search for
        text: String,

        /// Print candidates as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve `lat,lng` to an address label
    Reverse {
        /// Coordinate as `lat,lng`
        #[arg(allow_hyphen_values = true)]
        coordinate: Coordinate,
    },

    /// Calculate a driving route
    ///
    /// Each endpoint is either `lat,lng` or an address.
    /// Example: rideroute-cli route "28.6139,77.2090" "Connaught Place"
    Route {
        /// Pickup location
        #[arg(allow_hyphen_values = true)]
        from: Endpoint,

        /// Drop-off location
        #[arg(allow_hyphen_values = true)]
        to: Endpoint,

        /// Print the route as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => AppConfig::load().context("failed to load configuration")?,
    };
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    Ok(config)
}

fn search_service(config: &AppConfig) -> anyhow::Result<LocationSearchService> {
    let geocoder = NominatimGeocodingAdapter::from_config(&config.geocoding)?;
    Ok(LocationSearchService::with_config(
        Arc::new(geocoder),
        config.search.clone(),
    ))
}

/// Feed `text` through the debounced query path and wait for it to settle
async fn settle_search(
    search: &LocationSearchService,
    text: &str,
    timeout: Duration,
) -> anyhow::Result<Vec<domain::LocationCandidate>> {
    let mut updates = search.subscribe();
    search.set_query(text);

    tokio::time::timeout(timeout, async {
        loop {
            {
                let snapshot = updates.borrow_and_update();
                if snapshot.debounced_query == text && !snapshot.loading {
                    return Ok::<_, anyhow::Error>(snapshot.candidates.clone());
                }
            }
            updates
                .changed()
                .await
                .context("search service stopped")?;
        }
    })
    .await
    .context("search timed out")?
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_ref())?;
    if let Some(filter) = log_filter_from_verbosity(cli.verbose) {
        config.logging.filter = filter.to_string();
    }
    init_logging(&config.logging)?;
    debug!(?cli, "Starting");

    match cli.command {
        Commands::Search { text, json } => {
            let text = text.trim().to_string();
            if text.is_empty() {
                bail!("search text must not be empty");
            }

            let search = search_service(&config)?;
            let timeout = search.config().debounce()
                + Duration::from_secs(config.geocoding.timeout_secs + 2);
            let candidates = settle_search(&search, &text, timeout).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&candidates)?);
            } else {
                print!("{}", output::format_candidates(&candidates));
                if candidates.is_empty() {
                    println!();
                }
            }
        },

        Commands::Reverse { coordinate } => {
            let search = search_service(&config)?;
            println!("{}", search.reverse_lookup(coordinate).await);
        },

        Commands::Route { from, to, json } => {
            let search = search_service(&config)?;
            let (start, from_label) = from.resolve(&search).await?;
            let (end, to_label) = to.resolve(&search).await?;

            let router = OsrmRoutingAdapter::from_config(&config.routing)?;
            let planner =
                RoutePlanningService::with_config(Arc::new(router), config.route_planning);
            let route = planner.calculate_route(start, end).await?;

            if json {
                let value = output::route_json(&from_label, &to_label, &route);
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                print!("{}", output::format_route(&from_label, &to_label, &route));
            }
        },

        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        },
    }

    Ok(())
}
