//! Route endpoints given on the command line

use std::str::FromStr;

use anyhow::{Context, bail};
use application::LocationSearchService;
use domain::{Coordinate, LocationCandidate};
use tracing::info;

/// A route endpoint: explicit coordinates or an address to geocode
#[derive(Debug, Clone, PartialEq)]
pub enum Endpoint {
    /// `lat,lng` given directly
    Coordinate(Coordinate),
    /// Free-text address, resolved to its first search candidate
    Address(String),
}

impl FromStr for Endpoint {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            bail!("endpoint must not be empty");
        }

        let numeric = text.split_once(',').and_then(|(lat, lng)| {
            Some((lat.trim().parse::<f64>().ok()?, lng.trim().parse::<f64>().ok()?))
        });

        match numeric {
            Some((lat, lng)) => Coordinate::new(lat, lng)
                .map(Self::Coordinate)
                .with_context(|| format!("'{text}' is not a valid coordinate")),
            None => Ok(Self::Address(text.to_string())),
        }
    }
}

impl Endpoint {
    /// Resolve to a coordinate and a display label
    pub async fn resolve(
        self,
        search: &LocationSearchService,
    ) -> anyhow::Result<(Coordinate, String)> {
        match self {
            Self::Coordinate(c) => Ok((c, c.to_string())),
            Self::Address(address) => {
                let candidate = first_candidate(search, &address).await?;
                info!(%address, resolved = %candidate.display_name, "Resolved endpoint");
                Ok((candidate.coordinate, candidate.display_name))
            },
        }
    }
}

async fn first_candidate(
    search: &LocationSearchService,
    address: &str,
) -> anyhow::Result<LocationCandidate> {
    let min = search.config().min_query_chars;
    if address.chars().count() < min {
        bail!("'{address}' is too short to search (at least {min} characters)");
    }

    search
        .search(address)
        .await
        .into_iter()
        .next()
        .with_context(|| format!("no location found for '{address}'"))
}
