//! Nominatim geocoding client
//!
//! Searches free-form address text and reverse-geocodes coordinates using
//! the [Nominatim](https://nominatim.openstreetmap.org) API (OpenStreetMap).
//!
//! Requests are spaced at least `min_interval_ms` apart, as required by the
//! public instance's usage policy (max 1 request/second).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::models::Place;

/// Configuration for the Nominatim geocoding service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NominatimConfig {
    /// Base URL for the Nominatim API
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_geocoding_timeout_secs")]
    pub timeout_secs: u64,

    /// Minimum spacing between requests in milliseconds (0 disables)
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// `accept-language` preference, e.g. `"en"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_language: Option<String>,

    /// `User-Agent` sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_geocoding_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

const fn default_geocoding_timeout_secs() -> u64 {
    5
}

const fn default_min_interval_ms() -> u64 {
    1100
}

fn default_user_agent() -> String {
    concat!("RideRoute/", env!("CARGO_PKG_VERSION"), " (ride booking demo)").to_string()
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            timeout_secs: default_geocoding_timeout_secs(),
            min_interval_ms: default_min_interval_ms(),
            accept_language: None,
            user_agent: default_user_agent(),
        }
    }
}

impl NominatimConfig {
    /// Create a configuration suitable for testing
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            timeout_secs: 5,
            min_interval_ms: 0,
            ..Default::default()
        }
    }

    /// Check if request spacing is enabled
    #[must_use]
    pub const fn rate_limit_enabled(&self) -> bool {
        self.min_interval_ms > 0
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("base_url must not be empty".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }

        if self.user_agent.trim().is_empty() {
            return Err("user_agent must not be empty".to_string());
        }

        Ok(())
    }
}

/// Errors that can occur during geocoding
#[derive(Debug, Error)]
pub enum GeocodingError {
    /// Connection to geocoding service failed
    #[error("Geocoding connection failed: {0}")]
    ConnectionFailed(String),

    /// Request to geocoding service failed
    #[error("Geocoding request failed: {0}")]
    RequestFailed(String),

    /// Failed to parse geocoding response
    #[error("Geocoding parse error: {0}")]
    ParseError(String),

    /// Coordinates could not be resolved to an address
    #[error("Address not found: {0}")]
    AddressNotFound(String),

    /// Rate limit exceeded (HTTP 429)
    #[error("Geocoding rate limit exceeded")]
    RateLimitExceeded,

    /// Request timeout
    #[error("Geocoding request timed out")]
    Timeout,

    /// Invalid client configuration
    #[error("Geocoding configuration error: {0}")]
    ConfigurationError(String),
}

/// Trait for geocoding clients
#[async_trait]
pub trait GeocodingClient: Send + Sync {
    /// Search free-form text, returning at most `limit` places
    async fn search(&self, query: &str, limit: u8) -> Result<Vec<Place>, GeocodingError>;

    /// Convert coordinates to a human-readable address
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<String, GeocodingError>;
}

/// Nominatim-based geocoding client with request spacing
#[derive(Debug)]
pub struct NominatimGeocodingClient {
    client: Client,
    config: NominatimConfig,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl NominatimGeocodingClient {
    /// Create a new Nominatim geocoding client
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn new(config: &NominatimConfig) -> Result<Self, GeocodingError> {
        config
            .validate()
            .map_err(GeocodingError::ConfigurationError)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GeocodingError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
            last_request: Arc::new(Mutex::new(None)),
        })
    }

    /// Wait until `min_interval_ms` has passed since the previous request
    async fn rate_limit(&self) {
        if !self.config.rate_limit_enabled() {
            return;
        }

        let interval = Duration::from_millis(self.config.min_interval_ms);
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < interval {
                let wait = interval.saturating_sub(elapsed);
                debug!(?wait, "Rate limiting geocoding request");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }

    fn base_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("format", "json".to_string()),
            ("addressdetails", "1".to_string()),
        ];
        if let Some(lang) = &self.config.accept_language {
            params.push(("accept-language", lang.clone()));
        }
        params
    }

    async fn get(&self, url: &str, params: &[(&str, String)]) -> Result<String, GeocodingError> {
        self.rate_limit().await;

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeocodingError::Timeout
                } else {
                    GeocodingError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodingError::RateLimitExceeded);
        }

        if !status.is_success() {
            return Err(GeocodingError::RequestFailed(format!("HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| GeocodingError::ParseError(e.to_string()))
    }

    /// Parse a `/search` response, skipping entries with unparsable coordinates
    fn parse_search_response(body: &str) -> Result<Vec<Place>, GeocodingError> {
        let raw: Vec<NominatimResult> =
            serde_json::from_str(body).map_err(|e| GeocodingError::ParseError(e.to_string()))?;

        Ok(raw
            .into_iter()
            .filter_map(|r| {
                let (Ok(latitude), Ok(longitude)) = (r.lat.parse::<f64>(), r.lon.parse::<f64>())
                else {
                    warn!(lat = %r.lat, lon = %r.lon, "Skipping place with unparsable coordinates");
                    return None;
                };
                Some(Place {
                    display_name: r.display_name.unwrap_or_default(),
                    latitude,
                    longitude,
                    place_type: r.place_type,
                    importance: r.importance,
                })
            })
            .collect())
    }

    /// Parse a `/reverse` response into its display name
    fn parse_reverse_response(
        body: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<String, GeocodingError> {
        let raw: NominatimReverse =
            serde_json::from_str(body).map_err(|e| GeocodingError::ParseError(e.to_string()))?;

        if let Some(error) = raw.error {
            return Err(GeocodingError::AddressNotFound(error));
        }

        raw.display_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| GeocodingError::AddressNotFound(format!("{latitude},{longitude}")))
    }
}

#[async_trait]
impl GeocodingClient for NominatimGeocodingClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: u8) -> Result<Vec<Place>, GeocodingError> {
        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        let mut params = self.base_params();
        params.push(("q", query.to_string()));
        params.push(("limit", limit.to_string()));

        debug!(%query, "Searching places");

        let body = self.get(&url, &params).await?;
        let places = Self::parse_search_response(&body)?;

        debug!(count = places.len(), "Places found");
        Ok(places)
    }

    #[instrument(skip(self))]
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<String, GeocodingError> {
        let url = format!("{}/reverse", self.config.base_url.trim_end_matches('/'));
        let mut params = self.base_params();
        params.push(("lat", latitude.to_string()));
        params.push(("lon", longitude.to_string()));
        params.push(("zoom", "18".to_string()));

        debug!(%latitude, %longitude, "Reverse geocoding");

        let body = self.get(&url, &params).await?;
        Self::parse_reverse_response(&body, latitude, longitude)
    }
}

/// Raw Nominatim search entry
#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
    display_name: Option<String>,
    #[serde(rename = "type")]
    place_type: Option<String>,
    importance: Option<f64>,
}

/// Raw Nominatim reverse response; failures come back as 200 with `error`
#[derive(Debug, Deserialize)]
struct NominatimReverse {
    display_name: Option<String>,
    error: Option<String>,
}
