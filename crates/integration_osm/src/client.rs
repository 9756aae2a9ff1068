//! OSRM routing client
//!
//! Fetches driving routes from an OSRM server's `route` service with the
//! full-overview GeoJSON geometry and (optionally) turn-by-turn steps.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::OsrmConfig;
use crate::error::RoutingError;
use crate::models::{LineString, OsrmRoute, OsrmStep};

/// Trait for routing service clients
#[async_trait]
pub trait RoutingClient: Send + Sync {
    /// Fetch the best route between two coordinate pairs
    async fn route(
        &self,
        from_lat: f64,
        from_lon: f64,
        to_lat: f64,
        to_lon: f64,
    ) -> Result<OsrmRoute, RoutingError>;
}

/// OSRM HTTP API client
#[derive(Debug)]
pub struct OsrmRoutingClient {
    client: Client,
    config: OsrmConfig,
}

impl OsrmRoutingClient {
    /// Create a new OSRM routing client
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn new(config: &OsrmConfig) -> Result<Self, RoutingError> {
        config
            .validate()
            .map_err(RoutingError::ConfigurationError)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("RideRoute/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RoutingError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Build the `route` service URL; OSRM expects `lng,lat` order in the path
    fn route_url(&self, from_lat: f64, from_lon: f64, to_lat: f64, to_lon: f64) -> String {
        format!(
            "{}/route/v1/{}/{from_lon},{from_lat};{to_lon},{to_lat}",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile
        )
    }

    fn route_params(&self) -> [(&'static str, &'static str); 3] {
        [
            ("overview", "full"),
            ("geometries", "geojson"),
            ("steps", if self.config.include_steps { "true" } else { "false" }),
        ]
    }

    /// Parse a successful OSRM response body into the best route
    fn parse_route_response(body: &str) -> Result<OsrmRoute, RoutingError> {
        let raw: RawRouteResponse =
            serde_json::from_str(body).map_err(|e| RoutingError::ParseError(e.to_string()))?;

        match raw.code.as_deref() {
            Some("Ok") | None => {},
            Some("NoRoute") => return Err(RoutingError::NoRouteFound),
            Some(code) => {
                return Err(RoutingError::RequestFailed(
                    raw.message.unwrap_or_else(|| code.to_string()),
                ));
            },
        }

        raw.routes
            .into_iter()
            .next()
            .map(Self::convert_route)
            .ok_or(RoutingError::NoRouteFound)
    }

    /// Map a non-success response, keeping OSRM's error code and message
    fn error_for_status(status: reqwest::StatusCode, body: &str) -> RoutingError {
        let raw = serde_json::from_str::<RawErrorBody>(body).ok();

        if raw.as_ref().and_then(|r| r.code.as_deref()) == Some("NoRoute") {
            return RoutingError::NoRouteFound;
        }

        match raw.and_then(|r| r.message).filter(|m| !m.is_empty()) {
            Some(message) => RoutingError::RequestFailed(format!("HTTP {status}: {message}")),
            None => RoutingError::RequestFailed(format!("HTTP {status}")),
        }
    }

    fn convert_route(raw: RawRoute) -> OsrmRoute {
        let steps = raw
            .legs
            .into_iter()
            .next()
            .map(|leg| leg.steps.into_iter().map(Self::convert_step).collect())
            .unwrap_or_default();

        OsrmRoute {
            geometry: LineString {
                kind: raw.geometry.kind,
                coordinates: raw.geometry.coordinates,
            },
            distance: raw.distance,
            duration: raw.duration,
            steps,
        }
    }

    fn convert_step(raw: RawStep) -> OsrmStep {
        let name = raw.name.unwrap_or_default();
        let instruction =
            OsrmStep::describe(&raw.maneuver.kind, raw.maneuver.modifier.as_deref(), &name);

        OsrmStep {
            instruction,
            name,
            distance: raw.distance,
            duration: raw.duration,
            maneuver_type: raw.maneuver.kind,
            modifier: raw.maneuver.modifier,
        }
    }
}

#[async_trait]
impl RoutingClient for OsrmRoutingClient {
    #[instrument(skip(self), fields(profile = %self.config.profile))]
    async fn route(
        &self,
        from_lat: f64,
        from_lon: f64,
        to_lat: f64,
        to_lon: f64,
    ) -> Result<OsrmRoute, RoutingError> {
        let url = self.route_url(from_lat, from_lon, to_lat, to_lon);

        debug!(%url, "Requesting route");

        let response = self
            .client
            .get(&url)
            .query(&self.route_params())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RoutingError::Timeout {
                        timeout_secs: self.config.timeout_secs,
                    }
                } else {
                    RoutingError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RoutingError::RateLimitExceeded {
                retry_after_secs: response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok()),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| RoutingError::ParseError(e.to_string()))?;

        if !status.is_success() {
            let err = Self::error_for_status(status, &body);
            warn!(%status, error = %err, "Routing request rejected");
            return Err(err);
        }

        let route = Self::parse_route_response(&body)?;

        debug!(
            distance = route.distance,
            duration = route.duration,
            points = route.geometry.coordinates.len(),
            steps = route.steps.len(),
            "Route found"
        );
        Ok(route)
    }
}

// --- Raw API response types for deserialization ---

#[derive(Debug, Deserialize)]
struct RawRouteResponse {
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<RawRoute>,
}

#[derive(Debug, Deserialize)]
struct RawErrorBody {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    geometry: RawGeometry,
    distance: f64,
    duration: f64,
    #[serde(default)]
    legs: Vec<RawLeg>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct RawLeg {
    #[serde(default)]
    steps: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    distance: f64,
    duration: f64,
    name: Option<String>,
    maneuver: RawManeuver,
}

#[derive(Debug, Deserialize)]
struct RawManeuver {
    #[serde(rename = "type")]
    kind: String,
    modifier: Option<String>,
}
