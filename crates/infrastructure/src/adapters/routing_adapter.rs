//! Routing adapter - Implements RoutingPort using integration_osm

use application::error::ApplicationError;
use application::ports::RoutingPort;
use async_trait::async_trait;
use domain::{Coordinate, Route, RouteGeometry, RouteStep};
use integration_osm::{OsrmConfig, OsrmRoute, OsrmRoutingClient, RoutingClient, RoutingError};
use tracing::{debug, instrument, warn};

/// Adapter for driving routes from an OSRM server
pub struct OsrmRoutingAdapter {
    client: OsrmRoutingClient,
}

impl std::fmt::Debug for OsrmRoutingAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OsrmRoutingAdapter")
            .field("client", &"OsrmRoutingClient")
            .finish()
    }
}

impl OsrmRoutingAdapter {
    /// Wrap an existing client
    pub const fn new(client: OsrmRoutingClient) -> Self {
        Self { client }
    }

    /// Build the client from configuration
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Configuration` if the configuration is
    /// invalid or the HTTP client cannot be created.
    pub fn from_config(config: &OsrmConfig) -> Result<Self, ApplicationError> {
        let client = OsrmRoutingClient::new(config)
            .map_err(|e| ApplicationError::Configuration(e.to_string()))?;
        Ok(Self::new(client))
    }

    fn map_error(err: RoutingError) -> ApplicationError {
        match err {
            RoutingError::NoRouteFound => ApplicationError::NoRouteFound,
            other => ApplicationError::ExternalService(other.to_string()),
        }
    }

    fn convert_route(raw: OsrmRoute) -> Route {
        let steps = raw
            .steps
            .into_iter()
            .map(|step| RouteStep {
                instruction: step.instruction,
                name: step.name,
                distance_meters: step.distance,
                duration_seconds: step.duration,
            })
            .collect();

        Route {
            geometry: RouteGeometry {
                kind: raw.geometry.kind,
                coordinates: raw.geometry.coordinates,
            },
            distance_meters: raw.distance,
            duration_seconds: raw.duration,
            steps,
        }
    }
}

#[async_trait]
impl RoutingPort for OsrmRoutingAdapter {
    #[instrument(skip_all, fields(start = %start, end = %end))]
    async fn route(&self, start: Coordinate, end: Coordinate) -> Result<Route, ApplicationError> {
        let raw = self
            .client
            .route(
                start.latitude(),
                start.longitude(),
                end.latitude(),
                end.longitude(),
            )
            .await
            .map_err(|e| {
                warn!(error = %e, "Routing request failed");
                Self::map_error(e)
            })?;

        let route = Self::convert_route(raw);
        debug!(summary = %route.format_summary(), "Route converted");
        Ok(route)
    }
}
