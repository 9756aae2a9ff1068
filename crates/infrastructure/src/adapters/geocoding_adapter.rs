//! Geocoding adapter - Implements GeocodingPort using integration_osm

use application::error::ApplicationError;
use application::ports::GeocodingPort;
use async_trait::async_trait;
use domain::{Coordinate, LocationCandidate};
use integration_osm::{
    GeocodingClient, GeocodingError, NominatimConfig, NominatimGeocodingClient, Place,
};
use tracing::{debug, instrument, warn};

/// Adapter for address search and reverse lookup via Nominatim
pub struct NominatimGeocodingAdapter {
    client: NominatimGeocodingClient,
}

impl std::fmt::Debug for NominatimGeocodingAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NominatimGeocodingAdapter")
            .field("client", &"NominatimGeocodingClient")
            .finish()
    }
}

impl NominatimGeocodingAdapter {
    /// Wrap an existing client
    pub const fn new(client: NominatimGeocodingClient) -> Self {
        Self { client }
    }

    /// Build the client from configuration
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Configuration` if the configuration is
    /// invalid or the HTTP client cannot be created.
    pub fn from_config(config: &NominatimConfig) -> Result<Self, ApplicationError> {
        let client = NominatimGeocodingClient::new(config)
            .map_err(|e| ApplicationError::Configuration(e.to_string()))?;
        Ok(Self::new(client))
    }

    fn map_error(err: &GeocodingError) -> ApplicationError {
        ApplicationError::ExternalService(err.to_string())
    }

    /// Convert a place, dropping it when its coordinates are out of range
    fn to_candidate(place: Place) -> Option<LocationCandidate> {
        let coordinate = match Coordinate::new(place.latitude, place.longitude) {
            Ok(c) => c,
            Err(e) => {
                warn!(
                    name = %place.display_name,
                    lat = place.latitude,
                    lon = place.longitude,
                    error = %e,
                    "Dropping candidate with invalid coordinates"
                );
                return None;
            },
        };

        let mut candidate = LocationCandidate::new(place.display_name, coordinate);
        if let Some(kind) = place.place_type {
            candidate = candidate.with_place_type(kind);
        }
        if let Some(importance) = place.importance {
            candidate = candidate.with_importance(importance);
        }
        Some(candidate)
    }
}

#[async_trait]
impl GeocodingPort for NominatimGeocodingAdapter {
    #[instrument(skip(self))]
    async fn search(
        &self,
        query: &str,
        limit: u8,
    ) -> Result<Vec<LocationCandidate>, ApplicationError> {
        let places = self.client.search(query, limit).await.map_err(|e| {
            warn!(error = %e, "Location search failed");
            Self::map_error(&e)
        })?;

        let candidates: Vec<_> = places.into_iter().filter_map(Self::to_candidate).collect();
        debug!(count = candidates.len(), "Location candidates");
        Ok(candidates)
    }

    #[instrument(skip_all, fields(coordinate = %coordinate))]
    async fn reverse(&self, coordinate: Coordinate) -> Result<String, ApplicationError> {
        self.client
            .reverse(coordinate.latitude(), coordinate.longitude())
            .await
            .map_err(|e| {
                debug!(error = %e, "Reverse geocoding failed");
                Self::map_error(&e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(lat: f64, lon: f64) -> Place {
        Place {
            display_name: "Connaught Place, New Delhi, Delhi, India".to_string(),
            latitude: lat,
            longitude: lon,
            place_type: Some("suburb".to_string()),
            importance: Some(0.6),
        }
    }

    #[test]
    fn valid_place_becomes_candidate() {
        let candidate = NominatimGeocodingAdapter::to_candidate(place(28.6315, 77.2167)).unwrap();
        assert_eq!(candidate.short_name(), "Connaught Place");
        assert!((candidate.coordinate.latitude() - 28.6315).abs() < f64::EPSILON);
        assert_eq!(candidate.place_type.as_deref(), Some("suburb"));
        assert_eq!(candidate.importance, Some(0.6));
    }

    #[test]
    fn out_of_range_place_is_dropped() {
        assert!(NominatimGeocodingAdapter::to_candidate(place(128.0, 77.2)).is_none());
        assert!(NominatimGeocodingAdapter::to_candidate(place(f64::NAN, 77.2)).is_none());
    }

    #[test]
    fn errors_become_external_service() {
        let err = NominatimGeocodingAdapter::map_error(&GeocodingError::Timeout);
        assert!(matches!(err, ApplicationError::ExternalService(_)));
    }
}
