//! Geocoding service port
//!
//! Defines the interface for forward (text → candidates) and reverse
//! (coordinate → address) geocoding.

use async_trait::async_trait;
use domain::{Coordinate, LocationCandidate};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for geocoding operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GeocodingPort: Send + Sync {
    /// Look up candidate locations for a free-text query, best match first
    async fn search(
        &self,
        query: &str,
        limit: u8,
    ) -> Result<Vec<LocationCandidate>, ApplicationError>;

    /// Resolve a coordinate to a human-readable address
    async fn reverse(&self, coordinate: Coordinate) -> Result<String, ApplicationError>;
}
