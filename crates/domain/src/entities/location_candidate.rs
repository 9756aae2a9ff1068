//! Geocoding search result

use serde::{Deserialize, Serialize};

use crate::value_objects::Coordinate;

/// Label used when a coordinate cannot be turned into an address
pub const CURRENT_LOCATION_LABEL: &str = "Current Location";

/// A single candidate location returned by an address search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCandidate {
    /// Human-readable address
    pub display_name: String,

    /// Position of the candidate
    pub coordinate: Coordinate,

    /// Place classification reported by the geocoder (e.g. "restaurant")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_type: Option<String>,

    /// Relevance score reported by the geocoder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<f64>,
}

impl LocationCandidate {
    /// Create a candidate without classification metadata
    #[must_use]
    pub fn new(display_name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            display_name: display_name.into(),
            coordinate,
            place_type: None,
            importance: None,
        }
    }

    /// Attach the place type
    #[must_use]
    pub fn with_place_type(mut self, place_type: impl Into<String>) -> Self {
        self.place_type = Some(place_type.into());
        self
    }

    /// Attach the importance score
    #[must_use]
    pub const fn with_importance(mut self, importance: f64) -> Self {
        self.importance = Some(importance);
        self
    }

    /// First component of the display name, used as a suggestion headline
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.display_name
            .split(',')
            .next()
            .map_or(self.display_name.as_str(), str::trim)
    }
}
