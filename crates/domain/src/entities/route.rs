//! Route planning result

use serde::{Deserialize, Serialize};

/// GeoJSON line-string describing the path of a route
///
/// Positions are kept in GeoJSON order (`[longitude, latitude]`) exactly as the
/// routing backend returned them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteGeometry {
    /// GeoJSON geometry type, normally `"LineString"`
    #[serde(rename = "type")]
    pub kind: String,

    /// Ordered `[longitude, latitude]` positions
    pub coordinates: Vec<[f64; 2]>,
}

impl RouteGeometry {
    /// Create a line-string geometry from `[lng, lat]` positions
    #[must_use]
    pub fn line_string(coordinates: Vec<[f64; 2]>) -> Self {
        Self {
            kind: "LineString".to_string(),
            coordinates,
        }
    }
}

/// One turn-by-turn instruction of a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    /// Instruction text (e.g. "Turn left onto Janpath")
    pub instruction: String,

    /// Road name for this step, empty when unnamed
    #[serde(default)]
    pub name: String,

    /// Step distance in meters
    pub distance_meters: f64,

    /// Step duration in seconds
    pub duration_seconds: f64,
}

/// Best route between two points as reported by the routing backend
///
/// Distance and duration are the backend's values verbatim (meters, seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Path of the route
    pub geometry: RouteGeometry,

    /// Total distance in meters
    pub distance_meters: f64,

    /// Total duration in seconds
    pub duration_seconds: f64,

    /// Turn-by-turn steps, empty when the backend sent none
    #[serde(default)]
    pub steps: Vec<RouteStep>,
}

impl Route {
    /// Distance in kilometers, for display
    #[must_use]
    pub fn distance_km(&self) -> f64 {
        self.distance_meters / 1000.0
    }

    /// Travel time rounded up to whole minutes, for display
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn eta_minutes(&self) -> u64 {
        (self.duration_seconds.max(0.0) / 60.0).ceil() as u64
    }

    /// One-line summary such as `4.20 km · 10 min`
    #[must_use]
    pub fn format_summary(&self) -> String {
        format!("{:.2} km · {} min", self.distance_km(), self.eta_minutes())
    }
}
