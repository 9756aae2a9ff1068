//! Typed models for OSRM and Nominatim responses

use serde::{Deserialize, Serialize};

/// GeoJSON line-string as returned by OSRM with `geometries=geojson`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineString {
    /// Geometry type, `"LineString"` for route overviews
    #[serde(rename = "type")]
    pub kind: String,

    /// `[longitude, latitude]` positions
    #[serde(default)]
    pub coordinates: Vec<[f64; 2]>,
}

/// The best route of an OSRM `route` service response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsrmRoute {
    /// Full-overview geometry
    pub geometry: LineString,

    /// Total distance in meters
    pub distance: f64,

    /// Total duration in seconds
    pub duration: f64,

    /// Steps of the first leg (empty unless steps were requested)
    pub steps: Vec<OsrmStep>,
}

/// A single maneuver step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsrmStep {
    /// Human-readable instruction built from the maneuver
    pub instruction: String,

    /// Road name, empty for unnamed roads
    pub name: String,

    /// Step distance in meters
    pub distance: f64,

    /// Step duration in seconds
    pub duration: f64,

    /// Raw OSRM maneuver type (`turn`, `depart`, `arrive`, ...)
    pub maneuver_type: String,

    /// Raw OSRM maneuver modifier (`left`, `slight right`, ...)
    pub modifier: Option<String>,
}

impl OsrmStep {
    /// Build an instruction such as "Turn left onto Janpath"
    #[must_use]
    pub fn describe(maneuver_type: &str, modifier: Option<&str>, name: &str) -> String {
        let onto = if name.is_empty() {
            String::new()
        } else {
            format!(" onto {name}")
        };
        let modifier = modifier.unwrap_or_default();

        match maneuver_type {
            "depart" => {
                let on = if name.is_empty() {
                    String::new()
                } else {
                    format!(" on {name}")
                };
                // OSRM sends relative turns on depart too; only bearings read as "Head ..."
                if is_compass_bearing(modifier) {
                    format!("Head {modifier}{on}")
                } else {
                    format!("Depart{on}")
                }
            },
            "arrive" => "Arrive at your destination".to_string(),
            "roundabout" | "rotary" => format!("Enter the roundabout and exit{onto}"),
            "exit roundabout" | "exit rotary" => format!("Exit the roundabout{onto}"),
            "fork" => format!("Keep {} at the fork{onto}", or_default(modifier, "straight")),
            "end of road" => format!(
                "Turn {} at the end of the road{onto}",
                or_default(modifier, "straight")
            ),
            "merge" => format!("Merge{}{onto}", with_space(modifier)),
            "on ramp" => format!("Take the ramp{}{onto}", with_space(modifier)),
            "off ramp" => format!("Take the exit{}{onto}", with_space(modifier)),
            "new name" | "continue" => {
                if name.is_empty() {
                    "Continue".to_string()
                } else {
                    format!("Continue onto {name}")
                }
            },
            "turn" if modifier == "uturn" => format!("Make a U-turn{onto}"),
            "turn" if !modifier.is_empty() => format!("Turn {modifier}{onto}"),
            other => {
                let mut chars = other.chars();
                let head = chars
                    .next()
                    .map(|c| c.to_uppercase().collect::<String>())
                    .unwrap_or_default();
                format!("{head}{}{}{onto}", chars.as_str(), with_space(modifier))
            },
        }
    }
}

fn is_compass_bearing(modifier: &str) -> bool {
    matches!(
        modifier,
        "north" | "south" | "east" | "west" | "northeast" | "northwest" | "southeast" | "southwest"
    )
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

fn with_space(value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        format!(" {value}")
    }
}

/// A Nominatim search result with parsed coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Full address text
    pub display_name: String,

    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    /// OSM place type (`city`, `attraction`, ...)
    pub place_type: Option<String>,

    /// Nominatim importance ranking
    pub importance: Option<f64>,
}
