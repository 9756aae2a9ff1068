//! OpenStreetMap service clients for RideRoute
//!
//! Provides driving routes via an [OSRM](https://project-osrm.org) server
//! (the public demo server at `router.project-osrm.org` by default) and
//! address search via [Nominatim](https://nominatim.openstreetmap.org).
//!
//! # Architecture
//!
//! The crate follows a client-trait pattern consistent with the other layers.
//! [`RoutingClient`] defines the routing interface, implemented by
//! [`OsrmRoutingClient`]. [`GeocodingClient`] handles forward and reverse
//! geocoding via [`NominatimGeocodingClient`]. Neither client retries or
//! caches; every call is a single HTTP request.
//!
//! # Example
//!
//! ```rust,ignore
//! use integration_osm::{OsrmConfig, OsrmRoutingClient, RoutingClient};
//!
//! let client = OsrmRoutingClient::new(&OsrmConfig::default())?;
//!
//! let route = client.route(
//!     28.6139, 77.2090, // India Gate area
//!     28.6129, 77.2295, // destination
//! ).await?;
//! println!("{} m in {} s", route.distance, route.duration);
//! ```

mod client;
mod config;
mod error;
mod geocoding;
mod models;

pub use client::{OsrmRoutingClient, RoutingClient};
pub use config::OsrmConfig;
pub use error::RoutingError;
pub use geocoding::{GeocodingClient, GeocodingError, NominatimConfig, NominatimGeocodingClient};
pub use models::{LineString, OsrmRoute, OsrmStep, Place};
