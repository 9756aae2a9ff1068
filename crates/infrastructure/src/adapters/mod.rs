//! Adapters implementing the application ports on top of the OSM clients

mod geocoding_adapter;
mod routing_adapter;

pub use geocoding_adapter::NominatimGeocodingAdapter;
pub use routing_adapter::OsrmRoutingAdapter;
