//! Domain entities - Lookup results and their request lifecycle

mod location_candidate;
mod request_state;
mod route;

pub use location_candidate::{CURRENT_LOCATION_LABEL, LocationCandidate};
pub use request_state::RequestState;
pub use route::{Route, RouteGeometry, RouteStep};
