//! Application services

mod debounce;
mod location_search_service;
mod request_sequence;
mod route_planning_service;

pub use debounce::Debouncer;
pub use location_search_service::{LocationSearchService, SearchConfig, SearchSnapshot};
pub use request_sequence::{RequestSequence, RequestTicket};
pub use route_planning_service::{
    RouteOrdering, RoutePlanningConfig, RoutePlanningService, RouteState,
};
