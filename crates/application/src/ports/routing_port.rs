//! Routing service port
//!
//! Defines the interface for computing a driving route between two points.

use async_trait::async_trait;
use domain::{Coordinate, Route};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for route planning
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RoutingPort: Send + Sync {
    /// Compute the backend's top-ranked route from `start` to `end`
    ///
    /// Returns [`ApplicationError::NoRouteFound`] when the backend answers
    /// without any route.
    async fn route(&self, start: Coordinate, end: Coordinate) -> Result<Route, ApplicationError>;
}
