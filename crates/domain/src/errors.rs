//! Domain-level errors

use thiserror::Error;

/// Why a route could not be produced
///
/// Both variants are user-visible; the booking flow cannot continue without a
/// route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The backend answered but reported no route
    #[error("No route found between these locations.")]
    NoRouteFound,

    /// Transport failure or non-success response
    #[error("{0}")]
    RequestFailed(String),
}

impl RouteError {
    /// Create a request failure, falling back to a generic message when the
    /// detail is empty
    pub fn request_failed(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self::RequestFailed("Failed to calculate route. Please try again.".to_string())
        } else {
            Self::RequestFailed(message)
        }
    }
}
