//! Domain layer for RideRoute
//!
//! Contains the geographic value objects and lookup results shared by the
//! location search and route planning services. This layer performs no I/O.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::RouteError;
pub use value_objects::*;
