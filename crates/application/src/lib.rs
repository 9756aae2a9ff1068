//! Application layer - Lookup services and their ports
//!
//! Owns the request lifecycle of the two geo lookups (address search and
//! route planning). Concrete HTTP backends live behind the ports defined here
//! and are provided by the infrastructure layer.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
