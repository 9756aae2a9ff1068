//! Value Objects - Immutable, identity-less domain primitives

mod coordinate;

pub use coordinate::{Coordinate, InvalidCoordinates};
