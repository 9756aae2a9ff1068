//! Lifecycle of a single logical request stream

use serde::{Deserialize, Serialize};

/// State of a lookup: exactly one variant holds at a time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum RequestState<T, E> {
    /// Nothing requested yet, or explicitly cleared
    Idle,
    /// A request is in flight
    Loading,
    /// The most recent request produced a result
    Succeeded(T),
    /// The most recent request failed
    Failed(E),
}

impl<T, E> Default for RequestState<T, E> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T, E> RequestState<T, E> {
    /// Whether a request is in flight
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Whether the state is idle
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// The successful result, if any
    #[must_use]
    pub const fn result(&self) -> Option<&T> {
        match self {
            Self::Succeeded(value) => Some(value),
            _ => None,
        }
    }

    /// The failure, if any
    #[must_use]
    pub const fn error(&self) -> Option<&E> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}
