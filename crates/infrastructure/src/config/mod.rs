//! Application configuration
//!
//! Layered with the `config` crate:
//! 1. built-in defaults
//! 2. `config.toml` in the working directory (optional) or an explicit file
//! 3. environment variables prefixed `RIDEROUTE_`, nested with `__`
//!    (e.g. `RIDEROUTE_ROUTING__BASE_URL`)

use std::path::Path;

use application::{RoutePlanningConfig, SearchConfig};
use integration_osm::{NominatimConfig, OsrmConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::telemetry::LoggingConfig;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "RIDEROUTE";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// OSRM routing backend
    #[serde(default)]
    pub routing: OsrmConfig,

    /// Nominatim geocoding backend
    #[serde(default)]
    pub geocoding: NominatimConfig,

    /// Location search behaviour (debounce, minimum length, result limit)
    #[serde(default)]
    pub search: SearchConfig,

    /// Route planning behaviour
    #[serde(default)]
    pub route_planning: RoutePlanningConfig,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from `config.toml` (if present) and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::build(
            config::File::with_name("config").required(false),
            ENV_PREFIX,
        )
    }

    /// Load configuration from an explicit file and environment
    ///
    /// The file must exist; its format is inferred from the extension.
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        Self::build(config::File::from(path).required(true), ENV_PREFIX)
    }

    fn build<S>(file: S, env_prefix: &str) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app: Self = config.try_deserialize()?;
        debug!(
            routing = %app.routing.base_url,
            geocoding = %app.geocoding.base_url,
            "Configuration loaded"
        );
        Ok(app)
    }

    /// Validate every section
    ///
    /// # Errors
    ///
    /// Returns the first problem found, prefixed with its section name.
    pub fn validate(&self) -> Result<(), String> {
        self.routing
            .validate()
            .map_err(|e| format!("routing: {e}"))?;
        self.geocoding
            .validate()
            .map_err(|e| format!("geocoding: {e}"))?;
        self.search.validate().map_err(|e| format!("search: {e}"))?;
        self.logging
            .validate()
            .map_err(|e| format!("logging: {e}"))?;
        Ok(())
    }
}
