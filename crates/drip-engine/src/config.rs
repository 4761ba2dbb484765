//! Scheduler configuration.
//!
//! [`SchedulerConfig`] has usable defaults and can be layered from an
//! optional TOML file plus `DRIP_`-prefixed environment variables
//! (e.g. `DRIP_MIN_INTERVAL_SECS=600`).

use std::path::Path;

use drip_core::constants::{CONFIG_ENV_PREFIX, DEFAULT_MIN_INTERVAL_SECS};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Minimum seconds between two trigger settlements of the same stream.
    pub min_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: DEFAULT_MIN_INTERVAL_SECS,
        }
    }
}

impl SchedulerConfig {
    /// Load from `path` (if given and present), then environment overrides.
    ///
    /// A missing file is not an error; defaults fill anything unset.
    pub fn load(path: Option<&Path>) -> Result<Self, ::config::ConfigError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(false));
        }
        builder
            .add_source(::config::Environment::with_prefix(CONFIG_ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }
}
