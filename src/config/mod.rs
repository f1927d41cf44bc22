//! Configuration management for property collectors.
//!
//! Settings are layered with priority:
//! 1. Default values (hardcoded)
//! 2. Config file (optional, TOML)
//! 3. Environment variables `PROPSYNC__<SECTION>__<FIELD>` (highest priority)

mod collector;
pub use collector::*;


//---
use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::SETTINGS_ENV_PREFIX;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Cache engine and accessor tunables
    #[serde(default)]
    pub collector: CollectorConfig,
}

impl Settings {
    /// Load settings from the optional file at `path`, then environment overrides
    ///
    /// # Returns
    /// Merged and validated settings
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = Config::builder().add_source(Config::try_from(&Settings::default())?);

        if let Some(path) = path {
            config = config.add_source(File::with_name(path).required(true));
        }

        config = config.add_source(
            Environment::with_prefix(SETTINGS_ENV_PREFIX)
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let settings: Settings = config.build()?.try_deserialize()?;
        settings.collector.validate()?;
        Ok(settings)
    }
}
