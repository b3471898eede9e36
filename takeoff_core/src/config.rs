//! # Configuration
//!
//! `takeoff.toml`: extraction settings and pricing in one file.
//!
//! ```toml
//! [extraction]
//! table_pages = "2-4"
//!
//! [pricing]
//! shingles_per_square = 149.00
//! waste_factor = 0.12
//! ```
//!
//! Both tables and every key in them are optional.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{TakeoffError, TakeoffResult};
use crate::extraction::ExtractOptions;
use crate::file_io::read_text;
use crate::pricing::PricingConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TakeoffConfig {
    pub extraction: ExtractOptions,
    pub pricing: PricingConfig,
}

impl TakeoffConfig {
    /// Parse and validate TOML text. `origin` names the source in errors.
    pub fn from_toml(text: &str, origin: &str) -> TakeoffResult<Self> {
        let config: TakeoffConfig =
            toml::from_str(text).map_err(|e| TakeoffError::config_error(origin, e.message().to_string()))?;
        config
            .pricing
            .validate()
            .map_err(|e| TakeoffError::config_error(origin, e.to_string()))?;
        Ok(config)
    }
}

/// Load a config file, or the defaults when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> TakeoffResult<TakeoffConfig> {
    let Some(path) = path else {
        return Ok(TakeoffConfig::default());
    };
    let text = read_text(path)?;
    let config = TakeoffConfig::from_toml(&text, &path.display().to_string())?;
    log::info!("Loaded configuration from {}", path.display());
    Ok(config)
}
