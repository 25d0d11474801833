//! # Store Configuration
//!
//! Sizing policy for component stores, loaded once at startup from TOML.
//!
//! ```toml
//! initial_capacity = 1024
//! growth_factor = 2
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// How a component store is sized and grown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Slots allocated up front, sentinel slot included.
    pub initial_capacity: usize,
    /// Multiplier applied to the capacity when an index does not fit.
    pub growth_factor: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 64,
            growth_factor: 2,
        }
    }
}

impl StoreConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML or unknown keys,
    /// [`ConfigError::InvalidValue`] for out-of-range values.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] if `initial_capacity` is zero or
    /// `growth_factor` is below 2.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.initial_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "initial_capacity",
                reason: "must be at least 1".into(),
            });
        }
        if self.growth_factor < 2 {
            return Err(ConfigError::InvalidValue {
                key: "growth_factor",
                reason: format!("must be at least 2, got {}", self.growth_factor),
            });
        }
        Ok(())
    }

    /// Capacity to grow to so that slot `index` fits.
    #[must_use]
    pub fn capacity_for(&self, current: usize, index: usize) -> usize {
        let required = index + 1;
        if required <= current {
            return current;
        }
        current.saturating_mul(self.growth_factor).max(required)
    }
}
