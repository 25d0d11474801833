//! # Transform Configuration
//!
//! ```toml
//! propagation = "recursive"
//!
//! [store]
//! initial_capacity = 4096
//! growth_factor = 2
//! ```

use serde::{Deserialize, Serialize};
use strata_core::{ConfigResult, StoreConfig};

/// How world matrices are pushed down the tree.
///
/// Both strategies visit nodes in pre-order (parent before children) and
/// produce identical results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Propagation {
    /// Recurses once per tree level. Stack use grows with tree depth.
    Recursive,
    /// Explicit, reused stack. Depth-independent.
    #[default]
    Worklist,
}

/// Configuration of a transform component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformConfig {
    /// Sizing of the backing field store.
    pub store: StoreConfig,
    /// Propagation strategy.
    pub propagation: Propagation,
}

impl TransformConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// As for [`StoreConfig::from_toml_str`].
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.store.validate()?;
        Ok(config)
    }

    /// Returns a copy using `propagation`.
    #[must_use]
    pub const fn with_propagation(mut self, propagation: Propagation) -> Self {
        self.propagation = propagation;
        self
    }
}
