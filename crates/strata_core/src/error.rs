//! # Core Error Types
//!
//! All errors that can occur while building, resizing or reading a field store.

use thiserror::Error;

/// Errors that can occur in field-packed storage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store was described with an empty field list or a zero capacity.
    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),

    /// A caller-supplied backing buffer cannot hold the layout.
    #[error("invalid backing buffer: need {required} bytes aligned to {align}, got {provided} bytes at address offset {misalignment}")]
    InvalidBuffer {
        /// Bytes required by the layout.
        required: usize,
        /// Bytes provided by the caller.
        provided: usize,
        /// Alignment every field requires.
        align: usize,
        /// `address % align` of the supplied buffer (0 when aligned).
        misalignment: usize,
    },

    /// A field index past the end of the layout.
    #[error("field {field} out of range: store has {count} fields")]
    FieldOutOfRange {
        /// The requested field.
        field: usize,
        /// Number of fields in the store.
        count: usize,
    },

    /// The element type requested for a field does not match its descriptor.
    #[error("field {field} holds {expected}-byte elements, requested type is {actual} bytes with alignment {align}")]
    FieldTypeMismatch {
        /// The requested field.
        field: usize,
        /// Element size described by the field (`width * kind size`).
        expected: usize,
        /// Size of the requested type.
        actual: usize,
        /// Alignment of the requested type.
        align: usize,
    },
}

/// Errors raised while loading configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// A value was parsed but is out of its allowed range.
    #[error("invalid config value `{key}`: {reason}")]
    InvalidValue {
        /// The offending key.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
