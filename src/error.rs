//! Fatal configuration errors.
//!
//! Everything here is detected at setup, before any frame is processed.
//! Per-item outcomes (unassigned localisations, rejected groups) are not
//! errors; they are counted in [`crate::diagnostics`] instead.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while validating or loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A length, pitch, scale or threshold that must be strictly positive.
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    /// The depth search or acceptance interval is empty.
    #[error("{name} range is empty: min {min} >= max {max}")]
    EmptyRange {
        name: &'static str,
        min: f64,
        max: f64,
    },

    /// A count threshold below its sensible floor.
    #[error("{name} must be at least {min}, got {value}")]
    BelowMinimum {
        name: &'static str,
        min: usize,
        value: usize,
    },

    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file could not be parsed.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}
