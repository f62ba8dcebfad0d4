//! Error types for QAEnrich.
//!
//! All errors are represented by the `EnrichError` enum. Errors only ever
//! come out of the refresh and lifecycle paths; transforming never fails.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::source::GraphLevel;

/// Unified error type for all QAEnrich operations.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum EnrichError {
    /// Service lifecycle errors (launch, shutdown, runtime setup).
    #[error("{0}")]
    Engine(String),

    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON seed data).
    #[error("{0}")]
    Convert(String),

    /// A data source fetch failed.
    #[error("failed to fetch {level} for {key}: {message}")]
    Source {
        level: GraphLevel,
        key: String,
        message: String,
    },

    /// The data source returned rows that would break snapshot consistency.
    #[error("malformed {level}: {message}")]
    Malformed {
        level: GraphLevel,
        message: String,
    },

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),

    /// Message queue errors.
    #[error("{0}")]
    Queue(String),
}

impl From<std::io::Error> for EnrichError {
    fn from(error: std::io::Error) -> Self {
        EnrichError::IoError(error.to_string())
    }
}

impl From<serde_json::Error> for EnrichError {
    fn from(error: serde_json::Error) -> Self {
        EnrichError::Convert(error.to_string())
    }
}

impl From<toml::de::Error> for EnrichError {
    fn from(error: toml::de::Error) -> Self {
        EnrichError::Config(error.to_string())
    }
}
