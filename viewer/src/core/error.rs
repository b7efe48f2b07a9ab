//! Unified error type for the viewer
//!
//! Per-record problems (malformed records, undecodable tool arguments,
//! unknown roles) are handled inline with diagnostics and never surface
//! here. This type covers conditions the caller must distinguish.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewError {
    /// No spans or logs matched the requested trace/session. Distinct from
    /// a failure so callers can print a targeted "no data" message.
    #[error("no telemetry found for {scope}")]
    NoData { scope: String },

    /// The record batch itself could not be read or parsed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// IO error reading the record batch
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ViewError {
    pub fn no_data(scope: impl Into<String>) -> Self {
        Self::NoData {
            scope: scope.into(),
        }
    }
}
