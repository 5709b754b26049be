//! Error types for the tablegrid facade.
//!
//! Uses [`thiserror`] for error derivation. Grid errors from the core crate
//! pass through unchanged; the remaining variants cover I/O, the wire format,
//! the HTTP detector client and session bookkeeping.

use tablegrid_core::GridError;
use thiserror::Error;

use crate::session::TableId;

/// Result alias used throughout the facade.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for facade operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A grid operation was rejected.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// Malformed detector JSON or a request that could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error reading an image or response file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport or status error talking to the detector.
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The table id does not refer to a live table in the session.
    #[error("unknown table {0}")]
    UnknownTable(TableId),

    /// A detection for this table is already in flight.
    #[error("table {0} already has a detection in flight")]
    DetectionPending(TableId),

    /// The detector answered with something other than cell data.
    #[error("unexpected detector response: {0}")]
    UnexpectedResponse(String),

    /// A configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablegrid_core::EdgeId;

    #[test]
    fn grid_error_is_transparent() {
        let err: Error = GridError::UnknownEdge(EdgeId(3)).into();
        assert_eq!(err.to_string(), "unknown edge e3");
    }

    #[test]
    fn io_error_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "I/O error: file missing");
    }

    #[test]
    fn json_error_from_serde() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(err.to_string().starts_with("JSON error:"));
    }

    #[test]
    fn session_errors_name_the_table() {
        assert_eq!(Error::UnknownTable(TableId(2)).to_string(), "unknown table t2");
        assert_eq!(
            Error::DetectionPending(TableId(5)).to_string(),
            "table t5 already has a detection in flight"
        );
    }

    #[test]
    fn error_implements_std_error() {
        let err: Box<dyn std::error::Error> =
            Box::new(Error::UnexpectedResponse("empty body".to_string()));
        assert_eq!(err.to_string(), "unexpected detector response: empty body");
    }
}
