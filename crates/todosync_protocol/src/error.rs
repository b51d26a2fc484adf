//! Error types for the protocol crate.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while decoding wire data or configuration.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// An environment variable held an unusable value.
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv {
        /// Variable name.
        var: String,
        /// Offending value.
        value: String,
    },

    /// A JSON body could not be encoded or decoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
