//! Error types.
//!
//! The connection lifecycle reports failure only through boolean connect
//! callbacks; errors here cover configuration that cannot be turned into a
//! usable endpoint.

use thiserror::Error;

/// Transport configuration errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Base URL failed to parse.
    #[error("invalid endpoint url: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// Base URL uses a scheme that cannot carry a websocket.
    #[error("unsupported endpoint scheme {0:?}")]
    UnsupportedScheme(String),
}
