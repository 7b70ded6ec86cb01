//! CLI errors.

use mingle_client::ClientError;
use thiserror::Error;

/// Why a chat session ended abnormally.
#[derive(Debug, Error)]
pub enum CliError {
    /// Client could not be set up.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Every connection attempt failed.
    #[error("could not connect to {url}")]
    ConnectFailed {
        /// Endpoint that was tried.
        url: String,
    },

    /// Reading stdin failed.
    #[error("stdin: {0}")]
    Io(#[from] std::io::Error),
}
