//! Error types for directwire

use thiserror::Error;

/// Main error type for directwire
///
/// The scanning and mode-tracking core never originates errors: malformed
/// input degrades to safe defaults. Only configuration parsing and the
/// underlying transport I/O can fail.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for directwire
pub type Result<T> = std::result::Result<T, Error>;
