//! Error types for liveplay-ap
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for liveplay-ap
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Media failed to load or play
    #[error("Transport error: {0}")]
    Transport(String),

    /// Project could not be opened
    #[error("Project error: {0}")]
    Project(String),

    /// The engine task is gone or did not answer
    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors bubbling up from liveplay-common
    #[error(transparent)]
    Common(#[from] liveplay_common::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using liveplay-ap Error
pub type Result<T> = std::result::Result<T, Error>;
