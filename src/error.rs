//! Unified error types for chaser-shot

use thiserror::Error;

/// Unified Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for chaser-shot
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket errors
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// CDP protocol errors
    #[error("CDP error: {0}")]
    Cdp(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Raster decode/encode errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// The page cannot be captured (scheme or host rejected)
    #[error("Invalid capture target: {0}")]
    InvalidTarget(String),

    /// The capture provider did not answer inside the safety window
    #[error("Capture timed out after {0}ms")]
    CaptureTimeout(u64),

    /// The capture provider reported a failure
    #[error("Capture provider failed: {0}")]
    CaptureProvider(String),

    /// Planning produced no scroll positions
    #[error("Nothing to capture: the capture plan is empty")]
    EmptyPlan,

    /// CDP command timeout
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new WebSocket error
    pub fn websocket<S: Into<String>>(msg: S) -> Self {
        Error::WebSocket(msg.into())
    }

    /// Create a new CDP error
    pub fn cdp<S: Into<String>>(msg: S) -> Self {
        Error::Cdp(msg.into())
    }

    /// Create a new invalid target error
    pub fn invalid_target<S: Into<String>>(reason: S) -> Self {
        Error::InvalidTarget(reason.into())
    }

    /// Create a new capture provider error
    pub fn capture_provider<S: Into<String>>(msg: S) -> Self {
        Error::CaptureProvider(msg.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Error::Timeout(msg.into())
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }

    /// Whether this error belongs to the capture failure taxonomy
    /// (rejected target, provider timeout, provider failure).
    pub fn is_capture_failure(&self) -> bool {
        matches!(
            self,
            Error::InvalidTarget(_) | Error::CaptureTimeout(_) | Error::CaptureProvider(_)
        )
    }
}
