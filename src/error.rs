//! Error types for the watcher.

use std::path::PathBuf;
use thiserror::Error;

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, WatchError>;

/// Errors raised while configuring or running the watcher.
///
/// Startup code propagates these to `main`, which aborts. Inside the frame loop they are
/// logged and the loop moves on to the next frame.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("Unable to open video source {input}: {message}")]
    SourceOpen { input: String, message: String },

    #[error("Stream read failure: {0}")]
    SourceRead(String),

    #[error("Model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("ONNX runtime error: {0}")]
    Runtime(#[from] ort::Error),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Notification failed: {0}")]
    Notify(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl WatchError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an inference error.
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    /// Create a notification error.
    pub fn notify(message: impl Into<String>) -> Self {
        Self::Notify(message.into())
    }
}

impl From<lettre::error::Error> for WatchError {
    fn from(err: lettre::error::Error) -> Self {
        Self::Notify(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for WatchError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        Self::Notify(err.to_string())
    }
}

impl From<lettre::address::AddressError> for WatchError {
    fn from(err: lettre::address::AddressError) -> Self {
        Self::Notify(err.to_string())
    }
}
