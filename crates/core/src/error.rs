use std::path::PathBuf;

use crate::friends::FetchError;

/// Result alias that carries the custom [`ToolkitError`] type.
pub type Result<T> = std::result::Result<T, ToolkitError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum ToolkitError {
    /// Free-form failure that has no dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Invalid configuration value, e.g. an unparsable `PORT`.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// A preflight input is absent. Fatal for the montage flow.
    #[error("Required file not found: {}", .path.display())]
    MissingFile { path: PathBuf },
    /// The external encoder binary could not be located.
    #[error("{program} executable not found. Make sure it is installed and on your PATH.")]
    ExecutableNotFound { program: String },
    /// Audio container or codec failure while decoding.
    #[error("audio decoding failed: {0}")]
    Decode(#[from] symphonia::core::errors::Error),
    #[error("spectral analysis failed: {0}")]
    Fft(#[from] realfft::FftError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("server error: {0}")]
    Server(String),
}

impl ToolkitError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for ToolkitError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for ToolkitError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
