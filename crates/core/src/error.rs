/// Result alias that carries the custom [`DirectorError`] type.
pub type Result<T> = std::result::Result<T, DirectorError>;

/// Common error type for the core crate.
///
/// The per-frame operations of the director never fail; errors only come
/// out of configuration handling, the PCM spectrum stage and the shared
/// audio engine.
#[derive(Debug, thiserror::Error)]
pub enum DirectorError {
    #[error("{0}")]
    Message(String),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("malformed configuration file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("spectrum transform failed: {0}")]
    Fft(#[from] realfft::FftError),
}

impl DirectorError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<&str> for DirectorError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for DirectorError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
