//! Error types for decoding uploads and generating headshots.

/// Message used when a failure carries no message of its own.
pub(crate) const UNKNOWN_ERROR: &str = "an unknown error occurred";

/// Errors that can occur between file selection and a rendered headshot.
///
/// Every variant renders as a single human-readable line; that line is what
/// ends up in the UI state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeadshotError {
    /// Bad file type or missing source image.
    #[error("{0}")]
    Validation(String),

    /// The selected file could not be read.
    #[error("{0}")]
    Io(String),

    /// The service answered without any inline image part.
    #[error("the service did not return an image; try another photo or style")]
    NoImageInResponse,

    /// Any transport or service failure.
    #[error("Failed to generate image: {0}")]
    GenerationFailed(String),
}

impl HeadshotError {
    /// Wraps an underlying failure message, falling back to a generic one
    /// when the message is blank.
    pub fn generation_failed(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self::GenerationFailed(UNKNOWN_ERROR.to_string())
        } else {
            Self::GenerationFailed(message)
        }
    }

    /// The declared file type is not `image/*`.
    pub fn not_an_image() -> Self {
        Self::Validation("not an image file".to_string())
    }

    /// The file contents could not be read.
    pub fn read_failed() -> Self {
        Self::Io("failed to read file".to_string())
    }
}

impl From<reqwest::Error> for HeadshotError {
    fn from(err: reqwest::Error) -> Self {
        Self::generation_failed(err.to_string())
    }
}

/// Result type alias for headshot operations.
pub type Result<T> = std::result::Result<T, HeadshotError>;
