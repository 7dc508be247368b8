use thiserror::Error;

/// Central error type for the stem-splitter-engine crate.
#[derive(Debug, Error)]
pub enum StemError {
    // Generic fallback (wraps anyhow)
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),

    // Domain-specific variants
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown model `{0}`")]
    UnknownModel(String),

    #[error("Inference runtime failed: {0}")]
    RuntimeFailure(String),

    #[error("Failed to parse track list at position {position}: {reason}")]
    Parse { position: usize, reason: String },

    #[error("Track `{0}` does not exist")]
    UnknownTrack(String),

    #[error("Track `{track}`: source `{offending}` does not match the shape of the first source")]
    ShapeMismatch { track: String, offending: String },

    #[error("Output file {path} already exists, use overwrite to replace it")]
    OutputExists { path: String },

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Models dir not available")]
    ModelsDirUnavailable,
}

impl StemError {
    pub(crate) fn parse(position: usize, reason: impl Into<String>) -> Self {
        StemError::Parse {
            position,
            reason: reason.into(),
        }
    }
}

// --- Implement From conversions for common errors ---
impl From<std::io::Error> for StemError {
    fn from(e: std::io::Error) -> Self {
        StemError::Anyhow(e.into())
    }
}

impl From<serde_json::Error> for StemError {
    fn from(e: serde_json::Error) -> Self {
        StemError::Anyhow(e.into())
    }
}

impl From<ndarray::ShapeError> for StemError {
    fn from(e: ndarray::ShapeError) -> Self {
        StemError::Anyhow(e.into())
    }
}

#[cfg(feature = "onnx")]
impl From<ort::Error> for StemError {
    fn from(e: ort::Error) -> Self {
        StemError::RuntimeFailure(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StemError>;
