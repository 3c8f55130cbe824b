//! Error types shared across Pointerflow crates.

use std::path::PathBuf;

/// Top-level error type for Pointerflow operations.
#[derive(Debug, thiserror::Error)]
pub enum PointerflowError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using PointerflowError.
pub type PointerflowResult<T> = Result<T, PointerflowError>;

impl PointerflowError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn parse(line: usize, msg: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: msg.into(),
        }
    }
}

/// Error delivered on a stream's error channel.
///
/// Cloneable so a multicast source can hand the same failure to every
/// subscriber.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// A caller-supplied transform, predicate or side effect failed.
    #[error("operator failed: {message}")]
    Operator { message: String },

    /// The upstream source reported a failure.
    #[error("source failed: {message}")]
    Source { message: String },

    /// A recognizer could not continue its gesture session.
    #[error("recognizer failed: {message}")]
    Recognizer { message: String },
}

impl StreamError {
    pub fn operator(msg: impl Into<String>) -> Self {
        Self::Operator {
            message: msg.into(),
        }
    }

    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source {
            message: msg.into(),
        }
    }

    pub fn recognizer(msg: impl Into<String>) -> Self {
        Self::Recognizer {
            message: msg.into(),
        }
    }
}

impl From<anyhow::Error> for StreamError {
    fn from(err: anyhow::Error) -> Self {
        Self::operator(format!("{err:#}"))
    }
}
