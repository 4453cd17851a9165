/// Core error types for the Strata engine.
use std::path::PathBuf;

/// A specialized Result type for Strata operations.
pub type StrataResult<T> = Result<T, StrataError>;

/// Top-level error type encompassing all Strata subsystems.
///
/// A render has a single completion path: the first error raised anywhere
/// in the layer stage or the compositing stage aborts the whole render and
/// is delivered once. There are no internal retries and no partial results.
#[derive(Debug, thiserror::Error)]
pub enum StrataError {
    /// A layer's content descriptor is malformed (empty path, zero-sized
    /// payload, byte length that does not match the declared dimensions).
    #[error("invalid layer content: {0}")]
    InvalidLayerContent(String),

    /// A pixel filter failed, or the filter name is not registered.
    #[error("filter '{name}' failed: {message}")]
    FilterFailure { name: String, message: String },

    /// A manual blend was required but no function is registered under the
    /// blend mode name. Fatal; the render stops immediately.
    #[error("no manual blend function registered for mode '{0}'")]
    NoSuchBlendMode(String),

    /// An external source (file, raster payload) could not be decoded.
    #[error("source load failure: {message} ({path:?})")]
    SourceLoadFailure { message: String, path: PathBuf },

    /// Nested canvases (or masks) exceed the configured nesting limit.
    #[error("canvas nesting exceeds the configured limit of {limit}")]
    RecursionLimitExceeded { limit: u32 },

    /// Backend misuse or internal rendering failure.
    #[error("render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StrataError {
    /// Create a source-load error.
    pub fn source_load(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        StrataError::SourceLoadFailure {
            message: message.into(),
            path: path.into(),
        }
    }

    /// Create a filter failure.
    pub fn filter(name: impl Into<String>, message: impl Into<String>) -> Self {
        StrataError::FilterFailure {
            name: name.into(),
            message: message.into(),
        }
    }
}
