//! Error types for the ingestion tool

use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ingestion errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pattern matched nothing, or no pattern was given
    #[error("No files specified: {0}")]
    NoFiles(String),

    /// File skipped because its media type is not ingestible
    #[error("Skipping '{path}' - {reason}")]
    SkippedFile { path: String, reason: String },

    /// Path is not a regular file
    #[error("'{0}' is not a file")]
    InvalidFile(String),

    /// Media type the extractor cannot handle
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// File content could not be parsed
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Record failed validation (empty identifier and similar)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Remote store rejected a call
    #[error("{}", submission_display(.status, .message))]
    Submission {
        status: Option<u16>,
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Config file syntax error
    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid glob pattern
    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

fn submission_display(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Remote store error ({}): {}", code, message),
        None => format!("Remote store error: {}", message),
    }
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a skipped-file error
    pub fn skipped(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SkippedFile {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a submission error
    pub fn submission(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Submission {
            status,
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Skips are reported but never change the exit status
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Error::SkippedFile { .. } | Error::InvalidFile(_) | Error::UnsupportedMediaType(_)
        )
    }

    /// Status code carried by a remote store failure
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Submission { status, .. } => *status,
            Error::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether a failed remote call is worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            Error::Submission { status: Some(code), .. } => *code >= 500,
            _ => false,
        }
    }
}
