//! Error types shared by the text, subtitle and library layers

/// Result type for reader operations
pub type Result<T> = std::result::Result<T, ReaderError>;

/// Errors raised while parsing a subtitle track
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SubtitleError {
    #[error("Invalid timestamp: {value}")]
    InvalidTimestamp { value: String },
}

/// Error types for loading and rendering reader content
#[derive(thiserror::Error, Debug)]
pub enum ReaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    #[error("Markdown error: {0}")]
    Markdown(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
