//! Error types for the core crate.

use std::path::PathBuf;

/// Result type alias for feed parsing.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors produced while parsing a feed body.
///
/// A parse error usually means the body was truncated or corrupted in
/// transit, so callers treat it like a transport failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The XML itself is not well formed.
    #[error("Malformed feed at byte {position}: {message}")]
    Xml { position: u64, message: String },

    /// The document root is not `<rss>`.
    #[error("Unexpected feed root <{0}>, expected <rss>")]
    UnexpectedRoot(String),

    /// The document contains no element at all.
    #[error("Feed has no <rss> root element")]
    MissingRoot,

    /// The document ended while an element was still open.
    #[error("Feed ends inside <{0}>")]
    Truncated(String),
}

impl ParseError {
    /// Create an XML syntax error.
    pub fn xml(position: u64, message: impl Into<String>) -> Self {
        Self::Xml {
            position,
            message: message.into(),
        }
    }
}

/// Errors produced while loading preferences.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The preference file could not be read.
    #[error("Failed to read preferences '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The preference file is not valid TOML.
    #[error("Invalid preferences: {0}")]
    Syntax(String),

    /// A key holds a value of a type preferences cannot represent.
    #[error("Unsupported value for preference '{key}': {kind}")]
    UnsupportedValue { key: String, kind: String },
}
