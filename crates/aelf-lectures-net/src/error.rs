//! Error types for the networking module.

use std::fmt;

use aelf_lectures_core::ParseError;

/// Errors surfaced by name resolution, the HTTP client and lecture fetches.
///
/// Errors are cloneable so that a published failure can be handed to every
/// caller that asks for the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Empty hostname passed to the resolver.
    InvalidHostname,
    /// No address could be produced for the hostname.
    UnresolvedHost(String),
    /// Transport-level failure (connect, reset, read timeout, body read).
    Connection(String),
    /// The server answered with a non-success status.
    HttpStatus {
        /// The HTTP status code.
        status: u16,
    },
    /// The request URL could not be built.
    InvalidUrl(String),
    /// The response body is not a valid feed.
    Parse(ParseError),
    /// The fetch was cancelled before it completed.
    Cancelled,
    /// A bounded wait elapsed before the fetch completed.
    Timeout,
    /// The HTTP client could not be constructed or the request is invalid.
    Client(String),
}

impl FetchError {
    /// Whether a fetch attempt that failed with this error may be retried.
    ///
    /// Transport, status and parse failures are retryable: a parse failure
    /// usually means a truncated transfer.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::HttpStatus { .. } | Self::Parse(_) | Self::UnresolvedHost(_)
        )
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHostname => write!(f, "Invalid hostname: hostname is empty"),
            Self::UnresolvedHost(host) => write!(f, "Unable to resolve host '{host}'"),
            Self::Connection(msg) => write!(f, "Connection error: {msg}"),
            Self::HttpStatus { status } => write!(f, "HTTP {status}"),
            Self::InvalidUrl(msg) => write!(f, "Invalid URL: {msg}"),
            Self::Parse(err) => write!(f, "Failed to parse feed: {err}"),
            Self::Cancelled => write!(f, "Request was cancelled"),
            Self::Timeout => write!(f, "Timed out waiting for the result"),
            Self::Client(msg) => write!(f, "HTTP client error: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::Client(err.to_string())
        } else if let Some(status) = err.status() {
            Self::HttpStatus {
                status: status.as_u16(),
            }
        } else {
            // Resolver failures surface here too, as connect errors.
            Self::Connection(error_chain(&err))
        }
    }
}

impl From<ParseError> for FetchError {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<url::ParseError> for FetchError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

/// Render an error and its sources on one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// A specialized Result type for network operations.
pub type Result<T> = std::result::Result<T, FetchError>;
