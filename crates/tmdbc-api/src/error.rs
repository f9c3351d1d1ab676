//! Error type returned by every TMDB request.

use std::fmt;

/// Failure of a single TMDB operation.
///
/// Every request either yields a decoded JSON value or one of these
/// variants; nothing is thrown. [`TmdbError::Http`] is the failure
/// returned for any non-2xx response and its `Display` output is the
/// diagnostic also exposed through `TmdbClient::last_error`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub enum TmdbError {
    /// The server answered with a status code outside `2xx`.
    Http {
        /// HTTP status code.
        status: u16,
        /// Fully constructed request URL.
        url: String,
        /// Raw response body.
        body: String,
    },
    /// The request could not be sent or its body could not be read.
    Transport {
        /// Fully constructed request URL.
        url: String,
        /// Underlying error message.
        message: String,
    },
    /// A response lacks a field the operation relies on.
    MissingField {
        /// Endpoint path.
        path: String,
        /// Name of the absent field.
        field: &'static str,
    },
    /// A response field has an unexpected shape.
    Decode {
        /// Endpoint path.
        path: String,
        /// Decoder message.
        message: String,
    },
    /// The endpoint path could not be joined onto the base URL.
    InvalidUrl {
        /// Endpoint path.
        path: String,
        /// Parser message.
        message: String,
    },
}

impl fmt::Display for TmdbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http { status, url, body } => {
                write!(f, "TMDB API error (HTTP {status}): {body} [{url}]")
            }
            Self::Transport { url, message } => {
                write!(f, "TMDB request failed: {message} [{url}]")
            }
            Self::MissingField { path, field } => {
                write!(f, "TMDB response for {path} is missing field `{field}`")
            }
            Self::Decode { path, message } => {
                write!(f, "failed to decode TMDB response for {path}: {message}")
            }
            Self::InvalidUrl { path, message } => {
                write!(f, "failed to join URL path {path}: {message}")
            }
        }
    }
}

impl std::error::Error for TmdbError {}

/// Result alias for TMDB operations.
pub type Result<T> = std::result::Result<T, TmdbError>;
