//! Request parameters and response envelopes for the TMDB API.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// --- Connection ---

/// URL scheme used to reach `api.themoviedb.org`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Plain HTTP.
    #[default]
    Http,
    /// HTTP over TLS.
    Https,
}

impl Scheme {
    /// Returns the scheme name without the `://` separator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Pagination ---

/// Envelope shared by every paginated endpoint (`movie/changes`,
/// `movie/upcoming`, `person/changes`, `tv/changes`).
///
/// Both fields are optional so that an incomplete page surfaces as
/// [`crate::TmdbError::MissingField`] instead of a decode failure.
#[derive(Debug, Clone, Deserialize)]
pub struct PagedResponse {
    /// Current page number.
    #[serde(default)]
    pub page: Option<u32>,
    /// Items on this page.
    #[serde(default)]
    pub results: Option<Vec<Value>>,
    /// Total number of pages reported by the server.
    #[serde(default)]
    pub total_pages: Option<u32>,
}

// --- Error Response ---

/// TMDB API error response body.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbErrorResponse {
    /// TMDB error code.
    pub status_code: u32,
    /// Error message.
    pub status_message: String,
    /// Success flag (always false for errors).
    #[allow(dead_code)]
    #[serde(default)]
    pub success: bool,
}

// --- Search Parameters ---

/// Parameters for the `search/movie` endpoint.
///
/// The response language is always the client default.
#[derive(Debug, Clone)]
pub struct SearchMovieParams {
    /// Search query (required).
    pub query: String,
    /// Result page (default: 1).
    pub page: u32,
    /// Include adult content.
    pub include_adult: bool,
    /// Filter by release year.
    pub year: Option<u32>,
}

impl SearchMovieParams {
    /// Creates new search params with the given query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page: 1,
            include_adult: false,
            year: None,
        }
    }

    /// Sets the result page.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Includes adult titles in the results.
    #[must_use]
    pub const fn include_adult(mut self, include_adult: bool) -> Self {
        self.include_adult = include_adult;
        self
    }

    /// Sets the year filter.
    #[must_use]
    pub const fn year(mut self, year: u32) -> Self {
        self.year = Some(year);
        self
    }

    /// Builds the query pairs sent to `search/movie`.
    pub(crate) fn to_query(&self, language: &str) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("query", self.query.clone()),
            ("page", self.page.to_string()),
            ("include_adult", self.include_adult.to_string()),
        ];
        if let Some(year) = self.year {
            query.push(("year", year.to_string()));
        }
        query.push(("language", String::from(language)));
        query
    }
}

/// Parameters for the `search/tv` endpoint.
///
/// Only the query and page are forwarded; the response language is
/// always the client default.
#[derive(Debug, Clone)]
pub struct SearchTvParams {
    /// Search query (required).
    pub query: String,
    /// Result page (default: 1).
    pub page: u32,
}

impl SearchTvParams {
    /// Creates new search params with the given query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page: 1,
        }
    }

    /// Sets the result page.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Builds the query pairs sent to `search/tv`.
    pub(crate) fn to_query(&self, language: &str) -> Vec<(&'static str, String)> {
        vec![
            ("query", self.query.clone()),
            ("page", self.page.to_string()),
            ("language", String::from(language)),
        ]
    }
}
