//! `TmdbClient` - TMDB API client implementation.

use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result as AnyResult};
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderValue};
use serde_json::Value;
use tracing::instrument;
use url::Url;

use crate::api::{LocalRequestExecutor, LocalTmdbApi};
use crate::error::{Result, TmdbError};
use crate::types::{Scheme, SearchMovieParams, SearchTvParams, TmdbErrorResponse};
use crate::util::{
    extract_field, fetch_all_pages, fetch_episode_with_fallback, fetch_with_fallback,
    merge_genres,
};

/// TMDB API host.
const API_HOST: &str = "api.themoviedb.org";

/// TMDB API version path segment.
const API_VERSION: &str = "3";

/// Default response language.
const DEFAULT_LANGUAGE: &str = "de";

/// Default language used when a localized field comes back empty.
const DEFAULT_FALLBACK_LANGUAGE: &str = "en";

/// Language of the genre lists.
const GENRE_LANGUAGE: &str = "en";

/// Default upper bound on pages fetched by a single paginated call.
const DEFAULT_MAX_PAGES: u32 = 500;

/// TMDB API client.
///
/// Configuration is fixed at build time. Each endpoint method performs its
/// requests one after the other and returns the decoded JSON.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests (`{scheme}://api.themoviedb.org/3/`).
    base_url: Url,
    /// API key sent as the `api_key` query parameter.
    api_key: String,
    /// Language requested by default.
    default_language: String,
    /// Language requested when a localized field is empty.
    fallback_language: String,
    /// Upper bound on pages fetched by paginated endpoints.
    max_pages: u32,
    /// Diagnostic of the most recent failed request.
    last_error: Mutex<Option<String>>,
}

/// Builder for `TmdbClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClientBuilder {
    base_url: Option<Url>,
    scheme: Scheme,
    api_key: Option<String>,
    default_language: Option<String>,
    fallback_language: Option<String>,
    user_agent: Option<String>,
    max_pages: Option<u32>,
}

impl TmdbClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            scheme: Scheme::Http,
            api_key: None,
            default_language: None,
            fallback_language: None,
            user_agent: None,
            max_pages: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    ///
    /// Takes precedence over [`Self::scheme`].
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the URL scheme (default: `http`).
    #[must_use]
    pub const fn scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the default response language (default: `de`).
    #[must_use]
    pub fn default_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = Some(language.into());
        self
    }

    /// Sets the fallback language (default: `en`).
    #[must_use]
    pub fn fallback_language(mut self, language: impl Into<String>) -> Self {
        self.fallback_language = Some(language.into());
        self
    }

    /// Sets the User-Agent (default: `tmdbc-api/<version>`).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Caps the number of pages a paginated call fetches (default: 500).
    #[must_use]
    pub const fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `api_key` is not set or empty.
    /// - The base URL cannot be constructed.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> AnyResult<TmdbClient> {
        let api_key = self.api_key.context("api_key is required")?;
        if api_key.is_empty() {
            anyhow::bail!("api_key must not be empty");
        }

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            let raw = format!("{}://{API_HOST}/{API_VERSION}/", self.scheme);
            Url::parse(&raw).with_context(|| format!("invalid base URL: {raw}"))?
        };

        let user_agent = self.user_agent.unwrap_or_else(|| {
            String::from(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
        });

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(TmdbClient {
            http_client,
            base_url,
            api_key,
            default_language: self
                .default_language
                .unwrap_or_else(|| String::from(DEFAULT_LANGUAGE)),
            fallback_language: self
                .fallback_language
                .unwrap_or_else(|| String::from(DEFAULT_FALLBACK_LANGUAGE)),
            max_pages: self.max_pages.unwrap_or(DEFAULT_MAX_PAGES),
            last_error: Mutex::new(None),
        })
    }
}

impl TmdbClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> TmdbClientBuilder {
        TmdbClientBuilder::new()
    }

    /// Returns the default response language.
    #[must_use]
    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Returns the fallback language.
    #[must_use]
    pub fn fallback_language(&self) -> &str {
        &self.fallback_language
    }

    /// Returns the diagnostic of the most recent failed request, or an
    /// empty string if no request has failed yet.
    #[must_use]
    pub fn last_error(&self) -> String {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_default()
    }

    /// Resolves an optional caller language; `None` and `""` mean default.
    fn language<'a>(&'a self, language: Option<&'a str>) -> &'a str {
        language
            .filter(|lang| !lang.is_empty())
            .unwrap_or(&self.default_language)
    }

    /// Stores `err` as the last error and hands it back.
    fn record_error(&self, err: TmdbError) -> TmdbError {
        *self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(err.to_string());
        err
    }

    /// Fetches every page of `path` and wraps the items in a JSON array.
    async fn all_pages(&self, path: &str, extra: &[(&str, String)]) -> Result<Value> {
        let results = fetch_all_pages(self, path, extra, self.max_pages)
            .await
            .map_err(|e| self.record_error(e))?;
        Ok(Value::Array(results))
    }
}

/// Decodes a `2xx` response body.
///
/// A body that is not valid JSON decodes to `null`; the failure is logged
/// and not returned as an error.
fn decode_body(path: &str, body: &str) -> Value {
    match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(path = path, error = %e, "TMDB response is not valid JSON");
            Value::Null
        }
    }
}

impl LocalRequestExecutor for TmdbClient {
    /// Sends a GET request with the API key and `Accept: application/json`.
    #[instrument(skip(self, params))]
    async fn execute(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| TmdbError::InvalidUrl {
                path: String::from(path),
                message: e.to_string(),
            })
            .map_err(|e| self.record_error(e))?;

        let mut query: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        query.push(("api_key", self.api_key.as_str()));

        let request = self
            .http_client
            .get(url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .query(&query)
            .build()
            .map_err(|e| TmdbError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })
            .map_err(|e| self.record_error(e))?;
        let request_url = request.url().to_string();

        tracing::debug!(path = path, "TMDB API request");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| TmdbError::Transport {
                url: request_url.clone(),
                message: e.to_string(),
            })
            .map_err(|e| self.record_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TmdbError::Transport {
                url: request_url.clone(),
                message: e.to_string(),
            })
            .map_err(|e| self.record_error(e))?;

        if !status.is_success() {
            if let Ok(error_response) = serde_json::from_str::<TmdbErrorResponse>(&body) {
                tracing::warn!(
                    path = path,
                    status = status.as_u16(),
                    code = error_response.status_code,
                    message = %error_response.status_message,
                    "TMDB API error"
                );
            } else {
                tracing::warn!(path = path, status = status.as_u16(), "TMDB API error");
            }
            return Err(self.record_error(TmdbError::Http {
                status: status.as_u16(),
                url: request_url,
                body,
            }));
        }

        Ok(decode_body(path, &body))
    }
}

impl LocalTmdbApi for TmdbClient {
    #[instrument(skip_all)]
    async fn get_movie(&self, id: u64, language: Option<&str>) -> Result<Value> {
        let path = format!("movie/{id}");
        let language = self.language(language);
        fetch_with_fallback(self, &path, language, &self.fallback_language, "title").await
    }

    #[instrument(skip_all)]
    async fn get_movie_changes(&self, id: Option<u64>) -> Result<Value> {
        match id {
            Some(id) => self.execute(&format!("movie/{id}/changes"), &[]).await,
            None => self.all_pages("movie/changes", &[]).await,
        }
    }

    #[instrument(skip_all)]
    async fn get_movie_credits(&self, id: u64) -> Result<Value> {
        self.execute(&format!("movie/{id}/credits"), &[]).await
    }

    #[instrument(skip_all)]
    async fn get_movie_upcoming(&self) -> Result<Value> {
        let extra = [("language", self.default_language.clone())];
        self.all_pages("movie/upcoming", &extra).await
    }

    #[instrument(skip_all)]
    async fn get_movie_videos(&self, id: u64, language: Option<&str>) -> Result<Value> {
        let query = [("language", String::from(self.language(language)))];
        self.execute(&format!("movie/{id}/videos"), &query).await
    }

    #[instrument(skip_all)]
    async fn get_person(&self, id: u64, language: Option<&str>) -> Result<Value> {
        let path = format!("person/{id}");
        let language = self.language(language);
        fetch_with_fallback(self, &path, language, &self.fallback_language, "name").await
    }

    #[instrument(skip_all)]
    async fn get_person_changes(&self, id: Option<u64>) -> Result<Value> {
        match id {
            Some(id) => self.execute(&format!("person/{id}/changes"), &[]).await,
            None => self.all_pages("person/changes", &[]).await,
        }
    }

    #[instrument(skip_all)]
    async fn get_tv(&self, id: u64, language: Option<&str>) -> Result<Value> {
        let path = format!("tv/{id}");
        let language = self.language(language);
        fetch_with_fallback(self, &path, language, &self.fallback_language, "overview").await
    }

    #[instrument(skip_all)]
    async fn get_tv_changes(&self, id: Option<u64>) -> Result<Value> {
        match id {
            Some(id) => self.execute(&format!("tv/{id}/changes"), &[]).await,
            None => self.all_pages("tv/changes", &[]).await,
        }
    }

    #[instrument(skip_all)]
    async fn get_tv_external_ids(&self, id: u64) -> Result<Value> {
        let path = format!("tv/{id}/external_ids");
        let result = self.execute(&path, &[]).await?;
        extract_field(&result, &path, "tvdb_id").map_err(|e| self.record_error(e))
    }

    #[instrument(skip_all)]
    async fn get_tv_videos(&self, id: u64, language: Option<&str>) -> Result<Value> {
        let query = [("language", String::from(self.language(language)))];
        self.execute(&format!("tv/{id}/videos"), &query).await
    }

    #[instrument(skip_all)]
    async fn get_season(&self, tv_id: u64, season_number: u32) -> Result<Value> {
        let path = format!("tv/{tv_id}/season/{season_number}");
        fetch_with_fallback(
            self,
            &path,
            &self.default_language,
            &self.fallback_language,
            "overview",
        )
        .await
    }

    #[instrument(skip_all)]
    async fn get_season_changes(&self, season_id: u64) -> Result<Value> {
        self.execute(&format!("tv/season/{season_id}/changes"), &[])
            .await
    }

    #[instrument(skip_all)]
    async fn get_season_credits(&self, tv_id: u64, season_number: u32) -> Result<Value> {
        self.execute(&format!("tv/{tv_id}/season/{season_number}/credits"), &[])
            .await
    }

    #[instrument(skip_all)]
    async fn get_episode(
        &self,
        tv_id: u64,
        season_number: u32,
        episode_number: u32,
    ) -> Result<Value> {
        let path = format!("tv/{tv_id}/season/{season_number}/episode/{episode_number}");
        fetch_episode_with_fallback(
            self,
            &path,
            &self.default_language,
            &self.fallback_language,
        )
        .await
    }

    #[instrument(skip_all)]
    async fn get_episode_credits(
        &self,
        tv_id: u64,
        season_number: u32,
        episode_number: u32,
    ) -> Result<Value> {
        let path =
            format!("tv/{tv_id}/season/{season_number}/episode/{episode_number}/credits");
        let query = [("language", self.default_language.clone())];
        self.execute(&path, &query).await
    }

    #[instrument(skip_all)]
    async fn find(&self, external_id: &str, source: Option<&str>) -> Result<Value> {
        let query: Vec<(&str, String)> = source
            .filter(|s| !s.is_empty())
            .map(|s| ("external_source", String::from(s)))
            .into_iter()
            .collect();
        self.execute(&format!("find/{external_id}"), &query).await
    }

    #[instrument(skip_all)]
    async fn search_movie(&self, params: &SearchMovieParams) -> Result<Value> {
        let query = params.to_query(&self.default_language);
        self.execute("search/movie", &query).await
    }

    #[instrument(skip_all)]
    async fn search_tv(&self, params: &SearchTvParams) -> Result<Value> {
        let query = params.to_query(&self.default_language);
        self.execute("search/tv", &query).await
    }

    #[instrument(skip_all)]
    async fn get_genres(&self) -> Result<Value> {
        let query = [("language", String::from(GENRE_LANGUAGE))];
        let movie = self.execute("genre/movie/list", &query).await?;
        // TODO: confirm `genre/tv/list` against the current API docs and use it here.
        let tv = self.execute("genre/movie/list", &query).await?;
        Ok(merge_genres(&movie, &tv))
    }
}
