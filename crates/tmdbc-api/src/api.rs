//! `TmdbApi` and `RequestExecutor` trait definitions.
#![allow(clippy::future_not_send)]

use serde_json::Value;

use crate::error::Result;
use crate::types::{SearchMovieParams, SearchTvParams};

/// Single-attempt JSON request primitive.
///
/// The fallback and pagination helpers are written against this trait so
/// they can run on an in-memory executor in tests.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(RequestExecutor: Send)]
pub trait LocalRequestExecutor {
    /// Issues one GET request to `path` with the given query pairs.
    ///
    /// The API key is appended by the executor; `params` never contains it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent or the status code is
    /// not `2xx`.
    async fn execute(&self, path: &str, params: &[(&str, String)]) -> Result<Value>;
}

/// TMDB API trait.
///
/// One method per endpoint. Optional language arguments fall back to the
/// client default when `None` or empty.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(TmdbApi: Send)]
pub trait LocalTmdbApi {
    /// Fetches a movie, retrying in the fallback language when `title` is
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP request fails.
    async fn get_movie(&self, id: u64, language: Option<&str>) -> Result<Value>;

    /// Fetches the changes of one movie, or every page of `movie/changes`
    /// when `id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP request fails or a page lacks
    /// `total_pages`/`results`.
    async fn get_movie_changes(&self, id: Option<u64>) -> Result<Value>;

    /// Fetches cast and crew of a movie.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails.
    async fn get_movie_credits(&self, id: u64) -> Result<Value>;

    /// Fetches every page of upcoming movies in the default language.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP request fails or a page lacks
    /// `total_pages`/`results`.
    async fn get_movie_upcoming(&self) -> Result<Value>;

    /// Fetches the videos of a movie.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails.
    async fn get_movie_videos(&self, id: u64, language: Option<&str>) -> Result<Value>;

    /// Fetches a person, retrying in the fallback language when `name` is
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP request fails.
    async fn get_person(&self, id: u64, language: Option<&str>) -> Result<Value>;

    /// Fetches the changes of one person, or every page of `person/changes`.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP request fails or a page lacks
    /// `total_pages`/`results`.
    async fn get_person_changes(&self, id: Option<u64>) -> Result<Value>;

    /// Fetches a TV series, retrying in the fallback language when
    /// `overview` is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP request fails.
    async fn get_tv(&self, id: u64, language: Option<&str>) -> Result<Value>;

    /// Fetches the changes of one TV series, or every page of `tv/changes`.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP request fails or a page lacks
    /// `total_pages`/`results`.
    async fn get_tv_changes(&self, id: Option<u64>) -> Result<Value>;

    /// Returns only the `tvdb_id` of a TV series' external ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or `tvdb_id` is absent.
    async fn get_tv_external_ids(&self, id: u64) -> Result<Value>;

    /// Fetches the videos of a TV series.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails.
    async fn get_tv_videos(&self, id: u64, language: Option<&str>) -> Result<Value>;

    /// Fetches a season, retrying in the fallback language when `overview`
    /// is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP request fails.
    async fn get_season(&self, tv_id: u64, season_number: u32) -> Result<Value>;

    /// Fetches the changes of a season by its TMDB season id.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails.
    async fn get_season_changes(&self, season_id: u64) -> Result<Value>;

    /// Fetches cast and crew of a season.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails.
    async fn get_season_credits(&self, tv_id: u64, season_number: u32) -> Result<Value>;

    /// Fetches an episode, keeping the default-language name when only the
    /// overview has to come from the fallback language.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP request fails.
    async fn get_episode(
        &self,
        tv_id: u64,
        season_number: u32,
        episode_number: u32,
    ) -> Result<Value>;

    /// Fetches cast and crew of an episode.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails.
    async fn get_episode_credits(
        &self,
        tv_id: u64,
        season_number: u32,
        episode_number: u32,
    ) -> Result<Value>;

    /// Looks up TMDB objects by an external id (e.g. `imdb_id`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails.
    async fn find(&self, external_id: &str, source: Option<&str>) -> Result<Value>;

    /// Searches for movies.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails.
    async fn search_movie(&self, params: &SearchMovieParams) -> Result<Value>;

    /// Searches for TV series.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails.
    async fn search_tv(&self, params: &SearchTvParams) -> Result<Value>;

    /// Fetches the merged movie and TV genre list in English.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP request fails.
    async fn get_genres(&self) -> Result<Value>;
}
