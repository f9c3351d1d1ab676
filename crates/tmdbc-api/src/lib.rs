//! TMDB API v3 client.
//!
//! Handles HTTP requests to the TMDB endpoints for movies, TV series,
//! seasons, episodes, people, genres and search. Localized text that comes
//! back empty is refetched in a fallback language, and paginated change
//! and upcoming lists are accumulated across all pages.

mod api;
mod client;
mod error;
mod types;
mod util;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalRequestExecutor, LocalTmdbApi, RequestExecutor, TmdbApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{TmdbClient, TmdbClientBuilder};
pub use error::{Result, TmdbError};
#[allow(clippy::module_name_repetitions)]
pub use types::{PagedResponse, Scheme, SearchMovieParams, SearchTvParams, TmdbErrorResponse};
pub use util::{
    extract_field, fetch_all_pages, fetch_episode_with_fallback, fetch_with_fallback,
    is_empty_field, merge_genres,
};
