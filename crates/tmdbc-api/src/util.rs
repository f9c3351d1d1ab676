//! Language fallback and page accumulation shared by the endpoint methods.

use std::collections::HashSet;

use serde_json::{Map, Value, json};
use tracing::instrument;

use crate::api::LocalRequestExecutor;
use crate::error::{Result, TmdbError};
use crate::types::PagedResponse;

/// Returns `true` when `field` is absent, `null`, or the empty string.
///
/// Any other value, including `0`, `false` and empty arrays, counts as
/// present.
#[must_use]
pub fn is_empty_field(value: &Value, field: &str) -> bool {
    match value.get(field) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Fetches `path` in `language` and, if `field` is empty, fetches it again in
/// `fallback_language` and returns that response instead.
///
/// A failed primary request counts as an empty field: the error is left to
/// the executor to record and the fallback request decides the outcome.
///
/// # Errors
///
/// Returns an error if the fallback request fails.
#[instrument(skip(api))]
pub async fn fetch_with_fallback(
    api: &(impl LocalRequestExecutor + Sync),
    path: &str,
    language: &str,
    fallback_language: &str,
    field: &str,
) -> Result<Value> {
    match api
        .execute(path, &[("language", String::from(language))])
        .await
    {
        Ok(result) if !is_empty_field(&result, field) => return Ok(result),
        Ok(_) => tracing::debug!(
            field = field,
            fallback = fallback_language,
            "localized field empty, retrying in fallback language"
        ),
        Err(e) => tracing::debug!(
            error = %e,
            fallback = fallback_language,
            "localized request failed, retrying in fallback language"
        ),
    }

    api.execute(path, &[("language", String::from(fallback_language))])
        .await
}

/// Episode variant of [`fetch_with_fallback`].
///
/// When `name` or `overview` is empty in `language`, the episode is fetched
/// again in `fallback_language`. If the original `name` was present it is
/// written over the fallback record, so the caller gets the localized name
/// with the fallback overview. Otherwise (including a failed primary
/// request) the fallback record is returned as-is.
///
/// # Errors
///
/// Returns an error if the fallback request fails.
#[instrument(skip(api))]
pub async fn fetch_episode_with_fallback(
    api: &(impl LocalRequestExecutor + Sync),
    path: &str,
    language: &str,
    fallback_language: &str,
) -> Result<Value> {
    let localized_name = match api
        .execute(path, &[("language", String::from(language))])
        .await
    {
        Ok(result) => {
            if is_empty_field(&result, "name") {
                None
            } else if is_empty_field(&result, "overview") {
                result.get("name").cloned()
            } else {
                return Ok(result);
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, "localized episode request failed");
            None
        }
    };

    let mut fallback = api
        .execute(path, &[("language", String::from(fallback_language))])
        .await?;
    let Some(name) = localized_name else {
        tracing::debug!("episode name empty, using fallback record");
        return Ok(fallback);
    };

    tracing::debug!("episode overview empty, keeping localized name");
    if fallback.is_null() {
        fallback = Value::Object(Map::new());
    }
    if let Some(map) = fallback.as_object_mut() {
        map.insert(String::from("name"), name);
    }
    Ok(fallback)
}

/// Fetches every page of a paginated endpoint and concatenates the
/// `results` arrays in page order.
///
/// Stops once the page counter passes the last reported `total_pages`, or
/// once it passes `max_pages`.
///
/// # Errors
///
/// Returns an error if any request fails or a page lacks `total_pages` or
/// `results`.
#[instrument(skip(api, extra))]
pub async fn fetch_all_pages(
    api: &(impl LocalRequestExecutor + Sync),
    path: &str,
    extra: &[(&str, String)],
    max_pages: u32,
) -> Result<Vec<Value>> {
    let mut all_results: Vec<Value> = Vec::new();
    let mut page: u32 = 1;

    loop {
        let mut params: Vec<(&str, String)> = vec![("page", page.to_string())];
        params.extend(extra.iter().cloned());

        let raw = api.execute(path, &params).await?;
        let envelope: PagedResponse =
            serde_json::from_value(raw).map_err(|e| TmdbError::Decode {
                path: String::from(path),
                message: e.to_string(),
            })?;
        let total_pages = envelope.total_pages.ok_or_else(|| TmdbError::MissingField {
            path: String::from(path),
            field: "total_pages",
        })?;
        let results = envelope.results.ok_or_else(|| TmdbError::MissingField {
            path: String::from(path),
            field: "results",
        })?;

        tracing::debug!(
            page = page,
            total_pages = total_pages,
            fetched = results.len(),
            "page fetched"
        );
        all_results.extend(results);

        page = page.saturating_add(1);
        if page > total_pages {
            break;
        }
        if page > max_pages {
            tracing::warn!(
                max_pages = max_pages,
                total_pages = total_pages,
                "page limit reached, stopping pagination"
            );
            break;
        }
    }

    tracing::info!(
        total = all_results.len(),
        pages = page.saturating_sub(1),
        "pagination completed"
    );

    Ok(all_results)
}

/// Merges two `{"genres": [...]}` responses into one, keeping the first
/// occurrence of every genre id.
#[must_use]
pub fn merge_genres(movie: &Value, tv: &Value) -> Value {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged: Vec<Value> = Vec::new();

    let genres = [movie, tv]
        .into_iter()
        .filter_map(|response| response.get("genres").and_then(Value::as_array))
        .flatten();
    for genre in genres {
        let key = genre
            .get("id")
            .map_or_else(|| genre.to_string(), Value::to_string);
        if seen.insert(key) {
            merged.push(genre.clone());
        }
    }

    json!({ "genres": merged })
}

/// Returns a copy of `field` from `value`.
///
/// # Errors
///
/// Returns [`TmdbError::MissingField`] if the field is absent.
pub fn extract_field(value: &Value, path: &str, field: &'static str) -> Result<Value> {
    value
        .get(field)
        .cloned()
        .ok_or_else(|| TmdbError::MissingField {
            path: String::from(path),
            field,
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use std::sync::Mutex;

    use super::*;

    type Responder = Box<dyn Fn(&str, &[(&str, String)]) -> Result<Value> + Send + Sync>;

    /// In-memory executor that answers through a closure and records calls.
    struct MockExecutor {
        responder: Responder,
        calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl MockExecutor {
        fn new(
            responder: impl Fn(&str, &[(&str, String)]) -> Result<Value> + Send + Sync + 'static,
        ) -> Self {
            Self {
                responder: Box::new(responder),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn languages(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter_map(|(_, params)| {
                    params
                        .iter()
                        .find(|(k, _)| k == "language")
                        .map(|(_, v)| v.clone())
                })
                .collect()
        }
    }

    impl LocalRequestExecutor for MockExecutor {
        async fn execute(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
            self.calls.lock().unwrap().push((
                String::from(path),
                params
                    .iter()
                    .map(|(k, v)| (String::from(*k), v.clone()))
                    .collect(),
            ));
            (self.responder)(path, params)
        }
    }

    fn language_of(params: &[(&str, String)]) -> String {
        params
            .iter()
            .find(|(k, _)| *k == "language")
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    }

    fn page_of(params: &[(&str, String)]) -> u32 {
        params
            .iter()
            .find(|(k, _)| *k == "page")
            .map(|(_, v)| v.parse().unwrap())
            .unwrap()
    }

    #[test]
    fn test_is_empty_field_absent_null_and_empty_string() {
        // Arrange
        let value = json!({"a": null, "b": "", "c": "x", "d": 0, "e": false, "f": []});

        // Act & Assert
        assert!(is_empty_field(&value, "missing"));
        assert!(is_empty_field(&value, "a"));
        assert!(is_empty_field(&value, "b"));
        assert!(!is_empty_field(&value, "c"));
        assert!(!is_empty_field(&value, "d"));
        assert!(!is_empty_field(&value, "e"));
        assert!(!is_empty_field(&value, "f"));
    }

    #[test]
    fn test_is_empty_field_on_non_object() {
        // Arrange & Act & Assert
        assert!(is_empty_field(&Value::Null, "title"));
        assert!(is_empty_field(&json!([1, 2]), "title"));
    }

    #[tokio::test]
    async fn test_fallback_not_used_when_field_present() {
        // Arrange
        let mock = MockExecutor::new(|_, _| Ok(json!({"id": 1, "title": "Der Pate"})));

        // Act
        let result = fetch_with_fallback(&mock, "movie/1", "de", "en", "title")
            .await
            .unwrap();

        // Assert
        assert_eq!(result["title"], "Der Pate");
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.languages(), vec![String::from("de")]);
    }

    #[tokio::test]
    async fn test_fallback_replaces_result_when_field_empty() {
        // Arrange
        let mock = MockExecutor::new(|_, params| {
            if language_of(params) == "de" {
                Ok(json!({"id": 1, "title": "", "tagline": "nur deutsch"}))
            } else {
                Ok(json!({"id": 1, "title": "The Godfather"}))
            }
        });

        // Act
        let result = fetch_with_fallback(&mock, "movie/1", "de", "en", "title")
            .await
            .unwrap();

        // Assert
        assert_eq!(result, json!({"id": 1, "title": "The Godfather"}));
        assert_eq!(
            mock.languages(),
            vec![String::from("de"), String::from("en")]
        );
    }

    fn http_500(path: &str) -> TmdbError {
        TmdbError::Http {
            status: 500,
            url: format!("http://api.themoviedb.org/3/{path}"),
            body: String::new(),
        }
    }

    #[tokio::test]
    async fn test_fallback_used_when_primary_request_fails() {
        // Arrange
        let mock = MockExecutor::new(|path, params| {
            if language_of(params) == "de" {
                Err(http_500(path))
            } else {
                Ok(json!({"id": 5, "overview": "English"}))
            }
        });

        // Act
        let result = fetch_with_fallback(&mock, "tv/5", "de", "en", "overview")
            .await
            .unwrap();

        // Assert
        assert_eq!(result, json!({"id": 5, "overview": "English"}));
        assert_eq!(
            mock.languages(),
            vec![String::from("de"), String::from("en")]
        );
    }

    #[tokio::test]
    async fn test_fallback_error_returned_when_both_requests_fail() {
        // Arrange
        let mock = MockExecutor::new(|path, _| Err(http_500(path)));

        // Act
        let result = fetch_with_fallback(&mock, "tv/5", "de", "en", "overview").await;

        // Assert
        assert!(matches!(result, Err(TmdbError::Http { status: 500, .. })));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_episode_primary_failure_returns_fallback_verbatim() {
        // Arrange
        let fallback = json!({"name": "The Arrival", "overview": "They arrive."});
        let expected = fallback.clone();
        let mock = MockExecutor::new(move |path, params| {
            if language_of(params) == "de" {
                Err(http_500(path))
            } else {
                Ok(fallback.clone())
            }
        });

        // Act
        let result = fetch_episode_with_fallback(&mock, "tv/1/season/1/episode/2", "de", "en")
            .await
            .unwrap();

        // Assert
        assert_eq!(result, expected);
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_episode_complete_returned_unchanged() {
        // Arrange
        let original = json!({"name": "Pilot", "overview": "Es beginnt.", "id": 9});
        let expected = original.clone();
        let mock = MockExecutor::new(move |_, _| Ok(original.clone()));

        // Act
        let result = fetch_episode_with_fallback(&mock, "tv/1/season/1/episode/1", "de", "en")
            .await
            .unwrap();

        // Assert
        assert_eq!(result, expected);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_episode_empty_overview_keeps_localized_name() {
        // Arrange
        let mock = MockExecutor::new(|_, params| {
            if language_of(params) == "de" {
                Ok(json!({"name": "Die Ankunft", "overview": ""}))
            } else {
                Ok(json!({"name": "The Arrival", "overview": "They arrive.", "id": 3}))
            }
        });

        // Act
        let result = fetch_episode_with_fallback(&mock, "tv/1/season/1/episode/2", "de", "en")
            .await
            .unwrap();

        // Assert
        assert_eq!(result["name"], "Die Ankunft");
        assert_eq!(result["overview"], "They arrive.");
        assert_eq!(result["id"], 3);
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_episode_empty_name_and_overview_returns_fallback_verbatim() {
        // Arrange
        let fallback = json!({"name": "The Arrival", "overview": "They arrive."});
        let expected = fallback.clone();
        let mock = MockExecutor::new(move |_, params| {
            if language_of(params) == "de" {
                Ok(json!({"name": null, "overview": ""}))
            } else {
                Ok(fallback.clone())
            }
        });

        // Act
        let result = fetch_episode_with_fallback(&mock, "tv/1/season/1/episode/2", "de", "en")
            .await
            .unwrap();

        // Assert
        assert_eq!(result, expected);
    }

    #[tokio::test]
    async fn test_episode_empty_name_only_returns_fallback_verbatim() {
        // Arrange
        let fallback = json!({"name": "The Arrival", "overview": "They arrive."});
        let expected = fallback.clone();
        let mock = MockExecutor::new(move |_, params| {
            if language_of(params) == "de" {
                Ok(json!({"name": "", "overview": "Sie kommen an."}))
            } else {
                Ok(fallback.clone())
            }
        });

        // Act
        let result = fetch_episode_with_fallback(&mock, "tv/1/season/1/episode/2", "de", "en")
            .await
            .unwrap();

        // Assert
        assert_eq!(result, expected);
    }

    #[tokio::test]
    async fn test_fetch_all_pages_concatenates_in_page_order() {
        // Arrange
        let mock = MockExecutor::new(|_, params| {
            let page = page_of(params);
            let results: Vec<Value> = match page {
                1 => vec![json!({"id": 1}), json!({"id": 2})],
                2 => vec![json!({"id": 3})],
                _ => vec![json!({"id": 4}), json!({"id": 5}), json!({"id": 6})],
            };
            Ok(json!({"page": page, "total_pages": 3, "results": results}))
        });

        // Act
        let results = fetch_all_pages(&mock, "movie/changes", &[], 500)
            .await
            .unwrap();

        // Assert
        assert_eq!(results.len(), 6);
        let ids: Vec<u64> = results.iter().map(|r| r["id"].as_u64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fetch_all_pages_follows_last_seen_total_pages() {
        // Arrange: the server lowers total_pages on page 2
        let mock = MockExecutor::new(|_, params| {
            let page = page_of(params);
            let total_pages = if page == 1 { 5 } else { 2 };
            Ok(json!({"total_pages": total_pages, "results": [{"page": page}]}))
        });

        // Act
        let results = fetch_all_pages(&mock, "tv/changes", &[], 500)
            .await
            .unwrap();

        // Assert
        assert_eq!(results.len(), 2);
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_fetch_all_pages_forwards_extra_params() {
        // Arrange
        let mock = MockExecutor::new(|_, _| Ok(json!({"total_pages": 1, "results": []})));

        // Act
        fetch_all_pages(&mock, "movie/upcoming", &[("language", String::from("de"))], 500)
            .await
            .unwrap();

        // Assert
        let calls = mock.calls.lock().unwrap();
        assert_eq!(
            calls[0].1,
            vec![
                (String::from("page"), String::from("1")),
                (String::from("language"), String::from("de")),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_all_pages_zero_total_pages_fetches_once() {
        // Arrange
        let mock = MockExecutor::new(|_, _| Ok(json!({"total_pages": 0, "results": []})));

        // Act
        let results = fetch_all_pages(&mock, "person/changes", &[], 500)
            .await
            .unwrap();

        // Assert
        assert!(results.is_empty());
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_all_pages_stops_at_max_pages() {
        // Arrange
        let mock = MockExecutor::new(|_, _| {
            Ok(json!({"total_pages": 10_000, "results": [{"id": 1}]}))
        });

        // Act
        let results = fetch_all_pages(&mock, "movie/changes", &[], 3)
            .await
            .unwrap();

        // Assert
        assert_eq!(results.len(), 3);
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fetch_all_pages_missing_total_pages() {
        // Arrange
        let mock = MockExecutor::new(|_, _| Ok(json!({"results": []})));

        // Act
        let result = fetch_all_pages(&mock, "movie/changes", &[], 500).await;

        // Assert
        assert_eq!(
            result.unwrap_err(),
            TmdbError::MissingField {
                path: String::from("movie/changes"),
                field: "total_pages",
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_all_pages_missing_results() {
        // Arrange
        let mock = MockExecutor::new(|_, _| Ok(json!({"total_pages": 1})));

        // Act
        let result = fetch_all_pages(&mock, "tv/changes", &[], 500).await;

        // Assert
        assert!(matches!(
            result,
            Err(TmdbError::MissingField {
                field: "results",
                ..
            })
        ));
    }

    #[test]
    fn test_merge_genres_dedups_by_id() {
        // Arrange
        let movie = json!({"genres": [{"id": 28, "name": "Action"}, {"id": 18, "name": "Drama"}]});
        let tv = json!({"genres": [{"id": 18, "name": "Drama"}, {"id": 99, "name": "Documentary"}]});

        // Act
        let merged = merge_genres(&movie, &tv);

        // Assert
        let names: Vec<&str> = merged["genres"]
            .as_array()
            .unwrap()
            .iter()
            .map(|g| g["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Action", "Drama", "Documentary"]);
    }

    #[test]
    fn test_merge_genres_tolerates_missing_lists() {
        // Arrange
        let movie = json!({"genres": [{"id": 28, "name": "Action"}]});

        // Act
        let merged = merge_genres(&movie, &Value::Null);

        // Assert
        assert_eq!(merged, json!({"genres": [{"id": 28, "name": "Action"}]}));
    }

    #[test]
    fn test_extract_field() {
        // Arrange
        let value = json!({"imdb_id": "tt0944947", "tvdb_id": 121_361});

        // Act & Assert
        assert_eq!(
            extract_field(&value, "tv/1399/external_ids", "tvdb_id").unwrap(),
            json!(121_361)
        );
        assert!(extract_field(&value, "tv/1399/external_ids", "tvrage_id").is_err());
    }
}
