//! Elasticsearch implementation of [`SearchIndex`].
//!
//! Talks to the Elasticsearch REST API over HTTP with `reqwest`:
//!
//! | Operation      | Request                         |
//! |----------------|---------------------------------|
//! | `create_index` | `PUT /{index}`                  |
//! | `upsert`       | `PUT /{index}/_doc/{id}`        |
//! | `get`          | `GET /{index}/_doc/{id}`        |
//!
//! `PUT /{index}/_doc/{id}` replaces the whole document, so repeated writes for
//! the same id leave one document holding the last write.
//!
//! # Example
//!
//! ```ignore
//! use product_launch_elasticsearch::ElasticsearchIndex;
//! use product_launch_core::search_index::SearchIndex;
//!
//! let index = ElasticsearchIndex::new("http://localhost:9200")?;
//! index.create_index("prospects").await?;
//! index.upsert("prospects", "42", br#"{"fullName":"A Prospect"}"#).await?;
//! ```

use product_launch_core::search_index::{IndexError, SearchIndex};
use reqwest::header::CONTENT_TYPE;
use reqwest::{StatusCode, Url};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Search index backed by an Elasticsearch node or cluster.
#[derive(Debug, Clone)]
pub struct ElasticsearchIndex {
    client: reqwest::Client,
    base_url: Url,
}

impl ElasticsearchIndex {
    /// Create an index client for `base_url` (e.g. `http://elasticsearch:9200`).
    ///
    /// # Errors
    ///
    /// - [`IndexError::InvalidUrl`] if `base_url` is not an absolute HTTP(S) URL
    /// - [`IndexError::Unreachable`] if the HTTP client cannot be built
    pub fn new(base_url: impl Into<String>) -> Result<Self, IndexError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create an index client with a custom per-request timeout.
    ///
    /// # Errors
    ///
    /// - [`IndexError::InvalidUrl`] if `base_url` is not an absolute HTTP(S) URL
    /// - [`IndexError::Unreachable`] if the HTTP client cannot be built
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, IndexError> {
        let base_url = base_url.into();
        let parsed = Url::parse(&base_url)
            .map_err(|e| IndexError::InvalidUrl(format!("'{base_url}': {e}")))?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(IndexError::InvalidUrl(format!(
                "'{base_url}' is not an http(s) base URL"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IndexError::Unreachable(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn url_for(&self, segments: &[&str]) -> Result<Url, IndexError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| IndexError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn index_url(&self, index: &str) -> Result<Url, IndexError> {
        self.url_for(&[index])
    }

    fn document_url(&self, index: &str, id: &str) -> Result<Url, IndexError> {
        self.url_for(&[index, "_doc", id])
    }
}

fn unreachable(e: &reqwest::Error) -> IndexError {
    IndexError::Unreachable(e.to_string())
}

fn already_exists(status: StatusCode, body: &str) -> bool {
    status == StatusCode::BAD_REQUEST && body.contains("resource_already_exists_exception")
}

/// Extract `_source` from a `GET /{index}/_doc/{id}` response body.
fn source_of(body: &[u8]) -> Result<Vec<u8>, IndexError> {
    let mut value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| IndexError::InvalidResponse(format!("response is not JSON: {e}")))?;

    let source = value
        .get_mut("_source")
        .map(serde_json::Value::take)
        .ok_or_else(|| IndexError::InvalidResponse("response has no _source".to_string()))?;

    serde_json::to_vec(&source).map_err(|e| IndexError::InvalidResponse(e.to_string()))
}

impl SearchIndex for ElasticsearchIndex {
    fn create_index(
        &self,
        index: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), IndexError>> + Send + '_>> {
        let index = index.to_string();

        Box::pin(async move {
            let url = self.index_url(&index)?;
            let response = self
                .client
                .put(url)
                .send()
                .await
                .map_err(|e| unreachable(&e))?;

            let status = response.status();
            let body = response.text().await.map_err(|e| unreachable(&e))?;

            if status.is_success() {
                tracing::info!(index = %index, "Created search index");
                Ok(())
            } else if already_exists(status, &body) {
                tracing::debug!(index = %index, "Search index already exists");
                Ok(())
            } else {
                Err(IndexError::Rejected {
                    index,
                    id: String::new(),
                    status: status.as_u16(),
                    reason: body,
                })
            }
        })
    }

    fn upsert(
        &self,
        index: &str,
        id: &str,
        document: &[u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), IndexError>> + Send + '_>> {
        let index = index.to_string();
        let id = id.to_string();
        let document = document.to_vec();

        Box::pin(async move {
            let url = self.document_url(&index, &id)?;
            let response = self
                .client
                .put(url)
                .header(CONTENT_TYPE, "application/json")
                .body(document)
                .send()
                .await
                .map_err(|e| unreachable(&e))?;

            let status = response.status();
            if status.is_success() {
                tracing::debug!(index = %index, id = %id, status = status.as_u16(), "Document upserted");
                return Ok(());
            }

            let reason = response.text().await.unwrap_or_default();
            Err(IndexError::Rejected {
                index,
                id,
                status: status.as_u16(),
                reason,
            })
        })
    }

    fn get(
        &self,
        index: &str,
        id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Vec<u8>>, IndexError>> + Send + '_>> {
        let index = index.to_string();
        let id = id.to_string();

        Box::pin(async move {
            let url = self.document_url(&index, &id)?;
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| unreachable(&e))?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }

            let body = response.bytes().await.map_err(|e| unreachable(&e))?;
            if !status.is_success() {
                return Err(IndexError::Rejected {
                    index,
                    id,
                    status: status.as_u16(),
                    reason: String::from_utf8_lossy(&body).into_owned(),
                });
            }

            source_of(&body).map(Some)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let index = ElasticsearchIndex::new("http://elasticsearch:9200/").unwrap();
        assert_eq!(index.base_url(), "http://elasticsearch:9200");
        assert_eq!(
            index.document_url("prospects", "42").unwrap().as_str(),
            "http://elasticsearch:9200/prospects/_doc/42"
        );
    }

    #[test]
    fn document_id_is_a_single_path_segment() {
        let index = ElasticsearchIndex::new("http://es:9200").unwrap();

        let url = index
            .document_url("prospects", "acme/42?refresh=true#x")
            .unwrap();

        assert_eq!(
            url.as_str(),
            "http://es:9200/prospects/_doc/acme%2F42%3Frefresh=true%23x"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn base_path_is_kept() {
        let index = ElasticsearchIndex::new("https://proxy.local/search/").unwrap();

        assert_eq!(
            index.index_url("prospects").unwrap().as_str(),
            "https://proxy.local/search/prospects"
        );
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        assert!(matches!(
            ElasticsearchIndex::new("elasticsearch:9200"),
            Err(IndexError::InvalidUrl(_))
        ));
        assert!(matches!(
            ElasticsearchIndex::new("not a url"),
            Err(IndexError::InvalidUrl(_))
        ));
    }

    #[test]
    fn existing_index_is_recognised() {
        let body = r#"{"error":{"type":"resource_already_exists_exception"},"status":400}"#;
        assert!(already_exists(StatusCode::BAD_REQUEST, body));
        assert!(!already_exists(StatusCode::BAD_REQUEST, r#"{"error":"mapper_parsing_exception"}"#));
        assert!(!already_exists(StatusCode::INTERNAL_SERVER_ERROR, body));
    }

    #[test]
    fn source_is_extracted_from_get_response() {
        let body = br#"{"_index":"prospects","_id":"42","found":true,"_source":{"emailAddress":"a@b.com"}}"#;
        let source: serde_json::Value = serde_json::from_slice(&source_of(body).unwrap()).unwrap();
        assert_eq!(source["emailAddress"], "a@b.com");
    }

    #[test]
    fn get_response_without_source_is_invalid() {
        assert!(matches!(
            source_of(br#"{"found":true}"#),
            Err(IndexError::InvalidResponse(_))
        ));
        assert!(matches!(
            source_of(b"<html>"),
            Err(IndexError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_service_is_reported() {
        let index =
            ElasticsearchIndex::with_timeout("http://127.0.0.1:1", Duration::from_millis(500))
                .unwrap();

        let result = index.upsert("prospects", "42", b"{}").await;
        assert!(matches!(result, Err(IndexError::Unreachable(_))));
    }
}
