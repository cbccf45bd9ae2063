//! In-memory search index for fast, deterministic tests.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use product_launch_core::search_index::{IndexError, SearchIndex};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

type Documents = HashMap<String, HashMap<String, Vec<u8>>>;

/// HashMap-backed [`SearchIndex`].
///
/// Upserts into an index that was never created create it, as Elasticsearch does.
///
/// # Example
///
/// ```
/// use product_launch_testing::InMemorySearchIndex;
/// use product_launch_core::search_index::SearchIndex;
///
/// # tokio_test::block_on(async {
/// let index = InMemorySearchIndex::new();
/// index.upsert("prospects", "42", br#"{"fullName":"A Prospect"}"#).await.unwrap();
///
/// assert_eq!(index.document_count("prospects"), 1);
/// assert_eq!(index.get_json("prospects", "42").unwrap()["fullName"], "A Prospect");
/// # });
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemorySearchIndex {
    indexes: Arc<RwLock<Documents>>,
    failing_upserts: Arc<AtomicUsize>,
    upsert_attempts: Arc<AtomicUsize>,
}

impl InMemorySearchIndex {
    /// Create an empty index service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` upserts with [`IndexError::Unreachable`].
    pub fn fail_next_upserts(&self, n: usize) {
        self.failing_upserts.store(n, Ordering::SeqCst);
    }

    /// Whether `index` exists.
    #[must_use]
    pub fn index_exists(&self, index: &str) -> bool {
        self.indexes.read().unwrap().contains_key(index)
    }

    /// Number of documents in `index`.
    #[must_use]
    pub fn document_count(&self, index: &str) -> usize {
        self.indexes
            .read()
            .unwrap()
            .get(index)
            .map_or(0, HashMap::len)
    }

    /// Stored document as JSON, if present.
    #[must_use]
    pub fn get_json(&self, index: &str, id: &str) -> Option<serde_json::Value> {
        let indexes = self.indexes.read().unwrap();
        let bytes = indexes.get(index)?.get(id)?;
        serde_json::from_slice(bytes).ok()
    }

    /// Upserts attempted so far, failed ones included.
    #[must_use]
    pub fn upsert_attempts(&self) -> usize {
        self.upsert_attempts.load(Ordering::SeqCst)
    }
}

impl SearchIndex for InMemorySearchIndex {
    fn create_index(
        &self,
        index: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), IndexError>> + Send + '_>> {
        let index = index.to_string();
        Box::pin(async move {
            self.indexes.write().unwrap().entry(index).or_default();
            Ok(())
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
            self.upsert_attempts.fetch_add(1, Ordering::SeqCst);

            let failing = self
                .failing_upserts
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(IndexError::Unreachable(
                    "in-memory index is unavailable".to_string(),
                ));
            }

            self.indexes
                .write()
                .unwrap()
                .entry(index)
                .or_default()
                .insert(id, document);
            Ok(())
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
            Ok(self
                .indexes
                .read()
                .unwrap()
                .get(&index)
                .and_then(|documents| documents.get(&id))
                .cloned())
        })
    }
}
