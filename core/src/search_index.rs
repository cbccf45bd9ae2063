//! Search index abstraction: keyed JSON documents grouped into named indexes.
//!
//! Writes are upserts. Writing the same `(index, id)` twice leaves exactly one
//! document holding the last write.

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during search index operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// The index service could not be reached
    #[error("Search index unreachable: {0}")]
    Unreachable(String),

    /// The index service answered with a failure status
    #[error("Index '{index}' rejected document '{id}' (status {status}): {reason}")]
    Rejected {
        /// Target index
        index: String,
        /// Document key, empty for index-level operations
        id: String,
        /// HTTP-style status code
        status: u16,
        /// Response body or error description
        reason: String,
    },

    /// The index service answered with something that could not be understood
    #[error("Invalid response from search index: {0}")]
    InvalidResponse(String),

    /// The service address cannot be used to build request URLs
    #[error("Invalid search index URL: {0}")]
    InvalidUrl(String),
}

/// Trait for search index backends.
///
/// Documents are raw JSON bytes so any serializable read model can be stored.
///
/// # Dyn Compatibility
///
/// Returns `Pin<Box<dyn Future>>` so it can be shared as `Arc<dyn SearchIndex>`.
pub trait SearchIndex: Send + Sync {
    /// Create an index if it does not already exist.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] if the service is unreachable or refuses to
    /// create the index. An index that already exists is not an error.
    fn create_index(
        &self,
        index: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), IndexError>> + Send + '_>>;

    /// Insert or replace the document stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] if the service is unreachable or rejects the write.
    fn upsert(
        &self,
        index: &str,
        id: &str,
        document: &[u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), IndexError>> + Send + '_>>;

    /// Fetch the document stored under `id`, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] if the service is unreachable or the response is invalid.
    fn get(
        &self,
        index: &str,
        id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Vec<u8>>, IndexError>> + Send + '_>>;
}
