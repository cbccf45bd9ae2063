//! Projections: decoded events → search index documents.
//!
//! A projection is the read-side half of the pipeline. The indexing consumer
//! decodes each payload into [`Projection::Event`] and hands it to
//! [`Projection::apply_event`], which writes a denormalized document.
//!
//! ## Example
//!
//! ```ignore
//! use product_launch_core::projection::*;
//!
//! struct SignUpCounter {
//!     index: Arc<dyn SearchIndex>,
//! }
//!
//! impl Projection for SignUpCounter {
//!     type Event = ProspectSignedUpEvent;
//!
//!     fn name(&self) -> &str {
//!         "signup_counter"
//!     }
//!
//!     async fn apply_event(&self, event: &Self::Event) -> Result<()> {
//!         let doc = serde_json::to_vec(&json!({ "at": event.signed_up_at }))?;
//!         self.index.upsert("signups", event.correlation_id(), &doc).await?;
//!         Ok(())
//!     }
//! }
//! ```

use crate::message::Message;
use crate::search_index::IndexError;
use std::future::Future;

/// Error type for projection operations.
#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    /// Search index write failed
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// Document could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Event could not be mapped to a document
    #[error("Event processing error: {0}")]
    EventProcessing(String),
}

impl From<serde_json::Error> for ProjectionError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;

/// A projection maintains a search index read model from one message type.
///
/// # Idempotency
///
/// Implementations should key documents so that applying the same event twice
/// leaves the index unchanged.
pub trait Projection: Send + Sync {
    /// The message type this projection consumes.
    type Event: Message;

    /// Projection name, used in logs and metrics.
    fn name(&self) -> &str;

    /// Apply an event to the read model.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError`] if mapping or the index write fails.
    fn apply_event(&self, event: &Self::Event) -> impl Future<Output = Result<()>> + Send;

    /// Extra context to log when [`apply_event`](Projection::apply_event) fails.
    ///
    /// Default implementation adds nothing.
    fn failure_context(&self, _event: &Self::Event) -> Option<String> {
        None
    }

    /// Best-effort context to log for a payload that did not decode as
    /// [`Self::Event`], e.g. an identifying field still readable in the raw bytes.
    ///
    /// Default implementation adds nothing.
    fn undecodable_context(&self, _payload: &[u8]) -> Option<String> {
        None
    }
}
