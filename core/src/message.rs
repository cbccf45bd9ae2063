//! Message trait for subject-addressed bus messages.
//!
//! Every concrete message type fixes its own bus subject at compile time. The
//! subject is addressing metadata for the bus, not a payload field: it is an
//! associated constant, so it never appears in the serialized form.
//!
//! # Subject Naming Convention
//!
//! Subjects are dot-separated hierarchies of `{kind}.{entity}.{verb}`:
//! - `events.prospect.signedup`
//!
//! Consumers subscribe to an exact subject; wildcards are not used.
//!
//! # Example
//!
//! ```
//! use product_launch_core::message::Message;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Debug, Serialize, Deserialize)]
//! struct NewsletterRequested {
//!     correlation_id: String,
//!     email_address: String,
//! }
//!
//! impl Message for NewsletterRequested {
//!     const SUBJECT: &'static str = "events.newsletter.requested";
//!
//!     fn correlation_id(&self) -> &str {
//!         &self.correlation_id
//!     }
//! }
//! ```

use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

/// A typed message that can be published on the bus.
///
/// New message types are added by introducing a new implementor, never by
/// changing the subject of an existing one. Messages carry data only; all
/// transformation lives in the codec and in projections.
///
/// # Thread Safety
///
/// Messages must be `Send + Sync + 'static` so they can cross task
/// boundaries in the async runtime.
pub trait Message: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The bus subject for this message type.
    ///
    /// Must be non-empty and must not contain wildcards.
    const SUBJECT: &'static str;

    /// Returns the subject this message is published under.
    ///
    /// Always [`Message::SUBJECT`]; callers never choose the subject.
    fn subject(&self) -> &'static str {
        Self::SUBJECT
    }

    /// Returns the correlation ID stamped on this message when it was created.
    ///
    /// Logged as the event ID by producers and consumers.
    fn correlation_id(&self) -> &str;
}

/// Generate a new correlation ID (UUID v4, hyphenated).
#[must_use]
pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}
