//! Event bus abstraction for subject-addressed publish/subscribe.
//!
//! The [`EventBus`] trait moves opaque byte payloads between processes. It knows
//! nothing about message types: typing lives in [`crate::codec`] and
//! [`crate::publisher::MessagePublisher`].
//!
//! # Delivery
//!
//! - **At-most-once**: No acknowledgement and no redelivery
//! - **Fan-out**: Every active subscriber of a subject gets its own copy
//! - **Live only**: Messages published while nobody subscribes are lost
//!
//! # Connections
//!
//! `publish` opens a connection, sends, flushes and closes it again. A
//! connection is never shared between calls. `subscribe` keeps its connection
//! open for as long as the returned stream lives.
//!
//! # Implementations
//!
//! - `InMemoryEventBus` (testing crate) - For tests, in-process
//! - `NatsEventBus` (nats crate) - For production
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//!
//! async fn example(bus: &dyn EventBus) -> Result<(), EventBusError> {
//!     bus.publish("events.prospect.signedup", br#"{"CorrelationId":"..."}"#).await?;
//!
//!     let mut stream = bus.subscribe("events.prospect.signedup").await?;
//!     while let Some(result) = stream.next().await {
//!         match result {
//!             Ok(payload) => println!("Received {} bytes", payload.len()),
//!             Err(e) => eprintln!("Error: {e}"),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during event bus operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventBusError {
    /// Failed to connect to the message broker
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to publish or flush a payload
    #[error("Publish failed for subject '{subject}': {reason}")]
    PublishFailed {
        /// The subject that failed
        subject: String,
        /// The reason for failure
        reason: String,
    },

    /// Failed to register a subscription
    #[error("Subscription failed for subject '{subject}': {reason}")]
    SubscriptionFailed {
        /// The subject that failed to subscribe
        subject: String,
        /// The reason for failure
        reason: String,
    },

    /// Subject is empty or malformed
    #[error("Invalid subject: {0}")]
    InvalidSubject(String),

    /// Network or transport error on an established connection
    #[error("Transport error: {0}")]
    TransportError(String),
}

/// Stream of raw payloads from a subscription.
///
/// Each item is the payload of one delivered message, or a transport error.
/// The stream ends when the subscription is closed.
pub type PayloadStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, EventBusError>> + Send>>;

/// Trait for event bus implementations.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` so a single bus can be shared
/// through `Arc<dyn EventBus>` by publishers and consumers.
///
/// # Dyn Compatibility
///
/// This trait uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn`
/// to enable trait object usage (`Arc<dyn EventBus>`).
pub trait EventBus: Send + Sync {
    /// Publish a payload on a subject.
    ///
    /// Completes once the payload has been flushed to the broker, which is not
    /// confirmation that any subscriber received it.
    ///
    /// # Errors
    ///
    /// - [`EventBusError::InvalidSubject`] if `subject` fails [`validate_subject`]
    /// - [`EventBusError::ConnectionFailed`] if the broker is unreachable
    /// - [`EventBusError::PublishFailed`] if sending or flushing fails
    fn publish(
        &self,
        subject: &str,
        payload: &[u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>>;

    /// Subscribe to a subject and receive a stream of payloads.
    ///
    /// The subscription is active once the returned future resolves. Dropping
    /// the stream unsubscribes and closes the connection.
    ///
    /// # Errors
    ///
    /// - [`EventBusError::InvalidSubject`] if `subject` fails [`validate_subject`]
    /// - [`EventBusError::ConnectionFailed`] if the broker is unreachable
    /// - [`EventBusError::SubscriptionFailed`] if the broker rejects the subscription
    fn subscribe(
        &self,
        subject: &str,
    ) -> Pin<Box<dyn Future<Output = Result<PayloadStream, EventBusError>> + Send + '_>>;
}

/// Check that a subject is usable for exact-match publish/subscribe.
///
/// A valid subject is non-empty, has no whitespace, no empty dot-separated
/// tokens, and no `*` or `>` wildcard tokens.
///
/// # Errors
///
/// Returns [`EventBusError::InvalidSubject`] describing the first problem found.
pub fn validate_subject(subject: &str) -> Result<(), EventBusError> {
    if subject.is_empty() {
        return Err(EventBusError::InvalidSubject("subject is empty".to_string()));
    }

    if subject.chars().any(char::is_whitespace) {
        return Err(EventBusError::InvalidSubject(format!(
            "'{subject}' contains whitespace"
        )));
    }

    for token in subject.split('.') {
        match token {
            "" => {
                return Err(EventBusError::InvalidSubject(format!(
                    "'{subject}' contains an empty token"
                )));
            }
            "*" | ">" => {
                return Err(EventBusError::InvalidSubject(format!(
                    "'{subject}' contains wildcard '{token}'"
                )));
            }
            _ => {}
        }
    }

    Ok(())
}
