//! Typed publishing on top of a bytes-only [`EventBus`].

use crate::codec::{self, CodecError};
use crate::event_bus::{EventBus, EventBusError};
use crate::message::Message;
use crate::metrics::EventBusMetrics;
use std::sync::Arc;
use thiserror::Error;

/// Errors from [`MessagePublisher::publish`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// The message could not be encoded; nothing was sent.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The bus rejected or failed to deliver the payload.
    #[error(transparent)]
    Bus(#[from] EventBusError),
}

/// Encodes messages and publishes them under their own subject.
///
/// Callers never pass a subject: it comes from [`Message::SUBJECT`].
///
/// # Example
///
/// ```rust,ignore
/// let publisher = MessagePublisher::new(Arc::new(NatsEventBus::new(url)));
/// publisher.publish(&ProspectSignedUpEvent::new(prospect, clock.now())).await?;
/// ```
#[derive(Clone)]
pub struct MessagePublisher {
    bus: Arc<dyn EventBus>,
}

impl MessagePublisher {
    /// Create a publisher over any event bus.
    #[must_use]
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self { bus }
    }

    /// Encode `message` and publish it on `M::SUBJECT`.
    ///
    /// # Errors
    ///
    /// - [`PublishError::Codec`] if encoding fails
    /// - [`PublishError::Bus`] if the bus is unreachable or the publish fails
    pub async fn publish<M: Message>(&self, message: &M) -> Result<(), PublishError> {
        let subject = message.subject();
        let correlation_id = message.correlation_id();

        let payload = codec::encode(message)?;

        tracing::debug!(
            subject = %subject,
            correlation_id = %correlation_id,
            bytes = payload.len(),
            "Publishing message"
        );

        match self.bus.publish(subject, &payload).await {
            Ok(()) => {
                EventBusMetrics::record_publish(subject);
                tracing::info!(
                    subject = %subject,
                    correlation_id = %correlation_id,
                    "Published message"
                );
                Ok(())
            }
            Err(e) => {
                EventBusMetrics::record_publish_error(subject);
                tracing::error!(
                    subject = %subject,
                    correlation_id = %correlation_id,
                    error = %e,
                    "Failed to publish message"
                );
                Err(e.into())
            }
        }
    }
}

impl std::fmt::Debug for MessagePublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagePublisher").finish_non_exhaustive()
    }
}
