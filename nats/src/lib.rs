//! NATS event bus implementation for the product launch pipeline.
//!
//! This crate provides a NATS-backed event bus that implements the
//! [`EventBus`] trait from `product-launch-core`, using `async-nats`.
//!
//! # Delivery Semantics
//!
//! **At-most-once delivery** (core NATS, no JetStream):
//! - A payload published while no subscriber is connected is dropped
//! - No acknowledgements, no redelivery
//! - Every active subscriber of a subject gets its own copy
//!
//! # Connection Scoping
//!
//! Every `publish` opens its own connection, publishes, flushes and drops the
//! client, on success and on failure alike. `subscribe` opens a connection that
//! lives inside the returned stream; dropping the stream closes it.
//!
//! # Example
//!
//! ```no_run
//! use product_launch_nats::NatsEventBus;
//! use product_launch_core::event_bus::EventBus;
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let event_bus = NatsEventBus::new("nats://localhost:4222");
//!
//! let mut stream = event_bus.subscribe("events.prospect.signedup").await?;
//! event_bus.publish("events.prospect.signedup", b"{}").await?;
//!
//! while let Some(result) = stream.next().await {
//!     match result {
//!         Ok(payload) => println!("Received {} bytes", payload.len()),
//!         Err(e) => eprintln!("Error: {e}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use futures::StreamExt;
use product_launch_core::event_bus::{EventBus, EventBusError, PayloadStream, validate_subject};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Default broker URL.
pub const DEFAULT_URL: &str = "nats://localhost:4222";

/// Default client name reported to the server.
pub const DEFAULT_CONNECTION_NAME: &str = "product-launch";

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// NATS event bus.
///
/// Holds only connection settings. No connection is kept between calls.
///
/// # Example
///
/// ```no_run
/// use product_launch_nats::NatsEventBus;
/// use std::time::Duration;
///
/// let event_bus = NatsEventBus::builder()
///     .url("nats://message-queue:4222")
///     .connection_name("index-prospect")
///     .connect_timeout(Duration::from_secs(2))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct NatsEventBus {
    url: String,
    connection_name: String,
    connect_timeout: Duration,
}

impl NatsEventBus {
    /// Create an event bus for `url` with default settings.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self::builder().url(url).build()
    }

    /// Create a new builder for configuring the event bus.
    #[must_use]
    pub fn builder() -> NatsEventBusBuilder {
        NatsEventBusBuilder::default()
    }

    /// Broker URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn connect(&self) -> Result<async_nats::Client, EventBusError> {
        async_nats::ConnectOptions::new()
            .name(&self.connection_name)
            .connection_timeout(self.connect_timeout)
            .connect(self.url.as_str())
            .await
            .map_err(|e| {
                tracing::error!(url = %self.url, error = %e, "Failed to connect to message queue");
                EventBusError::ConnectionFailed(format!("{}: {e}", self.url))
            })
    }
}

/// Builder for configuring a [`NatsEventBus`].
#[derive(Debug, Default)]
pub struct NatsEventBusBuilder {
    url: Option<String>,
    connection_name: Option<String>,
    connect_timeout: Option<Duration>,
}

impl NatsEventBusBuilder {
    /// Set the broker URL.
    ///
    /// Default: `nats://localhost:4222`
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the client name reported to the server.
    ///
    /// Default: `product-launch`
    #[must_use]
    pub fn connection_name(mut self, name: impl Into<String>) -> Self {
        self.connection_name = Some(name.into());
        self
    }

    /// Set the connect timeout.
    ///
    /// Default: 5 seconds
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Build the [`NatsEventBus`]. Does not connect.
    #[must_use]
    pub fn build(self) -> NatsEventBus {
        let bus = NatsEventBus {
            url: self.url.unwrap_or_else(|| DEFAULT_URL.to_string()),
            connection_name: self
                .connection_name
                .unwrap_or_else(|| DEFAULT_CONNECTION_NAME.to_string()),
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
        };

        tracing::debug!(
            url = %bus.url,
            connection_name = %bus.connection_name,
            connect_timeout = ?bus.connect_timeout,
            "NatsEventBus configured"
        );

        bus
    }
}

impl EventBus for NatsEventBus {
    fn publish(
        &self,
        subject: &str,
        payload: &[u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let subject = subject.to_string();
        let payload = payload.to_vec();

        Box::pin(async move {
            validate_subject(&subject)?;

            // Client is dropped at the end of this block, closing the connection.
            let client = self.connect().await?;

            let bytes = payload.len();
            client
                .publish(subject.clone(), payload.into())
                .await
                .map_err(|e| EventBusError::PublishFailed {
                    subject: subject.clone(),
                    reason: e.to_string(),
                })?;

            client
                .flush()
                .await
                .map_err(|e| EventBusError::PublishFailed {
                    subject: subject.clone(),
                    reason: format!("flush failed: {e}"),
                })?;

            tracing::debug!(subject = %subject, bytes, "Payload published");
            Ok(())
        })
    }

    fn subscribe(
        &self,
        subject: &str,
    ) -> Pin<Box<dyn Future<Output = Result<PayloadStream, EventBusError>> + Send + '_>> {
        let subject = subject.to_string();

        Box::pin(async move {
            validate_subject(&subject)?;

            let client = self.connect().await?;

            let mut subscriber = client.subscribe(subject.clone()).await.map_err(|e| {
                EventBusError::SubscriptionFailed {
                    subject: subject.clone(),
                    reason: e.to_string(),
                }
            })?;

            // Make sure the server has registered the interest before returning.
            client
                .flush()
                .await
                .map_err(|e| EventBusError::SubscriptionFailed {
                    subject: subject.clone(),
                    reason: format!("flush failed: {e}"),
                })?;

            tracing::info!(subject = %subject, url = %self.url, "Subscribed to subject");

            let stream = async_stream::stream! {
                // Keep the connection alive for as long as the stream is.
                let _client = client;
                while let Some(message) = subscriber.next().await {
                    tracing::trace!(
                        subject = %message.subject,
                        bytes = message.payload.len(),
                        "Received payload"
                    );
                    yield Ok(message.payload.to_vec());
                }
                tracing::debug!(subject = %subject, "Subscription closed");
            };

            Ok(Box::pin(stream) as PayloadStream)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn nats_event_bus_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<NatsEventBus>();
        assert_sync::<NatsEventBus>();
    }

    #[test]
    fn builder_defaults() {
        let bus = NatsEventBus::builder().build();
        assert_eq!(bus.url(), DEFAULT_URL);
        assert_eq!(bus.connection_name, DEFAULT_CONNECTION_NAME);
        assert_eq!(bus.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }

    #[tokio::test]
    async fn invalid_subject_is_rejected_before_connecting() {
        // Nothing listens on port 1, so reaching the network would yield ConnectionFailed.
        let bus = NatsEventBus::new("nats://127.0.0.1:1");

        let result = bus.publish("events.*", b"{}").await;
        assert!(matches!(result, Err(EventBusError::InvalidSubject(_))));

        let result = bus.subscribe("").await;
        assert!(matches!(result, Err(EventBusError::InvalidSubject(_))));
    }

    #[tokio::test]
    async fn unreachable_broker_is_a_connection_failure() {
        let bus = NatsEventBus::builder()
            .url("nats://127.0.0.1:1")
            .connect_timeout(Duration::from_millis(500))
            .build();

        let result = bus.publish("events.prospect.signedup", b"{}").await;
        assert!(matches!(result, Err(EventBusError::ConnectionFailed(_))));
    }
}
