//! `IndexingConsumer`: subscribe, decode, project, repeat.
//!
//! # Overview
//!
//! The consumer owns one subscription and processes one payload at a time:
//!
//! ```text
//! ┌─────────────┐
//! │  Event Bus  │
//! └──────┬──────┘
//!        │ payload bytes
//!        ▼
//! ┌─────────────────┐  decode   ┌────────────┐  upsert  ┌──────────────┐
//! │ IndexingConsumer│ ────────► │ Projection │ ───────► │ Search Index │
//! └─────────────────┘           └────────────┘          └──────────────┘
//! ```
//!
//! # Failure Policy
//!
//! A payload that fails to decode, or whose index write fails, is logged and
//! dropped. It is not retried and not forwarded anywhere: delivery is
//! at-most-once, and a search index outage loses every message that arrives
//! during it. A single bad message never stops the loop.
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──► Subscribed ⇄ Processing
//!              │
//!              ▼
//!          Terminated   (stream ended or shutdown signalled)
//! ```
//!
//! A terminated consumer can `run` again; it resubscribes from scratch. Each
//! shutdown signal stops one run: a signal sent while no run is active stops
//! the next run as soon as it has subscribed.
//!
//! # Example
//!
//! ```ignore
//! let projection = ProspectIndexProjection::new(index);
//! let (mut consumer, shutdown) = IndexingConsumer::new(projection, event_bus);
//!
//! tokio::spawn(async move {
//!     tokio::signal::ctrl_c().await.ok();
//!     shutdown.shutdown();
//! });
//!
//! let stats = consumer.run(ProspectSignedUpEvent::SUBJECT).await?;
//! ```

use futures::StreamExt;
use product_launch_core::codec;
use product_launch_core::event_bus::{EventBus, EventBusError};
use product_launch_core::message::Message;
use product_launch_core::metrics::{ConsumeOutcome, ConsumerMetrics};
use product_launch_core::projection::Projection;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

/// Errors that stop the consumer before it starts processing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsumerError {
    /// Could not subscribe to the subject
    #[error("Failed to subscribe: {0}")]
    Subscribe(#[from] EventBusError),
}

/// Where the consumer is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    /// Created, not yet subscribed
    Idle,
    /// Subscribed and waiting for the next payload
    Subscribed,
    /// Handling one payload
    Processing,
    /// Stream ended or shutdown was signalled
    Terminated,
}

/// Per-run counters returned by [`IndexingConsumer::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    /// Payloads pulled from the stream
    pub received: u64,
    /// Payloads decoded and written to the index
    pub indexed: u64,
    /// Payloads dropped because they did not decode
    pub decode_failures: u64,
    /// Payloads dropped because the projection failed
    pub index_failures: u64,
    /// Errors yielded by the stream itself
    pub transport_errors: u64,
}

/// Stops the current (or next) [`IndexingConsumer::run`].
///
/// Cloning shares the same signal. Dropping every handle never stops a run.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Ask the consumer to stop after the payload in flight, if any.
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }
}

/// Drives a [`Projection`] from a bus subscription.
///
/// # Type Parameters
///
/// - `P`: The projection to apply; its `Event` type decides how payloads decode
pub struct IndexingConsumer<P>
where
    P: Projection,
{
    projection: Arc<P>,
    event_bus: Arc<dyn EventBus>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown: watch::Receiver<bool>,
    state: watch::Sender<ConsumerState>,
}

impl<P> IndexingConsumer<P>
where
    P: Projection,
{
    /// Create a consumer.
    ///
    /// Returns the consumer and its [`ShutdownSignal`].
    #[must_use]
    pub fn new(projection: P, event_bus: Arc<dyn EventBus>) -> (Self, ShutdownSignal) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let shutdown_tx = Arc::new(shutdown_tx);
        let (state, _) = watch::channel(ConsumerState::Idle);

        let consumer = Self {
            projection: Arc::new(projection),
            event_bus,
            shutdown_tx: Arc::clone(&shutdown_tx),
            shutdown: shutdown_rx,
            state,
        };

        (consumer, ShutdownSignal { tx: shutdown_tx })
    }

    /// Watch lifecycle transitions.
    ///
    /// Tests use `wait_for(|s| *s == ConsumerState::Subscribed)` to publish only
    /// once the subscription is live.
    #[must_use]
    pub fn state_watcher(&self) -> watch::Receiver<ConsumerState> {
        self.state.subscribe()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConsumerState {
        *self.state.borrow()
    }

    /// Subscribe to `subject` and process payloads until the stream ends or
    /// shutdown is signalled.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::Subscribe`] if the subscription cannot be
    /// established. Nothing after that point is an error.
    pub async fn run(&mut self, subject: &str) -> Result<ConsumerStats, ConsumerError> {
        let projection_name = self.projection.name().to_string();
        tracing::info!(
            projection = %projection_name,
            subject = %subject,
            "Starting indexing consumer"
        );

        let mut stream = match self.event_bus.subscribe(subject).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(
                    projection = %projection_name,
                    subject = %subject,
                    error = %e,
                    "Failed to subscribe"
                );
                self.state.send_replace(ConsumerState::Terminated);
                return Err(e.into());
            }
        };
        self.state.send_replace(ConsumerState::Subscribed);

        let mut stats = ConsumerStats::default();

        while !*self.shutdown.borrow_and_update() {
            tokio::select! {
                next = stream.next() => {
                    let Some(result) = next else {
                        tracing::info!(projection = %projection_name, "Subscription stream ended");
                        break;
                    };

                    self.state.send_replace(ConsumerState::Processing);
                    let outcome = match result {
                        Ok(payload) => {
                            stats.received += 1;
                            self.handle_payload(&payload).await
                        }
                        Err(e) => {
                            tracing::error!(
                                projection = %projection_name,
                                error = %e,
                                "Error receiving payload from bus"
                            );
                            ConsumeOutcome::TransportError
                        }
                    };

                    match outcome {
                        ConsumeOutcome::Indexed => stats.indexed += 1,
                        ConsumeOutcome::DecodeFailed => stats.decode_failures += 1,
                        ConsumeOutcome::IndexFailed => stats.index_failures += 1,
                        ConsumeOutcome::TransportError => stats.transport_errors += 1,
                    }
                    ConsumerMetrics::record(&projection_name, outcome);
                    self.state.send_replace(ConsumerState::Subscribed);
                }

                // The consumer holds a sender, so this never errors.
                Ok(()) = self.shutdown.changed() => {
                    if *self.shutdown.borrow_and_update() {
                        tracing::info!(projection = %projection_name, "Shutdown signal received");
                        break;
                    }
                }
            }
        }

        // Consume the signal so a later run starts fresh.
        if *self.shutdown.borrow() {
            self.shutdown_tx.send_replace(false);
            self.shutdown.borrow_and_update();
        }
        self.state.send_replace(ConsumerState::Terminated);
        tracing::info!(
            projection = %projection_name,
            received = stats.received,
            indexed = stats.indexed,
            decode_failures = stats.decode_failures,
            index_failures = stats.index_failures,
            transport_errors = stats.transport_errors,
            "Indexing consumer stopped"
        );
        Ok(stats)
    }

    /// Decode and apply one payload. Never fails: every error is logged here.
    async fn handle_payload(&self, payload: &[u8]) -> ConsumeOutcome {
        let projection_name = self.projection.name();

        let event: P::Event = match codec::decode(payload) {
            Ok(event) => event,
            Err(e) => {
                let context = self
                    .projection
                    .undecodable_context(payload)
                    .unwrap_or_default();
                tracing::error!(
                    projection = projection_name,
                    bytes = payload.len(),
                    context = %context,
                    error = %e,
                    "Failed to decode payload, dropping it"
                );
                return ConsumeOutcome::DecodeFailed;
            }
        };

        let correlation_id = event.correlation_id();
        tracing::debug!(
            projection = projection_name,
            correlation_id = %correlation_id,
            "Received event"
        );

        match self.projection.apply_event(&event).await {
            Ok(()) => ConsumeOutcome::Indexed,
            Err(e) => {
                let context = self.projection.failure_context(&event).unwrap_or_default();
                tracing::error!(
                    projection = projection_name,
                    correlation_id = %correlation_id,
                    context = %context,
                    error = %e,
                    "Failed to index event, dropping it"
                );
                ConsumeOutcome::IndexFailed
            }
        }
    }
}
