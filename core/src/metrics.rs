//! Metric names and recorders for the pipeline.
//!
//! Recording goes through the `metrics` facade; without an installed recorder
//! every call is a no-op. The consumer binary installs a Prometheus exporter
//! and calls [`describe_metrics`] once at startup.

use metrics::{counter, describe_counter};

/// Messages published, labelled by subject.
pub const MESSAGES_PUBLISHED: &str = "event_bus_messages_published_total";

/// Publish failures, labelled by subject.
pub const PUBLISH_ERRORS: &str = "event_bus_publish_errors_total";

/// Messages handled by the indexing consumer, labelled by projection and outcome.
pub const INDEX_MESSAGES: &str = "prospect_index_messages_total";

/// Register all metric descriptions.
pub fn describe_metrics() {
    describe_counter!(
        MESSAGES_PUBLISHED,
        "Total number of messages published to the event bus"
    );
    describe_counter!(PUBLISH_ERRORS, "Total number of publish errors");
    describe_counter!(
        INDEX_MESSAGES,
        "Total number of messages handled by the indexing consumer, by outcome"
    );
}

/// Event bus metrics recorder.
pub struct EventBusMetrics;

impl EventBusMetrics {
    /// Record a message publish.
    pub fn record_publish(subject: &'static str) {
        counter!(MESSAGES_PUBLISHED, "subject" => subject).increment(1);
    }

    /// Record a publish error.
    pub fn record_publish_error(subject: &'static str) {
        counter!(PUBLISH_ERRORS, "subject" => subject).increment(1);
    }
}

/// Outcome of one message handled by the indexing consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// Decoded and written to the index
    Indexed,
    /// Payload could not be decoded
    DecodeFailed,
    /// Index write failed
    IndexFailed,
    /// Transport error on the subscription stream
    TransportError,
}

impl ConsumeOutcome {
    /// Label value used for the `outcome` label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Indexed => "indexed",
            Self::DecodeFailed => "decode_failed",
            Self::IndexFailed => "index_failed",
            Self::TransportError => "transport_error",
        }
    }
}

/// Indexing consumer metrics recorder.
pub struct ConsumerMetrics;

impl ConsumerMetrics {
    /// Record one handled message.
    pub fn record(projection: &str, outcome: ConsumeOutcome) {
        counter!(
            INDEX_MESSAGES,
            "projection" => projection.to_string(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
    }
}
