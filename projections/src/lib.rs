//! Read side of the product launch pipeline.
//!
//! # Overview
//!
//! - [`ProspectIndexProjection`]: maps sign-up events to prospect documents
//! - [`IndexingConsumer`]: drives any projection from a bus subscription
//!
//! # Wiring
//!
//! ```ignore
//! use product_launch_projections::*;
//!
//! let index = Arc::new(ElasticsearchIndex::new(&config.elasticsearch_url)?);
//! index.create_index(PROSPECTS_INDEX).await?;
//!
//! let bus = Arc::new(NatsEventBus::new(&config.message_queue_url));
//! let (mut consumer, shutdown) =
//!     IndexingConsumer::new(ProspectIndexProjection::new(index), bus);
//!
//! consumer.run(ProspectSignedUpEvent::SUBJECT).await?;
//! ```

pub mod consumer;
pub mod prospect_index;

// Re-export main types for convenience
pub use consumer::{ConsumerError, ConsumerState, ConsumerStats, IndexingConsumer, ShutdownSignal};
pub use prospect_index::{PROSPECTS_INDEX, ProspectDocument, ProspectIndexProjection};
