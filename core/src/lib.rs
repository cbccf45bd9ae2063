//! # Product Launch Core
//!
//! Core traits and types for the prospect sign-up pipeline.
//!
//! A producer emits a typed domain event onto a subject-addressed message bus.
//! A consumer receives the payload, decodes it, and projects it into a search
//! index as a denormalized document.
//!
//! ## Core Concepts
//!
//! - **Message**: A typed event that fixes its own bus subject ([`message::Message`])
//! - **Codec**: JSON text, UTF-8 bytes, no type tag on the wire ([`codec`])
//! - **Event Bus**: Subject-addressed publish/subscribe ([`event_bus::EventBus`])
//! - **Search Index**: Upsert-by-key document store ([`search_index::SearchIndex`])
//! - **Projection**: Maps a decoded event onto the index ([`projection::Projection`])
//!
//! ## Data Flow
//!
//! ```text
//! ┌──────────┐  encode   ┌───────────┐  publish(subject, bytes)  ┌─────────┐
//! │ Producer │ ────────► │   Codec   │ ────────────────────────► │   Bus   │
//! └──────────┘           └───────────┘                           └────┬────┘
//!                                                                     │ subscribe(subject)
//!                                                                     ▼
//! ┌──────────────┐  upsert  ┌────────────┐  decode  ┌───────────────────┐
//! │ Search Index │ ◄─────── │ Projection │ ◄─────── │ Indexing Consumer │
//! └──────────────┘          └────────────┘          └───────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use product_launch_core::codec;
//! use product_launch_core::events::ProspectSignedUpEvent;
//! use product_launch_core::message::Message;
//! use product_launch_core::prospect::{Country, Prospect, Role};
//! use chrono::Utc;
//!
//! let prospect = Prospect {
//!     prospect_id: 42_u64.into(),
//!     first_name: "Ada".to_string(),
//!     last_name: "Lovelace".to_string(),
//!     company_name: "Analytical Engines".to_string(),
//!     email_address: "a@b.com".to_string(),
//!     role: Role::new("EN", "Engineer"),
//!     country: Country::new("GBR", "United Kingdom"),
//! };
//!
//! let event = ProspectSignedUpEvent::new(prospect, Utc::now());
//! assert_eq!(event.subject(), "events.prospect.signedup");
//!
//! let bytes = codec::encode(&event).unwrap();
//! let decoded: ProspectSignedUpEvent = codec::decode(&bytes).unwrap();
//! assert_eq!(decoded, event);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

pub mod codec;
pub mod config;
pub mod event_bus;
pub mod events;
pub mod message;
pub mod metrics;
pub mod projection;
pub mod prospect;
pub mod publisher;
pub mod search_index;

/// Environment module - injected dependencies
///
/// All time-dependent code receives a [`Clock`](environment::Clock) rather than
/// calling `Utc::now()` directly, so tests can pin the clock.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use product_launch_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let _now = clock.now();
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::environment::{Clock, SystemClock};

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
