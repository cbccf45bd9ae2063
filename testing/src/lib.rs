//! # Product Launch Testing
//!
//! Testing utilities for the product launch pipeline.
//!
//! This crate provides:
//! - [`InMemoryEventBus`]: subject-addressed bus with connection counters and fault injection
//! - [`InMemorySearchIndex`]: HashMap-backed search index with fault injection
//! - [`FixedClock`] / [`test_clock`]: deterministic time
//! - Fixtures and proptest strategies for prospects and sign-up events
//!
//! ## Example
//!
//! ```ignore
//! use product_launch_testing::*;
//!
//! #[tokio::test]
//! async fn indexes_sign_ups() {
//!     let bus = Arc::new(InMemoryEventBus::new());
//!     let index = Arc::new(InMemorySearchIndex::new());
//!     let (mut consumer, shutdown) =
//!         IndexingConsumer::new(ProspectIndexProjection::new(index.clone()), bus.clone());
//!     // ...
//! }
//! ```

use chrono::{DateTime, Utc};
use product_launch_core::environment::Clock;

pub mod event_bus;
pub mod search_index;

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use product_launch_testing::mocks::FixedClock;
    /// use product_launch_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Fixtures and test setup helpers.
pub mod helpers {
    use super::{Clock, mocks::test_clock};
    use product_launch_core::events::ProspectSignedUpEvent;
    use product_launch_core::prospect::{Country, Prospect, ProspectId, Role};

    /// A prospect with the given id and email; other fields are fixed.
    #[must_use]
    pub fn sample_prospect(id: u64, email: &str) -> Prospect {
        Prospect {
            prospect_id: ProspectId::from(id),
            first_name: "A".to_string(),
            last_name: "Prospect".to_string(),
            company_name: "Docker, Inc.".to_string(),
            email_address: email.to_string(),
            role: Role::new("DM", "Decision Maker"),
            country: Country::new("GBR", "United Kingdom"),
        }
    }

    /// A sign-up event for [`sample_prospect`] at [`test_clock`] time.
    #[must_use]
    pub fn signed_up_event(id: u64, email: &str) -> ProspectSignedUpEvent {
        ProspectSignedUpEvent::new(sample_prospect(id, email), test_clock().now())
    }

    /// Route `tracing` output to the test harness. Safe to call more than once.
    ///
    /// Honours `RUST_LOG`; defaults to `debug` for the pipeline crates.
    pub fn init_test_tracing() {
        use tracing_subscriber::EnvFilter;

        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "product_launch=debug".into()),
            )
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use chrono::{TimeZone, Utc};
    use product_launch_core::events::ProspectSignedUpEvent;
    use product_launch_core::prospect::{Country, Prospect, ProspectId, Role};
    use proptest::prelude::*;

    /// Any prospect identifier, integer-like or free-form.
    pub fn arb_prospect_id() -> impl Strategy<Value = ProspectId> {
        prop_oneof![
            any::<u64>().prop_map(ProspectId::from),
            "[A-Za-z0-9-]{1,36}".prop_map(ProspectId::from),
        ]
    }

    /// Any prospect with printable names and a plausible email.
    pub fn arb_prospect() -> impl Strategy<Value = Prospect> {
        (
            arb_prospect_id(),
            "\\PC{1,32}",
            "\\PC{1,32}",
            "\\PC{0,48}",
            "[a-z0-9.]{1,16}@[a-z]{1,12}\\.(com|org|se)",
            prop_oneof![
                Just(Role::new("DA", "Developer Advocate")),
                Just(Role::new("DM", "Decision Maker")),
                Just(Role::new("AC", "Architect")),
                Just(Role::new("EN", "Engineer")),
                Just(Role::new("OP", "IT Ops")),
            ],
            prop_oneof![
                Just(Country::new("GBR", "United Kingdom")),
                Just(Country::new("USA", "United States")),
                Just(Country::new("SWE", "Sweden")),
            ],
        )
            .prop_map(
                |(prospect_id, first_name, last_name, company_name, email_address, role, country)| {
                    Prospect {
                        prospect_id,
                        first_name,
                        last_name,
                        company_name,
                        email_address,
                        role,
                        country,
                    }
                },
            )
    }

    /// Any sign-up event between 1970 and 2100, second precision.
    pub fn arb_signed_up_event() -> impl Strategy<Value = ProspectSignedUpEvent> {
        (arb_prospect(), 0i64..4_102_444_800).prop_filter_map(
            "timestamp out of range",
            |(prospect, secs)| {
                Utc.timestamp_opt(secs, 0)
                    .single()
                    .map(|at| ProspectSignedUpEvent::new(prospect, at))
            },
        )
    }
}

// Re-export commonly used items
pub use event_bus::InMemoryEventBus;
pub use helpers::{init_test_tracing, sample_prospect, signed_up_event};
pub use mocks::{FixedClock, test_clock};
pub use search_index::InMemorySearchIndex;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn fixtures_use_the_test_clock() {
        let event = signed_up_event(42, "a@b.com");
        assert_eq!(event.signed_up_at, test_clock().now());
        assert_eq!(event.prospect.prospect_id.as_str(), "42");
    }
}
