//! Producer side of the product launch pipeline.
//!
//! A prospect fills in the sign-up form; [`SignUpService`] resolves the role
//! and country codes against [`ReferenceData`], snapshots the prospect into a
//! `ProspectSignedUpEvent` and publishes it. A failed publish fails the sign-up.
//!
//! # Example
//!
//! ```ignore
//! let service = SignUpService::new(
//!     Arc::new(ReferenceData::seeded()),
//!     Arc::new(SystemClock),
//!     MessagePublisher::new(Arc::new(NatsEventBus::new(&config.message_queue_url))),
//! );
//!
//! let event = service.sign_up(form).await?;
//! ```

pub mod reference;
pub mod service;

pub use reference::ReferenceData;
pub use service::{SignUpError, SignUpForm, SignUpService};
