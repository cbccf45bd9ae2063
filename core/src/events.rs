//! Concrete event types.

use crate::message::{Message, new_correlation_id};
use crate::prospect::Prospect;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A prospect completed the sign-up form.
///
/// Published by the sign-up service; consumed by the prospect indexer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProspectSignedUpEvent {
    /// Correlation ID, logged as the event ID
    pub correlation_id: String,
    /// When the prospect signed up
    pub signed_up_at: DateTime<Utc>,
    /// Snapshot of the prospect at sign-up time
    pub prospect: Prospect,
}

impl ProspectSignedUpEvent {
    /// Subject for sign-up events.
    pub const MESSAGE_SUBJECT: &'static str = "events.prospect.signedup";

    /// Create an event with a fresh correlation ID.
    #[must_use]
    pub fn new(prospect: Prospect, signed_up_at: DateTime<Utc>) -> Self {
        Self {
            correlation_id: new_correlation_id(),
            signed_up_at,
            prospect,
        }
    }
}

impl Message for ProspectSignedUpEvent {
    const SUBJECT: &'static str = Self::MESSAGE_SUBJECT;

    fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}
