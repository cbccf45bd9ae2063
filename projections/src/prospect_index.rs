//! Prospect search index projection.
//!
//! Maps each [`ProspectSignedUpEvent`] to a flat [`ProspectDocument`] and
//! upserts it into the [`PROSPECTS_INDEX`] keyed by prospect identifier.
//!
//! ```text
//! ProspectSignedUpEvent                 ProspectDocument (key = prospectId)
//! ├─ SignedUpAt ─────────────────────►  signUpDate
//! └─ Prospect
//!    ├─ ProspectId ──────────────────►  prospectId
//!    ├─ FirstName + LastName ────────►  fullName
//!    ├─ CompanyName ─────────────────►  companyName
//!    ├─ EmailAddress ────────────────►  emailAddress
//!    ├─ Role { RoleCode, RoleName } ─►  roleCode, roleName
//!    └─ Country { Code, Name } ──────►  countryCode, countryName
//! ```

use chrono::{DateTime, Utc};
use product_launch_core::events::ProspectSignedUpEvent;
use product_launch_core::projection::{Projection, Result};
use product_launch_core::search_index::SearchIndex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name of the search index holding prospect documents.
pub const PROSPECTS_INDEX: &str = "prospects";

/// Denormalized prospect record stored in the search index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProspectDocument {
    /// Document key
    pub prospect_id: String,
    /// First and last name
    pub full_name: String,
    /// Employer
    pub company_name: String,
    /// Contact email
    pub email_address: String,
    /// Role code
    pub role_code: String,
    /// Role display name
    pub role_name: String,
    /// Country code
    pub country_code: String,
    /// Country display name
    pub country_name: String,
    /// When the prospect signed up
    pub sign_up_date: DateTime<Utc>,
}

impl From<&ProspectSignedUpEvent> for ProspectDocument {
    fn from(event: &ProspectSignedUpEvent) -> Self {
        let prospect = &event.prospect;
        Self {
            prospect_id: prospect.prospect_id.to_string(),
            full_name: prospect.full_name(),
            company_name: prospect.company_name.clone(),
            email_address: prospect.email_address.clone(),
            role_code: prospect.role.role_code.clone(),
            role_name: prospect.role.role_name.clone(),
            country_code: prospect.country.country_code.clone(),
            country_name: prospect.country.country_name.clone(),
            sign_up_date: event.signed_up_at,
        }
    }
}

/// Writes one [`ProspectDocument`] per sign-up event.
#[derive(Clone)]
pub struct ProspectIndexProjection {
    index: Arc<dyn SearchIndex>,
}

impl ProspectIndexProjection {
    /// Create a projection writing into `index`.
    #[must_use]
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self { index }
    }
}

impl Projection for ProspectIndexProjection {
    type Event = ProspectSignedUpEvent;

    fn name(&self) -> &str {
        "prospect_index"
    }

    async fn apply_event(&self, event: &Self::Event) -> Result<()> {
        let document = ProspectDocument::from(event);
        let body = serde_json::to_vec(&document)?;

        self.index
            .upsert(PROSPECTS_INDEX, &document.prospect_id, &body)
            .await?;

        tracing::info!(
            index = PROSPECTS_INDEX,
            prospect_id = %document.prospect_id,
            "Prospect indexed"
        );
        Ok(())
    }

    fn failure_context(&self, event: &Self::Event) -> Option<String> {
        Some(format!("email address {}", event.prospect.email_address))
    }

    fn undecodable_context(&self, payload: &[u8]) -> Option<String> {
        let value: serde_json::Value = serde_json::from_slice(payload).ok()?;
        let email = value.pointer("/Prospect/EmailAddress")?.as_str()?;
        Some(format!("email address {email}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use product_launch_core::prospect::{Country, Prospect, ProspectId, Role};
    use product_launch_testing::{InMemorySearchIndex, test_clock};
    use product_launch_core::environment::Clock;

    fn event(id: u64, email: &str) -> ProspectSignedUpEvent {
        ProspectSignedUpEvent::new(
            Prospect {
                prospect_id: ProspectId::from(id),
                first_name: "A".to_string(),
                last_name: "Prospect".to_string(),
                company_name: "Docker, Inc.".to_string(),
                email_address: email.to_string(),
                role: Role::new("DM", "Decision Maker"),
                country: Country::new("GBR", "United Kingdom"),
            },
            test_clock().now(),
        )
    }

    #[test]
    fn document_flattens_the_prospect() {
        let event = event(42, "a@b.com");
        let document = ProspectDocument::from(&event);

        assert_eq!(document.prospect_id, "42");
        assert_eq!(document.full_name, "A Prospect");
        assert_eq!(document.company_name, "Docker, Inc.");
        assert_eq!(document.email_address, "a@b.com");
        assert_eq!(document.role_name, "Decision Maker");
        assert_eq!(document.country_code, "GBR");
        assert_eq!(document.sign_up_date, event.signed_up_at);
    }

    #[test]
    fn document_serializes_in_camel_case() {
        let json = serde_json::to_value(ProspectDocument::from(&event(42, "a@b.com"))).unwrap();
        assert_eq!(json["emailAddress"], "a@b.com");
        assert_eq!(json["signUpDate"], "2025-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn apply_event_upserts_by_prospect_id() {
        let index = Arc::new(InMemorySearchIndex::new());
        let projection = ProspectIndexProjection::new(index.clone());

        projection.apply_event(&event(42, "a@b.com")).await.unwrap();

        let stored = index.get_json(PROSPECTS_INDEX, "42").unwrap();
        assert_eq!(stored["fullName"], "A Prospect");
    }

    #[tokio::test]
    async fn reapplying_overwrites_instead_of_duplicating() {
        let index = Arc::new(InMemorySearchIndex::new());
        let projection = ProspectIndexProjection::new(index.clone());

        projection.apply_event(&event(42, "old@b.com")).await.unwrap();
        projection.apply_event(&event(42, "a@b.com")).await.unwrap();

        assert_eq!(index.document_count(PROSPECTS_INDEX), 1);
        let stored = index.get_json(PROSPECTS_INDEX, "42").unwrap();
        assert_eq!(stored["emailAddress"], "a@b.com");
    }

    #[test]
    fn failure_context_names_the_email_address() {
        let projection = ProspectIndexProjection::new(Arc::new(InMemorySearchIndex::new()));
        assert_eq!(
            projection.failure_context(&event(1, "x@y.com")).as_deref(),
            Some("email address x@y.com")
        );
    }

    #[test]
    fn undecodable_payload_still_yields_the_email_address() {
        let projection = ProspectIndexProjection::new(Arc::new(InMemorySearchIndex::new()));

        // Prospect is missing every field except the email address.
        let partial = br#"{"CorrelationId":"c-1","Prospect":{"EmailAddress":"x@y.com"}}"#;
        assert!(product_launch_core::codec::decode::<ProspectSignedUpEvent>(partial).is_err());
        assert_eq!(
            projection.undecodable_context(partial).as_deref(),
            Some("email address x@y.com")
        );

        assert_eq!(projection.undecodable_context(b"\xff not json"), None);
        assert_eq!(projection.undecodable_context(br#"{"Prospect":{}}"#), None);
    }
}
