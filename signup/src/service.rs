//! Sign-up service: form → snapshot → published event.

use crate::reference::ReferenceData;
use product_launch_core::environment::Clock;
use product_launch_core::events::ProspectSignedUpEvent;
use product_launch_core::message::Message;
use product_launch_core::prospect::{Prospect, ProspectId};
use product_launch_core::publisher::{MessagePublisher, PublishError};
use std::sync::Arc;
use thiserror::Error;

/// Errors from [`SignUpService::sign_up`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignUpError {
    /// Role code not in the reference data
    #[error("Unknown role code: {0}")]
    UnknownRole(String),

    /// Country code not in the reference data
    #[error("Unknown country code: {0}")]
    UnknownCountry(String),

    /// A required field is missing or malformed
    #[error("Invalid sign-up details: {0}")]
    InvalidDetails(String),

    /// The event could not be published; the sign-up did not happen
    #[error("Failed to publish sign-up: {0}")]
    Publish(#[from] PublishError),
}

/// Details entered by a prospect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpForm {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Employer
    pub company_name: String,
    /// Contact email
    pub email_address: String,
    /// Selected role code
    pub role_code: String,
    /// Selected country code
    pub country_code: String,
    /// Identifier assigned upstream; a UUID is generated when absent
    pub prospect_id: Option<ProspectId>,
}

impl SignUpForm {
    fn validate(&self) -> Result<(), SignUpError> {
        for (field, value) in [
            ("first name", &self.first_name),
            ("last name", &self.last_name),
            ("email address", &self.email_address),
        ] {
            if value.trim().is_empty() {
                return Err(SignUpError::InvalidDetails(format!("{field} is required")));
            }
        }

        match self.email_address.trim().split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
            _ => Err(SignUpError::InvalidDetails(format!(
                "'{}' is not an email address",
                self.email_address
            ))),
        }
    }
}

/// Producer side of the pipeline.
#[derive(Clone)]
pub struct SignUpService {
    reference: Arc<ReferenceData>,
    clock: Arc<dyn Clock>,
    publisher: MessagePublisher,
}

impl SignUpService {
    /// Create a sign-up service.
    #[must_use]
    pub fn new(
        reference: Arc<ReferenceData>,
        clock: Arc<dyn Clock>,
        publisher: MessagePublisher,
    ) -> Self {
        Self {
            reference,
            clock,
            publisher,
        }
    }

    /// Validate the form, build the prospect snapshot and publish a
    /// [`ProspectSignedUpEvent`].
    ///
    /// Returns the published event.
    ///
    /// # Errors
    ///
    /// - [`SignUpError::InvalidDetails`] if a required field is blank or the email is malformed
    /// - [`SignUpError::UnknownRole`] / [`SignUpError::UnknownCountry`] for unknown codes
    /// - [`SignUpError::Publish`] if the bus is unreachable or rejects the message
    ///
    /// Nothing is published when validation fails.
    pub async fn sign_up(&self, form: SignUpForm) -> Result<ProspectSignedUpEvent, SignUpError> {
        form.validate()?;

        let role = self
            .reference
            .role(&form.role_code)
            .cloned()
            .ok_or_else(|| SignUpError::UnknownRole(form.role_code.clone()))?;
        let country = self
            .reference
            .country(&form.country_code)
            .cloned()
            .ok_or_else(|| SignUpError::UnknownCountry(form.country_code.clone()))?;

        let prospect = Prospect {
            prospect_id: form
                .prospect_id
                .unwrap_or_else(|| ProspectId::new(uuid::Uuid::new_v4().to_string())),
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
            company_name: form.company_name.trim().to_string(),
            email_address: form.email_address.trim().to_string(),
            role,
            country,
        };

        let event = ProspectSignedUpEvent::new(prospect, self.clock.now());
        self.publisher.publish(&event).await?;

        tracing::info!(
            correlation_id = %event.correlation_id(),
            prospect_id = %event.prospect.prospect_id,
            "Prospect signed up"
        );
        Ok(event)
    }
}

impl std::fmt::Debug for SignUpService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpService")
            .field("reference", &self.reference)
            .finish_non_exhaustive()
    }
}
