//! Message codec: typed message ↔ wire bytes.
//!
//! # Design
//!
//! Messages are serialized field-for-field as JSON text and carried as UTF-8
//! bytes. The encoding is fixed for the whole system ([`TEXT_ENCODING`]).
//!
//! The wire format carries no type tag. Decoding requires the caller to name
//! the expected message type:
//!
//! ```
//! use product_launch_core::codec::{self, CodecError};
//! use product_launch_core::events::ProspectSignedUpEvent;
//!
//! let result = codec::decode::<ProspectSignedUpEvent>(b"not json");
//! assert!(matches!(result, Err(CodecError::Deserialization { .. })));
//! ```
//!
//! Keeping the codec apart from the bus lets transports stay bytes-only.

use crate::message::Message;
use thiserror::Error;

/// Text encoding used for every payload on the bus.
pub const TEXT_ENCODING: &str = "utf-8";

/// Error types for codec operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to serialize a message to bytes.
    #[error("Failed to serialize {message_type}: {reason}")]
    Serialization {
        /// Rust type name of the message
        message_type: &'static str,
        /// Underlying serializer error
        reason: String,
    },

    /// Payload is not valid JSON text or does not match the expected message shape.
    #[error("Failed to deserialize {message_type}: {reason}")]
    Deserialization {
        /// Rust type name of the expected message
        message_type: &'static str,
        /// Underlying deserializer error
        reason: String,
    },
}

/// Encode a message as UTF-8 JSON bytes.
///
/// # Errors
///
/// Returns [`CodecError::Serialization`] if the message cannot be represented
/// as JSON. This does not happen for the message types in this crate.
pub fn encode<M: Message>(message: &M) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(message).map_err(|e| CodecError::Serialization {
        message_type: std::any::type_name::<M>(),
        reason: e.to_string(),
    })
}

/// Decode UTF-8 JSON bytes as message type `M`.
///
/// # Errors
///
/// Returns [`CodecError::Deserialization`] if:
/// - The bytes are not valid UTF-8
/// - The text is not valid JSON
/// - The JSON does not have the shape of `M` (missing or mistyped fields)
pub fn decode<M: Message>(payload: &[u8]) -> Result<M, CodecError> {
    serde_json::from_slice(payload).map_err(|e| CodecError::Deserialization {
        message_type: std::any::type_name::<M>(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::events::ProspectSignedUpEvent;
    use crate::prospect::{Country, Prospect, ProspectId, Role};
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct PingEvent {
        correlation_id: String,
        sequence: u32,
    }

    impl Message for PingEvent {
        const SUBJECT: &'static str = "events.test.ping";

        fn correlation_id(&self) -> &str {
            &self.correlation_id
        }
    }

    fn signed_up(id: u64, email: &str) -> ProspectSignedUpEvent {
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
            Utc.with_ymd_and_hms(2017, 4, 18, 9, 30, 0).unwrap(),
        )
    }

    #[test]
    fn encoded_payload_is_utf8_json() {
        let bytes = encode(&signed_up(42, "a@b.com")).unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();

        assert!(text.starts_with('{'));
        assert!(text.contains("\"EmailAddress\":\"a@b.com\""));
        assert!(!text.contains("events.prospect.signedup"));
    }

    #[test]
    fn round_trip_preserves_every_field() {
        let event = signed_up(42, "a@b.com");
        let decoded: ProspectSignedUpEvent = decode(&encode(&event).unwrap()).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn invalid_utf8_is_a_deserialization_error() {
        let result = decode::<ProspectSignedUpEvent>(&[0xff, 0xfe, 0x00]);
        assert!(matches!(result, Err(CodecError::Deserialization { .. })));
    }

    #[test]
    fn wrong_message_shape_is_a_deserialization_error() {
        let ping = encode(&PingEvent {
            correlation_id: "c-1".to_string(),
            sequence: 1,
        })
        .unwrap();

        let err = decode::<ProspectSignedUpEvent>(&ping).unwrap_err();
        assert!(err.to_string().contains("ProspectSignedUpEvent"));
    }

    #[test]
    fn numeric_prospect_id_decodes_to_the_same_key() {
        let payload = br#"{
            "CorrelationId": "c-1",
            "SignedUpAt": "2017-04-18T09:30:00Z",
            "Prospect": {
                "ProspectId": 42,
                "FirstName": "A",
                "LastName": "Prospect",
                "CompanyName": "Docker, Inc.",
                "EmailAddress": "a@b.com",
                "Role": { "RoleCode": "DM", "RoleName": "Decision Maker" },
                "Country": { "CountryCode": "GBR", "CountryName": "United Kingdom" }
            }
        }"#;

        let event: ProspectSignedUpEvent = decode(payload).unwrap();

        assert_eq!(event.prospect.prospect_id, ProspectId::from("42"));
        assert_eq!(event.prospect.email_address, "a@b.com");
        let reencoded = String::from_utf8(encode(&event).unwrap()).unwrap();
        assert!(reencoded.contains(r#""ProspectId":"42""#));
    }

    #[test]
    fn empty_payload_is_a_deserialization_error() {
        assert!(decode::<PingEvent>(b"").is_err());
    }

    proptest! {
        #[test]
        fn prospect_events_round_trip(
            id in any::<u64>(),
            first in "\\PC{0,24}",
            last in "\\PC{0,24}",
            email in "[a-z]{1,10}@[a-z]{1,10}\\.com",
            secs in 0i64..4_102_444_800,
        ) {
            let mut event = signed_up(id, &email);
            event.prospect.first_name = first;
            event.prospect.last_name = last;
            event.signed_up_at = Utc.timestamp_opt(secs, 0).unwrap();

            let decoded: ProspectSignedUpEvent = decode(&encode(&event).unwrap()).unwrap();
            prop_assert_eq!(decoded, event);
        }

        #[test]
        fn ping_events_round_trip(sequence in any::<u32>(), correlation_id in "[a-f0-9-]{1,36}") {
            let event = PingEvent { correlation_id, sequence };
            let decoded: PingEvent = decode(&encode(&event).unwrap()).unwrap();
            prop_assert_eq!(decoded, event);
        }
    }
}
