//! Prospect snapshot value objects.
//!
//! A [`Prospect`] is copied into an event at publish time. It is not a live
//! reference to any stored record: once embedded in an event it never
//! changes.
//!
//! Field names serialize in `PascalCase`, the casing the sign-up web
//! application puts on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque prospect identifier.
///
/// Upstream systems use either integers or strings; both are carried as a
/// string so the index key is the same regardless of origin. Deserializing
/// accepts a JSON number or a JSON string; serializing always writes a string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProspectId(String);

impl<'de> Deserialize<'de> for ProspectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(id) => Self::from(id),
            Raw::Text(id) => Self::from(id),
        })
    }
}

impl ProspectId {
    /// Create a prospect ID from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for ProspectId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for ProspectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProspectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ProspectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Job role of a prospect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Role {
    /// Short code, e.g. `"DM"`
    pub role_code: String,
    /// Display name, e.g. `"Decision Maker"`
    pub role_name: String,
}

impl Role {
    /// Create a role.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            role_code: code.into(),
            role_name: name.into(),
        }
    }
}

/// Country of a prospect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Country {
    /// ISO 3166-1 alpha-3 code, e.g. `"GBR"`
    pub country_code: String,
    /// Display name, e.g. `"United Kingdom"`
    pub country_name: String,
}

impl Country {
    /// Create a country.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            country_code: code.into(),
            country_name: name.into(),
        }
    }
}

/// Snapshot of a prospect taken when they signed up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Prospect {
    /// Identifier, used as the search index key
    pub prospect_id: ProspectId,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Employer
    pub company_name: String,
    /// Contact email
    pub email_address: String,
    /// Job role
    pub role: Role,
    /// Country of residence
    pub country: Country,
}

impl Prospect {
    /// Full display name: first and last name separated by a space.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prospect() -> Prospect {
        Prospect {
            prospect_id: ProspectId::from(7_u64),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            company_name: "Navy".to_string(),
            email_address: "grace@navy.mil".to_string(),
            role: Role::new("EN", "Engineer"),
            country: Country::new("USA", "United States"),
        }
    }

    #[test]
    fn full_name_joins_first_and_last() {
        assert_eq!(prospect().full_name(), "Grace Hopper");
    }

    #[test]
    fn prospect_id_from_integer_and_string_agree() {
        assert_eq!(ProspectId::from(42_u64), ProspectId::from("42"));
        assert_eq!(ProspectId::from(42_u64).to_string(), "42");
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn prospect_id_accepts_numbers_and_strings() {
        let from_number: ProspectId = serde_json::from_str("42").unwrap();
        let from_string: ProspectId = serde_json::from_str("\"42\"").unwrap();

        assert_eq!(from_number, from_string);
        assert_eq!(serde_json::to_string(&from_number).unwrap(), "\"42\"");
        assert!(serde_json::from_str::<ProspectId>("-1").is_err());
        assert!(serde_json::from_str::<ProspectId>("null").is_err());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn fields_serialize_in_pascal_case() {
        let json = serde_json::to_value(prospect()).unwrap();

        assert_eq!(json["ProspectId"], "7");
        assert_eq!(json["EmailAddress"], "grace@navy.mil");
        assert_eq!(json["Role"]["RoleCode"], "EN");
        assert_eq!(json["Country"]["CountryName"], "United States");
    }
}
