//! Roles and countries a prospect can pick from.
//!
//! Loaded once at startup and looked up by code for every sign-up.

use product_launch_core::prospect::{Country, Role};
use std::collections::BTreeMap;

/// Code → value lookup tables for roles and countries.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    roles: BTreeMap<String, Role>,
    countries: BTreeMap<String, Country>,
}

impl ReferenceData {
    /// Build lookup tables from explicit lists. Later duplicates win.
    #[must_use]
    pub fn new(
        roles: impl IntoIterator<Item = Role>,
        countries: impl IntoIterator<Item = Country>,
    ) -> Self {
        Self {
            roles: roles
                .into_iter()
                .map(|role| (role.role_code.clone(), role))
                .collect(),
            countries: countries
                .into_iter()
                .map(|country| (country.country_code.clone(), country))
                .collect(),
        }
    }

    /// The roles and countries every installation starts with.
    #[must_use]
    pub fn seeded() -> Self {
        Self::new(
            [
                Role::new("DA", "Developer Advocate"),
                Role::new("DM", "Decision Maker"),
                Role::new("AC", "Architect"),
                Role::new("EN", "Engineer"),
                Role::new("OP", "IT Ops"),
            ],
            [
                Country::new("GBR", "United Kingdom"),
                Country::new("USA", "United States"),
                Country::new("SWE", "Sweden"),
            ],
        )
    }

    /// Look up a role by code.
    #[must_use]
    pub fn role(&self, code: &str) -> Option<&Role> {
        self.roles.get(code)
    }

    /// Look up a country by code.
    #[must_use]
    pub fn country(&self, code: &str) -> Option<&Country> {
        self.countries.get(code)
    }

    /// Roles ordered by display name, for populating a picker.
    #[must_use]
    pub fn roles(&self) -> Vec<&Role> {
        let mut roles: Vec<&Role> = self.roles.values().collect();
        roles.sort_by(|a, b| a.role_name.cmp(&b.role_name));
        roles
    }

    /// Countries ordered by display name, for populating a picker.
    #[must_use]
    pub fn countries(&self) -> Vec<&Country> {
        let mut countries: Vec<&Country> = self.countries.values().collect();
        countries.sort_by(|a, b| a.country_name.cmp(&b.country_name));
        countries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_data_resolves_known_codes() {
        let data = ReferenceData::seeded();

        assert_eq!(data.role("DM").map(|r| r.role_name.as_str()), Some("Decision Maker"));
        assert_eq!(data.country("SWE").map(|c| c.country_name.as_str()), Some("Sweden"));
        assert!(data.role("XX").is_none());
        assert!(data.country("gbr").is_none());
    }

    #[test]
    fn pickers_are_sorted_by_name() {
        let data = ReferenceData::seeded();

        let roles: Vec<&str> = data.roles().iter().map(|r| r.role_name.as_str()).collect();
        assert_eq!(
            roles,
            ["Architect", "Decision Maker", "Developer Advocate", "Engineer", "IT Ops"]
        );

        let countries: Vec<&str> = data.countries().iter().map(|c| c.country_name.as_str()).collect();
        assert_eq!(countries, ["Sweden", "United Kingdom", "United States"]);
    }
}
