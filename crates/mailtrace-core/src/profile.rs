//! Normalized identity records and the per-email result mapping.

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One person's presence on one named service.
///
/// Every field is a plain string; an empty string means the source did not
/// supply the value. Records serialize with all five fields present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub user_id: String,
    pub user_name: String,
    pub display_name: String,
    pub portrait_url: String,
    pub location: String,
}

impl ProfileRecord {
    /// `true` when either the user id or the user name is known.
    ///
    /// A record without either carries no identifying information and is
    /// never inserted into a [`ResolutionResult`].
    #[must_use]
    pub fn has_identity(&self) -> bool {
        !self.user_id.is_empty() || !self.user_name.is_empty()
    }

    /// Blanks `portrait_url` when it equals one of the given placeholder URLs.
    pub fn scrub_portrait(&mut self, sentinels: &[&str]) {
        if sentinels.contains(&self.portrait_url.as_str()) {
            self.portrait_url.clear();
        }
    }

    /// Trims surrounding whitespace from every field.
    #[must_use]
    pub fn trimmed(self) -> Self {
        Self {
            user_id: self.user_id.trim().to_string(),
            user_name: self.user_name.trim().to_string(),
            display_name: self.display_name.trim().to_string(),
            portrait_url: self.portrait_url.trim().to_string(),
            location: self.location.trim().to_string(),
        }
    }
}

/// Service name → profile mapping produced for one email address.
///
/// Backed by a `BTreeMap` so iteration and serialization order are stable:
/// resolving the same email twice against unchanged sources serializes to
/// identical bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolutionResult(BTreeMap<String, ProfileRecord>);

impl ResolutionResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A result holding exactly one record under `service`.
    #[must_use]
    pub fn single(service: &str, record: ProfileRecord) -> Self {
        let mut result = Self::new();
        result.insert(service, record);
        result
    }

    /// Inserts `record` under `service`, replacing any existing entry.
    pub fn insert(&mut self, service: &str, record: ProfileRecord) -> Option<ProfileRecord> {
        self.0.insert(service.to_string(), record)
    }

    /// Copies every entry of `higher` into `self`, overwriting on key
    /// collision. Call with results in ascending priority so the
    /// highest-priority source is applied last.
    pub fn overlay(&mut self, higher: ResolutionResult) {
        self.0.extend(higher.0);
    }

    #[must_use]
    pub fn get(&self, service: &str) -> Option<&ProfileRecord> {
        self.0.get(service)
    }

    #[must_use]
    pub fn contains(&self, service: &str) -> bool {
        self.0.contains_key(service)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ProfileRecord> {
        self.0.iter()
    }
}

impl IntoIterator for ResolutionResult {
    type Item = (String, ProfileRecord);
    type IntoIter = btree_map::IntoIter<String, ProfileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResolutionResult {
    type Item = (&'a String, &'a ProfileRecord);
    type IntoIter = btree_map::Iter<'a, String, ProfileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, ProfileRecord)> for ResolutionResult {
    fn from_iter<I: IntoIterator<Item = (String, ProfileRecord)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A conglomerator's claim that the user also has an account on `service`.
///
/// Any of the three identifying parts may be empty. Mentions are consumed
/// immediately by the secondary resolver and never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceMention {
    pub service: String,
    pub user_name: String,
    pub user_id: String,
    pub profile_url: String,
}

impl ServiceMention {
    #[must_use]
    pub fn new(service: &str, user_name: &str, user_id: &str, profile_url: &str) -> Self {
        Self {
            service: service.to_string(),
            user_name: user_name.to_string(),
            user_id: user_id.to_string(),
            profile_url: profile_url.to_string(),
        }
    }

    /// A mention carrying only a profile URL.
    #[must_use]
    pub fn from_url(service: &str, profile_url: &str) -> Self {
        Self::new(service, "", "", profile_url)
    }
}
