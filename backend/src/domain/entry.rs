//! Diary entry model and the privacy tier enumeration.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::dates::EntryDate;
use crate::domain::user::{UserId, Username};

/// Stable diary entry identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Generate a new random id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an id from its string form.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }

    /// Wrap an already-parsed UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visibility tier of a diary entry.
///
/// Legacy rows carried a boolean `isPrivate` flag; [`PrivacyTier::normalize`]
/// folds every historical representation into this enum at the read
/// boundary. Unknown values default to `Public`, matching the original
/// migration behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyTier {
    /// Visible to anyone, authenticated or not.
    #[default]
    Public,
    /// Visible to the owner and accepted friends.
    Friend,
    /// Visible to the owner only.
    Private,
}

impl PrivacyTier {
    /// Fold a raw privacy value and/or a legacy boolean into a tier.
    pub fn normalize(raw: Option<&str>, legacy_is_private: Option<bool>) -> Self {
        if let Some(value) = raw {
            match value.trim().to_lowercase().as_str() {
                "public" => return Self::Public,
                "friend" => return Self::Friend,
                "private" | "true" => return Self::Private,
                "false" => return Self::Public,
                _ => {}
            }
        }
        match legacy_is_private {
            Some(true) => Self::Private,
            Some(false) => Self::Public,
            None => Self::Public,
        }
    }

    /// Wire form of the tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Friend => "friend",
            Self::Private => "private",
        }
    }

    /// Flip between `private` and `public`; `friend` also becomes `public`,
    /// matching the original toggle handler.
    pub fn toggled(&self) -> Self {
        match self {
            Self::Private => Self::Public,
            Self::Public | Self::Friend => Self::Private,
        }
    }
}

impl fmt::Display for PrivacyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single dated diary record.
///
/// The owner username is denormalised onto the entry so public listings do
/// not need a join per row. Multiple entries per (owner, date) are allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct DiaryEntry {
    pub id: EntryId,
    pub owner_id: UserId,
    pub owner_username: Username,
    pub date: EntryDate,
    pub title: String,
    pub content: String,
    pub privacy: PrivacyTier,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("public"), None, PrivacyTier::Public)]
    #[case(Some("FRIEND"), None, PrivacyTier::Friend)]
    #[case(Some("private"), None, PrivacyTier::Private)]
    #[case(Some("true"), None, PrivacyTier::Private)]
    #[case(Some("false"), None, PrivacyTier::Public)]
    #[case(Some("garbage"), Some(true), PrivacyTier::Private)]
    #[case(None, Some(true), PrivacyTier::Private)]
    #[case(None, Some(false), PrivacyTier::Public)]
    #[case(None, None, PrivacyTier::Public)]
    fn normalizes_legacy_representations(
        #[case] raw: Option<&str>,
        #[case] legacy: Option<bool>,
        #[case] expected: PrivacyTier,
    ) {
        assert_eq!(PrivacyTier::normalize(raw, legacy), expected);
    }

    #[rstest]
    #[case(PrivacyTier::Private, PrivacyTier::Public)]
    #[case(PrivacyTier::Public, PrivacyTier::Private)]
    #[case(PrivacyTier::Friend, PrivacyTier::Private)]
    fn toggle_flips_between_private_and_public(
        #[case] from: PrivacyTier,
        #[case] expected: PrivacyTier,
    ) {
        assert_eq!(from.toggled(), expected);
    }

    #[test]
    fn tier_serialises_lowercase() {
        let value = serde_json::to_value(PrivacyTier::Friend).expect("serialise");
        assert_eq!(value, serde_json::Value::String("friend".into()));
    }
}
