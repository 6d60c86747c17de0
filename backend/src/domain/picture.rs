//! Picture attachments registered against diary entries.
//!
//! Raw bytes live in a third-party file host; the backend stores only the
//! host's file id, the public URL, and ordering metadata. A picture never
//! outlives its entry: deletion cascades from the entry.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::entry::EntryId;
use crate::domain::user::UserId;

/// Stable picture identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct PictureId(Uuid);

impl PictureId {
    /// Generate a new random id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an id from its canonical string form.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(Self)
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

impl fmt::Display for PictureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A media attachment on a diary entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    pub id: PictureId,
    pub owner_id: UserId,
    pub entry_id: EntryId,
    /// Identifier assigned by the external file host.
    pub file_host_id: String,
    /// Public URL served by the file host.
    pub url: String,
    pub created_at: DateTime<Utc>,
    /// Display position within the entry; ties broken by creation time.
    pub sort_order: i32,
}

impl Picture {
    /// Ordering used by every listing: sort order, then creation time.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        self.sort_order
            .cmp(&other.sort_order)
            .then(self.created_at.cmp(&other.created_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn picture(order: i32, created_offset_secs: i64) -> Picture {
        Picture {
            id: PictureId::random(),
            owner_id: UserId::random(),
            entry_id: EntryId::random(),
            file_host_id: "host-1".into(),
            url: "https://files.example/1".into(),
            created_at: Utc::now() + Duration::seconds(created_offset_secs),
            sort_order: order,
        }
    }

    #[test]
    fn orders_by_sort_order_first() {
        let first = picture(0, 100);
        let second = picture(1, 0);
        assert_eq!(first.display_cmp(&second), Ordering::Less);
    }

    #[test]
    fn breaks_ties_by_creation_time() {
        let earlier = picture(2, 0);
        let later = picture(2, 60);
        assert_eq!(earlier.display_cmp(&later), Ordering::Less);
    }
}
