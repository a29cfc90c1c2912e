use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

use crate::mapper::EventRecord;

/// Locally persisted set of favorite event uuids.
///
/// Kept sorted so the persisted JSON array is a pure function of membership:
/// toggling a uuid twice writes back byte-identical storage content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoriteSet {
    uuids: BTreeSet<String>,
}

impl FavoriteSet {
    /// Decodes the persisted list. Missing or unreadable data yields an empty set.
    #[must_use]
    pub fn load(stored: Option<&[u8]>) -> Self {
        let Some(bytes) = stored else {
            return Self::default();
        };
        match serde_json::from_slice::<Vec<String>>(bytes) {
            Ok(list) => Self {
                uuids: list.into_iter().filter(|u| !u.is_empty()).collect(),
            },
            Err(e) => {
                warn!(error = %e, "stored favorites are corrupt, starting empty");
                Self::default()
            }
        }
    }

    /// Adds the uuid if absent, removes it if present. Returns the new membership.
    pub fn toggle(&mut self, uuid: &str) -> bool {
        if self.uuids.remove(uuid) {
            false
        } else {
            self.uuids.insert(uuid.to_string());
            true
        }
    }

    #[must_use]
    pub fn contains(&self, uuid: &str) -> bool {
        self.uuids.contains(uuid)
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.uuids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.uuids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.uuids.iter().map(String::as_str)
    }

    /// Drops uuids that no longer exist in the loaded event list.
    /// Returns true if anything was removed.
    pub fn retain_known(&mut self, all: &[EventRecord]) -> bool {
        let before = self.uuids.len();
        self.uuids
            .retain(|u| all.iter().any(|record| record.uuid.as_str() == u));
        self.uuids.len() != before
    }

    /// The full list as written to storage.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let list: Vec<&str> = self.iter().collect();
        serde_json::to_vec(&list).unwrap_or_else(|_| b"[]".to_vec())
    }
}
