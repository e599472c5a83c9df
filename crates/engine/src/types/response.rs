//! Search response type.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::schema::ObjectId;

/// The frozen result of a search: layer/table name to the set of matched
/// object ids.
///
/// A cancelled or threshold-capped search still produces a valid response;
/// the `cancelled` and `threshold_reached` flags tell the caller it is
/// partial.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Matched object ids per layer/table name.
    #[serde(default)]
    pub entries: BTreeMap<String, BTreeSet<ObjectId>>,

    /// The search was cancelled or timed out before completing.
    #[serde(default)]
    pub cancelled: bool,

    /// A threshold stopped at least one scope early.
    #[serde(default)]
    pub threshold_reached: bool,
}

impl SearchResponse {
    /// Creates an empty response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of (layer, object) entries.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }

    /// Returns true if nothing matched.
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(BTreeSet::is_empty)
    }

    /// Returns the ids matched for `key`.
    pub fn get(&self, key: &str) -> Option<&BTreeSet<ObjectId>> {
        self.entries.get(key)
    }

    /// Returns true if `id` matched under `key`.
    pub fn contains(&self, key: &str, id: impl Into<ObjectId>) -> bool {
        self.entries
            .get(key)
            .is_some_and(|ids| ids.contains(&id.into()))
    }

    /// Returns the layer/table names with at least one match.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns true if the search stopped early for any reason.
    pub fn is_partial(&self) -> bool {
        self.cancelled || self.threshold_reached
    }
}
