//! Search progress events.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A progress notification published on the engine's broadcast channel.
///
/// Every event carries the id of the search it belongs to, so one
/// subscriber can follow concurrent searches on the same engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum SearchEvent {
    /// A search started with this many (item, class) units.
    #[serde(rename_all = "camelCase")]
    Started {
        /// Search id.
        search_id: Uuid,
        /// Start time.
        at: DateTime<Utc>,
        /// Number of resolved units.
        units: usize,
    },

    /// A unit's leaf query is about to run.
    #[serde(rename_all = "camelCase")]
    UnitStarted {
        /// Search id.
        search_id: Uuid,
        /// Package index.
        package: usize,
        /// Item index within the package.
        item: usize,
        /// Class the item resolved to.
        class: String,
    },

    /// A unit finished, including its relationship traversal.
    #[serde(rename_all = "camelCase")]
    UnitCompleted {
        /// Search id.
        search_id: Uuid,
        /// Package index.
        package: usize,
        /// Item index within the package.
        item: usize,
        /// Class the item resolved to.
        class: String,
    },

    /// A threshold scope became full.
    #[serde(rename_all = "camelCase")]
    ThresholdReached {
        /// Search id.
        search_id: Uuid,
        /// Entries registered so far.
        entries: usize,
    },

    /// The search was cancelled or timed out.
    #[serde(rename_all = "camelCase")]
    Cancelled {
        /// Search id.
        search_id: Uuid,
        /// Entries registered before the stop.
        entries: usize,
    },

    /// The search finished and its response was assembled.
    #[serde(rename_all = "camelCase")]
    Completed {
        /// Search id.
        search_id: Uuid,
        /// Entries in the response.
        entries: usize,
        /// Wall time of the search.
        elapsed_ms: u64,
    },
}

impl SearchEvent {
    /// Returns the id of the search this event belongs to.
    pub fn search_id(&self) -> Uuid {
        match self {
            SearchEvent::Started { search_id, .. }
            | SearchEvent::UnitStarted { search_id, .. }
            | SearchEvent::UnitCompleted { search_id, .. }
            | SearchEvent::ThresholdReached { search_id, .. }
            | SearchEvent::Cancelled { search_id, .. }
            | SearchEvent::Completed { search_id, .. } => *search_id,
        }
    }

    /// Returns true for the event that ends a search.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SearchEvent::Completed { .. })
    }
}
