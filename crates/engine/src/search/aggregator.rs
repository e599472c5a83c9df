//! Response aggregator.
//!
//! The only mutable state shared across traversal branches. Every
//! registration goes through one lock so the duplicate check, the threshold
//! check and the insert happen atomically: once a scope is full, no branch
//! can add to it, whatever the interleaving.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use parking_lot::Mutex;

use crate::types::{ObjectId, SearchResponse, ThresholdConstraint};

/// Identifies the top-level unit a registration is made on behalf of:
/// package index and item index within the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scope {
    /// Package index.
    pub package: usize,
    /// Item index within the package.
    pub item: usize,
}

impl Scope {
    /// Creates a scope.
    pub fn new(package: usize, item: usize) -> Self {
        Self { package, item }
    }
}

/// Outcome of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The entry was added. `filled` is true when this entry brought the
    /// scope to its threshold.
    Inserted {
        /// The scope is now full.
        filled: bool,
    },
    /// The entry was already present.
    Duplicate,
    /// The scope was already full.
    Rejected,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<String, HashSet<ObjectId>>,
    total: usize,
    per_package: HashMap<usize, usize>,
    per_item: HashMap<Scope, usize>,
    threshold_reached: bool,
}

impl State {
    fn count(&self, constraint: ThresholdConstraint, scope: Scope) -> usize {
        match constraint {
            ThresholdConstraint::Request => self.total,
            ThresholdConstraint::Package => self.per_package.get(&scope.package).copied().unwrap_or(0),
            ThresholdConstraint::Item => self.per_item.get(&scope).copied().unwrap_or(0),
        }
    }
}

/// Concurrent map of layer/table name to a deduplicated set of object ids,
/// bounded by a threshold.
#[derive(Debug)]
pub struct ResponseAggregator {
    state: Mutex<State>,
    threshold: usize,
    constraint: ThresholdConstraint,
}

impl ResponseAggregator {
    /// Creates an aggregator. A threshold of zero means no limit.
    pub fn new(threshold: u32, constraint: ThresholdConstraint) -> Self {
        Self {
            state: Mutex::new(State::default()),
            threshold: threshold as usize,
            constraint,
        }
    }

    /// Creates an aggregator without a threshold.
    pub fn unbounded() -> Self {
        Self::new(0, ThresholdConstraint::Request)
    }

    fn limit(&self) -> Option<usize> {
        (self.threshold > 0).then_some(self.threshold)
    }

    /// Registers `id` under `key` on behalf of `scope`.
    pub fn register(&self, scope: Scope, key: &str, id: ObjectId) -> Registration {
        let mut state = self.state.lock();

        if state.entries.get(key).is_some_and(|ids| ids.contains(&id)) {
            return Registration::Duplicate;
        }

        if let Some(limit) = self.limit() {
            if state.count(self.constraint, scope) >= limit {
                return Registration::Rejected;
            }
        }

        state.entries.entry(key.to_string()).or_default().insert(id);
        state.total += 1;
        *state.per_package.entry(scope.package).or_default() += 1;
        *state.per_item.entry(scope).or_default() += 1;

        let filled = self
            .limit()
            .is_some_and(|limit| state.count(self.constraint, scope) >= limit);
        if filled {
            state.threshold_reached = true;
        }

        Registration::Inserted { filled }
    }

    /// Returns true if `scope` can take no more entries.
    pub fn is_full(&self, scope: Scope) -> bool {
        match self.limit() {
            Some(limit) => self.state.lock().count(self.constraint, scope) >= limit,
            None => false,
        }
    }

    /// Returns the total number of entries.
    pub fn len(&self) -> usize {
        self.state.lock().total
    }

    /// Returns true if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if any scope reached the threshold.
    pub fn threshold_reached(&self) -> bool {
        self.state.lock().threshold_reached
    }

    /// Freezes the current entries into a response.
    pub fn snapshot(&self, cancelled: bool) -> SearchResponse {
        let state = self.state.lock();
        let entries: BTreeMap<String, BTreeSet<ObjectId>> = state
            .entries
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(key, ids)| (key.clone(), ids.iter().copied().collect()))
            .collect();

        SearchResponse {
            entries,
            cancelled,
            threshold_reached: state.threshold_reached,
        }
    }
}
