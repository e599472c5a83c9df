//! Keyword search over the schema graph.
//!
//! This module holds the search pipeline:
//!
//! - [`compiler`] - Keyword + operators to a [`Filter`](crate::types::Filter) per item
//! - [`matcher`] - In-memory evaluation of filters against rows
//! - [`aggregator`] - Thread-safe, threshold-bounded result sets
//! - [`context`] - Per-search shared state and stop checks
//! - [`traverser`] - Relationship tree walk and leaf relationship search
//! - [`attach`] - Backward walk from a match to its displayable layer
//! - [`engine`] - The [`SearchEngine`] orchestrator
//! - [`events`] - Progress events
//!
//! # Search Flow
//!
//! ```text
//! SearchEngine::find(request)
//!    └── validate request, resolve layer universe
//!    └── per (item, live class) unit, parallel or sequential:
//!           └── compile item filter ── scan class ── register direct matches
//!           └── traverse relationship specs
//!                  └── per matching edge: compile ── scan target
//!                  │        └── attach each row back along its path ── register
//!                  └── recurse into the node's children at the target
//!    └── snapshot aggregator into a SearchResponse
//! ```
//!
//! Every loop checks the shared cancellation token and the threshold of its
//! scope before doing more work; both stops unwind quietly and leave a
//! valid, partial response.

pub mod aggregator;
pub mod attach;
pub mod compiler;
pub mod context;
pub mod engine;
pub mod events;
pub mod matcher;
pub mod traverser;

pub use aggregator::{Registration, ResponseAggregator, Scope};
pub use attach::attach;
pub use compiler::{compile, compile_item};
pub use context::SearchContext;
pub use engine::SearchEngine;
pub use events::SearchEvent;
pub use matcher::CompiledFilter;
pub use traverser::{search_relationship, traverse};
