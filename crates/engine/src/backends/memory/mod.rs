//! In-memory schema graph backend.
//!
//! [`MemoryGraph`] holds classes, rows, relationship classes and the
//! layer/table display universe in memory and evaluates filters with the
//! engine's own value matcher. It backs the command-line tool, the tests,
//! and any caller whose data already sits in memory.
//!
//! # Features
//!
//! - Fluent [`MemoryGraphBuilder`] and a JSON [`SchemaDocument`] form
//! - Classes in several datastores, with model names
//! - Self-referential relationships
//! - Lazy scans with work counters ([`GraphStats`])
//! - Failure injection for scans and related-object lookups
//!
//! # Example
//!
//! ```
//! use linkfind_engine::backends::memory::MemoryGraph;
//! use linkfind_engine::SchemaGraph;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let graph = MemoryGraph::builder("gis")
//!     .class("Span", &[])
//!     .relationship(5, "NextSpan", "Span", "Span")
//!     .row("Span", 1, json!({"Label": "S-1"}))
//!     .row("Span", 2, json!({"Label": "S-2"}))
//!     .relate("NextSpan", 1, 2)
//!     .build()?;
//!
//! let span = &graph.find_classes("Span")[0];
//! assert!(graph.relationships(span)[0].is_self_referential());
//! # Ok(())
//! # }
//! ```

mod backend;
mod builder;
mod document;

pub use backend::{GraphStats, MemoryGraph};
pub use builder::MemoryGraphBuilder;
pub use document::{ClassDocument, LayerDocument, RelationshipDocument, RowDocument, SchemaDocument};
