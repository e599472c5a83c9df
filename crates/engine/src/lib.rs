//! Linkfind Search Engine
//!
//! This crate implements keyword search over a typed relationship graph of
//! tables and spatial layers. Given a search inventory (which tables and
//! layers are searchable, on which fields, and which relationships to follow)
//! and a keyword with comparison/logical semantics, it finds every matching
//! row, walks the relationship graph to discover related matches, and
//! attaches every match back to the layer or table that should display it.
//!
//! # Features
//!
//! - **Expression compilation**: keyword + operators become a [`Filter`](types::Filter)
//!   per searchable item, merged with layer definition filters
//! - **Relationship traversal**: named or wildcard (`*`) relationship specs,
//!   followed forward and backward, to any depth the inventory describes
//! - **Attach resolution**: matched rows are walked back along their
//!   relationship path to the owning displayable layer
//! - **Bounded work**: result thresholds (per request, package or item),
//!   timeouts and cooperative cancellation, all returning partial results
//!
//! # Architecture
//!
//! - [`types`] - Request, inventory, schema and response value types
//! - [`core`] - The [`SchemaGraph`] trait implemented by data sources
//! - [`search`] - Compiler, traverser, attach resolver and orchestrator
//! - [`backends`] - Schema graph implementations (in-memory)
//! - [`config`] - Engine configuration
//! - [`error`] - Error types for all operations
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use linkfind_engine::backends::memory::MemoryGraph;
//! use linkfind_engine::types::{
//!     ComparisonOperator, SearchPackage, SearchRequest, SearchableField, SearchableItem,
//! };
//! use linkfind_engine::SearchEngine;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let graph = MemoryGraph::builder("gis")
//!     .class("Pole", &[])
//!     .row("Pole", 1, json!({"Name": "P-100"}))
//!     .row("Pole", 2, json!({"Name": "P-X1-200"}))
//!     .table("Pole", "Pole")
//!     .build()?;
//!
//! let request = SearchRequest::new("X1")
//!     .with_comparison(ComparisonOperator::Contains)
//!     .with_package(SearchPackage::new("Electric").with_item(
//!         SearchableItem::table("Pole").with_field(SearchableField::new("Name")),
//!     ));
//!
//! let engine = SearchEngine::new(Arc::new(graph));
//! let response = engine.find(request).await?;
//! assert!(response.contains("Pole", 2));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod config;
pub mod core;
pub mod error;
pub mod search;
pub mod types;

// Re-export commonly used types at crate root
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use types::{SearchRequest, SearchResponse};

// Re-export core traits
pub use core::SchemaGraph;

// Re-export the orchestrator
pub use search::{SearchEngine, SearchEvent};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
