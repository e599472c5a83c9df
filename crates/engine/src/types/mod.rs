//! Core types for the search engine.
//!
//! This module provides the value types used throughout the engine:
//!
//! - [`SearchRequest`] - Keyword, operators, threshold policy and inventory
//! - [`SearchPackage`], [`SearchableItem`], [`SearchableRelationship`] - The inventory tree
//! - [`RelationshipPath`] - Relationship names from an item down to a relationship node
//! - [`Filter`] - A compiled boolean filter expression
//! - [`ClassRef`], [`RelationshipEdge`], [`Row`], [`LiveLayer`] - Schema graph values
//! - [`SearchResponse`] - Layer/table name to matched object ids
//!
//! # Examples
//!
//! ## Building a Request
//!
//! ```
//! use linkfind_engine::types::{
//!     ComparisonOperator, LogicalOperator, SearchPackage, SearchRequest, SearchableField,
//!     SearchableItem, SearchableRelationship, ThresholdConstraint,
//! };
//!
//! let pole = SearchableItem::layer("Pole")
//!     .with_field(SearchableField::new("FacilityId"))
//!     .with_relationship(
//!         SearchableRelationship::new("OwnsAnchor", "Anchor")
//!             .with_field(SearchableField::new("Tag")),
//!     );
//!
//! let request = SearchRequest::new("A9")
//!     .with_comparison(ComparisonOperator::StartsWith)
//!     .with_logical(LogicalOperator::Or)
//!     .with_threshold(50, ThresholdConstraint::Item)
//!     .with_package(SearchPackage::new("Electric").with_item(pole));
//!
//! assert_eq!(request.threshold, 50);
//! assert_eq!(request.packages[0].items.len(), 1);
//! ```
//!
//! ## Relationship Paths
//!
//! ```
//! use linkfind_engine::types::RelationshipPath;
//!
//! let path = RelationshipPath::root().child("OwnsAnchor").child("*");
//! assert_eq!(path.len(), 2);
//! assert_eq!(path.to_string(), "OwnsAnchor/*");
//! ```

mod filter;
mod inventory;
mod request;
mod response;
mod schema;

pub use filter::Filter;
pub use inventory::{
    RelationshipPath, SearchPackage, SearchableField, SearchableItem, SearchableLayer,
    SearchableRelationship, SearchableTable, WILDCARD, name_matches,
};
pub use request::{
    ComparisonOperator, DEFAULT_THRESHOLD, DEFAULT_TIMEOUT_MS, LogicalOperator, SearchRequest,
    ThresholdConstraint,
};
pub use response::SearchResponse;
pub use schema::{ClassRef, DatastoreId, LayerKind, LiveLayer, ObjectId, RelationshipEdge, Row};
