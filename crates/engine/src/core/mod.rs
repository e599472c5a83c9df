//! Core traits.
//!
//! The engine reaches its data source through one trait, [`SchemaGraph`]:
//!
//! - name and model-name resolution of configured items to live classes
//! - the display universe of layers and tables
//! - role-agnostic relationship edges per class
//! - a filtered row scan ([`RowStream`])
//! - related-object lookup through an edge
//!
//! Implementations live under [`crate::backends`].

mod graph;

pub use graph::{RowStream, SchemaGraph};
