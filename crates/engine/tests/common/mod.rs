//! Test infrastructure for the search engine.
//!
//! Provides a utility-network schema graph, request builders and schema
//! graph doubles that cancel or slow down scans.

#![allow(dead_code)]

pub mod doubles;
pub mod fixtures;

pub use doubles::*;
pub use fixtures::*;
