//! Schema graph implementations.
//!
//! This module contains implementations of [`SchemaGraph`](crate::core::SchemaGraph).
//! Each backend is gated behind a feature flag.
//!
//! # Available Backends
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | Memory | `memory` | Classes, rows and relationships held in memory, loadable from JSON |

#[cfg(feature = "memory")]
pub mod memory;
