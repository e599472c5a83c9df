//! The schema graph accessor trait.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::EngineResult;
use crate::types::{ClassRef, Filter, LiveLayer, RelationshipEdge, Row};

/// A stream of rows produced by a filtered scan.
///
/// Errors are yielded as stream items so a data source can fail part way
/// through a scan.
pub type RowStream<'a> = BoxStream<'a, EngineResult<Row>>;

/// Read-only access to a typed relationship graph of classes.
///
/// This is the only collaborator the search engine talks to. Implementations
/// expose the classes they hold, the displayable layers and tables built on
/// them, the relationship edges of every class, a filtered scan, and the
/// related-object lookup the attach walk uses. The engine never mutates
/// anything through this trait.
///
/// Lookups that find nothing return empty collections. Only genuine
/// collaborator failures (a scan that cannot run, a broken related-object
/// fetch) are errors.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use linkfind_engine::backends::memory::MemoryGraph;
/// use linkfind_engine::SchemaGraph;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let graph: Arc<dyn SchemaGraph> = Arc::new(
///     MemoryGraph::builder("gis")
///         .class("Pole", &["POLE"])
///         .class("Anchor", &[])
///         .relationship(1, "OwnsAnchor", "Pole", "Anchor")
///         .layer("Poles", "Pole")
///         .build()?,
/// );
///
/// let pole = &graph.find_classes("pole")[0];
/// assert_eq!(graph.relationships(pole).len(), 1);
/// assert_eq!(graph.find_classes_by_model_name("POLE"), vec![pole.clone()]);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait SchemaGraph: Send + Sync {
    /// Returns a human-readable name for this data source.
    fn backend_name(&self) -> &'static str;

    /// Returns the displayable layers and standalone tables.
    fn layers(&self) -> Vec<LiveLayer>;

    /// Resolves a configured name to live classes (case-insensitive).
    ///
    /// A name can resolve to several classes when connected datastores hold
    /// same-named classes.
    fn find_classes(&self, name: &str) -> Vec<ClassRef>;

    /// Resolves a model name (an alias assigned to classes) to live classes.
    fn find_classes_by_model_name(&self, model_name: &str) -> Vec<ClassRef>;

    /// Returns every relationship edge the class takes part in, in either
    /// role.
    fn relationships(&self, class: &ClassRef) -> Vec<RelationshipEdge>;

    /// Returns true if both classes live in the same datastore.
    fn is_same_datastore(&self, a: &ClassRef, b: &ClassRef) -> bool {
        a.datastore() == b.datastore()
    }

    /// Scans `class` for rows matching `filter`.
    fn scan<'a>(&'a self, class: &'a ClassRef, filter: &'a Filter) -> RowStream<'a>;

    /// Returns the rows related to `row` through `edge`, whichever end of
    /// the edge `row` sits on.
    async fn related(&self, row: &Row, edge: &RelationshipEdge) -> EngineResult<Vec<Row>>;
}
