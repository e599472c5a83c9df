//! Schema graphs and requests shared by the integration tests.

use std::sync::Arc;

use serde_json::json;

use linkfind_engine::backends::memory::MemoryGraph;
use linkfind_engine::types::{
    ComparisonOperator, Filter, SearchPackage, SearchRequest, SearchableField, SearchableItem,
    SearchableRelationship,
};
use linkfind_engine::{EngineConfig, SearchEngine};

/// A small electric network in the `gis` datastore.
///
/// | Class | Rows |
/// |-------|------|
/// | Pole | 1 `P-100` Active, 2 `P-X1-200` Active, 3 `P-300` Retired, 4 `P-X1-400` Retired |
/// | Anchor | 7 `A9`, 8 `A10`, 9 (no tag) |
/// | Bolt | 20 `B-A9-1`, 21 `B-22` |
/// | Transformer | 30 `T-X1`, 31 `T-2` |
/// | Span | 40 `S-1`, 41 `S-2`, 42 `S-X1` |
/// | Pylon | 60 `PY-X1` |
///
/// Relationships: `OwnsAnchor` Pole→Anchor (2→7, 3→8), `HasBolt` Anchor→Bolt
/// (7→20, 8→21), `PoleTransformer` Pole→Transformer (1→30), `SpanOnPole`
/// Pole→Span (1→40), `NextSpan` Span→Span (40→41, 41→42) and the broken
/// `Legacy` Pole→Bolt (3→21) with a negative id.
///
/// Live entries: layer `Pole` (definition `Status = 'Active'`), layers
/// `Transformer` and `Pylon`, table `Span`. Pole and Pylon share the model
/// name `POLE`; Transformer carries `XFMR`.
pub fn utility_network() -> MemoryGraph {
    MemoryGraph::builder("gis")
        .class("Pole", &["POLE"])
        .class("Anchor", &[])
        .class("Bolt", &[])
        .class("Transformer", &["XFMR"])
        .class("Span", &[])
        .class("Pylon", &["POLE"])
        .row("Pole", 1, json!({"Name": "P-100", "Status": "Active", "Height": 30}))
        .row("Pole", 2, json!({"Name": "P-X1-200", "Status": "Active", "Height": 45}))
        .row("Pole", 3, json!({"Name": "P-300", "Status": "Retired", "Height": 40}))
        .row("Pole", 4, json!({"Name": "P-X1-400", "Status": "Retired", "Height": 35}))
        .row("Anchor", 7, json!({"Tag": "A9"}))
        .row("Anchor", 8, json!({"Tag": "A10"}))
        .row("Anchor", 9, json!({"Tag": null}))
        .row("Bolt", 20, json!({"Serial": "B-A9-1"}))
        .row("Bolt", 21, json!({"Serial": "B-22"}))
        .row("Transformer", 30, json!({"Name": "T-X1", "Kva": 50}))
        .row("Transformer", 31, json!({"Name": "T-2", "Kva": 75}))
        .row("Span", 40, json!({"Label": "S-1"}))
        .row("Span", 41, json!({"Label": "S-2"}))
        .row("Span", 42, json!({"Label": "S-X1"}))
        .row("Pylon", 60, json!({"Name": "PY-X1"}))
        .relationship(1, "OwnsAnchor", "Pole", "Anchor")
        .relationship(2, "HasBolt", "Anchor", "Bolt")
        .relationship(3, "PoleTransformer", "Pole", "Transformer")
        .relationship(4, "SpanOnPole", "Pole", "Span")
        .relationship(5, "NextSpan", "Span", "Span")
        .relationship(-1, "Legacy", "Pole", "Bolt")
        .relate("OwnsAnchor", 2, 7)
        .relate("OwnsAnchor", 3, 8)
        .relate("HasBolt", 7, 20)
        .relate("HasBolt", 8, 21)
        .relate("PoleTransformer", 1, 30)
        .relate("SpanOnPole", 1, 40)
        .relate("NextSpan", 40, 41)
        .relate("NextSpan", 41, 42)
        .relate("Legacy", 3, 21)
        .layer_with_definition(
            "Pole",
            "Pole",
            Filter::compare("Status", ComparisonOperator::Equals, "Active"),
        )
        .layer("Transformer", "Transformer")
        .layer("Pylon", "Pylon")
        .table("Span", "Span")
        .build()
        .expect("utility network fixture is valid")
}

/// A `Pole` layer in `gis` and a record class related to it.
///
/// `record_class` may be qualified (`"archive:Record"`) to put the records,
/// and the origin of the `Replaces` relationship, in another datastore.
/// Record 5 (`Note = X1`) replaces Pole 2.
pub fn replacement_network(record_class: &str) -> MemoryGraph {
    MemoryGraph::builder("gis")
        .class("Pole", &[])
        .class(record_class, &[])
        .row("Pole", 2, json!({"Name": "P-2"}))
        .row(record_class, 5, json!({"Note": "X1"}))
        .relationship(1, "Replaces", record_class, "Pole")
        .relate("Replaces", 5, 2)
        .layer("Pole", "Pole")
        .build()
        .expect("replacement network fixture is valid")
}

/// Returns the fixture graph shared between an engine and the test.
pub fn shared_network() -> Arc<MemoryGraph> {
    Arc::new(utility_network())
}

/// Creates a sequential engine over `graph`.
pub fn sequential_engine(graph: Arc<MemoryGraph>) -> SearchEngine {
    SearchEngine::with_config(graph, EngineConfig::sequential())
}

/// Creates a parallel engine over `graph`.
pub fn parallel_engine(graph: Arc<MemoryGraph>) -> SearchEngine {
    SearchEngine::with_config(graph, EngineConfig::default())
}

/// Wraps items in a single `Electric` package.
pub fn electric(keyword: &str, items: Vec<SearchableItem>) -> SearchRequest {
    let package = items
        .into_iter()
        .fold(SearchPackage::new("Electric"), SearchPackage::with_item);
    SearchRequest::new(keyword).with_package(package)
}

/// The `Pole` layer item searching `Name`.
pub fn pole_by_name() -> SearchableItem {
    SearchableItem::layer("Pole").with_field(SearchableField::new("Name"))
}

/// The `Transformer` layer item searching `Name`.
pub fn transformer_by_name() -> SearchableItem {
    SearchableItem::layer("Transformer").with_field(SearchableField::new("Name"))
}

/// The `Pole` layer item following `OwnsAnchor` (by `Tag`) and then
/// `HasBolt` (by `Serial`).
pub fn pole_with_anchor_tree() -> SearchableItem {
    SearchableItem::layer("Pole").with_relationship(
        SearchableRelationship::new("OwnsAnchor", "Anchor")
            .with_field(SearchableField::new("Tag"))
            .with_relationship(
                SearchableRelationship::new("HasBolt", "Bolt")
                    .with_field(SearchableField::new("Serial")),
            ),
    )
}

/// Collects the ids registered under `key`.
pub fn ids(response: &linkfind_engine::SearchResponse, key: &str) -> Vec<i64> {
    response
        .get(key)
        .map(|ids| ids.iter().map(|id| id.value()).collect())
        .unwrap_or_default()
}
