//! Per-search shared state.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::core::{RowStream, SchemaGraph};
use crate::error::EngineResult;
use crate::types::{
    ClassRef, LiveLayer, ObjectId, RelationshipEdge, Row, SearchRequest, SearchableItem,
};

use super::aggregator::{Registration, ResponseAggregator, Scope};
use super::events::SearchEvent;

/// Everything one search's branches share.
///
/// Cloning is cheap; all clones see the same aggregator and cancellation
/// signal. The request and the layer universe are read-only.
#[derive(Clone)]
pub struct SearchContext {
    graph: Arc<dyn SchemaGraph>,
    request: Arc<SearchRequest>,
    layers: Arc<Vec<LiveLayer>>,
    aggregator: Arc<ResponseAggregator>,
    cancel: CancellationToken,
    events: Option<broadcast::Sender<SearchEvent>>,
    search_id: Uuid,
}

impl SearchContext {
    /// Creates a context over `graph` for `request`, using the graph's
    /// layers as the layer universe.
    pub fn new(graph: Arc<dyn SchemaGraph>, request: SearchRequest) -> Self {
        let layers = graph.layers();
        let aggregator = ResponseAggregator::new(request.threshold, request.threshold_constraint);
        Self {
            graph,
            request: Arc::new(request),
            layers: Arc::new(layers),
            aggregator: Arc::new(aggregator),
            cancel: CancellationToken::new(),
            events: None,
            search_id: Uuid::new_v4(),
        }
    }

    /// Replaces the layer universe.
    pub fn with_layers(mut self, layers: Vec<LiveLayer>) -> Self {
        self.layers = Arc::new(layers);
        self
    }

    /// Replaces the cancellation signal.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Publishes progress events on `events`.
    pub fn with_events(mut self, events: broadcast::Sender<SearchEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Returns the schema graph.
    pub fn graph(&self) -> &dyn SchemaGraph {
        self.graph.as_ref()
    }

    /// Returns the request.
    pub fn request(&self) -> &SearchRequest {
        &self.request
    }

    /// Returns the top-level item `scope` refers to.
    pub fn item(&self, scope: Scope) -> Option<&SearchableItem> {
        self.request
            .packages
            .get(scope.package)
            .and_then(|package| package.items.get(scope.item))
    }

    /// Returns the layer universe.
    pub fn layers(&self) -> &[LiveLayer] {
        &self.layers
    }

    /// Returns the aggregator.
    pub fn aggregator(&self) -> &ResponseAggregator {
        &self.aggregator
    }

    /// Returns the cancellation signal.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns the search id.
    pub fn search_id(&self) -> Uuid {
        self.search_id
    }

    /// Returns true if the search was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns true if work on behalf of `scope` should unwind: the search
    /// was cancelled or the scope's threshold is reached.
    pub fn should_stop(&self, scope: Scope) -> bool {
        self.cancel.is_cancelled() || self.aggregator.is_full(scope)
    }

    /// Registers a match. Returns true if it was a new entry.
    pub fn register(&self, scope: Scope, key: &str, id: ObjectId) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }

        match self.aggregator.register(scope, key, id) {
            Registration::Inserted { filled } => {
                if filled {
                    let entries = self.aggregator.len();
                    info!(
                        search_id = %self.search_id,
                        package = scope.package,
                        item = scope.item,
                        entries,
                        "threshold reached"
                    );
                    self.emit(SearchEvent::ThresholdReached {
                        search_id: self.search_id,
                        entries,
                    });
                }
                true
            }
            Registration::Duplicate | Registration::Rejected => false,
        }
    }

    /// Finds the live layer over `class` in the datastore of `edge`.
    ///
    /// Same-named classes in other connected datastores never match.
    pub fn resolve_layer(&self, class: &ClassRef, edge: &RelationshipEdge) -> Option<&LiveLayer> {
        self.layers
            .iter()
            .find(|layer| layer.class() == class && self.graph.is_same_datastore(layer.class(), edge.origin()))
    }

    /// Pulls the next row from a scan, or `None` once the scan is exhausted
    /// or the search is cancelled while waiting.
    pub async fn next_row(&self, rows: &mut RowStream<'_>) -> Option<EngineResult<Row>> {
        use futures::StreamExt;

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            next = rows.next() => next,
        }
    }

    /// Publishes an event. Having no subscriber is not an error.
    pub fn emit(&self, event: SearchEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;
    use crate::backends::memory::MemoryGraph;
    use crate::types::ThresholdConstraint;

    fn graph() -> Arc<dyn SchemaGraph> {
        Arc::new(
            MemoryGraph::builder("gis")
                .class("Pole", &[])
                .class("archive:Pole", &[])
                .class("Anchor", &[])
                .relationship(1, "OwnsAnchor", "Pole", "Anchor")
                .relationship(2, "OwnsAnchor", "archive:Pole", "Anchor")
                .layer("Archived Poles", "archive:Pole")
                .layer("Poles", "Pole")
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_resolve_layer_checks_datastore() {
        let graph = graph();
        let ctx = SearchContext::new(graph.clone(), SearchRequest::new("x"));
        let anchor = ClassRef::new("gis", "Anchor");
        let edges = graph.relationships(&anchor);

        let local = edges.iter().find(|e| e.id() == 1).unwrap();
        let resolved = ctx.resolve_layer(&ClassRef::new("gis", "Pole"), local).unwrap();
        assert_eq!(resolved.name(), "Poles");

        let remote = edges.iter().find(|e| e.id() == 2).unwrap();
        assert!(ctx.resolve_layer(&ClassRef::new("gis", "Pole"), remote).is_none());
    }

    #[test]
    fn test_register_stops_after_cancellation() {
        let ctx = SearchContext::new(graph(), SearchRequest::new("x"));
        let scope = Scope::new(0, 0);
        assert!(ctx.register(scope, "Poles", ObjectId(1)));
        assert!(!ctx.register(scope, "Poles", ObjectId(1)));
        ctx.cancellation().cancel();
        assert!(!ctx.register(scope, "Poles", ObjectId(2)));
        assert!(ctx.should_stop(scope));
        assert_eq!(ctx.aggregator().len(), 1);
    }

    #[test]
    fn test_register_emits_threshold_event() {
        let (tx, mut rx) = broadcast::channel(8);
        let request = SearchRequest::new("x").with_threshold(1, ThresholdConstraint::Request);
        let ctx = SearchContext::new(graph(), request).with_events(tx);
        let scope = Scope::new(0, 0);

        assert!(ctx.register(scope, "Poles", ObjectId(1)));
        assert!(ctx.should_stop(scope));
        match rx.try_recv().unwrap() {
            SearchEvent::ThresholdReached { entries, .. } => assert_eq!(entries, 1),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
