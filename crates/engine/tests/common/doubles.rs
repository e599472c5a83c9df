//! Schema graph doubles wrapping a [`MemoryGraph`].

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use linkfind_engine::EngineResult;
use linkfind_engine::backends::memory::MemoryGraph;
use linkfind_engine::core::{RowStream, SchemaGraph};
use linkfind_engine::types::{ClassRef, Filter, LiveLayer, RelationshipEdge, Row};

/// Cancels a token when a scan hands out more than `after_rows` rows in
/// total. The row that trips the cancellation is still handed out.
pub struct CancellingGraph {
    inner: Arc<MemoryGraph>,
    token: CancellationToken,
    after_rows: usize,
    seen: AtomicUsize,
}

impl CancellingGraph {
    pub fn new(inner: Arc<MemoryGraph>, token: CancellationToken, after_rows: usize) -> Self {
        Self {
            inner,
            token,
            after_rows,
            seen: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SchemaGraph for CancellingGraph {
    fn backend_name(&self) -> &'static str {
        "cancelling"
    }

    fn layers(&self) -> Vec<LiveLayer> {
        self.inner.layers()
    }

    fn find_classes(&self, name: &str) -> Vec<ClassRef> {
        self.inner.find_classes(name)
    }

    fn find_classes_by_model_name(&self, model_name: &str) -> Vec<ClassRef> {
        self.inner.find_classes_by_model_name(model_name)
    }

    fn relationships(&self, class: &ClassRef) -> Vec<RelationshipEdge> {
        self.inner.relationships(class)
    }

    fn scan<'a>(&'a self, class: &'a ClassRef, filter: &'a Filter) -> RowStream<'a> {
        self.inner
            .scan(class, filter)
            .map(move |row| {
                if self.seen.fetch_add(1, Ordering::SeqCst) >= self.after_rows {
                    self.token.cancel();
                }
                row
            })
            .boxed()
    }

    async fn related(&self, row: &Row, edge: &RelationshipEdge) -> EngineResult<Vec<Row>> {
        self.inner.related(row, edge).await
    }
}

/// Sleeps before handing out every scanned row.
pub struct SlowGraph {
    inner: Arc<MemoryGraph>,
    delay: Duration,
}

impl SlowGraph {
    pub fn new(inner: Arc<MemoryGraph>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl SchemaGraph for SlowGraph {
    fn backend_name(&self) -> &'static str {
        "slow"
    }

    fn layers(&self) -> Vec<LiveLayer> {
        self.inner.layers()
    }

    fn find_classes(&self, name: &str) -> Vec<ClassRef> {
        self.inner.find_classes(name)
    }

    fn find_classes_by_model_name(&self, model_name: &str) -> Vec<ClassRef> {
        self.inner.find_classes_by_model_name(model_name)
    }

    fn relationships(&self, class: &ClassRef) -> Vec<RelationshipEdge> {
        self.inner.relationships(class)
    }

    fn scan<'a>(&'a self, class: &'a ClassRef, filter: &'a Filter) -> RowStream<'a> {
        let delay = self.delay;
        self.inner
            .scan(class, filter)
            .then(move |row| async move {
                tokio::time::sleep(delay).await;
                row
            })
            .boxed()
    }

    async fn related(&self, row: &Row, edge: &RelationshipEdge) -> EngineResult<Vec<Row>> {
        self.inner.related(row, edge).await
    }
}
