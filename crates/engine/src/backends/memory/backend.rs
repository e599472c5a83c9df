//! In-memory schema graph.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::RwLock;

use crate::core::{RowStream, SchemaGraph};
use crate::error::{BackendError, EngineError, EngineResult};
use crate::search::CompiledFilter;
use crate::types::{ClassRef, Filter, LiveLayer, ObjectId, RelationshipEdge, Row};

use super::builder::MemoryGraphBuilder;
use super::document::SchemaDocument;

const BACKEND_NAME: &str = "memory";

#[derive(Debug, Clone)]
pub(super) struct ClassEntry {
    pub(super) class: ClassRef,
    pub(super) model_names: Vec<String>,
}

#[derive(Debug, Clone)]
pub(super) struct RelationshipEntry {
    pub(super) edge: RelationshipEdge,
    pub(super) pairs: Vec<(ObjectId, ObjectId)>,
}

#[derive(Debug, Default)]
struct Counters {
    scans: AtomicUsize,
    rows_yielded: AtomicUsize,
    related_calls: AtomicUsize,
}

/// Work counters of a [`MemoryGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphStats {
    /// Scans started.
    pub scans: usize,
    /// Rows handed out by scans.
    pub rows_yielded: usize,
    /// Related-object lookups.
    pub related_calls: usize,
}

/// A [`SchemaGraph`] over in-memory classes, rows and relationships.
///
/// Filters are evaluated with [`CompiledFilter`]. Scans are lazy: a row is
/// tested only when the consumer asks for it, so stopping early is visible
/// in [`stats`](Self::stats).
pub struct MemoryGraph {
    classes: Vec<ClassEntry>,
    rows: HashMap<ClassRef, BTreeMap<ObjectId, Row>>,
    relationships: Vec<RelationshipEntry>,
    layers: Vec<LiveLayer>,
    failing_scans: RwLock<HashSet<String>>,
    failing_relationships: RwLock<HashSet<String>>,
    counters: Arc<Counters>,
}

impl Debug for MemoryGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryGraph")
            .field("classes", &self.classes.len())
            .field("relationships", &self.relationships.len())
            .field("layers", &self.layers.len())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl MemoryGraph {
    /// Starts a builder whose bare class names live in `default_datastore`.
    pub fn builder(default_datastore: impl Into<String>) -> MemoryGraphBuilder {
        MemoryGraphBuilder::new(default_datastore)
    }

    /// Loads a graph from a JSON schema document.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let document: SchemaDocument =
            serde_json::from_str(json).map_err(|e| BackendError::InvalidSchema {
                message: e.to_string(),
            })?;
        document.into_builder().build()
    }

    /// Loads a graph from a JSON schema document on disk.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let json = std::fs::read_to_string(path.as_ref()).map_err(BackendError::from)?;
        Self::from_json(&json)
    }

    pub(super) fn from_parts(
        classes: Vec<ClassEntry>,
        rows: HashMap<ClassRef, BTreeMap<ObjectId, Row>>,
        relationships: Vec<RelationshipEntry>,
        layers: Vec<LiveLayer>,
    ) -> Self {
        Self {
            classes,
            rows,
            relationships,
            layers,
            failing_scans: RwLock::new(HashSet::new()),
            failing_relationships: RwLock::new(HashSet::new()),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Makes every later scan of classes named `class` fail.
    pub fn fail_scans_of(&self, class: &str) {
        self.failing_scans.write().insert(class.to_lowercase());
    }

    /// Makes every later related-object lookup through relationships named
    /// `relationship` fail.
    pub fn fail_related_through(&self, relationship: &str) {
        self.failing_relationships
            .write()
            .insert(relationship.to_lowercase());
    }

    /// Returns the work counters.
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            scans: self.counters.scans.load(Ordering::SeqCst),
            rows_yielded: self.counters.rows_yielded.load(Ordering::SeqCst),
            related_calls: self.counters.related_calls.load(Ordering::SeqCst),
        }
    }

    /// Resets the work counters.
    pub fn reset_stats(&self) {
        self.counters.scans.store(0, Ordering::SeqCst);
        self.counters.rows_yielded.store(0, Ordering::SeqCst);
        self.counters.related_calls.store(0, Ordering::SeqCst);
    }

    /// Returns the number of rows of `class`.
    pub fn row_count(&self, class: &ClassRef) -> usize {
        self.rows.get(class).map(BTreeMap::len).unwrap_or(0)
    }

    fn row(&self, class: &ClassRef, id: ObjectId) -> Option<&Row> {
        self.rows.get(class).and_then(|rows| rows.get(&id))
    }
}

fn failed_scan<'a>(error: EngineError) -> RowStream<'a> {
    stream::once(async move { Err(error) }).boxed()
}

#[async_trait]
impl SchemaGraph for MemoryGraph {
    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn layers(&self) -> Vec<LiveLayer> {
        self.layers.clone()
    }

    fn find_classes(&self, name: &str) -> Vec<ClassRef> {
        let (datastore, name) = match name.split_once(':') {
            Some((datastore, name)) => (Some(datastore.trim()), name.trim()),
            None => (None, name.trim()),
        };
        self.classes
            .iter()
            .map(|entry| &entry.class)
            .filter(|class| class.name().eq_ignore_ascii_case(name))
            .filter(|class| datastore.is_none_or(|ds| class.datastore().as_str() == ds))
            .cloned()
            .collect()
    }

    fn find_classes_by_model_name(&self, model_name: &str) -> Vec<ClassRef> {
        let model_name = model_name.trim();
        if model_name.is_empty() {
            return Vec::new();
        }
        self.classes
            .iter()
            .filter(|entry| entry.model_names.iter().any(|m| m.eq_ignore_ascii_case(model_name)))
            .map(|entry| entry.class.clone())
            .collect()
    }

    fn relationships(&self, class: &ClassRef) -> Vec<RelationshipEdge> {
        self.relationships
            .iter()
            .map(|entry| &entry.edge)
            .filter(|edge| edge.origin() == class || edge.destination() == class)
            .cloned()
            .collect()
    }

    fn scan<'a>(&'a self, class: &'a ClassRef, filter: &'a Filter) -> RowStream<'a> {
        self.counters.scans.fetch_add(1, Ordering::SeqCst);

        if self
            .failing_scans
            .read()
            .contains(&class.name().to_lowercase())
        {
            return failed_scan(
                BackendError::ScanFailed {
                    class: class.to_string(),
                    message: "injected failure".to_string(),
                }
                .into(),
            );
        }

        let Some(rows) = self.rows.get(class) else {
            return failed_scan(
                BackendError::UnknownClass {
                    backend_name: BACKEND_NAME.to_string(),
                    class: class.to_string(),
                }
                .into(),
            );
        };

        let compiled = match CompiledFilter::new(filter) {
            Ok(compiled) => compiled,
            Err(e) => return failed_scan(e),
        };

        let counters = Arc::clone(&self.counters);
        stream::iter(rows.values())
            .filter(move |row| futures::future::ready(compiled.matches(row)))
            .map(move |row| {
                counters.rows_yielded.fetch_add(1, Ordering::SeqCst);
                Ok(row.clone())
            })
            .boxed()
    }

    async fn related(&self, row: &Row, edge: &RelationshipEdge) -> EngineResult<Vec<Row>> {
        self.counters.related_calls.fetch_add(1, Ordering::SeqCst);

        if self
            .failing_relationships
            .read()
            .contains(&edge.name().to_lowercase())
        {
            return Err(BackendError::RelatedFetchFailed {
                class: row.class().to_string(),
                object_id: row.object_id().value(),
                relationship: edge.name().to_string(),
                message: "injected failure".to_string(),
            }
            .into());
        }

        let Some(entry) = self
            .relationships
            .iter()
            .find(|entry| entry.edge == *edge)
        else {
            return Ok(Vec::new());
        };

        let id = row.object_id();
        let mut seen: HashSet<(ClassRef, ObjectId)> = HashSet::new();
        let mut related = Vec::new();
        let mut push = |class: &ClassRef, other: ObjectId| {
            if let Some(found) = self.row(class, other) {
                if seen.insert((class.clone(), other)) {
                    related.push(found.clone());
                }
            }
        };

        if row.class() == edge.origin() {
            for (origin, destination) in &entry.pairs {
                if *origin == id {
                    push(edge.destination(), *destination);
                }
            }
        }
        if row.class() == edge.destination() {
            for (origin, destination) in &entry.pairs {
                if *destination == id {
                    push(edge.origin(), *origin);
                }
            }
        }

        Ok(related)
    }
}
