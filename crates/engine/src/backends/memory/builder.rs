//! Fluent construction of a [`MemoryGraph`].

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::error::{BackendError, EngineResult};
use crate::types::{ClassRef, Filter, LayerKind, LiveLayer, ObjectId, RelationshipEdge, Row};

use super::backend::{ClassEntry, MemoryGraph, RelationshipEntry};

/// Builds a [`MemoryGraph`].
///
/// Class names are given either bare (`"Pole"`, in the builder's default
/// datastore) or qualified (`"archive:Pole"`). Everything referenced must be
/// declared with [`class`](Self::class) or [`relationship`](Self::relationship);
/// [`build`](Self::build) reports dangling references.
#[derive(Debug, Clone)]
pub struct MemoryGraphBuilder {
    default_datastore: String,
    classes: Vec<(String, Vec<String>)>,
    rows: Vec<(String, i64, Value)>,
    relationships: Vec<(i64, String, String, String)>,
    relations: Vec<(String, i64, i64)>,
    layers: Vec<(LayerKind, String, String, Option<Filter>)>,
}

impl MemoryGraphBuilder {
    pub(super) fn new(default_datastore: impl Into<String>) -> Self {
        Self {
            default_datastore: default_datastore.into(),
            classes: Vec::new(),
            rows: Vec::new(),
            relationships: Vec::new(),
            relations: Vec::new(),
            layers: Vec::new(),
        }
    }

    /// Declares a class with its model names.
    pub fn class(mut self, name: &str, model_names: &[&str]) -> Self {
        self.classes.push((
            name.to_string(),
            model_names.iter().map(|m| m.to_string()).collect(),
        ));
        self
    }

    /// Adds a row. `attributes` must be a JSON object.
    pub fn row(mut self, class: &str, object_id: i64, attributes: Value) -> Self {
        self.rows.push((class.to_string(), object_id, attributes));
        self
    }

    /// Declares a relationship class between two classes.
    pub fn relationship(mut self, id: i64, name: &str, origin: &str, destination: &str) -> Self {
        self.relationships.push((
            id,
            name.to_string(),
            origin.to_string(),
            destination.to_string(),
        ));
        self
    }

    /// Relates origin row `origin_id` to destination row `destination_id`
    /// through the relationship named `relationship`.
    pub fn relate(mut self, relationship: &str, origin_id: i64, destination_id: i64) -> Self {
        self.relations
            .push((relationship.to_string(), origin_id, destination_id));
        self
    }

    /// Adds a feature layer over `class`.
    pub fn layer(mut self, name: &str, class: &str) -> Self {
        self.layers
            .push((LayerKind::Layer, name.to_string(), class.to_string(), None));
        self
    }

    /// Adds a feature layer over `class` with a definition filter.
    pub fn layer_with_definition(mut self, name: &str, class: &str, definition: Filter) -> Self {
        self.layers.push((
            LayerKind::Layer,
            name.to_string(),
            class.to_string(),
            Some(definition),
        ));
        self
    }

    /// Adds a standalone table over `class`.
    pub fn table(mut self, name: &str, class: &str) -> Self {
        self.layers
            .push((LayerKind::Table, name.to_string(), class.to_string(), None));
        self
    }

    fn class_ref(&self, name: &str) -> ClassRef {
        match name.split_once(':') {
            Some((datastore, class)) => ClassRef::new(datastore.trim(), class.trim()),
            None => ClassRef::new(self.default_datastore.as_str(), name.trim()),
        }
    }

    fn declared(&self, entries: &[ClassEntry], name: &str) -> EngineResult<ClassRef> {
        let class = self.class_ref(name);
        if entries.iter().any(|entry| entry.class == class) {
            Ok(class)
        } else {
            Err(invalid(format!("class '{}' is not declared", class)))
        }
    }

    /// Resolves all references and builds the graph.
    pub fn build(self) -> EngineResult<MemoryGraph> {
        let mut classes: Vec<ClassEntry> = Vec::new();
        for (name, model_names) in &self.classes {
            let class = self.class_ref(name);
            if class.name().is_empty() {
                return Err(invalid("class with an empty name".to_string()));
            }
            if classes.iter().any(|entry| entry.class == class) {
                return Err(invalid(format!("class '{}' is declared twice", class)));
            }
            classes.push(ClassEntry {
                class,
                model_names: model_names.clone(),
            });
        }

        let mut rows: HashMap<ClassRef, BTreeMap<ObjectId, Row>> = classes
            .iter()
            .map(|entry| (entry.class.clone(), BTreeMap::new()))
            .collect();
        for (class, object_id, attributes) in &self.rows {
            let class = self.declared(&classes, class)?;
            let Value::Object(map) = attributes else {
                return Err(invalid(format!(
                    "attributes of {}/{} must be an object",
                    class, object_id
                )));
            };
            let attributes: HashMap<String, Value> =
                map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            let row = Row::new(class.clone(), *object_id, attributes);
            rows.entry(class).or_default().insert(ObjectId(*object_id), row);
        }

        let mut relationships: Vec<RelationshipEntry> = Vec::new();
        for (id, name, origin, destination) in &self.relationships {
            let edge = RelationshipEdge::new(
                *id,
                name.as_str(),
                self.declared(&classes, origin)?,
                self.declared(&classes, destination)?,
            );
            relationships.push(RelationshipEntry {
                edge,
                pairs: Vec::new(),
            });
        }

        for (name, origin_id, destination_id) in &self.relations {
            let entry = relationships
                .iter_mut()
                .find(|entry| entry.edge.name().eq_ignore_ascii_case(name))
                .ok_or_else(|| invalid(format!("relationship '{}' is not declared", name)))?;
            entry
                .pairs
                .push((ObjectId(*origin_id), ObjectId(*destination_id)));
        }

        let mut layers = Vec::new();
        for (kind, name, class, definition) in &self.layers {
            let class = self.declared(&classes, class)?;
            let layer = match kind {
                LayerKind::Layer => LiveLayer::layer(name.as_str(), class),
                LayerKind::Table => LiveLayer::table(name.as_str(), class),
            };
            layers.push(match definition {
                Some(definition) => layer.with_definition(definition.clone()),
                None => layer,
            });
        }

        Ok(MemoryGraph::from_parts(classes, rows, relationships, layers))
    }
}

fn invalid(message: String) -> crate::error::EngineError {
    BackendError::InvalidSchema { message }.into()
}
