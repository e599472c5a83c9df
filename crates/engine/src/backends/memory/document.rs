//! JSON schema document for the in-memory graph.
//!
//! ```json
//! {
//!   "datastore": "gis",
//!   "classes": [
//!     { "name": "Pole", "modelNames": ["POLE"],
//!       "rows": [ { "objectId": 2, "Name": "P-X1" } ] },
//!     { "name": "Pole", "datastore": "archive" }
//!   ],
//!   "relationships": [
//!     { "id": 1, "name": "OwnsAnchor", "origin": "Pole", "destination": "Anchor",
//!       "pairs": [[2, 7]] }
//!   ],
//!   "layers": [
//!     { "name": "Poles", "class": "Pole", "kind": "layer",
//!       "definition": { "op": "compare", "field": "Status", "operator": "equals", "value": "Active" } }
//!   ]
//! }
//! ```
//!
//! Rows carry `objectId` next to their attributes. Class references in
//! relationships and layers are bare names in the document's datastore or
//! `datastore:name`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Filter, LayerKind};

use super::builder::MemoryGraphBuilder;

fn default_datastore() -> String {
    "default".to_string()
}

/// A schema document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    /// Datastore of classes that do not name their own.
    #[serde(default = "default_datastore")]
    pub datastore: String,

    /// Classes and their rows.
    #[serde(default)]
    pub classes: Vec<ClassDocument>,

    /// Relationship classes and their related pairs.
    #[serde(default)]
    pub relationships: Vec<RelationshipDocument>,

    /// Displayable layers and tables.
    #[serde(default)]
    pub layers: Vec<LayerDocument>,
}

/// A class in a schema document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDocument {
    /// Class name.
    pub name: String,

    /// Datastore, if not the document's.
    #[serde(default)]
    pub datastore: Option<String>,

    /// Model names assigned to the class.
    #[serde(default)]
    pub model_names: Vec<String>,

    /// Rows of the class.
    #[serde(default)]
    pub rows: Vec<RowDocument>,
}

/// A row in a schema document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowDocument {
    /// Object id.
    pub object_id: i64,

    /// Attribute values.
    #[serde(flatten)]
    pub attributes: HashMap<String, Value>,
}

/// A relationship class in a schema document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipDocument {
    /// Relationship class id.
    pub id: i64,

    /// Relationship name.
    pub name: String,

    /// Origin class reference.
    pub origin: String,

    /// Destination class reference.
    pub destination: String,

    /// Related (origin object id, destination object id) pairs.
    #[serde(default)]
    pub pairs: Vec<(i64, i64)>,
}

/// A layer or table in a schema document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDocument {
    /// Display name.
    pub name: String,

    /// Class reference.
    pub class: String,

    /// Layer or table.
    #[serde(default)]
    pub kind: LayerKind,

    /// Definition filter.
    #[serde(default)]
    pub definition: Option<Filter>,
}

impl SchemaDocument {
    pub(super) fn into_builder(self) -> MemoryGraphBuilder {
        let mut builder = MemoryGraphBuilder::new(self.datastore);

        for class in self.classes {
            let name = match &class.datastore {
                Some(datastore) => format!("{}:{}", datastore, class.name),
                None => class.name.clone(),
            };
            let model_names: Vec<&str> = class.model_names.iter().map(String::as_str).collect();
            builder = builder.class(&name, &model_names);
            for row in class.rows {
                let attributes: serde_json::Map<String, Value> = row.attributes.into_iter().collect();
                builder = builder.row(&name, row.object_id, Value::Object(attributes));
            }
        }

        for relationship in self.relationships {
            builder = builder.relationship(
                relationship.id,
                &relationship.name,
                &relationship.origin,
                &relationship.destination,
            );
            for (origin, destination) in relationship.pairs {
                builder = builder.relate(&relationship.name, origin, destination);
            }
        }

        for layer in self.layers {
            builder = match (layer.kind, layer.definition) {
                (LayerKind::Table, _) => builder.table(&layer.name, &layer.class),
                (LayerKind::Layer, Some(definition)) => {
                    builder.layer_with_definition(&layer.name, &layer.class, definition)
                }
                (LayerKind::Layer, None) => builder.layer(&layer.name, &layer.class),
            };
        }

        builder
    }
}

#[cfg(test)]
mod tests {
    use super::super::MemoryGraph;
    use crate::core::SchemaGraph;
    use crate::types::{ClassRef, LayerKind};

    const DOCUMENT: &str = r#"{
        "datastore": "gis",
        "classes": [
            { "name": "Pole", "modelNames": ["POLE"],
              "rows": [ { "objectId": 2, "Name": "P-X1" }, { "objectId": 3, "Name": null } ] },
            { "name": "Anchor", "rows": [ { "objectId": 7, "Tag": "A9" } ] },
            { "name": "Pole", "datastore": "archive" }
        ],
        "relationships": [
            { "id": 1, "name": "OwnsAnchor", "origin": "Pole", "destination": "Anchor",
              "pairs": [[2, 7]] }
        ],
        "layers": [
            { "name": "Poles", "class": "Pole",
              "definition": { "op": "compare", "field": "Status", "operator": "=", "value": "Active" } },
            { "name": "Archive", "class": "archive:Pole", "kind": "table" }
        ],
        "generator": "ignored"
    }"#;

    #[test]
    fn test_document_loads() {
        let graph = MemoryGraph::from_json(DOCUMENT).unwrap();
        assert_eq!(graph.find_classes("Pole").len(), 2);
        assert_eq!(graph.row_count(&ClassRef::new("gis", "Pole")), 2);
        assert_eq!(graph.relationships(&ClassRef::new("gis", "Anchor")).len(), 1);

        let layers = graph.layers();
        assert_eq!(layers.len(), 2);
        assert!(layers[0].definition().is_some());
        assert_eq!(layers[1].kind(), LayerKind::Table);
        assert_eq!(layers[1].class(), &ClassRef::new("archive", "Pole"));
    }

    #[test]
    fn test_malformed_document_is_invalid_schema() {
        let err = MemoryGraph::from_json("{\"classes\": 3}").unwrap_err();
        assert!(err.to_string().starts_with("invalid schema"));
    }
}
