//! Schema graph value types.
//!
//! These types describe what a [`SchemaGraph`](crate::core::SchemaGraph)
//! exposes: classes living in datastores, named relationship edges between
//! them, rows of a class, and the displayable layers/tables the search
//! results are keyed by. The engine never mutates any of them.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::filter::Filter;
use super::inventory::name_matches;

/// Identifier of a row within its class (an object id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub i64);

impl ObjectId {
    /// Returns the raw id.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ObjectId {
    fn from(id: i64) -> Self {
        ObjectId(id)
    }
}

/// Identifier of a connected datastore (a database/workspace).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatastoreId(String);

impl DatastoreId {
    /// Creates a datastore id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatastoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A class (table or feature class) in a datastore.
///
/// Two classes are the same class only when both name and datastore match;
/// a same-named class in another datastore is a different class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassRef {
    name: String,
    datastore: DatastoreId,
}

impl ClassRef {
    /// Creates a class reference.
    pub fn new(datastore: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            datastore: DatastoreId::new(datastore),
        }
    }

    /// Returns the class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the datastore the class lives in.
    pub fn datastore(&self) -> &DatastoreId {
        &self.datastore
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.datastore, self.name)
    }
}

/// A named relationship between two classes.
///
/// Edges are directionless for traversal: the engine always asks for the
/// [`opposite`](Self::opposite) endpoint relative to the class it stands on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    id: i64,
    name: String,
    origin: ClassRef,
    destination: ClassRef,
}

impl RelationshipEdge {
    /// Creates an edge between `origin` and `destination`.
    pub fn new(id: i64, name: impl Into<String>, origin: ClassRef, destination: ClassRef) -> Self {
        Self {
            id,
            name: name.into(),
            origin,
            destination,
        }
    }

    /// Returns the relationship class id.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Returns the relationship name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the origin class.
    pub fn origin(&self) -> &ClassRef {
        &self.origin
    }

    /// Returns the destination class.
    pub fn destination(&self) -> &ClassRef {
        &self.destination
    }

    /// Returns the datastore the relationship lives in.
    pub fn datastore(&self) -> &DatastoreId {
        self.origin.datastore()
    }

    /// Returns true if the edge has a usable identity.
    ///
    /// Data sources report unregistered or broken relationship classes with
    /// a negative id or a blank name; those edges are never followed.
    pub fn is_valid(&self) -> bool {
        self.id >= 0 && !self.name.trim().is_empty()
    }

    /// Returns true if this is a relationship of a class with itself.
    pub fn is_self_referential(&self) -> bool {
        self.origin == self.destination
    }

    /// Returns the endpoint opposite to `from`, or `None` if `from` is not
    /// an endpoint of this edge.
    pub fn opposite(&self, from: &ClassRef) -> Option<&ClassRef> {
        if *from == self.origin {
            Some(&self.destination)
        } else if *from == self.destination {
            Some(&self.origin)
        } else {
            None
        }
    }

    /// Returns true if this edge matches a relationship spec name
    /// (case-insensitive, or the `*` wildcard).
    pub fn matches(&self, spec_name: &str) -> bool {
        name_matches(spec_name, &self.name)
    }
}

/// A row of a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    class: ClassRef,
    object_id: ObjectId,
    attributes: HashMap<String, Value>,
}

impl Row {
    /// Creates a row.
    pub fn new(class: ClassRef, object_id: impl Into<ObjectId>, attributes: HashMap<String, Value>) -> Self {
        Self {
            class,
            object_id: object_id.into(),
            attributes,
        }
    }

    /// Returns the class the row belongs to.
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// Returns the row's object id.
    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    /// Returns all attributes.
    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }

    /// Looks up an attribute by field name. Field names are case-insensitive.
    pub fn attribute(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field).or_else(|| {
            self.attributes
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(field))
                .map(|(_, value)| value)
        })
    }
}

/// Whether a live entry is a spatial layer or a standalone table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// A feature layer.
    #[default]
    Layer,
    /// A standalone table.
    Table,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerKind::Layer => write!(f, "layer"),
            LayerKind::Table => write!(f, "table"),
        }
    }
}

/// A displayable layer or standalone table; search results are keyed by
/// its name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveLayer {
    name: String,
    class: ClassRef,
    kind: LayerKind,
    definition: Option<Filter>,
}

impl LiveLayer {
    /// Creates a feature layer over `class`.
    pub fn layer(name: impl Into<String>, class: ClassRef) -> Self {
        Self {
            name: name.into(),
            class,
            kind: LayerKind::Layer,
            definition: None,
        }
    }

    /// Creates a standalone table over `class`.
    pub fn table(name: impl Into<String>, class: ClassRef) -> Self {
        Self {
            name: name.into(),
            class,
            kind: LayerKind::Table,
            definition: None,
        }
    }

    /// Sets the definition filter (the layer's own row restriction).
    pub fn with_definition(mut self, definition: Filter) -> Self {
        self.definition = Some(definition);
        self
    }

    /// Returns the display name (the response key).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the underlying class.
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// Returns the entry kind.
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Returns the definition filter, if a non-empty one is set.
    pub fn definition(&self) -> Option<&Filter> {
        self.definition.as_ref().filter(|f| !f.is_empty())
    }
}
