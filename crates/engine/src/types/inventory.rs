//! The search inventory: packages, items, fields and relationship specs.
//!
//! Each top-level [`SearchableItem`] roots a tree of
//! [`SearchableRelationship`] specs. The tree is the traversal plan; it is
//! matched against the live schema graph at search time and never learned
//! from it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

use super::schema::LayerKind;

/// Relationship name that matches every relationship.
pub const WILDCARD: &str = "*";

/// Returns true if `name` matches the configured `pattern`: equal ignoring
/// ASCII case, or the pattern is the [`WILDCARD`].
pub fn name_matches(pattern: &str, name: &str) -> bool {
    pattern == WILDCARD || pattern.eq_ignore_ascii_case(name)
}

/// A named group of searchable items. Packages have no traversal semantics;
/// they only scope thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPackage {
    /// Package name.
    #[serde(default)]
    pub name: String,

    /// Items searched by this package.
    #[serde(default)]
    pub items: Vec<SearchableItem>,
}

impl SearchPackage {
    /// Creates an empty package.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    /// Adds an item.
    pub fn with_item(mut self, item: SearchableItem) -> Self {
        self.items.push(item);
        self
    }
}

/// A field eligible for the keyword match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchableField {
    /// Attribute name.
    pub name: String,

    /// Display alias.
    #[serde(default)]
    pub alias_name: String,
}

impl SearchableField {
    /// Creates a field.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias_name: String::new(),
        }
    }

    /// Sets the display alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias_name = alias.into();
        self
    }
}

/// The payload shared by tables, layers and relationship targets.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchableTable {
    /// Class (or layer) name.
    #[serde(default)]
    pub name: String,

    /// Display alias; doubles as the model name when
    /// `match_by_alias_as_model_name` is set.
    #[serde(default)]
    pub alias_name: String,

    /// Resolve live classes by model name instead of by name.
    #[serde(default)]
    pub match_by_alias_as_model_name: bool,

    /// Fields the keyword is compared against.
    #[serde(default)]
    pub fields: Vec<SearchableField>,

    /// Relationship specs followed from this class.
    #[serde(default)]
    pub relationships: Vec<SearchableRelationship>,
}

impl SearchableTable {
    /// Creates a payload with no fields or relationships.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns the name used for model-name resolution: the alias when set,
    /// otherwise the name.
    pub fn model_name(&self) -> &str {
        if self.alias_name.trim().is_empty() {
            &self.name
        } else {
            &self.alias_name
        }
    }

    /// Returns the depth of the relationship tree below this payload
    /// (0 when there are no relationship specs).
    pub fn relationship_depth(&self) -> usize {
        self.relationships
            .iter()
            .map(|r| 1 + r.target.relationship_depth())
            .max()
            .unwrap_or(0)
    }

    /// Returns the path of every relationship node below this payload,
    /// depth first, in configuration order.
    pub fn relationship_paths(&self) -> Vec<RelationshipPath> {
        let mut paths = Vec::new();
        collect_paths(&self.relationships, &RelationshipPath::root(), &mut paths);
        paths
    }

    pub(crate) fn validate_relationships(&self) -> Result<(), ValidationError> {
        for relationship in &self.relationships {
            if relationship.relationship_name.trim().is_empty() {
                return Err(ValidationError::MissingRelationshipName {
                    parent: self.name.clone(),
                });
            }
            relationship.target.validate_relationships()?;
        }
        Ok(())
    }
}

fn collect_paths(
    relationships: &[SearchableRelationship],
    prefix: &RelationshipPath,
    out: &mut Vec<RelationshipPath>,
) {
    for relationship in relationships {
        let path = prefix.child(&relationship.relationship_name);
        out.push(path.clone());
        collect_paths(&relationship.target.relationships, &path, out);
    }
}

/// A searchable layer: a table payload plus layer-only options.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchableLayer {
    /// Shared payload.
    #[serde(flatten)]
    pub table: SearchableTable,

    /// AND the live layer's definition filter into every query.
    #[serde(default)]
    pub use_layer_definition: bool,
}

/// A configured top-level searchable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SearchableItem {
    /// A standalone table.
    Table(SearchableTable),
    /// A feature layer.
    Layer(SearchableLayer),
}

impl SearchableItem {
    /// Creates a table item.
    pub fn table(name: impl Into<String>) -> Self {
        SearchableItem::Table(SearchableTable::new(name))
    }

    /// Creates a layer item.
    pub fn layer(name: impl Into<String>) -> Self {
        SearchableItem::Layer(SearchableLayer {
            table: SearchableTable::new(name),
            use_layer_definition: false,
        })
    }

    /// Returns the shared payload.
    pub fn payload(&self) -> &SearchableTable {
        match self {
            SearchableItem::Table(table) => table,
            SearchableItem::Layer(layer) => &layer.table,
        }
    }

    fn payload_mut(&mut self) -> &mut SearchableTable {
        match self {
            SearchableItem::Table(table) => table,
            SearchableItem::Layer(layer) => &mut layer.table,
        }
    }

    /// Returns the item name.
    pub fn name(&self) -> &str {
        &self.payload().name
    }

    /// Returns the kind of live entry this item resolves against.
    pub fn kind(&self) -> LayerKind {
        match self {
            SearchableItem::Table(_) => LayerKind::Table,
            SearchableItem::Layer(_) => LayerKind::Layer,
        }
    }

    /// Returns true if the live layer's definition filter applies.
    pub fn use_layer_definition(&self) -> bool {
        matches!(self, SearchableItem::Layer(layer) if layer.use_layer_definition)
    }

    /// Adds a field.
    pub fn with_field(mut self, field: SearchableField) -> Self {
        self.payload_mut().fields.push(field);
        self
    }

    /// Adds a relationship spec.
    pub fn with_relationship(mut self, relationship: SearchableRelationship) -> Self {
        self.payload_mut().relationships.push(relationship);
        self
    }

    /// Resolve by model name, using `alias` as the model name.
    pub fn with_model_name(mut self, alias: impl Into<String>) -> Self {
        let table = self.payload_mut();
        table.alias_name = alias.into();
        table.match_by_alias_as_model_name = true;
        self
    }

    /// Enables the layer definition filter. No effect on table items.
    pub fn with_layer_definition(mut self) -> Self {
        if let SearchableItem::Layer(layer) = &mut self {
            layer.use_layer_definition = true;
        }
        self
    }
}

/// A relationship spec: follow edges named `relationship_name` (or any edge
/// for `*`) and search the class at the other end with `target`'s fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchableRelationship {
    /// Relationship name or [`WILDCARD`].
    pub relationship_name: String,

    /// The searched payload at the other end; its relationships are the
    /// next traversal level.
    #[serde(flatten)]
    pub target: SearchableTable,
}

impl SearchableRelationship {
    /// Creates a spec following `relationship_name` to `target`.
    pub fn new(relationship_name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            relationship_name: relationship_name.into(),
            target: SearchableTable::new(target),
        }
    }

    /// Creates a spec following every relationship.
    pub fn wildcard(target: impl Into<String>) -> Self {
        Self::new(WILDCARD, target)
    }

    /// Returns true for the `*` spec.
    pub fn is_wildcard(&self) -> bool {
        self.relationship_name == WILDCARD
    }

    /// Adds a field searched at the target.
    pub fn with_field(mut self, field: SearchableField) -> Self {
        self.target.fields.push(field);
        self
    }

    /// Adds a child spec.
    pub fn with_relationship(mut self, relationship: SearchableRelationship) -> Self {
        self.target.relationships.push(relationship);
        self
    }
}

/// Relationship names from a top-level item down to one relationship node.
///
/// Paths are a pure function of the tree position: the traverser derives a
/// child path for every spec it follows instead of caching paths on nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipPath(Vec<String>);

impl RelationshipPath {
    /// The empty path of a top-level item.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// A one-element path.
    pub fn single(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// Returns this path extended by `name`.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut names = self.0.clone();
        names.push(name.into());
        Self(names)
    }

    /// Number of relationship hops.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the root path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the name at `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Returns the names.
    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for RelationshipPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl<S: Into<String>> FromIterator<S> for RelationshipPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
