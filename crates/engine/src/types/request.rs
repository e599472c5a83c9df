//! Search request types.
//!
//! A [`SearchRequest`] is constructed by the caller and stays read-only for
//! the duration of one search. Its persisted form is a camelCase JSON
//! document; unknown keys are ignored so older readers accept newer files.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EngineResult, ValidationError};

use super::inventory::SearchPackage;

/// Default result-count threshold.
pub const DEFAULT_THRESHOLD: u32 = 200;

/// Default search timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// How a field value is compared with the keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonOperator {
    /// Equal.
    #[default]
    #[serde(alias = "=")]
    Equals,
    /// Not equal.
    #[serde(alias = "<>", alias = "!=")]
    NotEquals,
    /// SQL wildcard pattern (`%`, `_`) given by the keyword itself.
    Like,
    /// Keyword appears anywhere.
    Contains,
    /// Value starts with the keyword.
    StartsWith,
    /// Value ends with the keyword.
    EndsWith,
    /// Negated wildcard pattern.
    NotLike,
    /// Less than.
    #[serde(alias = "<")]
    LessThan,
    /// Less than or equal.
    #[serde(alias = "<=")]
    LessThanOrEqual,
    /// Greater than.
    #[serde(alias = ">")]
    GreaterThan,
    /// Greater than or equal.
    #[serde(alias = ">=")]
    GreaterThanOrEqual,
    /// Member of the set literal given by the keyword.
    In,
    /// Not a member of the set literal given by the keyword.
    NotIn,
}

impl ComparisonOperator {
    /// Returns true for operators evaluated by wildcard pattern matching.
    pub fn is_pattern(&self) -> bool {
        matches!(
            self,
            ComparisonOperator::Like
                | ComparisonOperator::NotLike
                | ComparisonOperator::Contains
                | ComparisonOperator::StartsWith
                | ComparisonOperator::EndsWith
        )
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonOperator::Equals => write!(f, "="),
            ComparisonOperator::NotEquals => write!(f, "<>"),
            ComparisonOperator::Like
            | ComparisonOperator::Contains
            | ComparisonOperator::StartsWith
            | ComparisonOperator::EndsWith => write!(f, "LIKE"),
            ComparisonOperator::NotLike => write!(f, "NOT LIKE"),
            ComparisonOperator::LessThan => write!(f, "<"),
            ComparisonOperator::LessThanOrEqual => write!(f, "<="),
            ComparisonOperator::GreaterThan => write!(f, ">"),
            ComparisonOperator::GreaterThanOrEqual => write!(f, ">="),
            ComparisonOperator::In => write!(f, "IN"),
            ComparisonOperator::NotIn => write!(f, "NOT IN"),
        }
    }
}

/// How the per-field predicates of one item are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum LogicalOperator {
    /// Every field must match.
    And,
    /// Any field may match.
    #[default]
    Or,
    /// No field may match.
    Not,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => write!(f, "AND"),
            LogicalOperator::Or => write!(f, "OR"),
            LogicalOperator::Not => write!(f, "NOT"),
        }
    }
}

/// The scope a threshold counts entries over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ThresholdConstraint {
    /// The whole request shares one count.
    #[default]
    #[serde(alias = "wholeRequest")]
    Request,
    /// Each package has its own count.
    Package,
    /// Each top-level item has its own count.
    Item,
}

impl fmt::Display for ThresholdConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdConstraint::Request => write!(f, "request"),
            ThresholdConstraint::Package => write!(f, "package"),
            ThresholdConstraint::Item => write!(f, "item"),
        }
    }
}

fn default_threshold() -> u32 {
    DEFAULT_THRESHOLD
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// A keyword search over a search inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// The keyword compared against every configured field.
    #[serde(default)]
    pub keyword: String,

    /// Field/keyword comparison.
    #[serde(default)]
    pub comparison_operator: ComparisonOperator,

    /// How field predicates of one item combine.
    #[serde(default)]
    pub logical_operator: LogicalOperator,

    /// Maximum number of entries per threshold scope; 0 disables the cap.
    #[serde(default = "default_threshold")]
    pub threshold: u32,

    /// The scope the threshold counts over.
    #[serde(default)]
    pub threshold_constraint: ThresholdConstraint,

    /// Hard timeout for the whole search.
    #[serde(default = "default_timeout_ms")]
    pub milliseconds_timeout: u64,

    /// The search inventory.
    #[serde(default)]
    pub packages: Vec<SearchPackage>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self::new("")
    }
}

impl SearchRequest {
    /// Creates a request with default operators, threshold and timeout.
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            comparison_operator: ComparisonOperator::default(),
            logical_operator: LogicalOperator::default(),
            threshold: DEFAULT_THRESHOLD,
            threshold_constraint: ThresholdConstraint::default(),
            milliseconds_timeout: DEFAULT_TIMEOUT_MS,
            packages: Vec::new(),
        }
    }

    /// Sets the comparison operator.
    pub fn with_comparison(mut self, operator: ComparisonOperator) -> Self {
        self.comparison_operator = operator;
        self
    }

    /// Sets the logical operator.
    pub fn with_logical(mut self, operator: LogicalOperator) -> Self {
        self.logical_operator = operator;
        self
    }

    /// Sets the threshold and its scope.
    pub fn with_threshold(mut self, threshold: u32, constraint: ThresholdConstraint) -> Self {
        self.threshold = threshold;
        self.threshold_constraint = constraint;
        self
    }

    /// Sets the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.milliseconds_timeout = timeout.as_millis().min(u64::MAX as u128) as u64;
        self
    }

    /// Adds a package to the inventory.
    pub fn with_package(mut self, package: SearchPackage) -> Self {
        self.packages.push(package);
        self
    }

    /// Returns the timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.milliseconds_timeout)
    }

    /// Returns the keyword with surrounding whitespace removed.
    pub fn trimmed_keyword(&self) -> &str {
        self.keyword.trim()
    }

    /// Returns the total number of top-level items.
    pub fn item_count(&self) -> usize {
        self.packages.iter().map(|p| p.items.len()).sum()
    }

    /// Reads a request from its persisted JSON form.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            ValidationError::MalformedRequest {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Writes the request in its persisted JSON form.
    pub fn to_json_pretty(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks that the request can be searched.
    ///
    /// Relationship trees deeper than `max_relationship_depth` are rejected
    /// here, before any traversal starts.
    pub fn validate(&self, max_relationship_depth: usize) -> Result<(), ValidationError> {
        if self.milliseconds_timeout == 0 {
            return Err(ValidationError::ZeroTimeout);
        }

        for package in &self.packages {
            for (index, item) in package.items.iter().enumerate() {
                let table = item.payload();
                if table.name.trim().is_empty() && table.model_name().trim().is_empty() {
                    return Err(ValidationError::MissingItemName {
                        package: package.name.clone(),
                        index,
                    });
                }

                table.validate_relationships()?;

                let depth = table.relationship_depth();
                if depth > max_relationship_depth {
                    return Err(ValidationError::RelationshipTooDeep {
                        item: table.name.clone(),
                        depth,
                        max: max_relationship_depth,
                    });
                }
            }
        }

        Ok(())
    }
}
