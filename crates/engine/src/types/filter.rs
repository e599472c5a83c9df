//! Filter expressions.
//!
//! A [`Filter`] is the predicate object the expression compiler produces and
//! a [`SchemaGraph`](crate::core::SchemaGraph) scans with. Its `Display`
//! form is a SQL where-clause, which is what data sources backed by a SQL
//! engine push down and what the engine logs.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::request::ComparisonOperator;

/// A boolean filter over the attributes of one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Filter {
    /// `field <operator> value`.
    Compare {
        /// Attribute name.
        field: String,
        /// Comparison operator.
        operator: ComparisonOperator,
        /// Right-hand literal (a set literal for `in`/`notIn`).
        value: String,
    },
    /// All sub-filters must match.
    And {
        /// Conjuncts.
        filters: Vec<Filter>,
    },
    /// At least one sub-filter must match.
    Or {
        /// Disjuncts.
        filters: Vec<Filter>,
    },
    /// The sub-filter must not match.
    Not {
        /// Negated filter.
        filter: Box<Filter>,
    },
}

impl Filter {
    /// Creates a comparison.
    pub fn compare(
        field: impl Into<String>,
        operator: ComparisonOperator,
        value: impl Into<String>,
    ) -> Self {
        Filter::Compare {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Creates a conjunction.
    pub fn all(filters: Vec<Filter>) -> Self {
        Filter::And { filters }
    }

    /// Creates a disjunction.
    pub fn any(filters: Vec<Filter>) -> Self {
        Filter::Or { filters }
    }

    /// Creates a negation.
    pub fn negate(filter: Filter) -> Self {
        Filter::Not {
            filter: Box::new(filter),
        }
    }

    /// Returns true if the filter has no predicates at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Filter::Compare { .. } => false,
            Filter::And { filters } | Filter::Or { filters } => filters.iter().all(Filter::is_empty),
            Filter::Not { filter } => filter.is_empty(),
        }
    }

    /// Combines with another filter using AND. Empty operands are dropped
    /// rather than conjoined.
    pub fn and(self, other: Filter) -> Filter {
        match (self.is_empty(), other.is_empty()) {
            (true, _) => other,
            (false, true) => self,
            (false, false) => Filter::all(vec![self, other]),
        }
    }

    /// Returns the attribute names the filter reads, in order of appearance.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Filter::Compare { field, .. } => {
                if !out.contains(&field.as_str()) {
                    out.push(field);
                }
            }
            Filter::And { filters } | Filter::Or { filters } => {
                for filter in filters {
                    filter.collect_fields(out);
                }
            }
            Filter::Not { filter } => filter.collect_fields(out),
        }
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn set_literal(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.starts_with('(') && trimmed.ends_with(')') {
        trimmed.to_string()
    } else {
        format!("({})", trimmed)
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, filters: &[Filter], joiner: &str) -> fmt::Result {
    let parts: Vec<&Filter> = filters.iter().filter(|f| !f.is_empty()).collect();
    if parts.len() == 1 {
        return write!(f, "{}", parts[0]);
    }
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", joiner)?;
        }
        write!(f, "({})", part)?;
    }
    Ok(())
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Compare {
                field,
                operator,
                value,
            } => match operator {
                ComparisonOperator::Contains => write!(f, "{} LIKE {}", field, quote(&format!("%{}%", value))),
                ComparisonOperator::StartsWith => write!(f, "{} LIKE {}", field, quote(&format!("{}%", value))),
                ComparisonOperator::EndsWith => write!(f, "{} LIKE {}", field, quote(&format!("%{}", value))),
                ComparisonOperator::In | ComparisonOperator::NotIn => {
                    write!(f, "{} {} {}", field, operator, set_literal(value))
                }
                _ => write!(f, "{} {} {}", field, operator, quote(value)),
            },
            Filter::And { filters } => write_joined(f, filters, "AND"),
            Filter::Or { filters } => write_joined(f, filters, "OR"),
            Filter::Not { filter } => write!(f, "NOT ({})", filter),
        }
    }
}
