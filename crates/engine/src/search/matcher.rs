//! Value matcher.
//!
//! Evaluates a [`Filter`] against a [`Row`] in memory, the way a SQL engine
//! would evaluate the filter's where-clause form:
//!
//! - text comparisons ignore case
//! - `%` and `_` are the wildcards of `Like`/`NotLike`, and `Contains`,
//!   `StartsWith` and `EndsWith` wrap the keyword in `%`
//! - ordering and equality are numeric when both sides parse as numbers
//! - `In`/`NotIn` read the keyword as a set literal, `(a, 'b', 3)` or `a,b,3`
//! - a missing attribute or a JSON null is unknown, and unknown never
//!   matches, negated or not
//!
//! Patterns, numbers and set literals are prepared once in
//! [`CompiledFilter::new`]; evaluation does no parsing.

use std::cmp::Ordering;

use regex::Regex;
use serde_json::Value;

use crate::error::{BackendError, EngineResult};
use crate::types::{ComparisonOperator, Filter, Row};

/// A filter prepared for repeated evaluation.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    root: Node,
}

#[derive(Debug, Clone)]
enum Node {
    Always,
    Compare { field: String, test: Test },
    And(Vec<Node>),
    Or(Vec<Node>),
    Not(Box<Node>),
}

#[derive(Debug, Clone)]
enum Test {
    Pattern { regex: Regex, negated: bool },
    Equals { literal: Literal, negated: bool },
    Order { operator: ComparisonOperator, literal: Literal },
    Member { set: Vec<Literal>, negated: bool },
}

#[derive(Debug, Clone)]
struct Literal {
    text: String,
    number: Option<f64>,
}

impl Literal {
    fn new(raw: &str) -> Self {
        Self {
            text: raw.to_lowercase(),
            number: raw.trim().parse::<f64>().ok(),
        }
    }

    fn compare(&self, value: &Value) -> Ordering {
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match (number, self.number) {
            (Some(lhs), Some(rhs)) => lhs.partial_cmp(&rhs).unwrap_or(Ordering::Equal),
            _ => value_text(value).to_lowercase().cmp(&self.text),
        }
    }
}

impl CompiledFilter {
    /// Prepares `filter` for evaluation. An empty filter matches every row.
    pub fn new(filter: &Filter) -> EngineResult<Self> {
        Ok(Self {
            root: build(filter)?,
        })
    }

    /// Returns true if `row` satisfies the filter.
    pub fn matches(&self, row: &Row) -> bool {
        self.eval(row) == Some(true)
    }

    /// Evaluates with three-valued logic; `None` is SQL's unknown.
    pub fn eval(&self, row: &Row) -> Option<bool> {
        eval(&self.root, row)
    }
}

fn build(filter: &Filter) -> EngineResult<Node> {
    if filter.is_empty() {
        return Ok(Node::Always);
    }

    Ok(match filter {
        Filter::Compare {
            field,
            operator,
            value,
        } => Node::Compare {
            field: field.clone(),
            test: build_test(*operator, value)?,
        },
        Filter::And { filters } => Node::And(build_all(filters)?),
        Filter::Or { filters } => Node::Or(build_all(filters)?),
        Filter::Not { filter } => Node::Not(Box::new(build(filter)?)),
    })
}

fn build_all(filters: &[Filter]) -> EngineResult<Vec<Node>> {
    filters
        .iter()
        .filter(|f| !f.is_empty())
        .map(build)
        .collect()
}

fn build_test(operator: ComparisonOperator, value: &str) -> EngineResult<Test> {
    use ComparisonOperator::*;

    Ok(match operator {
        Like => Test::Pattern {
            regex: like_regex(value)?,
            negated: false,
        },
        NotLike => Test::Pattern {
            regex: like_regex(value)?,
            negated: true,
        },
        Contains => Test::Pattern {
            regex: like_regex(&format!("%{}%", value))?,
            negated: false,
        },
        StartsWith => Test::Pattern {
            regex: like_regex(&format!("{}%", value))?,
            negated: false,
        },
        EndsWith => Test::Pattern {
            regex: like_regex(&format!("%{}", value))?,
            negated: false,
        },
        Equals => Test::Equals {
            literal: Literal::new(value),
            negated: false,
        },
        NotEquals => Test::Equals {
            literal: Literal::new(value),
            negated: true,
        },
        LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => Test::Order {
            operator,
            literal: Literal::new(value),
        },
        In => Test::Member {
            set: parse_set(value).iter().map(|m| Literal::new(m)).collect(),
            negated: false,
        },
        NotIn => Test::Member {
            set: parse_set(value).iter().map(|m| Literal::new(m)).collect(),
            negated: true,
        },
    })
}

/// Translates a SQL `LIKE` pattern into an anchored, case-insensitive regex.
fn like_regex(pattern: &str) -> EngineResult<Regex> {
    let mut source = String::from("(?si)^");
    let mut literal = String::new();
    for ch in pattern.chars() {
        match ch {
            '%' | '_' => {
                source.push_str(&regex::escape(&literal));
                literal.clear();
                source.push_str(if ch == '%' { ".*" } else { "." });
            }
            _ => literal.push(ch),
        }
    }
    source.push_str(&regex::escape(&literal));
    source.push('$');

    Regex::new(&source).map_err(|e| {
        BackendError::InvalidFilter {
            message: format!("pattern '{}': {}", pattern, e),
        }
        .into()
    })
}

/// Splits a set literal into its members, honoring single and double quotes.
fn parse_set(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    let inner = trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(trimmed);

    let mut members = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut quoted = false;
    let mut chars = inner.chars().peekable();

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some(q), c) if c == q => {
                // '' inside a quoted member is an escaped quote
                if chars.peek() == Some(&q) {
                    current.push(q);
                    chars.next();
                } else {
                    quote = None;
                }
            }
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') if current.trim().is_empty() => {
                current.clear();
                quote = Some(ch);
                quoted = true;
            }
            (None, ',') => {
                push_member(&mut members, &current, quoted);
                current.clear();
                quoted = false;
            }
            (None, c) if quoted && c.is_whitespace() => {}
            (None, c) => current.push(c),
        }
    }
    push_member(&mut members, &current, quoted);
    members
}

fn push_member(members: &mut Vec<String>, raw: &str, quoted: bool) {
    let member = if quoted { raw.to_string() } else { raw.trim().to_string() };
    if quoted || !member.is_empty() {
        members.push(member);
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn eval(node: &Node, row: &Row) -> Option<bool> {
    match node {
        Node::Always => Some(true),
        Node::Compare { field, test } => {
            let value = row.attribute(field).filter(|v| !v.is_null())?;
            Some(eval_test(test, value))
        }
        Node::And(nodes) => {
            let mut unknown = false;
            for node in nodes {
                match eval(node, row) {
                    Some(false) => return Some(false),
                    None => unknown = true,
                    Some(true) => {}
                }
            }
            if unknown { None } else { Some(true) }
        }
        Node::Or(nodes) => {
            let mut unknown = false;
            for node in nodes {
                match eval(node, row) {
                    Some(true) => return Some(true),
                    None => unknown = true,
                    Some(false) => {}
                }
            }
            if unknown { None } else { Some(false) }
        }
        Node::Not(node) => eval(node, row).map(|b| !b),
    }
}

fn eval_test(test: &Test, value: &Value) -> bool {
    match test {
        Test::Pattern { regex, negated } => regex.is_match(&value_text(value)) != *negated,
        Test::Equals { literal, negated } => (literal.compare(value) == Ordering::Equal) != *negated,
        Test::Order { operator, literal } => {
            let ordering = literal.compare(value);
            match operator {
                ComparisonOperator::LessThan => ordering == Ordering::Less,
                ComparisonOperator::LessThanOrEqual => ordering != Ordering::Greater,
                ComparisonOperator::GreaterThan => ordering == Ordering::Greater,
                ComparisonOperator::GreaterThanOrEqual => ordering != Ordering::Less,
                _ => false,
            }
        }
        Test::Member { set, negated } => {
            set.iter().any(|m| m.compare(value) == Ordering::Equal) != *negated
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClassRef;
    use serde_json::json;
    use std::collections::HashMap;

    fn row(attributes: Value) -> Row {
        let attributes: HashMap<String, Value> = serde_json::from_value(attributes).unwrap();
        Row::new(ClassRef::new("gis", "Pole"), 1, attributes)
    }

    fn check(operator: ComparisonOperator, keyword: &str, value: Value) -> bool {
        let filter = Filter::compare("F", operator, keyword);
        CompiledFilter::new(&filter)
            .unwrap()
            .matches(&row(json!({ "F": value })))
    }

    #[test]
    fn test_pattern_operators() {
        assert!(check(ComparisonOperator::Contains, "x1", json!("P-X1-200")));
        assert!(!check(ComparisonOperator::Contains, "X2", json!("P-X1-200")));
        assert!(check(ComparisonOperator::StartsWith, "P-", json!("P-X1")));
        assert!(!check(ComparisonOperator::StartsWith, "X1", json!("P-X1")));
        assert!(check(ComparisonOperator::EndsWith, "X1", json!("P-X1")));
        assert!(check(ComparisonOperator::Like, "P_X%", json!("P-X1")));
        assert!(!check(ComparisonOperator::Like, "P_X", json!("P-X1")));
        assert!(check(ComparisonOperator::NotLike, "Q%", json!("P-X1")));
    }

    #[test]
    fn test_pattern_escapes_regex_metacharacters() {
        assert!(check(ComparisonOperator::Contains, "a.b", json!("xa.by")));
        assert!(!check(ComparisonOperator::Contains, "a.b", json!("xacby")));
        assert!(check(ComparisonOperator::Equals, "(1)", json!("(1)")));
    }

    #[test]
    fn test_equality_is_case_insensitive_and_numeric_aware() {
        assert!(check(ComparisonOperator::Equals, "active", json!("Active")));
        assert!(check(ComparisonOperator::Equals, "10", json!(10.0)));
        assert!(check(ComparisonOperator::NotEquals, "10", json!(11)));
        assert!(check(ComparisonOperator::Equals, "true", json!(true)));
    }

    #[test]
    fn test_ordering() {
        assert!(check(ComparisonOperator::LessThan, "10", json!(9)));
        assert!(!check(ComparisonOperator::LessThan, "10", json!("10")));
        assert!(check(ComparisonOperator::LessThanOrEqual, "10", json!("10")));
        // numeric, not lexicographic
        assert!(check(ComparisonOperator::GreaterThan, "9", json!(10)));
        assert!(check(ComparisonOperator::GreaterThanOrEqual, "b", json!("B")));
        assert!(check(ComparisonOperator::GreaterThan, "apple", json!("Banana")));
    }

    #[test]
    fn test_set_membership() {
        assert!(check(ComparisonOperator::In, "(1, 2, 3)", json!(2)));
        assert!(check(ComparisonOperator::In, "'A', 'B'", json!("b")));
        assert!(!check(ComparisonOperator::In, "A,B", json!("C")));
        assert!(check(ComparisonOperator::NotIn, "(A, B)", json!("C")));
        assert!(check(ComparisonOperator::In, "('O''Brien', 'x, y')", json!("x, y")));
    }

    #[test]
    fn test_parse_set() {
        assert_eq!(parse_set("(1, 'a b', \"c\")"), vec!["1", "a b", "c"]);
        assert_eq!(parse_set("x,,y"), vec!["x", "y"]);
        assert_eq!(parse_set(" 'A' , 'B' "), vec!["A", "B"]);
        assert_eq!(parse_set("('')"), vec![""]);
        assert_eq!(parse_set("('it''s')"), vec!["it's"]);
    }

    #[test]
    fn test_null_and_missing_never_match() {
        for operator in [
            ComparisonOperator::Equals,
            ComparisonOperator::NotEquals,
            ComparisonOperator::NotLike,
            ComparisonOperator::NotIn,
        ] {
            assert!(!check(operator, "x", Value::Null), "{:?}", operator);
        }

        let negated = Filter::negate(Filter::compare("Missing", ComparisonOperator::Equals, "x"));
        let compiled = CompiledFilter::new(&negated).unwrap();
        assert_eq!(compiled.eval(&row(json!({"F": "y"}))), None);
        assert!(!compiled.matches(&row(json!({"F": "y"}))));
    }

    #[test]
    fn test_three_valued_connectives() {
        let known_true = Filter::compare("F", ComparisonOperator::Equals, "a");
        let unknown = Filter::compare("Missing", ComparisonOperator::Equals, "a");
        let r = row(json!({"F": "a"}));

        let or = CompiledFilter::new(&Filter::any(vec![unknown.clone(), known_true.clone()])).unwrap();
        assert_eq!(or.eval(&r), Some(true));

        let and = CompiledFilter::new(&Filter::all(vec![unknown, known_true])).unwrap();
        assert_eq!(and.eval(&r), None);
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let compiled = CompiledFilter::new(&Filter::all(vec![])).unwrap();
        assert!(compiled.matches(&row(json!({}))));
    }

    #[test]
    fn test_field_lookup_ignores_case() {
        let filter = Filter::compare("name", ComparisonOperator::Equals, "P-1");
        let compiled = CompiledFilter::new(&filter).unwrap();
        assert!(compiled.matches(&row(json!({"NAME": "p-1"}))));
    }
}
