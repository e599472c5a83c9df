//! Expression compiler.
//!
//! Turns an item's searchable fields plus the request's keyword and operators
//! into a [`Filter`]. One predicate is produced per field and the predicates
//! are combined with the request's logical operator:
//!
//! | Logical operator | Filter                          |
//! |------------------|---------------------------------|
//! | `And`            | `(f1 op k) AND (f2 op k)`       |
//! | `Or`             | `(f1 op k) OR (f2 op k)`        |
//! | `Not`            | `NOT ((f1 op k) OR (f2 op k))`  |
//!
//! A missing result (`None`) means there is nothing to search: the caller
//! skips the scan.

use crate::types::{Filter, LiveLayer, LogicalOperator, SearchRequest, SearchableField, SearchableItem};

/// Compiles the keyword predicate over `fields`.
///
/// Returns `None` when there are no fields or the keyword is blank.
pub fn compile(fields: &[SearchableField], request: &SearchRequest) -> Option<Filter> {
    let keyword = request.trimmed_keyword();
    if keyword.is_empty() {
        return None;
    }

    let mut predicates: Vec<Filter> = fields
        .iter()
        .filter(|field| !field.name.trim().is_empty())
        .map(|field| Filter::compare(field.name.trim(), request.comparison_operator, keyword))
        .collect();

    if predicates.is_empty() {
        return None;
    }

    let combined = if predicates.len() == 1 {
        predicates.remove(0)
    } else {
        match request.logical_operator {
            LogicalOperator::And => Filter::all(predicates),
            LogicalOperator::Or | LogicalOperator::Not => Filter::any(predicates),
        }
    };

    Some(match request.logical_operator {
        LogicalOperator::Not => Filter::negate(combined),
        _ => combined,
    })
}

/// Compiles a top-level item against the live entry it resolved to.
///
/// Layer items with `use_layer_definition` set get the layer's definition
/// filter ANDed in; an empty definition is left out.
pub fn compile_item(
    item: &SearchableItem,
    layer: Option<&LiveLayer>,
    request: &SearchRequest,
) -> Option<Filter> {
    let filter = compile(&item.payload().fields, request)?;

    if !item.use_layer_definition() {
        return Some(filter);
    }

    match layer.and_then(LiveLayer::definition) {
        Some(definition) => Some(filter.and(definition.clone())),
        None => Some(filter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClassRef, ComparisonOperator};

    fn fields(names: &[&str]) -> Vec<SearchableField> {
        names.iter().map(|n| SearchableField::new(*n)).collect()
    }

    #[test]
    fn test_single_field_is_unwrapped() {
        let request = SearchRequest::new("X1").with_comparison(ComparisonOperator::Contains);
        let filter = compile(&fields(&["Name"]), &request).unwrap();
        assert_eq!(filter, Filter::compare("Name", ComparisonOperator::Contains, "X1"));
        assert_eq!(filter.to_string(), "Name LIKE '%X1%'");
    }

    #[test]
    fn test_or_combines_fields() {
        let request = SearchRequest::new("A9");
        let filter = compile(&fields(&["Name", "Tag"]), &request).unwrap();
        assert_eq!(filter.to_string(), "(Name = 'A9') OR (Tag = 'A9')");
    }

    #[test]
    fn test_and_combines_fields() {
        let request = SearchRequest::new("A9").with_logical(LogicalOperator::And);
        let filter = compile(&fields(&["Name", "Tag"]), &request).unwrap();
        assert_eq!(filter.to_string(), "(Name = 'A9') AND (Tag = 'A9')");
    }

    #[test]
    fn test_not_negates_the_disjunction() {
        let request = SearchRequest::new("A9").with_logical(LogicalOperator::Not);
        let filter = compile(&fields(&["Name", "Tag"]), &request).unwrap();
        assert_eq!(filter.to_string(), "NOT ((Name = 'A9') OR (Tag = 'A9'))");

        let single = compile(&fields(&["Name"]), &request).unwrap();
        assert_eq!(single.to_string(), "NOT (Name = 'A9')");
    }

    #[test]
    fn test_keyword_is_trimmed() {
        let request = SearchRequest::new("  X1 ");
        let filter = compile(&fields(&["Name"]), &request).unwrap();
        assert_eq!(filter.to_string(), "Name = 'X1'");
    }

    #[test]
    fn test_no_fields_or_blank_keyword_compiles_to_nothing() {
        assert!(compile(&[], &SearchRequest::new("X1")).is_none());
        assert!(compile(&fields(&["Name"]), &SearchRequest::new("   ")).is_none());
        assert!(compile(&fields(&[" "]), &SearchRequest::new("X1")).is_none());
    }

    #[test]
    fn test_layer_definition_is_anded_when_enabled() {
        let class = ClassRef::new("gis", "Pole");
        let layer = LiveLayer::layer("Poles", class).with_definition(Filter::compare(
            "Status",
            ComparisonOperator::Equals,
            "Active",
        ));
        let request = SearchRequest::new("X1");

        let item = SearchableItem::layer("Poles")
            .with_field(SearchableField::new("Name"))
            .with_layer_definition();
        let filter = compile_item(&item, Some(&layer), &request).unwrap();
        assert_eq!(filter.to_string(), "(Name = 'X1') AND (Status = 'Active')");

        let plain = SearchableItem::layer("Poles").with_field(SearchableField::new("Name"));
        let filter = compile_item(&plain, Some(&layer), &request).unwrap();
        assert_eq!(filter.to_string(), "Name = 'X1'");
    }

    #[test]
    fn test_empty_layer_definition_is_omitted() {
        let layer = LiveLayer::layer("Poles", ClassRef::new("gis", "Pole"))
            .with_definition(Filter::all(vec![]));
        let item = SearchableItem::layer("Poles")
            .with_field(SearchableField::new("Name"))
            .with_layer_definition();
        let filter = compile_item(&item, Some(&layer), &SearchRequest::new("X1")).unwrap();
        assert_eq!(filter.to_string(), "Name = 'X1'");
    }

    #[test]
    fn test_definition_alone_never_produces_a_filter() {
        let layer = LiveLayer::layer("Poles", ClassRef::new("gis", "Pole")).with_definition(
            Filter::compare("Status", ComparisonOperator::Equals, "Active"),
        );
        let item = SearchableItem::layer("Poles").with_layer_definition();
        assert!(compile_item(&item, Some(&layer), &SearchRequest::new("X1")).is_none());
    }
}
