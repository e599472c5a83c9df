//! Relationship traverser and leaf relationship search.
//!
//! The traverser walks the configured relationship tree against the live
//! schema graph. At every level each relationship node is matched against the edges of
//! the current class (by name, ignoring case, or by `*`); every matched edge
//! leads to the class at its other end, where the node's fields are
//! searched and its children become the next level.
//!
//! Sibling branches of one level run concurrently within the calling task.
//! Recursion depth is bounded by the configured tree, which is finite and
//! depth-checked at validation time, so a self-referential relationship
//! followed through `*` terminates when the tree runs out.

use futures::future::{BoxFuture, FutureExt, try_join_all};
use tracing::{debug, trace};

use crate::error::EngineResult;
use crate::types::{ClassRef, LiveLayer, RelationshipPath, SearchableRelationship};

use super::aggregator::Scope;
use super::attach::attach;
use super::compiler::compile;
use super::context::SearchContext;

/// Walks `specs` from `from_class`.
///
/// `prefix` is the path of the node the specs hang from (the root path for a
/// top-level item). Matches found along the way are attached back to
/// `from_layer`, or to whichever layer the attach walk resolves when no
/// layer is known.
pub fn traverse<'a>(
    ctx: &'a SearchContext,
    scope: Scope,
    from_class: &'a ClassRef,
    from_layer: Option<&'a LiveLayer>,
    specs: &'a [SearchableRelationship],
    prefix: &'a RelationshipPath,
) -> BoxFuture<'a, EngineResult<()>> {
    async move {
        if specs.is_empty() || ctx.should_stop(scope) {
            return Ok(());
        }

        let edges: Vec<_> = ctx
            .graph()
            .relationships(from_class)
            .into_iter()
            .filter(|edge| edge.is_valid())
            .collect();

        let mut branches = Vec::new();
        for spec in specs {
            let path = prefix.child(&spec.relationship_name);
            let mut matched = false;

            for edge in edges.iter().filter(|edge| edge.matches(&spec.relationship_name)) {
                let Some(target) = edge.opposite(from_class) else {
                    continue;
                };
                matched = true;
                trace!(
                    from = %from_class,
                    relationship = edge.name(),
                    target = %target,
                    path = %path,
                    "following relationship"
                );
                branches.push(branch(ctx, scope, target.clone(), from_layer, spec, path.clone()));
            }

            if !matched {
                trace!(
                    from = %from_class,
                    relationship = %spec.relationship_name,
                    "no matching relationship, skipping branch"
                );
            }
        }

        try_join_all(branches).await?;
        Ok(())
    }
    .boxed()
}

async fn branch<'a>(
    ctx: &'a SearchContext,
    scope: Scope,
    target: ClassRef,
    from_layer: Option<&'a LiveLayer>,
    spec: &'a SearchableRelationship,
    path: RelationshipPath,
) -> EngineResult<()> {
    if ctx.should_stop(scope) {
        return Ok(());
    }

    search_relationship(ctx, scope, &target, from_layer, spec, Some(&path)).await?;

    if ctx.should_stop(scope) {
        return Ok(());
    }

    traverse(ctx, scope, &target, from_layer, &spec.target.relationships, &path).await
}

/// Runs the leaf query of one relationship node at `class` and attaches
/// every matching row.
///
/// `owner_path` is the path from the owning top-level item down to this
/// node; without one, the node's own relationship name is the whole path.
/// A node without searchable fields, or a blank keyword, scans nothing.
pub async fn search_relationship(
    ctx: &SearchContext,
    scope: Scope,
    class: &ClassRef,
    owner_layer: Option<&LiveLayer>,
    relationship: &SearchableRelationship,
    owner_path: Option<&RelationshipPath>,
) -> EngineResult<()> {
    let Some(filter) = compile(&relationship.target.fields, ctx.request()) else {
        trace!(class = %class, relationship = %relationship.relationship_name, "nothing to search");
        return Ok(());
    };

    if ctx.should_stop(scope) {
        return Ok(());
    }

    let fallback;
    let path = match owner_path {
        Some(path) if !path.is_empty() => path,
        _ => {
            fallback = RelationshipPath::single(&relationship.relationship_name);
            &fallback
        }
    };

    debug!(class = %class, filter = %filter, path = %path, "searching related class");

    let mut rows = ctx.graph().scan(class, &filter);
    while !ctx.should_stop(scope) {
        let Some(row) = ctx.next_row(&mut rows).await else {
            break;
        };
        let row = row?;
        attach(ctx, scope, row, owner_layer, path, path.len().saturating_sub(1)).await?;
    }

    Ok(())
}
