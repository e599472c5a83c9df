//! Attach resolver.
//!
//! Walks a matched row back along its relationship path to the class of a
//! displayable layer and registers the row reached there. Each hop consumes
//! one path element, from the last toward the first, so the walk is at most
//! `path.len()` hops deep.

use futures::future::{BoxFuture, FutureExt};
use tracing::trace;

use crate::error::EngineResult;
use crate::types::{LiveLayer, RelationshipPath, Row};

use super::aggregator::Scope;
use super::context::SearchContext;

/// Attaches `row` by following `path[index]` from its class.
///
/// With `layer` unset, each candidate edge resolves its own layer (the live
/// layer over the edge's other end in the edge's datastore); a layer found
/// through one edge is never reused for a sibling edge. Edges with no
/// related rows or no resolvable layer are skipped. An empty path or an
/// out-of-range index is a no-op.
pub fn attach<'a>(
    ctx: &'a SearchContext,
    scope: Scope,
    row: Row,
    layer: Option<&'a LiveLayer>,
    path: &'a RelationshipPath,
    index: usize,
) -> BoxFuture<'a, EngineResult<()>> {
    async move {
        let Some(name) = path.get(index) else {
            return Ok(());
        };

        if ctx.should_stop(scope) {
            return Ok(());
        }

        let edges = ctx.graph().relationships(row.class());
        for edge in edges.iter().filter(|edge| edge.is_valid() && edge.matches(name)) {
            if ctx.should_stop(scope) {
                return Ok(());
            }

            let related = ctx.graph().related(&row, edge).await?;
            if related.is_empty() {
                continue;
            }

            let resolved = match layer {
                Some(layer) => layer,
                None => {
                    let resolved = edge
                        .opposite(row.class())
                        .and_then(|target| ctx.resolve_layer(target, edge));
                    match resolved {
                        Some(resolved) => resolved,
                        None => {
                            trace!(
                                class = %row.class(),
                                relationship = edge.name(),
                                "no layer to attach to"
                            );
                            continue;
                        }
                    }
                }
            };

            for object in related {
                if ctx.should_stop(scope) {
                    return Ok(());
                }

                if object.class() == resolved.class() {
                    ctx.register(scope, resolved.name(), object.object_id());
                } else if let Some(next) = index.checked_sub(1) {
                    attach(ctx, scope, object, Some(resolved), path, next).await?;
                }
            }
        }

        Ok(())
    }
    .boxed()
}
