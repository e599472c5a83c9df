//! The search orchestrator.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::{Semaphore, broadcast};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use crate::config::EngineConfig;
use crate::core::SchemaGraph;
use crate::error::{BackendError, EngineError, EngineResult};
use crate::types::{
    ClassRef, LayerKind, LiveLayer, RelationshipPath, SearchRequest, SearchResponse,
    SearchableItem,
};

use super::aggregator::Scope;
use super::compiler::compile_item;
use super::context::SearchContext;
use super::events::SearchEvent;
use super::traverser::traverse;

/// One resolved (item, live class) pair.
#[derive(Debug, Clone)]
struct Unit {
    scope: Scope,
    class: ClassRef,
    layer: Option<LiveLayer>,
    key: String,
}

/// Runs keyword searches against a schema graph.
///
/// The engine holds no per-search state; one engine can run any number of
/// searches, concurrently or not. Progress events of every search go to the
/// engine's broadcast channel (see [`subscribe`](Self::subscribe)).
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use linkfind_engine::backends::memory::MemoryGraph;
/// use linkfind_engine::types::{
///     SearchPackage, SearchRequest, SearchableField, SearchableItem, SearchableRelationship,
/// };
/// use linkfind_engine::{EngineConfig, SearchEngine};
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let graph = MemoryGraph::builder("gis")
///     .class("Pole", &[])
///     .class("Anchor", &[])
///     .relationship(1, "OwnsAnchor", "Pole", "Anchor")
///     .row("Pole", 2, json!({"Name": "P-2"}))
///     .row("Anchor", 7, json!({"Tag": "A9"}))
///     .relate("OwnsAnchor", 2, 7)
///     .layer("Pole", "Pole")
///     .build()?;
///
/// let request = SearchRequest::new("A9").with_package(SearchPackage::new("Electric").with_item(
///     SearchableItem::layer("Pole").with_relationship(
///         SearchableRelationship::new("OwnsAnchor", "Anchor").with_field(SearchableField::new("Tag")),
///     ),
/// ));
///
/// let engine = SearchEngine::with_config(Arc::new(graph), EngineConfig::sequential());
/// let response = engine.find(request).await?;
/// assert!(response.contains("Pole", 2));
/// assert!(response.get("Anchor").is_none());
/// # Ok(())
/// # }
/// ```
pub struct SearchEngine {
    graph: Arc<dyn SchemaGraph>,
    config: EngineConfig,
    events: broadcast::Sender<SearchEvent>,
}

impl SearchEngine {
    /// Creates an engine with the default configuration.
    pub fn new(graph: Arc<dyn SchemaGraph>) -> Self {
        Self::with_config(graph, EngineConfig::default())
    }

    /// Creates an engine with `config`.
    pub fn with_config(graph: Arc<dyn SchemaGraph>, config: EngineConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            graph,
            config,
            events,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the schema graph.
    pub fn graph(&self) -> &Arc<dyn SchemaGraph> {
        &self.graph
    }

    /// Subscribes to progress events of all subsequent searches.
    pub fn subscribe(&self) -> broadcast::Receiver<SearchEvent> {
        self.events.subscribe()
    }

    /// Runs `request` and returns the matches.
    ///
    /// Cancellation and threshold stops are not errors: the response holds
    /// whatever was registered before the stop and says so through its
    /// `cancelled` and `threshold_reached` flags.
    ///
    /// # Errors
    ///
    /// * [`EngineError::Validation`] if the request cannot be searched
    /// * [`EngineError::Backend`] if the schema graph fails a scan or fetch
    pub async fn find(&self, request: SearchRequest) -> EngineResult<SearchResponse> {
        self.find_with_cancellation(request, CancellationToken::new())
            .await
    }

    /// Runs `request`, stopping early when `cancel` fires.
    ///
    /// The search runs on a child of `cancel`: cancelling the caller's token
    /// stops the search, while the search's own timeout never cancels the
    /// caller's token.
    #[instrument(
        name = "find",
        skip_all,
        fields(keyword = %request.keyword, operator = ?request.comparison_operator)
    )]
    pub async fn find_with_cancellation(
        &self,
        request: SearchRequest,
        cancel: CancellationToken,
    ) -> EngineResult<SearchResponse> {
        request.validate(self.config.max_relationship_depth)?;

        let started = Instant::now();
        let timeout = request.timeout();
        let layers = layer_universe(self.graph.layers());
        let units = self.resolve_units(&request, &layers);

        let token = cancel.child_token();
        let ctx = SearchContext::new(Arc::clone(&self.graph), request)
            .with_layers(layers)
            .with_cancellation(token.clone())
            .with_events(self.events.clone());

        info!(
            search_id = %ctx.search_id(),
            packages = ctx.request().packages.len(),
            units = units.len(),
            timeout = %humantime::format_duration(timeout),
            parallel = self.config.parallel,
            "search started"
        );
        ctx.emit(SearchEvent::Started {
            search_id: ctx.search_id(),
            at: Utc::now(),
            units: units.len(),
        });

        let timer = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(timeout) => {
                        warn!(timeout = %humantime::format_duration(timeout), "search timed out");
                        token.cancel();
                    }
                    _ = token.cancelled() => {}
                }
            })
        };

        let outcome = if self.config.parallel {
            self.run_parallel(&ctx, units).await
        } else {
            run_sequential(&ctx, &units).await
        };

        timer.abort();
        outcome?;

        let cancelled = token.is_cancelled();
        let response = ctx.aggregator().snapshot(cancelled);
        let elapsed_ms = started.elapsed().as_millis().min(u64::MAX as u128) as u64;

        if cancelled {
            warn!(search_id = %ctx.search_id(), entries = response.len(), "search cancelled");
            ctx.emit(SearchEvent::Cancelled {
                search_id: ctx.search_id(),
                entries: response.len(),
            });
        }

        info!(
            search_id = %ctx.search_id(),
            entries = response.len(),
            keys = response.entries.len(),
            threshold_reached = response.threshold_reached,
            elapsed_ms,
            "search completed"
        );
        ctx.emit(SearchEvent::Completed {
            search_id: ctx.search_id(),
            entries: response.len(),
            elapsed_ms,
        });

        Ok(response)
    }

    /// Resolves every configured top-level item to the live classes it
    /// searches.
    ///
    /// Items match live entries of their own kind by entry name or class
    /// name, or, with `match_by_alias_as_model_name`, by the classes
    /// carrying the item's model name. Table items with no live entry of
    /// their kind fall back to bare classes. They register under the name of
    /// whatever live entry sits over the class, else under the class name.
    fn resolve_units(&self, request: &SearchRequest, layers: &[LiveLayer]) -> Vec<Unit> {
        let mut units = Vec::new();

        for (p, package) in request.packages.iter().enumerate() {
            for (i, item) in package.items.iter().enumerate() {
                let scope = Scope::new(p, i);
                let resolved = self.resolve_item(scope, item, layers);
                if resolved.is_empty() {
                    debug!(package = %package.name, item = item.name(), "item resolved to no live class");
                }
                units.extend(resolved);
            }
        }

        units
    }

    fn resolve_item(&self, scope: Scope, item: &SearchableItem, layers: &[LiveLayer]) -> Vec<Unit> {
        let table = item.payload();
        let by_model_name = table.match_by_alias_as_model_name;
        let model_classes = if by_model_name {
            self.graph.find_classes_by_model_name(table.model_name())
        } else {
            Vec::new()
        };

        let mut units: Vec<Unit> = Vec::new();
        for layer in layers.iter().filter(|layer| layer.kind() == item.kind()) {
            let hit = if by_model_name {
                model_classes.contains(layer.class())
            } else {
                layer.name().eq_ignore_ascii_case(&table.name)
                    || layer.class().name().eq_ignore_ascii_case(&table.name)
            };
            if hit && !units.iter().any(|unit| unit.class == *layer.class()) {
                units.push(Unit {
                    scope,
                    class: layer.class().clone(),
                    layer: Some(layer.clone()),
                    key: layer.name().to_string(),
                });
            }
        }

        if units.is_empty() && item.kind() == LayerKind::Table {
            let classes = if by_model_name {
                model_classes
            } else {
                self.graph.find_classes(&table.name)
            };
            for class in classes {
                if !units.iter().any(|unit| unit.class == class) {
                    // Attach resolves the live entry over the class, so direct
                    // matches must share its key.
                    let key = layers
                        .iter()
                        .find(|layer| *layer.class() == class)
                        .map(|layer| layer.name().to_string())
                        .unwrap_or_else(|| class.name().to_string());
                    units.push(Unit {
                        scope,
                        key,
                        class,
                        layer: None,
                    });
                }
            }
        }

        for unit in &units {
            debug!(
                item = item.name(),
                class = %unit.class,
                key = %unit.key,
                "resolved search unit"
            );
        }
        units
    }

    async fn run_parallel(&self, ctx: &SearchContext, units: Vec<Unit>) -> EngineResult<()> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut tasks: JoinSet<EngineResult<()>> = JoinSet::new();

        for unit in units {
            let ctx = ctx.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.map_err(|e| internal(e.to_string()))?;
                run_unit(&ctx, &unit).await
            });
        }

        let mut first_error: Option<EngineError> = None;
        while let Some(joined) = tasks.join_next().await {
            let result = joined.map_err(|e| internal(format!("search task failed: {}", e)));
            if let Err(err) = result.and_then(|r| r) {
                if first_error.is_none() {
                    warn!(error = %err, "search unit failed, cancelling remaining units");
                    ctx.cancellation().cancel();
                    first_error = Some(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

async fn run_sequential(ctx: &SearchContext, units: &[Unit]) -> EngineResult<()> {
    for unit in units {
        if ctx.is_cancelled() {
            break;
        }
        run_unit(ctx, unit).await?;
    }
    Ok(())
}

/// Runs one unit: the item's own leaf query with direct registration, then
/// the traversal of its relationship tree.
async fn run_unit(ctx: &SearchContext, unit: &Unit) -> EngineResult<()> {
    let scope = unit.scope;
    let Some(item) = ctx.item(scope) else {
        return Ok(());
    };

    if ctx.should_stop(scope) {
        trace!(class = %unit.class, "unit skipped, search already stopped for its scope");
        return Ok(());
    }

    ctx.emit(SearchEvent::UnitStarted {
        search_id: ctx.search_id(),
        package: scope.package,
        item: scope.item,
        class: unit.class.to_string(),
    });

    match compile_item(item, unit.layer.as_ref(), ctx.request()) {
        Some(filter) => {
            debug!(class = %unit.class, filter = %filter, "searching item");
            let mut rows = ctx.graph().scan(&unit.class, &filter);
            while !ctx.should_stop(scope) {
                let Some(row) = ctx.next_row(&mut rows).await else {
                    break;
                };
                let row = row?;
                ctx.register(scope, &unit.key, row.object_id());
            }
        }
        None => trace!(class = %unit.class, "item has nothing to search"),
    }

    traverse(
        ctx,
        scope,
        &unit.class,
        unit.layer.as_ref(),
        &item.payload().relationships,
        &RelationshipPath::root(),
    )
    .await?;

    ctx.emit(SearchEvent::UnitCompleted {
        search_id: ctx.search_id(),
        package: scope.package,
        item: scope.item,
        class: unit.class.to_string(),
    });
    Ok(())
}

/// Deduplicates live entries by underlying class; the first entry over a
/// class wins.
fn layer_universe(layers: Vec<LiveLayer>) -> Vec<LiveLayer> {
    let mut universe: Vec<LiveLayer> = Vec::with_capacity(layers.len());
    for layer in layers {
        if !universe.iter().any(|seen| seen.class() == layer.class()) {
            universe.push(layer);
        }
    }
    universe
}

fn internal(message: String) -> EngineError {
    BackendError::Internal {
        backend_name: "engine".to_string(),
        message,
        source: None,
    }
    .into()
}
