//! Stream processor
//!
//! The stateful orchestrator of a pipeline run. A single driver task
//! feeds events through [`StreamProcessor::process`]; the processor owns
//! the run buffer, assigns stable `el-<n>` identities in discovery
//! order, dispatches enrichments, and drains them on
//! [`StreamProcessor::flush`]. The buffer and bookkeeping are mutated
//! only by that driver task, so no locking is needed; enrichment tasks
//! touch the shared sink only.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use elements_core::{
    find_markers, parse_marker, ElementPart, ElementRegistry, StreamEvent,
};

use crate::dispatch::{spawn_enrichment, EnrichErrorHook};
use crate::sink::ChunkSink;

/// Per-run stream processor.
///
/// Create one per pipeline invocation; discard it when the run finishes
/// or is cancelled.
pub struct StreamProcessor<D> {
    registry: Arc<ElementRegistry<D>>,
    deps: Arc<D>,
    sink: Arc<dyn ChunkSink>,
    cancel: CancellationToken,
    on_enrich_error: Option<EnrichErrorHook>,
    /// Cumulative unscanned text; trimmed past the last completed marker
    buffer: String,
    /// Next identity counter, never reused
    next_id: usize,
    /// End offsets already resolved in the current buffer window
    resolved_ends: HashSet<usize>,
    /// In-flight enrichment tasks
    pending: JoinSet<()>,
}

impl<D> StreamProcessor<D>
where
    D: Send + Sync + 'static,
{
    /// Create a processor writing to `sink`, governed by `cancel`
    #[must_use]
    pub fn new(
        registry: Arc<ElementRegistry<D>>,
        deps: Arc<D>,
        sink: Arc<dyn ChunkSink>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            registry,
            deps,
            sink,
            cancel,
            on_enrich_error: None,
            buffer: String::new(),
            next_id: 0,
            resolved_ends: HashSet::new(),
            pending: JoinSet::new(),
        }
    }

    /// Attach an observability hook for enrichment failures
    #[must_use]
    pub fn with_error_hook(mut self, hook: EnrichErrorHook) -> Self {
        self.on_enrich_error = Some(hook);
        self
    }

    /// Process one incoming event.
    ///
    /// Every event is passed through to the sink unchanged. Text deltas
    /// additionally feed the scanner: each newly completed, validated
    /// marker gets a `Loading` chunk (emitted before its enrichment is
    /// dispatched) and a stable `el-<n>` identity.
    pub async fn process(&mut self, event: StreamEvent) {
        let delta = match &event {
            StreamEvent::TextDelta { delta, .. } => Some(delta.clone()),
            _ => None,
        };

        self.sink.write(event).await;

        if let Some(delta) = delta {
            self.ingest_delta(&delta).await;
        }
    }

    /// Number of enrichments still in flight
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drain the run.
    ///
    /// With `was_cancelled` set, pending enrichments are aborted and the
    /// call returns immediately; their outcomes are discarded. Otherwise
    /// every pending enrichment is awaited, so each dispatched marker
    /// has written its terminal chunk by the time this returns.
    pub async fn flush(&mut self, was_cancelled: bool) {
        if was_cancelled {
            tracing::debug!(pending = self.pending.len(), "aborting pending enrichments");
            self.pending.abort_all();
            return;
        }

        while let Some(joined) = self.pending.join_next().await {
            if let Err(err) = joined {
                if !err.is_cancelled() {
                    tracing::warn!(%err, "enrichment task panicked");
                }
            }
        }
    }

    async fn ingest_delta(&mut self, delta: &str) {
        self.buffer.push_str(delta);

        let matches = find_markers(&self.buffer);
        for marker in &matches {
            if self.resolved_ends.contains(&marker.end) {
                continue;
            }

            let Some(parsed) = parse_marker(marker, &self.registry) else {
                continue;
            };
            // Registered, or parse_marker would have returned None.
            let Some(definition) = self.registry.get(parsed.name()) else {
                continue;
            };

            let id = format!("el-{}", self.next_id);
            self.next_id += 1;
            tracing::debug!(%id, name = %parsed.name(), "marker discovered");

            let loading = ElementPart::Loading {
                name: parsed.name().to_string(),
                input: parsed.input.clone(),
            };
            self.sink.write(StreamEvent::element(id.clone(), loading)).await;

            spawn_enrichment(
                &mut self.pending,
                definition.clone(),
                parsed,
                id,
                self.deps.clone(),
                self.sink.clone(),
                self.cancel.clone(),
                self.on_enrich_error.clone(),
            );

            self.resolved_ends.insert(marker.end);
        }

        // Drop everything up to the last match (validated or not); the
        // recorded end offsets are relative to the old window.
        if let Some(last) = matches.last() {
            self.buffer.drain(..last.end);
            self.resolved_ends.clear();
        }
    }
}
