//! Enrichment dispatch
//!
//! Runs one enrichment per discovered marker as an independent tokio
//! task, tracked in the processor's pending [`JoinSet`]. Each task's
//! failure is contained at the marker boundary: it becomes an `Error`
//! state chunk plus an observability hook call, never a pipeline fault.

use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use elements_core::{ElementDefinition, ElementPart, EnrichError, JsonObject, ParsedMarker, StreamEvent};

use crate::sink::ChunkSink;

/// Observability hook invoked with the raw error and the marker that
/// failed. Runs inside the enrichment task; it must not panic.
pub type EnrichErrorHook = Arc<dyn Fn(&EnrichError, &ParsedMarker) + Send + Sync>;

/// Spawn the enrichment for one validated marker.
///
/// The task writes exactly one terminal chunk (`Ready` or `Error`) for
/// `id`, unless `cancel` fires first, in which case the resolved outcome
/// is discarded: no chunk is written and the hook is not invoked.
pub(crate) fn spawn_enrichment<D>(
    pending: &mut JoinSet<()>,
    definition: Arc<ElementDefinition<D>>,
    parsed: ParsedMarker,
    id: String,
    deps: Arc<D>,
    sink: Arc<dyn ChunkSink>,
    cancel: CancellationToken,
    on_error: Option<EnrichErrorHook>,
) where
    D: Send + Sync + 'static,
{
    pending.spawn(async move {
        let outcome = run_enrichment(&definition, parsed.input.clone(), deps).await;

        if cancel.is_cancelled() {
            tracing::debug!(%id, "discarding enrichment outcome after cancellation");
            return;
        }

        match outcome {
            Ok(data) => {
                let part = ElementPart::Ready {
                    name: parsed.name().to_string(),
                    input: parsed.input,
                    data,
                };
                sink.write(StreamEvent::element(id, part)).await;
            }
            Err(err) => {
                tracing::warn!(%id, name = %parsed.name(), %err, "enrichment failed");
                let part = ElementPart::Error {
                    name: parsed.name().to_string(),
                    input: parsed.input.clone(),
                    error: err.to_string(),
                };
                sink.write(StreamEvent::element(id, part)).await;
                if let Some(hook) = on_error {
                    hook(&err, &parsed);
                }
            }
        }
    });
}

/// Invoke the element's enrichment function and, when an output schema
/// is declared, validate the enriched data against it before it can be
/// emitted as `Ready`.
async fn run_enrichment<D>(
    definition: &ElementDefinition<D>,
    input: JsonObject,
    deps: Arc<D>,
) -> Result<JsonObject, EnrichError> {
    let data = definition.enrich(input, deps).await?;
    definition.validate_output(&Value::Object(data.clone()))?;
    Ok(data)
}
