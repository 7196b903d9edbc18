//! Stream adapter
//!
//! Wraps an upstream event source and a cancellation token into a single
//! downstream event sequence, with one [`StreamProcessor`] pumped in
//! between by a spawned driver task. Cancellation flows both ways:
//! dropping the downstream stream (or firing the external token) stops
//! emission, cancels the upstream source, and abandons in-flight
//! enrichments without awaiting them.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use elements_core::{ElementRegistry, EnrichError, ParsedMarker, StreamEvent};

use crate::dispatch::EnrichErrorHook;
use crate::error::StreamError;
use crate::processor::StreamProcessor;
use crate::sink::ChunkSink;

const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Construction options for [`element_stream`]
pub struct ElementStreamOptions {
    cancel: Option<CancellationToken>,
    on_enrich_error: Option<EnrichErrorHook>,
    channel_capacity: usize,
}

impl Default for ElementStreamOptions {
    fn default() -> Self {
        Self {
            cancel: None,
            on_enrich_error: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl ElementStreamOptions {
    /// Create options with defaults
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// External cancellation signal; firing it behaves exactly like the
    /// downstream consumer dropping the stream
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Observability hook for per-marker enrichment failures
    #[must_use]
    pub fn with_error_hook(
        mut self,
        hook: impl Fn(&EnrichError, &ParsedMarker) + Send + Sync + 'static,
    ) -> Self {
        self.on_enrich_error = Some(Arc::new(hook));
        self
    }

    /// Output channel capacity (backpressure bound)
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }
}

/// Wire an upstream event source through a marker enrichment processor.
///
/// Pumps upstream events in order until the source ends, then drains all
/// in-flight enrichments (`flush(false)`) and closes the output. If the
/// consumer drops the returned stream or the external token fires,
/// emission stops promptly: the upstream source is dropped, pending
/// enrichments are abandoned, and the output closes without error.
/// Upstream `Aborted` errors are swallowed as cancellation artifacts;
/// any other upstream error is forwarded to the consumer as a fault.
pub fn element_stream<D, S>(
    source: S,
    registry: Arc<ElementRegistry<D>>,
    deps: Arc<D>,
    options: ElementStreamOptions,
) -> ReceiverStream<Result<StreamEvent, StreamError>>
where
    D: Send + Sync + 'static,
    S: Stream<Item = Result<StreamEvent, StreamError>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(options.channel_capacity);
    let cancel = options.cancel.unwrap_or_default();

    let sink = Arc::new(ChannelSink {
        tx: tx.clone(),
        cancel: cancel.clone(),
    });

    let mut processor = StreamProcessor::new(registry, deps, sink, cancel.clone());
    if let Some(hook) = options.on_enrich_error {
        processor = processor.with_error_hook(hook);
    }

    tokio::spawn(drive(source, processor, cancel, tx));

    ReceiverStream::new(rx)
}

/// Driver task: pump upstream events through the processor, then drain.
async fn drive<D, S>(
    source: S,
    mut processor: StreamProcessor<D>,
    cancel: CancellationToken,
    tx: mpsc::Sender<Result<StreamEvent, StreamError>>,
) where
    D: Send + Sync + 'static,
    S: Stream<Item = Result<StreamEvent, StreamError>> + Send + 'static,
{
    tokio::pin!(source);

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                tracing::debug!("element stream cancelled while pumping");
                processor.flush(true).await;
                return;
            }
            item = source.next() => match item {
                None => break,
                Some(Ok(event)) => processor.process(event).await,
                Some(Err(err)) if err.is_abort() => {
                    tracing::debug!("upstream abort swallowed as cancellation");
                    cancel.cancel();
                    processor.flush(true).await;
                    return;
                }
                Some(Err(err)) => {
                    tracing::warn!(%err, "upstream source failed");
                    let _ = tx.send(Err(err)).await;
                    cancel.cancel();
                    processor.flush(true).await;
                    return;
                }
            }
        }
    }

    // Upstream complete: wait for in-flight enrichments, unless the
    // consumer cancels mid-drain.
    let cancelled = tokio::select! {
        () = cancel.cancelled() => true,
        () = processor.flush(false) => false,
    };
    if cancelled {
        tracing::debug!("element stream cancelled while draining");
        processor.flush(true).await;
    }
}

/// Channel-backed sink shared by the driver and enrichment tasks.
///
/// Suppresses writes once cancelled, and converts a closed channel
/// (downstream consumer gone) into a cancellation.
struct ChannelSink {
    tx: mpsc::Sender<Result<StreamEvent, StreamError>>,
    cancel: CancellationToken,
}

#[async_trait]
impl ChunkSink for ChannelSink {
    async fn write(&self, event: StreamEvent) {
        if self.cancel.is_cancelled() {
            return;
        }

        tokio::select! {
            () = self.cancel.cancelled() => {}
            sent = self.tx.send(Ok(event)) => {
                if sent.is_err() {
                    tracing::debug!("downstream receiver dropped; cancelling run");
                    self.cancel.cancel();
                }
            }
        }
    }
}
