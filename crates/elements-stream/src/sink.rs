//! Chunk sink seam
//!
//! The processor and its enrichment tasks write output events through a
//! [`ChunkSink`]. The adapter wires a channel-backed sink; tests use
//! [`MemorySink`] to capture emitted events in order.

use std::sync::Mutex;

use async_trait::async_trait;

use elements_core::{ElementPart, StreamEvent};

/// Where synthesized and passthrough events are written.
///
/// Must be safe to call both from the driver task and from completed
/// enrichment tasks; a write after cancellation is a silent no-op.
#[async_trait]
pub trait ChunkSink: Send + Sync {
    /// Write one event to the output sequence
    async fn write(&self, event: StreamEvent);
}

/// In-memory sink that records every written event, for tests
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<StreamEvent>>,
}

impl MemorySink {
    /// Create an empty sink
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every event written so far, in write order
    #[must_use]
    pub fn snapshot(&self) -> Vec<StreamEvent> {
        self.events.lock().expect("sink lock poisoned").clone()
    }

    /// Only the `data-element` events, as `(id, part)` pairs
    #[must_use]
    pub fn element_parts(&self) -> Vec<(String, ElementPart)> {
        self.snapshot()
            .into_iter()
            .filter_map(|event| match event {
                StreamEvent::DataElement { id, data } => Some((id, data)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ChunkSink for MemorySink {
    async fn write(&self, event: StreamEvent) {
        self.events.lock().expect("sink lock poisoned").push(event);
    }
}
