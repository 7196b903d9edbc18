//! Elements Stream - Streaming marker enrichment pipeline
//!
//! Detects `@name{...}` markers incrementally inside an arbitrarily
//! chunked event stream, validates their payloads, enriches them
//! concurrently out of band, and re-emits `loading`/`ready`/`error`
//! state chunks interleaved with the original stream, under cooperative
//! cancellation.
//!
//! # Example
//!
//! ```rust,ignore
//! use elements_stream::{element_stream, ElementStreamOptions};
//! use futures::StreamExt;
//! use std::sync::Arc;
//!
//! let output = element_stream(source, registry, deps, ElementStreamOptions::new());
//! tokio::pin!(output);
//! while let Some(event) = output.next().await {
//!     // passthrough events and data-element state chunks, in order
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod adapter;
pub mod dispatch;
pub mod error;
pub mod processor;
pub mod sink;

// Re-exports for convenience
pub use adapter::{element_stream, ElementStreamOptions};
pub use dispatch::EnrichErrorHook;
pub use error::StreamError;
pub use processor::StreamProcessor;
pub use sink::{ChunkSink, MemorySink};

// Re-export the core surface so pipeline users need one import
pub use elements_core::{
    ElementDefinition, ElementPart, ElementRegistry, Enrich, EnrichError, JsonObject,
    ParsedMarker, StreamEvent,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
