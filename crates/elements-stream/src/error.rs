//! Error types for elements-stream
//!
//! Only upstream source failures are fatal to a pipeline run. Per-marker
//! enrichment failures are contained at the marker boundary and surface
//! as `Error` state chunks, not as [`StreamError`]s. Cancellation is a
//! normal, silent termination path.

/// Fatal pipeline errors, surfaced to the downstream consumer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// The upstream event source failed for a non-cancellation reason
    #[error("upstream source failed: {0}")]
    Upstream(String),

    /// The upstream read failed because the source was cancelled.
    /// Swallowed by the adapter, never forwarded downstream.
    #[error("stream aborted")]
    Aborted,
}

impl StreamError {
    /// Build an upstream failure from any displayable source error
    #[inline]
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    /// Whether this error is an artifact of cancellation
    #[inline]
    #[must_use]
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}
