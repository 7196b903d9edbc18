//! Error types for elements-core
//!
//! Covers element registration failures and per-marker enrichment
//! failures. Scanner and validator misses are not errors (unknown or
//! malformed markers are silently ignored by design).

/// Errors raised while building element definitions or registries
#[derive(Debug, thiserror::Error)]
pub enum ElementError {
    /// Input or output schema document failed to compile
    #[error("invalid schema for element '{name}': {message}")]
    InvalidSchema {
        /// Element name
        name: String,
        /// Compiler message
        message: String,
    },

    /// Element name already registered
    #[error("duplicate element name: {0}")]
    DuplicateName(String),

    /// Element name contains characters outside `[A-Za-z0-9_]`
    #[error("invalid element name: {0}")]
    InvalidName(String),
}

/// Failure of a single marker's enrichment.
///
/// Contained at the marker boundary: the processor converts this into an
/// `Error` state chunk and never propagates it to the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    /// Enrichment function reported a failure
    #[error("{0}")]
    Failed(String),

    /// Enriched data did not satisfy the element's output schema
    #[error("output schema mismatch: {0}")]
    OutputSchema(String),

    /// Opaque failure from downstream dependencies
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EnrichError {
    /// Build a message-only enrichment failure
    #[inline]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrich_error_display() {
        let err = EnrichError::failed("enrich failed");
        assert_eq!(err.to_string(), "enrich failed");
    }

    #[test]
    fn output_schema_error_display() {
        let err = EnrichError::OutputSchema("\"title\" is a required property".to_string());
        assert!(err.to_string().starts_with("output schema mismatch"));
    }

    #[test]
    fn element_error_display() {
        let err = ElementError::DuplicateName("cite".to_string());
        assert_eq!(err.to_string(), "duplicate element name: cite");
    }
}
