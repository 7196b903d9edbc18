//! Elements Core - Marker scanning, definitions, and validation
//!
//! The synchronous leaves of the marker enrichment pipeline:
//! - Scans text buffers for `@name{...}` markers, brace-depth matched
//! - Registers element definitions with JSON Schema validated inputs
//! - Validates marker payloads against their element's input schema
//! - Generates the prompt block advertising elements to the generator
//!
//! The asynchronous orchestration lives in `elements-stream`.
//!
//! # Example
//!
//! ```rust
//! use elements_core::{ElementDefinition, ElementRegistry, JsonObject, parse_markers};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), elements_core::ElementError> {
//! let mut registry = ElementRegistry::new();
//! registry.register(ElementDefinition::new(
//!     "cite",
//!     "Citation",
//!     json!({"type": "object", "properties": {"url": {"type": "string"}}, "required": ["url"]}),
//!     |input: JsonObject, _deps: Arc<()>| async move { Ok::<_, elements_core::EnrichError>(input) },
//! )?)?;
//!
//! let parsed = parse_markers("See @cite{\"url\":\"https://x.com\"}", &registry);
//! assert_eq!(parsed.len(), 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod element;
pub mod error;
pub mod prompt;
pub mod scanner;
pub mod types;
pub mod validator;

// Re-exports for convenience
pub use element::{ElementDefinition, ElementRegistry, Enrich};
pub use error::{ElementError, EnrichError};
pub use prompt::generate_element_prompt;
pub use scanner::{find_markers, has_partial_marker};
pub use types::{ElementPart, JsonObject, MarkerMatch, ParsedMarker, StreamEvent};
pub use validator::{parse_marker, parse_markers};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with elements
    pub use crate::{
        ElementDefinition, ElementPart, ElementRegistry, Enrich, EnrichError, JsonObject,
        MarkerMatch, ParsedMarker, StreamEvent,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
