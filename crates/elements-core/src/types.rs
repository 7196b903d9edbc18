//! Core data model for the marker enrichment pipeline
//!
//! Wire-level shapes (`StreamEvent`, `ElementPart`) and the intermediate
//! scanner/validator types (`MarkerMatch`, `ParsedMarker`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON object payload, as carried by marker inputs and enrichment data.
pub type JsonObject = serde_json::Map<String, Value>;

/// A syntactically located marker occurrence in a text buffer.
///
/// Offsets are byte offsets into the scanned buffer; `end` is exclusive,
/// pointing just past the closing brace. `raw_input` includes the
/// delimiting braces, so it parses directly as a JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerMatch {
    /// Element name from the `@name{` header
    pub name: String,
    /// The raw payload text, braces included
    pub raw_input: String,
    /// Byte offset of the `@`
    pub start: usize,
    /// Byte offset just past the closing `}`
    pub end: usize,
}

/// A marker occurrence whose payload parsed and validated against the
/// matching element's input schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMarker {
    /// The underlying scanner match
    pub marker: MarkerMatch,
    /// The validated input object
    pub input: JsonObject,
}

impl ParsedMarker {
    /// Element name of the matched marker
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.marker.name
    }
}

/// Lifecycle state of a discovered marker, as emitted to the consumer.
///
/// Transitions are monotone: `Loading` is emitted once at discovery, then
/// exactly one of `Ready` or `Error` follows (unless the run is cancelled
/// first). Serialized with a lowercase `state` tag to match the wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ElementPart {
    /// Enrichment dispatched, result pending
    Loading {
        /// Element name
        name: String,
        /// Validated marker input
        input: JsonObject,
    },
    /// Enrichment succeeded
    Ready {
        /// Element name
        name: String,
        /// Validated marker input
        input: JsonObject,
        /// Enriched data
        data: JsonObject,
    },
    /// Enrichment failed
    Error {
        /// Element name
        name: String,
        /// Validated marker input
        input: JsonObject,
        /// Failure message
        error: String,
    },
}

impl ElementPart {
    /// Element name regardless of state
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Loading { name, .. } | Self::Ready { name, .. } | Self::Error { name, .. } => {
                name
            }
        }
    }

    /// Whether this is a terminal state (`Ready` or `Error`)
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Loading { .. })
    }
}

/// An event flowing through the pipeline.
///
/// Text deltas feed the scanner; element parts are synthesized by the
/// processor; every other event shape is opaque and passed through
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    /// An incremental text fragment from an upstream text source
    #[serde(rename = "text-delta")]
    TextDelta {
        /// Source id of the emitting text part
        id: String,
        /// Incremental text content
        delta: String,
    },
    /// A synthesized marker state-change event
    #[serde(rename = "data-element")]
    DataElement {
        /// Stable marker identity (`el-<n>`)
        id: String,
        /// Current lifecycle state
        data: ElementPart,
    },
    /// Any other event, passed through untouched
    #[serde(untagged)]
    Other(Value),
}

impl StreamEvent {
    /// Build a text delta event
    #[inline]
    #[must_use]
    pub fn text_delta(id: impl Into<String>, delta: impl Into<String>) -> Self {
        Self::TextDelta {
            id: id.into(),
            delta: delta.into(),
        }
    }

    /// Build a data-element event
    #[inline]
    #[must_use]
    pub fn element(id: impl Into<String>, data: ElementPart) -> Self {
        Self::DataElement {
            id: id.into(),
            data,
        }
    }

    /// Whether this is a `data-element` event
    #[inline]
    #[must_use]
    pub fn is_element(&self) -> bool {
        matches!(self, Self::DataElement { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn element_part_serializes_with_state_tag() {
        let part = ElementPart::Loading {
            name: "cite".to_string(),
            input: obj(json!({"url": "https://x.com"})),
        };

        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(
            value,
            json!({"state": "loading", "name": "cite", "input": {"url": "https://x.com"}})
        );
    }

    #[test]
    fn element_part_ready_round_trips() {
        let part = ElementPart::Ready {
            name: "cite".to_string(),
            input: obj(json!({"url": "a"})),
            data: obj(json!({"title": "T"})),
        };

        let value = serde_json::to_value(&part).unwrap();
        let back: ElementPart = serde_json::from_value(value).unwrap();
        assert_eq!(back, part);
        assert!(back.is_terminal());
    }

    #[test]
    fn stream_event_text_delta_wire_shape() {
        let event = StreamEvent::text_delta("t1", "hello");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({"type": "text-delta", "id": "t1", "delta": "hello"})
        );
    }

    #[test]
    fn stream_event_element_wire_shape() {
        let event = StreamEvent::element(
            "el-0",
            ElementPart::Error {
                name: "cite".to_string(),
                input: obj(json!({"url": "a"})),
                error: "boom".to_string(),
            },
        );

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "data-element");
        assert_eq!(value["id"], "el-0");
        assert_eq!(value["data"]["state"], "error");
        assert_eq!(value["data"]["error"], "boom");
    }

    #[test]
    fn unknown_events_deserialize_as_passthrough() {
        let value = json!({"type": "start-step"});
        let event: StreamEvent = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(event, StreamEvent::Other(value));
        assert!(!event.is_element());
    }
}
