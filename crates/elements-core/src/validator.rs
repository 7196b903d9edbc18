//! Marker validation
//!
//! Turns scanner matches into [`ParsedMarker`]s by looking up the element
//! definition, parsing the raw payload as JSON, and validating it against
//! the element's input schema. Every miss is a silent `None`: unknown
//! names and generator noise are ignored by design, never surfaced as
//! pipeline failures.

use serde_json::Value;

use crate::element::ElementRegistry;
use crate::scanner::find_markers;
use crate::types::{MarkerMatch, ParsedMarker};

/// Validate a single scanner match against the registry.
///
/// Returns `None` when the name is unregistered, the payload is not a
/// JSON object, or the object fails the input schema. Deterministic and
/// side-effect free.
#[must_use]
pub fn parse_marker<D>(
    marker: &MarkerMatch,
    registry: &ElementRegistry<D>,
) -> Option<ParsedMarker> {
    let definition = registry.get(&marker.name)?;

    let parsed: Value = match serde_json::from_str(&marker.raw_input) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(name = %marker.name, %err, "marker payload is not valid JSON");
            return None;
        }
    };

    if !definition.input_valid(&parsed) {
        tracing::debug!(name = %marker.name, "marker payload failed input schema");
        return None;
    }

    let Value::Object(input) = parsed else {
        return None;
    };

    Some(ParsedMarker {
        marker: marker.clone(),
        input,
    })
}

/// Scan `text` and validate every complete marker in one pass.
#[must_use]
pub fn parse_markers<D>(text: &str, registry: &ElementRegistry<D>) -> Vec<ParsedMarker> {
    find_markers(text)
        .iter()
        .filter_map(|m| parse_marker(m, registry))
        .collect()
}
