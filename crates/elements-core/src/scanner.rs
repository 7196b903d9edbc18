//! Marker scanner
//!
//! Locates `@name{...}` marker occurrences in a text buffer. Scanning is
//! pure and idempotent: the same buffer always yields the same matches,
//! and extending a buffer never changes matches that were already
//! complete. Markers whose braces never balance within the buffer are
//! simply omitted; they are incomplete, not malformed.

use crate::types::MarkerMatch;

/// Find every complete marker occurrence in `text`.
///
/// A marker starts at `@` followed by one or more `[A-Za-z0-9_]`
/// identifier characters and an opening `{`. The payload runs to the
/// brace that rebalances the opening one, so nested JSON objects and
/// arrays do not terminate the match early. Candidate headers are
/// considered anywhere in the buffer, including inside another marker's
/// payload.
#[must_use]
pub fn find_markers(text: &str) -> Vec<MarkerMatch> {
    let bytes = text.as_bytes();
    let mut matches = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'@' {
            i += 1;
            continue;
        }

        let ident_start = i + 1;
        let mut ident_end = ident_start;
        while ident_end < bytes.len() && is_ident_byte(bytes[ident_end]) {
            ident_end += 1;
        }

        // A bare `@`, or an identifier with no `{`, is not a marker.
        if ident_end == ident_start || ident_end >= bytes.len() || bytes[ident_end] != b'{' {
            i += 1;
            continue;
        }

        let json_start = ident_end;
        if let Some(end) = find_closing_brace(bytes, json_start) {
            matches.push(MarkerMatch {
                name: text[ident_start..ident_end].to_string(),
                raw_input: text[json_start..end].to_string(),
                start: i,
                end,
            });
        }

        // Resume just past the opening brace so headers nested inside
        // the payload are still candidates.
        i = json_start + 1;
    }

    matches
}

/// Whether the buffer's tail could be the start of a not-yet-complete
/// marker: a trailing lone `@`, a trailing `@identifier` with no `{`
/// yet, or a tail (from the last `@`) with more open than close braces.
///
/// Lets a caller defer rendering trailing raw text that might still
/// turn into a marker once more input arrives.
#[must_use]
pub fn has_partial_marker(text: &str) -> bool {
    let Some(last_at) = text.rfind('@') else {
        return false;
    };

    let tail = &text[last_at..];
    let after_at = &tail[1..];
    if after_at.bytes().all(is_ident_byte) {
        return true;
    }

    let open = tail.bytes().filter(|&b| b == b'{').count();
    let close = tail.bytes().filter(|&b| b == b'}').count();
    open > close
}

#[inline]
fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Index just past the brace matching `bytes[from]` (which must be `{`),
/// or `None` if the braces never balance within the buffer.
fn find_closing_brace(bytes: &[u8], from: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, &b) in bytes[from..].iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                if depth == 1 {
                    return Some(from + offset + 1);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_text_has_no_markers() {
        assert!(find_markers("hello world").is_empty());
        assert!(find_markers("").is_empty());
    }

    #[test]
    fn at_without_brace_is_not_a_marker() {
        assert!(find_markers("email@example.com").is_empty());
        assert!(find_markers("just an @ sign").is_empty());
    }

    #[test]
    fn finds_a_simple_marker() {
        let matches = find_markers("@cite{\"url\":\"https://example.com\"}");
        assert_eq!(
            matches,
            vec![MarkerMatch {
                name: "cite".to_string(),
                raw_input: "{\"url\":\"https://example.com\"}".to_string(),
                start: 0,
                end: 34,
            }]
        );
    }

    #[test]
    fn finds_a_marker_embedded_in_text() {
        let matches = find_markers("Here is a citation @cite{\"id\":\"123\"} and more text");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "cite");
        assert_eq!(matches[0].raw_input, "{\"id\":\"123\"}");
        assert_eq!(matches[0].start, 19);
        assert_eq!(matches[0].end, 36);
    }

    #[test]
    fn handles_nested_braces_in_values() {
        let matches = find_markers("@map{\"config\":{\"zoom\":10},\"center\":[0,0]}");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].raw_input, "{\"config\":{\"zoom\":10},\"center\":[0,0]}");
    }

    #[test]
    fn handles_deeply_nested_braces() {
        let matches = find_markers("@el{\"a\":{\"b\":{\"c\":{\"d\":1}}}}");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].raw_input, "{\"a\":{\"b\":{\"c\":{\"d\":1}}}}");
    }

    #[test]
    fn finds_multiple_markers_with_positions() {
        let matches = find_markers("@a{\"x\":1} @b{\"y\":2}");
        assert_eq!(matches.len(), 2);
        assert_eq!((matches[0].start, matches[0].end), (0, 9));
        assert_eq!(matches[0].name, "a");
        assert_eq!((matches[1].start, matches[1].end), (10, 19));
        assert_eq!(matches[1].name, "b");
    }

    #[test]
    fn skips_markers_with_unclosed_braces() {
        assert!(find_markers("@broken{\"incomplete").is_empty());

        let matches = find_markers("@good{\"x\":1} @bad{\"incomplete");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "good");
    }

    #[test]
    fn rescanning_an_extended_buffer_keeps_earlier_matches() {
        let base = "prefix @a{\"x\":1}";
        let extended = format!("{base} then @b{{\"y\":2}}");

        let before = find_markers(base);
        let after = find_markers(&extended);

        assert_eq!(after.len(), 2);
        assert_eq!(after[0], before[0]);
    }

    #[test]
    fn partial_marker_on_trailing_at() {
        assert!(has_partial_marker("some text @"));
        assert!(has_partial_marker("some text @cit"));
        assert!(has_partial_marker("@cite{\"url\":\"http"));
        assert!(has_partial_marker("@el{\"a\":{\"b\":1}"));
    }

    #[test]
    fn no_partial_marker_when_balanced_or_absent() {
        assert!(!has_partial_marker("plain text"));
        assert!(!has_partial_marker("@cite{\"url\":\"x\"} done"));
        assert!(!has_partial_marker(""));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use serde_json::Value;

        // Brace-free leaves keep the faithful scanner limitation (raw
        // brace counting, no string-literal awareness) out of the way.
        fn json_leaf() -> impl Strategy<Value = Value> {
            prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::Bool),
                any::<i32>().prop_map(|n| Value::from(n)),
                "[a-z ]{0,8}".prop_map(Value::String),
            ]
        }

        fn json_object() -> impl Strategy<Value = Value> {
            let value = json_leaf().prop_recursive(4, 24, 4, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                    prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                        .prop_map(|m| Value::Object(m.into_iter().collect())),
                ]
            });
            prop::collection::btree_map("[a-z]{1,6}", value, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect()))
        }

        proptest! {
            #[test]
            fn payload_is_recovered_exactly(payload in json_object(), prefix in "[a-z .,]{0,16}") {
                let raw = serde_json::to_string(&payload).unwrap();
                let text = format!("{prefix}@m{raw} trailing");

                let matches = find_markers(&text);
                prop_assert_eq!(matches.len(), 1);
                prop_assert_eq!(&matches[0].raw_input, &raw);
                prop_assert_eq!(matches[0].start, prefix.len());
                prop_assert_eq!(matches[0].end, prefix.len() + 2 + raw.len());
            }

            #[test]
            fn extension_preserves_completed_matches(payload in json_object(), suffix in "[ -~]{0,24}") {
                let raw = serde_json::to_string(&payload).unwrap();
                let base = format!("@m{raw}");
                let extended = format!("{base}{suffix}");

                let before = find_markers(&base);
                let after = find_markers(&extended);
                prop_assert!(after.len() >= before.len());
                prop_assert_eq!(&after[..before.len()], &before[..]);
            }

            #[test]
            fn every_proper_prefix_reads_as_partial(payload in json_object()) {
                let raw = serde_json::to_string(&payload).unwrap();
                let marker = format!("@m{raw}");

                for split in 1..marker.len() {
                    prop_assert!(has_partial_marker(&marker[..split]));
                }
                prop_assert!(!has_partial_marker(&marker));
            }
        }
    }
}
