//! The transport codec: compact JSON body, URL-safe Base64 on the wire
//!
//! Decoding is a three-way fallback. An input that Base64-decodes to an
//! object-shaped JSON document is a structured token; anything else, at
//! any stage of that pipeline, is an opaque token carried verbatim.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde_json::{Map, Value};

/// Outcome of attempting to decode a presented wire string.
pub(crate) enum Decoded {
    /// The input was Base64 over an object-shaped JSON document.
    Structured {
        /// The decoded document text, cached as the wire body.
        body: String,
        /// Every key/value pair found, unknown keys included.
        entries: Vec<(String, String)>,
    },
    /// The input is an arbitrary secret string with no structure.
    Opaque,
}

/// Renders the non-empty properties as a compact JSON object.
///
/// Empty values are omitted: absent and empty are indistinguishable on
/// the wire.
pub(crate) fn build_body(entries: &[(String, String)]) -> String {
    let mut doc = Map::new();
    for (key, value) in entries {
        if !value.is_empty() {
            doc.insert(key.clone(), Value::String(value.clone()));
        }
    }
    Value::Object(doc).to_string()
}

/// Applies the transport encoding to a wire body.
pub(crate) fn encode(body: &str) -> String {
    URL_SAFE_NO_PAD.encode(body.as_bytes())
}

/// Attempts to decode a presented string with no prior knowledge of which
/// mode produced it.
///
/// We emit URL-safe unpadded Base64, but tokens minted elsewhere may use
/// the standard padded alphabet, so both are accepted.
pub(crate) fn decode(input: &str) -> Decoded {
    let bytes = match URL_SAFE_NO_PAD
        .decode(input)
        .or_else(|_| STANDARD.decode(input))
    {
        Ok(bytes) => bytes,
        Err(_) => return Decoded::Opaque,
    };

    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(_) => return Decoded::Opaque,
    };

    if !text.trim_start().starts_with('{') {
        return Decoded::Opaque;
    }

    let doc: Map<String, Value> = match serde_json::from_str(&text) {
        Ok(doc) => doc,
        Err(_) => return Decoded::Opaque,
    };

    let entries = doc
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect();

    Decoded::Structured {
        body: text,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(entries: &[(&str, &str)]) -> Vec<(String, String)> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn body_is_compact_and_omits_empty_values() {
        let body = build_body(&owned(&[("Sid", "abc"), ("Srv", "")]));
        assert_eq!(body, r#"{"Sid":"abc"}"#);
    }

    #[test]
    fn encode_decode_round_trips() {
        let body = build_body(&owned(&[("Sid", "abc"), ("Srv", "avatar")]));
        match decode(&encode(&body)) {
            Decoded::Structured {
                body: decoded_body,
                entries,
            } => {
                assert_eq!(decoded_body, body);
                assert!(entries.contains(&("Sid".to_owned(), "abc".to_owned())));
                assert!(entries.contains(&("Srv".to_owned(), "avatar".to_owned())));
            }
            Decoded::Opaque => panic!("expected a structured decode"),
        }
    }

    #[test]
    fn invalid_base64_is_opaque() {
        assert!(matches!(decode("not-base64-at-all!!"), Decoded::Opaque));
    }

    #[test]
    fn base64_of_non_object_text_is_opaque() {
        let input = URL_SAFE_NO_PAD.encode(b"hello there");
        assert!(matches!(decode(&input), Decoded::Opaque));
    }

    #[test]
    fn base64_of_broken_json_is_opaque() {
        let input = URL_SAFE_NO_PAD.encode(b"{\"Sid\":");
        assert!(matches!(decode(&input), Decoded::Opaque));
    }

    #[test]
    fn standard_padded_base64_is_accepted() {
        let input = STANDARD.encode(br#"{"Sid":"abc"}"#);
        assert!(input.ends_with('='));
        assert!(matches!(decode(&input), Decoded::Structured { .. }));
    }

    #[test]
    fn non_string_json_values_are_rerendered_as_text() {
        let input = URL_SAFE_NO_PAD.encode(br#"{"Sid":"abc","Hops":5}"#);
        match decode(&input) {
            Decoded::Structured { entries, .. } => {
                assert!(entries.contains(&("Hops".to_owned(), "5".to_owned())));
            }
            Decoded::Opaque => panic!("expected a structured decode"),
        }
    }

    #[test]
    fn leading_whitespace_before_the_object_is_tolerated() {
        let input = URL_SAFE_NO_PAD.encode(b"  {\"Sid\":\"abc\"}");
        assert!(matches!(decode(&input), Decoded::Structured { .. }));
    }
}
