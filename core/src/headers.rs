//! Header codec: request headers onto a transport, response header block
//! back into a mapping.
//!
//! # Design
//! Both directions are lenient. A bad request header never fails the
//! exchange; it is logged and skipped. A malformed response header line is
//! dropped. Repeated response headers are concatenated with `"; "` rather than
//! overwritten, and names are compared without regard to letter case, keeping
//! the spelling of the first occurrence.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::transport::Transport;

/// Separator used when a response header name repeats.
pub const REPEATED_HEADER_SEPARATOR: &str = "; ";

/// Set each header of `headers` on `transport` and return how many were
/// applied.
///
/// `headers` must be a mapping of names to string values. Anything else is
/// rejected as a whole. Within a mapping, entries with non-string values and
/// entries the transport refuses are skipped individually.
pub fn apply_request_headers<T: Transport>(transport: &mut T, headers: Option<&Value>) -> usize {
    let entries = match headers {
        None => return 0,
        Some(Value::Object(entries)) => entries,
        Some(other) => {
            log::warn!("headers option must be a mapping of names to strings, got {other}; no headers applied");
            return 0;
        }
    };

    let mut applied = 0;
    for (name, value) in entries {
        let Value::String(value) = value else {
            log::warn!("header {name:?} has non-string value {value}; skipped");
            continue;
        };
        match transport.set_request_header(name, value) {
            Ok(()) => applied += 1,
            Err(err) => log::warn!("{err}; skipped"),
        }
    }
    applied
}

/// Parse a raw `Name: Value` header block.
pub fn parse_response_headers(raw: &str) -> BTreeMap<String, String> {
    let mut headers: BTreeMap<String, String> = BTreeMap::new();

    for line in raw.trim().split(['\r', '\n']) {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let (name, value) = (name.trim(), value.trim());
        if name.is_empty() || value.is_empty() {
            continue;
        }

        let existing = headers
            .iter_mut()
            .find(|(known, _)| known.eq_ignore_ascii_case(name));
        match existing {
            Some((_, merged)) => {
                merged.push_str(REPEATED_HEADER_SEPARATOR);
                merged.push_str(value);
            }
            None => {
                headers.insert(name.to_string(), value.to_string());
            }
        }
    }

    headers
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::http::HttpMethod;
    use crate::transport::ScriptedTransport;

    fn opened() -> (ScriptedTransport, crate::transport::ScriptedHandle) {
        let (mut transport, handle) = ScriptedTransport::new();
        transport.open(HttpMethod::Get, "http://example.test/").unwrap();
        (transport, handle)
    }

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn applies_string_headers_in_order() {
        let (mut transport, handle) = opened();
        let headers = json!({"X-A": "1", "X-B": "2"});
        assert_eq!(apply_request_headers(&mut transport, Some(&headers)), 2);
        assert_eq!(
            handle.recorded().headers,
            vec![
                ("X-A".to_string(), "1".to_string()),
                ("X-B".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn absent_headers_apply_nothing() {
        let (mut transport, handle) = opened();
        assert_eq!(apply_request_headers(&mut transport, None), 0);
        assert!(handle.recorded().headers.is_empty());
    }

    #[test]
    fn non_mapping_headers_are_rejected_whole() {
        for bad in [json!(["bad"]), Value::Null, json!("X-A: 1"), json!(7)] {
            let (mut transport, handle) = opened();
            assert_eq!(apply_request_headers(&mut transport, Some(&bad)), 0);
            assert!(handle.recorded().headers.is_empty());
        }
    }

    #[test]
    fn non_string_values_are_skipped_individually() {
        let (mut transport, handle) = opened();
        let headers = json!({"X-A": "1", "X-Count": 3, "X-Flag": true, "X-B": "2"});
        assert_eq!(apply_request_headers(&mut transport, Some(&headers)), 2);
        let names: Vec<String> = handle.recorded().headers.into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["X-A", "X-B"]);
    }

    #[test]
    fn refused_headers_are_skipped() {
        let (mut transport, handle) = opened();
        let headers = json!({"Bad Name": "1", "X-Ok": "2", "X-Split": "a\r\nb"});
        assert_eq!(apply_request_headers(&mut transport, Some(&headers)), 1);
        assert_eq!(handle.recorded().headers, vec![("X-Ok".to_string(), "2".to_string())]);
    }

    #[test]
    fn parses_simple_block() {
        let headers = parse_response_headers("X-A: 1\r\nX-B: 2\r\n");
        assert_eq!(headers, map(&[("X-A", "1"), ("X-B", "2")]));
    }

    #[test]
    fn merges_repeated_names() {
        let headers = parse_response_headers("Set-Cookie: a=1\r\nSet-Cookie: b=2\r\n");
        assert_eq!(headers, map(&[("Set-Cookie", "a=1; b=2")]));
    }

    #[test]
    fn merges_names_case_insensitively() {
        let headers = parse_response_headers("Vary: Accept\nvary: Origin\n");
        assert_eq!(headers, map(&[("Vary", "Accept; Origin")]));
    }

    #[test]
    fn splits_at_first_colon_only() {
        let headers = parse_response_headers("Location: http://example.test:8080/a\r\n");
        assert_eq!(headers, map(&[("Location", "http://example.test:8080/a")]));
    }

    #[test]
    fn skips_malformed_lines() {
        let raw = "\r\n  X-A:1  \r\n\r\nno colon here\r\n: orphan\r\nX-Empty:   \r\n";
        assert_eq!(parse_response_headers(raw), map(&[("X-A", "1")]));
    }

    #[test]
    fn empty_block_is_empty_mapping() {
        assert!(parse_response_headers("").is_empty());
        assert!(parse_response_headers("\r\n\r\n").is_empty());
    }
}
