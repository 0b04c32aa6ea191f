//! HTTP responses printed with their headers (`gh api -i`, `curl -i`).

use super::classify::{failure_for, failure_for_status};
use crate::output::RawInvocation;
use crate::record::{ApiResponse, Pagination};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static STATUS_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^HTTP/[\d.]+\s+(\d{3})").unwrap());
static LINK_REL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<([^>]*)>\s*;\s*rel="([^"]+)""#).unwrap());

/// Parse an HTTP envelope from stdout.
///
/// Interim `1xx` blocks are skipped; when no final status line follows, the
/// last interim status is kept and what follows it is the body. Without any
/// status line the whole of stdout is treated as the body.
pub fn parse_api_response(raw: &RawInvocation) -> ApiResponse {
    let (status_code, headers, body) = split_envelope(&raw.stdout);

    let pagination = headers.get("link").map(String::as_str).and_then(parse_link);
    let success = raw.success() && status_code.map_or(true, |s| (200..300).contains(&s));
    let error_type = status_code
        .and_then(failure_for_status)
        .or_else(|| failure_for(raw.exit_code, &raw.stderr));

    ApiResponse {
        status_code,
        exit_code: raw.exit_code,
        success,
        headers,
        body: decode_body(body),
        pagination,
        error_type,
    }
}

fn split_envelope(text: &str) -> (Option<u16>, BTreeMap<String, String>, &str) {
    let mut rest = text.trim_start_matches(['\r', '\n']);
    let mut interim = None;

    loop {
        let Some(status) = status_code(rest) else {
            // A body after an interim block with no final status line.
            return match interim {
                Some((status, head)) => (Some(status), parse_headers(head), rest),
                None => (None, BTreeMap::new(), text),
            };
        };
        let (head, body) = split_blank_line(rest);
        if (100..200).contains(&status) && !body.is_empty() {
            interim = Some((status, head));
            rest = body.trim_start_matches(['\r', '\n']);
            continue;
        }
        return (Some(status), parse_headers(head), body);
    }
}

fn status_code(block: &str) -> Option<u16> {
    let first = block.lines().next()?;
    STATUS_LINE
        .captures(first)
        .and_then(|c| c[1].parse().ok())
}

/// Split at the first blank line, accepting either line ending.
fn split_blank_line(text: &str) -> (&str, &str) {
    let crlf = text.find("\r\n\r\n").map(|i| (i, 4));
    let lf = text.find("\n\n").map(|i| (i, 2));
    let split = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    };
    match split {
        Some((i, len)) => (&text[..i], &text[i + len..]),
        None => (text, ""),
    }
}

/// Header names lower-cased; repeated headers joined with `, `.
fn parse_headers(head: &str) -> BTreeMap<String, String> {
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for line in head.lines().skip(1) {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        headers
            .entry(name)
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    headers
}

fn parse_link(link: &str) -> Option<Pagination> {
    let mut page = Pagination::default();
    for caps in LINK_REL.captures_iter(link) {
        match &caps[2] {
            "next" => page.next = Some(caps[1].to_string()),
            "last" => page.last = Some(caps[1].to_string()),
            _ => {}
        }
    }
    (page.next.is_some() || page.last.is_some()).then_some(page)
}

fn decode_body(body: &str) -> serde_json::Value {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| serde_json::Value::String(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FailureKind;
    use serde_json::json;

    #[test]
    fn test_not_found_with_exit_code() {
        let stdout = "HTTP/2.0 404 Not Found\r\nContent-Type: application/json; charset=utf-8\r\nX-GitHub-Request-Id: ABCD\r\n\r\n{\"message\":\"Not Found\",\"status\":\"404\"}";
        let raw = RawInvocation::new(stdout, "gh: Not Found (HTTP 404)\n", 1);
        let resp = parse_api_response(&raw);

        assert_eq!(resp.status_code, Some(404));
        assert_eq!(resp.exit_code, 1);
        assert!(!resp.success);
        assert_eq!(resp.headers["content-type"], "application/json; charset=utf-8");
        assert_eq!(resp.body["message"], "Not Found");
        assert_eq!(resp.error_type, Some(FailureKind::NotFound));
    }

    #[test]
    fn test_pagination_and_lf_envelope() {
        let stdout = "HTTP/1.1 200 OK\nLink: <https://api.example.com/items?page=2>; rel=\"next\", <https://api.example.com/items?page=9>; rel=\"last\"\n\n[1,2,3]\n";
        let resp = parse_api_response(&RawInvocation::new(stdout, "", 0));

        assert!(resp.success);
        assert_eq!(resp.body, json!([1, 2, 3]));
        let page = resp.pagination.unwrap();
        assert_eq!(page.next.as_deref(), Some("https://api.example.com/items?page=2"));
        assert_eq!(page.last.as_deref(), Some("https://api.example.com/items?page=9"));
        assert_eq!(resp.error_type, None);
    }

    #[test]
    fn test_continue_block_skipped() {
        let stdout = "HTTP/1.1 100 Continue\r\n\r\nHTTP/1.1 201 Created\r\nLocation: /items/7\r\n\r\n{\"id\":7}";
        let resp = parse_api_response(&RawInvocation::new(stdout, "", 0));
        assert_eq!(resp.status_code, Some(201));
        assert_eq!(resp.headers["location"], "/items/7");
        assert_eq!(resp.body, json!({"id": 7}));
    }

    #[test]
    fn test_continue_without_final_status() {
        let stdout = "HTTP/1.1 100 Continue\r\nX-Trace: t1\r\n\r\n{\"a\":1}";
        let resp = parse_api_response(&RawInvocation::new(stdout, "", 0));
        assert_eq!(resp.status_code, Some(100));
        assert_eq!(resp.headers["x-trace"], "t1");
        assert_eq!(resp.body, json!({"a": 1}));
        assert!(!resp.success);
    }

    #[test]
    fn test_text_body_and_repeated_headers() {
        let stdout = "HTTP/1.1 200 OK\nSet-Cookie: a=1\nset-cookie: b=2\n\nplain text";
        let resp = parse_api_response(&RawInvocation::new(stdout, "", 0));
        assert_eq!(resp.headers["set-cookie"], "a=1, b=2");
        assert_eq!(resp.body, json!("plain text"));
        assert_eq!(resp.pagination, None);
    }

    #[test]
    fn test_no_status_line() {
        let resp = parse_api_response(&RawInvocation::new("{\"ok\":true}", "", 0));
        assert_eq!(resp.status_code, None);
        assert!(resp.headers.is_empty());
        assert_eq!(resp.body, json!({"ok": true}));
        assert!(resp.success);
    }

    #[test]
    fn test_transport_failure() {
        let raw = RawInvocation::new("", "curl: (6) Could not resolve host: nope.invalid\n", 6);
        let resp = parse_api_response(&raw);
        assert_eq!(resp.status_code, None);
        assert_eq!(resp.body, serde_json::Value::Null);
        assert!(!resp.success);
        assert_eq!(resp.error_type, Some(FailureKind::Network));
    }
}
