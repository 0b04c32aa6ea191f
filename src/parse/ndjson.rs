//! Newline-delimited JSON decoding.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode each non-empty line of `text` independently.
///
/// Only JSON objects count as rows. A line that is not an object, or does not
/// fit `T`, is skipped; it never aborts the rest.
pub fn decode_lines<T: DeserializeOwned>(text: &str) -> Vec<T> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(i, line)| match serde_json::from_str::<Value>(line.trim()) {
            Ok(value) => decode_object(value, i + 1),
            Err(e) => {
                tracing::debug!(line = i + 1, error = %e, "Skipping undecodable line");
                None
            }
        })
        .collect()
}

/// Decode `text` as a JSON array if it is one, else as NDJSON.
///
/// Some tools switched between the two shapes across versions.
pub fn decode_array_or_lines<T: DeserializeOwned>(text: &str) -> Vec<T> {
    let trimmed = text.trim();
    if trimmed.starts_with('[') {
        if let Ok(items) = serde_json::from_str::<Vec<Value>>(trimmed) {
            return items
                .into_iter()
                .enumerate()
                .filter_map(|(i, v)| decode_object(v, i + 1))
                .collect();
        }
    }
    decode_lines(text)
}

/// Serde lets a struct decode from a sequence, so non-objects are refused
/// before they can become an all-default row.
fn decode_object<T: DeserializeOwned>(value: Value, position: usize) -> Option<T> {
    if !value.is_object() {
        tracing::debug!(position, "Skipping non-object row");
        return None;
    }
    serde_json::from_value(value)
        .map_err(|e| tracing::debug!(position, error = %e, "Skipping row of unexpected shape"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        #[serde(rename = "Name")]
        name: String,
    }

    #[test]
    fn test_empty_input() {
        assert!(decode_lines::<Row>("").is_empty());
        assert!(decode_lines::<Row>("\n\n  \n").is_empty());
    }

    #[test]
    fn test_bad_line_skipped() {
        let text = "{\"Name\":\"a\"}\nWARNING: something\n{\"Name\":\"b\"}\n";
        let rows: Vec<Row> = decode_lines(text);
        assert_eq!(
            rows,
            vec![
                Row {
                    name: "a".to_string()
                },
                Row {
                    name: "b".to_string()
                }
            ]
        );
    }

    #[test]
    fn test_crlf_lines() {
        let rows: Vec<Row> = decode_lines("{\"Name\":\"a\"}\r\n{\"Name\":\"b\"}\r\n");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_array_or_lines() {
        let rows: Vec<Row> = decode_array_or_lines(r#"[{"Name":"a"},{"Name":"b"}]"#);
        assert_eq!(rows.len(), 2);

        let rows: Vec<Row> = decode_array_or_lines("{\"Name\":\"a\"}\n");
        assert_eq!(rows.len(), 1);

        // Elements that don't fit are dropped individually.
        let rows: Vec<Row> = decode_array_or_lines(r#"[{"Name":"a"},{"Other":1}]"#);
        assert_eq!(rows.len(), 1);
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct LenientRow {
        #[serde(rename = "Name")]
        name: String,
    }

    #[test]
    fn test_non_objects_never_become_rows() {
        assert!(decode_lines::<LenientRow>("[]\n[\"a\"]\n42\n\"x\"\nnull\n").is_empty());
        assert!(decode_array_or_lines::<LenientRow>("[[], 1, \"x\", null]").is_empty());
        assert!(decode_array_or_lines::<LenientRow>("[]").is_empty());

        // Objects still decode, even when every field falls back to its default
        assert_eq!(decode_lines::<LenientRow>("{}\n").len(), 1);
    }
}
