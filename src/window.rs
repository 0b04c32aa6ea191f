//! Head/tail windowing, secret redaction and text truncation.
//!
//! These helpers back every log-like record: container logs, compose logs and
//! build output all go through [`window_lines`].

use serde::{Deserialize, Serialize};

/// Marker appended to truncated free text.
pub const ELLIPSIS: &str = "...";

/// Placeholder for short secrets and the middle of long ones.
const MASK: &str = "***";

/// A windowed view over line-oriented output.
///
/// `total_lines` and `is_truncated` are either both present (lines were
/// omitted between `head` and `tail`) or both absent (everything is in
/// `head` and `tail` is empty).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogWindow<T = String> {
    pub head: Vec<T>,
    pub tail: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_lines: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_truncated: Option<bool>,
}

impl<T> Default for LogWindow<T> {
    fn default() -> Self {
        Self {
            head: Vec::new(),
            tail: Vec::new(),
            total_lines: None,
            is_truncated: None,
        }
    }
}

impl<T> LogWindow<T> {
    /// Number of entries retained.
    pub fn retained(&self) -> usize {
        self.head.len() + self.tail.len()
    }

    /// Number of entries the tool produced, retained or not.
    pub fn total(&self) -> usize {
        self.total_lines.unwrap_or_else(|| self.retained())
    }

    /// Number of entries dropped between head and tail.
    pub fn omitted(&self) -> usize {
        self.total().saturating_sub(self.retained())
    }

    pub fn truncated(&self) -> bool {
        self.is_truncated.unwrap_or(false)
    }

    /// Retained entries in order, head then tail.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.head.iter().chain(self.tail.iter())
    }
}

/// Window `lines` to at most `head + tail` entries once they exceed `ceiling`.
///
/// At or below the ceiling every line lands in `head`. Above it, the first
/// `head` and the last `tail` lines are kept; `tail` is clamped so no line
/// appears twice.
pub fn window_lines<T>(lines: Vec<T>, head: usize, tail: usize, ceiling: usize) -> LogWindow<T> {
    let total = lines.len();
    if total <= ceiling {
        return LogWindow {
            head: lines,
            ..LogWindow::default()
        };
    }

    let head_len = head.min(total);
    let tail_len = tail.min(total - head_len);
    let mut head_lines = lines;
    let tail_lines = head_lines.split_off(total - tail_len);
    head_lines.truncate(head_len);

    LogWindow {
        head: head_lines,
        tail: tail_lines,
        total_lines: Some(total),
        is_truncated: Some(true),
    }
}

/// A discovered credential after masking.
///
/// Only [`redact`] creates one, so an unmasked secret can never be stored in
/// a record field of this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RedactedSecret(String);

impl RedactedSecret {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RedactedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mask a secret: 8 characters or fewer become `***`, longer ones keep their
/// first and last 3 characters around `***`.
pub fn redact(secret: &str) -> RedactedSecret {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return RedactedSecret(MASK.to_string());
    }
    let first: String = chars[..3].iter().collect();
    let last: String = chars[chars.len() - 3..].iter().collect();
    RedactedSecret(format!("{first}{MASK}{last}"))
}

/// Cut `text` to `max_chars` characters, appending [`ELLIPSIS`] when cut.
///
/// Returns the text and whether it was cut.
pub fn truncate_text(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (format!("{}{}", &text[..byte_idx], ELLIPSIS), true),
        None => (text.to_string(), false),
    }
}

/// Split tool output into lines.
///
/// Handles `\r\n`, and drops the empty line after a trailing newline.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(|l| l.to_string()).collect()
}
