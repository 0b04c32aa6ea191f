//! Raw invocation result consumed by the parsers.

use serde::{Deserialize, Serialize};

/// Captured output of one finished subprocess.
///
/// Produced by [`crate::run`] or supplied directly by a host that spawns
/// processes itself. Lives only as long as one parse call needs it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInvocation {
    /// Standard output (lossy UTF-8).
    pub stdout: String,

    /// Standard error (lossy UTF-8).
    pub stderr: String,

    /// Exit code, or -1 when the process was terminated by a signal.
    pub exit_code: i32,

    /// Wall-clock duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    /// True when either stream hit the capture ceiling.
    #[serde(default)]
    pub truncated: bool,
}

impl RawInvocation {
    /// Create a result from its three core parts.
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
            duration_ms: None,
            truncated: false,
        }
    }

    /// Build from captured bytes (lossy UTF-8 conversion).
    pub fn from_bytes(stdout: &[u8], stderr: &[u8], exit_code: i32) -> Self {
        Self::new(
            String::from_utf8_lossy(stdout),
            String::from_utf8_lossy(stderr),
            exit_code,
        )
    }

    /// Set the wall-clock duration.
    pub fn with_duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = Some(ms);
        self
    }

    /// Check if the process exited successfully (code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout followed by stderr, newline-separated when both are present.
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => {
                let mut s = self.stdout.clone();
                if !s.ends_with('\n') {
                    s.push('\n');
                }
                s.push_str(&self.stderr);
                s
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined() {
        assert_eq!(RawInvocation::new("a", "", 0).combined(), "a");
        assert_eq!(RawInvocation::new("", "b", 1).combined(), "b");
        assert_eq!(RawInvocation::new("a", "b", 1).combined(), "a\nb");
        assert_eq!(RawInvocation::new("a\n", "b", 1).combined(), "a\nb");
    }

    #[test]
    fn test_from_bytes_lossy() {
        let raw = RawInvocation::from_bytes(b"ok\xff", b"", 0);
        assert!(raw.stdout.starts_with("ok"));
        assert!(raw.success());
    }

    #[test]
    fn test_deserialize_minimal() {
        let raw: RawInvocation =
            serde_json::from_str(r#"{"stdout":"x","stderr":"","exitCode":2}"#).unwrap();
        assert_eq!(raw.exit_code, 2);
        assert_eq!(raw.duration_ms, None);
        assert!(!raw.truncated);
    }
}
