//! Size ceilings for guarding, parsing, formatting and execution.
//!
//! Everything here is built once by the host and passed explicitly into the
//! guard, the parsers and the runner. There is no global mutable state.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ceilings applied by the parameter guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardLimits {
    /// Short tokens: labels, branch names, container names.
    ///
    /// Default: 255 characters.
    pub short_string_max: usize,

    /// Free text: bodies, comments, commands.
    ///
    /// Default: 65,536 characters.
    pub string_max: usize,

    /// Filesystem paths.
    ///
    /// Default: 4,096 characters.
    pub path_max: usize,

    /// Elements in an array-valued parameter.
    ///
    /// Default: 1,000.
    pub array_max: usize,
}

impl Default for GuardLimits {
    fn default() -> Self {
        Self {
            short_string_max: 255,
            string_max: 65_536,
            path_max: 4_096,
            array_max: 1_000,
        }
    }
}

/// Head/tail window applied to line-oriented output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowLimits {
    /// Lines kept from the start when truncating.
    pub head: usize,
    /// Lines kept from the end when truncating.
    pub tail: usize,
    /// Line count above which truncation happens.
    pub ceiling: usize,
}

impl Default for WindowLimits {
    fn default() -> Self {
        Self {
            head: 50,
            tail: 50,
            ceiling: 100,
        }
    }
}

/// All parse- and format-time ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub guard: GuardLimits,
    pub window: WindowLimits,

    /// Bytes of diff text accumulated before the report is marked truncated.
    ///
    /// Default: 256 KiB.
    pub diff_byte_ceiling: usize,

    /// Characters of free text kept by the formatters.
    ///
    /// Default: 2,000.
    pub text_max: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            guard: GuardLimits::default(),
            window: WindowLimits::default(),
            diff_byte_ceiling: 256 * 1024,
            text_max: 2_000,
        }
    }
}

impl Limits {
    /// Set the guard ceilings.
    pub fn with_guard(mut self, guard: GuardLimits) -> Self {
        self.guard = guard;
        self
    }

    /// Set the log window.
    pub fn with_window(mut self, head: usize, tail: usize, ceiling: usize) -> Self {
        self.window = WindowLimits {
            head,
            tail,
            ceiling,
        };
        self
    }

    /// Set the diff byte ceiling.
    pub fn with_diff_byte_ceiling(mut self, max: usize) -> Self {
        self.diff_byte_ceiling = max;
        self
    }

    /// Set the formatter's free-text ceiling.
    pub fn with_text_max(mut self, max: usize) -> Self {
        self.text_max = max;
        self
    }
}

/// Resource limits applied during process execution.
///
/// On timeout the process receives `kill_signal`, then SIGKILL once
/// `kill_grace` has elapsed. Output past `max_buffer` is discarded and the
/// result is flagged as truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Wall-clock timeout for the process.
    ///
    /// Default: 30 seconds.
    pub timeout: Duration,

    /// Maximum bytes captured per stream.
    ///
    /// Default: 10 MB.
    pub max_buffer: usize,

    /// Signal sent on timeout.
    ///
    /// Default: SIGTERM.
    pub kill_signal: i32,

    /// Time allowed between `kill_signal` and SIGKILL.
    ///
    /// Default: 2 seconds.
    pub kill_grace: Duration,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_buffer: 10 * 1024 * 1024, // 10 MB
            kill_signal: libc::SIGTERM,
            kill_grace: Duration::from_secs(2),
        }
    }
}

impl ResourceLimits {
    /// Create new limits with specified timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set maximum captured bytes per stream.
    pub fn with_max_buffer(mut self, max: usize) -> Self {
        self.max_buffer = max;
        self
    }

    /// Set the signal sent on timeout.
    pub fn with_kill_signal(mut self, signal: i32) -> Self {
        self.kill_signal = signal;
        self
    }

    /// Set the grace period before SIGKILL.
    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }
}
