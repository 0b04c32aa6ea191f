//! # cmd_shape
//!
//! Argument guarding and typed output normalization for wrapped command-line tools.
//!
//! `cmd_shape` sits between an agent and the CLIs it drives (`docker`, `git`,
//! `gh`, `trivy`, `semgrep`, `gitleaks`, `curl`). Caller-supplied values are
//! guarded before they reach argv, the child runs under a timeout and capture
//! ceiling, and its output is parsed into a typed record that can be
//! compacted or rendered as text.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cmd_shape::{
//!     format_record, parse_output, run, Argv, FormatOptions, Invocation, Limits, ParamRole,
//!     ParseOptions, RecordKind, ResourceLimits,
//! };
//!
//! # async fn example(container: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let limits = Limits::default();
//!
//! // Guard the caller's value while assembling argv
//! let argv = Argv::builder(&limits.guard)
//!     .args(&["logs", "--tail", "500"])
//!     .param("container", ParamRole::Container, container)?
//!     .build();
//!
//! // Run it
//! let raw = run(&Invocation::new("docker", argv), &ResourceLimits::default()).await?;
//!
//! // Parse and render
//! let record = parse_output(RecordKind::Logs, &raw, Some(container), &ParseOptions::new(limits));
//! println!("{}", format_record(&record, &FormatOptions::from(&limits)));
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Principles
//!
//! - **Guard before argv**: A value that would read as a flag never reaches the child
//! - **Parsers are total**: Unrecognized output degrades to an empty record, never an error
//! - **Bounded everything**: Log windows, diff bytes, captured streams and free text all have ceilings
//! - **Secrets masked at parse time**: Unmasked credentials never enter a record
//! - **Type-safe API**: Only `ArgvBuilder` can produce an `Argv`
//!
//! ## Platform Support
//!
//! Unix only (Linux, macOS). The runner escalates timeouts with POSIX signals.

#[cfg(windows)]
compile_error!(
    "cmd_shape does not support Windows. \
     The runner terminates timed-out children with configurable POSIX signals."
);

mod argv;
mod compact;
mod error;
mod exec;
mod format;
mod guard;
mod limits;
mod output;
pub mod parse;
mod record;
mod request;
mod window;

// Public API
pub use argv::{Argv, ArgvBuilder};
pub use compact::{
    Compact, CompactApi, CompactBuild, CompactComposeLogs, CompactComposeService,
    CompactComposeServices, CompactContainer, CompactDiff, CompactDiffFile, CompactImage,
    CompactImageList, CompactInspect, CompactInspectEntry, CompactLogs, CompactNetwork,
    CompactNetworkList, CompactProcessList, CompactPull, CompactRecord, CompactResourceUsage,
    CompactRules, CompactSecret, CompactSecrets, CompactStaticAnalysis, CompactUsage,
    CompactVolumeList, CompactVulnerabilities, InspectKind, PullRules,
};
pub use error::{ExecError, GuardError, LimitKind, ShapeError};
pub use exec::{run, run_sync};
pub use format::{format_compact, format_record, FormatOptions};
pub use guard::{guard, guard_all, looks_like_flag, LengthClass, ParamRole};
pub use limits::{GuardLimits, Limits, ResourceLimits, WindowLimits};
pub use output::RawInvocation;
pub use parse::{parse_output, IdDisplay, ParseOptions};
pub use record::*;
pub use request::Invocation;
pub use window::{redact, split_lines, truncate_text, window_lines, LogWindow, RedactedSecret, ELLIPSIS};
