//! Output parsers: raw invocation in, typed record out.
//!
//! Every parser is total. Output the parser does not recognize degrades to
//! the record's empty form (no entries, zero counts); nothing here returns an
//! error or panics on malformed input, because the wrapped tools' formats are
//! not contractually stable.

pub mod classify;
pub mod compose;
pub mod container;
pub mod diff;
pub mod http;
pub mod ndjson;
pub mod ports;
pub mod security;

use crate::limits::Limits;
use crate::output::RawInvocation;
use crate::record::{ParsedRecord, RecordKind};

/// How long hexadecimal identifiers are rendered in list records.
///
/// Detail records (inspect) always keep the full identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdDisplay {
    /// Keep the first `n` characters after stripping any `sha256:` prefix.
    Short(usize),
    /// Keep the identifier as printed (the tool's `--no-trunc` output).
    Full,
}

impl Default for IdDisplay {
    fn default() -> Self {
        IdDisplay::Short(12)
    }
}

impl IdDisplay {
    /// Render `id` under this policy.
    pub fn apply(self, id: &str) -> String {
        match self {
            IdDisplay::Full => id.to_string(),
            IdDisplay::Short(n) => {
                let bare = id.strip_prefix("sha256:").unwrap_or(id);
                bare.chars().take(n).collect()
            }
        }
    }
}

/// Parse-time settings, passed explicitly into every parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub limits: Limits,
    pub ids: IdDisplay,
}

impl ParseOptions {
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            ids: IdDisplay::default(),
        }
    }

    /// Set the identifier display policy.
    pub fn with_ids(mut self, ids: IdDisplay) -> Self {
        self.ids = ids;
        self
    }
}

/// Parse `raw` as the record family `kind`.
///
/// `subject` carries the call-site parameter some families need: the
/// container name for logs, the image reference for pulls. Others ignore it.
pub fn parse_output(
    kind: RecordKind,
    raw: &RawInvocation,
    subject: Option<&str>,
    opts: &ParseOptions,
) -> ParsedRecord {
    let subject = subject.unwrap_or_default();
    match kind {
        RecordKind::ProcessList => ParsedRecord::ProcessList(container::parse_ps(raw, opts)),
        RecordKind::ImageList => ParsedRecord::ImageList(container::parse_images(raw, opts)),
        RecordKind::Build => ParsedRecord::Build(container::parse_build(raw, opts)),
        RecordKind::Logs => ParsedRecord::Logs(container::parse_logs(raw, subject, opts)),
        RecordKind::Inspect => ParsedRecord::Inspect(container::parse_inspect(raw)),
        RecordKind::NetworkList => {
            ParsedRecord::NetworkList(container::parse_networks(raw, opts))
        }
        RecordKind::VolumeList => ParsedRecord::VolumeList(container::parse_volumes(raw)),
        RecordKind::Pull => ParsedRecord::Pull(container::parse_pull(raw, subject)),
        RecordKind::ComposeServices => {
            ParsedRecord::ComposeServices(compose::parse_compose_ps(raw))
        }
        RecordKind::ComposeLogs => {
            ParsedRecord::ComposeLogs(compose::parse_compose_logs(raw, opts))
        }
        RecordKind::ResourceUsage => {
            ParsedRecord::ResourceUsage(container::parse_stats(raw, opts))
        }
        RecordKind::Diff => ParsedRecord::Diff(diff::parse_diff(raw, opts)),
        RecordKind::Vulnerabilities => {
            ParsedRecord::Vulnerabilities(security::parse_trivy(raw))
        }
        RecordKind::StaticAnalysis => {
            ParsedRecord::StaticAnalysis(security::parse_semgrep(raw))
        }
        RecordKind::Secrets => ParsedRecord::Secrets(security::parse_gitleaks(raw, opts)),
        RecordKind::Api => ParsedRecord::Api(http::parse_api_response(raw)),
    }
}

/// First non-empty candidate, or an empty string.
///
/// Used for "age" fields: the relative form ("5 minutes ago") comes first and
/// the absolute timestamp is the fallback.
pub(crate) fn prefer_non_empty(candidates: &[&str]) -> String {
    candidates
        .iter()
        .map(|c| c.trim())
        .find(|c| !c.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Non-empty trimmed text, or `None`.
pub(crate) fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
