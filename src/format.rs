//! Plain-text rendering of parsed and compact records.
//!
//! Output is deterministic: a summary line first, then one line per item in
//! record order. Free text (log lines, messages, bodies) is cut at
//! [`FormatOptions::text_max`] characters.

use crate::compact::{CompactInspectEntry, CompactRecord};
use crate::limits::Limits;
use crate::record::{
    ApiResponse, BuildReport, ComposeLogBundle, ComposeServiceList, DiffReport, DiffStatus,
    FailureKind, ImageList, InspectEntry, InspectRecord, LogBundle, NetworkList, ParsedRecord,
    PortBinding, ProcessList, PullReport, PullStatus, ResourceUsageList, SecretReport,
    SeverityCounts, StaticAnalysisReport, VolumeList, VulnerabilityReport,
};
use crate::window::{truncate_text, LogWindow};

/// Rendering settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    /// Free-text ceiling in characters.
    pub text_max: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self::from(&Limits::default())
    }
}

impl From<&Limits> for FormatOptions {
    fn from(limits: &Limits) -> Self {
        Self {
            text_max: limits.text_max,
        }
    }
}

impl FormatOptions {
    pub fn with_text_max(mut self, max: usize) -> Self {
        self.text_max = max;
        self
    }

    fn clip(&self, text: &str) -> String {
        truncate_text(text, self.text_max).0
    }
}

/// Render a parsed record.
pub fn format_record(record: &ParsedRecord, opts: &FormatOptions) -> String {
    let mut out = Lines::default();
    match record {
        ParsedRecord::ProcessList(r) => process_list(&mut out, r),
        ParsedRecord::ImageList(r) => image_list(&mut out, r),
        ParsedRecord::Build(r) => build(&mut out, r, opts),
        ParsedRecord::Logs(r) => logs(&mut out, r, opts),
        ParsedRecord::Inspect(r) => inspect(&mut out, r),
        ParsedRecord::NetworkList(r) => network_list(&mut out, r),
        ParsedRecord::VolumeList(r) => volume_list(&mut out, r),
        ParsedRecord::Pull(r) => pull(&mut out, r),
        ParsedRecord::ComposeServices(r) => compose_services(&mut out, r),
        ParsedRecord::ComposeLogs(r) => compose_logs(&mut out, r, opts),
        ParsedRecord::ResourceUsage(r) => resource_usage(&mut out, r),
        ParsedRecord::Diff(r) => diff(&mut out, r),
        ParsedRecord::Vulnerabilities(r) => vulnerabilities(&mut out, r, opts),
        ParsedRecord::StaticAnalysis(r) => static_analysis(&mut out, r, opts),
        ParsedRecord::Secrets(r) => secrets(&mut out, r),
        ParsedRecord::Api(r) => api(&mut out, r, opts),
    }
    out.finish()
}

/// Render a compact record.
pub fn format_compact(record: &CompactRecord, opts: &FormatOptions) -> String {
    let mut out = Lines::default();
    match record {
        CompactRecord::ProcessList(r) => {
            out.push(format!("{} containers ({} running)", r.total, r.running));
            out.failure(r.error_type);
            for c in &r.containers {
                out.push(format!("{} {} {} {}", c.id, c.name, c.image, c.status));
            }
        }
        CompactRecord::ImageList(r) => {
            out.push(format!("{} images", r.total));
            out.failure(r.error_type);
            for i in &r.images {
                out.push(format!("{}:{} {} {}", i.repository, i.tag, i.id, i.size));
            }
        }
        CompactRecord::Build(r) => {
            out.push(verdict("build", r.success));
            out.opt("image", r.image_id.as_deref());
            out.opt("steps", r.steps);
            out.opt("duration", r.duration_ms.map(|ms| format!("{ms}ms")));
            out.push(format!("errors: {}", r.error_count));
            out.failure(r.error_type);
        }
        CompactRecord::Logs(r) => {
            out.push(log_header(&r.container, r.total_lines, r.truncated));
            out.failure(r.error_type);
        }
        CompactRecord::Inspect(r) => {
            out.push(format!("{} objects", r.entries.len()));
            for e in &r.entries {
                out.push(compact_inspect_line(e));
            }
            out.failure(r.error_type);
        }
        CompactRecord::NetworkList(r) => {
            out.push(format!("{} networks", r.total));
            out.failure(r.error_type);
            for n in &r.networks {
                out.push(format!("{} {}", n.name, n.driver));
            }
        }
        CompactRecord::VolumeList(r) => {
            out.push(format!("{} volumes", r.total));
            out.failure(r.error_type);
            for name in &r.names {
                out.push(name.clone());
            }
        }
        CompactRecord::Pull(r) => {
            out.push(match r.status {
                Some(status) => format!("pull {}:{}: {}", r.image, r.tag, pull_status(status)),
                None => format!("pull {}:{}: {}", r.image, r.tag, verdict_word(r.success)),
            });
            out.opt("digest", r.digest.as_deref());
        }
        CompactRecord::ComposeServices(r) => {
            out.push(format!("{} services ({} running)", r.total, r.running));
            out.failure(r.error_type);
            for s in &r.services {
                out.push(format!("{} {}", s.service, s.state));
            }
        }
        CompactRecord::ComposeLogs(r) => {
            out.push(format!(
                "compose logs: {} lines{}",
                r.total_lines,
                if r.truncated { " (truncated)" } else { "" }
            ));
            out.failure(r.error_type);
            if !r.services.is_empty() {
                out.push(format!("services: {}", r.services.join(", ")));
            }
        }
        CompactRecord::ResourceUsage(r) => {
            out.push(format!("{} containers", r.total));
            out.failure(r.error_type);
            for c in &r.containers {
                out.push(format!(
                    "{} cpu {} mem {}",
                    c.name,
                    percent(c.cpu_percent),
                    percent(c.memory_percent)
                ));
            }
        }
        CompactRecord::Diff(r) => {
            out.push(diff_summary(r.files_changed, r.total_additions, r.total_deletions));
            out.failure(r.error_type);
            for f in &r.files {
                out.push(format!("{} {} (+{} -{})", f.status, f.file, f.additions, f.deletions));
            }
            if r.truncated {
                out.push("(diff truncated)".to_string());
            }
        }
        CompactRecord::Vulnerabilities(r) => {
            out.push(severity_summary(r.total, &r.summary));
            out.failure(r.error_type);
        }
        CompactRecord::StaticAnalysis(r) => {
            out.push(format!(
                "{} findings (error {}, warning {}, info {})",
                r.total, r.summary.error, r.summary.warning, r.summary.info
            ));
            out.failure(r.error_type);
            if r.error_count > 0 {
                out.push(format!("scan errors: {}", r.error_count));
            }
        }
        CompactRecord::Secrets(r) => {
            out.push(format!("{} secrets", r.total));
            out.failure(r.error_type);
            for f in &r.findings {
                out.push(format!("{} {}:{}", f.rule_id, f.file, f.line));
            }
        }
        CompactRecord::Api(r) => {
            out.push(status_line(r.status_code, r.exit_code, r.success));
            if let Some(page) = &r.pagination {
                out.opt("next", page.next.as_deref());
                out.opt("last", page.last.as_deref());
            }
            out.failure(r.error_type);
            out.push(opts.clip(&body_text(&r.body)));
        }
    }
    out.finish()
}

// =============================================================================
// Parsed records
// =============================================================================

fn process_list(out: &mut Lines, r: &ProcessList) {
    out.push(format!("{} containers ({} running)", r.total, r.running));
    out.failure(r.error_type);
    for c in &r.containers {
        out.push(format!(
            "{} {} {} {} {}{}",
            c.id,
            c.name,
            c.image,
            c.status,
            c.created,
            ports(&c.ports)
        ));
    }
}

fn image_list(out: &mut Lines, r: &ImageList) {
    out.push(format!("{} images", r.total));
    out.failure(r.error_type);
    for i in &r.images {
        out.push(format!("{}:{} {} {} {}", i.repository, i.tag, i.id, i.size, i.created));
    }
}

fn build(out: &mut Lines, r: &BuildReport, opts: &FormatOptions) {
    out.push(verdict("build", r.success));
    out.opt("image", r.image_id.as_deref());
    out.opt("steps", r.steps);
    out.opt("duration", r.duration_ms.map(|ms| format!("{ms}ms")));
    if !r.errors.is_empty() {
        out.push(format!("errors ({}):", r.errors.len()));
        for e in &r.errors {
            out.push(format!("  {}", opts.clip(e)));
        }
    }
    out.failure(r.error_type);
    if !r.success {
        out.push("output:".to_string());
        out.window(&r.output, |line| format!("  {}", opts.clip(line)));
    }
}

fn logs(out: &mut Lines, r: &LogBundle, opts: &FormatOptions) {
    out.push(log_header(&r.container, r.lines.total(), r.lines.truncated()));
    out.failure(r.error_type);
    out.window(&r.lines, |line| opts.clip(line));
}

fn inspect(out: &mut Lines, r: &InspectRecord) {
    out.push(format!("{} objects", r.entries.len()));
    for entry in &r.entries {
        match entry {
            InspectEntry::Container(c) => {
                out.push(format!("container {} {}", c.name, c.id));
                out.push(format!("  image: {}", c.image));
                out.push(format!(
                    "  state: {}{}",
                    c.state.status,
                    c.state
                        .exit_code
                        .map(|code| format!(" (exit {code})"))
                        .unwrap_or_default()
                ));
                out.opt("  health", c.state.health.as_deref());
                out.opt("  started", c.state.started_at.as_deref());
                out.opt("  finished", c.state.finished_at.as_deref());
                out.push(format!("  restarts: {}", c.restart_count));
                out.opt("  platform", c.platform.as_deref());
                if !c.ports.is_empty() {
                    out.push(format!("  ports:{}", ports(&c.ports)));
                }
                for m in &c.mounts {
                    out.push(format!(
                        "  mount: {} -> {} ({})",
                        m.source,
                        m.destination,
                        if m.read_write { "rw" } else { "ro" }
                    ));
                }
                if !c.networks.is_empty() {
                    out.push(format!("  networks: {}", c.networks.join(", ")));
                }
            }
            InspectEntry::Image(i) => {
                out.push(format!("image {} {}", i.repo_tags.join(", "), i.id));
                out.push(format!("  platform: {}/{}", i.os, i.architecture));
                out.push(format!("  size: {} bytes, {} layers", i.size, i.layers));
                out.push(format!("  created: {}", i.created));
            }
            InspectEntry::Volume(v) => {
                out.push(format!("volume {} ({}, {})", v.name, v.driver, v.scope));
                out.push(format!("  mountpoint: {}", v.mountpoint));
                out.opt("  created", v.created.as_deref());
            }
        }
    }
    out.failure(r.error_type);
}

fn network_list(out: &mut Lines, r: &NetworkList) {
    out.push(format!("{} networks", r.total));
    out.failure(r.error_type);
    for n in &r.networks {
        out.push(format!("{} {} {} {}", n.id, n.name, n.driver, n.scope));
    }
}

fn volume_list(out: &mut Lines, r: &VolumeList) {
    out.push(format!("{} volumes", r.total));
    out.failure(r.error_type);
    for v in &r.volumes {
        let mut line = format!("{} {}", v.name, v.driver);
        if let Some(scope) = &v.scope {
            line.push_str(&format!(" {scope}"));
        }
        if let Some(mountpoint) = &v.mountpoint {
            line.push_str(&format!(" {mountpoint}"));
        }
        out.push(line);
    }
}

fn pull(out: &mut Lines, r: &PullReport) {
    out.push(format!("pull {}:{}: {}", r.image, r.tag, pull_status(r.status)));
    out.opt("digest", r.digest.as_deref());
    out.failure(r.error_type);
}

fn compose_services(out: &mut Lines, r: &ComposeServiceList) {
    out.push(format!("{} services ({} running)", r.total, r.running));
    out.failure(r.error_type);
    for s in &r.services {
        out.push(format!(
            "{} {} {} {}{}",
            s.service,
            s.name,
            s.state,
            s.status,
            ports(&s.ports)
        ));
    }
}

fn compose_logs(out: &mut Lines, r: &ComposeLogBundle, opts: &FormatOptions) {
    out.push(format!(
        "compose logs: {} lines{}",
        r.entries.total(),
        if r.entries.truncated() { " (truncated)" } else { "" }
    ));
    out.failure(r.error_type);
    out.window(&r.entries, |e| format!("{} | {}", e.service, opts.clip(&e.message)));
}

fn resource_usage(out: &mut Lines, r: &ResourceUsageList) {
    out.push(format!("{} containers", r.total));
    out.failure(r.error_type);
    for c in &r.containers {
        let mut line = format!(
            "{} cpu {} mem {}",
            c.name,
            percent(c.cpu_percent),
            percent(c.memory_percent)
        );
        if !c.memory_usage.is_empty() {
            line.push_str(&format!(" ({}", c.memory_usage));
            if !c.memory_limit.is_empty() {
                line.push_str(&format!(" / {}", c.memory_limit));
            }
            line.push(')');
        }
        if let Some(pids) = c.pids {
            line.push_str(&format!(" pids {pids}"));
        }
        out.push(line);
    }
}

fn diff(out: &mut Lines, r: &DiffReport) {
    out.push(diff_summary(r.files_changed, r.total_additions, r.total_deletions));
    out.failure(r.error_type);
    for f in &r.files {
        let name = match (&f.old_file, f.status) {
            (Some(old), DiffStatus::Renamed) => format!("{old} -> {}", f.file),
            _ => f.file.clone(),
        };
        let counts = if f.binary {
            "binary".to_string()
        } else {
            format!("+{} -{}", f.additions, f.deletions)
        };
        out.push(format!("{} {} ({})", f.status, name, counts));
    }
    if r.truncated {
        out.push("(diff truncated)".to_string());
    }
}

fn vulnerabilities(out: &mut Lines, r: &VulnerabilityReport, opts: &FormatOptions) {
    out.push(severity_summary(r.total, &r.summary));
    out.failure(r.error_type);
    for v in &r.vulnerabilities {
        let fixed = v
            .fixed_version
            .as_deref()
            .map(|f| format!(" -> {f}"))
            .unwrap_or_default();
        let title = v
            .title
            .as_deref()
            .map(|t| format!(": {}", opts.clip(t)))
            .unwrap_or_default();
        out.push(format!(
            "{} {} {} {}{}{}",
            v.severity, v.id, v.package, v.installed_version, fixed, title
        ));
    }
}

fn static_analysis(out: &mut Lines, r: &StaticAnalysisReport, opts: &FormatOptions) {
    out.push(format!(
        "{} findings (error {}, warning {}, info {})",
        r.total, r.summary.error, r.summary.warning, r.summary.info
    ));
    out.failure(r.error_type);
    for f in &r.findings {
        let range = match f.end_line {
            Some(end) => format!("{}-{}", f.line, end),
            None => f.line.to_string(),
        };
        out.push(format!(
            "{} {}:{} {}: {}",
            f.severity,
            f.path,
            range,
            f.rule_id,
            opts.clip(&f.message)
        ));
    }
    for e in &r.errors {
        out.push(format!("scan error: {}", opts.clip(e)));
    }
}

fn secrets(out: &mut Lines, r: &SecretReport) {
    out.push(format!("{} secrets", r.total));
    out.failure(r.error_type);
    for f in &r.findings {
        let mut line = format!("{} {}:{} {}", f.rule_id, f.file, f.line, f.secret);
        if let Some(commit) = &f.commit {
            line.push_str(&format!(" @{commit}"));
        }
        out.push(line);
    }
}

fn api(out: &mut Lines, r: &ApiResponse, opts: &FormatOptions) {
    out.push(status_line(r.status_code, r.exit_code, r.success));
    for (name, value) in &r.headers {
        out.push(format!("{name}: {}", opts.clip(value)));
    }
    if let Some(page) = &r.pagination {
        out.opt("next", page.next.as_deref());
        out.opt("last", page.last.as_deref());
    }
    out.failure(r.error_type);
    out.push(opts.clip(&body_text(&r.body)));
}

// =============================================================================
// Helpers
// =============================================================================

#[derive(Default)]
struct Lines(Vec<String>);

impl Lines {
    fn push(&mut self, line: String) {
        self.0.push(line);
    }

    /// `label: value`, only when the value is present.
    fn opt<T: std::fmt::Display>(&mut self, label: &str, value: Option<T>) {
        if let Some(v) = value {
            self.0.push(format!("{label}: {v}"));
        }
    }

    fn failure(&mut self, kind: Option<FailureKind>) {
        self.opt("error type", kind);
    }

    fn window<T>(&mut self, window: &LogWindow<T>, render: impl Fn(&T) -> String) {
        self.0.extend(window.head.iter().map(&render));
        let omitted = window.omitted();
        if omitted > 0 {
            self.0.push(format!("... {omitted} lines omitted ..."));
        }
        self.0.extend(window.tail.iter().map(&render));
    }

    fn finish(self) -> String {
        self.0.join("\n")
    }
}

fn verdict_word(success: bool) -> &'static str {
    if success {
        "succeeded"
    } else {
        "failed"
    }
}

fn verdict(what: &str, success: bool) -> String {
    format!("{what} {}", verdict_word(success))
}

fn pull_status(status: PullStatus) -> &'static str {
    match status {
        PullStatus::Downloaded => "downloaded",
        PullStatus::UpToDate => "up to date",
        PullStatus::Error => "error",
    }
}

fn log_header(container: &str, total: usize, truncated: bool) -> String {
    format!(
        "logs {container}: {total} lines{}",
        if truncated { " (truncated)" } else { "" }
    )
}

fn ports(bindings: &[PortBinding]) -> String {
    bindings
        .iter()
        .map(|p| match p.host {
            Some(host) => format!(" {host}->{}/{}", p.container, p.protocol),
            None => format!(" {}/{}", p.container, p.protocol),
        })
        .collect()
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}%"))
}

fn diff_summary(files: usize, additions: u32, deletions: u32) -> String {
    format!("{files} files changed, +{additions} -{deletions}")
}

fn severity_summary(total: usize, s: &SeverityCounts) -> String {
    format!(
        "{total} vulnerabilities (critical {}, high {}, medium {}, low {}, unknown {})",
        s.critical, s.high, s.medium, s.low, s.unknown
    )
}

fn status_line(status: Option<u16>, exit_code: i32, success: bool) -> String {
    match status {
        Some(code) => format!("HTTP {code} (exit {exit_code}, {})", verdict_word(success)),
        None => format!("exit {exit_code}, {}", verdict_word(success)),
    }
}

fn body_text(body: &serde_json::Value) -> String {
    match body {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compact_inspect_line(e: &CompactInspectEntry) -> String {
    let mut line = format!("{} {}", e.kind, e.name);
    if let Some(id) = &e.id {
        line.push_str(&format!(" {id}"));
    }
    if let Some(status) = &e.status {
        line.push_str(&format!(" {status}"));
    }
    line
}
