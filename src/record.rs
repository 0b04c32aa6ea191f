//! Parsed records: one immutable snapshot per tool invocation.
//!
//! Every record serializes to camelCase JSON with absent optionals omitted.
//! [`ParsedRecord`] collects them into a closed sum so that compaction and
//! formatting must handle every family.

use crate::window::{LogWindow, RedactedSecret};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

// =============================================================================
// Shared sub-structures
// =============================================================================

/// A port number as the wrapped tool printed it.
///
/// Text without leading digits is kept as [`PortNumber::NotANumber`] rather
/// than rejected; it serializes as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortNumber {
    Number(u32),
    NotANumber,
}

impl PortNumber {
    pub fn value(self) -> Option<u32> {
        match self {
            PortNumber::Number(n) => Some(n),
            PortNumber::NotANumber => None,
        }
    }
}

impl Serialize for PortNumber {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            PortNumber::Number(n) => s.serialize_u32(*n),
            PortNumber::NotANumber => s.serialize_none(),
        }
    }
}

impl std::fmt::Display for PortNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortNumber::Number(n) => write!(f, "{n}"),
            PortNumber::NotANumber => write!(f, "NaN"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
        }
    }
}

/// A container port, optionally published on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PortBinding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<PortNumber>,
    pub container: PortNumber,
    pub protocol: Protocol,
}

/// Best-effort classification of a wrapped tool's failure from its stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    NotFound,
    PermissionDenied,
    Unauthorized,
    Conflict,
    DaemonUnavailable,
    Network,
    Timeout,
    Unknown,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::NotFound => "not found",
            FailureKind::PermissionDenied => "permission denied",
            FailureKind::Unauthorized => "unauthorized",
            FailureKind::Conflict => "conflict",
            FailureKind::DaemonUnavailable => "daemon unavailable",
            FailureKind::Network => "network",
            FailureKind::Timeout => "timeout",
            FailureKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Container engine
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSummary {
    pub id: String,
    pub name: String,
    pub image: String,
    pub status: String,
    pub state: String,
    pub ports: Vec<PortBinding>,
    /// Relative age when the tool reports one, else the absolute timestamp.
    pub created: String,
}

/// `docker ps`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessList {
    pub containers: Vec<ContainerSummary>,
    pub total: usize,
    pub running: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSummary {
    pub id: String,
    pub repository: String,
    pub tag: String,
    pub size: String,
    pub created: String,
}

/// `docker images`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageList {
    pub images: Vec<ImageSummary>,
    pub total: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

/// `docker build`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<usize>,
    pub errors: Vec<String>,
    pub output: LogWindow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

/// `docker logs`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogBundle {
    pub container: String,
    pub success: bool,
    pub lines: LogWindow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerState {
    pub status: String,
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MountPoint {
    pub source: String,
    pub destination: String,
    pub read_write: bool,
}

/// Container detail. Identifiers are never shortened here.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDetail {
    pub id: String,
    pub name: String,
    pub image: String,
    pub created: String,
    pub state: ContainerState,
    pub restart_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    pub ports: Vec<PortBinding>,
    pub mounts: Vec<MountPoint>,
    pub networks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDetail {
    pub id: String,
    pub repo_tags: Vec<String>,
    pub created: String,
    pub size: u64,
    pub architecture: String,
    pub os: String,
    pub layers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeDetail {
    pub name: String,
    pub driver: String,
    pub mountpoint: String,
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum InspectEntry {
    Container(ContainerDetail),
    Image(ImageDetail),
    Volume(VolumeDetail),
}

/// `docker inspect`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectRecord {
    pub success: bool,
    pub entries: Vec<InspectEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSummary {
    pub id: String,
    pub name: String,
    pub driver: String,
    pub scope: String,
}

/// `docker network ls`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkList {
    pub networks: Vec<NetworkSummary>,
    pub total: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSummary {
    pub name: String,
    pub driver: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mountpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// `docker volume ls`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeList {
    pub volumes: Vec<VolumeSummary>,
    pub total: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PullStatus {
    Downloaded,
    UpToDate,
    #[default]
    Error,
}

/// `docker pull`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullReport {
    pub image: String,
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    pub status: PullStatus,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeService {
    pub name: String,
    pub service: String,
    pub state: String,
    pub status: String,
    pub ports: Vec<PortBinding>,
}

/// `docker compose ps`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeServiceList {
    pub services: Vec<ComposeService>,
    pub total: usize,
    pub running: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeLogEntry {
    pub service: String,
    pub message: String,
}

/// `docker compose logs`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeLogBundle {
    /// Services in order of first appearance.
    pub services: Vec<String>,
    pub entries: LogWindow<ComposeLogEntry>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUsage {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_percent: Option<f64>,
    pub memory_usage: String,
    pub memory_limit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_percent: Option<f64>,
    pub net_io: String,
    pub block_io: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pids: Option<u64>,
}

/// `docker stats --no-stream`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUsageList {
    pub containers: Vec<ResourceUsage>,
    pub total: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

// =============================================================================
// VCS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStatus {
    Added,
    Deleted,
    #[default]
    Modified,
    Renamed,
}

impl std::fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DiffStatus::Added => "added",
            DiffStatus::Deleted => "deleted",
            DiffStatus::Modified => "modified",
            DiffStatus::Renamed => "renamed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffChunk {
    pub header: String,
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    pub additions: u32,
    pub deletions: u32,
}

/// One file in a unified diff.
///
/// `old_file` is set only for renames. Binary files carry no line counts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffFileEntry {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_file: Option<String>,
    pub status: DiffStatus,
    pub additions: u32,
    pub deletions: u32,
    pub binary: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<DiffChunk>>,
}

/// `git diff` / `gh pr diff`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffReport {
    pub files: Vec<DiffFileEntry>,
    pub files_changed: usize,
    pub total_additions: u32,
    pub total_deletions: u32,
    pub truncated: bool,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

// =============================================================================
// Security scanners
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl Severity {
    /// Case-insensitive parse; anything unrecognized is `Unknown`.
    pub fn parse(s: &str) -> Severity {
        match s.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Severity::Critical,
            "HIGH" => Severity::High,
            "MEDIUM" | "MODERATE" => Severity::Medium,
            "LOW" => Severity::Low,
            _ => Severity::Unknown,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub unknown: usize,
}

impl SeverityCounts {
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
            Severity::Unknown => self.unknown += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.unknown
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vulnerability {
    pub id: String,
    pub package: String,
    pub installed_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_version: Option<String>,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub target: String,
}

/// trivy
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityReport {
    pub vulnerabilities: Vec<Vulnerability>,
    pub summary: SeverityCounts,
    pub total: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingSeverity {
    Error,
    Warning,
    #[default]
    Info,
}

impl FindingSeverity {
    pub fn parse(s: &str) -> FindingSeverity {
        match s.trim().to_ascii_uppercase().as_str() {
            "ERROR" | "HIGH" | "CRITICAL" => FindingSeverity::Error,
            "WARNING" | "WARN" | "MEDIUM" => FindingSeverity::Warning,
            _ => FindingSeverity::Info,
        }
    }
}

impl std::fmt::Display for FindingSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FindingSeverity::Error => "ERROR",
            FindingSeverity::Warning => "WARNING",
            FindingSeverity::Info => "INFO",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub rule_id: String,
    pub path: String,
    pub line: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u64>,
    pub severity: FindingSeverity,
    pub message: String,
}

/// semgrep
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticAnalysisReport {
    pub findings: Vec<Finding>,
    pub summary: FindingCounts,
    pub total: usize,
    pub errors: Vec<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretFinding {
    pub rule_id: String,
    pub description: String,
    pub file: String,
    pub line: u64,
    pub secret: RedactedSecret,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// gitleaks
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretReport {
    pub findings: Vec<SecretFinding>,
    pub total: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

// =============================================================================
// HTTP APIs
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
}

/// An HTTP response captured with its headers (`gh api -i`, `curl -i`).
///
/// `status_code` is the protocol status; `exit_code` is the wrapping tool's
/// own verdict. The two may disagree.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub exit_code: i32,
    pub success: bool,
    /// Header names are lower-cased.
    pub headers: BTreeMap<String, String>,
    /// Decoded JSON, or the raw text as a JSON string.
    pub body: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

// =============================================================================
// Closed sum
// =============================================================================

/// Which parser to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    ProcessList,
    ImageList,
    Build,
    Logs,
    Inspect,
    NetworkList,
    VolumeList,
    Pull,
    ComposeServices,
    ComposeLogs,
    ResourceUsage,
    Diff,
    Vulnerabilities,
    StaticAnalysis,
    Secrets,
    Api,
}

/// Any parsed record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ParsedRecord {
    ProcessList(ProcessList),
    ImageList(ImageList),
    Build(BuildReport),
    Logs(LogBundle),
    Inspect(InspectRecord),
    NetworkList(NetworkList),
    VolumeList(VolumeList),
    Pull(PullReport),
    ComposeServices(ComposeServiceList),
    ComposeLogs(ComposeLogBundle),
    ResourceUsage(ResourceUsageList),
    Diff(DiffReport),
    Vulnerabilities(VulnerabilityReport),
    StaticAnalysis(StaticAnalysisReport),
    Secrets(SecretReport),
    Api(ApiResponse),
}

impl ParsedRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            ParsedRecord::ProcessList(_) => RecordKind::ProcessList,
            ParsedRecord::ImageList(_) => RecordKind::ImageList,
            ParsedRecord::Build(_) => RecordKind::Build,
            ParsedRecord::Logs(_) => RecordKind::Logs,
            ParsedRecord::Inspect(_) => RecordKind::Inspect,
            ParsedRecord::NetworkList(_) => RecordKind::NetworkList,
            ParsedRecord::VolumeList(_) => RecordKind::VolumeList,
            ParsedRecord::Pull(_) => RecordKind::Pull,
            ParsedRecord::ComposeServices(_) => RecordKind::ComposeServices,
            ParsedRecord::ComposeLogs(_) => RecordKind::ComposeLogs,
            ParsedRecord::ResourceUsage(_) => RecordKind::ResourceUsage,
            ParsedRecord::Diff(_) => RecordKind::Diff,
            ParsedRecord::Vulnerabilities(_) => RecordKind::Vulnerabilities,
            ParsedRecord::StaticAnalysis(_) => RecordKind::StaticAnalysis,
            ParsedRecord::Secrets(_) => RecordKind::Secrets,
            ParsedRecord::Api(_) => RecordKind::Api,
        }
    }
}
