//! Compact projections of parsed records.
//!
//! A compact record only ever drops fields or replaces a list with a count.
//! Compacting a compact record returns it unchanged (for the same rules), so
//! `r.compact(rules).compact(rules) == r.compact(rules)`.
//!
//! Which fields survive is decided by [`CompactRules`], passed explicitly so
//! callers can pin the rule set their consumers were built against.

use crate::record::{
    ApiResponse, BuildReport, ComposeLogBundle, ComposeServiceList, DiffReport, DiffStatus,
    FailureKind, FindingCounts, ImageList, InspectEntry, InspectRecord, LogBundle, NetworkList,
    Pagination, ParsedRecord, ProcessList, PullReport, PullStatus, ResourceUsageList,
    SecretReport, SeverityCounts, StaticAnalysisReport, VolumeList, VulnerabilityReport,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// Rules
// =============================================================================

/// Field-retention rules for pull reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullRules {
    pub keep_digest: bool,
    pub keep_status: bool,
}

impl Default for PullRules {
    /// Status kept, digest dropped.
    fn default() -> Self {
        Self {
            keep_digest: false,
            keep_status: true,
        }
    }
}

/// Versioned compaction rules.
///
/// `Default` is the current rule set. Earlier sets stay available by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactRules {
    pub pull: PullRules,
}

impl CompactRules {
    /// First rule set: pull reports keep both digest and status.
    pub fn v1() -> Self {
        Self {
            pull: PullRules {
                keep_digest: true,
                keep_status: true,
            },
        }
    }

    pub fn with_pull(mut self, pull: PullRules) -> Self {
        self.pull = pull;
        self
    }
}

/// Projection to a smaller record. Total; never fails.
pub trait Compact {
    type Output;

    fn compact(&self, rules: &CompactRules) -> Self::Output;
}

// =============================================================================
// Compact record types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactContainer {
    pub id: String,
    pub name: String,
    pub image: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactProcessList {
    pub containers: Vec<CompactContainer>,
    pub total: usize,
    pub running: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactImage {
    pub id: String,
    pub repository: String,
    pub tag: String,
    pub size: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactImageList {
    pub images: Vec<CompactImage>,
    pub total: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactBuild {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<usize>,
    pub error_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactLogs {
    pub container: String,
    pub success: bool,
    pub total_lines: usize,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InspectKind {
    Container,
    Image,
    Volume,
}

impl std::fmt::Display for InspectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            InspectKind::Container => "container",
            InspectKind::Image => "image",
            InspectKind::Volume => "volume",
        })
    }
}

/// One inspected object reduced to what identifies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactInspectEntry {
    pub kind: InspectKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactInspect {
    pub success: bool,
    pub entries: Vec<CompactInspectEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactNetwork {
    pub name: String,
    pub driver: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactNetworkList {
    pub networks: Vec<CompactNetwork>,
    pub total: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactVolumeList {
    pub names: Vec<String>,
    pub total: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactPull {
    pub image: String,
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PullStatus>,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactComposeService {
    pub service: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactComposeServices {
    pub services: Vec<CompactComposeService>,
    pub total: usize,
    pub running: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactComposeLogs {
    pub services: Vec<String>,
    pub total_lines: usize,
    pub truncated: bool,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactUsage {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactResourceUsage {
    pub containers: Vec<CompactUsage>,
    pub total: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactDiffFile {
    pub file: String,
    pub status: DiffStatus,
    pub additions: u32,
    pub deletions: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactDiff {
    pub files: Vec<CompactDiffFile>,
    pub files_changed: usize,
    pub total_additions: u32,
    pub total_deletions: u32,
    pub truncated: bool,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactVulnerabilities {
    pub summary: SeverityCounts,
    pub total: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactStaticAnalysis {
    pub summary: FindingCounts,
    pub total: usize,
    pub error_count: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactSecret {
    pub rule_id: String,
    pub file: String,
    pub line: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactSecrets {
    pub findings: Vec<CompactSecret>,
    pub total: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactApi {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub exit_code: i32,
    pub success: bool,
    pub body: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
}

/// Any compact record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CompactRecord {
    ProcessList(CompactProcessList),
    ImageList(CompactImageList),
    Build(CompactBuild),
    Logs(CompactLogs),
    Inspect(CompactInspect),
    NetworkList(CompactNetworkList),
    VolumeList(CompactVolumeList),
    Pull(CompactPull),
    ComposeServices(CompactComposeServices),
    ComposeLogs(CompactComposeLogs),
    ResourceUsage(CompactResourceUsage),
    Diff(CompactDiff),
    Vulnerabilities(CompactVulnerabilities),
    StaticAnalysis(CompactStaticAnalysis),
    Secrets(CompactSecrets),
    Api(CompactApi),
}

// =============================================================================
// Full -> compact
// =============================================================================

impl Compact for ProcessList {
    type Output = CompactProcessList;

    fn compact(&self, _: &CompactRules) -> CompactProcessList {
        CompactProcessList {
            containers: self
                .containers
                .iter()
                .map(|c| CompactContainer {
                    id: c.id.clone(),
                    name: c.name.clone(),
                    image: c.image.clone(),
                    status: c.status.clone(),
                })
                .collect(),
            total: self.total,
            running: self.running,
            success: self.success,
            error_type: self.error_type,
        }
    }
}

impl Compact for ImageList {
    type Output = CompactImageList;

    fn compact(&self, _: &CompactRules) -> CompactImageList {
        CompactImageList {
            images: self
                .images
                .iter()
                .map(|i| CompactImage {
                    id: i.id.clone(),
                    repository: i.repository.clone(),
                    tag: i.tag.clone(),
                    size: i.size.clone(),
                })
                .collect(),
            total: self.total,
            success: self.success,
            error_type: self.error_type,
        }
    }
}

impl Compact for BuildReport {
    type Output = CompactBuild;

    fn compact(&self, _: &CompactRules) -> CompactBuild {
        CompactBuild {
            success: self.success,
            image_id: self.image_id.clone(),
            duration_ms: self.duration_ms,
            steps: self.steps,
            error_count: self.errors.len(),
            error_type: self.error_type,
        }
    }
}

impl Compact for LogBundle {
    type Output = CompactLogs;

    fn compact(&self, _: &CompactRules) -> CompactLogs {
        CompactLogs {
            container: self.container.clone(),
            success: self.success,
            total_lines: self.lines.total(),
            truncated: self.lines.truncated(),
            error_type: self.error_type,
        }
    }
}

impl Compact for InspectEntry {
    type Output = CompactInspectEntry;

    fn compact(&self, _: &CompactRules) -> CompactInspectEntry {
        match self {
            InspectEntry::Container(c) => CompactInspectEntry {
                kind: InspectKind::Container,
                name: c.name.clone(),
                id: Some(c.id.clone()),
                status: Some(c.state.status.clone()),
            },
            InspectEntry::Image(i) => CompactInspectEntry {
                kind: InspectKind::Image,
                name: i.repo_tags.first().cloned().unwrap_or_default(),
                id: Some(i.id.clone()),
                status: None,
            },
            InspectEntry::Volume(v) => CompactInspectEntry {
                kind: InspectKind::Volume,
                name: v.name.clone(),
                id: None,
                status: None,
            },
        }
    }
}

impl Compact for InspectRecord {
    type Output = CompactInspect;

    fn compact(&self, rules: &CompactRules) -> CompactInspect {
        CompactInspect {
            success: self.success,
            entries: self.entries.iter().map(|e| e.compact(rules)).collect(),
            error_type: self.error_type,
        }
    }
}

impl Compact for NetworkList {
    type Output = CompactNetworkList;

    fn compact(&self, _: &CompactRules) -> CompactNetworkList {
        CompactNetworkList {
            networks: self
                .networks
                .iter()
                .map(|n| CompactNetwork {
                    name: n.name.clone(),
                    driver: n.driver.clone(),
                })
                .collect(),
            total: self.total,
            success: self.success,
            error_type: self.error_type,
        }
    }
}

impl Compact for VolumeList {
    type Output = CompactVolumeList;

    fn compact(&self, _: &CompactRules) -> CompactVolumeList {
        CompactVolumeList {
            names: self.volumes.iter().map(|v| v.name.clone()).collect(),
            total: self.total,
            success: self.success,
            error_type: self.error_type,
        }
    }
}

impl Compact for PullReport {
    type Output = CompactPull;

    fn compact(&self, rules: &CompactRules) -> CompactPull {
        CompactPull {
            image: self.image.clone(),
            tag: self.tag.clone(),
            digest: self.digest.clone().filter(|_| rules.pull.keep_digest),
            status: rules.pull.keep_status.then_some(self.status),
            success: self.success,
        }
    }
}

impl Compact for ComposeServiceList {
    type Output = CompactComposeServices;

    fn compact(&self, _: &CompactRules) -> CompactComposeServices {
        CompactComposeServices {
            services: self
                .services
                .iter()
                .map(|s| CompactComposeService {
                    service: s.service.clone(),
                    state: s.state.clone(),
                })
                .collect(),
            total: self.total,
            running: self.running,
            success: self.success,
            error_type: self.error_type,
        }
    }
}

impl Compact for ComposeLogBundle {
    type Output = CompactComposeLogs;

    fn compact(&self, _: &CompactRules) -> CompactComposeLogs {
        CompactComposeLogs {
            services: self.services.clone(),
            total_lines: self.entries.total(),
            truncated: self.entries.truncated(),
            success: self.success,
            error_type: self.error_type,
        }
    }
}

impl Compact for ResourceUsageList {
    type Output = CompactResourceUsage;

    fn compact(&self, _: &CompactRules) -> CompactResourceUsage {
        CompactResourceUsage {
            containers: self
                .containers
                .iter()
                .map(|c| CompactUsage {
                    name: c.name.clone(),
                    cpu_percent: c.cpu_percent,
                    memory_percent: c.memory_percent,
                })
                .collect(),
            total: self.total,
            success: self.success,
            error_type: self.error_type,
        }
    }
}

impl Compact for DiffReport {
    type Output = CompactDiff;

    fn compact(&self, _: &CompactRules) -> CompactDiff {
        CompactDiff {
            files: self
                .files
                .iter()
                .map(|f| CompactDiffFile {
                    file: f.file.clone(),
                    status: f.status,
                    additions: f.additions,
                    deletions: f.deletions,
                })
                .collect(),
            files_changed: self.files_changed,
            total_additions: self.total_additions,
            total_deletions: self.total_deletions,
            truncated: self.truncated,
            success: self.success,
            error_type: self.error_type,
        }
    }
}

impl Compact for VulnerabilityReport {
    type Output = CompactVulnerabilities;

    fn compact(&self, _: &CompactRules) -> CompactVulnerabilities {
        CompactVulnerabilities {
            summary: self.summary,
            total: self.total,
            success: self.success,
            error_type: self.error_type,
        }
    }
}

impl Compact for StaticAnalysisReport {
    type Output = CompactStaticAnalysis;

    fn compact(&self, _: &CompactRules) -> CompactStaticAnalysis {
        CompactStaticAnalysis {
            summary: self.summary,
            total: self.total,
            error_count: self.errors.len(),
            success: self.success,
            error_type: self.error_type,
        }
    }
}

impl Compact for SecretReport {
    type Output = CompactSecrets;

    fn compact(&self, _: &CompactRules) -> CompactSecrets {
        CompactSecrets {
            findings: self
                .findings
                .iter()
                .map(|f| CompactSecret {
                    rule_id: f.rule_id.clone(),
                    file: f.file.clone(),
                    line: f.line,
                })
                .collect(),
            total: self.total,
            success: self.success,
            error_type: self.error_type,
        }
    }
}

impl Compact for ApiResponse {
    type Output = CompactApi;

    fn compact(&self, _: &CompactRules) -> CompactApi {
        CompactApi {
            status_code: self.status_code,
            exit_code: self.exit_code,
            success: self.success,
            body: self.body.clone(),
            pagination: self.pagination.clone(),
            error_type: self.error_type,
        }
    }
}

impl Compact for ParsedRecord {
    type Output = CompactRecord;

    fn compact(&self, rules: &CompactRules) -> CompactRecord {
        match self {
            ParsedRecord::ProcessList(r) => CompactRecord::ProcessList(r.compact(rules)),
            ParsedRecord::ImageList(r) => CompactRecord::ImageList(r.compact(rules)),
            ParsedRecord::Build(r) => CompactRecord::Build(r.compact(rules)),
            ParsedRecord::Logs(r) => CompactRecord::Logs(r.compact(rules)),
            ParsedRecord::Inspect(r) => CompactRecord::Inspect(r.compact(rules)),
            ParsedRecord::NetworkList(r) => CompactRecord::NetworkList(r.compact(rules)),
            ParsedRecord::VolumeList(r) => CompactRecord::VolumeList(r.compact(rules)),
            ParsedRecord::Pull(r) => CompactRecord::Pull(r.compact(rules)),
            ParsedRecord::ComposeServices(r) => CompactRecord::ComposeServices(r.compact(rules)),
            ParsedRecord::ComposeLogs(r) => CompactRecord::ComposeLogs(r.compact(rules)),
            ParsedRecord::ResourceUsage(r) => CompactRecord::ResourceUsage(r.compact(rules)),
            ParsedRecord::Diff(r) => CompactRecord::Diff(r.compact(rules)),
            ParsedRecord::Vulnerabilities(r) => CompactRecord::Vulnerabilities(r.compact(rules)),
            ParsedRecord::StaticAnalysis(r) => CompactRecord::StaticAnalysis(r.compact(rules)),
            ParsedRecord::Secrets(r) => CompactRecord::Secrets(r.compact(rules)),
            ParsedRecord::Api(r) => CompactRecord::Api(r.compact(rules)),
        }
    }
}

// =============================================================================
// Compact -> compact
// =============================================================================

macro_rules! already_compact {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Compact for $ty {
                type Output = $ty;

                fn compact(&self, _: &CompactRules) -> $ty {
                    self.clone()
                }
            }
        )*
    };
}

already_compact!(
    CompactProcessList,
    CompactImageList,
    CompactBuild,
    CompactLogs,
    CompactInspect,
    CompactNetworkList,
    CompactVolumeList,
    CompactComposeServices,
    CompactComposeLogs,
    CompactResourceUsage,
    CompactDiff,
    CompactVulnerabilities,
    CompactStaticAnalysis,
    CompactSecrets,
    CompactApi,
);

/// Pull rules can only drop fields, so re-applying them is stable.
impl Compact for CompactPull {
    type Output = CompactPull;

    fn compact(&self, rules: &CompactRules) -> CompactPull {
        CompactPull {
            digest: self.digest.clone().filter(|_| rules.pull.keep_digest),
            status: self.status.filter(|_| rules.pull.keep_status),
            ..self.clone()
        }
    }
}

impl Compact for CompactRecord {
    type Output = CompactRecord;

    fn compact(&self, rules: &CompactRules) -> CompactRecord {
        match self {
            CompactRecord::Pull(r) => CompactRecord::Pull(r.compact(rules)),
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::RawInvocation;
    use crate::parse::{parse_output, ParseOptions};
    use crate::record::RecordKind;

    fn parsed(kind: RecordKind, stdout: &str, stderr: &str, exit_code: i32) -> ParsedRecord {
        parse_output(
            kind,
            &RawInvocation::new(stdout, stderr, exit_code),
            Some("subject"),
            &ParseOptions::default(),
        )
    }

    fn samples() -> Vec<ParsedRecord> {
        vec![
            parsed(
                RecordKind::ProcessList,
                r#"{"ID":"abc","Names":"web","Image":"nginx","Status":"Up","State":"running","Ports":"80/tcp"}"#,
                "",
                0,
            ),
            parsed(RecordKind::Build, "", "ERROR: failed to solve\n", 1),
            parsed(RecordKind::Logs, "a\nb\n", "", 0),
            parsed(
                RecordKind::Pull,
                "Digest: sha256:00ff\nStatus: Downloaded newer image for nginx:latest\n",
                "",
                0,
            ),
            parsed(
                RecordKind::Diff,
                "diff --git a/x b/x\n--- a/x\n+++ b/x\n@@ -1 +1 @@\n-a\n+b\n",
                "",
                0,
            ),
            parsed(
                RecordKind::Vulnerabilities,
                r#"{"Results":[{"Target":"t","Vulnerabilities":[{"VulnerabilityID":"CVE-1","Severity":"LOW"}]}]}"#,
                "",
                1,
            ),
            parsed(
                RecordKind::Secrets,
                r#"[{"RuleID":"r","File":"f","StartLine":2,"Secret":"supersecretvalue"}]"#,
                "",
                1,
            ),
            parsed(RecordKind::Api, "HTTP/1.1 200 OK\nX-A: b\n\n{}", "", 0),
        ]
    }

    #[test]
    fn test_compact_is_idempotent() {
        for rules in [CompactRules::default(), CompactRules::v1()] {
            for record in samples() {
                let once = record.compact(&rules);
                assert_eq!(once.compact(&rules), once, "{:?}", record.kind());
            }
        }
    }

    #[test]
    fn test_build_errors_become_count() {
        let CompactRecord::Build(build) = samples()[1].compact(&CompactRules::default()) else {
            panic!("expected build");
        };
        assert_eq!(build.error_count, 1);
        assert!(!build.success);
        let json = serde_json::to_value(&build).unwrap();
        assert!(json.get("errors").is_none());
        assert!(json.get("output").is_none());
    }

    #[test]
    fn test_pull_rules_default_drops_digest() {
        let CompactRecord::Pull(pull) = samples()[3].compact(&CompactRules::default()) else {
            panic!("expected pull");
        };
        assert_eq!(pull.digest, None);
        assert_eq!(pull.status, Some(PullStatus::Downloaded));
    }

    #[test]
    fn test_pull_rules_v1_keeps_digest() {
        let CompactRecord::Pull(pull) = samples()[3].compact(&CompactRules::v1()) else {
            panic!("expected pull");
        };
        assert_eq!(pull.digest.as_deref(), Some("sha256:00ff"));
        assert_eq!(pull.status, Some(PullStatus::Downloaded));
    }

    #[test]
    fn test_pull_rules_can_drop_status() {
        let rules = CompactRules::default().with_pull(PullRules {
            keep_digest: false,
            keep_status: false,
        });
        let compact = samples()[3].compact(&rules);
        let json = serde_json::to_value(&compact).unwrap();
        assert_eq!(json["type"], "pull");
        assert!(json.get("status").is_none());
        assert!(json.get("digest").is_none());

        // A stricter rule set applied to a v1 projection drops the same fields.
        let from_v1 = samples()[3].compact(&CompactRules::v1()).compact(&rules);
        assert_eq!(from_v1, compact);
    }

    #[test]
    fn test_lists_drop_ports_and_bodies() {
        let compact = samples()[0].compact(&CompactRules::default());
        let json = serde_json::to_value(&compact).unwrap();
        assert!(json["containers"][0].get("ports").is_none());
        assert_eq!(json["running"], 1);

        let CompactRecord::Logs(logs) = samples()[2].compact(&CompactRules::default()) else {
            panic!("expected logs");
        };
        assert_eq!(logs.total_lines, 2);
        assert!(!logs.truncated);
    }

    #[test]
    fn test_vulnerabilities_keep_summary_only() {
        let CompactRecord::Vulnerabilities(v) = samples()[5].compact(&CompactRules::default())
        else {
            panic!("expected vulnerabilities");
        };
        assert_eq!(v.summary.low, 1);
        assert_eq!(v.total, 1);
    }

    #[test]
    fn test_failed_runs_stay_failed() {
        let daemon = "Cannot connect to the Docker daemon at unix:///var/run/docker.sock.\n";
        let failures = [
            parsed(RecordKind::ProcessList, "", daemon, 1),
            parsed(RecordKind::ResourceUsage, "", daemon, 1),
            parsed(RecordKind::Diff, "", "fatal: bad revision 'nope'\n", 128),
            parsed(RecordKind::Secrets, "", "permission denied\n", 126),
        ];
        for record in &failures {
            let json = serde_json::to_value(record.compact(&CompactRules::default())).unwrap();
            assert_eq!(json["success"], false, "{:?}", record.kind());
            assert!(json["errorType"].is_string(), "{:?}", record.kind());
        }

        let CompactRecord::ProcessList(ps) = failures[0].compact(&CompactRules::default()) else {
            panic!("expected process list");
        };
        assert_eq!(ps.error_type, Some(FailureKind::DaemonUnavailable));

        let json = serde_json::to_value(samples()[0].compact(&CompactRules::default())).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("errorType").is_none());
    }

    #[test]
    fn test_secrets_drop_masked_value() {
        let json = serde_json::to_string(&samples()[6].compact(&CompactRules::default())).unwrap();
        assert!(!json.contains("sup***lue"));
        assert!(json.contains("\"line\":2"));
    }

    #[test]
    fn test_rules_deserialize_with_defaults() {
        let rules: CompactRules = serde_json::from_str(r#"{"pull": {"keep_digest": true}}"#).unwrap();
        assert!(rules.pull.keep_digest);
        assert!(rules.pull.keep_status);
        let rules: CompactRules = serde_json::from_str("{}").unwrap();
        assert_eq!(rules, CompactRules::default());
    }
}
