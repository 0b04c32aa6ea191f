//! Security scanner parsers: trivy, semgrep, gitleaks.
//!
//! All three tools exit non-zero when they find something, so the exit code
//! is never used to decide whether there is a report to parse. A run that
//! produced a decodable report succeeded whatever its exit code; otherwise the
//! exit code and stderr decide.

use super::classify::failure_for;
use super::{non_empty, ParseOptions};
use crate::output::RawInvocation;
use crate::record::{
    FailureKind, Finding, FindingCounts, FindingSeverity, SecretFinding, SecretReport, Severity,
    SeverityCounts, StaticAnalysisReport, Vulnerability, VulnerabilityReport,
};
use crate::window::redact;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// The report document, if stdout holds one of the expected JSON shape.
fn decode_report<T: DeserializeOwned>(stdout: &str, shape: fn(&Value) -> bool) -> Option<T> {
    let value: Value = serde_json::from_str(stdout.trim()).ok()?;
    if !shape(&value) {
        tracing::debug!("Scanner output is not a report document");
        return None;
    }
    serde_json::from_value(value)
        .map_err(|e| tracing::debug!(error = %e, "Scanner report did not decode"))
        .ok()
}

fn run_status(decoded: bool, raw: &RawInvocation) -> (bool, Option<FailureKind>) {
    if decoded {
        (true, None)
    } else {
        (raw.success(), failure_for(raw.exit_code, &raw.stderr))
    }
}

// =============================================================================
// trivy
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct TrivyReport {
    results: Option<Vec<TrivyResult>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct TrivyResult {
    target: String,
    vulnerabilities: Option<Vec<TrivyVulnerability>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct TrivyVulnerability {
    #[serde(rename = "VulnerabilityID")]
    vulnerability_id: String,
    pkg_name: String,
    installed_version: String,
    fixed_version: String,
    severity: String,
    title: String,
}

/// `trivy image|fs --format json`
pub fn parse_trivy(raw: &RawInvocation) -> VulnerabilityReport {
    let decoded: Option<TrivyReport> = decode_report(&raw.stdout, Value::is_object);
    let (success, error_type) = run_status(decoded.is_some(), raw);
    let report = decoded.unwrap_or_default();

    let mut summary = SeverityCounts::default();
    let mut vulnerabilities = Vec::new();
    for result in report.results.unwrap_or_default() {
        for v in result.vulnerabilities.unwrap_or_default() {
            let severity = Severity::parse(&v.severity);
            summary.add(severity);
            vulnerabilities.push(Vulnerability {
                id: v.vulnerability_id,
                package: v.pkg_name,
                installed_version: v.installed_version,
                fixed_version: non_empty(&v.fixed_version),
                severity,
                title: non_empty(&v.title),
                target: result.target.clone(),
            });
        }
    }

    VulnerabilityReport {
        total: vulnerabilities.len(),
        vulnerabilities,
        summary,
        success,
        error_type,
    }
}

// =============================================================================
// semgrep
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SemgrepReport {
    results: Vec<SemgrepResult>,
    errors: Vec<SemgrepError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SemgrepResult {
    check_id: String,
    path: String,
    start: SemgrepPosition,
    end: Option<SemgrepPosition>,
    extra: SemgrepExtra,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SemgrepPosition {
    line: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SemgrepExtra {
    message: String,
    severity: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SemgrepError {
    message: String,
    #[serde(rename = "type")]
    kind: serde_json::Value,
}

/// `semgrep --json`
pub fn parse_semgrep(raw: &RawInvocation) -> StaticAnalysisReport {
    let decoded: Option<SemgrepReport> = decode_report(&raw.stdout, Value::is_object);
    let (success, error_type) = run_status(decoded.is_some(), raw);
    let report = decoded.unwrap_or_default();

    let mut summary = FindingCounts::default();
    let findings: Vec<Finding> = report
        .results
        .into_iter()
        .map(|r| {
            let severity = FindingSeverity::parse(&r.extra.severity);
            match severity {
                FindingSeverity::Error => summary.error += 1,
                FindingSeverity::Warning => summary.warning += 1,
                FindingSeverity::Info => summary.info += 1,
            }
            let line = r.start.line;
            Finding {
                rule_id: r.check_id,
                path: r.path,
                line,
                end_line: r.end.map(|e| e.line).filter(|&end| end > line),
                severity,
                message: r.extra.message.trim().to_string(),
            }
        })
        .collect();

    let errors = report
        .errors
        .into_iter()
        .filter_map(|e| non_empty(&e.message).or_else(|| error_kind(&e.kind)))
        .collect();

    StaticAnalysisReport {
        total: findings.len(),
        findings,
        summary,
        errors,
        success,
        error_type,
    }
}

/// semgrep reports `type` as a string or as `["Kind", ...]`.
fn error_kind(kind: &serde_json::Value) -> Option<String> {
    match kind {
        serde_json::Value::String(s) => non_empty(s),
        serde_json::Value::Array(items) => items.first().and_then(|v| v.as_str()).and_then(non_empty),
        _ => None,
    }
}

// =============================================================================
// gitleaks
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct GitleaksFinding {
    #[serde(rename = "RuleID")]
    rule_id: String,
    description: String,
    file: String,
    start_line: u64,
    secret: String,
    commit: String,
    author: String,
}

/// `gitleaks detect --report-format json --report-path /dev/stdout`
///
/// Secrets are masked here; the unmasked value never leaves this function.
pub fn parse_gitleaks(raw: &RawInvocation, opts: &ParseOptions) -> SecretReport {
    let decoded: Option<Vec<Value>> = decode_report(&raw.stdout, Value::is_array);
    let (success, error_type) = run_status(decoded.is_some(), raw);
    let raw_findings = decoded.unwrap_or_default();

    let findings: Vec<SecretFinding> = raw_findings
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|v| serde_json::from_value::<GitleaksFinding>(v).ok())
        .map(|f| SecretFinding {
            rule_id: f.rule_id,
            description: f.description,
            file: f.file,
            line: f.start_line,
            secret: redact(&f.secret),
            commit: non_empty(&f.commit).map(|c| opts.ids.apply(&c)),
            author: non_empty(&f.author),
        })
        .collect();

    SecretReport {
        total: findings.len(),
        findings,
        success,
        error_type,
    }
}
