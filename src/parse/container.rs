//! Container engine parsers (`docker` / `podman` compatible output).

use super::classify::failure_for;
use super::ndjson::decode_lines;
use super::ports::{container_and_protocol, leading_number, parse_ports};
use super::{non_empty, prefer_non_empty, ParseOptions};
use crate::output::RawInvocation;
use crate::record::{
    BuildReport, ContainerDetail, ContainerState, ContainerSummary, ImageDetail, ImageList,
    ImageSummary, InspectEntry, InspectRecord, LogBundle, MountPoint, NetworkList,
    NetworkSummary, PortBinding, ProcessList, PullReport, PullStatus, ResourceUsage,
    ResourceUsageList, VolumeDetail, VolumeList, VolumeSummary,
};
use crate::window::{split_lines, window_lines};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static BUILDKIT_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"writing image (sha256:[0-9a-f]+)").unwrap());
static CLASSIC_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Successfully built ([0-9a-f]+)").unwrap());
static BUILDKIT_STEP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\d+ \[(?:[\w.-]+ )?(\d+)/(\d+)\]").unwrap());
static CLASSIC_STEP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Step (\d+)/(\d+)").unwrap());
static PULL_DIGEST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Digest: (sha256:[0-9a-f]+)").unwrap());
static PULL_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Status: .* for (\S+)").unwrap());

// =============================================================================
// Tool JSON shapes
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct PsRow {
    #[serde(rename = "ID")]
    id: String,
    names: String,
    image: String,
    status: String,
    state: String,
    ports: String,
    running_for: String,
    created_at: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct ImageRow {
    #[serde(rename = "ID")]
    id: String,
    repository: String,
    tag: String,
    size: String,
    created_since: String,
    created_at: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct NetworkRow {
    #[serde(rename = "ID")]
    id: String,
    name: String,
    driver: String,
    scope: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct VolumeRow {
    name: String,
    driver: String,
    mountpoint: String,
    scope: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct StatsRow {
    #[serde(rename = "ID")]
    id: String,
    name: String,
    #[serde(rename = "CPUPerc")]
    cpu_perc: String,
    mem_usage: String,
    mem_perc: String,
    #[serde(rename = "NetIO")]
    net_io: String,
    #[serde(rename = "BlockIO")]
    block_io: String,
    #[serde(rename = "PIDs")]
    pids: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct ContainerInspect {
    id: String,
    name: String,
    created: String,
    image: String,
    config: Option<InspectConfig>,
    state: Option<InspectState>,
    restart_count: u64,
    platform: String,
    network_settings: Option<NetworkSettings>,
    mounts: Option<Vec<InspectMount>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct InspectConfig {
    image: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct InspectState {
    status: String,
    running: bool,
    exit_code: Option<i64>,
    started_at: String,
    finished_at: String,
    health: Option<InspectHealth>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct InspectHealth {
    status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct NetworkSettings {
    ports: Option<BTreeMap<String, Option<Vec<HostBinding>>>>,
    networks: Option<BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct HostBinding {
    host_port: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct InspectMount {
    source: String,
    destination: String,
    #[serde(rename = "RW")]
    rw: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct ImageInspect {
    id: String,
    repo_tags: Option<Vec<String>>,
    created: String,
    size: u64,
    architecture: String,
    os: String,
    #[serde(rename = "RootFS")]
    root_fs: Option<RootFs>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct RootFs {
    layers: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct VolumeInspect {
    name: String,
    driver: String,
    mountpoint: String,
    scope: String,
    created_at: String,
}

// =============================================================================
// Parsers
// =============================================================================

/// `docker ps --format '{{json .}}'`
pub fn parse_ps(raw: &RawInvocation, opts: &ParseOptions) -> ProcessList {
    let containers: Vec<ContainerSummary> = decode_lines::<PsRow>(&raw.stdout)
        .into_iter()
        .filter(|row| identified(&[&row.id, &row.names]))
        .map(|row| ContainerSummary {
            id: opts.ids.apply(&row.id),
            name: row.names,
            image: row.image,
            ports: parse_ports(&row.ports),
            created: prefer_non_empty(&[&row.running_for, &row.created_at]),
            status: row.status,
            state: row.state,
        })
        .collect();

    let running = containers.iter().filter(|c| is_running(c)).count();

    ProcessList {
        total: containers.len(),
        running,
        containers,
        success: raw.success(),
        error_type: failure_for(raw.exit_code, &raw.stderr),
    }
}

/// A row with none of its identifying fields is noise, not an entry.
fn identified(keys: &[&str]) -> bool {
    keys.iter().any(|k| !k.trim().is_empty())
}

fn is_running(c: &ContainerSummary) -> bool {
    if c.state.is_empty() {
        c.status.starts_with("Up")
    } else {
        c.state.eq_ignore_ascii_case("running")
    }
}

/// `docker images --format '{{json .}}'`
pub fn parse_images(raw: &RawInvocation, opts: &ParseOptions) -> ImageList {
    let images: Vec<ImageSummary> = decode_lines::<ImageRow>(&raw.stdout)
        .into_iter()
        .filter(|row| identified(&[&row.id, &row.repository]))
        .map(|row| ImageSummary {
            id: opts.ids.apply(&row.id),
            repository: row.repository,
            tag: row.tag,
            size: row.size,
            created: prefer_non_empty(&[&row.created_since, &row.created_at]),
        })
        .collect();

    ImageList {
        total: images.len(),
        images,
        success: raw.success(),
        error_type: failure_for(raw.exit_code, &raw.stderr),
    }
}

/// `docker build` (BuildKit or classic builder output).
///
/// Build progress goes to stderr under BuildKit and to stdout under the classic
/// builder, so both streams are scanned.
pub fn parse_build(raw: &RawInvocation, opts: &ParseOptions) -> BuildReport {
    let lines = split_lines(&raw.combined());
    let success = raw.success();

    let image_id = if success {
        lines.iter().find_map(|line| {
            BUILDKIT_IMAGE
                .captures(line)
                .or_else(|| CLASSIC_IMAGE.captures(line))
                .map(|c| opts.ids.apply(&c[1]))
        })
    } else {
        None
    };

    let steps = lines
        .iter()
        .filter_map(|line| {
            BUILDKIT_STEP
                .captures(line)
                .or_else(|| CLASSIC_STEP.captures(line))
                .and_then(|c| c[2].parse::<usize>().ok())
        })
        .max();

    let mut errors: Vec<String> = Vec::new();
    for line in &lines {
        if is_build_error(line) {
            let line = line.trim().to_string();
            if !errors.contains(&line) {
                errors.push(line);
            }
        }
    }
    if !success && errors.is_empty() {
        if let Some(last) = raw.stderr.lines().rev().find(|l| !l.trim().is_empty()) {
            errors.push(last.trim().to_string());
        }
    }

    let w = opts.limits.window;
    BuildReport {
        success,
        image_id,
        duration_ms: raw.duration_ms,
        steps,
        errors,
        output: window_lines(lines, w.head, w.tail, w.ceiling),
        error_type: failure_for(raw.exit_code, &raw.stderr),
    }
}

fn is_build_error(line: &str) -> bool {
    line.contains("ERROR") || line.contains("error:") || line.contains("did not complete successfully")
}

/// `docker logs <container>`
///
/// The engine replays the container's stdout and stderr on its own two
/// streams, so both are kept.
pub fn parse_logs(raw: &RawInvocation, container: &str, opts: &ParseOptions) -> LogBundle {
    let w = opts.limits.window;
    LogBundle {
        container: container.to_string(),
        success: raw.success(),
        lines: window_lines(split_lines(&raw.combined()), w.head, w.tail, w.ceiling),
        error_type: failure_for(raw.exit_code, &raw.stderr),
    }
}

/// `docker inspect` (containers, images and volumes; full identifiers kept).
pub fn parse_inspect(raw: &RawInvocation) -> InspectRecord {
    let values: Vec<serde_json::Value> = serde_json::from_str(raw.stdout.trim()).unwrap_or_default();

    InspectRecord {
        success: raw.success(),
        entries: values.into_iter().filter_map(inspect_entry).collect(),
        error_type: failure_for(raw.exit_code, &raw.stderr),
    }
}

fn inspect_entry(value: serde_json::Value) -> Option<InspectEntry> {
    let is_container = value.get("State").is_some();
    let is_image = value.get("RepoTags").is_some() || value.get("RootFS").is_some();
    let is_volume = value.get("Mountpoint").is_some();

    if is_container {
        let c: ContainerInspect = serde_json::from_value(value).ok()?;
        Some(InspectEntry::Container(container_detail(c)))
    } else if is_image {
        let i: ImageInspect = serde_json::from_value(value).ok()?;
        Some(InspectEntry::Image(ImageDetail {
            id: i.id,
            repo_tags: i.repo_tags.unwrap_or_default(),
            created: i.created,
            size: i.size,
            architecture: i.architecture,
            os: i.os,
            layers: i
                .root_fs
                .and_then(|r| r.layers)
                .map_or(0, |layers| layers.len()),
        }))
    } else if is_volume {
        let v: VolumeInspect = serde_json::from_value(value).ok()?;
        Some(InspectEntry::Volume(VolumeDetail {
            name: v.name,
            driver: v.driver,
            mountpoint: v.mountpoint,
            scope: v.scope,
            created: non_empty(&v.created_at),
        }))
    } else {
        tracing::debug!("Skipping inspect entry of unrecognized shape");
        None
    }
}

fn container_detail(c: ContainerInspect) -> ContainerDetail {
    let state = c.state.unwrap_or_default();
    let network = c.network_settings.unwrap_or_default();

    let ports = network
        .ports
        .unwrap_or_default()
        .into_iter()
        .flat_map(|(key, bindings)| {
            let (container, protocol) = container_and_protocol(&key);
            let hosts: Vec<PortBinding> = bindings
                .unwrap_or_default()
                .iter()
                .map(|b| PortBinding {
                    host: Some(leading_number(&b.host_port)),
                    container,
                    protocol,
                })
                .collect();
            if hosts.is_empty() {
                vec![PortBinding {
                    host: None,
                    container,
                    protocol,
                }]
            } else {
                hosts
            }
        })
        .collect();

    let image = c
        .config
        .map(|cfg| cfg.image)
        .filter(|i| !i.is_empty())
        .unwrap_or(c.image);

    ContainerDetail {
        id: c.id,
        name: c.name.trim_start_matches('/').to_string(),
        image,
        created: c.created,
        state: ContainerState {
            status: state.status,
            running: state.running,
            exit_code: state.exit_code,
            started_at: non_empty(&state.started_at),
            finished_at: non_empty(&state.finished_at)
                .filter(|t| !t.starts_with("0001-01-01")),
            health: state.health.and_then(|h| non_empty(&h.status)),
        },
        restart_count: c.restart_count,
        platform: non_empty(&c.platform),
        ports,
        mounts: c
            .mounts
            .unwrap_or_default()
            .into_iter()
            .map(|m| MountPoint {
                source: m.source,
                destination: m.destination,
                read_write: m.rw,
            })
            .collect(),
        networks: network.networks.unwrap_or_default().into_keys().collect(),
    }
}

/// `docker network ls --format '{{json .}}'`
pub fn parse_networks(raw: &RawInvocation, opts: &ParseOptions) -> NetworkList {
    let networks: Vec<NetworkSummary> = decode_lines::<NetworkRow>(&raw.stdout)
        .into_iter()
        .filter(|row| identified(&[&row.id, &row.name]))
        .map(|row| NetworkSummary {
            id: opts.ids.apply(&row.id),
            name: row.name,
            driver: row.driver,
            scope: row.scope,
        })
        .collect();

    NetworkList {
        total: networks.len(),
        networks,
        success: raw.success(),
        error_type: failure_for(raw.exit_code, &raw.stderr),
    }
}

/// `docker volume ls --format '{{json .}}'`
pub fn parse_volumes(raw: &RawInvocation) -> VolumeList {
    let volumes: Vec<VolumeSummary> = decode_lines::<VolumeRow>(&raw.stdout)
        .into_iter()
        .filter(|row| identified(&[&row.name]))
        .map(|row| VolumeSummary {
            name: row.name,
            driver: row.driver,
            mountpoint: non_empty(&row.mountpoint),
            scope: non_empty(&row.scope),
        })
        .collect();

    VolumeList {
        total: volumes.len(),
        volumes,
        success: raw.success(),
        error_type: failure_for(raw.exit_code, &raw.stderr),
    }
}

/// `docker pull <reference>`
///
/// When `reference` is empty it is recovered from the final status line.
pub fn parse_pull(raw: &RawInvocation, reference: &str) -> PullReport {
    let output = raw.combined();
    let reference = if reference.trim().is_empty() {
        PULL_REFERENCE
            .captures(&output)
            .map(|c| c[1].to_string())
            .unwrap_or_default()
    } else {
        reference.trim().to_string()
    };
    let (image, tag) = split_reference(&reference);

    let success = raw.success();
    let status = if !success {
        PullStatus::Error
    } else if output.contains("Image is up to date") {
        PullStatus::UpToDate
    } else {
        PullStatus::Downloaded
    };

    PullReport {
        image,
        tag,
        digest: PULL_DIGEST.captures(&output).map(|c| c[1].to_string()),
        status,
        success,
        error_type: failure_for(raw.exit_code, &raw.stderr),
    }
}

/// Split `repo[:tag][@digest]` into repository and tag (default `latest`).
fn split_reference(reference: &str) -> (String, String) {
    let without_digest = reference.split('@').next().unwrap_or_default();
    let name_start = without_digest.rfind('/').map_or(0, |i| i + 1);
    match without_digest[name_start..].rfind(':') {
        Some(i) => {
            let split = name_start + i;
            (
                without_digest[..split].to_string(),
                without_digest[split + 1..].to_string(),
            )
        }
        None => (without_digest.to_string(), "latest".to_string()),
    }
}

/// `docker stats --no-stream --format '{{json .}}'`
pub fn parse_stats(raw: &RawInvocation, opts: &ParseOptions) -> ResourceUsageList {
    let containers: Vec<ResourceUsage> = decode_lines::<StatsRow>(&raw.stdout)
        .into_iter()
        .filter(|row| identified(&[&row.id, &row.name]))
        .map(|row| {
            let (usage, limit) = row
                .mem_usage
                .split_once(" / ")
                .map(|(u, l)| (u.trim().to_string(), l.trim().to_string()))
                .unwrap_or_else(|| (row.mem_usage.trim().to_string(), String::new()));
            ResourceUsage {
                id: opts.ids.apply(&row.id),
                name: row.name,
                cpu_percent: percent(&row.cpu_perc),
                memory_usage: usage,
                memory_limit: limit,
                memory_percent: percent(&row.mem_perc),
                net_io: row.net_io,
                block_io: row.block_io,
                pids: row.pids.trim().parse().ok(),
            }
        })
        .collect();

    ResourceUsageList {
        total: containers.len(),
        containers,
        success: raw.success(),
        error_type: failure_for(raw.exit_code, &raw.stderr),
    }
}

fn percent(text: &str) -> Option<f64> {
    text.trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
