//! `docker compose` parsers.

use super::classify::failure_for;
use super::ndjson::decode_array_or_lines;
use super::ports::{parse_ports, protocol};
use super::ParseOptions;
use crate::output::RawInvocation;
use crate::record::{
    ComposeLogBundle, ComposeLogEntry, ComposeService, ComposeServiceList, PortBinding,
    PortNumber,
};
use crate::window::window_lines;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct ServiceRow {
    name: String,
    service: String,
    state: String,
    status: String,
    publishers: Option<Vec<Publisher>>,
    ports: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct Publisher {
    target_port: u32,
    published_port: u32,
    protocol: String,
}

impl Publisher {
    fn binding(&self) -> PortBinding {
        PortBinding {
            host: (self.published_port != 0).then_some(PortNumber::Number(self.published_port)),
            container: PortNumber::Number(self.target_port),
            protocol: protocol(&self.protocol),
        }
    }
}

/// `docker compose ps --format json`
///
/// Accepts both the JSON array older releases print and the one-object-per-line
/// form of newer ones. Structured `Publishers` win over the `Ports` string.
pub fn parse_compose_ps(raw: &RawInvocation) -> ComposeServiceList {
    let services: Vec<ComposeService> = decode_array_or_lines::<ServiceRow>(&raw.stdout)
        .into_iter()
        .filter(|row| !row.name.trim().is_empty() || !row.service.trim().is_empty())
        .map(|row| {
            let ports = match &row.publishers {
                Some(publishers) if !publishers.is_empty() => {
                    let mut ports: Vec<PortBinding> =
                        publishers.iter().map(Publisher::binding).collect();
                    // IPv4 and IPv6 listeners are reported separately.
                    ports.dedup();
                    ports
                }
                _ => parse_ports(&row.ports),
            };
            ComposeService {
                name: row.name,
                service: row.service,
                state: row.state,
                status: row.status,
                ports,
            }
        })
        .collect();

    let running = services
        .iter()
        .filter(|s| s.state.eq_ignore_ascii_case("running"))
        .count();

    ComposeServiceList {
        total: services.len(),
        running,
        services,
        success: raw.success(),
        error_type: failure_for(raw.exit_code, &raw.stderr),
    }
}

/// `docker compose logs`
///
/// Lines look like `web-1  | message`. A line without a service prefix
/// continues the previous entry's service.
pub fn parse_compose_logs(raw: &RawInvocation, opts: &ParseOptions) -> ComposeLogBundle {
    let mut services: Vec<String> = Vec::new();
    let mut entries = Vec::new();
    let mut current = String::new();

    for line in raw.stdout.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let message = match split_prefix(line) {
            Some((service, message)) => {
                current = service.to_string();
                message
            }
            None => line,
        };
        if !current.is_empty() && !services.contains(&current) {
            services.push(current.clone());
        }
        entries.push(ComposeLogEntry {
            service: current.clone(),
            message: message.to_string(),
        });
    }

    let w = opts.limits.window;
    ComposeLogBundle {
        services,
        entries: window_lines(entries, w.head, w.tail, w.ceiling),
        success: raw.success(),
        error_type: failure_for(raw.exit_code, &raw.stderr),
    }
}

fn split_prefix(line: &str) -> Option<(&str, &str)> {
    let (left, right) = line.split_once('|')?;
    let service = left.trim();
    if service.is_empty() || service.contains(char::is_whitespace) {
        return None;
    }
    Some((service, right.strip_prefix(' ').unwrap_or(right)))
}
