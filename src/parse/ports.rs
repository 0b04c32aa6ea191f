//! Port-spec micro-grammar.
//!
//! Input is what `docker ps` prints in its Ports column: a comma-separated
//! list of `[ip:]host->container/proto`, `port/proto` or bare `port`
//! segments. Port text is read leniently: leading digits are taken, and text
//! without any becomes [`PortNumber::NotANumber`]. Ranges are never checked.

use crate::record::{PortBinding, PortNumber, Protocol};

/// Parse a full Ports column. Whitespace-only segments are dropped.
pub fn parse_ports(spec: &str) -> Vec<PortBinding> {
    spec.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_segment)
        .collect()
}

/// Parse a single segment.
pub fn parse_segment(segment: &str) -> PortBinding {
    match segment.split_once("->") {
        Some((left, right)) => {
            let host_text = left.rsplit_once(':').map_or(left, |(_, port)| port);
            let (container, protocol) = container_and_protocol(right);
            PortBinding {
                host: Some(leading_number(host_text)),
                container,
                protocol,
            }
        }
        None => {
            let (container, protocol) = container_and_protocol(segment);
            PortBinding {
                host: None,
                container,
                protocol,
            }
        }
    }
}

/// Parse a `port/proto` pair, defaulting to TCP.
pub(crate) fn container_and_protocol(text: &str) -> (PortNumber, Protocol) {
    let (port, proto) = text.split_once('/').unwrap_or((text, ""));
    (leading_number(port), protocol(proto))
}

pub(crate) fn protocol(text: &str) -> Protocol {
    if text.trim().eq_ignore_ascii_case("udp") {
        Protocol::Udp
    } else {
        Protocol::Tcp
    }
}

/// Leading decimal digits after optional whitespace.
pub(crate) fn leading_number(text: &str) -> PortNumber {
    let text = text.trim_start();
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    text[..end]
        .parse()
        .map(PortNumber::Number)
        .unwrap_or(PortNumber::NotANumber)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: u32) -> PortNumber {
        PortNumber::Number(n)
    }

    #[test]
    fn test_published_port() {
        assert_eq!(
            parse_ports("0.0.0.0:8080->80/tcp"),
            vec![PortBinding {
                host: Some(num(8080)),
                container: num(80),
                protocol: Protocol::Tcp,
            }]
        );
    }

    #[test]
    fn test_container_only_udp() {
        let ports = parse_ports("53/udp");
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].host, None);
        assert_eq!(ports[0].container, num(53));
        assert_eq!(ports[0].protocol, Protocol::Udp);
    }

    #[test]
    fn test_empty_and_blank() {
        assert!(parse_ports("").is_empty());
        assert!(parse_ports(" ,  , ").is_empty());
    }

    #[test]
    fn test_bare_port_defaults_tcp() {
        let ports = parse_ports("6379");
        assert_eq!(ports[0].container, num(6379));
        assert_eq!(ports[0].protocol, Protocol::Tcp);
    }

    #[test]
    fn test_ipv6_and_multiple() {
        let ports = parse_ports("0.0.0.0:5432->5432/tcp, [::]:5432->5432/tcp, 9000/udp");
        assert_eq!(ports.len(), 3);
        assert_eq!(ports[1].host, Some(num(5432)));
        assert_eq!(ports[2].protocol, Protocol::Udp);
    }

    #[test]
    fn test_non_numeric_is_nan() {
        let p = parse_segment("0.0.0.0:abc->http/tcp");
        assert_eq!(p.host, Some(PortNumber::NotANumber));
        assert_eq!(p.container, PortNumber::NotANumber);
    }

    #[test]
    fn test_range_not_validated() {
        let p = parse_segment("99999/tcp");
        assert_eq!(p.container, num(99999));
    }

    #[test]
    fn test_port_range_takes_leading_digits() {
        let p = parse_segment("0.0.0.0:8000-8001->8000-8001/tcp");
        assert_eq!(p.host, Some(num(8000)));
        assert_eq!(p.container, num(8000));
    }
}
