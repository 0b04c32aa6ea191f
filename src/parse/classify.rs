//! Failure classification from stderr text.
//!
//! Patterns are checked in table order against the lower-cased message; the
//! first hit wins. When the wrapped tool rewords its messages, the result
//! degrades to [`FailureKind::Unknown`].

use crate::record::FailureKind;

const PATTERNS: &[(&str, FailureKind)] = &[
    ("cannot connect to the docker daemon", FailureKind::DaemonUnavailable),
    ("is the docker daemon running", FailureKind::DaemonUnavailable),
    ("error during connect", FailureKind::DaemonUnavailable),
    ("permission denied", FailureKind::PermissionDenied),
    ("operation not permitted", FailureKind::PermissionDenied),
    ("unauthorized", FailureKind::Unauthorized),
    ("authentication required", FailureKind::Unauthorized),
    ("denied: requested access", FailureKind::Unauthorized),
    ("bad credentials", FailureKind::Unauthorized),
    ("no such container", FailureKind::NotFound),
    ("no such image", FailureKind::NotFound),
    ("no such object", FailureKind::NotFound),
    ("no such volume", FailureKind::NotFound),
    ("no such network", FailureKind::NotFound),
    ("manifest unknown", FailureKind::NotFound),
    ("not found", FailureKind::NotFound),
    ("does not exist", FailureKind::NotFound),
    ("is already in use", FailureKind::Conflict),
    ("conflict", FailureKind::Conflict),
    ("already exists", FailureKind::Conflict),
    ("timed out", FailureKind::Timeout),
    ("timeout", FailureKind::Timeout),
    ("deadline exceeded", FailureKind::Timeout),
    ("no such host", FailureKind::Network),
    ("could not resolve host", FailureKind::Network),
    ("connection refused", FailureKind::Network),
    ("network is unreachable", FailureKind::Network),
    ("tls handshake", FailureKind::Network),
];

/// Classify a failure message.
pub fn classify_failure(stderr: &str) -> FailureKind {
    let lower = stderr.to_lowercase();
    PATTERNS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, kind)| *kind)
        .unwrap_or(FailureKind::Unknown)
}

/// `None` on success, otherwise the classification of `stderr`.
pub fn failure_for(exit_code: i32, stderr: &str) -> Option<FailureKind> {
    (exit_code != 0).then(|| classify_failure(stderr))
}

/// Classification from an HTTP status code.
pub fn failure_for_status(status: u16) -> Option<FailureKind> {
    match status {
        200..=399 => None,
        401 | 403 => Some(FailureKind::Unauthorized),
        404 | 410 => Some(FailureKind::NotFound),
        408 | 504 => Some(FailureKind::Timeout),
        409 | 422 => Some(FailureKind::Conflict),
        502 | 503 => Some(FailureKind::Network),
        _ => Some(FailureKind::Unknown),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docker_messages() {
        assert_eq!(
            classify_failure("Error response from daemon: No such container: web"),
            FailureKind::NotFound
        );
        assert_eq!(
            classify_failure(
                "Cannot connect to the Docker daemon at unix:///var/run/docker.sock. Is the docker daemon running?"
            ),
            FailureKind::DaemonUnavailable
        );
        assert_eq!(
            classify_failure("permission denied while trying to connect to the Docker daemon socket"),
            FailureKind::PermissionDenied
        );
        assert_eq!(
            classify_failure("Conflict. The container name \"/web\" is already in use"),
            FailureKind::Conflict
        );
        assert_eq!(
            classify_failure("pull access denied, repository does not exist or may require 'docker login'"),
            FailureKind::NotFound
        );
    }

    #[test]
    fn test_unknown_fallback() {
        assert_eq!(classify_failure("something odd"), FailureKind::Unknown);
        assert_eq!(classify_failure(""), FailureKind::Unknown);
    }

    #[test]
    fn test_failure_for() {
        assert_eq!(failure_for(0, "no such container"), None);
        assert_eq!(failure_for(1, "no such container"), Some(FailureKind::NotFound));
    }

    #[test]
    fn test_failure_for_status() {
        assert_eq!(failure_for_status(200), None);
        assert_eq!(failure_for_status(404), Some(FailureKind::NotFound));
        assert_eq!(failure_for_status(401), Some(FailureKind::Unauthorized));
        assert_eq!(failure_for_status(500), Some(FailureKind::Unknown));
    }
}
