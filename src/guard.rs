//! Parameter guard for free-form values.
//!
//! Every value a caller supplies that ends up as a bare argv token goes through
//! [`guard`] (or [`guard_all`] for arrays) before it is pushed. Two independent
//! rules apply:
//!
//! - **Injection**: the value, trimmed of surrounding whitespace, must not start
//!   with `-`. Otherwise the wrapped tool could read it as `-x` or `--flag=...`.
//! - **Size**: the value must fit its role's length class, and arrays must fit
//!   the element ceiling.
//!
//! Enum-constrained parameters never reach the guard: they are restricted to a
//! closed set before argv assembly.

use crate::error::{GuardError, LimitKind};
use crate::limits::GuardLimits;

/// Length class of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthClass {
    /// Bounded by `short_string_max`.
    Short,
    /// Bounded by `string_max`.
    Text,
    /// Bounded by `path_max`.
    Path,
}

impl LengthClass {
    /// Ceiling for this class under `limits`.
    pub fn max(self, limits: &GuardLimits) -> usize {
        match self {
            LengthClass::Short => limits.short_string_max,
            LengthClass::Text => limits.string_max,
            LengthClass::Path => limits.path_max,
        }
    }
}

/// Role of a free-form parameter.
///
/// The role decides the length class. Every role is subject to the injection
/// check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamRole {
    // Short tokens
    Title,
    Branch,
    Ref,
    Label,
    Author,
    Container,
    Image,
    Tag,
    Service,
    Network,
    Volume,
    Repository,
    Package,
    Other,

    // Paths
    Path,
    Dockerfile,
    Context,
    Config,

    // Free text
    Body,
    Comment,
    Message,
    Command,
    Query,
}

impl ParamRole {
    /// Length class for this role.
    pub fn class(self) -> LengthClass {
        match self {
            ParamRole::Path | ParamRole::Dockerfile | ParamRole::Context | ParamRole::Config => {
                LengthClass::Path
            }
            ParamRole::Body
            | ParamRole::Comment
            | ParamRole::Message
            | ParamRole::Command
            | ParamRole::Query => LengthClass::Text,
            _ => LengthClass::Short,
        }
    }

    /// Map a caller's parameter name to a role.
    ///
    /// Matching is case-insensitive and tolerates plural forms (`labels`,
    /// `branches`, `queries`). Unknown names map to [`ParamRole::Other`].
    pub fn from_name(name: &str) -> ParamRole {
        let lower = name.to_ascii_lowercase();
        let singular_y = lower.strip_suffix("ies").map(|stem| format!("{stem}y"));
        let candidates = [
            Some(lower.clone()),
            singular_y,
            lower.strip_suffix("es").map(str::to_string),
            lower.strip_suffix('s').map(str::to_string),
        ];
        candidates
            .iter()
            .flatten()
            .find_map(|key| ParamRole::for_key(key))
            .unwrap_or(ParamRole::Other)
    }

    fn for_key(key: &str) -> Option<ParamRole> {
        let role = match key {
            "title" => ParamRole::Title,
            "branch" | "base" | "head" => ParamRole::Branch,
            "ref" | "commit" | "sha" => ParamRole::Ref,
            "label" => ParamRole::Label,
            "author" | "assignee" | "reviewer" | "user" => ParamRole::Author,
            "container" | "name" => ParamRole::Container,
            "image" => ParamRole::Image,
            "tag" => ParamRole::Tag,
            "service" => ParamRole::Service,
            "network" => ParamRole::Network,
            "volume" => ParamRole::Volume,
            "repo" | "repository" => ParamRole::Repository,
            "package" | "pkg" => ParamRole::Package,
            "path" | "file" | "cwd" | "workdir" | "target" | "output" => ParamRole::Path,
            "dockerfile" => ParamRole::Dockerfile,
            "context" => ParamRole::Context,
            "config" | "compose_file" | "composefile" => ParamRole::Config,
            "body" | "description" => ParamRole::Body,
            "comment" => ParamRole::Comment,
            "message" => ParamRole::Message,
            "command" | "cmd" | "script" => ParamRole::Command,
            "query" | "pattern" | "search" | "filter" => ParamRole::Query,
            _ => return None,
        };
        Some(role)
    }
}

/// True when `value` would be read as a flag once trimmed.
///
/// Unlike POSIX argv classification, a lone `-` and `--` both count: a
/// caller-supplied value has no business being either.
pub fn looks_like_flag(value: &str) -> bool {
    value.trim().starts_with('-')
}

/// Validate a single free-form value.
///
/// Returns the value unchanged (untrimmed) on success.
///
/// # Errors
///
/// - `GuardError::Injection` if the trimmed value starts with `-`
/// - `GuardError::LimitExceeded` if the value is longer than its class allows
pub fn guard<'v>(
    param: &str,
    value: &'v str,
    role: ParamRole,
    limits: &GuardLimits,
) -> Result<&'v str, GuardError> {
    let result = check(param, value, role, limits);
    if let Err(e) = &result {
        log_rejection(e);
    }
    result.map(|()| value)
}

/// Validate an array-valued parameter.
///
/// The element count is checked first, then each element independently.
///
/// # Errors
///
/// - `GuardError::LimitExceeded` with [`LimitKind::Items`] for too many elements
/// - the first element-level error, tagged with its index
pub fn guard_all<'v, S: AsRef<str>>(
    param: &str,
    values: &'v [S],
    role: ParamRole,
    limits: &GuardLimits,
) -> Result<&'v [S], GuardError> {
    let result = check_all(param, values, role, limits);
    if let Err(e) = &result {
        log_rejection(e);
    }
    result.map(|()| values)
}

fn check(param: &str, value: &str, role: ParamRole, limits: &GuardLimits) -> Result<(), GuardError> {
    if looks_like_flag(value) {
        return Err(GuardError::Injection {
            param: param.to_string(),
            index: None,
        });
    }

    let max = role.class().max(limits);
    let actual = value.chars().count();
    if actual > max {
        return Err(GuardError::LimitExceeded {
            param: param.to_string(),
            kind: LimitKind::Length,
            limit: max,
            actual,
            index: None,
        });
    }

    Ok(())
}

fn check_all<S: AsRef<str>>(
    param: &str,
    values: &[S],
    role: ParamRole,
    limits: &GuardLimits,
) -> Result<(), GuardError> {
    if values.len() > limits.array_max {
        return Err(GuardError::LimitExceeded {
            param: param.to_string(),
            kind: LimitKind::Items,
            limit: limits.array_max,
            actual: values.len(),
            index: None,
        });
    }

    for (i, value) in values.iter().enumerate() {
        check(param, value.as_ref(), role, limits).map_err(|e| e.at_index(i))?;
    }

    Ok(())
}

fn log_rejection(err: &GuardError) {
    tracing::warn!(param = %err.param(), error = %err, "Rejected parameter");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> GuardLimits {
        GuardLimits {
            short_string_max: 8,
            string_max: 32,
            path_max: 16,
            array_max: 3,
        }
    }

    #[test]
    fn test_flag_forms_rejected() {
        for v in ["-x", "--force", "--output=/etc/passwd", "  -rf", "\t--", "-"] {
            assert!(
                matches!(
                    guard("branch", v, ParamRole::Branch, &limits()),
                    Err(GuardError::Injection { .. })
                ),
                "{v:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_inner_dash_allowed() {
        assert_eq!(
            guard("branch", "feat-x", ParamRole::Branch, &limits()),
            Ok("feat-x")
        );
        assert_eq!(
            guard("title", "a - b", ParamRole::Title, &limits()),
            Ok("a - b")
        );
    }

    #[test]
    fn test_value_returned_untrimmed() {
        let v = "  main ";
        assert_eq!(guard("branch", v, ParamRole::Branch, &limits()), Ok(v));
    }

    #[test]
    fn test_length_classes() {
        let nine = "abcdefghi";
        assert!(matches!(
            guard("label", nine, ParamRole::Label, &limits()),
            Err(GuardError::LimitExceeded {
                kind: LimitKind::Length,
                limit: 8,
                actual: 9,
                ..
            })
        ));
        assert!(guard("path", nine, ParamRole::Path, &limits()).is_ok());
        assert!(guard("body", nine, ParamRole::Body, &limits()).is_ok());

        let long_path = "a/".repeat(9);
        assert!(matches!(
            guard("path", &long_path, ParamRole::Path, &limits()),
            Err(GuardError::LimitExceeded { limit: 16, .. })
        ));
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        // 8 chars, 16 bytes
        let v = "éééééééé";
        assert!(guard("label", v, ParamRole::Label, &limits()).is_ok());
    }

    #[test]
    fn test_injection_checked_before_length() {
        let v = format!("-{}", "a".repeat(40));
        assert!(matches!(
            guard("label", &v, ParamRole::Label, &limits()),
            Err(GuardError::Injection { .. })
        ));
    }

    #[test]
    fn test_array_count() {
        let values = ["a", "b", "c", "d"];
        assert!(matches!(
            guard_all("labels", &values, ParamRole::Label, &limits()),
            Err(GuardError::LimitExceeded {
                kind: LimitKind::Items,
                limit: 3,
                actual: 4,
                index: None,
                ..
            })
        ));
    }

    #[test]
    fn test_array_element_index() {
        let values = vec!["ok".to_string(), "--evil".to_string()];
        assert_eq!(
            guard_all("files", &values, ParamRole::Path, &limits()),
            Err(GuardError::Injection {
                param: "files".to_string(),
                index: Some(1)
            })
        );
    }

    #[test]
    fn test_empty_array_ok() {
        let values: [&str; 0] = [];
        assert!(guard_all("labels", &values, ParamRole::Label, &limits()).is_ok());
    }

    #[test]
    fn test_role_from_name() {
        assert_eq!(ParamRole::from_name("labels"), ParamRole::Label);
        assert_eq!(ParamRole::from_name("Files"), ParamRole::Path);
        assert_eq!(ParamRole::from_name("body"), ParamRole::Body);
        assert_eq!(ParamRole::from_name("compose_file"), ParamRole::Config);
        assert_eq!(ParamRole::from_name("whatever"), ParamRole::Other);
        assert_eq!(ParamRole::from_name("whatever").class(), LengthClass::Short);
        assert_eq!(ParamRole::Command.class(), LengthClass::Text);
    }

    #[test]
    fn test_role_from_plural_name() {
        assert_eq!(ParamRole::from_name("bodies"), ParamRole::Body);
        assert_eq!(ParamRole::from_name("queries"), ParamRole::Query);
        assert_eq!(ParamRole::from_name("branches"), ParamRole::Branch);
        assert_eq!(ParamRole::from_name("bases"), ParamRole::Branch);
        assert_eq!(ParamRole::from_name("services"), ParamRole::Service);
        assert_eq!(ParamRole::from_name("Messages"), ParamRole::Message);
        assert_eq!(ParamRole::from_name("status"), ParamRole::Other);
    }
}
