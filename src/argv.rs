//! Guarded argv assembly.
//!
//! [`Argv`] can only be produced by [`ArgvBuilder::build`], and the runner only
//! accepts [`Argv`]. Every caller-supplied token therefore passes the guard
//! before it becomes part of a command line. Literal tokens (subcommands,
//! flags) must be `&'static str`, so caller input cannot sneak in as one.

use crate::error::GuardError;
use crate::guard::{guard, guard_all, ParamRole};
use crate::limits::GuardLimits;

/// A validated argument vector (not including the program itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argv(Vec<String>);

impl Argv {
    /// Start building an argv under `limits`.
    pub fn builder(limits: &GuardLimits) -> ArgvBuilder<'_> {
        ArgvBuilder::new(limits)
    }

    /// The tokens, in order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[String]> for Argv {
    fn as_ref(&self) -> &[String] {
        &self.0
    }
}

/// Builder for [`Argv`].
///
/// Each guarded method consumes the builder and returns it on success, so a
/// rejected value leaves nothing half-built behind:
///
/// ```rust
/// use cmd_shape::{Argv, GuardLimits, ParamRole};
///
/// # fn main() -> Result<(), cmd_shape::GuardError> {
/// let limits = GuardLimits::default();
/// let argv = Argv::builder(&limits)
///     .arg("logs")
///     .option("--tail", ParamRole::Other, "100")?
///     .end_of_options()
///     .param("container", ParamRole::Container, "web-1")?
///     .build();
///
/// assert_eq!(argv.as_slice(), ["logs", "--tail", "100", "--", "web-1"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ArgvBuilder<'l> {
    limits: &'l GuardLimits,
    tokens: Vec<String>,
    terminated: bool,
}

impl<'l> ArgvBuilder<'l> {
    /// Create an empty builder.
    pub fn new(limits: &'l GuardLimits) -> Self {
        Self {
            limits,
            tokens: Vec::new(),
            terminated: false,
        }
    }

    /// Push a trusted literal token.
    pub fn arg(mut self, token: &'static str) -> Self {
        self.tokens.push(token.to_string());
        self
    }

    /// Push several trusted literal tokens.
    pub fn args(mut self, tokens: &[&'static str]) -> Self {
        self.tokens.extend(tokens.iter().map(|t| t.to_string()));
        self
    }

    /// Guard a caller value and push it as a positional.
    ///
    /// # Errors
    ///
    /// Any [`GuardError`] from [`guard`].
    pub fn param(mut self, name: &str, role: ParamRole, value: &str) -> Result<Self, GuardError> {
        let value = guard(name, value, role, self.limits)?;
        self.tokens.push(value.to_string());
        Ok(self)
    }

    /// Guard every element of an array parameter and push them all.
    ///
    /// Nothing is pushed unless every element passes.
    pub fn params<S: AsRef<str>>(
        mut self,
        name: &str,
        role: ParamRole,
        values: &[S],
    ) -> Result<Self, GuardError> {
        let values = guard_all(name, values, role, self.limits)?;
        self.tokens
            .extend(values.iter().map(|v| v.as_ref().to_string()));
        Ok(self)
    }

    /// Guard a caller value and push it after a literal flag: `--flag value`.
    ///
    /// The parameter is reported under the flag's name without leading dashes.
    pub fn option(
        mut self,
        flag: &'static str,
        role: ParamRole,
        value: &str,
    ) -> Result<Self, GuardError> {
        let value = guard(flag.trim_start_matches('-'), value, role, self.limits)?;
        self.tokens.push(flag.to_string());
        self.tokens.push(value.to_string());
        Ok(self)
    }

    /// Push `flag value` only when `value` is present.
    pub fn option_opt(
        self,
        flag: &'static str,
        role: ParamRole,
        value: Option<&str>,
    ) -> Result<Self, GuardError> {
        match value {
            Some(v) => self.option(flag, role, v),
            None => Ok(self),
        }
    }

    /// Push the literal flag once for each value: `--label a --label b`.
    pub fn repeated_option<S: AsRef<str>>(
        mut self,
        flag: &'static str,
        role: ParamRole,
        values: &[S],
    ) -> Result<Self, GuardError> {
        let values = guard_all(flag.trim_start_matches('-'), values, role, self.limits)?;
        for value in values {
            self.tokens.push(flag.to_string());
            self.tokens.push(value.as_ref().to_string());
        }
        Ok(self)
    }

    /// Push `--` so later tokens are never read as flags.
    ///
    /// Only the first call has an effect.
    pub fn end_of_options(mut self) -> Self {
        if !self.terminated {
            self.tokens.push("--".to_string());
            self.terminated = true;
        }
        self
    }

    /// Finish the argv.
    pub fn build(self) -> Argv {
        Argv(self.tokens)
    }
}
