//! Subprocess invocation request.

use crate::argv::Argv;
use std::collections::HashMap;
use std::path::PathBuf;

/// A command ready to run: program plus a guarded [`Argv`].
///
/// Because `argv` can only come from [`crate::ArgvBuilder`], an `Invocation`
/// never carries an unguarded caller token.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Program to execute, resolved through `PATH` if not absolute.
    pub program: PathBuf,

    /// Validated arguments (not including the program itself).
    pub argv: Argv,

    /// Extra environment variables, layered over the inherited environment.
    pub env: HashMap<String, String>,

    /// Working directory. `None` inherits the caller's.
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    /// Create an invocation with no extra environment and inherited cwd.
    pub fn new(program: impl Into<PathBuf>, argv: Argv) -> Self {
        Self {
            program: program.into(),
            argv,
            env: HashMap::new(),
            cwd: None,
        }
    }

    /// Set the working directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Add a single environment variable.
    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}
