//! External process execution.
//!
//! Wraps `std::process::Command` with a small builder that turns every
//! failure mode (spawn error, non-zero exit, death by signal) into a
//! descriptive `anyhow` error. The build pipeline never recovers from a
//! failed tool invocation, so there is no retry or partial-success handling
//! here.

use anyhow::{bail, Context, Result};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

/// Check if a command exists on the host system.
///
/// Resolves the command through `PATH`, the same lookup `Cmd` uses when it
/// actually runs the program.
pub fn exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Builder for running an external tool to completion.
///
/// The tool inherits stdin/stdout/stderr, so its progress output goes
/// straight to the terminal. `run()` blocks until the child exits; there is
/// no timeout and no cancellation.
pub struct Cmd {
    program: String,
    args: Vec<OsString>,
    error_msg: Option<String>,
}

impl Cmd {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            error_msg: None,
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.as_os_str().to_os_string());
        self
    }

    /// Extra hint appended to the error when the tool fails (install
    /// instructions, version requirements).
    pub fn error_msg(mut self, msg: &str) -> Self {
        self.error_msg = Some(msg.to_string());
        self
    }

    /// Run the command and wait for it to finish.
    ///
    /// Fails if the program cannot be spawned, exits non-zero, or is killed
    /// by a signal.
    pub fn run(self) -> Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .with_context(|| format!("failed to launch '{}'", self.program))?;

        if status.success() {
            return Ok(());
        }

        let failure = match status.code() {
            Some(code) => format!("'{}' exited with status {}", self.program, code),
            None => format!("'{}' was terminated by a signal", self.program),
        };
        match self.error_msg {
            Some(hint) => bail!("{}\n{}", failure, hint),
            None => bail!(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exists() {
        assert!(exists("ls"));
        assert!(!exists("definitely_not_a_real_command_12345"));
    }

    #[test]
    fn test_run_success() {
        assert!(Cmd::new("true").run().is_ok());
    }

    #[test]
    fn test_run_nonzero_exit() {
        let err = Cmd::new("false").run().unwrap_err();
        assert!(err.to_string().contains("exited with status"));
    }

    #[test]
    fn test_run_spawn_failure() {
        let err = Cmd::new("definitely_not_a_real_command_12345")
            .run()
            .unwrap_err();
        assert!(err.to_string().contains("failed to launch"));
    }

    #[test]
    fn test_error_msg_appended() {
        let err = Cmd::new("false")
            .error_msg("install coreutils")
            .run()
            .unwrap_err();
        assert!(err.to_string().contains("install coreutils"));
    }
}
