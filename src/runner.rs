//! External command execution
//!
//! Everything this action does to the host goes through external commands:
//! package managers, the Twingate client itself, the service manager, and
//! the network tooling used during teardown. The [`CommandRunner`] trait is
//! the seam that lets tests script those commands instead of running them.

use std::process::Command;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("`{command}` exited with status {code}: {stderr}")]
    NonZero {
        command: String,
        code: i32,
        stderr: String,
    },
}

/// Captured result of a completed command.
///
/// A non-zero `exit_code` is a value, not an error, so call sites that
/// tolerate failure can inspect it without unwinding.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

pub trait CommandRunner {
    /// Run a command to completion, treating a non-zero exit as an error.
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, RunnerError>;

    /// Run a command to completion, returning a non-zero exit as an
    /// inspectable [`CommandOutput`]. Only a failure to launch is an error.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<CommandOutput, RunnerError>;
}

/// Real runner backed by [`std::process::Command`].
pub struct ExecRunner;

impl ExecRunner {
    fn capture(&self, program: &str, args: &[&str]) -> Result<CommandOutput, RunnerError> {
        debug!("Running: {}", command_line(program, args));
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| RunnerError::Spawn {
                program: program.to_string(),
                source: e,
            })?;

        Ok(CommandOutput {
            // Terminated by signal reports no code
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl CommandRunner for ExecRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, RunnerError> {
        let output = self.capture(program, args)?;
        if !output.success() {
            return Err(RunnerError::NonZero {
                command: command_line(program, args),
                code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<CommandOutput, RunnerError> {
        self.capture(program, args)
    }
}

/// Render a program and its arguments as a single display line.
pub fn command_line(program: &str, args: &[&str]) -> String {
    let mut line = String::from(program);
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}
