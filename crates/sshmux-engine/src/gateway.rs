//! Subprocess boundary to the tmux binary.
//!
//! Everything above this module works in terms of the [`Multiplexer`]
//! trait; everything below it is `std::process::Command`. The
//! [`ProcessRunner`] seam exists so the gateway itself is testable
//! without a tmux install and so multiple gateways can coexist in one
//! process.

use std::io;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

/// Format string handed to `list-sessions` for the plain name listing.
pub const SESSION_NAME_FORMAT: &str = "#{session_name}";

/// Format string for the detailed listing parsed by the inventory.
pub const SESSION_DETAIL_FORMAT: &str =
    "#{session_name}|#{session_windows}|#{session_attached}|#{session_activity}";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("tmux {operation} failed for '{target}': {stderr}")]
    CommandFailed {
        operation: &'static str,
        target: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Captured result of one subprocess invocation.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Strategy for running external processes. Injected into the gateway
/// constructor rather than hung on a global, so tests can script
/// outputs and production code stays free of hidden state.
pub trait ProcessRunner {
    /// Run to completion with captured output and no stdin.
    fn run(&self, program: &str, args: &[&str]) -> io::Result<RunOutput>;

    /// Run with the caller's terminal inherited (used for attach).
    /// Returns whether the process exited zero.
    fn run_interactive(&self, program: &str, args: &[&str]) -> io::Result<bool>;
}

/// The production runner: blocking `std::process::Command` calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<RunOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;
        Ok(RunOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn run_interactive(&self, program: &str, args: &[&str]) -> io::Result<bool> {
        let status = Command::new(program).args(args).status()?;
        Ok(status.success())
    }
}

/// The fixed vocabulary of multiplexer operations the engine needs.
/// The orchestrator is written against this trait; tests substitute a
/// recording mock.
pub trait Multiplexer {
    /// Whether the multiplexer binary responds at all. Never errors;
    /// used as a precondition gate.
    fn is_available(&self) -> bool;

    /// Names of live sessions. "No server running" is the empty list,
    /// not an error: it is the normal first-run state.
    fn list_sessions(&self) -> Result<Vec<String>, GatewayError>;

    /// Raw detailed listing lines in [`SESSION_DETAIL_FORMAT`]; parsing
    /// lives in the inventory layer.
    fn list_sessions_detailed(&self) -> Result<Vec<String>, GatewayError>;

    fn create_session(&self, name: &str) -> Result<(), GatewayError>;

    fn kill_session(&self, name: &str) -> Result<(), GatewayError>;

    /// Type `command` followed by Enter into `target`
    /// (`session` or `session:window`).
    fn send_keys(&self, target: &str, command: &str) -> Result<(), GatewayError>;

    fn create_window(&self, session: &str, window_name: &str) -> Result<(), GatewayError>;

    fn rename_window(
        &self,
        session: &str,
        window_index: usize,
        new_name: &str,
    ) -> Result<(), GatewayError>;

    /// Take over the calling terminal interactively. Failure here is
    /// recoverable for callers: the session already exists.
    fn attach(&self, session: &str) -> Result<(), GatewayError>;
}

pub struct TmuxGateway<R: ProcessRunner> {
    runner: R,
    binary: String,
}

impl TmuxGateway<SystemProcessRunner> {
    pub fn new() -> Self {
        Self::with_runner(SystemProcessRunner)
    }
}

impl Default for TmuxGateway<SystemProcessRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ProcessRunner> TmuxGateway<R> {
    pub fn with_runner(runner: R) -> Self {
        Self {
            runner,
            binary: "tmux".to_string(),
        }
    }

    /// Override the binary name (e.g. an absolute path or a wrapper).
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn invoke(
        &self,
        operation: &'static str,
        target: &str,
        args: &[&str],
    ) -> Result<RunOutput, GatewayError> {
        debug!(operation, target, "invoking {}", self.binary);
        let output = self
            .runner
            .run(&self.binary, args)
            .map_err(|source| GatewayError::Spawn {
                program: self.binary.clone(),
                source,
            })?;
        if output.success {
            Ok(output)
        } else {
            Err(GatewayError::CommandFailed {
                operation,
                target: target.to_string(),
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            })
        }
    }

    fn list_lines(&self, format: &str) -> Result<Vec<String>, GatewayError> {
        match self.invoke("list-sessions", "-", &["list-sessions", "-F", format]) {
            Ok(output) => Ok(output
                .stdout
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect()),
            // tmux exits non-zero when its server is not running; that
            // simply means there are no sessions yet.
            Err(GatewayError::CommandFailed { ref stderr, .. }) if is_no_server(stderr) => {
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }
}

fn is_no_server(stderr: &str) -> bool {
    stderr.contains("no server running") || stderr.contains("error connecting to")
}

impl<R: ProcessRunner> Multiplexer for TmuxGateway<R> {
    fn is_available(&self) -> bool {
        self.runner
            .run(&self.binary, &["-V"])
            .map(|output| output.success)
            .unwrap_or(false)
    }

    fn list_sessions(&self) -> Result<Vec<String>, GatewayError> {
        self.list_lines(SESSION_NAME_FORMAT)
    }

    fn list_sessions_detailed(&self) -> Result<Vec<String>, GatewayError> {
        self.list_lines(SESSION_DETAIL_FORMAT)
    }

    fn create_session(&self, name: &str) -> Result<(), GatewayError> {
        self.invoke("new-session", name, &["new-session", "-d", "-s", name])?;
        Ok(())
    }

    fn kill_session(&self, name: &str) -> Result<(), GatewayError> {
        self.invoke("kill-session", name, &["kill-session", "-t", name])?;
        Ok(())
    }

    fn send_keys(&self, target: &str, command: &str) -> Result<(), GatewayError> {
        self.invoke(
            "send-keys",
            target,
            &["send-keys", "-t", target, command, "Enter"],
        )?;
        Ok(())
    }

    fn create_window(&self, session: &str, window_name: &str) -> Result<(), GatewayError> {
        self.invoke(
            "new-window",
            session,
            &["new-window", "-t", session, "-n", window_name],
        )?;
        Ok(())
    }

    fn rename_window(
        &self,
        session: &str,
        window_index: usize,
        new_name: &str,
    ) -> Result<(), GatewayError> {
        let target = format!("{session}:{window_index}");
        self.invoke(
            "rename-window",
            &target,
            &["rename-window", "-t", &target, new_name],
        )?;
        Ok(())
    }

    fn attach(&self, session: &str) -> Result<(), GatewayError> {
        let ok = self
            .runner
            .run_interactive(&self.binary, &["attach-session", "-t", session])
            .map_err(|source| GatewayError::Spawn {
                program: self.binary.clone(),
                source,
            })?;
        if ok {
            Ok(())
        } else {
            Err(GatewayError::CommandFailed {
                operation: "attach-session",
                target: session.to_string(),
                code: None,
                stderr: String::new(),
            })
        }
    }
}
