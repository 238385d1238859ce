//! Bounded execution of external read-only inspection commands.
//!
//! [`CommandExecutor`] resolves the program before spawning anything, runs it
//! with a timeout, and captures the outcome as an [`ExecutionResult`]. A
//! non-zero exit is not an error: callers inspect the result and decide how
//! to present it.
//!
//! Resolution policy: programs are looked up on `PATH` unless
//! [`ExecutorConfig::bin_dir`] pins a directory, in which case only that
//! directory is searched. An unresolvable program fails fast with
//! [`AgentError::CommandUnavailable`] and nothing is spawned.
//!
//! Spawned processes are killed when the future driving them is dropped, so
//! cancelling a run or hitting the timeout never leaves a child behind.

use crate::AgentError;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, trace, warn};

/// Default bound for one external command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

/// Maximum captured stdout size (in bytes) before truncation.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 30_000;

/// `ETXTBSY`: the executable is still open for writing in another process.
const TEXT_FILE_BUSY: i32 = 26;
const SPAWN_ATTEMPTS: u32 = 3;

// ── Configuration ──────────────────────────────────────────────────

/// Executor settings. Constructed once at startup.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Bound applied to every command. Default: 2 seconds.
    pub timeout: Duration,
    /// Pinned install directory. `None` resolves programs on `PATH`.
    pub bin_dir: Option<PathBuf>,
    /// Captured stdout beyond this size is cut and flagged as truncated.
    pub max_output_bytes: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_COMMAND_TIMEOUT,
            bin_dir: None,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl ExecutorConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_bin_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.bin_dir = dir;
        self
    }

    pub fn with_max_output_bytes(mut self, max: usize) -> Self {
        self.max_output_bytes = max;
        self
    }
}

// ── Commands ───────────────────────────────────────────────────────

/// A command to run: an argument vector, or a shell string for pipelines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSpec {
    /// Program plus arguments, spawned directly without a shell.
    Argv { program: String, args: Vec<String> },
    /// A `sh -c` script. Every program in `requires` must resolve before the
    /// script runs.
    Shell { script: String, requires: Vec<String> },
}

impl CommandSpec {
    pub fn argv<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::Argv {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn shell<I, S>(script: impl Into<String>, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::Shell {
            script: script.into(),
            requires: requires.into_iter().map(Into::into).collect(),
        }
    }

    /// Short name used in errors: the program, or the first required program
    /// of a pipeline.
    pub fn label(&self) -> String {
        match self {
            CommandSpec::Argv { program, .. } => program.clone(),
            CommandSpec::Shell { requires, .. } => {
                requires.first().cloned().unwrap_or_else(|| "sh".into())
            }
        }
    }

    /// The full command line, for logs.
    pub fn display(&self) -> String {
        match self {
            CommandSpec::Argv { program, args } => {
                let mut line = program.clone();
                for arg in args {
                    line.push(' ');
                    line.push_str(arg);
                }
                line
            }
            CommandSpec::Shell { script, .. } => format!("sh -c {}", shell_quote(script)),
        }
    }
}

/// Single-quote a value for safe interpolation into a `sh -c` script.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

// ── Results ────────────────────────────────────────────────────────

/// The captured outcome of one command. Lives for one tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Label of the command that produced this result.
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
    /// Whether stdout was cut at `max_output_bytes`.
    pub truncated: bool,
    /// Size of stdout before truncation.
    pub total_bytes: usize,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Number of stdout lines.
    pub fn line_count(&self) -> usize {
        self.stdout.lines().count()
    }

    /// Render the result for the reasoning engine.
    ///
    /// Non-empty stdout is returned verbatim. A failed command with no
    /// stdout reports its status and stderr; a successful one reports that
    /// nothing was found. The answer is never an empty string.
    pub fn to_tool_text(&self) -> String {
        let mut text = if !self.stdout.trim().is_empty() {
            self.stdout.clone()
        } else if !self.success() {
            let status = self
                .exit_code
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            format!(
                "Error: {} exited with status {status}: {}",
                self.command,
                self.stderr.trim()
            )
        } else {
            "No resources found.".to_string()
        };
        if self.truncated {
            text.push_str(&format!("\n[truncated: {} bytes total]", self.total_bytes));
        }
        text
    }
}

// ── Executor ───────────────────────────────────────────────────────

/// Runs external commands under a fixed resolution policy and timeout.
#[derive(Debug, Clone, Default)]
pub struct CommandExecutor {
    config: ExecutorConfig,
}

impl CommandExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Resolve a program to an absolute path under the configured policy.
    pub fn resolve(&self, program: &str) -> Result<PathBuf, AgentError> {
        let found = match &self.config.bin_dir {
            Some(dir) => which::which_in(program, Some(dir), dir),
            None => which::which(program),
        };
        found.map_err(|_| AgentError::CommandUnavailable {
            program: program.to_string(),
            searched: self.search_location(),
        })
    }

    /// Whether a program resolves under the configured policy.
    pub fn is_available(&self, program: &str) -> bool {
        self.resolve(program).is_ok()
    }

    /// Run a command with the configured timeout.
    pub async fn execute(&self, command: &CommandSpec) -> Result<ExecutionResult, AgentError> {
        self.execute_with_timeout(command, self.config.timeout).await
    }

    /// Run a command with an explicit timeout.
    pub async fn execute_with_timeout(
        &self,
        command: &CommandSpec,
        timeout: Duration,
    ) -> Result<ExecutionResult, AgentError> {
        let mut cmd = self.prepare(command)?;
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let label = command.label();
        debug!(
            "exec: {} (timeout {:.1}s)",
            command.display(),
            timeout.as_secs_f64()
        );
        let start = Instant::now();

        let output = match tokio::time::timeout(timeout, spawn_and_wait(&mut cmd)).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AgentError::CommandUnavailable {
                    program: label,
                    searched: self.search_location(),
                });
            }
            Ok(Err(e)) => {
                return Err(AgentError::ExecutionFailed {
                    program: label,
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                warn!(
                    "{} timed out after {:.1}s",
                    command.display(),
                    timeout.as_secs_f64()
                );
                return Err(AgentError::Timeout {
                    operation: label,
                    after: timeout,
                });
            }
        };

        let elapsed = start.elapsed();
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let total_bytes = stdout.len();
        let (stdout, truncated) = cap_output(stdout, self.config.max_output_bytes);
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        debug!(
            "exec: {label} exited with {:?} in {:.0}ms ({total_bytes} bytes{})",
            output.status.code(),
            elapsed.as_secs_f64() * 1000.0,
            if truncated { ", truncated" } else { "" }
        );
        trace!("exec: {label} stderr: {stderr}");

        Ok(ExecutionResult {
            command: label,
            stdout,
            stderr,
            exit_code: output.status.code(),
            elapsed,
            truncated,
            total_bytes,
        })
    }

    fn prepare(&self, command: &CommandSpec) -> Result<Command, AgentError> {
        match command {
            CommandSpec::Argv { program, args } => {
                let path = self.resolve(program)?;
                let mut cmd = Command::new(path);
                cmd.args(args);
                Ok(cmd)
            }
            CommandSpec::Shell { script, requires } => {
                for program in requires {
                    self.resolve(program)?;
                }
                let mut cmd = Command::new("sh");
                cmd.arg("-c").arg(script);
                if let Some(dir) = &self.config.bin_dir {
                    cmd.env("PATH", prepend_path(dir)?);
                }
                Ok(cmd)
            }
        }
    }

    fn search_location(&self) -> String {
        match &self.config.bin_dir {
            Some(dir) => dir.display().to_string(),
            None => "PATH".to_string(),
        }
    }
}

async fn spawn_and_wait(cmd: &mut Command) -> std::io::Result<std::process::Output> {
    let mut attempt = 1;
    loop {
        match cmd.output().await {
            Err(e) if e.raw_os_error() == Some(TEXT_FILE_BUSY) && attempt < SPAWN_ATTEMPTS => {
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            other => return other,
        }
    }
}

fn prepend_path(dir: &std::path::Path) -> Result<OsString, AgentError> {
    let current = std::env::var_os("PATH").unwrap_or_default();
    let paths = std::iter::once(dir.to_path_buf()).chain(std::env::split_paths(&current));
    std::env::join_paths(paths).map_err(|e| AgentError::ExecutionFailed {
        program: "sh".into(),
        reason: format!("invalid bin_dir for PATH: {e}"),
    })
}

/// Cut `s` to at most `max` bytes on a char boundary.
fn cap_output(mut s: String, max: usize) -> (String, bool) {
    if s.len() <= max {
        return (s, false);
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
    (s, true)
}
