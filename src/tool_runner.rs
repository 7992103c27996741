//! Tool execution
//!
//! The only place that spawns external tools. Non-interactive tools go
//! through [`run_tool_safe`] or [`run_tool_with_progress`], which:
//!
//! - spawn the child in its own process group with a parent-death signal
//! - register the PID with [`ChildRegistry::global`] for signal cleanup
//! - log program, arguments and exit status
//!
//! Interactive tools (`passwd`) use [`run_tool_interactive`] and stay in the
//! installer's foreground process group so they can read the terminal.

use crate::process_guard::{ChildRegistry, CommandProcessGroup};
use crate::tool_traits::Invocation;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Interval between liveness polls while a long tool runs.
pub const PROGRESS_POLL_INTERVAL: Duration = Duration::from_millis(120);

/// Output from a tool execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Captured standard output (empty when redirected to the log)
    pub stdout: String,
    /// Captured standard error (empty when redirected to the log)
    pub stderr: String,
    /// Exit code (None if terminated by signal)
    pub exit_code: Option<i32>,
    /// Whether the tool exited with status 0
    pub success: bool,
}

impl ToolOutput {
    /// A successful run with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
            success: true,
        }
    }

    /// A failed run with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: Some(code),
            success: false,
        }
    }

    fn from_status(status: ExitStatus, stdout: String, stderr: String) -> Self {
        Self {
            stdout,
            stderr,
            exit_code: status.code(),
            success: status.success(),
        }
    }

    /// Check if the tool succeeded and return an error if not.
    pub fn ensure_success(&self, context: &str) -> Result<()> {
        if self.success {
            return Ok(());
        }
        let code = self.exit_code.unwrap_or(-1);
        let detail = self.stderr.trim();
        if detail.is_empty() {
            anyhow::bail!("{} failed (exit code {})", context, code)
        } else {
            anyhow::bail!("{} failed (exit code {}): {}", context, code, detail)
        }
    }
}

fn base_command(inv: &Invocation) -> Command {
    let mut cmd = Command::new(&inv.program);
    cmd.args(&inv.args);
    for (key, value) in &inv.env {
        cmd.env(key, value);
    }
    cmd
}

fn spawn_registered(cmd: &mut Command, inv: &Invocation) -> Result<Child> {
    let child = cmd
        .in_new_process_group()
        .spawn()
        .with_context(|| format!("Failed to spawn {}", inv.program))?;

    if let Ok(mut registry) = ChildRegistry::global().lock() {
        registry.register(child.id());
    }
    Ok(child)
}

fn unregister(pid: u32) {
    if let Ok(mut registry) = ChildRegistry::global().lock() {
        registry.unregister(pid);
    }
}

fn log_result(inv: &Invocation, output: &ToolOutput) {
    if output.success {
        info!("{} exited successfully", inv.program);
    } else {
        warn!(
            "{} failed with exit code {}",
            inv.program,
            output.exit_code.unwrap_or(-1)
        );
    }
    if !output.stdout.is_empty() {
        debug!("{} stdout:\n{}", inv.program, output.stdout.trim_end());
    }
    if !output.stderr.is_empty() {
        debug!("{} stderr:\n{}", inv.program, output.stderr.trim_end());
    }
}

/// Execute a tool and capture its output.
///
/// A nonzero exit is not an error here; callers decide with
/// [`ToolOutput::ensure_success`]. `Err` means the tool could not be run.
pub fn run_tool_safe(inv: &Invocation) -> Result<ToolOutput> {
    info!("run_tool_safe: {}", inv.command_line());

    let mut cmd = base_command(inv);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let child = spawn_registered(&mut cmd, inv)?;
    let pid = child.id();
    let result = child
        .wait_with_output()
        .with_context(|| format!("Failed waiting for {}", inv.program));
    unregister(pid);
    let output = result?;

    let output = ToolOutput::from_status(
        output.status,
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    );
    log_result(inv, &output);
    Ok(output)
}

/// Execute a long-running tool, appending its output to `log_path` and
/// calling `tick` between liveness polls (spinner redraw).
pub fn run_tool_with_progress(
    inv: &Invocation,
    log_path: &Path,
    tick: &mut dyn FnMut(),
) -> Result<ToolOutput> {
    info!("run_tool_with_progress: {}", inv.command_line());

    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open {}", log_path.display()))?;
    let log_err = log
        .try_clone()
        .with_context(|| format!("Failed to duplicate handle for {}", log_path.display()))?;

    let mut cmd = base_command(inv);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err));

    let mut child = spawn_registered(&mut cmd, inv)?;
    let pid = child.id();

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Ok(status),
            Ok(None) => {
                tick();
                std::thread::sleep(PROGRESS_POLL_INTERVAL);
            }
            Err(e) => break Err(e),
        }
    };
    unregister(pid);
    let status = status.with_context(|| format!("Failed waiting for {}", inv.program))?;

    let mut output = ToolOutput::from_status(status, String::new(), String::new());
    if !output.success {
        output.stderr = format!("see {} for details", log_path.display());
    }
    log_result(inv, &output);
    Ok(output)
}

/// Execute a tool attached to the terminal.
pub fn run_tool_interactive(inv: &Invocation) -> Result<ToolOutput> {
    info!("run_tool_interactive: {}", inv.command_line());

    let status = base_command(inv)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("Failed to run {}", inv.program))?;

    let output = ToolOutput::from_status(status, String::new(), String::new());
    log_result(inv, &output);
    Ok(output)
}
