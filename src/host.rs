//! The machine the installer acts on.
//!
//! Every side effect a step performs (running a tool, writing a file into the
//! target, probing the network) goes through [`HostSystem`]. [`LiveHost`] does
//! it for real; [`DryRunHost`] records it, answers from canned data and never
//! touches a disk. Dry runs back `--dry-run` and the integration tests.

use crate::hardware::{self, NetworkState};
use crate::sanity;
use crate::tool_runner::{self, ToolOutput};
use crate::tool_traits::{Invocation, ToolArgs};
use crate::types::{BootMode, Filesystem};
use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use strum::IntoEnumIterator;
use tracing::{debug, info};

/// Side effects available to installation steps.
pub trait HostSystem {
    /// Run a tool and capture its output.
    fn run(&mut self, inv: &Invocation) -> Result<ToolOutput>;

    /// Run a long tool, calling `tick` while it is alive.
    fn run_with_progress(&mut self, inv: &Invocation, tick: &mut dyn FnMut()) -> Result<ToolOutput>;

    /// Run a tool attached to the terminal.
    fn run_interactive(&mut self, inv: &Invocation) -> Result<ToolOutput>;

    fn is_root(&self) -> bool;

    /// Names from `tools` that are not on `PATH`.
    fn missing_tools(&self, tools: &[&str]) -> Vec<String>;

    fn boot_mode(&self) -> BootMode;

    fn network_state(&mut self) -> NetworkState;

    /// Non-loopback network interfaces.
    fn network_interfaces(&self) -> Vec<String>;

    fn pause(&mut self, duration: Duration);

    fn create_dir_all(&mut self, path: &Path) -> Result<()>;

    /// Create or replace `path` with `contents` and permission `mode`.
    /// An existing symlink at `path` is replaced, not followed.
    fn write_file(&mut self, path: &Path, contents: &str, mode: u32) -> Result<()>;

    fn append_file(&mut self, path: &Path, contents: &str) -> Result<()>;

    fn path_exists(&self, path: &Path) -> bool;

    /// Flush filesystem buffers (`sync(2)`).
    fn flush_buffers(&mut self);
}

/// Run typed tool args on `host`.
pub fn run_tool(host: &mut dyn HostSystem, args: &impl ToolArgs) -> Result<ToolOutput> {
    host.run(&args.invocation())
}

/// Run typed tool args on `host` and fail on nonzero exit.
pub fn run_checked(host: &mut dyn HostSystem, args: &impl ToolArgs) -> Result<ToolOutput> {
    let inv = args.invocation();
    let output = host.run(&inv)?;
    output.ensure_success(&inv.command_line())?;
    Ok(output)
}

// ============================================================================
// LiveHost
// ============================================================================

/// Executes everything on the running system.
#[derive(Debug, Clone)]
pub struct LiveHost {
    /// Long tool output (pacstrap) is appended here
    log_path: PathBuf,
}

impl LiveHost {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
        }
    }
}

impl HostSystem for LiveHost {
    fn run(&mut self, inv: &Invocation) -> Result<ToolOutput> {
        tool_runner::run_tool_safe(inv)
    }

    fn run_with_progress(&mut self, inv: &Invocation, tick: &mut dyn FnMut()) -> Result<ToolOutput> {
        tool_runner::run_tool_with_progress(inv, &self.log_path, tick)
    }

    fn run_interactive(&mut self, inv: &Invocation) -> Result<ToolOutput> {
        tool_runner::run_tool_interactive(inv)
    }

    fn is_root(&self) -> bool {
        sanity::is_running_as_root() || sanity::should_skip_root_check()
    }

    fn missing_tools(&self, tools: &[&str]) -> Vec<String> {
        sanity::missing_binaries(tools)
    }

    fn boot_mode(&self) -> BootMode {
        hardware::detect_boot_mode()
    }

    fn network_state(&mut self) -> NetworkState {
        hardware::detect_internet()
    }

    fn network_interfaces(&self) -> Vec<String> {
        hardware::network_interfaces()
    }

    fn pause(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }

    fn create_dir_all(&mut self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {}", path.display()))
    }

    fn write_file(&mut self, path: &Path, contents: &str, mode: u32) -> Result<()> {
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent)?;
        }

        // /etc/os-release ships as a symlink into /usr/lib
        if let Ok(meta) = std::fs::symlink_metadata(path) {
            if meta.file_type().is_symlink() {
                std::fs::remove_file(path)
                    .with_context(|| format!("Failed to remove symlink {}", path.display()))?;
            }
        }

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            .with_context(|| format!("Failed to set mode {:o} on {}", mode, path.display()))?;
        info!("Wrote {} ({} bytes, mode {:o})", path.display(), contents.len(), mode);
        Ok(())
    }

    fn append_file(&mut self, path: &Path, contents: &str) -> Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open {} for appending", path.display()))?;
        file.write_all(contents.as_bytes())
            .with_context(|| format!("Failed to append to {}", path.display()))?;
        info!("Appended {} bytes to {}", contents.len(), path.display());
        Ok(())
    }

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn flush_buffers(&mut self) {
        nix::unistd::sync();
        debug!("Filesystem buffers flushed");
    }
}

// ============================================================================
// DryRunHost
// ============================================================================

/// A command the dry-run host was asked to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommand {
    pub invocation: Invocation,
    pub interactive: bool,
}

impl RecordedCommand {
    /// Program that does the work: the chrooted tool for `arch-chroot`.
    pub fn effective_program(&self) -> &str {
        effective_program(&self.invocation)
    }
}

fn effective_program(inv: &Invocation) -> &str {
    if inv.program == "arch-chroot" {
        if let Some(inner) = inv.args.get(1) {
            return inner;
        }
    }
    &inv.program
}

/// Records commands and files instead of executing them.
#[derive(Debug, Clone)]
pub struct DryRunHost {
    commands: Vec<RecordedCommand>,
    files: BTreeMap<PathBuf, (String, u32)>,
    dirs: BTreeSet<PathBuf>,
    responses: HashMap<String, ToolOutput>,
    /// program → remaining forced failures
    failures: HashMap<String, u32>,
    boot_mode: BootMode,
    network: VecDeque<NetworkState>,
    interfaces: Vec<String>,
    root: bool,
    missing: Vec<String>,
    /// Execute read-only probes for real (`--dry-run` on a live system)
    live_reads: bool,
    flushes: usize,
    pauses: Vec<Duration>,
}

impl Default for DryRunHost {
    fn default() -> Self {
        Self::new()
    }
}

impl DryRunHost {
    /// Fully simulated host: UEFI, online, root, no disks.
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            files: BTreeMap::new(),
            dirs: BTreeSet::new(),
            responses: HashMap::new(),
            failures: HashMap::new(),
            boot_mode: BootMode::Uefi,
            network: VecDeque::new(),
            interfaces: vec!["enp1s0".to_string()],
            root: true,
            missing: Vec::new(),
            live_reads: false,
            flushes: 0,
            pauses: Vec::new(),
        }
    }

    /// Preview host for `--dry-run`: probes the real machine (disks, boot
    /// mode, network) but records every modifying command.
    pub fn previewing() -> Self {
        Self {
            boot_mode: hardware::detect_boot_mode(),
            interfaces: hardware::network_interfaces(),
            live_reads: true,
            ..Self::new()
        }
    }

    pub fn with_boot_mode(mut self, mode: BootMode) -> Self {
        self.boot_mode = mode;
        self
    }

    /// Canned `lsblk` output listing `(path, size, model)` disks.
    pub fn with_disks(self, disks: &[(&str, &str, &str)]) -> Self {
        let stdout: String = disks
            .iter()
            .map(|(path, size, model)| format!("{} {} disk {}\n", path, size, model))
            .collect();
        self.with_response("lsblk", ToolOutput::ok(stdout))
    }

    /// Answer every run of `program` with `output`.
    pub fn with_response(mut self, program: &str, output: ToolOutput) -> Self {
        self.responses.insert(program.to_string(), output);
        self
    }

    /// Make every run of `program` exit 1.
    pub fn failing(self, program: &str) -> Self {
        self.failing_times(program, u32::MAX)
    }

    /// Make the next `times` runs of `program` exit 1.
    pub fn failing_times(mut self, program: &str, times: u32) -> Self {
        self.failures.insert(program.to_string(), times);
        self
    }

    /// Network probe answers, consumed in order; Online once exhausted.
    pub fn with_network(mut self, states: &[NetworkState]) -> Self {
        self.network = states.iter().copied().collect();
        self
    }

    pub fn with_interfaces(mut self, interfaces: &[&str]) -> Self {
        self.interfaces = interfaces.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn not_root(mut self) -> Self {
        self.root = false;
        self
    }

    pub fn with_missing_tools(mut self, tools: &[&str]) -> Self {
        self.missing = tools.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// Recorded commands rendered as shell lines
    pub fn command_lines(&self) -> Vec<String> {
        self.commands
            .iter()
            .map(|c| c.invocation.command_line())
            .collect()
    }

    /// True if `program` ran, directly or inside the chroot
    pub fn ran(&self, program: &str) -> bool {
        self.commands.iter().any(|c| c.effective_program() == program)
    }

    /// Recorded runs of `program`, directly or inside the chroot
    pub fn runs_of(&self, program: &str) -> Vec<&RecordedCommand> {
        self.commands
            .iter()
            .filter(|c| c.effective_program() == program)
            .collect()
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(|(c, _)| c.as_str())
    }

    pub fn file_mode(&self, path: impl AsRef<Path>) -> Option<u32> {
        self.files.get(path.as_ref()).map(|(_, m)| *m)
    }

    pub fn written_files(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    pub fn pauses(&self) -> &[Duration] {
        &self.pauses
    }

    fn record(&mut self, inv: &Invocation, interactive: bool) -> Result<ToolOutput> {
        info!("[dry-run] {}", inv.command_line());
        self.commands.push(RecordedCommand {
            invocation: inv.clone(),
            interactive,
        });

        let program = effective_program(inv).to_string();
        if let Some(remaining) = self.failures.get_mut(&program) {
            if *remaining > 0 {
                *remaining = remaining.saturating_sub(1);
                return Ok(ToolOutput::failed(1, format!("{}: simulated failure", program)));
            }
        }

        if let Some(canned) = self.responses.get(&program) {
            return Ok(canned.clone());
        }

        if program == "genfstab" {
            return Ok(ToolOutput::ok(self.simulated_fstab(inv)));
        }

        Ok(ToolOutput::ok(""))
    }

    /// Mount table derived from the recorded mkfs and mount commands.
    fn simulated_fstab(&self, inv: &Invocation) -> String {
        let Some(target) = inv.args.last().map(PathBuf::from) else {
            return String::new();
        };

        let mut fs_types: HashMap<&str, &str> = HashMap::new();
        let mut out = String::new();
        for cmd in &self.commands {
            let args = &cmd.invocation.args;
            let program = cmd.invocation.program.as_str();
            if let Some(fs) = Filesystem::iter().find(|fs| fs.mkfs_program() == program) {
                if let Some(dev) = args.last() {
                    fs_types.insert(dev, fs.fstab_type());
                }
            } else if program == "mount" && args.len() == 2 {
                let Ok(rel) = Path::new(&args[1]).strip_prefix(&target) else {
                    continue;
                };
                let mountpoint = format!("/{}", rel.display());
                let fstype = fs_types.get(args[0].as_str()).copied().unwrap_or("auto");
                let pass = if mountpoint == "/" { 1 } else { 2 };
                out.push_str(&format!(
                    "# {}\n{}\t{}\t{}\trw,relatime\t0 {}\n\n",
                    args[0], args[0], mountpoint, fstype, pass
                ));
            }
        }
        out
    }
}

impl HostSystem for DryRunHost {
    fn run(&mut self, inv: &Invocation) -> Result<ToolOutput> {
        if self.live_reads && !inv.destructive {
            return tool_runner::run_tool_safe(inv);
        }
        self.record(inv, false)
    }

    fn run_with_progress(&mut self, inv: &Invocation, tick: &mut dyn FnMut()) -> Result<ToolOutput> {
        tick();
        self.record(inv, false)
    }

    fn run_interactive(&mut self, inv: &Invocation) -> Result<ToolOutput> {
        self.record(inv, true)
    }

    fn is_root(&self) -> bool {
        self.root
    }

    fn missing_tools(&self, tools: &[&str]) -> Vec<String> {
        tools
            .iter()
            .filter(|t| self.missing.iter().any(|m| m == *t))
            .map(|t| t.to_string())
            .collect()
    }

    fn boot_mode(&self) -> BootMode {
        self.boot_mode
    }

    fn network_state(&mut self) -> NetworkState {
        if let Some(state) = self.network.pop_front() {
            return state;
        }
        if self.live_reads {
            hardware::detect_internet()
        } else {
            NetworkState::Online
        }
    }

    fn network_interfaces(&self) -> Vec<String> {
        self.interfaces.clone()
    }

    fn pause(&mut self, duration: Duration) {
        self.pauses.push(duration);
    }

    fn create_dir_all(&mut self, path: &Path) -> Result<()> {
        self.dirs.insert(path.to_path_buf());
        Ok(())
    }

    fn write_file(&mut self, path: &Path, contents: &str, mode: u32) -> Result<()> {
        info!("[dry-run] write {} ({} bytes, mode {:o})", path.display(), contents.len(), mode);
        self.files
            .insert(path.to_path_buf(), (contents.to_string(), mode));
        Ok(())
    }

    fn append_file(&mut self, path: &Path, contents: &str) -> Result<()> {
        info!("[dry-run] append {} ({} bytes)", path.display(), contents.len());
        self.files
            .entry(path.to_path_buf())
            .or_insert_with(|| (String::new(), 0o644))
            .0
            .push_str(contents);
        Ok(())
    }

    fn path_exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.dirs.contains(path)
    }

    fn flush_buffers(&mut self) {
        self.flushes += 1;
    }
}
