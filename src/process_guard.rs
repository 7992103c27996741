//! Child process lifecycle
//!
//! Disk and package tools run as leaders of their own process group and are
//! tracked in a global registry. On SIGINT, SIGTERM or SIGHUP the installer
//! escalates over every tracked group (SIGTERM, a grace period, then SIGKILL)
//! so an interrupted `wipefs` or `pacstrap` does not outlive it. Children also
//! carry `PR_SET_PDEATHSIG` for the case where no handler gets to run.

use nix::libc;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

static CHILD_REGISTRY: OnceLock<Arc<Mutex<ChildRegistry>>> = OnceLock::new();

/// Time tools get to exit after SIGTERM before SIGKILL follows.
pub const SIGNAL_GRACE_PERIOD: Duration = Duration::from_secs(3);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Process groups of the tools currently running
#[derive(Debug, Default)]
pub struct ChildRegistry {
    groups: BTreeSet<u32>,
    shutting_down: bool,
}

impl ChildRegistry {
    pub fn global() -> Arc<Mutex<ChildRegistry>> {
        CHILD_REGISTRY
            .get_or_init(|| Arc::new(Mutex::new(ChildRegistry::default())))
            .clone()
    }

    pub fn register(&mut self, pgid: u32) {
        debug!("Tracking tool process group {}", pgid);
        self.groups.insert(pgid);
    }

    pub fn unregister(&mut self, pgid: u32) {
        if self.groups.remove(&pgid) {
            debug!("Tool process group {} finished", pgid);
        }
    }

    pub fn count(&self) -> usize {
        self.groups.len()
    }

    /// Stop every tracked group. Only the first call does anything.
    pub fn terminate_all(&mut self, grace_period: Duration) {
        if std::mem::replace(&mut self.shutting_down, true) {
            return;
        }
        let groups: Vec<u32> = std::mem::take(&mut self.groups).into_iter().collect();
        if groups.is_empty() {
            return;
        }

        info!("Stopping {} running tool(s)", groups.len());
        signal_all(&groups, Signal::SIGTERM);

        let deadline = Instant::now() + grace_period;
        while Instant::now() < deadline {
            if !groups.iter().any(|&pgid| is_process_alive(pgid)) {
                return;
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        let stubborn: Vec<u32> = groups
            .into_iter()
            .filter(|&pgid| is_process_alive(pgid))
            .collect();
        if !stubborn.is_empty() {
            warn!("{} tool(s) ignored SIGTERM, killing", stubborn.len());
            signal_all(&stubborn, Signal::SIGKILL);
        }
    }
}

/// Signal each group; a group that cannot be addressed gets the signal on its
/// leader alone.
fn signal_all(groups: &[u32], sig: Signal) {
    for &pgid in groups {
        let leader = Pid::from_raw(pgid as i32);
        // A negative PID addresses the whole group (pacstrap's pacman,
        // arch-chroot's children)
        if let Err(e) = signal::killpg(leader, sig) {
            debug!("{} to group {} failed ({}), trying the leader", sig, pgid, e);
            if let Err(e) = signal::kill(leader, sig) {
                warn!("{} to PID {} failed: {}", sig, pgid, e);
            }
        }
    }
}

/// Exists and is not a zombie
fn is_process_alive(pid: u32) -> bool {
    if signal::kill(Pid::from_raw(pid as i32), None).is_err() {
        return false;
    }
    // /proc/<pid>/stat: "pid (comm) S ..."
    std::fs::read_to_string(format!("/proc/{}/stat", pid))
        .ok()
        .and_then(|stat| {
            let state = stat.rsplit_once(')')?.1.split_whitespace().next()?;
            Some(!matches!(state, "Z" | "X"))
        })
        .unwrap_or(true)
}

/// Install handlers for SIGINT, SIGTERM and SIGHUP.
///
/// A background thread waits for the first of them, stops all tracked tools
/// and exits with `128 + signo`. Call once at startup.
pub fn init_signal_handlers() -> Result<(), std::io::Error> {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;

    std::thread::spawn(move || {
        let Some(signo) = signals.forever().next() else {
            return;
        };
        let name = Signal::try_from(signo).map_or("signal", Signal::as_str);
        warn!("Received {}, stopping installation", name);

        if let Ok(mut registry) = ChildRegistry::global().lock() {
            registry.terminate_all(SIGNAL_GRACE_PERIOD);
        }

        eprintln!("\nInstallation interrupted ({}).", name);
        std::process::exit(128 + signo);
    });

    Ok(())
}

/// Spawning tools in their own process group
pub trait CommandProcessGroup {
    /// Make the child a process group leader that dies with the installer.
    /// Not for commands that read the terminal: a background group doing so
    /// is stopped with SIGTTIN.
    fn in_new_process_group(&mut self) -> &mut Self;
}

impl CommandProcessGroup for std::process::Command {
    fn in_new_process_group(&mut self) -> &mut Self {
        use std::os::unix::process::CommandExt;
        // SAFETY: only async-signal-safe calls (setpgid, prctl) run between
        // fork and exec.
        unsafe {
            self.pre_exec(|| {
                nix::unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0))
                    .map_err(std::io::Error::other)?;
                if libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM) == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }
        self
    }
}
