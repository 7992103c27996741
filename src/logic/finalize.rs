//! Finalization: sync, unmount, summary, reboot prompt.

use crate::error::Result;
use crate::host::{self, HostSystem};
use crate::install_state::{InstallationState, InstallerContext};
use crate::tools::disk::Unmount;
use crate::tools::system::Reboot;
use crate::ui::Console;
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{info, warn};

/// Whether the operator asked to reboot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebootChoice {
    Reboot,
    Stay,
}

/// `y` or `yes` in any case; everything else (including no answer) stays.
pub fn parse_reboot_answer(answer: Option<&str>) -> RebootChoice {
    match answer.map(|a| a.trim().to_ascii_lowercase()) {
        Some(a) if a == "y" || a == "yes" => RebootChoice::Reboot,
        _ => RebootChoice::Stay,
    }
}

pub fn run<R: BufRead, W: Write>(
    ctx: &mut InstallerContext,
    host: &mut dyn HostSystem,
    console: &mut Console<R, W>,
    target: &Path,
) -> Result<RebootChoice> {
    host.flush_buffers();

    let unmount = Unmount {
        path: target.to_path_buf(),
        recursive: true,
    };
    if host::run_checked(host, &unmount).is_err() {
        warn!("Could not unmount {}", target.display());
        console.warning(format!(
            "Could not unmount {}; unmount it before rebooting",
            target.display()
        ))?;
    }

    print_summary(console, ctx.state())?;

    let answer = console.prompt("Reboot now? [y/N]: ")?;
    let choice = parse_reboot_answer(answer.as_deref());
    info!("Reboot choice: {:?}", choice);
    if choice == RebootChoice::Reboot {
        host::run_checked(host, &Reboot)?;
    }
    Ok(choice)
}

fn print_summary<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    state: &InstallationState,
) -> Result<()> {
    console.success("CVH Linux installed")?;
    let rows = [
        ("Username", state.username.clone()),
        ("Hostname", state.hostname.clone()),
        ("Timezone", state.timezone.clone()),
        ("Keymap", state.keymap.to_string()),
        ("Compositor", state.compositor.label().to_string()),
        ("Boot mode", state.boot_mode.to_string()),
        ("Disk", state.disk.clone().unwrap_or_default()),
    ];
    for (key, value) in rows {
        console.line(format!("  {:<11} {}", key, value))?;
    }
    console.line("")?;
    console.info("After reboot:")?;
    console.line("  1. Remove the installation medium")?;
    console.line(format!(
        "  2. Log in as {} and pick the {} session in SDDM",
        state.username,
        state.compositor.label()
    ))?;
    Ok(())
}
