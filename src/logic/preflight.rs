//! Preflight: privileges, required tools, banner, boot mode.

use crate::error::{InstallerError, Result};
use crate::host::HostSystem;
use crate::install_state::InstallerContext;
use crate::sanity::{self, REQUIRED_TOOLS};
use crate::ui::Console;
use std::io::{BufRead, Write};
use tracing::{error, info};

pub fn run<R: BufRead, W: Write>(
    ctx: &mut InstallerContext,
    host: &mut dyn HostSystem,
    console: &mut Console<R, W>,
) -> Result<()> {
    if !host.is_root() {
        error!("Installer started without root privileges");
        return Err(InstallerError::NotRoot);
    }

    let missing = host.missing_tools(REQUIRED_TOOLS);
    if !missing.is_empty() {
        for tool in &missing {
            console.error(format!(
                "{} not found (package: {})",
                tool,
                sanity::package_for_binary(tool)
            ))?;
        }
        return Err(InstallerError::MissingTools(missing));
    }

    let boot_mode = host.boot_mode();
    ctx.state_mut().boot_mode = boot_mode;
    info!("Boot mode: {}", boot_mode);

    console.banner(boot_mode)?;
    console.success(format!("Running as root, {} tools present", REQUIRED_TOOLS.len()))?;
    console.info(format!("Boot mode: {}", boot_mode))?;
    Ok(())
}
