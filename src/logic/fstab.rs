//! Filesystem table for the new root.

use crate::artifacts::fstab;
use crate::error::{InstallerError, Result};
use crate::host::{self, HostSystem};
use crate::tools::packages::Genfstab;
use crate::ui::Console;
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::info;

/// Generate `<target>/etc/fstab` from the current mounts.
///
/// The output must contain an entry for `/`, otherwise the new system would
/// not boot and the step fails.
pub fn run<R: BufRead, W: Write>(
    host: &mut dyn HostSystem,
    console: &mut Console<R, W>,
    target: &Path,
) -> Result<()> {
    let output = host::run_checked(
        host,
        &Genfstab {
            target: target.to_path_buf(),
        },
    )?;

    let entries = fstab::parse(&output.stdout);
    if !fstab::has_root(&entries) {
        return Err(InstallerError::system(format!(
            "genfstab produced no entry for / under {}",
            target.display()
        )));
    }

    let path = target.join("etc/fstab");
    host.append_file(&path, &output.stdout)?;
    info!("Wrote {} mount entries to {}", entries.len(), path.display());

    for entry in &entries {
        console.line(format!("    {} on {} ({})", entry.spec, entry.mountpoint, entry.fstype))?;
    }
    console.success(format!("{} written", path.display()))?;
    Ok(())
}
