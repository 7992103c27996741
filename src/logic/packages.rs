//! Base install: network, keyring, package list, pacstrap.

use crate::error::{InstallerError, Result};
use crate::host::{self, HostSystem};
use crate::install_state::InstallerContext;
use crate::logic::{network, resolver};
use crate::tools::packages::{PacmanKey, Pacstrap};
use crate::tool_traits::ToolArgs;
use crate::ui::Console;
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{debug, error, info};

pub fn run<R: BufRead, W: Write>(
    ctx: &mut InstallerContext,
    host: &mut dyn HostSystem,
    console: &mut Console<R, W>,
    target: &Path,
) -> Result<()> {
    network::ensure_online(host, console)?;
    init_keyring(host, console)?;

    let packages = resolver::resolve_packages(ctx.state());
    let sets: Vec<&str> = resolver::package_sets(ctx.state())
        .iter()
        .map(|set| set.name)
        .collect();
    info!("Package sets: {}", sets.join(", "));
    console.info(format!(
        "Installing {} packages ({})",
        packages.len(),
        sets.join(", ")
    ))?;

    install(host, console, target, packages)
}

fn init_keyring<R: BufRead, W: Write>(
    host: &mut dyn HostSystem,
    console: &mut Console<R, W>,
) -> Result<()> {
    console.info("Initializing package keyring")?;
    host::run_checked(host, &PacmanKey::Init)?;
    host::run_checked(host, &PacmanKey::Populate("archlinux".to_string()))?;
    Ok(())
}

/// Run pacstrap behind the spinner; its output goes to the log file.
fn install<R: BufRead, W: Write>(
    host: &mut dyn HostSystem,
    console: &mut Console<R, W>,
    target: &Path,
    packages: Vec<String>,
) -> Result<()> {
    let inv = Pacstrap {
        target: target.to_path_buf(),
        packages,
    }
    .invocation();

    let mut tick = || {
        if let Err(e) = console.spinner_tick("Installing base system") {
            debug!("Spinner redraw failed: {}", e);
        }
    };
    let output = host.run_with_progress(&inv, &mut tick)?;
    console.spinner_done()?;

    if let Err(e) = output.ensure_success("pacstrap") {
        error!("{:#}", e);
        return Err(InstallerError::PackageInstall(format!("{:#}", e)));
    }

    console.success(format!("Base system installed into {}", target.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::DryRunHost;
    use crate::install_state::InstallationState;
    use crate::types::{BootMode, Compositor};
    use std::io::Cursor;

    fn context(mode: BootMode, compositor: Compositor) -> InstallerContext {
        InstallerContext::with_state(InstallationState {
            boot_mode: mode,
            compositor,
            disk: Some("/dev/sda".into()),
            ..InstallationState::default()
        })
    }

    fn console() -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(Cursor::new(Vec::new()), Vec::new())
    }

    #[test]
    fn test_keyring_then_pacstrap() {
        let mut ctx = context(BootMode::Uefi, Compositor::Hyprland);
        let mut host = DryRunHost::new();
        run(&mut ctx, &mut host, &mut console(), Path::new("/mnt")).expect("install");

        let lines = host.command_lines();
        assert_eq!(lines[0], "pacman-key --init");
        assert_eq!(lines[1], "pacman-key --populate archlinux");

        let pacstrap = &host.runs_of("pacstrap")[0].invocation.args;
        assert_eq!(&pacstrap[..3], &["-K", "/mnt", "base"]);
        assert!(pacstrap.iter().any(|p| p == "hyprland"));
        assert!(pacstrap.iter().any(|p| p == "efibootmgr"));
        assert!(!pacstrap.iter().any(|p| p == "niri"));
    }

    #[test]
    fn test_bios_has_no_efibootmgr() {
        let mut ctx = context(BootMode::Bios, Compositor::Niri);
        let mut host = DryRunHost::new();
        run(&mut ctx, &mut host, &mut console(), Path::new("/mnt")).expect("install");
        let pacstrap = &host.runs_of("pacstrap")[0].invocation.args;
        assert!(!pacstrap.iter().any(|p| p == "efibootmgr"));
        assert!(pacstrap.iter().any(|p| p == "niri"));
    }

    #[test]
    fn test_pacstrap_failure_is_package_error() {
        let mut ctx = context(BootMode::Uefi, Compositor::Niri);
        let mut host = DryRunHost::new().failing("pacstrap");
        let err = run(&mut ctx, &mut host, &mut console(), Path::new("/mnt")).unwrap_err();
        assert!(matches!(err, InstallerError::PackageInstall(_)));
        assert_eq!(err.exit_code(), 1);
    }

    /// Rejects the spinner message, accepts everything else
    struct SpinnerlessTerminal(Vec<u8>);

    impl Write for SpinnerlessTerminal {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if buf == b"Installing base system" {
                return Err(std::io::Error::other("terminal gone"));
            }
            self.0.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_spinner_write_failure_does_not_stop_pacstrap() {
        let mut ctx = context(BootMode::Uefi, Compositor::Niri);
        let mut host = DryRunHost::new();
        let mut console = Console::new(Cursor::new(Vec::new()), SpinnerlessTerminal(Vec::new()));
        run(&mut ctx, &mut host, &mut console, Path::new("/mnt")).expect("install");
        assert!(host.ran("pacstrap"));

        let out = String::from_utf8(console.into_output().0).expect("utf8");
        assert!(out.contains("Base system installed into /mnt"));
    }

    #[test]
    fn test_keyring_failure_is_fatal() {
        let mut ctx = context(BootMode::Uefi, Compositor::Niri);
        let mut host = DryRunHost::new().failing("pacman-key");
        assert!(run(&mut ctx, &mut host, &mut console(), Path::new("/mnt")).is_err());
        assert!(!host.ran("pacstrap"));
    }
}
