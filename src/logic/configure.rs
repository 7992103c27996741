//! System configuration applied to the target root.
//!
//! Builds the `SystemConfiguration` payload once and applies it in order:
//!
//! 1. persist the payload as JSON for audit
//! 2. system files (locale, console, network identity, SDDM, sudoers,
//!    session descriptor, branding, multilib)
//! 3. clock and locale inside the chroot
//! 4. user account and services
//! 5. user files, then hand the home directory to the user
//! 6. optional chaotic-aur repository
//! 7. GRUB
//! 8. verify every artifact exists

use crate::artifacts::{GeneratedArtifact, RepositoryBootstrap, SystemConfiguration, WriteMode};
use crate::config::InstallerOptions;
use crate::error::{InstallerError, Result};
use crate::host::{self, HostSystem};
use crate::install_state::InstallerContext;
use crate::tool_traits::ToolArgs;
use crate::tools::packages::{PacmanInstallFiles, PacmanKey};
use crate::tools::system::{
    ChownRecursive, GrubInstall, GrubMkconfig, Hwclock, LinkLocaltime, LocaleGen, Systemctl,
    SystemctlAction, Useradd,
};
use crate::tools::InChroot;
use crate::ui::Console;
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{info, warn};

/// Record file mode: root only
const RECORD_MODE: u32 = 0o600;

pub fn run<R: BufRead, W: Write>(
    ctx: &mut InstallerContext,
    host: &mut dyn HostSystem,
    console: &mut Console<R, W>,
    options: &InstallerOptions,
) -> Result<()> {
    let config = SystemConfiguration::from_state(ctx.state())?;
    let root = options.target_root.as_path();

    persist_record(host, options, &config)?;

    let (user_files, system_files): (Vec<&GeneratedArtifact>, Vec<&GeneratedArtifact>) =
        config.artifacts.iter().partition(|a| a.owner.is_some());

    for artifact in &system_files {
        write_artifact(host, options, artifact)?;
    }
    console.info(format!("Wrote {} system files", system_files.len()))?;

    chrooted(host, root, LinkLocaltime {
        timezone: config.timezone.clone(),
    })?;
    chrooted(host, root, Hwclock)?;
    chrooted(host, root, LocaleGen)?;
    console.info(format!("Timezone {}, locale {}", config.timezone, config.locale))?;

    chrooted(host, root, Useradd {
        username: config.user.username.clone(),
        groups: config.user.groups.clone(),
        shell: config.user.shell.clone(),
    })?;
    chrooted(host, root, Systemctl {
        action: SystemctlAction::Enable,
        units: config.services.clone(),
    })?;
    console.info(format!(
        "User {} created, enabled {}",
        config.user.username,
        config.services.join(", ")
    ))?;

    for artifact in &user_files {
        write_artifact(host, options, artifact)?;
    }
    chrooted(host, root, ChownRecursive {
        owner: config.user.username.clone(),
        path: config.user.home.clone(),
    })?;
    console.info(format!(
        "{} session configured for {}",
        config.compositor.label(),
        config.user.username
    ))?;

    enable_third_party_repository(host, console, options, &config)?;
    install_bootloader(host, console, root, &config)?;
    verify_artifacts(host, options, &config)?;

    console.success(format!(
        "{} configuration files verified",
        config.artifacts.len()
    ))?;
    Ok(())
}

fn chrooted<T: ToolArgs>(host: &mut dyn HostSystem, root: &Path, args: T) -> Result<()> {
    host::run_checked(host, &InChroot::new(root, args))?;
    Ok(())
}

fn persist_record(
    host: &mut dyn HostSystem,
    options: &InstallerOptions,
    config: &SystemConfiguration,
) -> Result<()> {
    let path = options.record_path();
    host.write_file(&path, &config.to_json()?, RECORD_MODE)?;
    info!("Configuration record saved to {}", path.display());
    Ok(())
}

fn write_artifact(
    host: &mut dyn HostSystem,
    options: &InstallerOptions,
    artifact: &GeneratedArtifact,
) -> Result<()> {
    let path = options.in_target(&artifact.path);
    match artifact.write {
        WriteMode::Replace => host.write_file(&path, &artifact.contents, artifact.mode)?,
        WriteMode::Append => host.append_file(&path, &artifact.contents)?,
    }
    Ok(())
}

/// Keyring and mirrorlist first, pacman.conf section last. Any failure skips
/// the repository with a warning.
fn enable_third_party_repository<R: BufRead, W: Write>(
    host: &mut dyn HostSystem,
    console: &mut Console<R, W>,
    options: &InstallerOptions,
    config: &SystemConfiguration,
) -> Result<()> {
    let repo = &config.third_party_repository;

    match bootstrap_keyring(host, options.target_root.as_path(), repo) {
        Ok(()) => {
            host.append_file(&options.in_target("/etc/pacman.conf"), &repo.section)?;
            console.success(format!("Repository {} enabled", repo.name))?;
        }
        Err(e) => {
            warn!("{} bootstrap failed: {}", repo.name, e);
            console.warning(format!(
                "Skipping repository {}: keyring bootstrap failed",
                repo.name
            ))?;
        }
    }
    Ok(())
}

fn bootstrap_keyring(
    host: &mut dyn HostSystem,
    root: &Path,
    repo: &RepositoryBootstrap,
) -> Result<()> {
    chrooted(host, root, PacmanKey::RecvKey {
        key: repo.key_id.clone(),
        keyserver: repo.keyserver.clone(),
    })?;
    chrooted(host, root, PacmanKey::LocalSign(repo.key_id.clone()))?;
    chrooted(host, root, PacmanInstallFiles {
        urls: repo.package_urls.clone(),
    })
}

fn install_bootloader<R: BufRead, W: Write>(
    host: &mut dyn HostSystem,
    console: &mut Console<R, W>,
    root: &Path,
    config: &SystemConfiguration,
) -> Result<()> {
    let boot = &config.bootloader;
    chrooted(host, root, GrubInstall {
        boot_mode: boot.boot_mode,
        disk: boot.disk.clone(),
        efi_directory: boot.efi_directory.clone(),
        bootloader_id: boot.bootloader_id.clone(),
    })?;
    chrooted(host, root, GrubMkconfig {
        output: boot.config_path.clone(),
    })?;
    console.info(format!("GRUB installed ({})", boot.boot_mode))?;
    Ok(())
}

fn verify_artifacts(
    host: &dyn HostSystem,
    options: &InstallerOptions,
    config: &SystemConfiguration,
) -> Result<()> {
    for artifact in &config.artifacts {
        if !host.path_exists(&options.in_target(&artifact.path)) {
            return Err(InstallerError::MissingArtifact(artifact.path.clone()));
        }
    }
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

    fn configure(host: &mut DryRunHost, mode: BootMode, compositor: Compositor) -> (Result<()>, String) {
        let mut ctx = context(mode, compositor);
        let mut console = Console::new(Cursor::new(Vec::new()), Vec::new());
        let result = run(&mut ctx, host, &mut console, &InstallerOptions::default());
        (result, String::from_utf8(console.into_output()).expect("utf8"))
    }

    #[test]
    fn test_files_written_into_target() {
        let mut host = DryRunHost::new();
        configure(&mut host, BootMode::Uefi, Compositor::Hyprland).0.expect("configure");

        assert_eq!(host.file("/mnt/etc/hostname"), Some("cvh-linux\n"));
        assert_eq!(host.file_mode("/mnt/etc/sudoers.d/10-wheel"), Some(0o440));
        assert!(host.file("/mnt/usr/share/wayland-sessions/hyprland.desktop").is_some());
        assert!(host.file("/mnt/home/cvh/.config/hypr/hyprland.conf").is_some());
        assert!(host.file("/mnt/usr/share/wayland-sessions/niri.desktop").is_none());
        assert_eq!(
            host.file_mode("/mnt/var/log/cvh-install/system-config.json"),
            Some(RECORD_MODE)
        );
    }

    #[test]
    fn test_chroot_command_order() {
        let mut host = DryRunHost::new();
        configure(&mut host, BootMode::Uefi, Compositor::Niri).0.expect("configure");

        let lines = host.command_lines();
        let position = |needle: &str| {
            lines
                .iter()
                .position(|l| l.contains(needle))
                .unwrap_or_else(|| panic!("{} not run", needle))
        };
        assert!(position("locale-gen") < position("useradd"));
        assert!(position("useradd") < position("chown"));
        assert!(position("grub-install") < position("grub-mkconfig"));
        assert!(lines.contains(
            &"arch-chroot /mnt useradd -m -G wheel,audio,video,input,storage,network -s /bin/zsh cvh"
                .to_string()
        ));
        assert!(lines.contains(
            &"arch-chroot /mnt systemctl enable NetworkManager sddm bluetooth fstrim.timer"
                .to_string()
        ));
        assert!(lines.contains(
            &"arch-chroot /mnt grub-install --target=x86_64-efi --efi-directory=/boot/efi --bootloader-id=CVH"
                .to_string()
        ));
        assert!(lines.contains(&"arch-chroot /mnt chown -R cvh:cvh /home/cvh".to_string()));
    }

    #[test]
    fn test_bios_grub_targets_disk() {
        let mut host = DryRunHost::new().with_boot_mode(BootMode::Bios);
        configure(&mut host, BootMode::Bios, Compositor::Niri).0.expect("configure");
        assert!(host
            .command_lines()
            .contains(&"arch-chroot /mnt grub-install --target=i386-pc /dev/sda".to_string()));
    }

    #[test]
    fn test_repository_sections_appended() {
        let mut host = DryRunHost::new();
        configure(&mut host, BootMode::Uefi, Compositor::Niri).0.expect("configure");
        let pacman = host.file("/mnt/etc/pacman.conf").expect("pacman.conf");
        let multilib = pacman.find("[multilib]").expect("multilib");
        let chaotic = pacman.find("[chaotic-aur]").expect("chaotic");
        assert!(multilib < chaotic);
    }

    #[test]
    fn test_repository_bootstrap_failure_is_skipped() {
        let mut host = DryRunHost::new().failing("pacman-key");
        let (result, out) = configure(&mut host, BootMode::Uefi, Compositor::Niri);
        result.expect("configure continues");
        let pacman = host.file("/mnt/etc/pacman.conf").expect("pacman.conf");
        assert!(pacman.contains("[multilib]"));
        assert!(!pacman.contains("[chaotic-aur]"));
        assert!(!host.ran("pacman"));
        assert!(out.contains("Skipping repository chaotic-aur"));
        assert!(host.ran("grub-install"));
    }

    #[test]
    fn test_failed_chroot_tool_is_fatal() {
        let mut host = DryRunHost::new().failing("useradd");
        let (result, _) = configure(&mut host, BootMode::Uefi, Compositor::Niri);
        assert!(result.is_err());
        assert!(!host.ran("grub-install"));
    }

    #[test]
    fn test_record_is_json_of_choices() {
        let mut host = DryRunHost::new();
        configure(&mut host, BootMode::Uefi, Compositor::Hyprland).0.expect("configure");
        let json = host
            .file("/mnt/var/log/cvh-install/system-config.json")
            .expect("record");
        let record: SystemConfiguration = serde_json::from_str(json).expect("parse");
        assert_eq!(record.compositor, Compositor::Hyprland);
        assert_eq!(record.hostname, "cvh-linux");
    }
}
