//! Structured configuration payload for the new system.
//!
//! `SystemConfiguration` is built once from the finished `InstallationState`
//! and describes everything the configure step does: files to write, services
//! to enable, the user to create, the optional third-party repository and the
//! bootloader. It is plain data, serialized to JSON into the target as an
//! install record.

pub mod fstab;
pub mod templates;

use crate::error::{InstallerError, Result};
use crate::install_state::InstallationState;
use crate::logic::resolver;
use crate::profiles::{self, chaotic};
use crate::types::{BootMode, Compositor, Keymap};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What an artifact configures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Locale,
    Console,
    Network,
    DisplayManager,
    Sudoers,
    Shell,
    SessionDescriptor,
    CompositorConfig,
    Branding,
    PackageManager,
}

/// How an artifact is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Create or replace the file
    Replace,
    /// Append to an existing file
    Append,
}

/// A file written into the target root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    /// Absolute path as seen from inside the target
    pub path: PathBuf,
    pub kind: ArtifactKind,
    pub contents: String,
    pub mode: u32,
    /// Account that must own the file after writing
    pub owner: Option<String>,
    pub write: WriteMode,
}

impl GeneratedArtifact {
    fn new(path: impl Into<PathBuf>, kind: ArtifactKind, contents: String) -> Self {
        Self {
            path: path.into(),
            kind,
            contents,
            mode: 0o644,
            owner: None,
            write: WriteMode::Replace,
        }
    }

    fn mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    fn owned_by(mut self, user: &str) -> Self {
        self.owner = Some(user.to_string());
        self
    }

    fn appended(mut self) -> Self {
        self.write = WriteMode::Append;
        self
    }
}

/// The account created in the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub username: String,
    pub groups: Vec<String>,
    pub shell: String,
    pub home: String,
}

/// Optional third-party repository, enabled only if its keyring bootstraps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryBootstrap {
    pub name: String,
    pub key_id: String,
    pub keyserver: String,
    pub package_urls: Vec<String>,
    /// Section appended to pacman.conf on success
    pub section: String,
}

/// Bootloader installation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootloaderPlan {
    pub boot_mode: BootMode,
    pub disk: String,
    pub efi_directory: String,
    pub bootloader_id: String,
    pub config_path: String,
}

/// Everything the configure step applies to the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfiguration {
    pub hostname: String,
    pub locale: String,
    pub timezone: String,
    pub keymap: Keymap,
    pub compositor: Compositor,
    pub user: UserAccount,
    pub services: Vec<String>,
    pub artifacts: Vec<GeneratedArtifact>,
    pub third_party_repository: RepositoryBootstrap,
    pub bootloader: BootloaderPlan,
}

impl SystemConfiguration {
    /// Build the payload. Requires a selected disk.
    pub fn from_state(state: &InstallationState) -> Result<Self> {
        let disk = state
            .disk
            .clone()
            .ok_or_else(|| InstallerError::system("no target disk selected"))?;

        let user = UserAccount {
            username: state.username.clone(),
            groups: profiles::USER_GROUPS.iter().map(|g| g.to_string()).collect(),
            shell: profiles::USER_SHELL.to_string(),
            home: state.home_dir(),
        };

        Ok(Self {
            hostname: state.hostname.clone(),
            locale: state.locale.clone(),
            timezone: state.timezone.clone(),
            keymap: state.keymap,
            compositor: state.compositor,
            artifacts: build_artifacts(state, &user.home),
            user,
            services: resolver::resolve_services(),
            third_party_repository: RepositoryBootstrap {
                name: "chaotic-aur".to_string(),
                key_id: chaotic::KEY_ID.to_string(),
                keyserver: chaotic::KEYSERVER.to_string(),
                package_urls: chaotic::PACKAGE_URLS.iter().map(|u| u.to_string()).collect(),
                section: templates::render_chaotic_section(),
            },
            bootloader: BootloaderPlan {
                boot_mode: state.boot_mode,
                disk,
                efi_directory: "/boot/efi".to_string(),
                bootloader_id: "CVH".to_string(),
                config_path: "/boot/grub/grub.cfg".to_string(),
            },
        })
    }

    /// Artifacts of one kind
    pub fn artifacts_of(&self, kind: ArtifactKind) -> impl Iterator<Item = &GeneratedArtifact> {
        self.artifacts.iter().filter(move |a| a.kind == kind)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn build_artifacts(state: &InstallationState, home: &str) -> Vec<GeneratedArtifact> {
    use ArtifactKind::*;
    let user = state.username.as_str();
    let compositor = state.compositor;

    vec![
        GeneratedArtifact::new(
            "/etc/locale.gen",
            Locale,
            templates::render_locale_gen(&state.locale),
        )
        .appended(),
        GeneratedArtifact::new(
            "/etc/locale.conf",
            Locale,
            templates::render_locale_conf(&state.locale),
        ),
        GeneratedArtifact::new(
            "/etc/vconsole.conf",
            Console,
            templates::render_vconsole(state.keymap),
        ),
        GeneratedArtifact::new(
            "/etc/hostname",
            Network,
            templates::render_hostname(&state.hostname),
        ),
        GeneratedArtifact::new("/etc/hosts", Network, templates::render_hosts(&state.hostname)),
        GeneratedArtifact::new(
            "/etc/sddm.conf.d/10-cvh.conf",
            DisplayManager,
            templates::render_sddm_conf(),
        ),
        GeneratedArtifact::new("/etc/sudoers.d/10-wheel", Sudoers, templates::render_sudoers())
            .mode(0o440),
        GeneratedArtifact::new(format!("{}/.zshrc", home), Shell, templates::render_zshrc())
            .owned_by(user),
        GeneratedArtifact::new(
            format!("{}/.zprofile", home),
            Shell,
            templates::render_zprofile(compositor),
        )
        .owned_by(user),
        GeneratedArtifact::new(
            format!(
                "/usr/share/wayland-sessions/{}",
                templates::session_file_name(compositor)
            ),
            SessionDescriptor,
            templates::render_session_descriptor(compositor),
        ),
        GeneratedArtifact::new(
            format!("{}/{}", home, templates::compositor_config_path(compositor)),
            CompositorConfig,
            templates::render_compositor_config(compositor, state.keymap),
        )
        .owned_by(user),
        GeneratedArtifact::new("/etc/os-release", Branding, templates::render_os_release()),
        GeneratedArtifact::new("/etc/issue", Branding, templates::render_issue()),
        GeneratedArtifact::new(
            "/etc/pacman.conf",
            PackageManager,
            templates::render_multilib_section(),
        )
        .appended(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(compositor: Compositor) -> InstallationState {
        InstallationState {
            disk: Some("/dev/sda".into()),
            compositor,
            boot_mode: BootMode::Uefi,
            ..InstallationState::default()
        }
    }

    fn paths(config: &SystemConfiguration) -> Vec<String> {
        config
            .artifacts
            .iter()
            .map(|a| a.path.display().to_string())
            .collect()
    }

    #[test]
    fn test_requires_disk() {
        assert!(SystemConfiguration::from_state(&InstallationState::default()).is_err());
    }

    #[test]
    fn test_hyprland_artifacts_exclude_niri() {
        let config = SystemConfiguration::from_state(&state(Compositor::Hyprland)).expect("config");
        let paths = paths(&config);
        assert!(paths.contains(&"/usr/share/wayland-sessions/hyprland.desktop".to_string()));
        assert!(paths.contains(&"/home/cvh/.config/hypr/hyprland.conf".to_string()));
        assert!(!paths.iter().any(|p| p.contains("niri")));
    }

    #[test]
    fn test_niri_artifacts_exclude_hyprland() {
        let config = SystemConfiguration::from_state(&state(Compositor::Niri)).expect("config");
        let paths = paths(&config);
        assert!(paths.contains(&"/home/cvh/.config/niri/config.kdl".to_string()));
        assert!(!paths.iter().any(|p| p.contains("hypr")));
        assert_eq!(config.artifacts_of(ArtifactKind::SessionDescriptor).count(), 1);
        assert_eq!(config.artifacts_of(ArtifactKind::CompositorConfig).count(), 1);
    }

    #[test]
    fn test_sudoers_mode_and_user_ownership() {
        let config = SystemConfiguration::from_state(&state(Compositor::Niri)).expect("config");
        let sudoers = config
            .artifacts
            .iter()
            .find(|a| a.kind == ArtifactKind::Sudoers)
            .expect("sudoers");
        assert_eq!(sudoers.mode, 0o440);

        for artifact in &config.artifacts {
            let in_home = artifact.path.starts_with("/home/cvh");
            assert_eq!(artifact.owner.is_some(), in_home, "{}", artifact.path.display());
        }
    }

    #[test]
    fn test_pacman_conf_is_appended() {
        let config = SystemConfiguration::from_state(&state(Compositor::Niri)).expect("config");
        let pacman: Vec<_> = config.artifacts_of(ArtifactKind::PackageManager).collect();
        assert_eq!(pacman.len(), 1);
        assert_eq!(pacman[0].write, WriteMode::Append);
        assert!(pacman[0].contents.contains("[multilib]"));
        assert!(config.third_party_repository.section.contains("[chaotic-aur]"));
    }

    #[test]
    fn test_user_account() {
        let config = SystemConfiguration::from_state(&state(Compositor::Niri)).expect("config");
        assert_eq!(config.user.username, "cvh");
        assert_eq!(config.user.shell, "/bin/zsh");
        assert_eq!(
            config.user.groups,
            vec!["wheel", "audio", "video", "input", "storage", "network"]
        );
        assert_eq!(
            config.services,
            vec!["NetworkManager", "sddm", "bluetooth", "fstrim.timer"]
        );
    }

    #[test]
    fn test_json_record_round_trips() {
        let config = SystemConfiguration::from_state(&state(Compositor::Hyprland)).expect("config");
        let json = config.to_json().expect("json");
        assert!(json.contains("\"compositor\": \"hyprland\""));
        let back: SystemConfiguration = serde_json::from_str(&json).expect("parse");
        assert_eq!(back, config);
    }

    #[test]
    fn test_bootloader_plan_follows_boot_mode() {
        let mut s = state(Compositor::Niri);
        s.boot_mode = BootMode::Bios;
        let config = SystemConfiguration::from_state(&s).expect("config");
        assert_eq!(config.bootloader.boot_mode, BootMode::Bios);
        assert_eq!(config.bootloader.disk, "/dev/sda");
    }
}
