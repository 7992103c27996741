//! Package sets for the CVH desktop.
//!
//! Lists are grouped by purpose and kept here so a typo shows up in a test
//! rather than as a failed `pacstrap` on real hardware.
//!
//! | Set             | Installed when |
//! |-----------------|----------------|
//! | base            | always |
//! | shell utilities | always |
//! | sandboxing      | always |
//! | UEFI boot       | booted through UEFI |
//! | Niri / Hyprland | exactly one, by compositor choice |

use crate::types::{BootMode, Compositor};

/// A named, ordered list of package identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageSet {
    pub name: &'static str,
    pub packages: &'static [&'static str],
}

/// Base system: kernel, boot, networking, audio, display manager, login shell.
pub const BASE: PackageSet = PackageSet {
    name: "base",
    packages: &[
        "base",
        "base-devel",
        "linux",
        "linux-firmware",
        "grub",
        "os-prober",
        "networkmanager",
        "dhcpcd",
        "sudo",
        "zsh",
        "git",
        "vim",
        "man-db",
        "bluez",
        "bluez-utils",
        "pipewire",
        "pipewire-pulse",
        "wireplumber",
        "sddm",
        "weston",
        "noto-fonts",
        "noto-fonts-emoji",
        "ttf-jetbrains-mono-nerd",
    ],
};

/// Interactive shell tooling sourced by the generated `.zshrc`.
pub const SHELL_UTILITIES: PackageSet = PackageSet {
    name: "shell utilities",
    packages: &[
        "zsh",
        "zsh-autosuggestions",
        "zsh-syntax-highlighting",
        "zsh-completions",
        "fzf",
        "ripgrep",
        "fd",
        "bat",
        "eza",
        "htop",
        "tmux",
        "curl",
        "wget",
    ],
};

/// Application sandboxing.
pub const SANDBOXING: PackageSet = PackageSet {
    name: "sandboxing",
    packages: &["flatpak", "bubblewrap", "firejail", "xdg-dbus-proxy"],
};

/// Extra boot packages for UEFI installs.
pub const UEFI_BOOT: PackageSet = PackageSet {
    name: "uefi boot",
    packages: &["efibootmgr"],
};

/// Hyprland desktop. Terminal and launcher match the generated config.
pub const HYPRLAND: PackageSet = PackageSet {
    name: "hyprland",
    packages: &[
        "hyprland",
        "xdg-desktop-portal-hyprland",
        "hyprpaper",
        "hyprlock",
        "waybar",
        "wofi",
        "kitty",
        "mako",
        "grim",
        "slurp",
        "wl-clipboard",
        "polkit-kde-agent",
    ],
};

/// Niri desktop. Terminal and launcher match the generated config.
pub const NIRI: PackageSet = PackageSet {
    name: "niri",
    packages: &[
        "niri",
        "xdg-desktop-portal-gnome",
        "xwayland-satellite",
        "waybar",
        "fuzzel",
        "alacritty",
        "mako",
        "swaybg",
        "swaylock",
        "wl-clipboard",
        "polkit-kde-agent",
    ],
};

/// Package set for a compositor
pub fn compositor_set(compositor: Compositor) -> PackageSet {
    match compositor {
        Compositor::Niri => NIRI,
        Compositor::Hyprland => HYPRLAND,
    }
}

/// Boot-mode specific set, if any
pub fn boot_set(mode: BootMode) -> Option<PackageSet> {
    match mode {
        BootMode::Uefi => Some(UEFI_BOOT),
        BootMode::Bios => None,
    }
}

/// Services enabled in the target, in enable order.
pub const SERVICES: &[&str] = &["NetworkManager", "sddm", "bluetooth", "fstrim.timer"];

/// Supplementary groups for the created user.
pub const USER_GROUPS: &[&str] = &["wheel", "audio", "video", "input", "storage", "network"];

/// Login shell for the created user.
pub const USER_SHELL: &str = "/bin/zsh";

/// Third-party repository (chaotic-aur) bootstrap.
pub mod chaotic {
    pub const KEY_ID: &str = "3056513887B78AEB";
    pub const KEYSERVER: &str = "keyserver.ubuntu.com";
    pub const PACKAGE_URLS: &[&str] = &[
        "https://cdn-mirror.chaotic.cx/chaotic-aur/chaotic-keyring.pkg.tar.zst",
        "https://cdn-mirror.chaotic.cx/chaotic-aur/chaotic-mirrorlist.pkg.tar.zst",
    ];
}
