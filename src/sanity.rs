//! Pre-flight environment checks
//!
//! - every tool the installer drives is on `PATH`
//! - the process runs with EUID 0
//!
//! The checks only report; the preflight step turns a failure into a fatal
//! `InstallerError`.

use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Tools the installer invokes, checked before anything is prompted.
pub const REQUIRED_TOOLS: &[&str] = &[
    "lsblk",
    "wipefs",
    "parted",
    "partprobe",
    "udevadm",
    "mkfs.fat",
    "mkfs.ext4",
    "mount",
    "umount",
    "pacman-key",
    "pacstrap",
    "genfstab",
    "arch-chroot",
    "systemctl",
    "loadkeys",
];

/// Environment variable that disables the root check for development
pub const SKIP_ROOT_ENV: &str = "CVH_SKIP_ROOT_CHECK";

/// True if `name` resolves on `PATH`
fn binary_exists(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// The subset of `tools` that cannot be found.
pub fn missing_binaries(tools: &[&str]) -> Vec<String> {
    let missing: Vec<String> = tools
        .iter()
        .filter(|tool| !binary_exists(tool))
        .map(|tool| tool.to_string())
        .collect();
    debug!("Tool check: {} required, {} missing", tools.len(), missing.len());
    missing
}

pub fn is_running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Set CVH_SKIP_ROOT_CHECK=1 (or `true`) to skip
pub fn should_skip_root_check() -> bool {
    let skip = std::env::var(SKIP_ROOT_ENV)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if skip {
        warn!("Root check skipped ({}=1)", SKIP_ROOT_ENV);
    }
    skip
}

/// Arch package that provides `binary`, for the missing-tools hint
pub fn package_for_binary(binary: &str) -> &'static str {
    match binary {
        "lsblk" | "wipefs" | "mount" | "umount" => "util-linux",
        "parted" | "partprobe" => "parted",
        "udevadm" | "systemctl" => "systemd",
        "mkfs.fat" => "dosfstools",
        "mkfs.ext4" => "e2fsprogs",
        "pacman-key" => "pacman",
        "pacstrap" | "genfstab" | "arch-chroot" => "arch-install-scripts",
        "loadkeys" => "kbd",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_exists_sh() {
        assert!(binary_exists("sh"));
    }

    #[test]
    fn test_binary_exists_nonexistent() {
        assert!(!binary_exists("this_binary_definitely_does_not_exist_12345"));
    }

    #[test]
    fn test_missing_binaries_reports_only_missing() {
        let missing = missing_binaries(&["sh", "cvh_missing_tool_54321"]);
        assert_eq!(missing, vec!["cvh_missing_tool_54321"]);
    }

    #[test]
    fn test_package_mapping() {
        assert_eq!(package_for_binary("pacstrap"), "arch-install-scripts");
        assert_eq!(package_for_binary("mkfs.fat"), "dosfstools");
        assert_eq!(package_for_binary("parted"), "parted");
        assert_eq!(package_for_binary("frobnicate"), "unknown");
    }

    #[test]
    fn test_every_required_tool_has_a_package() {
        for tool in REQUIRED_TOOLS {
            assert_ne!(package_for_binary(tool), "unknown", "{}", tool);
        }
    }
}
