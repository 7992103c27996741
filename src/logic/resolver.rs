//! Package & service resolution
//!
//! Turns the installation choices into the concrete package list handed to
//! `pacstrap` and the unit list handed to `systemctl enable`.
//!
//! Order is preserved (base first, compositor last) and duplicates are
//! dropped on first occurrence, so the command line is deterministic.

use crate::install_state::InstallationState;
use crate::profiles::{self, PackageSet, BASE, SANDBOXING, SHELL_UTILITIES};
use std::collections::HashSet;

/// Package sets that make up an installation, in install order.
pub fn package_sets(state: &InstallationState) -> Vec<PackageSet> {
    let mut sets = vec![BASE, SHELL_UTILITIES, SANDBOXING];
    if let Some(boot) = profiles::boot_set(state.boot_mode) {
        sets.push(boot);
    }
    sets.push(profiles::compositor_set(state.compositor));
    sets
}

/// Resolve the ordered, de-duplicated package list.
///
/// Does not check that packages exist; `pacstrap` fails on unknown names.
pub fn resolve_packages(state: &InstallationState) -> Vec<String> {
    let mut seen = HashSet::new();
    package_sets(state)
        .iter()
        .flat_map(|set| set.packages.iter())
        .filter(|pkg| seen.insert(**pkg))
        .map(|pkg| pkg.to_string())
        .collect()
}

/// Resolve the systemd units to enable in the target.
pub fn resolve_services() -> Vec<String> {
    profiles::SERVICES.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BootMode, Compositor};

    fn state(mode: BootMode, compositor: Compositor) -> InstallationState {
        InstallationState {
            boot_mode: mode,
            compositor,
            ..InstallationState::default()
        }
    }

    #[test]
    fn test_resolve_starts_with_base() {
        let pkgs = resolve_packages(&state(BootMode::Uefi, Compositor::Niri));
        assert_eq!(pkgs[0], "base");
    }

    #[test]
    fn test_resolve_has_no_duplicates() {
        let pkgs = resolve_packages(&state(BootMode::Uefi, Compositor::Hyprland));
        let unique: HashSet<_> = pkgs.iter().collect();
        assert_eq!(unique.len(), pkgs.len());
        // zsh is in both base and shell utilities
        assert_eq!(pkgs.iter().filter(|p| *p == "zsh").count(), 1);
    }

    #[test]
    fn test_exactly_one_compositor_set() {
        let hypr = resolve_packages(&state(BootMode::Bios, Compositor::Hyprland));
        assert!(hypr.contains(&"hyprland".to_string()));
        assert!(!hypr.contains(&"niri".to_string()));

        let niri = resolve_packages(&state(BootMode::Bios, Compositor::Niri));
        assert!(niri.contains(&"niri".to_string()));
        assert!(!niri.contains(&"hyprland".to_string()));
    }

    #[test]
    fn test_efibootmgr_only_on_uefi() {
        let uefi = resolve_packages(&state(BootMode::Uefi, Compositor::Niri));
        let bios = resolve_packages(&state(BootMode::Bios, Compositor::Niri));
        assert!(uefi.contains(&"efibootmgr".to_string()));
        assert!(!bios.contains(&"efibootmgr".to_string()));
    }

    #[test]
    fn test_package_sets_order() {
        let names: Vec<&str> = package_sets(&state(BootMode::Uefi, Compositor::Niri))
            .iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["base", "shell utilities", "sandboxing", "uefi boot", "niri"]);
    }

    #[test]
    fn test_resolve_services() {
        assert_eq!(
            resolve_services(),
            vec!["NetworkManager", "sddm", "bluetooth", "fstrim.timer"]
        );
    }
}
