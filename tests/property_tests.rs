//! Property-based tests for cvh-install
//!
//! These tests verify:
//! - Hostname and username validation against their patterns
//! - Fallback to the defaults for rejected input
//! - Partition device naming for nvme/mmcblk vs other disks
//! - Layout shape per boot mode
//! - Enum string round-trips

use cvh_install::engine::storage::{partition_path, plan_layout};
use cvh_install::input::{
    is_valid_hostname, is_valid_username, parse_menu_answer, parse_text_answer, MenuAnswer,
    TextAnswer,
};
use cvh_install::types::{BootMode, Compositor, Filesystem, Keymap};
use proptest::prelude::*;

// =============================================================================
// Hostname
// =============================================================================

proptest! {
    /// Anything built from the pattern is accepted
    #[test]
    fn hostname_pattern_accepted(name in "[a-zA-Z0-9]([a-zA-Z0-9-]{0,120}[a-zA-Z0-9])?") {
        prop_assert!(is_valid_hostname(&name));
        let answer = parse_text_answer(Some(&name), is_valid_hostname);
        prop_assert_eq!(answer.value_or("cvh-linux"), name.as_str());
    }

    /// Long hostnames are kept as typed
    #[test]
    fn hostname_long_kept(name in "[a-z0-9]{64,200}") {
        let answer = parse_text_answer(Some(&name), is_valid_hostname);
        prop_assert_eq!(answer.value_or("cvh-linux"), name.as_str());
    }

    /// A leading or trailing hyphen is rejected
    #[test]
    fn hostname_edge_hyphen_rejected(core in "[a-z0-9]{1,20}") {
        let leading = format!("-{}", core);
        let trailing = format!("{}-", core);
        prop_assert!(!is_valid_hostname(&leading));
        prop_assert!(!is_valid_hostname(&trailing));
    }

    /// Any character outside [a-zA-Z0-9-] is rejected
    #[test]
    fn hostname_foreign_char_rejected(
        head in "[a-z]{1,10}",
        bad in "[ _.!@#/]",
        tail in "[a-z]{1,10}",
    ) {
        let name = format!("{}{}{}", head, bad, tail);
        prop_assert!(!is_valid_hostname(&name));
    }

    /// Rejected hostnames fall back to the default
    #[test]
    fn hostname_rejection_uses_default(core in "[a-z]{1,10}") {
        let input = format!("-{}", core);
        let answer = parse_text_answer(Some(&input), is_valid_hostname);
        prop_assert_eq!(answer.value_or("cvh-linux"), "cvh-linux");
    }
}

// =============================================================================
// Username
// =============================================================================

proptest! {
    /// Anything built from the pattern is accepted
    #[test]
    fn username_pattern_accepted(name in "[a-z_][a-z0-9_-]{0,120}") {
        prop_assert!(is_valid_username(&name));
        let answer = parse_text_answer(Some(&name), is_valid_username);
        prop_assert_eq!(answer.value_or("cvh"), name.as_str());
    }

    /// Long usernames are kept as typed
    #[test]
    fn username_long_kept(name in "[a-z][a-z0-9]{32,150}") {
        let answer = parse_text_answer(Some(&name), is_valid_username);
        prop_assert_eq!(answer.value_or("cvh"), name.as_str());
    }

    /// Uppercase letters are rejected anywhere
    #[test]
    fn username_uppercase_rejected(
        head in "[a-z]{0,8}",
        upper in "[A-Z]",
        tail in "[a-z]{0,8}",
    ) {
        let name = format!("{}{}{}", head, upper, tail);
        prop_assert!(!is_valid_username(&name));
    }

    /// A leading digit or hyphen is rejected
    #[test]
    fn username_bad_first_char_rejected(first in "[0-9-]", rest in "[a-z]{0,10}") {
        let name = format!("{}{}", first, rest);
        prop_assert!(!is_valid_username(&name));
        let answer = parse_text_answer(Some(&name), is_valid_username);
        prop_assert_eq!(answer, TextAnswer::Rejected(name.clone()));
    }
}

// =============================================================================
// Menu answers
// =============================================================================

proptest! {
    /// Numbers in 1..=count pick index n-1; everything above is invalid
    #[test]
    fn menu_numbers(count in 1usize..10, n in 0usize..20) {
        let answer = parse_menu_answer(Some(&n.to_string()), count);
        if (1..=count).contains(&n) {
            prop_assert_eq!(answer, MenuAnswer::Picked(n - 1));
        } else {
            prop_assert_eq!(answer, MenuAnswer::Invalid);
        }
    }

    /// Blank answers pick the default
    #[test]
    fn menu_blank_is_default(spaces in " {0,5}", count in 1usize..10) {
        prop_assert_eq!(parse_menu_answer(Some(&spaces), count), MenuAnswer::Default);
    }
}

// =============================================================================
// Partition naming and layout
// =============================================================================

fn boot_mode_strategy() -> impl Strategy<Value = BootMode> {
    prop_oneof![Just(BootMode::Uefi), Just(BootMode::Bios)]
}

proptest! {
    /// nvme and mmcblk devices use a `p` separator
    #[test]
    fn partition_path_with_separator(
        disk in prop_oneof![
            (0u8..8, 1u8..4).prop_map(|(c, n)| format!("/dev/nvme{}n{}", c, n)),
            (0u8..4).prop_map(|c| format!("/dev/mmcblk{}", c)),
        ],
        number in 1u32..16,
    ) {
        prop_assert_eq!(partition_path(&disk, number), format!("{}p{}", disk, number));
    }

    /// Other devices append the number directly
    #[test]
    fn partition_path_plain(disk in "/dev/(sd|vd|hd)[a-z]", number in 1u32..16) {
        prop_assert_eq!(partition_path(&disk, number), format!("{}{}", disk, number));
    }

    /// UEFI: ESP + root. BIOS: a single ext4 root. Devices follow partition_path.
    #[test]
    fn layout_shape(mode in boot_mode_strategy(), letter in "[a-z]") {
        let disk = format!("/dev/sd{}", letter);
        let layout = plan_layout(&disk, mode);

        match mode {
            BootMode::Uefi => {
                prop_assert_eq!(layout.partitions.len(), 2);
                let esp = layout.esp().expect("esp");
                prop_assert_eq!(esp.filesystem, Filesystem::Fat32);
                prop_assert_eq!((esp.start, esp.end), ("1MiB", "513MiB"));
            }
            BootMode::Bios => {
                prop_assert_eq!(layout.partitions.len(), 1);
                prop_assert!(layout.esp().is_none());
            }
        }

        let root = layout.root().expect("root");
        prop_assert_eq!(root.filesystem, Filesystem::Ext4);
        prop_assert_eq!(root.end, "100%");
        for part in &layout.partitions {
            prop_assert_eq!(part.device.clone(), partition_path(&disk, part.number));
        }
    }
}

// =============================================================================
// Enum round-trips
// =============================================================================

fn keymap_strategy() -> impl Strategy<Value = Keymap> {
    prop_oneof![
        Just(Keymap::Us),
        Just(Keymap::Il),
        Just(Keymap::Uk),
        Just(Keymap::De),
        Just(Keymap::Fr),
        Just(Keymap::Es),
        Just(Keymap::Ru),
    ]
}

proptest! {
    /// Keymap: to_string → parse round-trip is identity
    #[test]
    fn keymap_roundtrip(keymap in keymap_strategy()) {
        let parsed: Keymap = keymap.to_string().parse().expect("Should parse");
        prop_assert_eq!(keymap, parsed);
    }

    /// Compositor parsing ignores case
    #[test]
    fn compositor_parse_case_insensitive(
        compositor in prop_oneof![Just(Compositor::Niri), Just(Compositor::Hyprland)],
        upper in any::<bool>(),
    ) {
        let text = if upper {
            compositor.to_string().to_uppercase()
        } else {
            compositor.to_string()
        };
        let parsed: Compositor = text.parse().expect("Should parse");
        prop_assert_eq!(compositor, parsed);
    }
}
