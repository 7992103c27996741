//! Typed choices for the installer
//!
//! Menus, parsing and the persisted record all go through these enums so the
//! set of valid answers lives in exactly one place.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Boot firmware mode of the live system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum BootMode {
    /// UEFI firmware: GPT with an EFI system partition
    #[strum(serialize = "UEFI")]
    Uefi,
    /// Legacy BIOS: MBR with a single bootable partition
    #[default]
    #[strum(serialize = "BIOS")]
    Bios,
}

/// Wayland compositor for the desktop session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Compositor {
    #[default]
    Niri,
    Hyprland,
}

impl Compositor {
    /// Name shown in menus and the final summary
    pub fn label(self) -> &'static str {
        match self {
            Self::Niri => "Niri",
            Self::Hyprland => "Hyprland",
        }
    }

    /// Command that starts a session of this compositor
    pub fn session_command(self) -> &'static str {
        match self {
            Self::Niri => "niri-session",
            Self::Hyprland => "Hyprland",
        }
    }
}

/// Console keyboard layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Keymap {
    #[default]
    Us,
    Il,
    Uk,
    De,
    Fr,
    Es,
    Ru,
}

impl Keymap {
    /// Human-readable name for the menu
    pub fn label(self) -> &'static str {
        match self {
            Self::Us => "US English",
            Self::Il => "Hebrew",
            Self::Uk => "UK English",
            Self::De => "German",
            Self::Fr => "French",
            Self::Es => "Spanish",
            Self::Ru => "Russian",
        }
    }

    /// XKB layout name used by the compositors.
    ///
    /// The console map `uk` is called `gb` in XKB.
    pub fn xkb_layout(self) -> &'static str {
        match self {
            Self::Uk => "gb",
            Self::Us => "us",
            Self::Il => "il",
            Self::De => "de",
            Self::Fr => "fr",
            Self::Es => "es",
            Self::Ru => "ru",
        }
    }

    pub fn all() -> Vec<Self> {
        Self::iter().collect()
    }
}

/// Filesystem type for a partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Filesystem {
    Ext4,
    /// FAT32 for the EFI system partition
    Fat32,
}

impl Filesystem {
    /// Formatting program for this filesystem
    pub fn mkfs_program(self) -> &'static str {
        match self {
            Self::Ext4 => "mkfs.ext4",
            Self::Fat32 => "mkfs.fat",
        }
    }

    /// Type name as it appears in a mount table
    pub fn fstab_type(self) -> &'static str {
        match self {
            Self::Ext4 => "ext4",
            Self::Fat32 => "vfat",
        }
    }
}

/// Partition table label understood by parted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PartitionTable {
    Gpt,
    Msdos,
}

impl From<BootMode> for PartitionTable {
    fn from(mode: BootMode) -> Self {
        match mode {
            BootMode::Uefi => Self::Gpt,
            BootMode::Bios => Self::Msdos,
        }
    }
}
