//! Storage plan
//!
//! Turns a target disk and boot mode into the partition layout and the ordered
//! list of `StorageOp`s that realize it. Pure: no I/O, nothing is executed here.
//!
//! | Boot mode | Table | Partitions |
//! |-----------|-------|------------|
//! | UEFI      | gpt   | 1: ESP fat32 1MiB-513MiB (esp), 2: root ext4 513MiB-100% |
//! | BIOS      | msdos | 1: root ext4 1MiB-100% (boot) |

use crate::types::{BootMode, Filesystem, PartitionTable};
use std::fmt;
use std::path::{Path, PathBuf};

/// Volume label of the EFI system partition (FAT labels are uppercase, max 11)
pub const ESP_LABEL: &str = "CVH_EFI";
/// Volume label of the root filesystem
pub const ROOT_LABEL: &str = "cvh-root";
/// ESP mountpoint relative to the target root
pub const ESP_MOUNTPOINT: &str = "boot/efi";

/// Role of a partition in the layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionRole {
    Esp,
    Root,
}

/// One partition to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSpec {
    /// 1-based partition number
    pub number: u32,
    /// Partition device node, e.g. `/dev/nvme0n1p1`
    pub device: String,
    pub role: PartitionRole,
    /// GPT partition name, or `primary` on msdos
    pub name: &'static str,
    pub filesystem: Filesystem,
    pub label: &'static str,
    pub start: &'static str,
    pub end: &'static str,
    /// parted flag set after creation
    pub flag: Option<&'static str>,
}

/// Full partition layout for one disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionLayout {
    pub disk: String,
    pub table: PartitionTable,
    pub partitions: Vec<PartitionSpec>,
}

impl PartitionLayout {
    pub fn esp(&self) -> Option<&PartitionSpec> {
        self.partitions.iter().find(|p| p.role == PartitionRole::Esp)
    }

    /// The root partition. Every layout produced by [`plan_layout`] has one.
    pub fn root(&self) -> Option<&PartitionSpec> {
        self.partitions.iter().find(|p| p.role == PartitionRole::Root)
    }
}

/// Partition device path for `disk` and partition `number`.
///
/// Paths containing `nvme` or `mmcblk` take a `p` separator:
/// `/dev/nvme0n1` → `/dev/nvme0n1p1`. Others append the number directly:
/// `/dev/sda` → `/dev/sda1`.
pub fn partition_path(disk: &str, number: u32) -> String {
    if disk.contains("nvme") || disk.contains("mmcblk") {
        format!("{}p{}", disk, number)
    } else {
        format!("{}{}", disk, number)
    }
}

/// Compute the layout for `disk` under `mode`.
pub fn plan_layout(disk: &str, mode: BootMode) -> PartitionLayout {
    let partitions = match mode {
        BootMode::Uefi => vec![
            PartitionSpec {
                number: 1,
                device: partition_path(disk, 1),
                role: PartitionRole::Esp,
                name: "ESP",
                filesystem: Filesystem::Fat32,
                label: ESP_LABEL,
                start: "1MiB",
                end: "513MiB",
                flag: Some("esp"),
            },
            PartitionSpec {
                number: 2,
                device: partition_path(disk, 2),
                role: PartitionRole::Root,
                name: "root",
                filesystem: Filesystem::Ext4,
                label: ROOT_LABEL,
                start: "513MiB",
                end: "100%",
                flag: None,
            },
        ],
        BootMode::Bios => vec![PartitionSpec {
            number: 1,
            device: partition_path(disk, 1),
            role: PartitionRole::Root,
            name: "primary",
            filesystem: Filesystem::Ext4,
            label: ROOT_LABEL,
            start: "1MiB",
            end: "100%",
            flag: Some("boot"),
        }],
    };

    PartitionLayout {
        disk: disk.to_string(),
        table: PartitionTable::from(mode),
        partitions,
    }
}

/// A single storage operation in the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    /// Erase existing signatures (`wipefs -af`)
    WipeSignatures { disk: String },
    /// Write the table and partitions (`parted --script`)
    CreateTable { layout: PartitionLayout },
    /// Re-read the table and wait for device nodes
    RereadTable { disk: String },
    /// Create a filesystem
    Format {
        device: String,
        filesystem: Filesystem,
        label: String,
    },
    /// Create a mountpoint directory
    CreateDir { path: PathBuf },
    /// Mount a device
    Mount { device: String, mountpoint: PathBuf },
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WipeSignatures { disk } => write!(f, "WipeSignatures({})", disk),
            Self::CreateTable { layout } => write!(
                f,
                "CreateTable({}, {}, {} partition(s))",
                layout.disk,
                layout.table,
                layout.partitions.len()
            ),
            Self::RereadTable { disk } => write!(f, "RereadTable({})", disk),
            Self::Format {
                device,
                filesystem,
                label,
            } => write!(f, "Format({}, fs={}, label={})", device, filesystem, label),
            Self::CreateDir { path } => write!(f, "CreateDir({})", path.display()),
            Self::Mount { device, mountpoint } => {
                write!(f, "Mount({} -> {})", device, mountpoint.display())
            }
        }
    }
}

/// Ordered storage operations for one installation.
#[derive(Debug, Clone)]
pub struct StoragePlan {
    pub layout: PartitionLayout,
    pub ops: Vec<StorageOp>,
}

/// Build the full plan: wipe, partition, re-read, format every partition,
/// mount root at `target`, then the ESP (if any) below it.
pub fn calculate_storage_plan(disk: &str, mode: BootMode, target: &Path) -> StoragePlan {
    let layout = plan_layout(disk, mode);
    let mut ops = vec![
        StorageOp::WipeSignatures {
            disk: disk.to_string(),
        },
        StorageOp::CreateTable {
            layout: layout.clone(),
        },
        StorageOp::RereadTable {
            disk: disk.to_string(),
        },
    ];

    for part in &layout.partitions {
        ops.push(StorageOp::Format {
            device: part.device.clone(),
            filesystem: part.filesystem,
            label: part.label.to_string(),
        });
    }

    // Root first: the ESP mountpoint lives inside it
    if let Some(root) = layout.root() {
        ops.push(StorageOp::CreateDir {
            path: target.to_path_buf(),
        });
        ops.push(StorageOp::Mount {
            device: root.device.clone(),
            mountpoint: target.to_path_buf(),
        });
    }

    if let Some(esp) = layout.esp() {
        let mountpoint = target.join(ESP_MOUNTPOINT);
        ops.push(StorageOp::CreateDir {
            path: mountpoint.clone(),
        });
        ops.push(StorageOp::Mount {
            device: esp.device.clone(),
            mountpoint,
        });
    }

    StoragePlan { layout, ops }
}
