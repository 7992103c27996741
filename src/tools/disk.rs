//! Disk tool arguments: listing, wiping, partitioning, formatting, mounting.

use crate::engine::storage::PartitionLayout;
use crate::tool_traits::ToolArgs;
use crate::types::Filesystem;
use std::path::PathBuf;

/// `lsblk -d -p -n -o NAME,SIZE,TYPE,MODEL`: whole devices with full paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListDisks;

impl ToolArgs for ListDisks {
    fn program(&self) -> &'static str {
        "lsblk"
    }

    fn to_cli_args(&self) -> Vec<String> {
        ["-d", "-p", "-n", "-o", "NAME,SIZE,TYPE,MODEL"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn is_destructive(&self) -> bool {
        false
    }
}

/// `wipefs -af <disk>`: erase every filesystem and partition-table signature.
#[derive(Debug, Clone)]
pub struct WipeSignatures {
    pub disk: String,
}

impl ToolArgs for WipeSignatures {
    fn program(&self) -> &'static str {
        "wipefs"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec!["-af".to_string(), self.disk.clone()]
    }
}

/// `parted --script <disk> mklabel ... mkpart ... set ...` built from a layout.
#[derive(Debug, Clone)]
pub struct PartitionDisk {
    pub layout: PartitionLayout,
}

impl ToolArgs for PartitionDisk {
    fn program(&self) -> &'static str {
        "parted"
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec![
            "--script".to_string(),
            self.layout.disk.clone(),
            "mklabel".to_string(),
            self.layout.table.to_string(),
        ];

        for part in &self.layout.partitions {
            args.extend([
                "mkpart".to_string(),
                part.name.to_string(),
                part.filesystem.to_string(),
                part.start.to_string(),
                part.end.to_string(),
            ]);
        }

        // Flags are set after all partitions exist so numbering is final
        for part in &self.layout.partitions {
            if let Some(flag) = part.flag {
                args.extend([
                    "set".to_string(),
                    part.number.to_string(),
                    flag.to_string(),
                    "on".to_string(),
                ]);
            }
        }

        args
    }
}

/// `partprobe <disk>`: make the kernel re-read the new table.
#[derive(Debug, Clone)]
pub struct RereadPartitions {
    pub disk: String,
}

impl ToolArgs for RereadPartitions {
    fn program(&self) -> &'static str {
        "partprobe"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![self.disk.clone()]
    }
}

/// `udevadm settle`: wait until partition device nodes exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct UdevSettle;

impl ToolArgs for UdevSettle {
    fn program(&self) -> &'static str {
        "udevadm"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec!["settle".to_string()]
    }
}

/// `mkfs.fat -F 32 -n <label>` or `mkfs.ext4 -F -L <label>`.
#[derive(Debug, Clone)]
pub struct FormatPartition {
    pub device: String,
    pub filesystem: Filesystem,
    pub label: String,
}

impl ToolArgs for FormatPartition {
    fn program(&self) -> &'static str {
        self.filesystem.mkfs_program()
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args: Vec<String> = match self.filesystem {
            Filesystem::Fat32 => vec!["-F".into(), "32".into(), "-n".into()],
            Filesystem::Ext4 => vec!["-F".into(), "-L".into()],
        };
        args.push(self.label.clone());
        args.push(self.device.clone());
        args
    }
}

/// `mount <device> <mountpoint>`
#[derive(Debug, Clone)]
pub struct Mount {
    pub device: String,
    pub mountpoint: PathBuf,
}

impl ToolArgs for Mount {
    fn program(&self) -> &'static str {
        "mount"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![self.device.clone(), self.mountpoint.display().to_string()]
    }
}

/// `umount [-R] <path>`
#[derive(Debug, Clone)]
pub struct Unmount {
    pub path: PathBuf,
    pub recursive: bool,
}

impl ToolArgs for Unmount {
    fn program(&self) -> &'static str {
        "umount"
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.recursive {
            args.push("-R".to_string());
        }
        args.push(self.path.display().to_string());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::storage::plan_layout;
    use crate::types::BootMode;

    #[test]
    fn test_parted_gpt_script() {
        let layout = plan_layout("/dev/sda", BootMode::Uefi);
        let args = PartitionDisk { layout }.to_cli_args();
        assert_eq!(
            args.join(" "),
            "--script /dev/sda mklabel gpt \
             mkpart ESP fat32 1MiB 513MiB \
             mkpart root ext4 513MiB 100% \
             set 1 esp on"
        );
    }

    #[test]
    fn test_parted_msdos_script() {
        let layout = plan_layout("/dev/vda", BootMode::Bios);
        let args = PartitionDisk { layout }.to_cli_args();
        assert_eq!(
            args.join(" "),
            "--script /dev/vda mklabel msdos mkpart primary ext4 1MiB 100% set 1 boot on"
        );
    }

    #[test]
    fn test_format_args() {
        let esp = FormatPartition {
            device: "/dev/sda1".into(),
            filesystem: Filesystem::Fat32,
            label: "CVH_EFI".into(),
        };
        assert_eq!(esp.program(), "mkfs.fat");
        assert_eq!(esp.to_cli_args(), vec!["-F", "32", "-n", "CVH_EFI", "/dev/sda1"]);

        let root = FormatPartition {
            device: "/dev/sda2".into(),
            filesystem: Filesystem::Ext4,
            label: "cvh-root".into(),
        };
        assert_eq!(root.program(), "mkfs.ext4");
        assert_eq!(root.to_cli_args(), vec!["-F", "-L", "cvh-root", "/dev/sda2"]);
    }

    #[test]
    fn test_list_disks_is_read_only() {
        assert!(!ListDisks.is_destructive());
        assert!(WipeSignatures { disk: "/dev/sda".into() }.is_destructive());
    }

    #[test]
    fn test_unmount_recursive() {
        let args = Unmount {
            path: PathBuf::from("/mnt"),
            recursive: true,
        };
        assert_eq!(args.to_cli_args(), vec!["-R", "/mnt"]);
    }
}
