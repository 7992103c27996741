//! Disk preparation: executes the storage plan on the confirmed disk.
//!
//! The plan itself is pure and lives in `engine::storage`; this module turns
//! each operation into tool runs. Wipe, partition, format and mount failures
//! are fatal and nothing is cleaned up. Re-reading the partition table is
//! best effort because the kernel usually picks up the table from parted
//! itself.

use crate::engine::storage::{self, StorageOp, StoragePlan};
use crate::error::{InstallerError, Result};
use crate::host::{self, HostSystem};
use crate::install_state::{InstallerContext, PartitionSet};
use crate::tools::disk::{
    FormatPartition, Mount, PartitionDisk, RereadPartitions, UdevSettle, Unmount, WipeSignatures,
};
use crate::ui::Console;
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{info, warn};

pub fn run<R: BufRead, W: Write>(
    ctx: &mut InstallerContext,
    host: &mut dyn HostSystem,
    console: &mut Console<R, W>,
    target: &Path,
) -> Result<()> {
    let state = ctx.state();
    let disk = state
        .disk
        .clone()
        .ok_or_else(|| InstallerError::system("no target disk selected"))?;

    release_target(host, console, target)?;

    let plan = storage::calculate_storage_plan(&disk, state.boot_mode, target);
    info!(
        "Storage plan for {} ({}): {} operations",
        disk,
        plan.layout.table,
        plan.ops.len()
    );
    for op in &plan.ops {
        apply(host, console, op)?;
    }

    ctx.state_mut().partitions = Some(partition_set(&plan)?);
    console.success(format!("{} partitioned and mounted at {}", disk, target.display()))?;
    Ok(())
}

/// Unmount anything left under the target from an earlier attempt.
fn release_target<R: BufRead, W: Write>(
    host: &mut dyn HostSystem,
    console: &mut Console<R, W>,
    target: &Path,
) -> Result<()> {
    let args = Unmount {
        path: target.to_path_buf(),
        recursive: true,
    };
    let output = host::run_tool(host, &args)?;
    if !output.success {
        // Nothing mounted is the common case
        info!("Nothing to unmount under {}", target.display());
    } else {
        console.info(format!("Unmounted stale mounts under {}", target.display()))?;
    }
    Ok(())
}

fn apply<R: BufRead, W: Write>(
    host: &mut dyn HostSystem,
    console: &mut Console<R, W>,
    op: &StorageOp,
) -> Result<()> {
    info!("Applying {}", op);
    match op {
        StorageOp::WipeSignatures { disk } => {
            console.info(format!("Wiping signatures on {}", disk))?;
            host::run_checked(host, &WipeSignatures { disk: disk.clone() })?;
        }
        StorageOp::CreateTable { layout } => {
            console.info(format!(
                "Creating {} partition table on {}",
                layout.table, layout.disk
            ))?;
            host::run_checked(
                host,
                &PartitionDisk {
                    layout: layout.clone(),
                },
            )?;
        }
        StorageOp::RereadTable { disk } => {
            let reread = host::run_tool(host, &RereadPartitions { disk: disk.clone() })?;
            let settle = host::run_tool(host, &UdevSettle)?;
            if !reread.success || !settle.success {
                warn!("Partition table re-read incomplete for {}", disk);
                console.warning(format!(
                    "Kernel may not see the new partitions on {} yet",
                    disk
                ))?;
            }
        }
        StorageOp::Format {
            device,
            filesystem,
            label,
        } => {
            console.info(format!("Formatting {} as {} ({})", device, filesystem, label))?;
            host::run_checked(
                host,
                &FormatPartition {
                    device: device.clone(),
                    filesystem: *filesystem,
                    label: label.clone(),
                },
            )?;
        }
        StorageOp::CreateDir { path } => host.create_dir_all(path)?,
        StorageOp::Mount { device, mountpoint } => {
            console.info(format!("Mounting {} at {}", device, mountpoint.display()))?;
            host::run_checked(
                host,
                &Mount {
                    device: device.clone(),
                    mountpoint: mountpoint.clone(),
                },
            )?;
        }
    }
    Ok(())
}

fn partition_set(plan: &StoragePlan) -> Result<PartitionSet> {
    let root = plan
        .layout
        .root()
        .ok_or_else(|| InstallerError::system("partition layout has no root partition"))?;
    Ok(PartitionSet {
        esp: plan.layout.esp().map(|p| p.device.clone()),
        root: root.device.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::DryRunHost;
    use crate::install_state::InstallationState;
    use crate::types::BootMode;
    use std::io::Cursor;

    fn context(disk: &str, mode: BootMode) -> InstallerContext {
        InstallerContext::with_state(InstallationState {
            disk: Some(disk.to_string()),
            boot_mode: mode,
            ..InstallationState::default()
        })
    }

    fn console() -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(Cursor::new(Vec::new()), Vec::new())
    }

    #[test]
    fn test_uefi_command_sequence() {
        let mut ctx = context("/dev/sda", BootMode::Uefi);
        let mut host = DryRunHost::new();
        run(&mut ctx, &mut host, &mut console(), Path::new("/mnt")).expect("disk");

        assert_eq!(
            host.command_lines(),
            vec![
                "umount -R /mnt",
                "wipefs -af /dev/sda",
                "parted --script /dev/sda mklabel gpt mkpart ESP fat32 1MiB 513MiB \
                 mkpart root ext4 513MiB 100% set 1 esp on",
                "partprobe /dev/sda",
                "udevadm settle",
                "mkfs.fat -F 32 -n CVH_EFI /dev/sda1",
                "mkfs.ext4 -F -L cvh-root /dev/sda2",
                "mount /dev/sda2 /mnt",
                "mount /dev/sda1 /mnt/boot/efi",
            ]
        );

        let parts = ctx.state().partitions.clone().expect("partitions");
        assert_eq!(parts.esp.as_deref(), Some("/dev/sda1"));
        assert_eq!(parts.root, "/dev/sda2");
    }

    #[test]
    fn test_bios_nvme_single_partition() {
        let mut ctx = context("/dev/nvme0n1", BootMode::Bios);
        let mut host = DryRunHost::new().with_boot_mode(BootMode::Bios);
        run(&mut ctx, &mut host, &mut console(), Path::new("/mnt")).expect("disk");

        assert!(host.ran("mkfs.ext4"));
        assert!(!host.ran("mkfs.fat"));
        let parts = ctx.state().partitions.clone().expect("partitions");
        assert_eq!(parts.esp, None);
        assert_eq!(parts.root, "/dev/nvme0n1p1");
    }

    #[test]
    fn test_stale_unmount_and_reread_failures_are_not_fatal() {
        let mut ctx = context("/dev/sda", BootMode::Uefi);
        let mut host = DryRunHost::new()
            .failing("umount")
            .failing("partprobe");
        let mut console = console();
        run(&mut ctx, &mut host, &mut console, Path::new("/mnt")).expect("disk");
        let out = String::from_utf8(console.into_output()).expect("utf8");
        assert!(out.contains("Kernel may not see the new partitions on /dev/sda yet"));
        assert!(host.ran("mount"));
    }

    #[test]
    fn test_format_failure_stops_before_mount() {
        let mut ctx = context("/dev/sda", BootMode::Uefi);
        let mut host = DryRunHost::new().failing("mkfs.ext4");
        let err = run(&mut ctx, &mut host, &mut console(), Path::new("/mnt")).unwrap_err();
        assert!(err.to_string().contains("mkfs.ext4 -F -L cvh-root /dev/sda2 failed"));
        assert!(!host.ran("mount"));
        assert!(ctx.state().partitions.is_none());
    }
}
