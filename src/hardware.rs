//! Live environment detection
//!
//! Boot mode, network reachability, network interfaces and installable disks.
//! Everything here is read-only: nothing touches a disk or a network
//! configuration.
//!
//! Ambiguous detection logs a warning and falls back to the conservative
//! answer (BIOS, offline).

use crate::types::BootMode;
use std::fmt;
use std::net::{SocketAddr, TcpStream};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// HTTPS endpoint probed for connectivity (archlinux.org).
pub const CONNECTIVITY_ENDPOINT: &str = "147.75.81.97:443";

/// How long the connectivity probe waits for the TCP handshake.
pub const CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(5);

/// Network connectivity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
    /// TCP connection to the probe endpoint succeeded
    Online,
    /// TCP connection failed or timed out
    Offline,
}

impl NetworkState {
    /// Returns true if network connectivity is available.
    pub fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }
}

impl fmt::Display for NetworkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => write!(f, "Online"),
            Self::Offline => write!(f, "Offline"),
        }
    }
}

/// Detect the boot mode by checking for the EFI sysfs directory.
///
/// The kernel exposes `/sys/firmware/efi` only when booted through UEFI.
pub fn detect_boot_mode() -> BootMode {
    detect_boot_mode_at(Path::new("/sys/firmware/efi"))
}

fn detect_boot_mode_at(efi_path: &Path) -> BootMode {
    if efi_path.exists() {
        info!("UEFI firmware detected ({} exists)", efi_path.display());
        BootMode::Uefi
    } else {
        info!("BIOS firmware detected ({} not found)", efi_path.display());
        BootMode::Bios
    }
}

/// Probe connectivity with a TCP handshake to a well-known HTTPS endpoint.
///
/// Returns `Offline` on any failure (refused, unreachable, timeout).
pub fn detect_internet() -> NetworkState {
    let addr: SocketAddr = match CONNECTIVITY_ENDPOINT.parse() {
        Ok(a) => a,
        Err(e) => {
            warn!("Failed to parse socket address: {}", e);
            return NetworkState::Offline;
        }
    };

    match TcpStream::connect_timeout(&addr, CONNECTIVITY_TIMEOUT) {
        Ok(_stream) => {
            info!("Network connectivity confirmed (TCP to {})", CONNECTIVITY_ENDPOINT);
            NetworkState::Online
        }
        Err(e) => {
            warn!("Network connectivity check failed: {}", e);
            NetworkState::Offline
        }
    }
}

/// Non-loopback interfaces from `/sys/class/net`, sorted by name.
pub fn network_interfaces() -> Vec<String> {
    let entries = match std::fs::read_dir("/sys/class/net") {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot list network interfaces: {}", e);
            return Vec::new();
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name != "lo")
        .collect();
    names.sort();
    names
}

/// A whole disk the installer can target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskInfo {
    /// Device path, e.g. `/dev/sda`
    pub path: String,
    /// Human-readable size as reported by lsblk
    pub size: String,
    /// Vendor model string; may be empty
    pub model: String,
}

impl DiskInfo {
    /// Kernel name without the `/dev/` prefix
    pub fn name(&self) -> &str {
        self.path.strip_prefix("/dev/").unwrap_or(&self.path)
    }
}

impl fmt::Display for DiskInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.model.is_empty() {
            write!(f, "{} ({})", self.path, self.size)
        } else {
            write!(f, "{} ({}, {})", self.path, self.size, self.model)
        }
    }
}

/// Parse `lsblk -d -p -n -o NAME,SIZE,TYPE,MODEL` output.
///
/// Keeps rows of type `disk` only, which drops loop and rom devices. zram
/// swap devices also report as `disk` and are skipped by name.
pub fn parse_lsblk_disks(output: &str) -> Vec<DiskInfo> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let path = fields.next()?;
            let size = fields.next()?;
            let kind = fields.next()?;
            let model = fields.collect::<Vec<_>>().join(" ");

            if kind != "disk" || path.contains("zram") {
                return None;
            }

            Some(DiskInfo {
                path: path.to_string(),
                size: size.to_string(),
                model,
            })
        })
        .collect()
}
