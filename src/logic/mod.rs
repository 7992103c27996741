//! Installation steps
//!
//! One module per working stage. Each `run` reads what earlier stages left in
//! the `InstallerContext`, performs its side effects through a `HostSystem`
//! and records its results back into the context.
//!
//! - `preflight`: root, required tools, banner, boot mode
//! - `disk`: wipe, partition, format, mount
//! - `network`: connectivity check and reconnection pass
//! - `packages`: keyring and pacstrap
//! - `fstab`: mount table for the new root
//! - `configure`: configuration payload applied to the target
//! - `credentials`: root and user passwords
//! - `finalize`: sync, unmount, summary, reboot
//! - `resolver`: package and service resolution
//!
//! Input collection lives in `crate::input`.

pub mod configure;
pub mod credentials;
pub mod disk;
pub mod finalize;
pub mod fstab;
pub mod network;
pub mod packages;
pub mod preflight;
pub mod resolver;
