//! Runtime options
//!
//! Everything the installer needs that is not asked interactively: where the
//! new root is mounted, whether to execute or only record, and where to log.

use crate::cli::Cli;
use std::path::{Path, PathBuf};

/// Default mountpoint of the new root
pub const DEFAULT_TARGET: &str = "/mnt";
/// Default installer log
pub const DEFAULT_LOG_FILE: &str = "/tmp/cvh-install.log";
/// Where the configuration record is persisted, relative to the target
pub const RECORD_PATH: &str = "var/log/cvh-install/system-config.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerOptions {
    pub target_root: PathBuf,
    pub dry_run: bool,
    pub log_file: PathBuf,
}

impl Default for InstallerOptions {
    fn default() -> Self {
        Self {
            target_root: PathBuf::from(DEFAULT_TARGET),
            dry_run: false,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl InstallerOptions {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            target_root: cli.target.clone(),
            dry_run: cli.dry_run,
            log_file: cli.log_file.clone(),
        }
    }

    /// Resolve an absolute in-target path (`/etc/hostname`) against the
    /// target root (`/mnt/etc/hostname`).
    pub fn in_target(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        self.target_root
            .join(path.strip_prefix("/").unwrap_or(path))
    }

    /// Host path of the persisted configuration record
    pub fn record_path(&self) -> PathBuf {
        self.target_root.join(RECORD_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults_match_cli_defaults() {
        let cli = Cli::try_parse_from(["cvh-install"]).expect("parse");
        assert_eq!(InstallerOptions::from_cli(&cli), InstallerOptions::default());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from([
            "cvh-install",
            "--dry-run",
            "--target",
            "/tmp/root",
            "--log-file",
            "/tmp/x.log",
        ])
        .expect("parse");
        let opts = InstallerOptions::from_cli(&cli);
        assert!(opts.dry_run);
        assert_eq!(opts.target_root, PathBuf::from("/tmp/root"));
        assert_eq!(opts.log_file, PathBuf::from("/tmp/x.log"));
    }

    #[test]
    fn test_in_target_strips_leading_slash() {
        let opts = InstallerOptions::default();
        assert_eq!(opts.in_target("/etc/hostname"), PathBuf::from("/mnt/etc/hostname"));
        assert_eq!(opts.in_target("etc/issue"), PathBuf::from("/mnt/etc/issue"));
        assert_eq!(
            opts.record_path(),
            PathBuf::from("/mnt/var/log/cvh-install/system-config.json")
        );
    }
}
