use clap::Parser;
use std::path::PathBuf;

/// CVH Linux installer - partitions a disk and installs a Wayland desktop
///
/// Every choice is prompted interactively; no flag is required.
#[derive(Parser, Debug, Clone)]
#[command(name = "cvh-install")]
#[command(about = "Interactive installer for CVH Linux")]
#[command(version)]
pub struct Cli {
    /// Dry-run mode: show what would be executed without making changes.
    ///
    /// Destructive operations (wipe, partition, format, install) are only
    /// recorded and printed. Read-only probes (disk listing, boot mode,
    /// network) still run so the preview is realistic.
    #[arg(long)]
    pub dry_run: bool,

    /// Mount point for the new root filesystem
    #[arg(long, value_name = "DIR", default_value = "/mnt")]
    pub target: PathBuf,

    /// Where the installer writes its log
    #[arg(long, value_name = "PATH", default_value = "/tmp/cvh-install.log")]
    pub log_file: PathBuf,
}

impl Cli {
    /// Parse command line arguments
    #[allow(dead_code)] // Not called from the build script
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
