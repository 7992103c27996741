//! Package manager tool arguments: keyring, pacstrap, pacman, genfstab.

use crate::tool_traits::ToolArgs;
use std::path::PathBuf;

/// `pacman-key` operations used during install
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacmanKey {
    /// `--init`: create the local keyring
    Init,
    /// `--populate <keyring>`
    Populate(String),
    /// `--recv-key <key> --keyserver <server>`
    RecvKey { key: String, keyserver: String },
    /// `--lsign-key <key>`
    LocalSign(String),
}

impl ToolArgs for PacmanKey {
    fn program(&self) -> &'static str {
        "pacman-key"
    }

    fn to_cli_args(&self) -> Vec<String> {
        match self {
            Self::Init => vec!["--init".into()],
            Self::Populate(keyring) => vec!["--populate".into(), keyring.clone()],
            Self::RecvKey { key, keyserver } => vec![
                "--recv-key".into(),
                key.clone(),
                "--keyserver".into(),
                keyserver.clone(),
            ],
            Self::LocalSign(key) => vec!["--lsign-key".into(), key.clone()],
        }
    }
}

/// `pacstrap -K <target> <packages...>`
///
/// `-K` initializes a fresh keyring inside the target.
#[derive(Debug, Clone)]
pub struct Pacstrap {
    pub target: PathBuf,
    pub packages: Vec<String>,
}

impl ToolArgs for Pacstrap {
    fn program(&self) -> &'static str {
        "pacstrap"
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec!["-K".to_string(), self.target.display().to_string()];
        args.extend(self.packages.iter().cloned());
        args
    }
}

/// `pacman -U --noconfirm <urls...>`: install package files directly.
#[derive(Debug, Clone)]
pub struct PacmanInstallFiles {
    pub urls: Vec<String>,
}

impl ToolArgs for PacmanInstallFiles {
    fn program(&self) -> &'static str {
        "pacman"
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec!["-U".to_string(), "--noconfirm".to_string()];
        args.extend(self.urls.iter().cloned());
        args
    }
}

/// `genfstab -U <target>`: mount records keyed by filesystem UUID.
#[derive(Debug, Clone)]
pub struct Genfstab {
    pub target: PathBuf,
}

impl ToolArgs for Genfstab {
    fn program(&self) -> &'static str {
        "genfstab"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec!["-U".to_string(), self.target.display().to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pacman_key_args() {
        assert_eq!(PacmanKey::Init.to_cli_args(), vec!["--init"]);
        assert_eq!(
            PacmanKey::Populate("archlinux".into()).to_cli_args(),
            vec!["--populate", "archlinux"]
        );
        assert_eq!(
            PacmanKey::LocalSign("ABCD".into()).to_cli_args(),
            vec!["--lsign-key", "ABCD"]
        );
    }

    #[test]
    fn test_pacstrap_args_keep_package_order() {
        let args = Pacstrap {
            target: PathBuf::from("/mnt"),
            packages: vec!["base".into(), "linux".into(), "zsh".into()],
        };
        assert_eq!(args.to_cli_args(), vec!["-K", "/mnt", "base", "linux", "zsh"]);
    }

    #[test]
    fn test_genfstab_uses_uuids() {
        let args = Genfstab {
            target: PathBuf::from("/mnt"),
        };
        assert_eq!(args.to_cli_args(), vec!["-U", "/mnt"]);
    }
}
