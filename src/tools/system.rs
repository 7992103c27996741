//! System configuration tool arguments: services, locale, clock, users,
//! console keymap, bootloader, reboot.

use crate::tool_traits::ToolArgs;
use crate::types::BootMode;

/// `systemctl <action> <units...>`
#[derive(Debug, Clone)]
pub struct Systemctl {
    pub action: SystemctlAction,
    pub units: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemctlAction {
    Start,
    Enable,
}

impl ToolArgs for Systemctl {
    fn program(&self) -> &'static str {
        "systemctl"
    }

    fn to_cli_args(&self) -> Vec<String> {
        let action = match self.action {
            SystemctlAction::Start => "start",
            SystemctlAction::Enable => "enable",
        };
        let mut args = vec![action.to_string()];
        args.extend(self.units.iter().cloned());
        args
    }
}

/// `locale-gen`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocaleGen;

impl ToolArgs for LocaleGen {
    fn program(&self) -> &'static str {
        "locale-gen"
    }

    fn to_cli_args(&self) -> Vec<String> {
        Vec::new()
    }
}

/// `hwclock --systohc`
#[derive(Debug, Clone, Copy, Default)]
pub struct Hwclock;

impl ToolArgs for Hwclock {
    fn program(&self) -> &'static str {
        "hwclock"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec!["--systohc".to_string()]
    }
}

/// `ln -sf /usr/share/zoneinfo/<zone> /etc/localtime`
#[derive(Debug, Clone)]
pub struct LinkLocaltime {
    pub timezone: String,
}

impl ToolArgs for LinkLocaltime {
    fn program(&self) -> &'static str {
        "ln"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "-sf".to_string(),
            format!("/usr/share/zoneinfo/{}", self.timezone),
            "/etc/localtime".to_string(),
        ]
    }
}

/// `useradd -m -G <groups> -s <shell> <user>`
#[derive(Debug, Clone)]
pub struct Useradd {
    pub username: String,
    pub groups: Vec<String>,
    pub shell: String,
}

impl ToolArgs for Useradd {
    fn program(&self) -> &'static str {
        "useradd"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "-m".to_string(),
            "-G".to_string(),
            self.groups.join(","),
            "-s".to_string(),
            self.shell.clone(),
            self.username.clone(),
        ]
    }
}

/// `chown -R <owner>:<owner> <path>`
#[derive(Debug, Clone)]
pub struct ChownRecursive {
    pub owner: String,
    pub path: String,
}

impl ToolArgs for ChownRecursive {
    fn program(&self) -> &'static str {
        "chown"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "-R".to_string(),
            format!("{0}:{0}", self.owner),
            self.path.clone(),
        ]
    }
}

/// `passwd [user]`: interactive, reads the new password from the terminal.
#[derive(Debug, Clone)]
pub struct Passwd {
    pub username: String,
}

impl ToolArgs for Passwd {
    fn program(&self) -> &'static str {
        "passwd"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![self.username.clone()]
    }
}

/// `loadkeys <keymap>`: switch the live console layout.
#[derive(Debug, Clone)]
pub struct LoadKeys {
    pub keymap: String,
}

impl ToolArgs for LoadKeys {
    fn program(&self) -> &'static str {
        "loadkeys"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![self.keymap.clone()]
    }
}

/// `grub-install` with boot-mode specific target.
#[derive(Debug, Clone)]
pub struct GrubInstall {
    pub boot_mode: BootMode,
    /// Whole disk for the BIOS boot code; unused on UEFI
    pub disk: String,
    pub efi_directory: String,
    pub bootloader_id: String,
}

impl ToolArgs for GrubInstall {
    fn program(&self) -> &'static str {
        "grub-install"
    }

    fn to_cli_args(&self) -> Vec<String> {
        match self.boot_mode {
            BootMode::Uefi => vec![
                "--target=x86_64-efi".to_string(),
                format!("--efi-directory={}", self.efi_directory),
                format!("--bootloader-id={}", self.bootloader_id),
            ],
            BootMode::Bios => vec!["--target=i386-pc".to_string(), self.disk.clone()],
        }
    }
}

/// `grub-mkconfig -o <path>`
#[derive(Debug, Clone)]
pub struct GrubMkconfig {
    pub output: String,
}

impl ToolArgs for GrubMkconfig {
    fn program(&self) -> &'static str {
        "grub-mkconfig"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec!["-o".to_string(), self.output.clone()]
    }
}

/// `reboot`
#[derive(Debug, Clone, Copy, Default)]
pub struct Reboot;

impl ToolArgs for Reboot {
    fn program(&self) -> &'static str {
        "reboot"
    }

    fn to_cli_args(&self) -> Vec<String> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grub(mode: BootMode) -> GrubInstall {
        GrubInstall {
            boot_mode: mode,
            disk: "/dev/sda".into(),
            efi_directory: "/boot/efi".into(),
            bootloader_id: "CVH".into(),
        }
    }

    #[test]
    fn test_grub_install_uefi() {
        assert_eq!(
            grub(BootMode::Uefi).to_cli_args(),
            vec!["--target=x86_64-efi", "--efi-directory=/boot/efi", "--bootloader-id=CVH"]
        );
    }

    #[test]
    fn test_grub_install_bios_targets_disk() {
        assert_eq!(
            grub(BootMode::Bios).to_cli_args(),
            vec!["--target=i386-pc", "/dev/sda"]
        );
    }

    #[test]
    fn test_useradd_groups_joined() {
        let args = Useradd {
            username: "cvh".into(),
            groups: vec!["wheel".into(), "audio".into()],
            shell: "/bin/zsh".into(),
        };
        assert_eq!(
            args.to_cli_args(),
            vec!["-m", "-G", "wheel,audio", "-s", "/bin/zsh", "cvh"]
        );
    }

    #[test]
    fn test_link_localtime() {
        let args = LinkLocaltime {
            timezone: "Asia/Jerusalem".into(),
        };
        assert_eq!(
            args.to_cli_args(),
            vec!["-sf", "/usr/share/zoneinfo/Asia/Jerusalem", "/etc/localtime"]
        );
    }

    #[test]
    fn test_systemctl_enable_many() {
        let args = Systemctl {
            action: SystemctlAction::Enable,
            units: vec!["sddm".into(), "fstrim.timer".into()],
        };
        assert_eq!(args.to_cli_args(), vec!["enable", "sddm", "fstrim.timer"]);
    }

    #[test]
    fn test_chown_owner_group() {
        let args = ChownRecursive {
            owner: "cvh".into(),
            path: "/home/cvh".into(),
        };
        assert_eq!(args.to_cli_args(), vec!["-R", "cvh:cvh", "/home/cvh"]);
    }
}
