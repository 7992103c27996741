//! Install State Machine
//!
//! `InstallerContext` is the single owner of installation progress and of the
//! `InstallationState` record every step reads and extends. Transitions are
//! validated: stages run strictly in order, never backwards, and the disk stage
//! cannot be entered before the user confirmed the wipe.
//!
//! # Stage Flow
//!
//! ```text
//! NotStarted
//!     ↓
//! Preflight            [1/8]
//!     ↓
//! InputCollection      [2/8]
//!     ↓
//! DiskPreparation      [3/8]  destructive, needs confirmation
//!     ↓
//! BaseInstall          [4/8]
//!     ↓
//! FstabGeneration      [5/8]
//!     ↓
//! SystemConfiguration  [6/8]
//!     ↓
//! Credentials          [7/8]
//!     ↓
//! Finalization         [8/8]
//!     ↓
//! Completed
//!
//! (Any non-terminal stage can transition to Failed)
//! ```

use crate::types::{BootMode, Compositor, Keymap};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Number of working stages shown to the user
pub const TOTAL_STEPS: usize = 8;

/// Installation stages. Working stages carry their `[n/8]` position as discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum InstallStage {
    #[default]
    NotStarted = 0,
    /// Privileges, tools, banner, boot mode
    Preflight = 1,
    /// Interactive prompts
    InputCollection = 2,
    /// Wipe, partition, format, mount. Destructive.
    DiskPreparation = 3,
    /// Network, keyring, pacstrap
    BaseInstall = 4,
    /// Mount table for the new root
    FstabGeneration = 5,
    /// Configuration payload applied to the target
    SystemConfiguration = 6,
    /// Root and user passwords
    Credentials = 7,
    /// Sync, unmount, summary, reboot prompt
    Finalization = 8,
    /// Terminal: success
    Completed = 9,
    /// Terminal: failure
    Failed = 255,
}

impl InstallStage {
    /// The working stages the sequencer runs, in order
    const STEPS: [Self; TOTAL_STEPS] = [
        Self::Preflight,
        Self::InputCollection,
        Self::DiskPreparation,
        Self::BaseInstall,
        Self::FstabGeneration,
        Self::SystemConfiguration,
        Self::Credentials,
        Self::Finalization,
    ];

    /// Numeric order (0-9, 255 for Failed)
    #[inline]
    pub const fn order(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Only the disk stage erases data
    #[inline]
    pub const fn is_destructive(self) -> bool {
        matches!(self, Self::DiskPreparation)
    }

    pub const fn next(self) -> Option<Self> {
        match self {
            Self::NotStarted => Some(Self::Preflight),
            Self::Finalization => Some(Self::Completed),
            Self::Completed | Self::Failed => None,
            step => match step.step_position() {
                Some(n) => Some(Self::STEPS[n]),
                None => None,
            },
        }
    }

    /// Short step title for the `[n/8]` progress line
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "Not started",
            Self::Preflight => "Preflight checks",
            Self::InputCollection => "Installation choices",
            Self::DiskPreparation => "Disk preparation",
            Self::BaseInstall => "Base system",
            Self::FstabGeneration => "Filesystem table",
            Self::SystemConfiguration => "System configuration",
            Self::Credentials => "Passwords",
            Self::Finalization => "Finalization",
            Self::Completed => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Longer description for logs
    pub const fn description(self) -> &'static str {
        match self {
            Self::NotStarted => "Waiting to start",
            Self::Preflight => "Checking privileges, tools and boot mode",
            Self::InputCollection => "Collecting installation choices",
            Self::DiskPreparation => "Partitioning, formatting and mounting the disk",
            Self::BaseInstall => "Installing the base system",
            Self::FstabGeneration => "Generating the filesystem table",
            Self::SystemConfiguration => "Configuring the installed system",
            Self::Credentials => "Setting passwords",
            Self::Finalization => "Unmounting and summarizing",
            Self::Completed => "Done",
            Self::Failed => "Aborted",
        }
    }

    /// 1-based position among the working stages, None for bookends
    pub const fn step_position(self) -> Option<usize> {
        match self {
            Self::NotStarted | Self::Completed | Self::Failed => None,
            other => Some(other.order() as usize),
        }
    }

    pub fn steps() -> &'static [Self] {
        &Self::STEPS
    }
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rejected stage transitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstallTransitionError {
    #[error("{to} cannot follow {from}")]
    SkippedStage { from: InstallStage, to: InstallStage },

    #[error("cannot return to {to} from {from}")]
    BackwardTransition { from: InstallStage, to: InstallStage },

    #[error("installation already ended ({from})")]
    FromTerminalState { from: InstallStage },

    #[error("{stage} erases the disk and needs the operator's confirmation")]
    MissingConfirmation { stage: InstallStage },

    #[error("{stage} is already running")]
    AlreadyAtStage { stage: InstallStage },
}

impl From<InstallTransitionError> for crate::error::InstallerError {
    fn from(err: InstallTransitionError) -> Self {
        crate::error::InstallerError::InstallTransition(err.to_string())
    }
}

/// Partition device nodes created on the target disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSet {
    /// EFI system partition, UEFI only
    pub esp: Option<String>,
    pub root: String,
}

/// Choices and facts gathered during installation.
///
/// Defaults are the values an operator gets by pressing Enter at every prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallationState {
    pub boot_mode: BootMode,
    pub disk: Option<String>,
    pub partitions: Option<PartitionSet>,
    pub locale: String,
    pub timezone: String,
    pub keymap: Keymap,
    pub compositor: Compositor,
    pub username: String,
    pub hostname: String,
}

/// Default hostname when the prompt is empty or invalid
pub const DEFAULT_HOSTNAME: &str = "cvh-linux";
/// Default username when the prompt is empty or invalid
pub const DEFAULT_USERNAME: &str = "cvh";
/// Fixed system locale
pub const DEFAULT_LOCALE: &str = "en_US.UTF-8";
/// Default timezone
pub const DEFAULT_TIMEZONE: &str = "Asia/Jerusalem";

impl Default for InstallationState {
    fn default() -> Self {
        Self {
            boot_mode: BootMode::default(),
            disk: None,
            partitions: None,
            locale: DEFAULT_LOCALE.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            keymap: Keymap::default(),
            compositor: Compositor::default(),
            username: DEFAULT_USERNAME.to_string(),
            hostname: DEFAULT_HOSTNAME.to_string(),
        }
    }
}

impl InstallationState {
    /// Home directory of the created user, inside the target
    pub fn home_dir(&self) -> String {
        format!("/home/{}", self.username)
    }
}

/// Owner of installation progress and of the state record.
///
/// ```
/// use cvh_install::install_state::{InstallerContext, InstallStage};
///
/// let mut ctx = InstallerContext::new();
/// assert_eq!(ctx.advance(), Ok(InstallStage::Preflight));
/// assert!(ctx.transition_to(InstallStage::BaseInstall).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InstallerContext {
    current: InstallStage,
    failed_at: Option<InstallStage>,
    wipe_confirmed: bool,
    state: InstallationState,
}

impl InstallerContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: InstallationState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    #[inline]
    pub fn state(&self) -> &InstallationState {
        &self.state
    }

    #[inline]
    pub fn state_mut(&mut self) -> &mut InstallationState {
        &mut self.state
    }

    #[inline]
    pub fn current_stage(&self) -> InstallStage {
        self.current
    }

    /// Stage that was running when `fail` was called
    #[inline]
    pub fn failed_at(&self) -> Option<InstallStage> {
        self.failed_at
    }

    pub fn is_complete(&self) -> bool {
        self.current == InstallStage::Completed
    }

    pub fn is_failed(&self) -> bool {
        self.current == InstallStage::Failed
    }

    /// `(position, total)` for the progress line, None outside working stages
    pub fn step_position(&self) -> Option<(usize, usize)> {
        self.current.step_position().map(|n| (n, TOTAL_STEPS))
    }

    /// Record that the operator authorized erasing the disk. One-way.
    pub fn confirm_destructive_operations(&mut self) {
        info!("Disk wipe confirmed");
        self.wipe_confirmed = true;
    }

    #[inline]
    pub fn is_destructive_confirmed(&self) -> bool {
        self.wipe_confirmed
    }

    /// Move to the stage after the current one.
    pub fn advance(&mut self) -> Result<InstallStage, InstallTransitionError> {
        match self.current.next() {
            Some(next) => self.transition_to(next),
            None => Err(InstallTransitionError::FromTerminalState { from: self.current }),
        }
    }

    /// Enter `target`, which must directly follow the current stage.
    pub fn transition_to(
        &mut self,
        target: InstallStage,
    ) -> Result<InstallStage, InstallTransitionError> {
        let from = self.current;
        if from.is_terminal() {
            return Err(InstallTransitionError::FromTerminalState { from });
        }
        if target == from {
            return Err(InstallTransitionError::AlreadyAtStage { stage: target });
        }
        // Failed is only reachable through fail()
        if target != InstallStage::Failed && target.order() < from.order() {
            return Err(InstallTransitionError::BackwardTransition { from, to: target });
        }
        if from.next() != Some(target) {
            return Err(InstallTransitionError::SkippedStage { from, to: target });
        }
        if target.is_destructive() && !self.wipe_confirmed {
            return Err(InstallTransitionError::MissingConfirmation { stage: target });
        }

        debug!("Stage {} -> {}", from, target);
        self.current = target;
        Ok(target)
    }

    /// Abort at the current stage. Terminal.
    pub fn fail(&mut self) -> Result<(), InstallTransitionError> {
        if self.current.is_terminal() {
            return Err(InstallTransitionError::FromTerminalState { from: self.current });
        }

        warn!("Aborted during: {}", self.current.description());
        self.failed_at = Some(self.current);
        self.current = InstallStage::Failed;
        Ok(())
    }
}
