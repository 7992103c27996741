//! CVH Linux installer library
//!
//! Everything the `cvh-install` binary does, exposed for integration tests:
//! the stage machine, the steps, the typed tool contracts and the hosts they
//! run on.

pub mod artifacts;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod hardware;
pub mod host;
pub mod input;
pub mod install_state;
pub mod logic;
pub mod process_guard;
pub mod profiles;
pub mod sanity;
pub mod sequencer;
pub mod tool_runner;
pub mod tool_traits;
pub mod tools;
pub mod types;
pub mod ui;

// Re-export main types for convenience
pub use artifacts::{GeneratedArtifact, SystemConfiguration};
pub use config::InstallerOptions;
pub use error::{InstallerError, Result};
pub use host::{DryRunHost, HostSystem, LiveHost};
pub use install_state::{InstallStage, InstallTransitionError, InstallationState, InstallerContext};
pub use process_guard::{ChildRegistry, CommandProcessGroup};
pub use sequencer::Sequencer;
pub use tool_runner::ToolOutput;
pub use tool_traits::{Invocation, ToolArgs};
pub use types::{BootMode, Compositor, Filesystem, Keymap, PartitionTable};
pub use ui::Console;

// Storage engine
pub use engine::storage::{StorageOp, StoragePlan, calculate_storage_plan};

// Package/service resolver
pub use logic::resolver::{resolve_packages, resolve_services};
