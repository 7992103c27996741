//! Typed argument structs for every external tool the installer runs.
//!
//! Each struct implements [`ToolArgs`](crate::tool_traits::ToolArgs).
//! Tools that must run inside the new root are wrapped in [`InChroot`].

pub mod disk;
pub mod network;
pub mod packages;
pub mod system;

use crate::tool_traits::ToolArgs;
use std::path::PathBuf;

/// Run a tool inside the target root via `arch-chroot`.
#[derive(Debug, Clone)]
pub struct InChroot<T: ToolArgs> {
    pub root: PathBuf,
    pub inner: T,
}

impl<T: ToolArgs> InChroot<T> {
    pub fn new(root: impl Into<PathBuf>, inner: T) -> Self {
        Self {
            root: root.into(),
            inner,
        }
    }
}

impl<T: ToolArgs> ToolArgs for InChroot<T> {
    fn program(&self) -> &'static str {
        "arch-chroot"
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec![
            self.root.display().to_string(),
            self.inner.program().to_string(),
        ];
        args.extend(self.inner.to_cli_args());
        args
    }

    fn get_env_vars(&self) -> Vec<(String, String)> {
        self.inner.get_env_vars()
    }
}
