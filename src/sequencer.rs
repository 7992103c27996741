//! Installation sequencer
//!
//! Drives the working stages in their fixed order. Each stage is entered
//! through `InstallerContext::transition_to`, so the ordering rules and the
//! wipe confirmation are enforced by the state machine rather than by the
//! loop. The first error marks the context failed, is printed in red and is
//! returned to the caller; nothing is retried or rolled back here.

use crate::config::InstallerOptions;
use crate::error::Result;
use crate::host::HostSystem;
use crate::input;
use crate::install_state::{InstallStage, InstallerContext};
use crate::logic::finalize::RebootChoice;
use crate::logic::{configure, credentials, disk, finalize, fstab, packages, preflight};
use crate::ui::Console;
use std::io::{BufRead, Write};
use tracing::{error, info, warn};

pub struct Sequencer<'a, R, W> {
    ctx: InstallerContext,
    host: &'a mut dyn HostSystem,
    console: Console<R, W>,
    options: InstallerOptions,
    reboot: Option<RebootChoice>,
}

impl<'a, R: BufRead, W: Write> Sequencer<'a, R, W> {
    pub fn new(
        host: &'a mut dyn HostSystem,
        console: Console<R, W>,
        options: InstallerOptions,
    ) -> Self {
        Self {
            ctx: InstallerContext::new(),
            host,
            console,
            options,
            reboot: None,
        }
    }

    pub fn context(&self) -> &InstallerContext {
        &self.ctx
    }

    /// Reboot answer from the final stage, None before it ran
    pub fn reboot_choice(&self) -> Option<RebootChoice> {
        self.reboot
    }

    pub fn into_console(self) -> Console<R, W> {
        self.console
    }

    /// Run every stage to `Completed`, or stop at the first failure.
    pub fn run(&mut self) -> Result<()> {
        info!(
            "Installation started (target {}, dry run: {})",
            self.options.target_root.display(),
            self.options.dry_run
        );

        for &stage in InstallStage::steps() {
            if let Err(err) = self.run_stage(stage) {
                error!("{} failed: {}", stage, err);
                if let Err(e) = self.ctx.fail() {
                    warn!("Could not mark installation failed: {}", e);
                }
                if let Err(e) = self.console.error(&err) {
                    warn!("Could not print error: {}", e);
                }
                return Err(err);
            }
        }

        self.ctx.advance()?;
        info!("Installation completed");
        Ok(())
    }

    fn run_stage(&mut self, stage: InstallStage) -> Result<()> {
        self.ctx.transition_to(stage)?;
        if let Some((position, total)) = self.ctx.step_position() {
            self.console.step(position, total, stage.label())?;
        }
        info!("Stage {}: {}", stage.order(), stage.description());

        let ctx = &mut self.ctx;
        let host = &mut *self.host;
        let console = &mut self.console;
        let target = self.options.target_root.as_path();

        match stage {
            InstallStage::Preflight => preflight::run(ctx, host, console),
            InstallStage::InputCollection => input::collect(ctx, host, console),
            InstallStage::DiskPreparation => disk::run(ctx, host, console, target),
            InstallStage::BaseInstall => packages::run(ctx, host, console, target),
            InstallStage::FstabGeneration => fstab::run(host, console, target),
            InstallStage::SystemConfiguration => {
                configure::run(ctx, host, console, &self.options)
            }
            InstallStage::Credentials => credentials::run(ctx, host, console, target),
            InstallStage::Finalization => {
                self.reboot = Some(finalize::run(ctx, host, console, target)?);
                Ok(())
            }
            InstallStage::NotStarted | InstallStage::Completed | InstallStage::Failed => Ok(()),
        }
    }
}
