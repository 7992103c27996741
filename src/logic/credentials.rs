//! Root and user passwords, set interactively inside the target.

use crate::error::{InstallerError, Result};
use crate::host::HostSystem;
use crate::install_state::InstallerContext;
use crate::tool_traits::ToolArgs;
use crate::tools::system::Passwd;
use crate::tools::InChroot;
use crate::ui::Console;
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{info, warn};

/// `passwd` runs per account before giving up
pub const MAX_PASSWORD_ATTEMPTS: u32 = 3;

pub fn run<R: BufRead, W: Write>(
    ctx: &mut InstallerContext,
    host: &mut dyn HostSystem,
    console: &mut Console<R, W>,
    target: &Path,
) -> Result<()> {
    let username = ctx.state().username.clone();
    for account in ["root", username.as_str()] {
        set_password(host, console, target, account)?;
    }
    Ok(())
}

fn set_password<R: BufRead, W: Write>(
    host: &mut dyn HostSystem,
    console: &mut Console<R, W>,
    target: &Path,
    account: &str,
) -> Result<()> {
    let inv = InChroot::new(
        target,
        Passwd {
            username: account.to_string(),
        },
    )
    .invocation();

    for attempt in 1..=MAX_PASSWORD_ATTEMPTS {
        console.info(format!(
            "Set the password for {} (attempt {}/{})",
            account, attempt, MAX_PASSWORD_ATTEMPTS
        ))?;
        let output = host.run_interactive(&inv)?;
        if output.success {
            info!("Password set for {}", account);
            console.success(format!("Password set for {}", account))?;
            return Ok(());
        }
        warn!("passwd {} failed on attempt {}", account, attempt);
        console.warning("Passwords did not match or were rejected, try again")?;
    }

    Err(InstallerError::CredentialsFailed {
        user: account.to_string(),
        attempts: MAX_PASSWORD_ATTEMPTS,
    })
}
