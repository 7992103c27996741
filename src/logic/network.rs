//! Network check with a single reconnection pass.

use crate::error::{InstallerError, Result};
use crate::hardware::NetworkState;
use crate::host::{self, HostSystem};
use crate::tools::network::Dhcpcd;
use crate::tools::system::{Systemctl, SystemctlAction};
use crate::ui::Console;
use std::io::{BufRead, Write};
use std::time::Duration;
use tracing::{info, warn};

/// Wait after restarting networking before probing again
pub const RECONNECT_SETTLE: Duration = Duration::from_secs(5);

/// Make sure the package mirrors are reachable.
///
/// When offline: start NetworkManager, request a DHCP lease on every
/// interface, wait, probe once more. Still offline is fatal.
pub fn ensure_online<R: BufRead, W: Write>(
    host: &mut dyn HostSystem,
    console: &mut Console<R, W>,
) -> Result<()> {
    if host.network_state().is_online() {
        console.success("Network connection available")?;
        return Ok(());
    }

    console.warning("No network connection, trying to reconnect")?;
    reconnect(host)?;
    host.pause(RECONNECT_SETTLE);

    match host.network_state() {
        NetworkState::Online => {
            console.success("Network connection restored")?;
            Ok(())
        }
        NetworkState::Offline => Err(InstallerError::NoNetwork),
    }
}

fn reconnect(host: &mut dyn HostSystem) -> Result<()> {
    let start = Systemctl {
        action: SystemctlAction::Start,
        units: vec!["NetworkManager".to_string()],
    };
    if !host::run_tool(host, &start)?.success {
        warn!("Could not start NetworkManager");
    }

    for interface in host.network_interfaces() {
        let output = host::run_tool(
            host,
            &Dhcpcd {
                interface: interface.clone(),
            },
        )?;
        if output.success {
            info!("DHCP requested on {}", interface);
        } else {
            warn!("dhcpcd failed on {}", interface);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::DryRunHost;
    use std::io::Cursor;

    fn console() -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(Cursor::new(Vec::new()), Vec::new())
    }

    #[test]
    fn test_online_runs_nothing() {
        let mut host = DryRunHost::new();
        ensure_online(&mut host, &mut console()).expect("online");
        assert!(host.commands().is_empty());
        assert!(host.pauses().is_empty());
    }

    #[test]
    fn test_reconnect_pass() {
        let mut host = DryRunHost::new()
            .with_interfaces(&["enp1s0", "wlan0"])
            .with_network(&[NetworkState::Offline, NetworkState::Online]);
        ensure_online(&mut host, &mut console()).expect("recovered");
        assert_eq!(
            host.command_lines(),
            vec![
                "systemctl start NetworkManager",
                "dhcpcd enp1s0",
                "dhcpcd wlan0"
            ]
        );
        assert_eq!(host.pauses(), &[RECONNECT_SETTLE]);
    }

    #[test]
    fn test_still_offline_is_fatal() {
        let mut host = DryRunHost::new()
            .failing("dhcpcd")
            .with_network(&[NetworkState::Offline, NetworkState::Offline]);
        let err = ensure_online(&mut host, &mut console()).unwrap_err();
        assert!(matches!(err, InstallerError::NoNetwork));
    }
}
