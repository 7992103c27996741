//! Network recovery tool arguments.

use crate::tool_traits::ToolArgs;

/// `dhcpcd <interface>`: request a lease on one interface.
#[derive(Debug, Clone)]
pub struct Dhcpcd {
    pub interface: String,
}

impl ToolArgs for Dhcpcd {
    fn program(&self) -> &'static str {
        "dhcpcd"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![self.interface.clone()]
    }
}
