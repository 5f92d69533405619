//! Local-segment diagnostics run while connected to a probed network.
//! Output is raw tool text, logged verbatim and never parsed.

use std::time::Duration;

use crate::error::{Result, WanderError};
use crate::process;

pub trait DiagnosticRunner {
    /// mDNS/DNS-SD services announced on the segment.
    fn service_discovery(&self) -> Result<String>;

    /// The kernel's neighbor (ARP/NDP) table.
    fn neighbor_table(&self) -> Result<String>;
}

/// Runs `avahi-browse` and `ip neighbor` with a deadline.
#[derive(Debug, Clone)]
pub struct ShellDiagnostics {
    interface: String,
    timeout: Duration,
}

impl ShellDiagnostics {
    pub fn new(interface: impl Into<String>, timeout: Duration) -> Self {
        Self {
            interface: interface.into(),
            timeout,
        }
    }

    fn output_of(&self, program: &str, args: &[&str]) -> Result<String> {
        let output = process::run(program, args, self.timeout)?;
        if !output.success() {
            return Err(WanderError::tool(program, output.error_message()));
        }
        Ok(output.stdout)
    }
}

impl DiagnosticRunner for ShellDiagnostics {
    fn service_discovery(&self) -> Result<String> {
        // -t terminates after the cache is dumped instead of browsing forever
        self.output_of("avahi-browse", &["-a", "-t"])
    }

    fn neighbor_table(&self) -> Result<String> {
        self.output_of("ip", &["neighbor", "show", "dev", self.interface.as_str()])
    }
}
