use std::time::Duration;

use thiserror::Error;

/// Result alias used by every fallible operation in the library.
pub type Result<T> = std::result::Result<T, WanderError>;

#[derive(Error, Debug)]
pub enum WanderError {
    #[error("Failed to execute {program}: {reason}")]
    ToolInvocation { program: String, reason: String },

    #[error("Failed to parse nmcli output: {0}")]
    NmcliParse(String),

    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    #[error("Network '{0}' not found")]
    NetworkNotFound(String),

    #[error("Invalid BSSID '{0}', expected aa:bb:cc:dd:ee:ff")]
    InvalidBssid(String),

    #[error("Scan failed: {0}")]
    ScanFailed(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Disconnect failed: {0}")]
    DisconnectFailed(String),

    #[error("{operation} timed out after {timeout:?}")]
    Timeout { operation: String, timeout: Duration },

    /// The driver and the status-query tool disagree about the interface.
    #[error("Connection status disagrees: driver={primary} wpa_cli={secondary}")]
    Inconsistent { primary: String, secondary: String },

    #[error("Not connected to '{0}' although connect reported success")]
    ConnectUnconfirmed(String),

    #[error("Network {0} is protected, only open networks can be probed")]
    ProtectedNetwork(String),

    #[error("Connectivity check failed: {0}")]
    ConnectivityCheck(String),
}

impl WanderError {
    /// Whether the interface state is unknown and the session must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, WanderError::Inconsistent { .. })
    }

    pub(crate) fn tool(program: &str, reason: impl ToString) -> Self {
        WanderError::ToolInvocation {
            program: program.to_string(),
            reason: reason.to_string(),
        }
    }
}
