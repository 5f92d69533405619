//! The WiFi driver capability.
//!
//! [`WifiDriver`] is the only way the rest of the crate touches the radio:
//! scanning, joining, leaving and status queries. [`NmcliDriver`] backs it
//! with NetworkManager; tests substitute a fake.

use std::time::Duration;

use tracing::warn;

use crate::connection;
use crate::error::Result;
use crate::network::ScanResult;
use crate::scan;

/// Snapshot of the interface's connection state from the driver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub interface: String,
    pub connected: bool,
    /// Raw driver state, e.g. `"100 (connected)"`.
    pub state: String,
    pub ssid: Option<String>,
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
}

impl ConnectionStatus {
    pub fn disconnected(interface: &str) -> Self {
        Self {
            interface: interface.to_string(),
            state: "disconnected".to_string(),
            ..Self::default()
        }
    }
}

/// Result of a successful connect call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub interface: String,
    pub ssid: String,
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
    /// The connect call created a new saved profile rather than reusing one.
    pub created_profile: bool,
}

impl Connection {
    /// Build from the status read back after joining. A failed read-back
    /// leaves the addresses unknown; the association itself already succeeded.
    pub fn read_back(
        interface: &str,
        ssid: &str,
        created_profile: bool,
        status: Result<ConnectionStatus>,
    ) -> Self {
        let (ipv4, ipv6) = match status {
            Ok(status) => (status.ipv4, status.ipv6),
            Err(e) => {
                warn!("couldn't read addresses of {} after connecting: {}", interface, e);
                (None, None)
            }
        };
        Self {
            interface: interface.to_string(),
            ssid: ssid.to_string(),
            ipv4,
            ipv6,
            created_profile,
        }
    }
}

pub trait WifiDriver {
    /// Name of the interface this driver controls.
    fn interface(&self) -> &str;

    /// All access points currently visible.
    fn scan(&self) -> Result<Vec<ScanResult>>;

    /// Join `ssid`; an empty `passphrase` joins an open network.
    fn connect(&self, ssid: &str, passphrase: &str, timeout: Duration) -> Result<Connection>;

    /// Leave the current network. Returns whether the driver confirmed it.
    fn disconnect(&self, ssid: &str, timeout: Duration) -> Result<bool>;

    fn current_status(&self) -> Result<ConnectionStatus>;

    /// Drop the saved profile for `ssid` so it is never auto-joined.
    fn forget(&self, _ssid: &str) -> Result<()> {
        Ok(())
    }
}

/// [`WifiDriver`] implemented with NetworkManager's `nmcli`.
#[derive(Debug, Clone)]
pub struct NmcliDriver {
    interface: String,
}

impl NmcliDriver {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }
}

impl WifiDriver for NmcliDriver {
    fn interface(&self) -> &str {
        &self.interface
    }

    fn scan(&self) -> Result<Vec<ScanResult>> {
        scan::scan_networks(&self.interface)
    }

    fn connect(&self, ssid: &str, passphrase: &str, timeout: Duration) -> Result<Connection> {
        // an unreadable profile list counts as existing so it is never deleted
        let existed = connection::has_profile(ssid).unwrap_or_else(|e| {
            warn!("couldn't list connection profiles: {}", e);
            true
        });
        connection::connect(&self.interface, ssid, passphrase, timeout)?;
        Ok(Connection::read_back(
            &self.interface,
            ssid,
            !existed,
            connection::status(&self.interface),
        ))
    }

    fn disconnect(&self, _ssid: &str, timeout: Duration) -> Result<bool> {
        connection::disconnect(&self.interface, timeout)?;
        Ok(true)
    }

    fn current_status(&self) -> Result<ConnectionStatus> {
        connection::status(&self.interface)
    }

    fn forget(&self, ssid: &str) -> Result<()> {
        connection::delete_connection(ssid)
    }
}
