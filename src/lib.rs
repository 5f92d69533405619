//! WiFi wandering and open-network probing.
//!
//! This library tracks the access points in radio range across repeated
//! scans and probes open networks end to end: join, check for real internet
//! access (spotting captive portals), look around the local segment, leave.
//! The interface state is cross-checked against two independent sources and
//! any disagreement stops the session instead of guessing.
//!
//! # Modules
//!
//! - [`registry`] - Live set of networks in range, reconciled every scan
//! - [`filter`] - Candidate filters and ranking
//! - [`probe`] - The connect/verify/diagnose/disconnect state machine
//! - [`wander`] - The periodic scan and probe loop
//! - [`driver`] - The WiFi driver capability and its nmcli implementation
//! - [`status`] - Dual-source connection status reconciliation
//!
//! # Example Usage
//!
//! ```no_run
//! use wifi_wander::{NmcliDriver, NetworkRegistry, SessionLog, WifiDriver};
//! use wifi_wander::filter::{default_filter, select};
//!
//! let driver = NmcliDriver::new("wlan0");
//! let mut registry = NetworkRegistry::new();
//! let mut log = SessionLog::stdout();
//!
//! let observed = driver.scan().expect("scan failed");
//! registry.reconcile(observed, chrono::Utc::now(), &mut log);
//! for network in select(&registry, &default_filter(&[])) {
//!     println!("{} signal: {}", network, network.latest_signal());
//! }
//! ```

/// Configuration file handling and interface resolution.
/// Reads TOML from the user's config directory.
pub mod config;

/// Captive-portal aware internet reachability check.
pub mod connectivity;

/// nmcli-backed connect, disconnect and status queries.
pub mod connection;

/// Local-segment diagnostics (mDNS browse, neighbor table).
pub mod diagnostics;

/// The [`WifiDriver`] trait and [`NmcliDriver`].
pub mod driver;

/// Error type for the library, built with `thiserror`.
pub mod error;

/// Candidate network filters and selection.
pub mod filter;

/// WiFi interface discovery.
pub mod interface;

/// `tracing` subscriber setup.
pub mod logging;

/// Access point value types.
pub mod network;

/// Terse nmcli output helpers.
pub mod nmcli;

/// Single-network probe state machine.
pub mod probe;

/// Bounded-wait external process execution.
pub mod process;

/// Live network registry.
pub mod registry;

/// nmcli scan parsing and display.
pub mod scan;

/// Per-session append-only log.
pub mod session;

/// Dual-source status reconciliation.
pub mod status;

/// The wander loop.
pub mod wander;

pub use connectivity::{ConnectivityChecker, HttpConnectivityChecker};
pub use diagnostics::{DiagnosticRunner, ShellDiagnostics};
pub use driver::{Connection, ConnectionStatus, NmcliDriver, WifiDriver};
pub use error::{Result, WanderError};
pub use filter::{CompoundFilter, NetworkFilter};
pub use network::{Bssid, ObservedNetwork, ScanResult};
pub use probe::{ProbeEngine, ProbeReport, ProbeSettings};
pub use registry::{NetworkRegistry, ReconcileSummary};
pub use session::SessionLog;
pub use status::{StatusQuery, WpaCliStatus};
pub use wander::{CycleReport, WanderLoop, WanderSettings};
