//! End-to-end probe of a single candidate network.
//!
//! A probe takes the interface for itself, joins the target, checks real
//! internet reachability, records what is on the local segment and leaves
//! again:
//!
//! 1. verify the initial status against both sources
//! 2. disconnect if already connected to anything
//! 3. connect with an empty credential
//! 4. confirm the driver now reports a connection
//! 5. connectivity check (recorded, never fatal)
//! 6. diagnostics (tool failures logged, never fatal)
//! 7. disconnect
//!
//! A failed connect ends the probe immediately. A source disagreement in
//! step 1 is [`WanderError::Inconsistent`], which callers treat as the end
//! of the whole session.

use std::time::{Duration, Instant};

use tracing::warn;

use crate::connectivity::ConnectivityChecker;
use crate::diagnostics::DiagnosticRunner;
use crate::driver::{ConnectionStatus, WifiDriver};
use crate::error::{Result, WanderError};
use crate::network::{Bssid, ObservedNetwork};
use crate::session::SessionLog;
use crate::status::{self, StatusQuery};

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub connect_timeout: Duration,
    pub disconnect_timeout: Duration,
    /// Delete the connection profile a probe created for its target.
    pub forget_probed: bool,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(60),
            disconnect_timeout: Duration::from_secs(10),
            forget_probed: true,
        }
    }
}

/// Everything learned from one successful probe.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub ssid: String,
    pub bssid: Bssid,
    pub interface: String,
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
    pub connect_time: Duration,
    pub reachable: bool,
    /// Bytes of service-discovery output, `None` if the tool failed.
    pub services_bytes: Option<usize>,
    /// Bytes of neighbor-table output, `None` if the tool failed.
    pub neighbors_bytes: Option<usize>,
    pub elapsed: Duration,
}

pub struct ProbeEngine<'a> {
    driver: &'a dyn WifiDriver,
    status: &'a dyn StatusQuery,
    checker: &'a dyn ConnectivityChecker,
    diagnostics: &'a dyn DiagnosticRunner,
    settings: ProbeSettings,
}

impl<'a> ProbeEngine<'a> {
    pub fn new(
        driver: &'a dyn WifiDriver,
        status: &'a dyn StatusQuery,
        checker: &'a dyn ConnectivityChecker,
        diagnostics: &'a dyn DiagnosticRunner,
        settings: ProbeSettings,
    ) -> Self {
        Self {
            driver,
            status,
            checker,
            diagnostics,
            settings,
        }
    }

    /// Probe `target`, leaving the interface disconnected on success.
    pub fn probe(&self, target: &ObservedNetwork, log: &mut SessionLog) -> Result<ProbeReport> {
        if !target.is_unprotected() {
            log.line(format!("refusing to probe protected network {}", target));
            return Err(WanderError::ProtectedNetwork(target.to_string()));
        }

        let (_, current) = self.verified_status(log)?;
        if let Some(ssid) = current {
            log.line(format!("currently connected to:{:?}, must disconnect first", ssid));
            self.disconnect(&ssid, false, log).inspect_err(|e| {
                log.line(format!("couldn't disconnect [0] {}", e));
            })?;
        }

        let start = Instant::now();
        let connection = self
            .driver
            .connect(target.ssid(), "", self.settings.connect_timeout)
            .inspect_err(|e| log.line(format!("couldn't connect: {}", e)))?;
        let connect_time = start.elapsed();
        log.line(format!(
            "Connected {} {:?} ipv4={} ipv6={}",
            connection.interface,
            connection.ssid,
            connection.ipv4.as_deref().unwrap_or("-"),
            connection.ipv6.as_deref().unwrap_or("-"),
        ));
        log.line(format!("Connected in {:?}", connect_time));
        // a profile the user saved before the probe is never deleted
        let forget = self.settings.forget_probed && connection.created_profile;

        let confirmed = match self.driver.current_status() {
            Ok(status) => status,
            Err(e) => {
                log.line(format!("couldn't confirm connection: {}", e));
                // the driver last claimed a connection, so try to leave it
                if let Err(cleanup) = self.disconnect(target.ssid(), forget, log) {
                    warn!("cleanup disconnect failed: {}", cleanup);
                }
                return Err(e);
            }
        };
        if !confirmed.connected {
            log.line("connection status mismatch - not really connected [0]");
            return Err(WanderError::ConnectUnconfirmed(target.ssid().to_string()));
        }

        log.line("Checking for network connectivity....");
        let reachable = self.checker.check(self.driver.interface());
        log.line(format!("connectivity={}", reachable));

        let services_bytes = self.diagnostic(log, "avahi-browse", || {
            self.diagnostics.service_discovery()
        });
        let neighbors_bytes = self.diagnostic(log, "ip neighbors", || {
            self.diagnostics.neighbor_table()
        });

        log.line(format!(
            "probed network:{:?} in {:?}; disconnecting",
            target.ssid(),
            start.elapsed()
        ));
        let connected_ssid = confirmed.ssid.as_deref().unwrap_or(target.ssid());
        self.disconnect(connected_ssid, forget, log)
            .inspect_err(|e| log.line(format!("couldn't disconnect [1] {}", e)))?;

        Ok(ProbeReport {
            ssid: target.ssid().to_string(),
            bssid: target.bssid(),
            interface: connection.interface,
            ipv4: connection.ipv4,
            ipv6: connection.ipv6,
            connect_time,
            reachable,
            services_bytes,
            neighbors_bytes,
            elapsed: start.elapsed(),
        })
    }

    /// Dual-source status check, logging any disagreement.
    pub fn verified_status(
        &self,
        log: &mut SessionLog,
    ) -> Result<(ConnectionStatus, Option<String>)> {
        status::verified_status(self.driver, self.status).inspect_err(|e| match e {
            WanderError::Inconsistent { primary, secondary } => {
                log.line(format!("status disagree! s1={} s2={}", primary, secondary))
            }
            other => log.line(format!("couldn't get network status: {}", other)),
        })
    }

    /// Leave `ssid`; `forget` also drops its saved profile afterwards.
    fn disconnect(&self, ssid: &str, forget: bool, log: &mut SessionLog) -> Result<()> {
        log.line(format!("disconnecting from {:?}", ssid));
        let start = Instant::now();
        let ok = self.driver.disconnect(ssid, self.settings.disconnect_timeout)?;
        log.line(format!("disconnect success={} in {:?}", ok, start.elapsed()));
        if !ok {
            return Err(WanderError::DisconnectFailed(format!(
                "driver did not confirm leaving {:?}",
                ssid
            )));
        }

        if forget {
            if let Err(e) = self.driver.forget(ssid) {
                warn!("couldn't forget profile {:?}: {}", ssid, e);
            }
        }
        Ok(())
    }

    fn diagnostic(
        &self,
        log: &mut SessionLog,
        name: &str,
        run: impl FnOnce() -> Result<String>,
    ) -> Option<usize> {
        match run() {
            Ok(output) => {
                log.line(format!("*** {} [{} bytes] ****", name, output.len()));
                if !output.is_empty() {
                    log.line(&output);
                }
                Some(output.len())
            }
            Err(e) => {
                log.line(format!("error executing {}: {}", name, e));
                None
            }
        }
    }
}
