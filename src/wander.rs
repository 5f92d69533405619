//! The wander loop: scan, reconcile, select, probe, repeat.
//!
//! Everything runs sequentially on the calling thread; the interface is
//! never shared between a scan and a probe. A failed scan skips the cycle,
//! a failed probe is counted, and only an inconsistent interface status
//! ends the session.

use std::thread;
use std::time::Duration;

use chrono::{Local, Utc};
use tracing::{error, info};

use crate::driver::WifiDriver;
use crate::error::Result;
use crate::filter::{self, NetworkFilter};
use crate::probe::ProbeEngine;
use crate::registry::{NetworkRegistry, ReconcileSummary};
use crate::session::SessionLog;

#[derive(Debug, Clone)]
pub struct WanderSettings {
    /// Pause before every scan cycle.
    pub scan_interval: Duration,
    /// Pause after each probe.
    pub probe_pause: Duration,
}

impl Default for WanderSettings {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(10),
            probe_pause: Duration::from_secs(1),
        }
    }
}

/// Counters for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub scan_failed: bool,
    pub reconcile: ReconcileSummary,
    pub in_range: usize,
    pub candidates: usize,
    pub probes_ok: usize,
    pub probes_failed: usize,
}

pub struct WanderLoop<'a> {
    driver: &'a dyn WifiDriver,
    probe: ProbeEngine<'a>,
    filter: Box<dyn NetworkFilter>,
    registry: NetworkRegistry,
    settings: WanderSettings,
    cycles: u64,
}

impl<'a> WanderLoop<'a> {
    pub fn new(
        driver: &'a dyn WifiDriver,
        probe: ProbeEngine<'a>,
        filter: Box<dyn NetworkFilter>,
        settings: WanderSettings,
    ) -> Self {
        Self {
            driver,
            probe,
            filter,
            registry: NetworkRegistry::new(),
            settings,
            cycles: 0,
        }
    }

    /// Networks currently tracked.
    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run cycles until `max_cycles` is reached (forever when `None`) or a
    /// fatal error stops the session.
    pub fn run(&mut self, log: &mut SessionLog, max_cycles: Option<u64>) -> Result<()> {
        loop {
            if max_cycles.is_some_and(|max| self.cycles >= max) {
                return Ok(());
            }
            thread::sleep(self.settings.scan_interval);

            if let Err(e) = self.cycle(log) {
                error!("stopping wander session: {}", e);
                return Err(e);
            }
        }
    }

    /// One scan/reconcile/select/probe pass.
    pub fn cycle(&mut self, log: &mut SessionLog) -> Result<CycleReport> {
        self.cycles += 1;
        let mut report = CycleReport::default();
        let now = Utc::now();

        info!("starting scan {}", self.cycles);
        log.line(format!(">>> starting scan - {}", now.with_timezone(&Local)));

        let observed = match self.driver.scan() {
            Ok(observed) => observed,
            Err(e) => {
                log.line(format!("Error scanning network: {}", e));
                log.flush();
                report.scan_failed = true;
                return Ok(report);
            }
        };

        report.reconcile = self.registry.reconcile(observed, now, log);
        report.in_range = self.registry.len();

        let candidates = filter::select(&self.registry, &*self.filter);
        report.candidates = candidates.len();
        if candidates.is_empty() {
            log.line(format!(
                "nothing interesting found, {} networks filtered",
                self.registry.len()
            ));
        } else {
            log.line(format!(">   found {} interesting networks", candidates.len()));
            for network in &candidates {
                log.line(format!("* {} signal: {}", network, network.latest_signal()));
            }
        }

        for (ix, candidate) in candidates.iter().enumerate() {
            log.line(format!(">   probing network:{} [n={}]", candidate, ix));
            match self.probe.probe(candidate, log) {
                Ok(probe) => {
                    report.probes_ok += 1;
                    log.line(format!(
                        ">   probe ok: {:?} reachable={} in {:?}",
                        probe.ssid, probe.reachable, probe.elapsed
                    ));
                }
                Err(e) if e.is_fatal() => {
                    log.line(format!(">>> aborting session: {}", e));
                    log.flush();
                    return Err(e);
                }
                Err(e) => {
                    report.probes_failed += 1;
                    log.line(format!(">   probe failed: {}", e));
                }
            }
            thread::sleep(self.settings.probe_pause);
        }
        if !candidates.is_empty() {
            log.line(format!(
                ">>> {} probes successful, {} errors",
                report.probes_ok, report.probes_failed
            ));
        }

        log.line(format!(">>> currently {} networks in range", report.in_range));
        log.line(format!(
            ">>> {} updated / {} new / {} removed",
            report.reconcile.update_count, report.reconcile.new_count, report.reconcile.removed_count
        ));
        log.line(format!(">>> completed scan - {}", Local::now()));
        log.flush();

        Ok(report)
    }
}
