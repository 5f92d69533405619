//! WiFi network scanning module.
//!
//! Scanning uses NetworkManager's nmcli tool:
//!
//! 1. Triggers a rescan with `nmcli device wifi rescan`
//! 2. Waits briefly for the scan to complete (500ms)
//! 3. Lists every visible BSS with `nmcli -t ... device wifi list`
//! 4. Parses each terse line into a [`ScanResult`]
//!
//! One line is produced per BSSID, so several access points sharing an
//! SSID all show up.

use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Result, WanderError};
use crate::network::{Bssid, ObservedNetwork, ScanResult};
use crate::nmcli;

/// Scans for access points visible to `interface`.
///
/// # Commands Executed
/// ```bash
/// nmcli device wifi rescan ifname <interface>
/// nmcli -t -f BSSID,SSID,SECURITY,FREQ,SIGNAL device wifi list ifname <interface> --rescan no
/// ```
///
/// The rescan may fail when the interface is already scanning; the cached
/// results of the last scan are used in that case.
pub fn scan_networks(interface: &str) -> Result<Vec<ScanResult>> {
    if let Err(e) = nmcli::query(&["device", "wifi", "rescan", "ifname", interface]) {
        debug!("rescan on {} failed, using cached results: {}", interface, e);
    }

    thread::sleep(Duration::from_millis(500));

    let stdout = nmcli::query(&[
        "-t",
        "-f",
        "BSSID,SSID,SECURITY,FREQ,SIGNAL",
        "device",
        "wifi",
        "list",
        "ifname",
        interface,
        "--rescan",
        "no",
    ])
    .map_err(|e| WanderError::ScanFailed(e.to_string()))?;

    Ok(parse_scan_output(&stdout))
}

/// Parse `BSSID:SSID:SECURITY:FREQ:SIGNAL` lines; unparsable lines are skipped.
pub fn parse_scan_output(stdout: &str) -> Vec<ScanResult> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match parse_scan_line(line) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("skipping scan line {:?}: {}", line, e);
                None
            }
        })
        .collect()
}

fn parse_scan_line(line: &str) -> Result<ScanResult> {
    let fields = nmcli::split_terse(line);
    if fields.len() < 5 {
        return Err(WanderError::NmcliParse(format!(
            "expected 5 fields, got {}",
            fields.len()
        )));
    }

    let bssid = Bssid::parse(&fields[0])?;
    let key_mgmt = nmcli::non_empty(&fields[2])
        .map(|s| s.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    let frequency = fields[3]
        .split_whitespace()
        .next()
        .and_then(|f| f.parse::<u16>().ok())
        .ok_or_else(|| WanderError::NmcliParse(format!("bad frequency {:?}", fields[3])))?;
    let percent = fields[4]
        .trim()
        .parse::<u8>()
        .map_err(|_| WanderError::NmcliParse(format!("bad signal {:?}", fields[4])))?;

    Ok(ScanResult {
        bssid,
        ssid: fields[1].clone(),
        key_mgmt,
        frequency,
        signal: percent_to_dbm(percent),
        // nmcli has no per-BSS age; results come from a fresh rescan
        age: 0,
    })
}

/// Convert NetworkManager's 0-100 signal quality into dBm.
pub fn percent_to_dbm(percent: u8) -> i16 {
    i16::from(percent.min(100)) / 2 - 100
}

/// Displays networks in a table, strongest first as given.
///
/// # Output Format
/// ```text
/// SSID                             BSSID              FREQ  SIGNAL      SECURITY
/// ------------------------------------------------------------------------------
/// "CafeWifi"                       aa:bb:cc:dd:ee:ff  2437    -60 ███░  (open)
/// ```
pub fn display_networks(networks: &[&ObservedNetwork]) {
    if networks.is_empty() {
        println!("No networks found.");
        return;
    }

    println!(
        "{:<32} {:<18} {:>5} {:>6}      {}",
        "SSID", "BSSID", "FREQ", "SIGNAL", "SECURITY"
    );
    println!("{}", "-".repeat(78));

    for network in networks {
        let security = if network.is_unprotected() {
            "(open)".to_string()
        } else {
            network.key_mgmt().join(" ")
        };
        println!(
            "{:<32} {:<18} {:>5} {:>6} {}  {}",
            truncate_ssid(&format!("{:?}", network.ssid()), 32),
            network.bssid(),
            network.frequency(),
            network.latest_signal(),
            signal_to_bar(network.latest_signal()),
            security
        );
    }
}

/// Truncates to `max_len` characters, appending "..." when shortened.
fn truncate_ssid(ssid: &str, max_len: usize) -> String {
    if ssid.chars().count() > max_len {
        let head: String = ssid.chars().take(max_len - 3).collect();
        format!("{}...", head)
    } else {
        ssid.to_string()
    }
}

/// Four-segment bar for a dBm signal level.
fn signal_to_bar(dbm: i16) -> &'static str {
    match dbm {
        -55.. => "████",
        -65..=-56 => "███░",
        -75..=-66 => "██░░",
        -85..=-76 => "█░░░",
        _ => "░░░░",
    }
}
