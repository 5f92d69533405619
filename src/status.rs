//! Dual-source connection status.
//!
//! The driver's own status is cross-checked against `wpa_cli`. When the two
//! disagree the true state of the interface is unknown, which is reported
//! as [`WanderError::Inconsistent`] so callers stop instead of guessing.

use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::driver::{ConnectionStatus, WifiDriver};
use crate::error::{Result, WanderError};
use crate::process;

lazy_static! {
    static ref SSID_LINE: Regex = Regex::new(r"(?m)^ssid=(.+)$").expect("valid ssid regex");
}

/// Second, independent source of "which network am I on".
pub trait StatusQuery {
    /// SSID the interface is associated with, `None` when disconnected.
    fn connected_ssid(&self) -> Result<Option<String>>;
}

/// [`StatusQuery`] backed by `wpa_cli -i <iface> status`.
#[derive(Debug, Clone)]
pub struct WpaCliStatus {
    interface: String,
    timeout: Duration,
}

impl WpaCliStatus {
    pub fn new(interface: impl Into<String>, timeout: Duration) -> Self {
        Self {
            interface: interface.into(),
            timeout,
        }
    }
}

impl StatusQuery for WpaCliStatus {
    fn connected_ssid(&self) -> Result<Option<String>> {
        let output = process::run("wpa_cli", &["-i", self.interface.as_str(), "status"], self.timeout)?;
        if !output.success() {
            return Err(WanderError::tool("wpa_cli", output.error_message()));
        }
        Ok(parse_wpa_cli_ssid(&output.stdout))
    }
}

/// Extract the `ssid=<value>` line from `wpa_cli status` output.
pub fn parse_wpa_cli_ssid(stdout: &str) -> Option<String> {
    SSID_LINE
        .captures(stdout)
        .map(|caps| unescape_ssid(caps[1].trim_end_matches('\r')))
}

/// Undo wpa_supplicant's printf-style SSID escaping (`\xNN`, `\\`, `\"`,
/// `\n`, `\r`, `\t`, `\e`). Unknown escapes are kept verbatim.
pub fn unescape_ssid(escaped: &str) -> String {
    let raw = escaped.as_bytes();
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        if raw[i] != b'\\' || i + 1 == raw.len() {
            out.push(raw[i]);
            i += 1;
            continue;
        }
        let decoded = match raw[i + 1] {
            b'\\' => Some(b'\\'),
            b'"' => Some(b'"'),
            b'n' => Some(b'\n'),
            b'r' => Some(b'\r'),
            b't' => Some(b'\t'),
            b'e' => Some(0x1b),
            _ => None,
        };
        if let Some(byte) = decoded {
            out.push(byte);
            i += 2;
            continue;
        }
        let hex = raw
            .get(i + 2..i + 4)
            .filter(|_| raw[i + 1] == b'x')
            .and_then(|h| std::str::from_utf8(h).ok())
            .and_then(|h| u8::from_str_radix(h, 16).ok());
        match hex {
            Some(byte) => {
                out.push(byte);
                i += 4;
            }
            None => {
                out.push(raw[i]);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Combine both sources.
///
/// Returns the connected SSID, `None` when both agree the interface is
/// disconnected, or [`WanderError::Inconsistent`] on any disagreement.
pub fn reconcile_status(
    primary: &ConnectionStatus,
    secondary: Option<&str>,
) -> Result<Option<String>> {
    match (primary.connected, secondary) {
        (false, None) => Ok(None),
        (true, None) => Err(WanderError::Inconsistent {
            primary: describe(primary),
            secondary: "disconnected".to_string(),
        }),
        (false, Some(ssid)) => Err(WanderError::Inconsistent {
            primary: "disconnected".to_string(),
            secondary: ssid.to_string(),
        }),
        (true, Some(ssid)) if primary.ssid.as_deref() == Some(ssid) => Ok(Some(ssid.to_string())),
        (true, Some(ssid)) => Err(WanderError::Inconsistent {
            primary: describe(primary),
            secondary: ssid.to_string(),
        }),
    }
}

fn describe(status: &ConnectionStatus) -> String {
    match &status.ssid {
        Some(ssid) => ssid.clone(),
        None => format!("connected ({})", status.state),
    }
}

/// Query both sources and reconcile them.
///
/// Query failures on either side are returned as-is and are not fatal;
/// only a disagreement is.
pub fn verified_status(
    driver: &dyn WifiDriver,
    query: &dyn StatusQuery,
) -> Result<(ConnectionStatus, Option<String>)> {
    let primary = driver.current_status()?;
    let secondary = query.connected_ssid()?;
    debug!(
        "status: driver connected={} ssid={:?}, wpa_cli ssid={:?}",
        primary.connected, primary.ssid, secondary
    );
    let ssid = reconcile_status(&primary, secondary.as_deref())?;
    Ok((primary, ssid))
}
