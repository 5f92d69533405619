//! WiFi connection management module.
//!
//! Connect, disconnect and status queries through NetworkManager's `nmcli`.
//! Connect and disconnect pass nmcli's own `--wait` deadline and map its
//! timeout exit status to [`WanderError::Timeout`].
//!
//! # Requirements
//!
//! - NetworkManager must be installed and running
//! - The `nmcli` command must be available in PATH
//! - User must have permission to manage network connections

use std::time::Duration;

use tracing::debug;

use crate::driver::ConnectionStatus;
use crate::error::{Result, WanderError};
use crate::nmcli;

/// Extra time granted to the nmcli process beyond its own `--wait`.
const PROCESS_GRACE: Duration = Duration::from_secs(5);

/// Connects `interface` to `ssid`.
///
/// # Command Executed
/// ```bash
/// nmcli -w <secs> device wifi connect <ssid> [password <password>] ifname <interface>
/// ```
///
/// An empty `password` joins an open network.
pub fn connect(interface: &str, ssid: &str, password: &str, timeout: Duration) -> Result<()> {
    let wait = wait_secs(timeout);
    let mut args = vec!["-w", wait.as_str(), "device", "wifi", "connect", ssid];
    if !password.is_empty() {
        args.extend(["password", password]);
    }
    args.extend(["ifname", interface]);

    let output = nmcli::exec(&args, timeout + PROCESS_GRACE)?;
    if output.status.code() == Some(nmcli::EXIT_TIMEOUT) {
        return Err(WanderError::Timeout {
            operation: format!("connect to {:?}", ssid),
            timeout,
        });
    }
    if !output.success() {
        return Err(WanderError::ConnectionFailed(output.error_message()));
    }

    Ok(())
}

/// Disconnects `interface` from its current network.
///
/// # Command Executed
/// ```bash
/// nmcli -w <secs> device disconnect <interface>
/// ```
pub fn disconnect(interface: &str, timeout: Duration) -> Result<()> {
    let wait = wait_secs(timeout);
    let output = nmcli::exec(
        &["-w", wait.as_str(), "device", "disconnect", interface],
        timeout + PROCESS_GRACE,
    )?;

    if output.status.code() == Some(nmcli::EXIT_TIMEOUT) {
        return Err(WanderError::Timeout {
            operation: format!("disconnect {}", interface),
            timeout,
        });
    }
    if !output.success() {
        return Err(WanderError::DisconnectFailed(output.error_message()));
    }

    Ok(())
}

/// Retrieves the connection status of `interface`.
///
/// # Commands Executed
/// ```bash
/// nmcli -t -f GENERAL.STATE,IP4.ADDRESS,IP6.ADDRESS device show <interface>
/// nmcli -t -f IN-USE,SSID device wifi list ifname <interface> --rescan no
/// ```
///
/// The SSID comes from the in-use access point rather than the connection
/// profile name, which users may have renamed.
pub fn status(interface: &str) -> Result<ConnectionStatus> {
    let show = nmcli::query(&[
        "-t",
        "-f",
        "GENERAL.STATE,IP4.ADDRESS,IP6.ADDRESS",
        "device",
        "show",
        interface,
    ])?;

    let mut status = parse_device_show(interface, &show);
    if status.connected {
        let list = nmcli::query(&[
            "-t", "-f", "IN-USE,SSID", "device", "wifi", "list", "ifname", interface, "--rescan",
            "no",
        ])?;
        status.ssid = parse_in_use_ssid(&list);
    }

    Ok(status)
}

/// Parse `device show` terse output into a status without SSID.
pub fn parse_device_show(interface: &str, stdout: &str) -> ConnectionStatus {
    let mut status = ConnectionStatus {
        interface: interface.to_string(),
        state: "unknown".to_string(),
        ..ConnectionStatus::default()
    };

    for line in stdout.lines() {
        let Some((key, value)) = nmcli::split_key_value(line) else {
            continue;
        };

        match key.as_str() {
            // e.g. "100 (connected)", "30 (disconnected)"
            "GENERAL.STATE" => {
                status.connected = value.split_whitespace().next() == Some("100");
                status.state = value;
            }
            "IP4.ADDRESS[1]" => status.ipv4 = nmcli::non_empty(&value),
            "IP6.ADDRESS[1]" => status.ipv6 = nmcli::non_empty(&value),
            _ => {}
        }
    }

    status
}

/// SSID of the line marked in use (`*`) in a `device wifi list` listing.
pub fn parse_in_use_ssid(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        let fields = nmcli::split_terse(line);
        match fields.as_slice() {
            [in_use, ssid, ..] if in_use.trim() == "*" => Some(ssid.clone()),
            _ => None,
        }
    })
}

/// Displays connection status information.
///
/// # Output Format
/// ```text
/// Interface: wlan0
/// State:     100 (connected)
/// Connected: "CafeWifi"
/// IPv4:      192.168.4.2/24
/// ```
pub fn display_status(status: &ConnectionStatus) {
    println!("Interface: {}", status.interface);
    println!("State:     {}", status.state);
    match (&status.ssid, status.connected) {
        (Some(ssid), true) => println!("Connected: {:?}", ssid),
        (None, true) => println!("Connected: (unknown SSID)"),
        (_, false) => println!("Connected: (none)"),
    }
    if let Some(ref ip) = status.ipv4 {
        println!("IPv4:      {}", ip);
    }
    if let Some(ref ip) = status.ipv6 {
        println!("IPv6:      {}", ip);
    }
}

/// Deletes the saved connection profile named `name`.
///
/// # Command Executed
/// ```bash
/// nmcli connection delete id <name>
/// ```
pub fn delete_connection(name: &str) -> Result<()> {
    nmcli::query(&["connection", "delete", "id", name])?;
    debug!("deleted connection profile {:?}", name);
    Ok(())
}

/// Whether a saved connection profile named `name` exists.
///
/// # Command Executed
/// ```bash
/// nmcli -t -f NAME connection show
/// ```
pub fn has_profile(name: &str) -> Result<bool> {
    let stdout = nmcli::query(&["-t", "-f", "NAME", "connection", "show"])?;
    Ok(profile_listed(&stdout, name))
}

fn profile_listed(stdout: &str, name: &str) -> bool {
    stdout
        .lines()
        .any(|line| nmcli::split_terse(line).first().is_some_and(|n| n == name))
}

fn wait_secs(timeout: Duration) -> String {
    timeout.as_secs().max(1).to_string()
}
