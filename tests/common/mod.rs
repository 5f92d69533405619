//! Test doubles for the driver, the status tool, the connectivity check and
//! the diagnostics runner.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::{self, Write};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use wifi_wander::{
    Bssid, Connection, ConnectionStatus, ConnectivityChecker, DiagnosticRunner, ObservedNetwork,
    ScanResult, SessionLog, StatusQuery, WanderError, WifiDriver,
};

pub const IFACE: &str = "wlan-test";

/// What the fake radio is associated with.
pub type Radio = Rc<RefCell<Option<String>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectBehavior {
    Succeed,
    /// Connect succeeds but the driver then reports "not connected".
    SucceedThenDrop,
    Timeout,
    Fail,
}

pub struct FakeDriver {
    pub radio: Radio,
    pub scans: RefCell<VecDeque<Result<Vec<ScanResult>, WanderError>>>,
    pub connect: Cell<ConnectBehavior>,
    pub disconnect_fails: Cell<bool>,
    pub status_fails: Cell<bool>,
    /// Status queries fail once a connect has gone through.
    pub status_fails_after_connect: Cell<bool>,
    /// Saved profiles that exist before any connect.
    pub known_profiles: RefCell<Vec<String>>,
    joined: Cell<bool>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self {
            radio: Rc::new(RefCell::new(None)),
            scans: RefCell::new(VecDeque::new()),
            connect: Cell::new(ConnectBehavior::Succeed),
            disconnect_fails: Cell::new(false),
            status_fails: Cell::new(false),
            status_fails_after_connect: Cell::new(false),
            known_profiles: RefCell::new(Vec::new()),
            joined: Cell::new(false),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Queue the result of the next scan.
    pub fn push_scan(&self, results: Vec<ScanResult>) {
        self.scans.borrow_mut().push_back(Ok(results));
    }

    pub fn push_scan_error(&self, reason: &str) {
        self.scans
            .borrow_mut()
            .push_back(Err(WanderError::ScanFailed(reason.to_string())));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.calls.borrow().iter().any(|c| c.starts_with(prefix))
    }

    fn log(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl WifiDriver for FakeDriver {
    fn interface(&self) -> &str {
        IFACE
    }

    fn scan(&self) -> wifi_wander::Result<Vec<ScanResult>> {
        self.log("scan".to_string());
        self.scans
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn connect(&self, ssid: &str, passphrase: &str, timeout: Duration) -> wifi_wander::Result<Connection> {
        self.log(format!("connect {} pass={:?}", ssid, passphrase));
        match self.connect.get() {
            ConnectBehavior::Timeout => Err(WanderError::Timeout {
                operation: format!("connect to {:?}", ssid),
                timeout,
            }),
            ConnectBehavior::Fail => Err(WanderError::ConnectionFailed("no carrier".into())),
            ConnectBehavior::Succeed | ConnectBehavior::SucceedThenDrop => {
                *self.radio.borrow_mut() = Some(ssid.to_string());
                self.joined.set(true);
                Ok(Connection {
                    interface: IFACE.to_string(),
                    ssid: ssid.to_string(),
                    ipv4: Some("10.0.0.23/24".into()),
                    ipv6: None,
                    created_profile: !self.known_profiles.borrow().iter().any(|p| p == ssid),
                })
            }
        }
    }

    fn disconnect(&self, ssid: &str, _timeout: Duration) -> wifi_wander::Result<bool> {
        self.log(format!("disconnect {}", ssid));
        if self.disconnect_fails.get() {
            return Err(WanderError::DisconnectFailed("device busy".into()));
        }
        *self.radio.borrow_mut() = None;
        Ok(true)
    }

    fn current_status(&self) -> wifi_wander::Result<ConnectionStatus> {
        self.log("status".to_string());
        if self.status_fails.get() || (self.status_fails_after_connect.get() && self.joined.get()) {
            return Err(WanderError::ToolInvocation {
                program: "nmcli".to_string(),
                reason: "timed out".to_string(),
            });
        }
        let ssid = self.radio.borrow().clone();
        let dropped = self.connect.get() == ConnectBehavior::SucceedThenDrop;
        match ssid {
            Some(ssid) if !dropped => Ok(ConnectionStatus {
                interface: IFACE.to_string(),
                connected: true,
                state: "100 (connected)".into(),
                ssid: Some(ssid),
                ipv4: Some("10.0.0.23/24".into()),
                ipv6: None,
            }),
            _ => Ok(ConnectionStatus::disconnected(IFACE)),
        }
    }

    fn forget(&self, ssid: &str) -> wifi_wander::Result<()> {
        self.log(format!("forget {}", ssid));
        Ok(())
    }
}

/// Status-query double that mirrors the fake radio unless overridden.
pub struct FakeStatusQuery {
    radio: Radio,
    pub forced: RefCell<Option<Option<String>>>,
}

impl FakeStatusQuery {
    pub fn mirroring(driver: &FakeDriver) -> Self {
        Self {
            radio: driver.radio.clone(),
            forced: RefCell::new(None),
        }
    }

    /// Always answer `ssid` regardless of the radio.
    pub fn force(&self, ssid: Option<&str>) {
        *self.forced.borrow_mut() = Some(ssid.map(str::to_string));
    }
}

impl StatusQuery for FakeStatusQuery {
    fn connected_ssid(&self) -> wifi_wander::Result<Option<String>> {
        if let Some(forced) = self.forced.borrow().clone() {
            return Ok(forced);
        }
        Ok(self.radio.borrow().clone())
    }
}

pub struct FakeChecker {
    pub reachable: bool,
    pub checks: Cell<usize>,
}

impl FakeChecker {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable,
            checks: Cell::new(0),
        }
    }
}

impl ConnectivityChecker for FakeChecker {
    fn check(&self, _interface: &str) -> bool {
        self.checks.set(self.checks.get() + 1);
        self.reachable
    }
}

pub struct FakeDiagnostics {
    pub fail: bool,
    pub runs: Cell<usize>,
}

impl FakeDiagnostics {
    pub fn new() -> Self {
        Self {
            fail: false,
            runs: Cell::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            runs: Cell::new(0),
        }
    }

    fn answer(&self, program: &str, output: &str) -> wifi_wander::Result<String> {
        self.runs.set(self.runs.get() + 1);
        if self.fail {
            Err(WanderError::ToolInvocation {
                program: program.to_string(),
                reason: "No such file or directory".to_string(),
            })
        } else {
            Ok(output.to_string())
        }
    }
}

impl DiagnosticRunner for FakeDiagnostics {
    fn service_discovery(&self) -> wifi_wander::Result<String> {
        self.answer("avahi-browse", "+ wlan0 IPv4 printer _ipp._tcp local\n")
    }

    fn neighbor_table(&self) -> wifi_wander::Result<String> {
        self.answer("ip", "10.0.0.1 lladdr 02:00:00:00:00:01 REACHABLE\n")
    }
}

/// In-memory session sink that can be read back while the log is alive.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn session_log(&self) -> SessionLog {
        SessionLog::from_writer(self.clone(), false)
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn bssid(s: &str) -> Bssid {
    Bssid::parse(s).unwrap()
}

pub fn open_network(bssid_str: &str, ssid: &str, signal: i16) -> ScanResult {
    ScanResult {
        bssid: bssid(bssid_str),
        ssid: ssid.to_string(),
        key_mgmt: Vec::new(),
        frequency: 2437,
        signal,
        age: 0,
    }
}

pub fn protected_network(bssid_str: &str, ssid: &str, signal: i16) -> ScanResult {
    ScanResult {
        key_mgmt: vec!["WPA2".to_string()],
        ..open_network(bssid_str, ssid, signal)
    }
}

pub fn cafe() -> ScanResult {
    open_network("aa:bb:cc:dd:ee:ff", "CafeWifi", -60)
}

pub fn observed(result: ScanResult) -> ObservedNetwork {
    ObservedNetwork::first_observed(result, Utc::now())
}
