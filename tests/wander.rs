mod common;

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use common::*;
use wifi_wander::filter::default_filter;
use wifi_wander::{
    ConnectivityChecker, DiagnosticRunner, HttpConnectivityChecker, ProbeEngine, ProbeSettings,
    ReconcileSummary, StatusQuery, WanderLoop, WanderSettings, WifiDriver,
};

fn wander<'a>(
    driver: &'a dyn WifiDriver,
    query: &'a dyn StatusQuery,
    checker: &'a dyn ConnectivityChecker,
    diagnostics: &'a dyn DiagnosticRunner,
) -> WanderLoop<'a> {
    let probe = ProbeEngine::new(driver, query, checker, diagnostics, ProbeSettings::default());
    WanderLoop::new(
        driver,
        probe,
        Box::new(default_filter(&[])),
        WanderSettings {
            scan_interval: Duration::ZERO,
            probe_pause: Duration::ZERO,
        },
    )
}

/// Answer one request with 204 No Content, like a connectivity check endpoint.
fn serve_204() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            let _ = stream.write_all(
                b"HTTP/1.1 204 No Content\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
        }
    });
    format!("http://{}/generate_204", addr)
}

#[test]
fn cafe_is_found_probed_and_recorded() {
    let driver = FakeDriver::new();
    driver.push_scan(vec![cafe()]);
    driver.push_scan(vec![]);
    let query = FakeStatusQuery::mirroring(&driver);
    let checker = HttpConnectivityChecker::new(serve_204(), Duration::from_secs(5));
    let diagnostics = FakeDiagnostics::new();
    let mut wander = wander(&driver, &query, &checker, &diagnostics);

    let buf = SharedBuf::default();
    let mut log = buf.session_log();

    let first = wander.cycle(&mut log).unwrap();
    assert_eq!(
        first.reconcile,
        ReconcileSummary {
            new_count: 1,
            update_count: 0,
            removed_count: 0
        }
    );
    assert_eq!(first.candidates, 1);
    assert_eq!(first.probes_ok, 1);
    assert_eq!(first.probes_failed, 0);
    assert!(buf.contents().contains("connectivity=true"));
    assert!(buf.contents().contains(">>> 0 updated / 1 new / 0 removed"));

    let second = wander.cycle(&mut log).unwrap();
    assert_eq!(
        second.reconcile,
        ReconcileSummary {
            new_count: 0,
            update_count: 0,
            removed_count: 1
        }
    );
    assert_eq!(second.candidates, 0);
    assert!(wander.registry().is_empty());

    let text = buf.contents();
    assert!(text.contains("> recording seen network"));
    assert!(text.contains("\"ssid\": \"CafeWifi\""));
    assert!(text.contains(">>> 0 updated / 0 new / 1 removed"));
    assert_eq!(wander.cycles(), 2);
}

#[test]
fn record_keeps_every_signal_sample() {
    let driver = FakeDriver::new();
    driver.push_scan(vec![cafe()]);
    driver.push_scan(vec![open_network("aa:bb:cc:dd:ee:ff", "CafeWifi", -55)]);
    driver.push_scan(vec![]);
    let query = FakeStatusQuery::mirroring(&driver);
    let checker = FakeChecker::new(true);
    let diagnostics = FakeDiagnostics::new();
    let mut wander = wander(&driver, &query, &checker, &diagnostics);

    let buf = SharedBuf::default();
    let mut log = buf.session_log();
    wander.cycle(&mut log).unwrap();
    let second = wander.cycle(&mut log).unwrap();
    assert_eq!(second.reconcile.update_count, 1);

    let tracked = wander.registry().get(&bssid("aa:bb:cc:dd:ee:ff")).unwrap();
    assert_eq!(tracked.signal_history(), &[-60, -55]);
    assert_eq!(tracked.age_history().len(), 2);

    wander.cycle(&mut log).unwrap();
    let text = buf.contents();
    let record = text
        .split("> recording seen network\n")
        .nth(1)
        .expect("network record in session log");
    assert!(record.contains("-60"));
    assert!(record.contains("-55"));
    assert!(record.contains("\"last\": \""));
}

#[test]
fn failed_connect_is_counted_and_session_continues() {
    let driver = FakeDriver::new();
    driver.connect.set(ConnectBehavior::Timeout);
    driver.push_scan(vec![cafe()]);
    driver.push_scan(vec![cafe()]);
    let query = FakeStatusQuery::mirroring(&driver);
    let checker = FakeChecker::new(true);
    let diagnostics = FakeDiagnostics::new();
    let mut wander = wander(&driver, &query, &checker, &diagnostics);

    let buf = SharedBuf::default();
    let mut log = buf.session_log();
    let report = wander.cycle(&mut log).unwrap();

    assert_eq!(report.probes_ok, 0);
    assert_eq!(report.probes_failed, 1);
    assert!(!driver.called("disconnect"));
    assert_eq!(checker.checks.get(), 0);
    assert_eq!(diagnostics.runs.get(), 0);
    assert!(buf.contents().contains(">>> 0 probes successful, 1 errors"));

    let next = wander.cycle(&mut log).unwrap();
    assert_eq!(next.reconcile.update_count, 1);
    assert_eq!(next.probes_failed, 1);
}

#[test]
fn inconsistent_status_ends_the_session() {
    let driver = FakeDriver::new();
    driver.push_scan(vec![cafe()]);
    driver.push_scan(vec![cafe()]);
    let query = FakeStatusQuery::mirroring(&driver);
    query.force(Some("SomewhereElse"));
    let checker = FakeChecker::new(true);
    let diagnostics = FakeDiagnostics::new();
    let mut wander = wander(&driver, &query, &checker, &diagnostics);

    let buf = SharedBuf::default();
    let mut log = buf.session_log();
    let err = wander.run(&mut log, Some(5)).unwrap_err();

    assert!(err.is_fatal());
    assert_eq!(wander.cycles(), 1);
    assert!(!driver.called("connect"));
    let text = buf.contents();
    assert!(text.contains("status disagree!"));
    assert!(text.contains(">>> aborting session"));
}

#[test]
fn failed_scan_skips_the_cycle() {
    let driver = FakeDriver::new();
    driver.push_scan(vec![cafe()]);
    driver.push_scan_error("device not ready");
    let query = FakeStatusQuery::mirroring(&driver);
    let checker = FakeChecker::new(true);
    let diagnostics = FakeDiagnostics::new();
    let mut wander = wander(&driver, &query, &checker, &diagnostics);

    let buf = SharedBuf::default();
    let mut log = buf.session_log();
    wander.cycle(&mut log).unwrap();
    let report = wander.cycle(&mut log).unwrap();

    assert!(report.scan_failed);
    assert_eq!(report.reconcile, ReconcileSummary::default());
    // the registry is untouched, nothing is finalized
    assert_eq!(wander.registry().len(), 1);
    assert!(!buf.contents().contains("> recording seen network"));
    assert!(buf.contents().contains("Error scanning network: Scan failed: device not ready"));
}

#[test]
fn only_open_networks_are_probed_strongest_first() {
    let driver = FakeDriver::new();
    driver.push_scan(vec![
        open_network("02:00:00:00:00:01", "Library", -75),
        protected_network("02:00:00:00:00:02", "HomeNet", -30),
        open_network("02:00:00:00:00:03", "Airport", -50),
    ]);
    let query = FakeStatusQuery::mirroring(&driver);
    let checker = FakeChecker::new(true);
    let diagnostics = FakeDiagnostics::new();
    let mut wander = wander(&driver, &query, &checker, &diagnostics);

    let report = wander.cycle(&mut SharedBuf::default().session_log()).unwrap();

    assert_eq!(report.in_range, 3);
    assert_eq!(report.candidates, 2);
    assert_eq!(report.probes_ok, 2);
    let connects: Vec<String> = driver
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("connect"))
        .collect();
    assert_eq!(connects, vec!["connect Airport pass=\"\"", "connect Library pass=\"\""]);
}

#[test]
fn run_stops_after_requested_cycles() {
    let driver = FakeDriver::new();
    let query = FakeStatusQuery::mirroring(&driver);
    let checker = FakeChecker::new(true);
    let diagnostics = FakeDiagnostics::new();
    let mut wander = wander(&driver, &query, &checker, &diagnostics);

    let buf = SharedBuf::default();
    wander.run(&mut buf.session_log(), Some(2)).unwrap();

    assert_eq!(wander.cycles(), 2);
    assert_eq!(driver.calls(), vec!["scan", "scan"]);
    assert_eq!(buf.contents().matches(">>> starting scan").count(), 2);
    assert!(buf.contents().contains("nothing interesting found, 0 networks filtered"));
}
