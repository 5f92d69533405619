//! Internet reachability and captive-portal detection.
//!
//! The check fetches a well-known endpoint that answers `204 No Content`
//! on an open internet connection. Anything else (a redirect to a login
//! page, a `200` with an HTML body, a network error) counts as "not
//! reachable". Portal hints found in the response are logged only.

use std::io::Read;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::WanderError;

/// Android's captive-portal check endpoint.
pub const DEFAULT_CHECK_URL: &str = "http://connectivitycheck.gstatic.com/generate_204";

/// Largest response body kept for logging.
const MAX_BODY_BYTES: u64 = 64 * 1024;

pub trait ConnectivityChecker {
    /// Whether general internet access works through `interface`.
    fn check(&self, interface: &str) -> bool;
}

/// What one reachability request observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityReport {
    pub status: u16,
    pub reachable: bool,
    /// `Location` header of a redirect, the usual portal signature.
    pub location: Option<String>,
    /// A `Host` response header, which some portals inject.
    pub host: Option<String>,
    pub body: String,
}

impl ConnectivityReport {
    /// Classify a response by its status code and portal-ish signals.
    pub fn assess(status: u16, location: Option<String>, host: Option<String>, body: String) -> Self {
        Self {
            status,
            reachable: status == 204,
            location,
            host,
            body,
        }
    }

    /// Human-readable reasons to suspect a captive portal.
    pub fn portal_hints(&self) -> Vec<String> {
        let mut hints = Vec::new();
        if self.reachable {
            return hints;
        }
        if (300..400).contains(&self.status) {
            match &self.location {
                Some(location) => hints.push(format!("redirect to {}", location)),
                None => hints.push(format!("redirect status {} without location", self.status)),
            }
        }
        if let Some(host) = &self.host {
            hints.push(format!("host header {}", host));
        }
        if !self.body.is_empty() {
            hints.push(format!("{} byte body instead of empty 204", self.body.len()));
        }
        hints
    }
}

/// [`ConnectivityChecker`] using a blocking HTTP GET.
#[derive(Debug)]
pub struct HttpConnectivityChecker {
    agent: ureq::Agent,
    url: String,
}

impl HttpConnectivityChecker {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        // redirects stay visible so portal logins can be reported
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .redirects(0)
            .build();
        Self {
            agent,
            url: url.into(),
        }
    }

    /// Perform the request and describe the response.
    pub fn fetch(&self) -> Result<ConnectivityReport, WanderError> {
        let response = match self.agent.get(&self.url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(e) => return Err(WanderError::ConnectivityCheck(e.to_string())),
        };

        let status = response.status();
        let location = response.header("location").map(str::to_string);
        let host = response.header("host").map(str::to_string);

        let mut body = String::new();
        response
            .into_reader()
            .take(MAX_BODY_BYTES)
            .read_to_string(&mut body)
            .map_err(|e| WanderError::ConnectivityCheck(e.to_string()))?;

        Ok(ConnectivityReport::assess(status, location, host, body))
    }
}

impl ConnectivityChecker for HttpConnectivityChecker {
    fn check(&self, interface: &str) -> bool {
        let report = match self.fetch() {
            Ok(report) => report,
            Err(e) => {
                warn!("conn check on {} failed: {}", interface, e);
                return false;
            }
        };

        info!("conn check status={} body_bytes={}", report.status, report.body.len());
        if !report.reachable {
            for hint in report.portal_hints() {
                info!("possible captive portal: {}", hint);
            }
            if !report.body.is_empty() {
                info!("conn check body:\n{}", report.body);
            }
        }
        report.reachable
    }
}
