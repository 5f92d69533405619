//! Value types for access points: the raw per-scan [`ScanResult`] and the
//! tracked [`ObservedNetwork`] with its signal history.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::error::WanderError;

/// A BSSID wrapping the 6-byte MAC address of an access point.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Bssid(pub [u8; 6]);

impl Bssid {
    /// Parse a colon-separated hex string such as `"aa:bb:cc:dd:ee:ff"`.
    pub fn parse(s: &str) -> Result<Self, WanderError> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(WanderError::InvalidBssid(s.to_string()));
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            bytes[i] = u8::from_str_radix(part, 16)
                .map_err(|_| WanderError::InvalidBssid(s.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

impl FromStr for Bssid {
    type Err = WanderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Bssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl fmt::Debug for Bssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bssid({self})")
    }
}

impl Serialize for Bssid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One access point as reported by a single scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    pub bssid: Bssid,
    /// May be empty (hidden network) or contain arbitrary characters.
    pub ssid: String,
    /// Key-management schemes; empty means an open network.
    pub key_mgmt: Vec<String>,
    /// Frequency in MHz.
    pub frequency: u16,
    /// Signal strength in dBm (negative, closer to zero is stronger).
    pub signal: i16,
    /// Seconds since the access point was last heard.
    pub age: u32,
}

impl ScanResult {
    pub fn is_unprotected(&self) -> bool {
        self.key_mgmt.is_empty()
    }
}

/// An access point tracked across scan cycles.
///
/// The signal and age histories hold one sample per cycle in which the
/// network was observed. They only ever grow, always have the same length
/// and are never empty.
#[derive(Debug, Clone, Serialize)]
pub struct ObservedNetwork {
    first: DateTime<Utc>,
    last: Option<DateTime<Utc>>,
    bssid: Bssid,
    ssid: String,
    key_mgmt: Vec<String>,
    frequency: u16,
    signal_history: Vec<i16>,
    age_history: Vec<u32>,
}

impl ObservedNetwork {
    /// Start tracking a network seen for the first time at `now`.
    pub fn first_observed(result: ScanResult, now: DateTime<Utc>) -> Self {
        Self {
            first: now,
            last: None,
            bssid: result.bssid,
            ssid: result.ssid,
            key_mgmt: result.key_mgmt,
            frequency: result.frequency,
            signal_history: vec![result.signal],
            age_history: vec![result.age],
        }
    }

    /// Append the samples of a later observation of the same access point.
    pub(crate) fn record(&mut self, result: &ScanResult) {
        debug_assert_eq!(self.bssid, result.bssid);
        self.signal_history.push(result.signal);
        self.age_history.push(result.age);
    }

    /// Stamp the time the network was found missing.
    pub(crate) fn finalize(&mut self, now: DateTime<Utc>) {
        self.last = Some(now);
    }

    pub fn bssid(&self) -> Bssid {
        self.bssid
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn key_mgmt(&self) -> &[String] {
        &self.key_mgmt
    }

    pub fn frequency(&self) -> u16 {
        self.frequency
    }

    pub fn first_seen(&self) -> DateTime<Utc> {
        self.first
    }

    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last
    }

    pub fn signal_history(&self) -> &[i16] {
        &self.signal_history
    }

    pub fn age_history(&self) -> &[u32] {
        &self.age_history
    }

    pub fn is_unprotected(&self) -> bool {
        self.key_mgmt.is_empty()
    }

    /// Most recent signal sample in dBm.
    pub fn latest_signal(&self) -> i16 {
        self.signal_history.last().copied().unwrap_or(i16::MIN)
    }

    pub fn latest_age(&self) -> u32 {
        self.age_history.last().copied().unwrap_or(0)
    }
}

impl fmt::Display for ObservedNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SSIDs may hold control characters, so always print them quoted
        write!(f, "{:?} [{}] {:?}", self.ssid, self.bssid, self.key_mgmt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cafe() -> ScanResult {
        ScanResult {
            bssid: Bssid::parse("aa:bb:cc:dd:ee:ff").unwrap(),
            ssid: "CafeWifi".to_string(),
            key_mgmt: vec![],
            frequency: 2437,
            signal: -60,
            age: 0,
        }
    }

    #[test]
    fn bssid_parses_and_prints_lowercase() {
        let bssid = Bssid::parse("AA:BB:CC:DD:EE:0F").unwrap();
        assert_eq!(bssid.0, [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x0f]);
        assert_eq!(bssid.to_string(), "aa:bb:cc:dd:ee:0f");
    }

    #[test]
    fn bssid_rejects_malformed_input() {
        assert!(Bssid::parse("aa:bb:cc").is_err());
        assert!(Bssid::parse("aa:bb:cc:dd:ee:zz").is_err());
        assert!("".parse::<Bssid>().is_err());
    }

    #[test]
    fn record_appends_parallel_samples() {
        let mut net = ObservedNetwork::first_observed(cafe(), Utc::now());
        let mut later = cafe();
        later.signal = -55;
        later.age = 2;
        net.record(&later);

        assert_eq!(net.signal_history(), &[-60, -55]);
        assert_eq!(net.age_history(), &[0, 2]);
        assert_eq!(net.latest_signal(), -55);
        assert_eq!(net.latest_age(), 2);
        assert!(net.last_seen().is_none());
    }

    #[test]
    fn display_quotes_ssid() {
        let mut result = cafe();
        result.ssid = "bad\0name".to_string();
        let net = ObservedNetwork::first_observed(result, Utc::now());
        assert_eq!(net.to_string(), "\"bad\\0name\" [aa:bb:cc:dd:ee:ff] []");
    }

    #[test]
    fn serializes_bssid_as_string() {
        let net = ObservedNetwork::first_observed(cafe(), Utc::now());
        let json = serde_json::to_value(&net).unwrap();
        assert_eq!(json["bssid"], "aa:bb:cc:dd:ee:ff");
        assert_eq!(json["signal_history"], serde_json::json!([-60]));
        assert!(json["last"].is_null());
    }
}
