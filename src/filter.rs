//! Candidate selection: which tracked networks are worth probing.
//!
//! Filters are small predicates over [`ObservedNetwork`] that compose with
//! [`CompoundFilter`]. [`select`] applies one to the registry and ranks the
//! survivors by their latest signal strength.

use crate::network::ObservedNetwork;
use crate::registry::NetworkRegistry;

pub trait NetworkFilter {
    /// Whether `network` passes this filter.
    fn accepts(&self, network: &ObservedNetwork) -> bool;
}

impl<F> NetworkFilter for F
where
    F: Fn(&ObservedNetwork) -> bool,
{
    fn accepts(&self, network: &ObservedNetwork) -> bool {
        self(network)
    }
}

/// Passes networks without any key management.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unprotected;

impl NetworkFilter for Unprotected {
    fn accepts(&self, network: &ObservedNetwork) -> bool {
        network.is_unprotected()
    }
}

/// Passes everything; used for manual inspection.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllNetworks;

impl NetworkFilter for AllNetworks {
    fn accepts(&self, _network: &ObservedNetwork) -> bool {
        true
    }
}

/// Rejects well-known public hotspots and anything else not worth probing.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSsids {
    ssids: Vec<String>,
}

impl IgnoreSsids {
    pub fn new(ssids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            ssids: ssids.into_iter().map(Into::into).collect(),
        }
    }
}

impl NetworkFilter for IgnoreSsids {
    fn accepts(&self, network: &ObservedNetwork) -> bool {
        !self.ssids.iter().any(|s| s == network.ssid())
    }
}

/// Passes only if every component filter passes. An empty compound passes
/// everything.
#[derive(Default)]
pub struct CompoundFilter {
    filters: Vec<Box<dyn NetworkFilter>>,
}

impl CompoundFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: impl NetworkFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }
}

impl NetworkFilter for CompoundFilter {
    fn accepts(&self, network: &ObservedNetwork) -> bool {
        self.filters.iter().all(|f| f.accepts(network))
    }
}

/// The filter the wander loop uses: open networks not on the ignore list.
pub fn default_filter(ignored_ssids: &[String]) -> CompoundFilter {
    CompoundFilter::new()
        .with(Unprotected)
        .with(IgnoreSsids::new(ignored_ssids.iter().cloned()))
}

/// Networks passing `filter`, strongest latest signal first.
pub fn select<'a>(
    registry: &'a NetworkRegistry,
    filter: &dyn NetworkFilter,
) -> Vec<&'a ObservedNetwork> {
    let mut candidates: Vec<&ObservedNetwork> =
        registry.iter().filter(|n| filter.accepts(n)).collect();
    // signals are negative dBm, so the largest value is the strongest
    candidates.sort_by(|a, b| b.latest_signal().cmp(&a.latest_signal()));
    candidates
}
