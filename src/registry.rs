//! Live set of networks currently in radio range.
//!
//! Each scan cycle is reconciled against the registry: unseen BSSIDs are
//! added, known ones get a new sample, and any entry missing from the cycle
//! is finalized into the session log and dropped. There is no grace period,
//! so a network missing for a single scan comes back as a new network.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::network::{Bssid, ObservedNetwork, ScanResult};
use crate::session::SessionLog;

/// Counters produced by one [`NetworkRegistry::reconcile`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub new_count: usize,
    pub update_count: usize,
    pub removed_count: usize,
}

#[derive(Debug, Default)]
pub struct NetworkRegistry {
    networks: BTreeMap<Bssid, ObservedNetwork>,
}

impl NetworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one scan cycle into the registry.
    ///
    /// All observations are applied before absences are computed, so a
    /// network is never both new and removed in the same cycle. Repeated
    /// BSSIDs within `observed` after the first are ignored.
    pub fn reconcile(
        &mut self,
        observed: Vec<ScanResult>,
        now: DateTime<Utc>,
        log: &mut SessionLog,
    ) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();
        let mut current: HashSet<Bssid> = HashSet::with_capacity(observed.len());

        for result in observed {
            if !current.insert(result.bssid) {
                debug!("duplicate BSSID {} in scan, ignoring", result.bssid);
                continue;
            }

            match self.networks.get_mut(&result.bssid) {
                Some(network) => {
                    network.record(&result);
                    summary.update_count += 1;
                }
                None => {
                    self.networks
                        .insert(result.bssid, ObservedNetwork::first_observed(result, now));
                    summary.new_count += 1;
                }
            }
        }

        let vanished: Vec<Bssid> = self
            .networks
            .keys()
            .filter(|bssid| !current.contains(bssid))
            .copied()
            .collect();

        for bssid in vanished {
            if let Some(mut network) = self.networks.remove(&bssid) {
                network.finalize(now);
                log.record(&network);
                summary.removed_count += 1;
            }
        }

        summary
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn get(&self, bssid: &Bssid) -> Option<&ObservedNetwork> {
        self.networks.get(bssid)
    }

    /// Iterate over the tracked networks in BSSID order.
    pub fn iter(&self) -> impl Iterator<Item = &ObservedNetwork> {
        self.networks.values()
    }
}
