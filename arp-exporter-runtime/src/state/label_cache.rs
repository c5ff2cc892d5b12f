use crate::metrics::ArpMetrics;
use crate::state::{Fingerprint, LabelSet};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::warn;

/// Default time a label combination may stay silent before the sweep evicts it.
pub const DEFAULT_INACTIVITY: Duration = Duration::from_secs(10 * 60);

#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub last_seen: Instant,
    pub labels: LabelSet,
}

/// Tracks the last time every label combination was observed, and owns the counter those
/// combinations are series of.
///
/// A series exists in the metrics exactly when an entry exists here. Both are only changed while
/// holding the cache lock: `observe` increments and touches under it, `sweep` holds it for the
/// whole scan-and-delete pass.
pub struct LabelCache {
    entries: Mutex<HashMap<Fingerprint, CacheEntry>>,
    metrics: ArpMetrics,
    inactivity: Duration,
}

impl LabelCache {
    /// Creates a new empty cache
    pub fn new(metrics: ArpMetrics, inactivity: Duration) -> Self {
        LabelCache {
            entries: Mutex::new(HashMap::new()),
            metrics,
            inactivity,
        }
    }

    /// Counts one observation of `labels` at `now`: increments its series and creates or
    /// refreshes its entry.
    pub fn observe(&self, labels: LabelSet, now: Instant) -> Fingerprint {
        let fingerprint = labels.fingerprint();
        let mut entries = self.entries.lock();

        if let Some(existing) = entries.get(&fingerprint) {
            if existing.labels != labels {
                // Two label sets hashed to the same key, the newer one takes the slot.
                warn!(
                    fingerprint = fingerprint.0,
                    "label fingerprint collision, replacing series"
                );
                self.metrics.remove(&existing.labels);
            }
        }

        self.metrics.increment(&labels);
        touch(&mut entries, fingerprint, labels, now);
        fingerprint
    }

    /// Evicts every entry idle for longer than the inactivity threshold at `now`, deleting its
    /// series along with it. Returns the number of evicted entries.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        let inactivity = self.inactivity;
        let metrics = &self.metrics;

        entries.retain(|_, entry| {
            let idle = now.saturating_duration_since(entry.last_seen);
            if idle > inactivity {
                metrics.remove(&entry.labels);
                false
            } else {
                true
            }
        });

        before - entries.len()
    }

    pub fn get(&self, fingerprint: Fingerprint) -> Option<CacheEntry> {
        self.entries.lock().get(&fingerprint).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn metrics(&self) -> &ArpMetrics {
        &self.metrics
    }
}

fn touch(
    entries: &mut HashMap<Fingerprint, CacheEntry>,
    fingerprint: Fingerprint,
    labels: LabelSet,
    now: Instant,
) {
    match entries.get_mut(&fingerprint) {
        Some(entry) => {
            entry.last_seen = now;
            if entry.labels != labels {
                entry.labels = labels;
            }
        }
        None => {
            entries.insert(
                fingerprint,
                CacheEntry {
                    fingerprint,
                    last_seen: now,
                    labels,
                },
            );
        }
    }
}
