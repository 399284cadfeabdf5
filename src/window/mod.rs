//! Sliding-window log of observed network requests.
//!
//! Records are appended in arrival order and evicted from the front once
//! they fall out of the trailing `WINDOW_MS` interval. Every query prunes
//! first, so reads never see entries older than the window.

pub mod stats;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::ir::{Millis, RequestRecord, TabId};

pub use stats::{ActivityLevel, Badge, InitiatorCount, Stats};

/// Length of the sliding window.
pub const WINDOW_MS: Millis = 10_000;

/// Number of initiators reported by `stats`.
pub const DEFAULT_TOP_INITIATORS: usize = 8;

#[derive(Debug, Default)]
pub struct RequestWindow {
    entries: VecDeque<RequestRecord>,
    total_recorded: u64,
}

impl RequestWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. The lifetime counter is never reset.
    pub fn record(&mut self, entry: RequestRecord) {
        self.entries.push_back(entry);
        self.total_recorded += 1;
    }

    /// Evict records older than `now - WINDOW_MS` from the front.
    /// Returns the number of evicted records.
    pub fn prune(&mut self, now: Millis) -> usize {
        let cutoff = cutoff(now);
        let mut evicted = 0;
        while self.entries.front().is_some_and(|r| r.timestamp < cutoff) {
            self.entries.pop_front();
            evicted += 1;
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_recorded(&self) -> u64 {
        self.total_recorded
    }

    /// Records currently held, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &RequestRecord> {
        self.entries.iter()
    }

    /// Number of in-window requests made by `tab_id`.
    pub fn count_for_tab(&mut self, tab_id: TabId, now: Millis) -> usize {
        self.prune(now);
        self.live(now).filter(|r| r.tab_id == tab_id).count()
    }

    /// The most recent `limit` in-window requests of `tab_id`, oldest first.
    pub fn recent_for_tab(&mut self, tab_id: TabId, limit: usize, now: Millis) -> Vec<RequestRecord> {
        self.prune(now);
        let matching: Vec<&RequestRecord> = self.live(now).filter(|r| r.tab_id == tab_id).collect();
        let skip = matching.len().saturating_sub(limit);
        matching.into_iter().skip(skip).cloned().collect()
    }

    /// In-window request counts per initiator, highest first, at most `top_k`.
    /// Equal counts keep the order in which the initiators were first seen.
    pub fn grouped_by_initiator(&mut self, now: Millis, top_k: usize) -> Vec<InitiatorCount> {
        self.prune(now);

        let mut slots: HashMap<&str, usize> = HashMap::new();
        let mut counts: Vec<InitiatorCount> = Vec::new();
        for record in self.live(now) {
            match slots.get(record.initiator.as_str()) {
                Some(&slot) => counts[slot].count += 1,
                None => {
                    slots.insert(record.initiator.as_str(), counts.len());
                    counts.push(InitiatorCount {
                        initiator: record.initiator.clone(),
                        count: 1,
                    });
                }
            }
        }

        // sort_by is stable: ties stay in first-seen order
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts.truncate(top_k);
        counts
    }

    pub fn stats(&mut self, now: Millis, top_k: usize) -> Stats {
        let top_initiators = self.grouped_by_initiator(now, top_k);
        Stats {
            requests_in_window: self.live(now).count(),
            total_requests_ever: self.total_recorded,
            top_initiators,
        }
    }

    // Pruning only inspects the front; a record appended with an older
    // timestamp than its predecessors is filtered here instead.
    fn live(&self, now: Millis) -> impl Iterator<Item = &RequestRecord> {
        let cutoff = cutoff(now);
        self.entries.iter().filter(move |r| r.timestamp >= cutoff)
    }
}

fn cutoff(now: Millis) -> Millis {
    now.saturating_sub(WINDOW_MS)
}

/// Process-wide handle on a `RequestWindow`.
///
/// All operations take the lock for their whole duration, so append, prune
/// and reads are serialized across threads. The lock is never held across
/// an await point.
#[derive(Debug, Clone, Default)]
pub struct SharedRequestWindow {
    inner: Arc<Mutex<RequestWindow>>,
}

impl SharedRequestWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request and prune relative to `now`. Returns the number of
    /// records held afterwards.
    pub fn record(&self, entry: RequestRecord, now: Millis) -> usize {
        let mut window = self.inner.lock();
        window.record(entry);
        window.prune(now);
        window.len()
    }

    pub fn count_for_tab(&self, tab_id: TabId, now: Millis) -> usize {
        self.inner.lock().count_for_tab(tab_id, now)
    }

    pub fn recent_for_tab(&self, tab_id: TabId, limit: usize, now: Millis) -> Vec<RequestRecord> {
        self.inner.lock().recent_for_tab(tab_id, limit, now)
    }

    pub fn stats(&self, now: Millis, top_k: usize) -> Stats {
        self.inner.lock().stats(now, top_k)
    }

}
