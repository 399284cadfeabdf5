use std::collections::{BTreeSet, HashSet};

use parking_lot::RwLock;
use url::Url;

use super::ExceptionStore;

/// Reduce a user-entered exception to a bare hostname.
///
/// Full URLs keep only their host. Anything else loses an `http://` or
/// `https://` prefix and everything from the first `/`. Blank input yields
/// `None`.
pub fn normalize_host(entry: &str) -> Option<String> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }

    let host = Url::parse(entry)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| {
            let rest = entry
                .strip_prefix("https://")
                .or_else(|| entry.strip_prefix("http://"))
                .unwrap_or(entry);
            rest.split('/').next().unwrap_or_default().to_owned()
        });

    (!host.is_empty()).then_some(host)
}

/// Exception list kept in memory, seeded from configuration.
#[derive(Debug, Default)]
pub struct InMemoryExceptionStore {
    hosts: RwLock<BTreeSet<String>>,
}

impl InMemoryExceptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from raw entries; entries that normalize to nothing are dropped.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hosts = entries
            .into_iter()
            .filter_map(|e| normalize_host(e.as_ref()))
            .collect();
        Self {
            hosts: RwLock::new(hosts),
        }
    }

    /// Add an entry. Returns the stored host, or `None` for blank input.
    pub fn add(&self, entry: &str) -> Option<String> {
        let host = normalize_host(entry)?;
        self.hosts.write().insert(host.clone());
        Some(host)
    }

    /// Remove a host. Returns whether it was present.
    pub fn remove(&self, host: &str) -> bool {
        self.hosts.write().remove(host)
    }

    /// Hosts in sorted order.
    pub fn list(&self) -> Vec<String> {
        self.hosts.read().iter().cloned().collect()
    }
}

impl ExceptionStore for InMemoryExceptionStore {
    fn allowed_hosts(&self) -> HashSet<String> {
        self.hosts.read().iter().cloned().collect()
    }

    fn is_allowed(&self, host: &str) -> bool {
        self.hosts.read().contains(host)
    }
}
