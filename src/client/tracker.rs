use crate::store::normalize_key;
use std::collections::HashMap;

/// Per-key last-observed versions, the client half of the monotonic-read /
/// read-your-writes guarantee: once the client has observed version V for a
/// key, the servers' staleness check keeps it from ever accepting a response
/// claiming less than V for that key.
#[derive(Debug, Default)]
pub struct VersionTracker {
    observed: HashMap<String, u64>,
}

impl VersionTracker {
    pub fn new() -> Self {
        VersionTracker::default()
    }

    /// Version last observed for `key`; 0 for a key never read or written.
    pub fn observed(&self, key: &str) -> u64 {
        self.observed.get(&normalize_key(key)).copied().unwrap_or(0)
    }

    /// Records the version a PUT_OK or GET_OK reported. A plain set; the
    /// server-side check makes this equivalent to taking a maximum.
    pub fn observe(&mut self, key: &str, version: u64) {
        self.observed.insert(normalize_key(key), version);
    }
}
