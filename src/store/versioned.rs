use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One stored entry. The version counts accepted writes for this key at this
/// node, starting from 1; it also travels inside the FOLLOW_OK snapshot, so
/// it is serde-derived.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct VersionedRecord {
    pub value: String,
    pub version: u64,
}

/// Result of reading one key. A key that was never written reads as
/// `value: None` with version 0.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Lookup {
    pub value: Option<String>,
    pub version: u64,
}

/// Keys are case-folded so `abc` and `ABC` name the same entry on every node.
/// The client-side tracker folds the same way.
pub(crate) fn normalize_key(key: &str) -> String {
    key.to_uppercase()
}

/// In-memory key/value map with a per-key write counter. This is both the
/// unit of replication (leader and followers each own one) and the unit of
/// staleness checking.
///
/// Every operation runs as a single critical section under one mutex. In
/// particular `write` must not split the version read from the store, and
/// `snapshot` must not observe a half-applied write.
pub struct VersionedStore {
    records: Mutex<HashMap<String, VersionedRecord>>,
}

impl VersionedStore {
    pub fn new() -> Self {
        VersionedStore {
            records: Mutex::new(HashMap::new()),
        }
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, VersionedRecord>> {
        // A panic while holding the guard leaves the map in a consistent
        // state (no multi-step mutations), so poison is recoverable.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn read(&self, key: &str) -> Lookup {
        match self.records().get(&normalize_key(key)) {
            Some(record) => Lookup {
                value: Some(record.value.clone()),
                version: record.version,
            },
            None => Lookup {
                value: None,
                version: 0,
            },
        }
    }

    /// Commits a write and returns the version it got. The new version is
    /// always this node's current version + 1, for locally originated PUTs
    /// and applied REPLICATIONs alike; a version supplied by the leader is
    /// never copied in. Convergence relies on every replica applying writes
    /// for a key in the leader's commit order.
    pub fn write(&self, key: &str, value: &str) -> u64 {
        let mut records = self.records();
        let record = records
            .entry(normalize_key(key))
            .or_insert_with(|| VersionedRecord {
                value: String::new(),
                version: 0,
            });
        record.value = value.to_owned();
        record.version += 1;
        record.version
    }

    /// Full copy of the store, taken under the write mutex, for the
    /// FOLLOW_OK catch-up payload.
    pub fn snapshot(&self) -> HashMap<String, VersionedRecord> {
        self.records().clone()
    }

    /// Wholesale replacement from a FOLLOW_OK snapshot. Only meaningful on a
    /// follower that has not started serving yet.
    pub fn restore(&self, snapshot: HashMap<String, VersionedRecord>) {
        *self.records() = snapshot;
    }
}

impl Default for VersionedStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritten_key_reads_as_none_version_zero() {
        let store = VersionedStore::new();

        let lookup = store.read("missing");

        assert_eq!(lookup.value, None);
        assert_eq!(lookup.version, 0);
    }

    #[test]
    fn each_write_increments_version_by_one() {
        let store = VersionedStore::new();

        assert_eq!(1, store.write("k", "a"));
        assert_eq!(2, store.write("k", "b"));
        assert_eq!(3, store.write("k", "c"));

        let lookup = store.read("k");
        assert_eq!(lookup.value.as_deref(), Some("c"));
        assert_eq!(lookup.version, 3);
    }

    #[test]
    fn versions_are_tracked_per_key() {
        let store = VersionedStore::new();

        store.write("a", "1");
        store.write("a", "2");
        store.write("b", "1");

        assert_eq!(store.read("a").version, 2);
        assert_eq!(store.read("b").version, 1);
    }

    #[test]
    fn keys_are_case_folded() {
        let store = VersionedStore::new();

        store.write("Key", "v1");
        store.write("KEY", "v2");

        let lookup = store.read("key");
        assert_eq!(lookup.value.as_deref(), Some("v2"));
        assert_eq!(lookup.version, 2);
    }

    #[test]
    fn snapshot_and_restore_carry_values_and_versions() {
        let source = VersionedStore::new();
        source.write("a", "1");
        source.write("a", "2");
        source.write("b", "x");

        let target = VersionedStore::new();
        target.restore(source.snapshot());

        assert_eq!(target.read("a").version, 2);
        assert_eq!(target.read("a").value.as_deref(), Some("2"));
        assert_eq!(target.read("b").version, 1);
    }

    #[test]
    fn restore_replaces_previous_contents() {
        let store = VersionedStore::new();
        store.write("old", "gone");

        store.restore(HashMap::new());

        assert_eq!(store.read("old").version, 0);
    }
}
