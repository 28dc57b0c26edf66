mod versioned;

pub use versioned::Lookup;
pub use versioned::VersionedRecord;
pub use versioned::VersionedStore;

pub(crate) use versioned::normalize_key;
