mod kv_client;
mod tracker;

pub use kv_client::ClientError;
pub use kv_client::GetResponse;
pub use kv_client::KvClient;
pub use kv_client::PutResponse;
pub use tracker::VersionTracker;
