mod client;
mod node;
mod server;
mod store;
mod wire;

pub use client::ClientError;
pub use client::GetResponse;
pub use client::KvClient;
pub use client::PutResponse;
pub use client::VersionTracker;
pub use node::FollowerRole;
pub use node::JoinError;
pub use node::LeaderRole;
pub use node::ReplicationError;
pub use node::Role;
pub use server::start_node;
pub use server::NodeHandle;
pub use server::ServerConfig;
pub use server::ServerError;
pub use store::Lookup;
pub use store::VersionedRecord;
pub use store::VersionedStore;
pub use wire::read_frame;
pub use wire::request;
pub use wire::write_frame;
pub use wire::AddressParseError;
pub use wire::Envelope;
pub use wire::Message;
pub use wire::NodeAddress;
pub use wire::WireError;
