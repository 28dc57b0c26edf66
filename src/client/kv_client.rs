use crate::client::tracker::VersionTracker;
use crate::wire;
use crate::wire::{Envelope, Message, NodeAddress, WireError};
use rand::seq::SliceRandom;

/// Client side of the store: a set of known server addresses (populated once
/// via INIT, never pruned or re-validated) and the per-key version tracker.
/// Every request goes to a randomly chosen server over a fresh connection.
pub struct KvClient {
    logger: slog::Logger,
    servers: Vec<NodeAddress>,
    tracker: VersionTracker,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("no server addresses configured; run INIT first")]
    NoServersConfigured,

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("server {server} replied {got} to a {sent} request")]
    UnexpectedResponse {
        server: NodeAddress,
        sent: &'static str,
        got: &'static str,
    },
}

#[derive(Debug, Eq, PartialEq)]
pub enum PutResponse {
    /// The leader committed and every registered follower acknowledged.
    Committed {
        key: String,
        value: String,
        server_version: u64,
        server: NodeAddress,
    },
    /// The leader committed locally but replication did not complete; the
    /// tracker was not advanced, so this client does not yet count on the
    /// write being visible anywhere. Retry.
    RetryLater { key: String },
}

#[derive(Debug, Eq, PartialEq)]
pub enum GetResponse {
    Found {
        key: String,
        /// `None` for a key never written anywhere.
        value: Option<String>,
        server_version: u64,
        server: NodeAddress,
    },
    /// The chosen replica is behind what this client already observed.
    /// Retry, typically against a different randomly chosen server.
    TryOtherServer { key: String },
}

impl KvClient {
    pub fn new(logger: slog::Logger) -> Self {
        KvClient {
            logger,
            servers: Vec::new(),
            tracker: VersionTracker::new(),
        }
    }

    pub fn register_servers(&mut self, addresses: Vec<NodeAddress>) {
        for address in &addresses {
            slog::info!(self.logger, "Registered server {}", address);
        }
        self.servers.extend(addresses);
    }

    pub fn known_servers(&self) -> &[NodeAddress] {
        &self.servers
    }

    pub fn tracked_version(&self, key: &str) -> u64 {
        self.tracker.observed(key)
    }

    fn pick_server(&self) -> Result<NodeAddress, ClientError> {
        self.servers
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(ClientError::NoServersConfigured)
    }

    pub async fn put(&mut self, key: &str, value: &str) -> Result<PutResponse, ClientError> {
        let server = self.pick_server()?;
        let message = Message::Put {
            key: key.to_owned(),
            value: value.to_owned(),
            client_version: self.tracker.observed(key),
        };

        let reply = wire::request(&server, Envelope::unaddressed(message)).await?;
        match reply.message {
            Message::PutOk {
                key,
                value,
                server_version,
            } => {
                // Our own write succeeded at this version; reads from now on
                // must see at least it.
                self.tracker.observe(&key, server_version);
                slog::debug!(
                    self.logger,
                    "PUT_OK '{}' at version {} from {}",
                    key,
                    server_version,
                    server
                );
                Ok(PutResponse::Committed {
                    key,
                    value,
                    server_version,
                    server,
                })
            }
            Message::TryOtherServerOrLater { key } => {
                slog::warn!(
                    self.logger,
                    "Write for '{}' committed on the leader but was not confirmed everywhere",
                    key
                );
                Ok(PutResponse::RetryLater { key })
            }
            other => Err(ClientError::UnexpectedResponse {
                server,
                sent: "PUT",
                got: other.kind(),
            }),
        }
    }

    pub async fn get(&mut self, key: &str) -> Result<GetResponse, ClientError> {
        let server = self.pick_server()?;
        let message = Message::Get {
            key: key.to_owned(),
            client_version: self.tracker.observed(key),
        };

        let reply = wire::request(&server, Envelope::unaddressed(message)).await?;
        match reply.message {
            Message::GetOk {
                key,
                value,
                server_version,
                ..
            } => {
                self.tracker.observe(&key, server_version);
                Ok(GetResponse::Found {
                    key,
                    value,
                    server_version,
                    server,
                })
            }
            Message::TryOtherServerOrLater { key } => {
                slog::debug!(self.logger, "Server {} is behind on '{}'", server, key);
                Ok(GetResponse::TryOtherServer { key })
            }
            other => Err(ClientError::UnexpectedResponse {
                server,
                sent: "GET",
                got: other.kind(),
            }),
        }
    }
}
