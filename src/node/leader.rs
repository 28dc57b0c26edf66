use crate::node::role::{serve_read, Role};
use crate::store::VersionedStore;
use crate::wire;
use crate::wire::{Envelope, Message, NodeAddress, WireError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The single node that accepts writes directly and originates replication.
/// Owns the authoritative store and the append-only follower list.
pub struct LeaderRole {
    logger: slog::Logger,
    self_address: NodeAddress,
    store: Arc<VersionedStore>,
    // Append-only: there is no removal, no health checking, and no
    // de-duplication of repeated FOLLOWs.
    followers: Mutex<Vec<NodeAddress>>,
}

/// A follower failed to acknowledge a REPLICATION after the leader already
/// committed locally. Distinct from ordinary connectivity failure because
/// leader and follower now disagree; the leader's write is not rolled back.
#[derive(Debug, thiserror::Error)]
pub enum ReplicationError {
    #[error("follower {follower} did not take the write for '{key}': {source}")]
    FollowerFailed {
        follower: NodeAddress,
        key: String,
        #[source]
        source: WireError,
    },

    #[error("follower {follower} replied {got} instead of REPLICATION_OK for '{key}'")]
    UnexpectedAck {
        follower: NodeAddress,
        key: String,
        got: &'static str,
    },
}

impl LeaderRole {
    pub fn new(logger: slog::Logger, self_address: NodeAddress, store: Arc<VersionedStore>) -> Self {
        LeaderRole {
            logger,
            self_address,
            store,
            followers: Mutex::new(Vec::new()),
        }
    }

    fn followers(&self) -> MutexGuard<'_, Vec<NodeAddress>> {
        self.followers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn registered_followers(&self) -> Vec<NodeAddress> {
        self.followers().clone()
    }

    async fn handle_put(&self, key: String, value: String) -> Message {
        let server_version = self.store.write(&key, &value);
        slog::debug!(
            self.logger,
            "Committed '{}' locally at version {}",
            key,
            server_version
        );

        match self.replicate(&key, &value, server_version).await {
            Ok(()) => Message::PutOk {
                key,
                value,
                server_version,
            },
            Err(e) => {
                // The local commit stands. The client gets a retry signal
                // instead of a dead connection; within the closed message
                // set, TRY_OTHER in response to a PUT can only mean this.
                slog::error!(self.logger, "Replication aborted: {}", e);
                Message::TryOtherServerOrLater { key }
            }
        }
    }

    /// Pushes one committed write to every registered follower, strictly
    /// sequentially: follower N+1 is not contacted until follower N acked.
    /// The first failure aborts the remaining fan-out. There is no timeout,
    /// so a stalled follower stalls the client-visible PUT.
    async fn replicate(
        &self,
        key: &str,
        value: &str,
        server_version: u64,
    ) -> Result<(), ReplicationError> {
        // The list is copied under the guard; a FOLLOW racing with this PUT
        // may miss the write and relies on the snapshot it gets instead.
        let followers = self.registered_followers();

        for follower in followers {
            let message = Message::Replication {
                key: key.to_owned(),
                value: value.to_owned(),
                server_version,
            };
            let envelope = Envelope::from_node(self.self_address.clone(), message);

            let reply = wire::request(&follower, envelope).await.map_err(|source| {
                ReplicationError::FollowerFailed {
                    follower: follower.clone(),
                    key: key.to_owned(),
                    source,
                }
            })?;

            match reply.message {
                Message::ReplicationOk { .. } => {
                    slog::debug!(
                        self.logger,
                        "Follower {} acked '{}' at version {}",
                        follower,
                        key,
                        server_version
                    );
                }
                other => {
                    return Err(ReplicationError::UnexpectedAck {
                        follower,
                        key: key.to_owned(),
                        got: other.kind(),
                    });
                }
            }
        }

        Ok(())
    }

    fn handle_follow(&self, follower_address: NodeAddress) -> Message {
        // Register before reading the snapshot, so a write landing in
        // between reaches the new follower at least via REPLICATION. The
        // remaining join window is a known, bounded inconsistency.
        self.followers().push(follower_address.clone());
        slog::info!(self.logger, "Registered follower {}", follower_address);

        Message::FollowOk {
            store_snapshot: self.store.snapshot(),
        }
    }
}

#[async_trait::async_trait]
impl Role for LeaderRole {
    async fn handle(&self, request: Envelope) -> Option<Message> {
        match request.message {
            Message::Put { key, value, .. } => Some(self.handle_put(key, value).await),
            Message::Get { key, client_version } => {
                Some(serve_read(&self.store, key, client_version))
            }
            Message::Follow { follower_address } => Some(self.handle_follow(follower_address)),
            other => {
                slog::warn!(
                    self.logger,
                    "Dropping unrouteable {} request",
                    other.kind()
                );
                None
            }
        }
    }
}
