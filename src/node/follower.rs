use crate::node::role::{serve_read, Role};
use crate::store::VersionedStore;
use crate::wire;
use crate::wire::{Envelope, Message, NodeAddress, WireError};
use std::sync::Arc;

/// A node that mirrors the leader's store via REPLICATION and serves reads,
/// possibly staler than the leader. Writes are forwarded.
pub struct FollowerRole {
    logger: slog::Logger,
    self_address: NodeAddress,
    leader_address: NodeAddress,
    store: Arc<VersionedStore>,
}

#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    #[error("leader {leader} unreachable during catch-up: {source}")]
    LeaderUnreachable {
        leader: NodeAddress,
        #[source]
        source: WireError,
    },

    #[error("leader replied {got} instead of FOLLOW_OK")]
    UnexpectedReply { got: &'static str },
}

impl FollowerRole {
    pub fn new(
        logger: slog::Logger,
        self_address: NodeAddress,
        leader_address: NodeAddress,
        store: Arc<VersionedStore>,
    ) -> Self {
        FollowerRole {
            logger,
            self_address,
            leader_address,
            store,
        }
    }

    /// Join step: announce ourselves with FOLLOW and replace the local store
    /// with the snapshot from FOLLOW_OK. Must complete before the listener
    /// starts accepting; a follower never serves reads it hasn't caught up
    /// for. Returns the number of entries received.
    pub async fn catch_up(&self) -> Result<usize, JoinError> {
        let follow = Message::Follow {
            follower_address: self.self_address.clone(),
        };
        let envelope = Envelope::from_node(self.self_address.clone(), follow);

        let reply = wire::request(&self.leader_address, envelope)
            .await
            .map_err(|source| JoinError::LeaderUnreachable {
                leader: self.leader_address.clone(),
                source,
            })?;

        match reply.message {
            Message::FollowOk { store_snapshot } => {
                let entries = store_snapshot.len();
                self.store.restore(store_snapshot);
                slog::info!(
                    self.logger,
                    "Caught up from leader {} with {} entries",
                    self.leader_address,
                    entries
                );
                Ok(entries)
            }
            other => Err(JoinError::UnexpectedReply { got: other.kind() }),
        }
    }

    /// Forwards a PUT to the leader over a fresh connection and relays the
    /// leader's reply back unmodified. An unreachable leader means the
    /// caller sees a closed connection, same as any connectivity failure.
    async fn forward_put(&self, message: Message) -> Option<Message> {
        let envelope = Envelope::from_node(self.self_address.clone(), message);

        match wire::request(&self.leader_address, envelope).await {
            Ok(reply) => Some(reply.message),
            Err(e) => {
                slog::error!(
                    self.logger,
                    "Could not forward PUT to leader {}: {}",
                    self.leader_address,
                    e
                );
                None
            }
        }
    }

    fn apply_replication(&self, key: String, value: String, leader_version: u64) -> Message {
        // The leader's version is advisory: this replica recomputes its own
        // current + 1. A mismatch means an earlier REPLICATION was missed
        // and this replica has silently diverged for the key.
        let applied_version = self.store.write(&key, &value);
        if applied_version != leader_version {
            slog::warn!(
                self.logger,
                "Version divergence on '{}': applied {} but leader reports {}",
                key,
                applied_version,
                leader_version
            );
        }

        Message::ReplicationOk { key }
    }
}

#[async_trait::async_trait]
impl Role for FollowerRole {
    async fn handle(&self, request: Envelope) -> Option<Message> {
        match request.message {
            message @ Message::Put { .. } => self.forward_put(message).await,
            Message::Get { key, client_version } => {
                Some(serve_read(&self.store, key, client_version))
            }
            Message::Replication {
                key,
                value,
                server_version,
            } => Some(self.apply_replication(key, value, server_version)),
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
