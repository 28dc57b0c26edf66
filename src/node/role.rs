use crate::store::VersionedStore;
use crate::wire::{Envelope, Message};

/// The per-node behavior seam. The same nine message kinds route through
/// whichever implementation the startup configuration selected; the
/// leader/follower decision is made exactly once, not re-checked inside
/// every handler.
#[async_trait::async_trait]
pub trait Role: Send + Sync {
    /// Handles one decoded request and produces the response to write back.
    /// `None` means the request is not routeable for this role and the
    /// connection is closed without a payload.
    async fn handle(&self, request: Envelope) -> Option<Message>;
}

/// GET path shared by both roles: the check is uniform even though a leader
/// being behind a client should not normally happen. On a follower this is
/// where staleness actually manifests, since its replica may not yet have
/// applied the latest REPLICATION.
pub(crate) fn serve_read(store: &VersionedStore, key: String, client_version: u64) -> Message {
    let lookup = store.read(&key);
    if client_version > lookup.version {
        Message::TryOtherServerOrLater { key }
    } else {
        Message::GetOk {
            key,
            value: lookup.value,
            client_version,
            server_version: lookup.version,
        }
    }
}
