use crate::store::VersionedRecord;
use crate::wire::NodeAddress;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The closed set of message kinds exchanged over one-shot connections. The
/// `type` field on the wire carries the variant tag (`PUT`, `GET_OK`, ...).
///
/// `client_version` is the version the requester last observed for the key;
/// `server_version` is the version assigned or observed at the responder.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    Put {
        key: String,
        value: String,
        client_version: u64,
    },
    Get {
        key: String,
        client_version: u64,
    },
    PutOk {
        key: String,
        value: String,
        server_version: u64,
    },
    GetOk {
        key: String,
        // None encodes "never written" as JSON null.
        value: Option<String>,
        client_version: u64,
        server_version: u64,
    },
    /// Not an error: the responder's replica is behind what the requester
    /// already observed (GET), or a leader-side PUT could not be confirmed
    /// on every follower. The requester is expected to retry, typically
    /// against a different server.
    TryOtherServerOrLater {
        key: String,
    },
    Follow {
        follower_address: NodeAddress,
    },
    FollowOk {
        store_snapshot: HashMap<String, VersionedRecord>,
    },
    Replication {
        key: String,
        value: String,
        server_version: u64,
    },
    ReplicationOk {
        key: String,
    },
}

impl Message {
    /// Wire tag of this message, for logs and error reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Put { .. } => "PUT",
            Message::Get { .. } => "GET",
            Message::PutOk { .. } => "PUT_OK",
            Message::GetOk { .. } => "GET_OK",
            Message::TryOtherServerOrLater { .. } => "TRY_OTHER_SERVER_OR_LATER",
            Message::Follow { .. } => "FOLLOW",
            Message::FollowOk { .. } => "FOLLOW_OK",
            Message::Replication { .. } => "REPLICATION",
            Message::ReplicationOk { .. } => "REPLICATION_OK",
        }
    }
}

/// One frame on the wire: a message plus the address of whoever sent it.
///
/// The sender field is advisory at best. A receiving node always overwrites
/// it with the socket peer address before routing, and stamps its own bind
/// address into responses.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<NodeAddress>,
    #[serde(flatten)]
    pub message: Message,
}

impl Envelope {
    pub fn unaddressed(message: Message) -> Self {
        Envelope {
            sender: None,
            message,
        }
    }

    pub fn from_node(sender: NodeAddress, message: Message) -> Self {
        Envelope {
            sender: Some(sender),
            message,
        }
    }
}
