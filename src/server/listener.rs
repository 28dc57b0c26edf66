use crate::node::{FollowerRole, JoinError, LeaderRole, Role};
use crate::server::config::ServerConfig;
use crate::server::shutdown::{shutdown_pair, ShutdownHandle, ShutdownSignal};
use crate::store::VersionedStore;
use crate::wire;
use crate::wire::{Envelope, NodeAddress};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind listener: {0}")]
    Bind(#[source] io::Error),

    #[error(transparent)]
    Join(#[from] JoinError),
}

/// A running node. Dropping the handle stops its accept loop.
pub struct NodeHandle {
    address: NodeAddress,
    store: Arc<VersionedStore>,
    _shutdown: ShutdownHandle,
}

impl NodeHandle {
    pub fn address(&self) -> &NodeAddress {
        &self.address
    }

    /// This node's own store. Read-only access is safe from outside; all
    /// mutation goes through the connection handlers.
    pub fn store(&self) -> &Arc<VersionedStore> {
        &self.store
    }
}

/// Wires up one node: selects the role from the configuration, runs the
/// follower catch-up step when applicable, binds the listener, and spawns
/// the accept loop. Returns once the node is ready to serve requests.
pub async fn start_node(logger: slog::Logger, config: ServerConfig) -> Result<NodeHandle, ServerError> {
    let store = Arc::new(VersionedStore::new());

    let role: Arc<dyn Role> = if config.is_leader() {
        slog::info!(logger, "Starting as leader");
        Arc::new(LeaderRole::new(
            logger.clone(),
            config.bind_address.clone(),
            Arc::clone(&store),
        ))
    } else {
        slog::info!(logger, "Starting as follower of {}", config.leader_address);
        let follower = FollowerRole::new(
            logger.clone(),
            config.bind_address.clone(),
            config.leader_address.clone(),
            Arc::clone(&store),
        );
        // Catch up before accepting anything; a follower that cannot reach
        // its leader has nothing correct to serve.
        follower.catch_up().await?;
        Arc::new(follower)
    };

    let listener = TcpListener::bind((config.bind_address.ip.as_str(), config.bind_address.port))
        .await
        .map_err(ServerError::Bind)?;
    slog::info!(logger, "Listening on '{}'", config.bind_address);

    let (shutdown_handle, shutdown_signal) = shutdown_pair();
    tokio::spawn(accept_loop(
        logger,
        listener,
        config.bind_address.clone(),
        role,
        shutdown_signal,
    ));

    Ok(NodeHandle {
        address: config.bind_address,
        store,
        _shutdown: shutdown_handle,
    })
}

/// Accepts until shut down. Every connection gets its own task,
/// unconditionally: no pool, no backpressure, no admission control.
async fn accept_loop(
    logger: slog::Logger,
    listener: TcpListener,
    self_address: NodeAddress,
    role: Arc<dyn Role>,
    shutdown: ShutdownSignal,
) {
    let accept = async {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    tokio::spawn(handle_connection(
                        logger.clone(),
                        Arc::clone(&role),
                        self_address.clone(),
                        stream,
                        peer,
                    ));
                }
                Err(e) => {
                    // Per-connection failure; keep accepting.
                    slog::warn!(logger, "Accept failed: {}", e);
                }
            }
        }
    };

    tokio::select! {
        _ = shutdown.fired() => {
            slog::info!(logger, "Accept loop on '{}' has exited", self_address);
        }
        _ = accept => {}
    }
}

/// One connection, one request, at most one response. The request's sender
/// field is stamped from the socket peer; whatever the payload claimed is
/// discarded.
async fn handle_connection(
    logger: slog::Logger,
    role: Arc<dyn Role>,
    self_address: NodeAddress,
    mut stream: TcpStream,
    peer: SocketAddr,
) {
    let mut request = match wire::read_frame(&mut stream).await {
        Ok(envelope) => envelope,
        Err(e) => {
            slog::warn!(logger, "Dropping connection from {}: {}", peer, e);
            return;
        }
    };
    request.sender = Some(NodeAddress::from(peer));
    slog::debug!(logger, "Handling {} from {}", request.message.kind(), peer);

    let response = match role.handle(request).await {
        Some(message) => message,
        // Unrouteable: close with no payload written.
        None => return,
    };

    let envelope = Envelope::from_node(self_address, response);
    if let Err(e) = wire::write_frame(&mut stream, &envelope).await {
        slog::warn!(logger, "Failed to respond to {}: {}", peer, e);
    }
}
