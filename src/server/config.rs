use crate::wire::NodeAddress;

/// Startup configuration for one node. The leader address is static for the
/// lifetime of the cluster; there is no election.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: NodeAddress,
    pub leader_address: NodeAddress,
}

impl ServerConfig {
    /// A node is the leader iff it binds the configured leader address.
    pub fn is_leader(&self) -> bool {
        self.bind_address == self.leader_address
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_binding_the_leader_address_is_the_leader() {
        let config = ServerConfig {
            bind_address: NodeAddress::new("127.0.0.1", 9000),
            leader_address: NodeAddress::new("127.0.0.1", 9000),
        };
        assert!(config.is_leader());

        let config = ServerConfig {
            bind_address: NodeAddress::new("127.0.0.1", 9001),
            leader_address: NodeAddress::new("127.0.0.1", 9000),
        };
        assert!(!config.is_leader());
    }
}
