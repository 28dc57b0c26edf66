use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// Host/port pair identifying a node. `ip` also admits the literal
/// `localhost`, which is what the client accepts in `INIT`.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct NodeAddress {
    pub ip: String,
    pub port: u16,
}

impl NodeAddress {
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        NodeAddress { ip: ip.into(), port }
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

impl From<SocketAddr> for NodeAddress {
    fn from(addr: SocketAddr) -> Self {
        NodeAddress {
            ip: addr.ip().to_string(),
            port: addr.port(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("'{0}' is not a valid `ip:port` address")]
pub struct AddressParseError(String);

/// Accepts `a.b.c.d:port` (1-3 digits per octet) or `localhost:port`, the
/// same shapes the interactive client validates before registering a server.
impl FromStr for NodeAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let reject = || AddressParseError(s.to_owned());

        let (host, port_str) = s.rsplit_once(':').ok_or_else(reject)?;
        if !host_is_valid(host) {
            return Err(reject());
        }
        if port_str.is_empty() || port_str.len() > 5 || !all_digits(port_str) {
            return Err(reject());
        }
        let port: u16 = port_str.parse().map_err(|_| reject())?;

        Ok(NodeAddress::new(host, port))
    }
}

fn host_is_valid(host: &str) -> bool {
    if host == "localhost" {
        return true;
    }
    let mut octets = 0;
    for octet in host.split('.') {
        if octet.is_empty() || octet.len() > 3 || !all_digits(octet) {
            return false;
        }
        octets += 1;
    }
    octets == 4
}

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}
