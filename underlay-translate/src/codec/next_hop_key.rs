use std::fmt::{self, Display, Formatter};
use std::net::IpAddr;

/// Synthetic canonical index of a static-route next hop.
///
/// The underlay keeps next hops in three collections; the canonical index is the interface
/// name, `"<address> <interface>"`, or `"<address>"` respectively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NextHopKey {
    Interface(String),
    InterfaceAddress { address: IpAddr, interface: String },
    Address(IpAddr),
}

impl NextHopKey {
    /// Build the key from underlay fields, tolerating an absent interface.
    pub fn from_parts(address: IpAddr, interface: Option<&str>) -> Self {
        match interface {
            Some(interface) => NextHopKey::InterfaceAddress {
                address,
                interface: interface.to_string(),
            },
            None => NextHopKey::Address(address),
        }
    }

    /// Decode a canonical index. Text whose first segment is not an address is an
    /// interface name.
    pub fn decode(index: &str) -> Self {
        let index = index.trim();
        let (first, rest) = match index.split_once(' ') {
            Some((first, rest)) => (first, Some(rest.trim()).filter(|r| !r.is_empty())),
            None => (index, None),
        };
        match first.parse::<IpAddr>() {
            Ok(address) => Self::from_parts(address, rest),
            Err(_) => NextHopKey::Interface(index.to_string()),
        }
    }

    pub fn address(&self) -> Option<IpAddr> {
        match self {
            NextHopKey::Interface(_) => None,
            NextHopKey::InterfaceAddress { address, .. } | NextHopKey::Address(address) => {
                Some(*address)
            }
        }
    }

    pub fn interface(&self) -> Option<&str> {
        match self {
            NextHopKey::Interface(interface) | NextHopKey::InterfaceAddress { interface, .. } => {
                Some(interface)
            }
            NextHopKey::Address(_) => None,
        }
    }
}

impl Display for NextHopKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            NextHopKey::Interface(interface) => write!(f, "{interface}"),
            NextHopKey::InterfaceAddress { address, interface } => {
                write!(f, "{address} {interface}")
            }
            NextHopKey::Address(address) => write!(f, "{address}"),
        }
    }
}
