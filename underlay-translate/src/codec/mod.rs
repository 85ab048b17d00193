//! Bidirectional mapping between canonical identity values and underlay key shapes.

mod afi_safi;
mod area;
mod as_number;
mod next_hop_key;
mod password;
mod prefix;
mod route_target;

use thiserror::Error;

pub use afi_safi::AfiSafi;
pub use area::AreaId;
pub use as_number::{as_from_dot, as_to_dot, parse_as, AsDot};
pub use next_hop_key::NextHopKey;
pub use password::{password_from_underlay, password_to_underlay, ENCRYPTED_PATTERN, PLAIN_PREFIX};
pub use prefix::IpPrefix;
pub use route_target::RouteTarget;

/// A value does not decode in the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("invalid AS number `{0}`")]
    AsNumber(String),
    #[error("AS half {0} does not fit 16 bits")]
    AsHalf(u32),
    #[error("invalid OSPF area identifier `{0}`")]
    Area(String),
    #[error("invalid IP prefix `{0}`")]
    Prefix(String),
    #[error("invalid IP address `{0}`")]
    Address(String),
    #[error("invalid route target `{0}`")]
    RouteTarget(String),
    #[error("unsupported AFI/SAFI `{0}`")]
    AfiSafi(String),
    #[error("missing required field `{0}`")]
    Missing(&'static str),
    #[error("invalid {field} value `{value}`")]
    Field { field: &'static str, value: String },
}
