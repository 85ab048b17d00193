//! Junos style mappings: BGP neighbors with their protocol entry, and VRF aggregate routes.

mod aggregate;
mod neighbor;
mod protocol;

pub use aggregate::JunosAggregate;
pub use neighbor::JunosNeighbor;
pub use protocol::protocol_handler;
