use std::fmt::{self, Display, Formatter};
use std::net::Ipv4Addr;

use super::CodecError;

/// OSPF area identifier in either of its two forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaId {
    Number(u32),
    Dotted(Ipv4Addr),
}

impl AreaId {
    pub fn parse(text: &str) -> Result<Self, CodecError> {
        let text = text.trim();
        if let Ok(number) = text.parse::<u32>() {
            return Ok(AreaId::Number(number));
        }
        text.parse::<Ipv4Addr>()
            .map(AreaId::Dotted)
            .map_err(|_| CodecError::Area(text.to_string()))
    }
}

impl Display for AreaId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AreaId::Number(number) => write!(f, "{number}"),
            AreaId::Dotted(addr) => write!(f, "{addr}"),
        }
    }
}
