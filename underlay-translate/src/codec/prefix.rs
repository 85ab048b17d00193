use std::fmt::{self, Display, Formatter};
use std::net::IpAddr;

use super::CodecError;

/// An IP prefix, split into network address and length as underlay keys need it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpPrefix {
    pub address: IpAddr,
    pub length: u8,
}

impl IpPrefix {
    pub fn parse(text: &str) -> Result<Self, CodecError> {
        let text = text.trim();
        let invalid = || CodecError::Prefix(text.to_string());
        let (address, length) = text.split_once('/').ok_or_else(invalid)?;
        let address = address.parse::<IpAddr>().map_err(|_| invalid())?;
        let length = length.parse::<u8>().map_err(|_| invalid())?;
        Self::from_parts(address, length).map_err(|_| invalid())
    }

    pub fn from_parts(address: IpAddr, length: u8) -> Result<Self, CodecError> {
        let max = if address.is_ipv4() { 32 } else { 128 };
        if length > max {
            return Err(CodecError::Prefix(format!("{address}/{length}")));
        }
        Ok(Self { address, length })
    }

    /// Decode underlay `(address, length)` leaves.
    pub fn from_leaves(address: &str, length: &str) -> Result<Self, CodecError> {
        let parsed = address
            .trim()
            .parse::<IpAddr>()
            .map_err(|_| CodecError::Address(address.to_string()))?;
        let length = length
            .trim()
            .parse::<u8>()
            .map_err(|_| CodecError::Prefix(format!("{address}/{length}")))?;
        Self::from_parts(parsed, length)
    }

    pub fn is_ipv4(&self) -> bool {
        self.address.is_ipv4()
    }
}

impl Display for IpPrefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.length)
    }
}
