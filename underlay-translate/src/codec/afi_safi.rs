use std::fmt::{self, Display, Formatter};

use super::CodecError;

/// Address families the mappings understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AfiSafi {
    Ipv4Unicast,
    Ipv6Unicast,
}

impl AfiSafi {
    /// Canonical identity name, with or without a module prefix.
    pub fn from_canonical(name: &str) -> Result<Self, CodecError> {
        let bare = name.trim().rsplit(':').next().unwrap_or_default();
        match bare {
            "IPV4_UNICAST" => Ok(AfiSafi::Ipv4Unicast),
            "IPV6_UNICAST" => Ok(AfiSafi::Ipv6Unicast),
            _ => Err(CodecError::AfiSafi(name.to_string())),
        }
    }

    pub fn from_underlay(name: &str) -> Result<Self, CodecError> {
        match name.trim() {
            "ipv4-unicast" => Ok(AfiSafi::Ipv4Unicast),
            "ipv6-unicast" => Ok(AfiSafi::Ipv6Unicast),
            other => Err(CodecError::AfiSafi(other.to_string())),
        }
    }

    pub fn canonical(self) -> &'static str {
        match self {
            AfiSafi::Ipv4Unicast => "IPV4_UNICAST",
            AfiSafi::Ipv6Unicast => "IPV6_UNICAST",
        }
    }

    pub fn underlay(self) -> &'static str {
        match self {
            AfiSafi::Ipv4Unicast => "ipv4-unicast",
            AfiSafi::Ipv6Unicast => "ipv6-unicast",
        }
    }

    pub fn is_ipv4(self) -> bool {
        matches!(self, AfiSafi::Ipv4Unicast)
    }
}

impl Display for AfiSafi {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::AfiSafi;

    #[test]
    fn maps_between_schemas() {
        let af = AfiSafi::from_canonical("openconfig-bgp-types:IPV6_UNICAST").expect("af");
        assert_eq!(af, AfiSafi::Ipv6Unicast);
        assert_eq!(af.underlay(), "ipv6-unicast");
        assert_eq!(AfiSafi::from_underlay("ipv4-unicast"), Ok(AfiSafi::Ipv4Unicast));
        assert!(AfiSafi::from_canonical("L2VPN_EVPN").is_err());
    }
}
