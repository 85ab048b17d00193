use std::net::IpAddr;

use config_tree_core::ConfigNode;

use super::{config_leaf, parse_field, required};
use crate::codec::{CodecError, IpPrefix, NextHopKey};

/// `static-routes/static`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticRoute {
    pub prefix: IpPrefix,
}

impl StaticRoute {
    pub fn from_node(node: &ConfigNode) -> Result<Self, CodecError> {
        Ok(Self {
            prefix: IpPrefix::parse(required(node, "prefix")?)?,
        })
    }

    pub fn to_node(&self) -> ConfigNode {
        let prefix = self.prefix.to_string();
        ConfigNode::new("static")
            .with_leaf("prefix", prefix.as_str())
            .with_child(ConfigNode::new("config").with_leaf("prefix", prefix))
    }
}

/// `static/next-hops/next-hop`. The index is the synthetic [`NextHopKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextHop {
    pub index: NextHopKey,
    /// Load metric; absent when the device reports none.
    pub metric: Option<u32>,
}

impl NextHop {
    pub fn from_node(node: &ConfigNode) -> Result<Self, CodecError> {
        let index = NextHopKey::decode(required(node, "index")?);
        if let Some(next_hop) = config_leaf(node, "next-hop") {
            let parsed = next_hop
                .parse::<IpAddr>()
                .map_err(|_| CodecError::Address(next_hop.to_string()))?;
            if index.address() != Some(parsed) {
                return Err(CodecError::Field {
                    field: "next-hop",
                    value: next_hop.to_string(),
                });
            }
        }
        Ok(Self {
            index,
            metric: parse_field::<u32>(node, "metric")?,
        })
    }

    pub fn to_node(&self) -> ConfigNode {
        let index = self.index.to_string();
        let config = ConfigNode::new("config")
            .with_leaf("index", index.as_str())
            .with_opt_leaf("next-hop", self.index.address())
            .with_opt_leaf("interface", self.index.interface())
            .with_opt_leaf("metric", self.metric);
        ConfigNode::new("next-hop")
            .with_leaf("index", index)
            .with_child(config)
    }
}
