use std::net::IpAddr;

use config_tree_core::ConfigNode;

use super::{config_leaf, parse_field, required};
use crate::codec::{parse_as, AfiSafi, CodecError, IpPrefix};

/// `bgp/global`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BgpGlobal {
    /// Local AS. `None` when the leaf is absent; there is no empty form.
    pub as_number: Option<u32>,
    pub router_id: Option<String>,
    /// Globally enabled address families, in document order.
    pub afi_safis: Vec<AfiSafi>,
}

impl BgpGlobal {
    /// Parse a `global` container.
    pub fn from_node(global: &ConfigNode) -> Result<Self, CodecError> {
        let as_number = config_leaf(global, "as").map(parse_as).transpose()?;
        Ok(Self {
            as_number,
            router_id: config_leaf(global, "router-id").map(str::to_string),
            afi_safis: parse_afi_safis(global)?,
        })
    }

    pub fn to_node(&self) -> ConfigNode {
        let config = ConfigNode::new("config")
            .with_opt_leaf("as", self.as_number)
            .with_opt_leaf("router-id", self.router_id.as_deref());
        let mut node = ConfigNode::new("global").with_child(config);
        if !self.afi_safis.is_empty() {
            node = node.with_child(render_afi_safis(&self.afi_safis));
        }
        node
    }
}

/// `peer-type` of a neighbor: same AS or a different one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerType {
    Internal,
    External,
}

impl PeerType {
    /// Accepts the bare identity or a module-prefixed one (`oc-bgp-types:INTERNAL`).
    pub fn from_canonical(value: &str) -> Result<Self, CodecError> {
        let identity = value.rsplit(':').next().unwrap_or(value);
        match identity {
            "INTERNAL" => Ok(PeerType::Internal),
            "EXTERNAL" => Ok(PeerType::External),
            _ => Err(CodecError::Field {
                field: "peer-type",
                value: value.to_string(),
            }),
        }
    }

    pub fn canonical(self) -> &'static str {
        match self {
            PeerType::Internal => "INTERNAL",
            PeerType::External => "EXTERNAL",
        }
    }
}

/// `bgp/neighbors/neighbor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighbor {
    pub address: IpAddr,
    pub peer_as: Option<u32>,
    pub peer_group: Option<String>,
    pub peer_type: Option<PeerType>,
    pub description: Option<String>,
    /// `None` means the default, enabled.
    pub enabled: Option<bool>,
    /// Plain text, or `Encrypted[...]` for a device-encrypted value.
    pub auth_password: Option<String>,
    /// Neighbor-specific address families; empty means "inherit the global ones".
    pub afi_safis: Vec<AfiSafi>,
    pub import_policy: Option<String>,
    pub export_policy: Option<String>,
}

impl Neighbor {
    pub fn new(address: IpAddr) -> Self {
        Self {
            address,
            peer_as: None,
            peer_group: None,
            peer_type: None,
            description: None,
            enabled: None,
            auth_password: None,
            afi_safis: Vec::new(),
            import_policy: None,
            export_policy: None,
        }
    }

    pub fn from_node(node: &ConfigNode) -> Result<Self, CodecError> {
        let address = required(node, "neighbor-address")?;
        let address = address
            .parse::<IpAddr>()
            .map_err(|_| CodecError::Address(address.to_string()))?;
        let policy = node.descend(&["apply-policy", "config"]);
        let first_policy = |leaf: &str| {
            policy
                .and_then(|config| config.leaf_text(leaf))
                .map(str::to_string)
        };
        Ok(Self {
            address,
            peer_as: config_leaf(node, "peer-as").map(parse_as).transpose()?,
            peer_group: config_leaf(node, "peer-group").map(str::to_string),
            peer_type: config_leaf(node, "peer-type")
                .map(PeerType::from_canonical)
                .transpose()?,
            description: config_leaf(node, "description").map(str::to_string),
            enabled: parse_field::<bool>(node, "enabled")?,
            auth_password: config_leaf(node, "auth-password").map(str::to_string),
            afi_safis: parse_afi_safis(node)?,
            import_policy: first_policy("import-policy"),
            export_policy: first_policy("export-policy"),
        })
    }

    pub fn to_node(&self) -> ConfigNode {
        let address = self.address.to_string();
        let config = ConfigNode::new("config")
            .with_leaf("neighbor-address", address.as_str())
            .with_opt_leaf("peer-as", self.peer_as)
            .with_opt_leaf("peer-group", self.peer_group.as_deref())
            .with_opt_leaf("peer-type", self.peer_type.map(PeerType::canonical))
            .with_opt_leaf("description", self.description.as_deref())
            .with_opt_leaf("enabled", self.enabled)
            .with_opt_leaf("auth-password", self.auth_password.as_deref());
        let mut node = ConfigNode::new("neighbor")
            .with_leaf("neighbor-address", address)
            .with_child(config);
        if !self.afi_safis.is_empty() {
            node = node.with_child(render_afi_safis(&self.afi_safis));
        }
        if self.import_policy.is_some() || self.export_policy.is_some() {
            let config = ConfigNode::new("config")
                .with_opt_leaf("import-policy", self.import_policy.as_deref())
                .with_opt_leaf("export-policy", self.export_policy.as_deref());
            node = node.with_child(ConfigNode::new("apply-policy").with_child(config));
        }
        node
    }

    /// Address families to configure: the neighbor's own, else the global ones.
    pub fn effective_afi_safis(&self, global: &BgpGlobal) -> Vec<AfiSafi> {
        if self.afi_safis.is_empty() {
            global.afi_safis.clone()
        } else {
            self.afi_safis.clone()
        }
    }
}

/// `local-aggregates/aggregate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub prefix: IpPrefix,
    /// Suppress the more specific routes. Only some devices report it.
    pub summary_only: Option<bool>,
    /// `apply-policy/config/import-policy` entries, in order.
    pub policies: Vec<String>,
}

impl Aggregate {
    pub fn new(prefix: IpPrefix) -> Self {
        Self {
            prefix,
            summary_only: None,
            policies: Vec::new(),
        }
    }

    pub fn from_node(node: &ConfigNode) -> Result<Self, CodecError> {
        let policies = node
            .descend(&["apply-policy", "config"])
            .map(|config| {
                config
                    .get_children("import-policy")
                    .into_iter()
                    .filter_map(|policy| policy.text.clone())
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            prefix: IpPrefix::parse(required(node, "prefix")?)?,
            summary_only: parse_field::<bool>(node, "summary-only")?,
            policies,
        })
    }

    pub fn to_node(&self) -> ConfigNode {
        let prefix = self.prefix.to_string();
        let config = ConfigNode::new("config")
            .with_leaf("prefix", prefix.as_str())
            .with_opt_leaf("summary-only", self.summary_only);
        let mut node = ConfigNode::new("aggregate")
            .with_leaf("prefix", prefix)
            .with_child(config);
        if !self.policies.is_empty() {
            let config = self
                .policies
                .iter()
                .fold(ConfigNode::new("config"), |config, policy| {
                    config.with_leaf("import-policy", policy.as_str())
                });
            node = node.with_child(ConfigNode::new("apply-policy").with_child(config));
        }
        node
    }
}

/// One address family of a peer group with its policies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerGroupAf {
    pub afi_safi: AfiSafi,
    pub import_policy: Option<String>,
    pub export_policy: Option<String>,
}

/// `bgp/peer-groups/peer-group`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerGroup {
    pub name: String,
    pub afi_safis: Vec<PeerGroupAf>,
}

impl PeerGroup {
    pub fn from_node(node: &ConfigNode) -> Result<Self, CodecError> {
        let afi_safis = node
            .get_child("afi-safis")
            .map(|list| list.get_children("afi-safi"))
            .unwrap_or_default()
            .into_iter()
            .map(|entry| {
                let policy = |leaf: &str| {
                    entry
                        .get_text(&["apply-policy", "config", leaf])
                        .map(str::to_string)
                };
                Ok::<_, CodecError>(PeerGroupAf {
                    afi_safi: AfiSafi::from_canonical(required(entry, "afi-safi-name")?)?,
                    import_policy: policy("import-policy"),
                    export_policy: policy("export-policy"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: required(node, "peer-group-name")?.to_string(),
            afi_safis,
        })
    }

    pub fn to_node(&self) -> ConfigNode {
        let node = ConfigNode::new("peer-group")
            .with_leaf("peer-group-name", self.name.as_str())
            .with_child(ConfigNode::new("config").with_leaf("peer-group-name", self.name.as_str()));
        if self.afi_safis.is_empty() {
            return node;
        }
        let list = self.afi_safis.iter().fold(ConfigNode::new("afi-safis"), |list, af| {
            let mut entry = ConfigNode::new("afi-safi")
                .with_leaf("afi-safi-name", af.afi_safi.canonical())
                .with_child(
                    ConfigNode::new("config").with_leaf("afi-safi-name", af.afi_safi.canonical()),
                );
            if af.import_policy.is_some() || af.export_policy.is_some() {
                let config = ConfigNode::new("config")
                    .with_opt_leaf("import-policy", af.import_policy.as_deref())
                    .with_opt_leaf("export-policy", af.export_policy.as_deref());
                entry = entry.with_child(ConfigNode::new("apply-policy").with_child(config));
            }
            list.with_child(entry)
        });
        node.with_child(list)
    }
}

/// Canonical `afi-safi` list entry carrying only its name.
pub fn afi_safi_node(af: AfiSafi) -> ConfigNode {
    ConfigNode::new("afi-safi")
        .with_leaf("afi-safi-name", af.canonical())
        .with_child(ConfigNode::new("config").with_leaf("afi-safi-name", af.canonical()))
}

fn parse_afi_safis(node: &ConfigNode) -> Result<Vec<AfiSafi>, CodecError> {
    let Some(list) = node.get_child("afi-safis") else {
        return Ok(Vec::new());
    };
    list.get_children("afi-safi")
        .into_iter()
        .map(|entry| AfiSafi::from_canonical(required(entry, "afi-safi-name")?))
        .collect()
}

fn render_afi_safis(afi_safis: &[AfiSafi]) -> ConfigNode {
    afi_safis
        .iter()
        .fold(ConfigNode::new("afi-safis"), |list, af| list.with_child(afi_safi_node(*af)))
}

#[cfg(test)]
mod tests {
    use config_tree_core::parse;

    use super::{Aggregate, BgpGlobal, Neighbor, PeerGroup, PeerType};
    use crate::codec::{AfiSafi, CodecError};

    #[test]
    fn neighbor_parses_and_renders_owned_fields() {
        let node = parse(
            br#"<neighbor>
  <neighbor-address>10.1.0.4</neighbor-address>
  <config>
    <neighbor-address>10.1.0.4</neighbor-address>
    <peer-as>123</peer-as>
    <description>upstream</description>
    <enabled>false</enabled>
    <auth-password>s3cret</auth-password>
  </config>
  <afi-safis><afi-safi><afi-safi-name>IPV4_UNICAST</afi-safi-name></afi-safi></afi-safis>
  <apply-policy><config><export-policy>nexthopself</export-policy></config></apply-policy>
</neighbor>"#,
        )
        .expect("parse");

        let neighbor = Neighbor::from_node(&node).expect("neighbor");
        assert_eq!(neighbor.peer_as, Some(123));
        assert_eq!(neighbor.enabled, Some(false));
        assert_eq!(neighbor.afi_safis, vec![AfiSafi::Ipv4Unicast]);
        assert_eq!(neighbor.export_policy.as_deref(), Some("nexthopself"));

        let rendered = Neighbor::from_node(&neighbor.to_node()).expect("reparse");
        assert_eq!(rendered, neighbor);
    }

    #[test]
    fn neighbor_requires_valid_address() {
        let node = parse(b"<neighbor><neighbor-address>not-an-ip</neighbor-address></neighbor>")
            .expect("parse");
        assert_eq!(
            Neighbor::from_node(&node),
            Err(CodecError::Address("not-an-ip".to_string()))
        );
    }

    #[test]
    fn global_accepts_asdot_and_inherits_afs() {
        let node = parse(
            br#"<global><config><as>1.10</as></config>
  <afi-safis><afi-safi><afi-safi-name>IPV6_UNICAST</afi-safi-name></afi-safi></afi-safis></global>"#,
        )
        .expect("parse");
        let global = BgpGlobal::from_node(&node).expect("global");
        assert_eq!(global.as_number, Some(65_546));

        let neighbor = Neighbor::new("10.0.0.1".parse().expect("ip"));
        assert_eq!(neighbor.effective_afi_safis(&global), vec![AfiSafi::Ipv6Unicast]);
    }

    #[test]
    fn aggregate_reads_prefix_from_key_or_config() {
        let keyed = parse(b"<aggregate><prefix>10.0.0.0/8</prefix></aggregate>").expect("parse");
        let aggregate = Aggregate::from_node(&keyed).expect("aggregate");
        assert_eq!(aggregate.prefix.to_string(), "10.0.0.0/8");
        assert_eq!(Aggregate::from_node(&aggregate.to_node()), Ok(aggregate));
    }

    #[test]
    fn peer_type_accepts_prefixed_identity() {
        assert_eq!(
            PeerType::from_canonical("oc-bgp-types:EXTERNAL"),
            Ok(PeerType::External)
        );
        assert_eq!(PeerType::from_canonical("INTERNAL"), Ok(PeerType::Internal));
        assert!(PeerType::from_canonical("CONFEDERATION").is_err());

        let node = parse(
            br#"<neighbor><neighbor-address>10.0.0.1</neighbor-address>
  <config><peer-type>openconfig-bgp-types:INTERNAL</peer-type></config></neighbor>"#,
        )
        .expect("parse");
        let neighbor = Neighbor::from_node(&node).expect("neighbor");
        assert_eq!(neighbor.peer_type, Some(PeerType::Internal));
        assert_eq!(
            neighbor.to_node().get_text(&["config", "peer-type"]),
            Some("INTERNAL")
        );
    }

    #[test]
    fn peer_group_keeps_policies_per_family() {
        let node = parse(
            br#"<peer-group><peer-group-name>RR</peer-group-name>
  <afi-safis>
    <afi-safi><afi-safi-name>IPV4_UNICAST</afi-safi-name>
      <apply-policy><config><import-policy>IN</import-policy></config></apply-policy></afi-safi>
    <afi-safi><afi-safi-name>IPV6_UNICAST</afi-safi-name></afi-safi>
  </afi-safis>
</peer-group>"#,
        )
        .expect("parse");
        let group = PeerGroup::from_node(&node).expect("peer group");
        assert_eq!(group.name, "RR");
        assert_eq!(group.afi_safis.len(), 2);
        assert_eq!(group.afi_safis[0].import_policy.as_deref(), Some("IN"));
        assert_eq!(group.afi_safis[1].import_policy, None);
        assert_eq!(PeerGroup::from_node(&group.to_node()), Ok(group));
    }
}
