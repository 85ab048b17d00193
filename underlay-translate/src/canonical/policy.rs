use config_tree_core::ConfigNode;

use super::required;
use crate::codec::CodecError;

const IMPORT_SUFFIX: &str = "-route-target-import-set";
const EXPORT_SUFFIX: &str = "-route-target-export-set";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTargetDirection {
    Import,
    Export,
}

impl RouteTargetDirection {
    /// Underlay container holding route targets of this direction.
    pub fn underlay_container(self) -> &'static str {
        match self {
            RouteTargetDirection::Import => "import-route-targets",
            RouteTargetDirection::Export => "export-route-targets",
        }
    }
}

/// `ext-community-sets/ext-community-set`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtCommunitySet {
    pub name: String,
    /// Members as written, in document order.
    pub members: Vec<String>,
}

impl ExtCommunitySet {
    pub fn from_node(node: &ConfigNode) -> Result<Self, CodecError> {
        let name = required(node, "ext-community-set-name")?.to_string();
        let members = node
            .get_child("config")
            .map(|config| {
                config
                    .get_children("ext-community-member")
                    .into_iter()
                    .filter_map(|member| member.text.as_deref())
                    .map(|member| member.trim().to_string())
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self { name, members })
    }

    pub fn to_node(&self) -> ConfigNode {
        let config = self.members.iter().fold(
            ConfigNode::new("config").with_leaf("ext-community-set-name", self.name.as_str()),
            |config, member| config.with_leaf("ext-community-member", member.as_str()),
        );
        ConfigNode::new("ext-community-set")
            .with_leaf("ext-community-set-name", self.name.as_str())
            .with_child(config)
    }

    /// VRF and direction encoded in the set name, if it follows the route-target naming.
    pub fn route_target_scope(&self) -> Option<(&str, RouteTargetDirection)> {
        route_target_scope(&self.name)
    }

    pub fn set_name(vrf: &str, direction: RouteTargetDirection) -> String {
        match direction {
            RouteTargetDirection::Import => format!("{vrf}{IMPORT_SUFFIX}"),
            RouteTargetDirection::Export => format!("{vrf}{EXPORT_SUFFIX}"),
        }
    }
}

pub fn route_target_scope(name: &str) -> Option<(&str, RouteTargetDirection)> {
    let (vrf, direction) = if let Some(vrf) = name.strip_suffix(IMPORT_SUFFIX) {
        (vrf, RouteTargetDirection::Import)
    } else {
        (name.strip_suffix(EXPORT_SUFFIX)?, RouteTargetDirection::Export)
    };
    (!vrf.is_empty()).then_some((vrf, direction))
}

#[cfg(test)]
mod tests {
    use super::{route_target_scope, ExtCommunitySet, RouteTargetDirection};

    #[test]
    fn set_names_encode_vrf_and_direction() {
        assert_eq!(
            route_target_scope("CUST-route-target-import-set"),
            Some(("CUST", RouteTargetDirection::Import))
        );
        assert_eq!(
            route_target_scope("CUST-route-target-export-set"),
            Some(("CUST", RouteTargetDirection::Export))
        );
        assert_eq!(route_target_scope("-route-target-export-set"), None);
        assert_eq!(route_target_scope("customers"), None);
        assert_eq!(
            ExtCommunitySet::set_name("CUST", RouteTargetDirection::Export),
            "CUST-route-target-export-set"
        );
    }

    #[test]
    fn members_survive_rendering() {
        let set = ExtCommunitySet {
            name: "CUST-route-target-import-set".to_string(),
            members: vec!["65000:100".to_string(), "65000:200".to_string()],
        };
        assert_eq!(ExtCommunitySet::from_node(&set.to_node()), Ok(set));
    }
}
