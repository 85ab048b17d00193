//! IOS-XR style mappings.

mod aggregate;
mod bgp_global;
mod neighbor;
mod neighbor_af;
mod next_hop;
mod ospf;
mod peer_group;
mod protocol;
mod route_target;
mod static_route;

pub use aggregate::XrAggregate;
pub use bgp_global::XrBgpGlobal;
pub use neighbor::{neighbor_handler, XrNeighbor};
pub use neighbor_af::XrNeighborAfiSafi;
pub use next_hop::XrNextHop;
pub use ospf::{XrArea, XrAreaInterface, XrMaxMetric, XrOspfProtocol};
pub use peer_group::XrPeerGroup;
pub use protocol::protocol_handler;
pub use route_target::XrRouteTargetSet;
pub use static_route::XrStaticRoute;

use config_tree_core::{ConfigNode, TreePath};

use crate::codec::as_from_dot;
use crate::context::ReadContext;
use crate::error::Result;
use crate::underlay::{xr, Scope};

/// The scope node (`default-vrf` or `vrfs/vrf`) of one `four-byte-as` subtree, with the AS
/// the subtree is addressed by.
#[derive(Debug, Clone)]
pub(crate) struct ScopedAs {
    pub as_number: u32,
    pub node: ConfigNode,
}

impl ScopedAs {
    /// Container holding router-id and global address families.
    pub fn global(&self, scope: Scope<'_>) -> Option<&ConfigNode> {
        match scope {
            Scope::Default => self.node.get_child("global"),
            Scope::Vrf(_) => self.node.get_child("vrf-global"),
        }
    }

    pub fn neighbors(&self, scope: Scope<'_>) -> Vec<&ConfigNode> {
        let (list, _, _) = xr::neighbor_tags(scope);
        match scope {
            Scope::Default => super::children_at(&self.node, &["bgp-entity", "neighbors"], list),
            Scope::Vrf(_) => super::children_at(&self.node, &["vrf-neighbors"], list),
        }
    }

    /// Global address-family entries of the scope.
    pub fn global_afs(&self, scope: Scope<'_>) -> Vec<&ConfigNode> {
        let (container, entry) = xr::global_af_tags(scope);
        self.global(scope)
            .map(|global| super::children_at(global, &[container], entry))
            .unwrap_or_default()
    }
}

/// AS subtrees of a BGP instance node, in document order.
pub(crate) fn as_subtrees(instance: &ConfigNode) -> Vec<(u32, &ConfigNode)> {
    let mut out = Vec::new();
    for instance_as in instance.get_children("instance-as") {
        let Some(xx) = instance_as.leaf_text("as").and_then(|v| v.parse::<u32>().ok()) else {
            continue;
        };
        for four_byte in instance_as.get_children("four-byte-as") {
            let yy = four_byte.leaf_text("as").and_then(|v| v.parse::<u32>().ok());
            if let Some(as_number) = yy.and_then(|yy| as_from_dot(xx, yy).ok()) {
                out.push((as_number, four_byte));
            }
        }
    }
    out
}

/// Scope node of `four_byte` for `scope`, if configured.
pub(crate) fn scope_node<'a>(four_byte: &'a ConfigNode, scope: Scope<'_>) -> Option<&'a ConfigNode> {
    match scope {
        Scope::Default => four_byte.get_child("default-vrf"),
        Scope::Vrf(name) => super::children_at(four_byte, &["vrfs"], "vrf")
            .into_iter()
            .find(|vrf| vrf.leaf_text("vrf-name") == Some(name)),
    }
}

/// First AS subtree of `instance` that configures `scope`.
pub(crate) fn locate_scope(
    ctx: &ReadContext<'_>,
    canonical: &TreePath,
    instance: &str,
    scope: Scope<'_>,
) -> Result<Option<ScopedAs>> {
    let Some(node) = ctx.read(canonical, &xr::bgp_instance(instance))? else {
        return Ok(None);
    };
    Ok(as_subtrees(&node).into_iter().find_map(|(as_number, four_byte)| {
        scope_node(four_byte, scope).map(|node| ScopedAs {
            as_number,
            node: node.clone(),
        })
    }))
}
