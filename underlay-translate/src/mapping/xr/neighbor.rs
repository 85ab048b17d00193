use config_tree_core::{ConfigNode, Key, TreePath};

use super::{as_subtrees, locate_scope, scope_node, ScopedAs};
use crate::canonical::{self, InstanceType, Neighbor};
use crate::checks::NetworkInstanceCheck;
use crate::codec::{
    as_from_dot, as_to_dot, password_from_underlay, password_to_underlay, AfiSafi,
};
use crate::context::{ReadContext, WriteContext};
use crate::dispatch::{CompositeHandler, DispatchEntry, HandlerTag};
use crate::error::{CodecResultExt, Result, StoreResultExt};
use crate::handler::{dedup_keys, key_only_node, ElementWriter, ListReader};
use crate::mapping::Settings;
use crate::underlay::{xr, Scope};
use crate::validate;

/// BGP neighbors of one kind of network instance.
///
/// The default instance maps onto `default-vrf/bgp-entity/neighbors/neighbor`, VRFs onto
/// `vrfs/vrf/vrf-neighbors/vrf-neighbor`. The AS number in the underlay address comes from the
/// canonical BGP global configuration.
#[derive(Debug, Clone)]
pub struct XrNeighbor {
    settings: Settings,
    kind: InstanceType,
}

/// `neighbor` list for both instance kinds.
pub fn neighbor_handler(settings: &Settings) -> CompositeHandler {
    CompositeHandler::new(&["bgp", "neighbors"], "neighbor")
        .with(
            DispatchEntry::new(
                HandlerTag::DefaultInstance,
                NetworkInstanceCheck::default_instance(settings.default_instance.as_str()),
            )
            .reader(XrNeighbor::new(settings.clone(), InstanceType::Default))
            .writer(XrNeighbor::new(settings.clone(), InstanceType::Default)),
        )
        .with(
            DispatchEntry::new(
                HandlerTag::VrfInstance,
                NetworkInstanceCheck::vrf(settings.default_instance.as_str()),
            )
            .reader(XrNeighbor::new(settings.clone(), InstanceType::Vrf))
            .writer(XrNeighbor::new(settings.clone(), InstanceType::Vrf)),
        )
}

impl XrNeighbor {
    pub fn new(settings: Settings, kind: InstanceType) -> Self {
        Self { settings, kind }
    }

    fn scope<'p>(&self, path: &'p TreePath) -> Result<Scope<'p>> {
        let ni = path.key_value(canonical::NETWORK_INSTANCE, canonical::NAME)?;
        Ok(match self.kind {
            InstanceType::Default => Scope::Default,
            InstanceType::Vrf => Scope::Vrf(ni),
        })
    }

    fn underlay_path(&self, scope: Scope<'_>, as_number: u32, neighbor: &Neighbor) -> TreePath {
        xr::neighbor(
            &self.settings.bgp_instance,
            as_number,
            scope,
            &neighbor.address.to_string(),
        )
    }

    /// Underlay neighbor node; `afi_safis` are the effective families.
    fn render(&self, scope: Scope<'_>, neighbor: &Neighbor, afi_safis: &[AfiSafi]) -> ConfigNode {
        let (list, afs_tag, af_tag) = xr::neighbor_tags(scope);
        let mut node = ConfigNode::new(list);
        if let Some(peer_as) = neighbor.peer_as {
            let dot = as_to_dot(peer_as);
            node = node.with_child(
                ConfigNode::new("remote-as")
                    .with_leaf("as-xx", dot.xx.to_string())
                    .with_leaf("as-yy", dot.yy.to_string()),
            );
        }
        node = node
            .with_opt_leaf(
                "password",
                neighbor.auth_password.as_deref().map(password_to_underlay),
            )
            .with_opt_leaf("description", neighbor.description.as_deref())
            .with_opt_leaf("neighbor-group-add-member", neighbor.peer_group.as_deref());
        if neighbor.enabled == Some(false) {
            node = node.with_leaf("shutdown", "true");
        }
        if !afi_safis.is_empty() {
            let afs = afi_safis.iter().fold(ConfigNode::new(afs_tag), |afs, af| {
                afs.with_child(self.render_af(af_tag, *af, neighbor))
            });
            node = node.with_child(afs);
        }
        node
    }

    fn render_af(&self, tag: &str, af: AfiSafi, neighbor: &Neighbor) -> ConfigNode {
        let mut entry = ConfigNode::new(tag)
            .with_leaf("af-name", af.underlay())
            .with_leaf("activate", "true")
            .with_opt_leaf("route-policy-in", neighbor.import_policy.as_deref());
        match neighbor.export_policy.as_deref() {
            Some(policy) if policy == self.settings.nexthop_self_policy => {
                entry = entry.with_leaf("next-hop-self", "true");
            }
            Some(policy) => entry = entry.with_leaf("route-policy-out", policy),
            None => {}
        }
        entry
    }

    /// Canonical neighbor rebuilt from its underlay node.
    fn parse_underlay(&self, address: &str, node: &ConfigNode, scope: Scope<'_>) -> Option<Neighbor> {
        let mut neighbor = Neighbor::new(address.parse().ok()?);
        neighbor.peer_as = node.get_child("remote-as").and_then(|remote| {
            let half = |leaf: &str| remote.leaf_text(leaf).and_then(|v| v.parse::<u32>().ok());
            as_from_dot(half("as-xx").unwrap_or(0), half("as-yy")?).ok()
        });
        neighbor.enabled = Some(node.get_child("shutdown").is_none());
        neighbor.auth_password = node.leaf_text("password").map(password_from_underlay);
        neighbor.description = node.leaf_text("description").map(str::to_string);
        neighbor.peer_group = node.leaf_text("neighbor-group-add-member").map(str::to_string);

        let (_, afs_tag, af_tag) = xr::neighbor_tags(scope);
        let afs = crate::mapping::children_at(node, &[afs_tag], af_tag);
        for af in &afs {
            if let Some(parsed) = af.leaf_text("af-name").and_then(|n| AfiSafi::from_underlay(n).ok()) {
                neighbor.afi_safis.push(parsed);
            }
        }
        if let Some(first) = afs.first() {
            neighbor.import_policy = first.leaf_text("route-policy-in").map(str::to_string);
            neighbor.export_policy = if first.get_child("next-hop-self").is_some() {
                Some(self.settings.nexthop_self_policy.clone())
            } else {
                first.leaf_text("route-policy-out").map(str::to_string)
            };
        }
        Some(neighbor)
    }

    /// Underlay node of the neighbor at `address`, from the first AS subtree holding it.
    pub(super) fn find(&self, path: &TreePath, ctx: &ReadContext<'_>, address: &str) -> Result<Option<ConfigNode>> {
        let scope = self.scope(path)?;
        let Some(instance) = ctx.read(path, &xr::bgp_instance(&self.settings.bgp_instance))? else {
            return Ok(None);
        };
        Ok(as_subtrees(&instance)
            .into_iter()
            .filter_map(|(as_number, four_byte)| {
                scope_node(four_byte, scope).map(|node| ScopedAs {
                    as_number,
                    node: node.clone(),
                })
            })
            .find_map(|scoped| {
                scoped
                    .neighbors(scope)
                    .into_iter()
                    .find(|n| n.leaf_text("neighbor-address") == Some(address))
                    .cloned()
            }))
    }
}

impl ListReader for XrNeighbor {
    fn list(&self) -> &'static str {
        "neighbor"
    }

    fn location(&self) -> &'static [&'static str] {
        &["bgp", "neighbors"]
    }

    fn enumerate(&self, parent: &TreePath, ctx: &ReadContext<'_>) -> Result<Vec<Key>> {
        let (_, protocol) = canonical::protocol_scope(parent)?;
        if protocol != self.settings.bgp_instance {
            return Ok(Vec::new());
        }
        let scope = self.scope(parent)?;
        let Some(found) = locate_scope(ctx, parent, protocol, scope)? else {
            return Ok(Vec::new());
        };
        Ok(dedup_keys(found.neighbors(scope).into_iter().filter_map(|n| {
            n.leaf_text("neighbor-address")
                .map(|address| Key::single("neighbor-address", address))
        })))
    }

    fn hydrate(&self, path: &TreePath, ctx: &ReadContext<'_>) -> Result<ConfigNode> {
        let key = path.key_of("neighbor")?;
        let address = path.key_value("neighbor", "neighbor-address")?;
        let scope = self.scope(path)?;
        let parsed = self
            .find(path, ctx, address)?
            .and_then(|node| self.parse_underlay(address, &node, scope));
        Ok(match parsed {
            Some(neighbor) => neighbor.to_node(),
            None => key_only_node("neighbor", key),
        })
    }
}

impl ElementWriter for XrNeighbor {
    fn write(&self, path: &TreePath, after: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        let (ni, protocol) = canonical::protocol_scope(path)?;
        let scope = self.scope(path)?;
        let (global, as_number) = validate::bgp_global(ctx, path, ni, protocol, false)?;
        let neighbor = Neighbor::from_node(after).or_invalid(path)?;
        let afs = neighbor.effective_afi_safis(&global);
        ctx.store
            .merge(
                &self.underlay_path(scope, as_number, &neighbor),
                self.render(scope, &neighbor, &afs),
            )
            .or_write_failed(path)
    }

    fn update(
        &self,
        path: &TreePath,
        before: &ConfigNode,
        after: &ConfigNode,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let (ni, protocol) = canonical::protocol_scope(path)?;
        let scope = self.scope(path)?;
        let (old_global, _) = validate::bgp_global(ctx, path, ni, protocol, true)?;
        let (new_global, as_number) = validate::bgp_global(ctx, path, ni, protocol, false)?;
        let old = Neighbor::from_node(before).or_invalid(path)?;
        let new = Neighbor::from_node(after).or_invalid(path)?;

        let old_node = self.render(scope, &old, &old.effective_afi_safis(&old_global));
        let new_node = self.render(scope, &new, &new.effective_afi_safis(&new_global));
        ctx.store
            .safe_merge(
                &self.underlay_path(scope, as_number, &new),
                Some(&old_node),
                new_node,
            )
            .or_write_failed(path)
    }

    fn delete(&self, path: &TreePath, before: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        let (ni, protocol) = canonical::protocol_scope(path)?;
        let scope = self.scope(path)?;
        let (_, as_number) = validate::bgp_global(ctx, path, ni, protocol, true)?;
        let neighbor = Neighbor::from_node(before).or_invalid(path)?;
        ctx.store
            .delete(&self.underlay_path(scope, as_number, &neighbor))
            .or_write_failed(path)
    }
}
