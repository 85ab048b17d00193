use config_tree_core::{ConfigNode, Key, TreePath};

use super::locate_scope;
use crate::canonical::{self, PeerGroup, PeerGroupAf};
use crate::codec::AfiSafi;
use crate::context::{ReadContext, WriteContext};
use crate::error::{CodecResultExt, Result, StoreResultExt, TranslateError};
use crate::handler::{dedup_keys, key_only_node, ElementWriter, ListReader};
use crate::mapping::{children_at, Settings};
use crate::underlay::{xr, Scope};
use crate::validate;

/// `bgp/peer-groups/peer-group` onto `bgp-entity/neighbor-groups/neighbor-group`.
///
/// Neighbor groups exist only in the default instance; writing one under a VRF is rejected.
#[derive(Debug, Clone)]
pub struct XrPeerGroup {
    settings: Settings,
}

impl XrPeerGroup {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// AS of the owning BGP protocol, after checking instance and network instance.
    fn as_number(&self, path: &TreePath, ctx: &WriteContext<'_>, is_delete: bool) -> Result<u32> {
        let (ni, protocol) = canonical::protocol_scope(path)?;
        validate::bgp_instance_name(path, protocol, &self.settings.bgp_instance)?;
        if let Scope::Vrf(vrf) = self.settings.scope(path)? {
            return Err(TranslateError::validation(
                path,
                format!("peer groups are not supported in network instance `{vrf}`"),
            ));
        }
        let (_, as_number) = validate::bgp_global(ctx, path, ni, protocol, is_delete)?;
        Ok(as_number)
    }

    fn groups(&self, parent: &TreePath, ctx: &ReadContext<'_>) -> Result<Vec<ConfigNode>> {
        let (_, protocol) = canonical::protocol_scope(parent)?;
        if protocol != self.settings.bgp_instance || self.settings.scope(parent)? != Scope::Default {
            return Ok(Vec::new());
        }
        let Some(found) = locate_scope(ctx, parent, protocol, Scope::Default)? else {
            return Ok(Vec::new());
        };
        Ok(children_at(&found.node, &["bgp-entity", "neighbor-groups"], "neighbor-group")
            .into_iter()
            .cloned()
            .collect())
    }
}

fn render(group: &PeerGroup) -> ConfigNode {
    let node = ConfigNode::new("neighbor-group").with_child(ConfigNode::new("create"));
    if group.afi_safis.is_empty() {
        return node;
    }
    let afs = group
        .afi_safis
        .iter()
        .fold(ConfigNode::new("neighbor-group-afs"), |afs, af| {
            afs.with_child(
                ConfigNode::new("neighbor-group-af")
                    .with_leaf("af-name", af.afi_safi.underlay())
                    .with_leaf("activate", "true")
                    .with_opt_leaf("route-policy-in", af.import_policy.as_deref())
                    .with_opt_leaf("route-policy-out", af.export_policy.as_deref()),
            )
        });
    node.with_child(afs)
}

fn parse_underlay(name: &str, node: &ConfigNode) -> PeerGroup {
    let afi_safis = children_at(node, &["neighbor-group-afs"], "neighbor-group-af")
        .into_iter()
        .filter_map(|af| {
            Some(PeerGroupAf {
                afi_safi: AfiSafi::from_underlay(af.leaf_text("af-name")?).ok()?,
                import_policy: af.leaf_text("route-policy-in").map(str::to_string),
                export_policy: af.leaf_text("route-policy-out").map(str::to_string),
            })
        })
        .collect();
    PeerGroup {
        name: name.to_string(),
        afi_safis,
    }
}

impl ListReader for XrPeerGroup {
    fn list(&self) -> &'static str {
        "peer-group"
    }

    fn location(&self) -> &'static [&'static str] {
        &["bgp", "peer-groups"]
    }

    fn enumerate(&self, parent: &TreePath, ctx: &ReadContext<'_>) -> Result<Vec<Key>> {
        Ok(dedup_keys(self.groups(parent, ctx)?.iter().filter_map(|group| {
            group
                .leaf_text("neighbor-group-name")
                .map(|name| Key::single("peer-group-name", name))
        })))
    }

    fn hydrate(&self, path: &TreePath, ctx: &ReadContext<'_>) -> Result<ConfigNode> {
        let key = path.key_of("peer-group")?;
        let name = path.key_value("peer-group", "peer-group-name")?;
        let found = self
            .groups(&path.parent(), ctx)?
            .into_iter()
            .find(|group| group.leaf_text("neighbor-group-name") == Some(name));
        Ok(match found {
            Some(node) => parse_underlay(name, &node).to_node(),
            None => key_only_node("peer-group", key),
        })
    }
}

impl ElementWriter for XrPeerGroup {
    fn write(&self, path: &TreePath, after: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        let as_number = self.as_number(path, ctx, false)?;
        let group = PeerGroup::from_node(after).or_invalid(path)?;
        ctx.store
            .merge(
                &xr::neighbor_group(&self.settings.bgp_instance, as_number, &group.name),
                render(&group),
            )
            .or_write_failed(path)
    }

    /// Families and policies the group dropped are removed; other group settings stay.
    fn update(
        &self,
        path: &TreePath,
        before: &ConfigNode,
        after: &ConfigNode,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let as_number = self.as_number(path, ctx, false)?;
        let old = PeerGroup::from_node(before).or_invalid(path)?;
        let new = PeerGroup::from_node(after).or_invalid(path)?;
        ctx.store
            .safe_merge(
                &xr::neighbor_group(&self.settings.bgp_instance, as_number, &new.name),
                Some(&render(&old)),
                render(&new),
            )
            .or_write_failed(path)
    }

    fn delete(&self, path: &TreePath, before: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        let as_number = self.as_number(path, ctx, true)?;
        let group = PeerGroup::from_node(before).or_invalid(path)?;
        ctx.store
            .safe_delete(&xr::neighbor_group(&self.settings.bgp_instance, as_number, &group.name))
            .or_write_failed(path)
    }
}
