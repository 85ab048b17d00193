use config_tree_core::{ConfigNode, Key, TreePath};

use crate::canonical::{NextHop, StaticRoute};
use crate::codec::{IpPrefix, NextHopKey};
use crate::context::{ReadContext, WriteContext};
use crate::error::{CodecResultExt, Result, StoreResultExt};
use crate::handler::{dedup_keys, key_only_node, ElementWriter, ListReader};
use crate::mapping::{children_at, Settings};
use crate::underlay::xr::{self, PrefixTable};

/// `static-routes/static` onto the `vrf-prefix` entries of the unicast and multicast tables.
///
/// A prefix present in both tables is one canonical route.
#[derive(Debug, Clone)]
pub struct XrStaticRoute {
    settings: Settings,
}

impl XrStaticRoute {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

/// Underlay next-hop entry for one canonical next hop.
pub(crate) fn render_next_hop(hop: &NextHop) -> ConfigNode {
    let node = match &hop.index {
        NextHopKey::Interface(interface) => {
            ConfigNode::new(xr::NEXT_HOP_INTERFACE).with_leaf("interface-name", interface.as_str())
        }
        NextHopKey::InterfaceAddress { address, interface } => {
            ConfigNode::new(xr::NEXT_HOP_INTERFACE_ADDRESS)
                .with_leaf("interface-name", interface.as_str())
                .with_leaf("next-hop-address", address.to_string())
        }
        NextHopKey::Address(address) => ConfigNode::new(xr::NEXT_HOP_ADDRESS)
            .with_leaf("next-hop-address", address.to_string()),
    };
    node.with_opt_leaf("load-metric", hop.metric)
}

impl ListReader for XrStaticRoute {
    fn list(&self) -> &'static str {
        "static"
    }

    fn location(&self) -> &'static [&'static str] {
        &["static-routes"]
    }

    fn enumerate(&self, parent: &TreePath, ctx: &ReadContext<'_>) -> Result<Vec<Key>> {
        let scope = self.settings.scope(parent)?;
        let mut keys = Vec::new();
        for table in PrefixTable::ALL {
            let Some(prefixes) = ctx.read(parent, &table.prefixes(scope))? else {
                continue;
            };
            keys.extend(
                prefixes
                    .get_children("vrf-prefix")
                    .into_iter()
                    .filter_map(|entry| {
                        IpPrefix::from_leaves(entry.leaf_text("prefix")?, entry.leaf_text("prefix-length")?)
                            .ok()
                    })
                    .map(|prefix| Key::single("prefix", prefix.to_string())),
            );
        }
        Ok(dedup_keys(keys))
    }

    fn hydrate(&self, path: &TreePath, ctx: &ReadContext<'_>) -> Result<ConfigNode> {
        let key = path.key_of("static")?;
        let prefix = IpPrefix::parse(path.key_value("static", "prefix")?).or_invalid(path)?;
        let scope = self.settings.scope(path)?;
        for table in PrefixTable::for_prefix(&prefix) {
            if ctx.read(path, &xr::static_prefix(scope, table, &prefix))?.is_some() {
                return Ok(StaticRoute { prefix }.to_node());
            }
        }
        Ok(key_only_node("static", key))
    }
}

/// Route and its unicast `vrf-prefix` entry, next hops included, without key leaves.
fn render(path: &TreePath, element: &ConfigNode) -> Result<(StaticRoute, ConfigNode)> {
    let route = StaticRoute::from_node(element).or_invalid(path)?;
    let hops = children_at(element, &["next-hops"], "next-hop")
        .into_iter()
        .map(NextHop::from_node)
        .collect::<std::result::Result<Vec<_>, _>>()
        .or_invalid(path)?;
    let table = hops.iter().fold(ConfigNode::new("vrf-next-hop-table"), |table, hop| {
        table.with_child(render_next_hop(hop))
    });
    let node = ConfigNode::new("vrf-prefix").with_child(ConfigNode::new("vrf-route").with_child(table));
    Ok((route, node))
}

impl ElementWriter for XrStaticRoute {
    /// Writes the prefix into the unicast table together with the next hops it carries.
    fn write(&self, path: &TreePath, after: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        let (route, node) = render(path, after)?;
        let [unicast, _] = PrefixTable::for_prefix(&route.prefix);
        let scope = self.settings.scope(path)?;
        ctx.store
            .merge(&xr::static_prefix(scope, unicast, &route.prefix), node)
            .or_write_failed(path)
    }

    /// Drops next hops the route no longer carries and merges the rest. The multicast entry
    /// of the prefix is left alone.
    fn update(
        &self,
        path: &TreePath,
        before: &ConfigNode,
        after: &ConfigNode,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let (_, old) = render(path, before)?;
        let (route, new) = render(path, after)?;
        let [unicast, _] = PrefixTable::for_prefix(&route.prefix);
        let scope = self.settings.scope(path)?;
        ctx.store
            .safe_merge(&xr::static_prefix(scope, unicast, &route.prefix), Some(&old), new)
            .or_write_failed(path)
    }

    fn delete(&self, path: &TreePath, before: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        let route = StaticRoute::from_node(before).or_invalid(path)?;
        let scope = self.settings.scope(path)?;
        for table in PrefixTable::for_prefix(&route.prefix) {
            ctx.store
                .safe_delete(&xr::static_prefix(scope, table, &route.prefix))
                .or_write_failed(path)?;
        }
        Ok(())
    }
}
