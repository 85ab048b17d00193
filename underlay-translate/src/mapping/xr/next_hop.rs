use config_tree_core::{ConfigNode, Key, TreePath};

use crate::canonical::NextHop;
use crate::codec::{IpPrefix, NextHopKey};
use crate::context::ReadContext;
use crate::error::{CodecResultExt, Result};
use crate::handler::{dedup_keys, key_only_node, ListReader};
use crate::mapping::Settings;
use crate::underlay::xr::{self, PrefixTable};

/// Read-only view of `static/next-hops/next-hop`, from either datastore.
///
/// The underlay keeps next hops in three collections without a common key; each entry is
/// given the synthetic [`NextHopKey`] index. Next hops are written by the owning static
/// route.
#[derive(Debug, Clone)]
pub struct XrNextHop {
    settings: Settings,
}

impl XrNextHop {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Next-hop table of the first prefix table holding the route, unicast first.
    fn table(&self, path: &TreePath, ctx: &ReadContext<'_>) -> Result<Option<ConfigNode>> {
        let prefix = IpPrefix::parse(path.key_value("static", "prefix")?).or_invalid(path)?;
        let scope = self.settings.scope(path)?;
        for table in PrefixTable::for_prefix(&prefix) {
            if let Some(node) = ctx.read(path, &xr::next_hop_table(scope, table, &prefix))? {
                return Ok(Some(node));
            }
        }
        Ok(None)
    }
}

/// Every entry of `table` with its key, in collection priority order.
fn entries(table: &ConfigNode) -> Vec<(NextHopKey, &ConfigNode)> {
    let interface_only = table
        .get_children(xr::NEXT_HOP_INTERFACE)
        .into_iter()
        .filter_map(|entry| {
            let interface = entry.leaf_text("interface-name")?;
            Some((NextHopKey::Interface(interface.to_string()), entry))
        });
    let with_address = [xr::NEXT_HOP_INTERFACE_ADDRESS, xr::NEXT_HOP_ADDRESS]
        .into_iter()
        .flat_map(|tag| table.get_children(tag))
        .filter_map(|entry| {
            let address = entry.leaf_text("next-hop-address")?.parse().ok()?;
            Some((
                NextHopKey::from_parts(address, entry.leaf_text("interface-name")),
                entry,
            ))
        });
    interface_only.chain(with_address).collect()
}

impl ListReader for XrNextHop {
    fn list(&self) -> &'static str {
        "next-hop"
    }

    fn location(&self) -> &'static [&'static str] {
        &["static", "next-hops"]
    }

    fn enumerate(&self, parent: &TreePath, ctx: &ReadContext<'_>) -> Result<Vec<Key>> {
        let Some(table) = self.table(parent, ctx)? else {
            return Ok(Vec::new());
        };
        Ok(dedup_keys(
            entries(&table)
                .into_iter()
                .map(|(key, _)| Key::single("index", key.to_string())),
        ))
    }

    fn hydrate(&self, path: &TreePath, ctx: &ReadContext<'_>) -> Result<ConfigNode> {
        let key = path.key_of("next-hop")?;
        let index = NextHopKey::decode(path.key_value("next-hop", "index")?);
        let Some(table) = self.table(path, ctx)? else {
            return Ok(key_only_node("next-hop", key));
        };
        let found = entries(&table).into_iter().find(|(candidate, _)| *candidate == index);
        Ok(match found {
            Some((index, entry)) => NextHop {
                index,
                metric: entry.leaf_text("load-metric").and_then(|m| m.parse().ok()),
            }
            .to_node(),
            None => key_only_node("next-hop", key),
        })
    }
}

#[cfg(test)]
mod tests {
    use config_tree_core::{parse, ConfigNode, Key};

    use super::XrNextHop;
    use crate::canonical;
    use crate::context::{ReadContext, WriteContext};
    use crate::handler::{read_list, ElementWriter};
    use crate::mapping::xr::XrStaticRoute;
    use crate::mapping::Settings;
    use crate::store::{Datastore, MemoryStore};
    use crate::underlay::xr;

    fn store() -> MemoryStore {
        let applied = parse(
            br#"<data><router-static><default-vrf><address-family><vrfipv4><vrf-unicast><vrf-prefixes>
  <vrf-prefix><prefix>10.0.0.0</prefix><prefix-length>8</prefix-length>
    <vrf-route><vrf-next-hop-table>
      <vrf-next-hop-next-hop-address><next-hop-address>192.0.2.2</next-hop-address></vrf-next-hop-next-hop-address>
      <vrf-next-hop-interface-name><interface-name>Null0</interface-name></vrf-next-hop-interface-name>
      <vrf-next-hop-interface-name-next-hop-address>
        <interface-name>GigabitEthernet0/0/0/1</interface-name><next-hop-address>192.0.2.1</next-hop-address>
        <load-metric>5</load-metric>
      </vrf-next-hop-interface-name-next-hop-address>
    </vrf-next-hop-table></vrf-route>
  </vrf-prefix>
</vrf-prefixes></vrf-unicast></vrfipv4></address-family></default-vrf></router-static></data>"#,
        )
        .expect("parse");
        MemoryStore::seeded(applied.clone(), xr::key_fields_registry()).with_operational(applied)
    }

    fn next_hops() -> config_tree_core::TreePath {
        canonical::static_routes("default", "default")
            .child_keyed("static", Key::single("prefix", "10.0.0.0/8"))
            .child("next-hops")
    }

    #[test]
    fn operational_reads_scan_collections_in_priority_order() {
        let store = store();
        let ctx = ReadContext::new(&store, Datastore::Operational);
        let list = read_list(&XrNextHop::new(Settings::default()), &next_hops(), &ctx).expect("read");

        let indexes: Vec<_> = list
            .get_children("next-hop")
            .iter()
            .filter_map(|hop| hop.leaf_text("index"))
            .collect();
        assert_eq!(
            indexes,
            vec!["Null0", "192.0.2.1 GigabitEthernet0/0/0/1", "192.0.2.2"]
        );
        let with_metric = list.get_children("next-hop")[1];
        assert_eq!(with_metric.get_text(&["config", "metric"]), Some("5"));
    }

    #[test]
    fn next_hops_written_with_their_route_read_back_from_config() {
        let store = MemoryStore::new(xr::key_fields_registry());
        let tree = ConfigNode::new("data");
        let route = parse(
            br#"<static><prefix>10.0.0.0/8</prefix><next-hops>
  <next-hop><index>Null0</index></next-hop>
  <next-hop><index>192.0.2.1 GigabitEthernet0/0/0/1</index><config><metric>5</metric></config></next-hop>
</next-hops></static>"#,
        )
        .expect("parse");
        let path = canonical::static_routes("default", "default")
            .child_keyed("static", Key::single("prefix", "10.0.0.0/8"));
        XrStaticRoute::new(Settings::default())
            .write(&path, &route, &WriteContext::new(&store, &tree, &tree))
            .expect("write");

        let ctx = ReadContext::new(&store, Datastore::Config);
        let list = read_list(&XrNextHop::new(Settings::default()), &next_hops(), &ctx).expect("read");
        let hops: Vec<_> = list
            .get_children("next-hop")
            .iter()
            .map(|hop| (hop.leaf_text("index"), hop.get_text(&["config", "metric"])))
            .collect();
        assert_eq!(
            hops,
            vec![
                (Some("Null0"), None),
                (Some("192.0.2.1 GigabitEthernet0/0/0/1"), Some("5")),
            ]
        );
    }
}
