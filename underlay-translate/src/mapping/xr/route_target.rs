use config_tree_core::{ConfigNode, Key, TreePath};

use crate::canonical::{self, ExtCommunitySet, RouteTargetDirection};
use crate::codec::{as_from_dot, RouteTarget};
use crate::context::{ReadContext, WriteContext};
use crate::error::{CodecResultExt, Result, StoreResultExt, TranslateError};
use crate::handler::{key_only_node, ElementWriter, ListReader};
use crate::mapping::children_at;
use crate::underlay::xr;
use crate::validate;

const DIRECTIONS: [RouteTargetDirection; 2] =
    [RouteTargetDirection::Import, RouteTargetDirection::Export];

/// Route-target extended community sets onto the VRF IPv4 unicast import/export route targets.
///
/// A set named `<vrf>-route-target-import-set` holds the import targets of `<vrf>`, the
/// `-export-set` twin its export targets.
#[derive(Debug, Clone, Default)]
pub struct XrRouteTargetSet;

fn decode(entry: &ConfigNode) -> Option<RouteTarget> {
    let number = |leaf: &str| entry.leaf_text(leaf).and_then(|v| v.parse::<u32>().ok());
    Some(RouteTarget {
        as_number: as_from_dot(number("as-xx")?, number("as")?).ok()?,
        index: number("as-index")?,
    })
}

/// Route targets of one VRF and direction, in underlay order.
fn targets(vrf: &ConfigNode, direction: RouteTargetDirection) -> Vec<RouteTarget> {
    let Some(af) = children_at(vrf, &["afs"], "af").into_iter().find(|af| {
        af.leaf_text("af-name") == Some("ipv4") && af.leaf_text("saf-name") == Some("unicast")
    }) else {
        return Vec::new();
    };
    children_at(af, &["bgp", direction.underlay_container(), "route-targets"], "route-target")
        .into_iter()
        .filter(|rt| rt.leaf_text("type") == Some("as"))
        .flat_map(|rt| rt.get_children("as-or-four-byte-as"))
        .filter_map(decode)
        .collect()
}

impl ListReader for XrRouteTargetSet {
    fn list(&self) -> &'static str {
        "ext-community-set"
    }

    fn location(&self) -> &'static [&'static str] {
        &["bgp-defined-sets", "ext-community-sets"]
    }

    fn enumerate(&self, parent: &TreePath, ctx: &ReadContext<'_>) -> Result<Vec<Key>> {
        let Some(vrfs) = ctx.read(parent, &xr::VRFS)? else {
            return Ok(Vec::new());
        };
        let mut keys = Vec::new();
        for vrf in vrfs.get_children("vrf") {
            let Some(name) = vrf.leaf_text("vrf-name") else {
                continue;
            };
            for direction in DIRECTIONS {
                if !targets(vrf, direction).is_empty() {
                    keys.push(Key::single(
                        "ext-community-set-name",
                        ExtCommunitySet::set_name(name, direction),
                    ));
                }
            }
        }
        Ok(keys)
    }

    fn hydrate(&self, path: &TreePath, ctx: &ReadContext<'_>) -> Result<ConfigNode> {
        let key = path.key_of("ext-community-set")?;
        let name = path.key_value("ext-community-set", "ext-community-set-name")?;
        let Some((vrf, direction)) = canonical::route_target_scope(name) else {
            return Ok(key_only_node("ext-community-set", key));
        };
        let members: Vec<String> = ctx
            .read(path, &xr::vrf(vrf))?
            .map(|node| targets(&node, direction))
            .unwrap_or_default()
            .iter()
            .map(RouteTarget::to_string)
            .collect();
        if members.is_empty() {
            return Ok(key_only_node("ext-community-set", key));
        }
        Ok(ExtCommunitySet {
            name: name.to_string(),
            members,
        }
        .to_node())
    }
}

impl ElementWriter for XrRouteTargetSet {
    fn write(&self, path: &TreePath, after: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        let set = ExtCommunitySet::from_node(after).or_invalid(path)?;
        let (vrf, direction, targets) = validate::route_target_set(ctx, path, &set)?;
        for rt in &targets {
            ctx.store
                .merge(
                    &xr::route_target(&vrf, direction, rt),
                    ConfigNode::new("as-or-four-byte-as"),
                )
                .or_write_failed(path)?;
        }
        Ok(())
    }

    /// Removes the targets the set dropped and merges the ones it still holds.
    fn update(
        &self,
        path: &TreePath,
        before: &ConfigNode,
        after: &ConfigNode,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let old = ExtCommunitySet::from_node(before).or_invalid(path)?;
        let set = ExtCommunitySet::from_node(after).or_invalid(path)?;
        let (vrf, direction, targets) = validate::route_target_set(ctx, path, &set)?;
        let dropped = old
            .members
            .iter()
            .map(|member| RouteTarget::parse(member))
            .collect::<std::result::Result<Vec<_>, _>>()
            .or_invalid(path)?;
        for rt in dropped.iter().filter(|rt| !targets.contains(rt)) {
            ctx.store
                .safe_delete(&xr::route_target(&vrf, direction, rt))
                .or_write_failed(path)?;
        }
        self.write(path, after, ctx)
    }

    fn delete(&self, path: &TreePath, before: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        let set = ExtCommunitySet::from_node(before).or_invalid(path)?;
        let (vrf, direction) = set.route_target_scope().ok_or_else(|| {
            TranslateError::validation(path, format!("`{}` is not a route-target set", set.name))
        })?;
        ctx.store
            .safe_delete(&xr::route_targets(vrf, direction))
            .or_write_failed(path)
    }
}

#[cfg(test)]
mod tests {
    use config_tree_core::{parse, ConfigNode};

    use super::XrRouteTargetSet;
    use crate::canonical;
    use crate::context::{ReadContext, WriteContext};
    use crate::handler::{read_list, ElementWriter};
    use crate::store::{Datastore, MemoryStore, StoreOp, UnderlayAccess};
    use crate::underlay::xr;

    fn canonical_tree(members: &[&str]) -> ConfigNode {
        let members: String = members
            .iter()
            .map(|m| format!("<ext-community-member>{m}</ext-community-member>"))
            .collect();
        parse(
            format!(
                "<data><network-instances><network-instance><name>CUST</name>\
                 <config><name>CUST</name><type>L3VRF</type></config></network-instance></network-instances>\
                 <routing-policy><defined-sets><bgp-defined-sets><ext-community-sets><ext-community-set>\
                 <ext-community-set-name>CUST-route-target-import-set</ext-community-set-name>\
                 <config>{members}</config></ext-community-set></ext-community-sets></bgp-defined-sets>\
                 </defined-sets></routing-policy></data>"
            )
            .as_bytes(),
        )
        .expect("parse")
    }

    #[test]
    fn members_become_route_targets_and_read_back() {
        let after = parse(
            br#"<data><network-instances><network-instance><name>CUST</name>
  <config><name>CUST</name><type>L3VRF</type></config>
</network-instance></network-instances>
<routing-policy><defined-sets><bgp-defined-sets><ext-community-sets>
  <ext-community-set><ext-community-set-name>CUST-route-target-export-set</ext-community-set-name>
    <config><ext-community-member>65000:100</ext-community-member><ext-community-member>1.10:7</ext-community-member></config>
  </ext-community-set>
</ext-community-sets></bgp-defined-sets></defined-sets></routing-policy></data>"#,
        )
        .expect("parse");
        let before = ConfigNode::new("data");
        let store = MemoryStore::new(xr::key_fields_registry());
        let path = canonical::ext_community_set("CUST-route-target-export-set");
        let node = after.find(&path).expect("set").clone();

        XrRouteTargetSet
            .write(&path, &node, &WriteContext::new(&store, &before, &after))
            .expect("write");
        let mutations = store.mutations().expect("journal");
        assert_eq!(mutations.len(), 2);
        assert!(mutations[1]
            .path
            .to_string()
            .ends_with("as-or-four-byte-as[as-xx=1][as=10][as-index=7][stitching-rt=0]"));

        let ctx = ReadContext::new(&store, Datastore::Config);
        let list = read_list(&XrRouteTargetSet, &canonical::EXT_COMMUNITY_SETS, &ctx).expect("read");
        let sets = list.get_children("ext-community-set");
        assert_eq!(sets.len(), 1);
        let members: Vec<_> = sets[0]
            .get_child("config")
            .expect("config")
            .get_children("ext-community-member")
            .iter()
            .filter_map(|m| m.text.as_deref())
            .collect();
        assert_eq!(members, vec!["65000:100", "65546:7"]);
    }

    #[test]
    fn update_removes_dropped_targets_only() {
        let underlay = parse(
            br#"<data><vrfs><vrf><vrf-name>CUST</vrf-name><afs><af>
  <af-name>ipv4</af-name><saf-name>unicast</saf-name><topology-name>default</topology-name>
  <bgp><import-route-targets><route-targets>
    <route-target><type>as</type>
      <as-or-four-byte-as><as-xx>0</as-xx><as>65000</as><as-index>100</as-index><stitching-rt>0</stitching-rt></as-or-four-byte-as>
      <as-or-four-byte-as><as-xx>0</as-xx><as>65000</as><as-index>200</as-index><stitching-rt>0</stitching-rt></as-or-four-byte-as>
    </route-target>
    <route-target><type>ipv4-address</type>
      <ipv4-address><address>192.0.2.1</address><address-index>5</address-index><stitching-rt>0</stitching-rt></ipv4-address>
    </route-target>
  </route-targets></import-route-targets></bgp>
</af></afs></vrf></vrfs></data>"#,
        )
        .expect("parse");
        let store = MemoryStore::seeded(underlay, xr::key_fields_registry());
        let before = canonical_tree(&["65000:100", "65000:200"]);
        let after = canonical_tree(&["65000:100", "65000:300"]);
        let path = canonical::ext_community_set("CUST-route-target-import-set");

        XrRouteTargetSet
            .update(
                &path,
                before.find(&path).expect("before set"),
                after.find(&path).expect("after set"),
                &WriteContext::new(&store, &before, &after),
            )
            .expect("update");

        let mutations = store.mutations().expect("journal");
        assert_eq!(mutations[0].op, StoreOp::SafeDelete);
        assert!(mutations[0].path.to_string().contains("[as-index=200]"));

        let targets = store
            .read(
                &xr::ipv4_unicast_af("CUST").join(&["bgp", "import-route-targets", "route-targets"]),
                Datastore::Config,
            )
            .expect("read")
            .expect("route targets");
        let kinds: Vec<_> = targets
            .get_children("route-target")
            .iter()
            .filter_map(|rt| rt.leaf_text("type"))
            .collect();
        assert_eq!(kinds, vec!["as", "ipv4-address"]);
        let indexes: Vec<_> = targets.get_children("route-target")[0]
            .get_children("as-or-four-byte-as")
            .iter()
            .filter_map(|rt| rt.leaf_text("as-index"))
            .collect();
        assert_eq!(indexes, vec!["100", "300"]);
    }
}
