use config_tree_core::{ConfigNode, Key, TreePath};
use tracing::{debug, warn};

use super::locate_scope;
use crate::canonical::{self, Aggregate, BgpGlobal};
use crate::codec::{AfiSafi, IpPrefix};
use crate::context::{ReadContext, WriteContext};
use crate::error::{CodecResultExt, Result, StoreResultExt};
use crate::handler::{dedup_keys, key_only_node, ElementWriter, ListReader};
use crate::mapping::Settings;
use crate::underlay::xr;
use crate::validate;

/// `local-aggregates/aggregate` onto a sourced network in every enabled address family of the
/// matching IP version.
#[derive(Debug, Clone)]
pub struct XrAggregate {
    settings: Settings,
}

impl XrAggregate {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    fn prefixes(&self, parent: &TreePath, ctx: &ReadContext<'_>) -> Result<Vec<IpPrefix>> {
        let scope = self.settings.scope(parent)?;
        let Some(found) = locate_scope(ctx, parent, &self.settings.bgp_instance, scope)? else {
            return Ok(Vec::new());
        };
        Ok(found
            .global_afs(scope)
            .into_iter()
            .flat_map(|af| crate::mapping::children_at(af, &["sourced-networks"], "sourced-network"))
            .filter_map(|network| {
                let address = network.leaf_text("network-addr")?;
                let length = network.leaf_text("network-prefix")?;
                IpPrefix::from_leaves(address, length).ok()
            })
            .collect())
    }
}

impl ListReader for XrAggregate {
    fn list(&self) -> &'static str {
        "aggregate"
    }

    fn location(&self) -> &'static [&'static str] {
        &["local-aggregates"]
    }

    fn enumerate(&self, parent: &TreePath, ctx: &ReadContext<'_>) -> Result<Vec<Key>> {
        let (_, protocol) = canonical::protocol_scope(parent)?;
        if protocol != self.settings.bgp_instance {
            return Ok(Vec::new());
        }
        Ok(dedup_keys(
            self.prefixes(parent, ctx)?
                .into_iter()
                .map(|prefix| Key::single("prefix", prefix.to_string())),
        ))
    }

    fn hydrate(&self, path: &TreePath, ctx: &ReadContext<'_>) -> Result<ConfigNode> {
        let key = path.key_of("aggregate")?;
        let prefix = IpPrefix::parse(path.key_value("aggregate", "prefix")?).or_invalid(path)?;
        let present = self.prefixes(&path.parent(), ctx)?.contains(&prefix);
        Ok(if present {
            Aggregate::new(prefix).to_node()
        } else {
            key_only_node("aggregate", key)
        })
    }
}

/// Families among `afi_safis` able to carry `prefix`.
fn matching(afi_safis: &[AfiSafi], prefix: &IpPrefix) -> Vec<AfiSafi> {
    afi_safis
        .iter()
        .copied()
        .filter(|af| af.is_ipv4() == prefix.is_ipv4())
        .collect()
}

impl ElementWriter for XrAggregate {
    fn write(&self, path: &TreePath, after: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        let (ni, protocol) = canonical::protocol_scope(path)?;
        let (as_number, afi_safis) = validate::bgp_networks(ctx, path, ni, protocol, false)?;
        let aggregate = Aggregate::from_node(after).or_invalid(path)?;
        let scope = self.settings.scope(path)?;

        let targets = matching(&afi_safis, &aggregate.prefix);
        if targets.is_empty() {
            warn!(
                path = %path,
                prefix = %aggregate.prefix,
                "no enabled address family matches the prefix IP version, skipping"
            );
            return Ok(());
        }
        for af in targets {
            let network = xr::sourced_network(
                &self.settings.bgp_instance,
                as_number,
                scope,
                af,
                &aggregate.prefix,
            );
            ctx.store
                .merge(&network, ConfigNode::new("sourced-network"))
                .or_write_failed(path)?;
        }
        Ok(())
    }

    fn delete(&self, path: &TreePath, before: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        let (ni, protocol) = canonical::protocol_scope(path)?;
        let (as_number, afi_safis) = validate::bgp_networks(ctx, path, ni, protocol, true)?;
        let aggregate = Aggregate::from_node(before).or_invalid(path)?;
        let scope = self.settings.scope(path)?;

        // Families removed by the same transaction take their networks with them.
        let remaining = ctx
            .read_after(&canonical::bgp_global(ni, protocol))
            .and_then(|global| BgpGlobal::from_node(global).ok())
            .map(|global| global.afi_safis)
            .unwrap_or_default();
        for af in matching(&afi_safis, &aggregate.prefix) {
            if !remaining.contains(&af) {
                debug!(path = %path, af = %af, "address family removed, skipping network delete");
                continue;
            }
            let network = xr::sourced_network(
                &self.settings.bgp_instance,
                as_number,
                scope,
                af,
                &aggregate.prefix,
            );
            ctx.store.safe_delete(&network).or_write_failed(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use config_tree_core::{parse, ConfigNode};

    use super::XrAggregate;
    use crate::canonical;
    use crate::context::{ReadContext, WriteContext};
    use crate::error::TranslateError;
    use crate::handler::{read_list, ElementWriter};
    use crate::mapping::Settings;
    use crate::store::{Datastore, MemoryStore, StoreOp, UnderlayAccess};
    use crate::underlay::xr;

    fn tree(global: &str, prefix: &str) -> ConfigNode {
        let xml = format!(
            r#"<data><network-instances><network-instance><name>default</name>
  <protocols><protocol><identifier>BGP</identifier><name>default</name>
    <bgp><global>{global}</global></bgp>
    <local-aggregates><aggregate><prefix>{prefix}</prefix></aggregate></local-aggregates>
  </protocol></protocols>
</network-instance></network-instances></data>"#
        );
        parse(xml.as_bytes()).expect("parse")
    }

    const READY: &str = "<config><as>64500</as></config><afi-safis>\
        <afi-safi><afi-safi-name>IPV4_UNICAST</afi-safi-name></afi-safi>\
        <afi-safi><afi-safi-name>IPV6_UNICAST</afi-safi-name></afi-safi></afi-safis>";

    fn aggregate_path(prefix: &str) -> config_tree_core::TreePath {
        canonical::local_aggregates("default", "default").child_keyed(
            "aggregate",
            config_tree_core::Key::single("prefix", prefix),
        )
    }

    #[test]
    fn missing_as_fails_before_any_store_call() {
        let store = MemoryStore::new(xr::key_fields_registry());
        let after = tree("<config><router-id>1.1.1.1</router-id></config>", "10.0.0.0/8");
        let path = aggregate_path("10.0.0.0/8");
        let node = after.find(&path).expect("aggregate").clone();

        let err = XrAggregate::new(Settings::default())
            .write(&path, &node, &WriteContext::new(&store, &after, &after))
            .expect_err("no AS");
        assert!(matches!(err, TranslateError::ValidationFailed { .. }));
        assert!(store.calls().expect("journal").is_empty());
    }

    #[test]
    fn writes_only_matching_family_and_reads_back() {
        let store = MemoryStore::new(xr::key_fields_registry());
        let after = tree(READY, "10.0.0.0/8");
        let path = aggregate_path("10.0.0.0/8");
        let node = after.find(&path).expect("aggregate").clone();
        let handler = XrAggregate::new(Settings::default());

        handler
            .write(&path, &node, &WriteContext::new(&store, &after, &after))
            .expect("write");
        let mutations = store.mutations().expect("journal");
        assert_eq!(mutations.len(), 1);
        assert_eq!(mutations[0].op, StoreOp::Merge);
        assert!(mutations[0].path.to_string().contains("global-af[af-name=ipv4-unicast]"));

        let ctx = ReadContext::new(&store, Datastore::Config);
        let list = read_list(&handler, &canonical::local_aggregates("default", "default"), &ctx)
            .expect("read");
        let aggregates = list.get_children("aggregate");
        assert_eq!(aggregates.len(), 1);
        assert_eq!(aggregates[0].leaf_text("prefix"), Some("10.0.0.0/8"));
    }

    #[test]
    fn unmatched_ip_version_is_skipped() {
        let store = MemoryStore::new(xr::key_fields_registry());
        let ipv4_only = "<config><as>64500</as></config><afi-safis>\
            <afi-safi><afi-safi-name>IPV4_UNICAST</afi-safi-name></afi-safi></afi-safis>";
        let after = tree(ipv4_only, "2001:db8::/32");
        let path = aggregate_path("2001:db8::/32");
        let node = after.find(&path).expect("aggregate").clone();

        XrAggregate::new(Settings::default())
            .write(&path, &node, &WriteContext::new(&store, &after, &after))
            .expect("skipped");
        assert!(store.mutations().expect("journal").is_empty());
    }

    #[test]
    fn update_keeps_network_attributes_it_does_not_own() {
        let underlay = parse(
            br#"<data><bgp><instance><instance-name>default</instance-name>
  <instance-as><as>0</as><four-byte-as><as>64500</as><default-vrf><global><global-afs>
    <global-af><af-name>ipv4-unicast</af-name><enable>true</enable><sourced-networks>
      <sourced-network><network-addr>10.0.0.0</network-addr><network-prefix>8</network-prefix>
        <route-policy-name>AGG</route-policy-name></sourced-network>
    </sourced-networks></global-af>
  </global-afs></global></default-vrf></four-byte-as></instance-as>
</instance></bgp></data>"#,
        )
        .expect("parse");
        let store = MemoryStore::seeded(underlay, xr::key_fields_registry());
        let before = tree(READY, "10.0.0.0/8");
        let after = parse(
            format!(
                r#"<data><network-instances><network-instance><name>default</name>
  <protocols><protocol><identifier>BGP</identifier><name>default</name>
    <bgp><global>{READY}</global></bgp>
    <local-aggregates><aggregate><prefix>10.0.0.0/8</prefix>
      <config><prefix>10.0.0.0/8</prefix><summary-only>true</summary-only></config></aggregate></local-aggregates>
  </protocol></protocols>
</network-instance></network-instances></data>"#
            )
            .as_bytes(),
        )
        .expect("parse");
        let path = aggregate_path("10.0.0.0/8");

        XrAggregate::new(Settings::default())
            .update(
                &path,
                before.find(&path).expect("before"),
                after.find(&path).expect("after"),
                &WriteContext::new(&store, &before, &after),
            )
            .expect("update");

        let mutations = store.mutations().expect("journal");
        assert!(mutations.iter().all(|call| call.op == StoreOp::Merge));
        let prefix = crate::codec::IpPrefix::parse("10.0.0.0/8").expect("prefix");
        let network = store
            .read(
                &xr::sourced_network(
                    "default",
                    64_500,
                    crate::underlay::Scope::Default,
                    crate::codec::AfiSafi::Ipv4Unicast,
                    &prefix,
                ),
                Datastore::Config,
            )
            .expect("read")
            .expect("network");
        assert_eq!(network.leaf_text("route-policy-name"), Some("AGG"));
    }
}
