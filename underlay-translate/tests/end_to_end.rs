use std::path::PathBuf;

use config_tree_core::{parse_file, ConfigNode, TreePath};
use pretty_assertions::assert_eq;
use underlay_translate::canonical;
use underlay_translate::context::ReadContext;
use underlay_translate::error::TranslateError;
use underlay_translate::profile::load_profile;
use underlay_translate::registry::Registry;
use underlay_translate::store::{Datastore, MemoryStore, StoreOp, UnderlayAccess};

fn fixture(name: &str) -> ConfigNode {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("fixtures")
        .join(name);
    parse_file(&path).expect("fixture")
}

struct Scenario {
    registry: Registry,
    store: MemoryStore,
    before: ConfigNode,
    after: ConfigNode,
}

impl Scenario {
    fn new(profile: &str, underlay: &str) -> Self {
        let profile = load_profile(profile).expect("profile");
        Self {
            registry: Registry::for_profile(&profile).expect("registry"),
            store: MemoryStore::seeded(fixture(underlay), profile.underlay.key_fields()),
            before: fixture("canonical-before.xml"),
            after: fixture("canonical-after.xml"),
        }
    }

    fn apply(&self, path: &TreePath) -> Result<(), TranslateError> {
        self.registry
            .apply(path, &self.before, &self.after, &self.store)
    }

    fn read(&self, parent: &TreePath, list: &str) -> ConfigNode {
        let ctx = ReadContext::new(&self.store, Datastore::Config);
        self.registry.read_list(parent, list, &ctx).expect("read")
    }
}

fn leaves<'a>(list: &'a ConfigNode, entry: &str, leaf: &str) -> Vec<&'a str> {
    list.get_children(entry)
        .into_iter()
        .filter_map(|node| node.leaf_text(leaf))
        .collect()
}

#[test]
fn xr_new_neighbor_is_one_merge_with_dual_encoded_as() {
    let scenario = Scenario::new("xr6", "xr6-underlay.xml");
    scenario
        .apply(&canonical::neighbor("default", "default", "10.1.0.4"))
        .expect("apply");

    let mutations = scenario.store.mutations().expect("journal");
    assert_eq!(mutations.len(), 1);
    assert_eq!(mutations[0].op, StoreOp::Merge);
    assert_eq!(
        mutations[0].path.to_string(),
        "/bgp/instance[instance-name=default]/instance-as[as=0]/four-byte-as[as=64500]/default-vrf/bgp-entity/neighbors/neighbor[neighbor-address=10.1.0.4]"
    );
    let node = mutations[0].node.as_ref().expect("payload");
    assert_eq!(node.get_text(&["remote-as", "as-xx"]), Some("0"));
    assert_eq!(node.get_text(&["remote-as", "as-yy"]), Some("123"));
}

#[test]
fn xr_transaction_reads_back_as_after_tree() {
    let scenario = Scenario::new("xr6", "xr6-underlay.xml");
    let paths = [
        canonical::neighbor("default", "default", "10.1.0.4"),
        canonical::neighbor("default", "default", "10.1.0.1"),
        canonical::local_aggregates("default", "default").child_keyed(
            "aggregate",
            config_tree_core::Key::single("prefix", "10.10.0.0/16"),
        ),
        canonical::ospf_areas("default", "100")
            .child_keyed("area", config_tree_core::Key::single("identifier", "0.0.0.1")),
        canonical::static_routes("default", "default").child_keyed(
            "static",
            config_tree_core::Key::single("prefix", "203.0.113.0/24"),
        ),
        canonical::ext_community_set("CUST-route-target-import-set"),
    ];
    for path in &paths {
        scenario.apply(path).expect("apply");
    }

    let neighbors = scenario.read(&canonical::bgp_neighbors("default", "default"), "neighbor");
    assert_eq!(
        leaves(&neighbors, "neighbor", "neighbor-address"),
        vec!["10.1.0.1", "10.1.0.4"]
    );
    let updated = neighbors.get_children("neighbor")[0];
    assert_eq!(
        updated.get_text(&["config", "description"]),
        Some("upstream-primary")
    );
    assert_eq!(updated.get_text(&["config", "peer-group"]), Some("PEERING"));

    let aggregates = scenario.read(&canonical::local_aggregates("default", "default"), "aggregate");
    assert_eq!(leaves(&aggregates, "aggregate", "prefix"), vec!["10.10.0.0/16"]);

    let areas = scenario.read(&canonical::ospf_areas("default", "100"), "area");
    assert_eq!(leaves(&areas, "area", "identifier"), vec!["0", "0.0.0.1"]);

    let routes = scenario.read(&canonical::static_routes("default", "default"), "static");
    assert_eq!(
        leaves(&routes, "static", "prefix"),
        vec!["198.51.100.0/24", "203.0.113.0/24"]
    );

    let sets = scenario.read(&canonical::EXT_COMMUNITY_SETS, "ext-community-set");
    assert_eq!(
        leaves(&sets, "ext-community-set", "ext-community-set-name"),
        vec!["CUST-route-target-import-set"]
    );

    let protocols = scenario.read(&canonical::protocols("default"), "protocol");
    assert_eq!(
        leaves(&protocols, "protocol", "identifier"),
        vec!["BGP", "OSPF", "STATIC"]
    );
}

#[test]
fn xr_every_enumerated_protocol_hydrates() {
    let scenario = Scenario::new("xr6", "xr6-underlay.xml");
    let protocols = scenario.read(&canonical::protocols("default"), "protocol");
    for protocol in protocols.get_children("protocol") {
        assert!(protocol.get_child("config").is_some());
        assert!(protocol.leaf_text("name").is_some());
    }
    assert!(scenario
        .store
        .calls()
        .expect("journal")
        .iter()
        .all(|call| call.op == StoreOp::Read));
}

#[test]
fn junos_group_change_moves_neighbor() {
    let scenario = Scenario::new("junos17", "junos17-underlay.xml");
    scenario
        .apply(&canonical::neighbor("default", "default", "10.1.0.1"))
        .expect("apply");

    let ops: Vec<_> = scenario
        .store
        .mutations()
        .expect("journal")
        .iter()
        .map(|call| call.op)
        .collect();
    assert_eq!(ops, vec![StoreOp::Delete, StoreOp::Put]);

    let moved = scenario
        .store
        .read(
            &"/configuration/protocols/bgp/group[name=PEERING]/neighbor[name=10.1.0.1]"
                .parse()
                .expect("path"),
            Datastore::Config,
        )
        .expect("read")
        .expect("present");
    assert_eq!(moved.leaf_text("description"), Some("upstream-primary"));
}

#[test]
fn junos_neighbor_without_group_is_rejected() {
    let scenario = Scenario::new("junos17", "junos17-underlay.xml");
    let err = scenario
        .apply(&canonical::neighbor("default", "default", "10.1.0.4"))
        .expect_err("group required");
    assert!(matches!(err, TranslateError::ValidationFailed { .. }));
    assert!(scenario.store.mutations().expect("journal").is_empty());
}

#[test]
fn junos_does_not_translate_ospf() {
    let scenario = Scenario::new("junos17", "junos17-underlay.xml");
    let err = scenario
        .apply(
            &canonical::ospf_areas("default", "100")
                .child_keyed("area", config_tree_core::Key::single("identifier", "0.0.0.1")),
        )
        .expect_err("unsupported");
    assert!(matches!(err, TranslateError::UnsupportedElement { .. }));
}
