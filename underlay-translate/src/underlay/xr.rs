//! IOS-XR style layout.
//!
//! ```text
//! /bgp/instance[instance-name]/instance-as[as]/four-byte-as[as]
//!     /default-vrf/{global, bgp-entity/neighbors/neighbor[neighbor-address]}
//!     /vrfs/vrf[vrf-name]/{vrf-global, vrf-neighbors/vrf-neighbor[neighbor-address]}
//!     /default-vrf/bgp-entity/neighbor-groups/neighbor-group[neighbor-group-name]
//! /ospf/processes/process[process-name]/{default-vrf, vrfs/vrf[vrf-name]}
//!     /{area-addresses/.../name-scopes/name-scope[interface-name], max-metric}
//! /router-static/{default-vrf, vrfs/vrf[vrf-name]}/address-family/...
//! /vrfs/vrf[vrf-name]/afs/af[af-name][saf-name][topology-name]/bgp/...
//! ```

use std::sync::LazyLock;

use config_tree_core::{key_fields, Key, KeyFields, TreePath};

use super::Scope;
use crate::codec::{as_to_dot, AfiSafi, AreaId, IpPrefix, RouteTarget};
use crate::canonical::RouteTargetDirection;

pub static BGP: LazyLock<TreePath> = LazyLock::new(|| TreePath::root().child("bgp"));

pub static OSPF_PROCESSES: LazyLock<TreePath> =
    LazyLock::new(|| TreePath::root().join(&["ospf", "processes"]));

pub static ROUTER_STATIC: LazyLock<TreePath> =
    LazyLock::new(|| TreePath::root().child("router-static"));

pub static VRFS: LazyLock<TreePath> = LazyLock::new(|| TreePath::root().child("vrfs"));

/// List keys of the layout.
pub fn key_fields_registry() -> KeyFields {
    key_fields(&[
        ("instance", "instance-name"),
        ("instance-as", "as"),
        ("four-byte-as", "as"),
        ("vrf", "vrf-name"),
        ("neighbor", "neighbor-address"),
        ("vrf-neighbor", "neighbor-address"),
        ("neighbor-af", "af-name"),
        ("neighbor-group", "neighbor-group-name"),
        ("neighbor-group-af", "af-name"),
        ("vrf-neighbor-af", "af-name"),
        ("global-af", "af-name"),
        ("vrf-global-af", "af-name"),
        ("sourced-network", "network-addr network-prefix"),
        ("process", "process-name"),
        ("area-area-id", "area-id"),
        ("area-address", "address"),
        ("name-scope", "interface-name"),
        ("vrf-prefix", "prefix prefix-length"),
        ("vrf-next-hop-interface-name", "interface-name"),
        (
            "vrf-next-hop-interface-name-next-hop-address",
            "interface-name next-hop-address",
        ),
        ("vrf-next-hop-next-hop-address", "next-hop-address"),
        ("af", "af-name saf-name topology-name"),
        ("route-target", "type"),
        ("as-or-four-byte-as", "as-xx as as-index stitching-rt"),
    ])
}

// BGP

pub fn bgp_instance(instance: &str) -> TreePath {
    BGP.child_keyed("instance", Key::single("instance-name", instance))
}

/// `four-byte-as` container of one BGP instance, addressed by both AS halves.
pub fn four_byte_as(instance: &str, as_number: u32) -> TreePath {
    let dot = as_to_dot(as_number);
    bgp_instance(instance)
        .child_keyed("instance-as", Key::single("as", dot.xx.to_string()))
        .child_keyed("four-byte-as", Key::single("as", dot.yy.to_string()))
}

pub fn bgp_vrf(instance: &str, as_number: u32, vrf: &str) -> TreePath {
    four_byte_as(instance, as_number)
        .child("vrfs")
        .child_keyed("vrf", Key::single("vrf-name", vrf))
}

/// Container holding the router-id and address families of a scope.
pub fn bgp_global(instance: &str, as_number: u32, scope: Scope<'_>) -> TreePath {
    match scope {
        Scope::Default => four_byte_as(instance, as_number).join(&["default-vrf", "global"]),
        Scope::Vrf(vrf) => bgp_vrf(instance, as_number, vrf).child("vrf-global"),
    }
}

/// Tags of the neighbor list and its AF list in a scope.
pub fn neighbor_tags(scope: Scope<'_>) -> (&'static str, &'static str, &'static str) {
    match scope {
        Scope::Default => ("neighbor", "neighbor-afs", "neighbor-af"),
        Scope::Vrf(_) => ("vrf-neighbor", "vrf-neighbor-afs", "vrf-neighbor-af"),
    }
}

pub fn neighbors(instance: &str, as_number: u32, scope: Scope<'_>) -> TreePath {
    match scope {
        Scope::Default => {
            four_byte_as(instance, as_number).join(&["default-vrf", "bgp-entity", "neighbors"])
        }
        Scope::Vrf(vrf) => bgp_vrf(instance, as_number, vrf).child("vrf-neighbors"),
    }
}

pub fn neighbor(instance: &str, as_number: u32, scope: Scope<'_>, address: &str) -> TreePath {
    let (list, _, _) = neighbor_tags(scope);
    neighbors(instance, as_number, scope)
        .child_keyed(list, Key::single("neighbor-address", address))
}

/// `neighbor-group` entry of the default scope. Peer groups exist only there.
pub fn neighbor_group(instance: &str, as_number: u32, name: &str) -> TreePath {
    four_byte_as(instance, as_number)
        .join(&["default-vrf", "bgp-entity", "neighbor-groups"])
        .child_keyed("neighbor-group", Key::single("neighbor-group-name", name))
}

/// Tags of the global AF list container and entries in a scope.
pub fn global_af_tags(scope: Scope<'_>) -> (&'static str, &'static str) {
    match scope {
        Scope::Default => ("global-afs", "global-af"),
        Scope::Vrf(_) => ("vrf-global-afs", "vrf-global-af"),
    }
}

pub fn global_af(instance: &str, as_number: u32, scope: Scope<'_>, af: AfiSafi) -> TreePath {
    let (container, entry) = global_af_tags(scope);
    bgp_global(instance, as_number, scope)
        .child(container)
        .child_keyed(entry, Key::single("af-name", af.underlay()))
}

pub fn sourced_network_key(prefix: &IpPrefix) -> Key {
    Key::single("network-addr", prefix.address.to_string())
        .with("network-prefix", prefix.length.to_string())
}

pub fn sourced_network(
    instance: &str,
    as_number: u32,
    scope: Scope<'_>,
    af: AfiSafi,
    prefix: &IpPrefix,
) -> TreePath {
    global_af(instance, as_number, scope, af)
        .child("sourced-networks")
        .child_keyed("sourced-network", sourced_network_key(prefix))
}

// OSPF

pub fn ospf_process(process: &str) -> TreePath {
    OSPF_PROCESSES.child_keyed("process", Key::single("process-name", process))
}

/// Per-scope container of one process: `default-vrf` or `vrfs/vrf`.
pub fn ospf_scope(process: &str, scope: Scope<'_>) -> TreePath {
    match scope {
        Scope::Default => ospf_process(process).child("default-vrf"),
        Scope::Vrf(vrf) => ospf_process(process)
            .child("vrfs")
            .child_keyed("vrf", Key::single("vrf-name", vrf)),
    }
}

pub fn area_addresses(process: &str, scope: Scope<'_>) -> TreePath {
    ospf_scope(process, scope).child("area-addresses")
}

/// List tag and key leaf for an area id variant.
pub fn area_tags(area: &AreaId) -> (&'static str, &'static str) {
    match area {
        AreaId::Number(_) => ("area-area-id", "area-id"),
        AreaId::Dotted(_) => ("area-address", "address"),
    }
}

pub fn area(process: &str, scope: Scope<'_>, area: &AreaId) -> TreePath {
    let (list, leaf) = area_tags(area);
    area_addresses(process, scope).child_keyed(list, Key::single(leaf, area.to_string()))
}

pub fn name_scope(process: &str, scope: Scope<'_>, area_id: &AreaId, interface: &str) -> TreePath {
    area(process, scope, area_id)
        .child("name-scopes")
        .child_keyed("name-scope", Key::single("interface-name", interface))
}

pub fn max_metric_on_startup(process: &str, scope: Scope<'_>) -> TreePath {
    ospf_scope(process, scope).join(&["max-metric", "max-metric-on-startup"])
}

// Static routes

pub fn static_scope(scope: Scope<'_>) -> TreePath {
    match scope {
        Scope::Default => ROUTER_STATIC.child("default-vrf"),
        Scope::Vrf(vrf) => ROUTER_STATIC
            .child("vrfs")
            .child_keyed("vrf", Key::single("vrf-name", vrf)),
    }
}

/// Unicast or multicast prefix table of one address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixTable {
    pub ipv4: bool,
    pub multicast: bool,
}

impl PrefixTable {
    /// Tables in lookup order: unicast before multicast, IPv4 before IPv6.
    pub const ALL: [PrefixTable; 4] = [
        PrefixTable { ipv4: true, multicast: false },
        PrefixTable { ipv4: true, multicast: true },
        PrefixTable { ipv4: false, multicast: false },
        PrefixTable { ipv4: false, multicast: true },
    ];

    /// Tables able to hold `prefix`, unicast first.
    pub fn for_prefix(prefix: &IpPrefix) -> [PrefixTable; 2] {
        let ipv4 = prefix.is_ipv4();
        [
            PrefixTable { ipv4, multicast: false },
            PrefixTable { ipv4, multicast: true },
        ]
    }

    pub fn prefixes(self, scope: Scope<'_>) -> TreePath {
        let family = if self.ipv4 { "vrfipv4" } else { "vrfipv6" };
        let cast = if self.multicast { "vrf-multicast" } else { "vrf-unicast" };
        static_scope(scope).join(&["address-family", family, cast, "vrf-prefixes"])
    }
}

pub fn prefix_key(prefix: &IpPrefix) -> Key {
    Key::single("prefix", prefix.address.to_string()).with("prefix-length", prefix.length.to_string())
}

pub fn static_prefix(scope: Scope<'_>, table: PrefixTable, prefix: &IpPrefix) -> TreePath {
    table.prefixes(scope).child_keyed("vrf-prefix", prefix_key(prefix))
}

pub fn next_hop_table(scope: Scope<'_>, table: PrefixTable, prefix: &IpPrefix) -> TreePath {
    static_prefix(scope, table, prefix).join(&["vrf-route", "vrf-next-hop-table"])
}

/// Next-hop sub-collections in priority order.
pub const NEXT_HOP_INTERFACE: &str = "vrf-next-hop-interface-name";
pub const NEXT_HOP_INTERFACE_ADDRESS: &str = "vrf-next-hop-interface-name-next-hop-address";
pub const NEXT_HOP_ADDRESS: &str = "vrf-next-hop-next-hop-address";

// Route targets

pub fn vrf(vrf: &str) -> TreePath {
    VRFS.child_keyed("vrf", Key::single("vrf-name", vrf))
}

pub fn ipv4_unicast_af(vrf_name: &str) -> TreePath {
    vrf(vrf_name).child("afs").child_keyed(
        "af",
        Key::single("af-name", "ipv4")
            .with("saf-name", "unicast")
            .with("topology-name", "default"),
    )
}

pub fn route_targets(vrf_name: &str, direction: RouteTargetDirection) -> TreePath {
    ipv4_unicast_af(vrf_name)
        .join(&["bgp", direction.underlay_container(), "route-targets"])
        .child_keyed("route-target", Key::single("type", "as"))
}

pub fn route_target_key(rt: &RouteTarget) -> Key {
    let dot = rt.as_dot();
    Key::single("as-xx", dot.xx.to_string())
        .with("as", dot.yy.to_string())
        .with("as-index", rt.index.to_string())
        .with("stitching-rt", "0")
}

pub fn route_target(vrf_name: &str, direction: RouteTargetDirection, rt: &RouteTarget) -> TreePath {
    route_targets(vrf_name, direction).child_keyed("as-or-four-byte-as", route_target_key(rt))
}
