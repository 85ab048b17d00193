//! Pre-write checks against sibling canonical state and the underlay.
//!
//! Every check here runs before the writer issues its first mutation, so a failure leaves the
//! underlay untouched.

use config_tree_core::TreePath;

use crate::canonical::{self, BgpGlobal, ExtCommunitySet, RouteTargetDirection};
use crate::codec::{AfiSafi, RouteTarget};
use crate::context::WriteContext;
use crate::error::{CodecResultExt, Result, StoreResultExt, TranslateError};
use crate::store::{Datastore, UnderlayAccess};

/// BGP global configuration of the protocol instance owning `path`, read from the after-tree
/// (the before-tree for deletes). The local AS must be set.
pub fn bgp_global(
    ctx: &WriteContext<'_>,
    path: &TreePath,
    ni: &str,
    protocol: &str,
    is_delete: bool,
) -> Result<(BgpGlobal, u32)> {
    let global = ctx
        .read_for(&canonical::bgp_global(ni, protocol), is_delete)
        .map(BgpGlobal::from_node)
        .transpose()
        .or_invalid(path)?
        .unwrap_or_default();
    match global.as_number {
        Some(as_number) => Ok((global, as_number)),
        None => Err(TranslateError::validation(
            path,
            format!("BGP AS number not configured for VRF: {ni}"),
        )),
    }
}

/// Prerequisites for sourcing networks: the BGP protocol exists, has an AS number and at least
/// one address family. Returns the AS and the configured families.
pub fn bgp_networks(
    ctx: &WriteContext<'_>,
    path: &TreePath,
    ni: &str,
    protocol: &str,
    is_delete: bool,
) -> Result<(u32, Vec<AfiSafi>)> {
    if ctx
        .read_for(&canonical::protocol(ni, canonical::BGP, protocol), is_delete)
        .is_none()
    {
        return Err(TranslateError::validation(
            path,
            format!("BGP protocol not configured for VRF: {ni}. Cannot configure networks"),
        ));
    }
    let (global, as_number) = bgp_global(ctx, path, ni, protocol, is_delete).map_err(|_| {
        TranslateError::validation(
            path,
            format!("BGP AS number not configured for VRF: {ni}. Cannot configure networks"),
        )
    })?;
    if global.afi_safis.is_empty() {
        return Err(TranslateError::validation(
            path,
            format!("No address family configured for VRF: {ni}. Cannot configure networks"),
        ));
    }
    Ok((as_number, global.afi_safis))
}

/// The canonical protocol name must equal the underlay BGP instance name.
pub fn bgp_instance_name(path: &TreePath, protocol: &str, instance: &str) -> Result<()> {
    if protocol == instance {
        Ok(())
    } else {
        Err(TranslateError::validation(
            path,
            format!("BGP protocol name `{protocol}` does not match the device instance `{instance}`"),
        ))
    }
}

/// A route-target set: its name encodes an existing VRF and a direction, every member is a
/// route target.
pub fn route_target_set(
    ctx: &WriteContext<'_>,
    path: &TreePath,
    set: &ExtCommunitySet,
) -> Result<(String, RouteTargetDirection, Vec<RouteTarget>)> {
    let (vrf, direction) = set.route_target_scope().ok_or_else(|| {
        TranslateError::validation(
            path,
            format!(
                "set name `{}` must be `<vrf>-route-target-import-set` or `<vrf>-route-target-export-set`",
                set.name
            ),
        )
    })?;
    if ctx.read_after(&canonical::network_instance(vrf)).is_none() {
        return Err(TranslateError::validation(
            path,
            format!("VRF `{vrf}` referenced by `{}` does not exist", set.name),
        ));
    }
    let targets = set
        .members
        .iter()
        .map(|member| RouteTarget::parse(member))
        .collect::<std::result::Result<Vec<_>, _>>()
        .or_invalid(path)?;
    Ok((vrf.to_string(), direction, targets))
}

/// The underlay node at `underlay` must exist in the intended configuration.
pub fn underlay_exists(
    store: &dyn UnderlayAccess,
    canonical: &TreePath,
    underlay: &TreePath,
) -> Result<()> {
    match store
        .read(underlay, Datastore::Config)
        .or_read_failed(canonical)?
    {
        Some(_) => Ok(()),
        None => Err(TranslateError::validation(
            canonical,
            format!("{underlay} does not exist"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use config_tree_core::{parse, ConfigNode};

    use super::{bgp_networks, route_target_set};
    use crate::canonical::{self, ExtCommunitySet, RouteTargetDirection};
    use crate::context::WriteContext;
    use crate::error::TranslateError;
    use crate::store::MemoryStore;

    fn tree(global: &str) -> ConfigNode {
        let xml = format!(
            r#"<data><network-instances><network-instance><name>default</name>
  <protocols><protocol><identifier>BGP</identifier><name>default</name>
    <bgp><global>{global}</global></bgp>
  </protocol></protocols>
</network-instance>
<network-instance><name>CUST</name><config><name>CUST</name><type>L3VRF</type></config></network-instance>
</network-instances></data>"#
        );
        parse(xml.as_bytes()).expect("parse")
    }

    fn reason(err: TranslateError) -> String {
        match err {
            TranslateError::ValidationFailed { reason, .. } => reason,
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn networks_need_as_and_address_family() {
        let store = MemoryStore::default();
        let path = canonical::local_aggregates("default", "default");

        let no_as = tree("<config><router-id>1.1.1.1</router-id></config>");
        let ctx = WriteContext::new(&store, &no_as, &no_as);
        let err = bgp_networks(&ctx, &path, "default", "default", false).expect_err("no AS");
        assert_eq!(
            reason(err),
            "BGP AS number not configured for VRF: default. Cannot configure networks"
        );

        let no_af = tree("<config><as>64500</as></config>");
        let ctx = WriteContext::new(&store, &no_af, &no_af);
        let err = bgp_networks(&ctx, &path, "default", "default", false).expect_err("no AF");
        assert!(reason(err).starts_with("No address family"));

        let ready = tree(
            "<config><as>64500</as></config><afi-safis><afi-safi><afi-safi-name>IPV4_UNICAST</afi-safi-name></afi-safi></afi-safis>",
        );
        let ctx = WriteContext::new(&store, &ready, &ready);
        let (as_number, afs) = bgp_networks(&ctx, &path, "default", "default", false).expect("ok");
        assert_eq!(as_number, 64_500);
        assert_eq!(afs.len(), 1);
        assert!(store.calls().expect("journal").is_empty());
    }

    #[test]
    fn route_target_sets_reference_existing_vrf() {
        let store = MemoryStore::default();
        let after = tree("");
        let ctx = WriteContext::new(&store, &after, &after);
        let path = canonical::ext_community_set("CUST-route-target-import-set");

        let set = ExtCommunitySet {
            name: "CUST-route-target-import-set".to_string(),
            members: vec!["65000:1".to_string()],
        };
        let (vrf, direction, targets) = route_target_set(&ctx, &path, &set).expect("valid");
        assert_eq!(vrf, "CUST");
        assert_eq!(direction, RouteTargetDirection::Import);
        assert_eq!(targets[0].index, 1);

        let unknown = ExtCommunitySet {
            name: "OTHER-route-target-import-set".to_string(),
            members: Vec::new(),
        };
        assert!(route_target_set(&ctx, &path, &unknown).is_err());

        let malformed = ExtCommunitySet {
            name: "CUST-route-target-export-set".to_string(),
            members: vec!["65000".to_string()],
        };
        assert!(route_target_set(&ctx, &path, &malformed).is_err());
    }
}
