use config_tree_core::{ConfigNode, Key, TreePath};

use super::locate_scope;
use crate::canonical::{self, BgpGlobal};
use crate::codec::AfiSafi;
use crate::context::{ReadContext, WriteContext};
use crate::error::{CodecResultExt, Result, StoreResultExt, TranslateError};
use crate::handler::{ElementWriter, ListReader};
use crate::mapping::Settings;
use crate::reconcile::{relocate, Relocation, WriteMode};
use crate::underlay::{xr, Scope};
use crate::validate;

/// `bgp/global` onto the `four-byte-as` container (default instance) or the BGP VRF entry.
///
/// The AS number is part of the underlay address, so changing it moves the whole subtree.
#[derive(Debug, Clone)]
pub struct XrBgpGlobal {
    settings: Settings,
}

impl XrBgpGlobal {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    fn target(&self, scope: Scope<'_>, as_number: u32) -> TreePath {
        match scope {
            Scope::Default => xr::four_byte_as(&self.settings.bgp_instance, as_number),
            Scope::Vrf(vrf) => xr::bgp_vrf(&self.settings.bgp_instance, as_number, vrf),
        }
    }

    fn parse(&self, path: &TreePath, node: &ConfigNode) -> Result<(BgpGlobal, u32)> {
        let global = BgpGlobal::from_node(node).or_invalid(path)?;
        let as_number = global
            .as_number
            .ok_or_else(|| TranslateError::validation(path, "BGP AS number is required"))?;
        Ok((global, as_number))
    }
}

/// Underlay node for `global` in `scope`, without the key leaves of the target step.
fn render(global: &BgpGlobal, scope: Scope<'_>) -> ConfigNode {
    let (afs_tag, af_tag) = xr::global_af_tags(scope);
    let afs = global.afi_safis.iter().fold(ConfigNode::new(afs_tag), |afs, af| {
        afs.with_child(
            ConfigNode::new(af_tag)
                .with_leaf("af-name", af.underlay())
                .with_leaf("enable", "true"),
        )
    });
    let mut body = ConfigNode::new(match scope {
        Scope::Default => "global",
        Scope::Vrf(_) => "vrf-global",
    })
    .with_opt_leaf("router-id", global.router_id.as_deref());
    if !global.afi_safis.is_empty() {
        body = body.with_child(afs);
    }
    match scope {
        Scope::Default => ConfigNode::new("four-byte-as")
            .with_child(ConfigNode::new("bgp-running"))
            .with_child(ConfigNode::new("default-vrf").with_child(body)),
        Scope::Vrf(_) => ConfigNode::new("vrf").with_child(body),
    }
}

impl ListReader for XrBgpGlobal {
    fn list(&self) -> &'static str {
        "global"
    }

    fn location(&self) -> &'static [&'static str] {
        &["bgp"]
    }

    fn enumerate(&self, parent: &TreePath, ctx: &ReadContext<'_>) -> Result<Vec<Key>> {
        let (_, protocol) = canonical::protocol_scope(parent)?;
        if protocol != self.settings.bgp_instance {
            return Ok(Vec::new());
        }
        let scope = self.settings.scope(parent)?;
        let found = locate_scope(ctx, parent, protocol, scope)?;
        Ok(found.map(|_| Key::default()).into_iter().collect())
    }

    fn hydrate(&self, path: &TreePath, ctx: &ReadContext<'_>) -> Result<ConfigNode> {
        let scope = self.settings.scope(path)?;
        let Some(found) = locate_scope(ctx, path, &self.settings.bgp_instance, scope)? else {
            return Ok(ConfigNode::new("global"));
        };
        let global = found.global(scope);
        let afi_safis = found
            .global_afs(scope)
            .into_iter()
            .filter_map(|af| af.leaf_text("af-name"))
            .filter_map(|name| AfiSafi::from_underlay(name).ok())
            .collect();
        Ok(BgpGlobal {
            as_number: Some(found.as_number),
            router_id: global
                .and_then(|global| global.leaf_text("router-id"))
                .map(str::to_string),
            afi_safis,
        }
        .to_node())
    }
}

impl ElementWriter for XrBgpGlobal {
    fn write(&self, path: &TreePath, after: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        let (_, protocol) = canonical::protocol_scope(path)?;
        validate::bgp_instance_name(path, protocol, &self.settings.bgp_instance)?;
        let scope = self.settings.scope(path)?;
        let (global, as_number) = self.parse(path, after)?;
        ctx.store
            .merge(&self.target(scope, as_number), render(&global, scope))
            .or_write_failed(path)
    }

    fn update(
        &self,
        path: &TreePath,
        before: &ConfigNode,
        after: &ConfigNode,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let (_, protocol) = canonical::protocol_scope(path)?;
        validate::bgp_instance_name(path, protocol, &self.settings.bgp_instance)?;
        let scope = self.settings.scope(path)?;
        let (old, old_as) = self.parse(path, before)?;
        let (new, new_as) = self.parse(path, after)?;

        if old_as != new_as {
            return relocate(
                ctx.store,
                path,
                Relocation {
                    anchor: None,
                    from: self.target(scope, old_as),
                    to: self.target(scope, new_as),
                    node: render(&new, scope),
                    mode: WriteMode::Merge,
                    carry_over: true,
                },
            );
        }
        let before = render(&old, scope);
        ctx.store
            .safe_merge(&self.target(scope, new_as), Some(&before), render(&new, scope))
            .or_write_failed(path)
    }

    fn delete(&self, path: &TreePath, before: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        let scope = self.settings.scope(path)?;
        let (_, as_number) = self.parse(path, before)?;
        ctx.store
            .delete(&self.target(scope, as_number))
            .or_write_failed(path)
    }
}
