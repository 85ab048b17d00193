use config_tree_core::{ConfigNode, Key, TreePath};

use super::XrNeighbor;
use crate::canonical::{afi_safi_node, InstanceType};
use crate::codec::AfiSafi;
use crate::context::ReadContext;
use crate::error::Result;
use crate::handler::{dedup_keys, key_only_node, ListReader};
use crate::mapping::{children_at, Settings};
use crate::underlay::{xr, Scope};

/// Read-only `neighbors/neighbor/afi-safis/afi-safi` from the neighbor's underlay AF entries.
/// The families are written together with their neighbor.
#[derive(Debug, Clone)]
pub struct XrNeighborAfiSafi {
    settings: Settings,
}

impl XrNeighborAfiSafi {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Families of the underlay neighbor the path is under, in underlay order.
    fn families(&self, path: &TreePath, ctx: &ReadContext<'_>) -> Result<Vec<AfiSafi>> {
        let scope = self.settings.scope(path)?;
        let kind = match scope {
            Scope::Default => InstanceType::Default,
            Scope::Vrf(_) => InstanceType::Vrf,
        };
        let address = path.key_value("neighbor", "neighbor-address")?;
        let Some(node) = XrNeighbor::new(self.settings.clone(), kind).find(path, ctx, address)? else {
            return Ok(Vec::new());
        };
        let (_, afs_tag, af_tag) = xr::neighbor_tags(scope);
        Ok(children_at(&node, &[afs_tag], af_tag)
            .into_iter()
            .filter_map(|af| af.leaf_text("af-name"))
            .filter_map(|name| AfiSafi::from_underlay(name).ok())
            .collect())
    }
}

impl ListReader for XrNeighborAfiSafi {
    fn list(&self) -> &'static str {
        "afi-safi"
    }

    fn location(&self) -> &'static [&'static str] {
        &["neighbor", "afi-safis"]
    }

    fn enumerate(&self, parent: &TreePath, ctx: &ReadContext<'_>) -> Result<Vec<Key>> {
        Ok(dedup_keys(
            self.families(parent, ctx)?
                .into_iter()
                .map(|af| Key::single("afi-safi-name", af.canonical())),
        ))
    }

    fn hydrate(&self, path: &TreePath, ctx: &ReadContext<'_>) -> Result<ConfigNode> {
        let key = path.key_of("afi-safi")?;
        let name = path.key_value("afi-safi", "afi-safi-name")?;
        let found = self
            .families(path, ctx)?
            .into_iter()
            .find(|af| af.canonical() == name);
        Ok(match found {
            Some(af) => afi_safi_node(af),
            None => key_only_node("afi-safi", key),
        })
    }
}
