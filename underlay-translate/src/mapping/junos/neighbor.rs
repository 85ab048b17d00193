use config_tree_core::{ConfigNode, Key, TreePath};
use tracing::debug;

use crate::canonical::{self, Neighbor};
use crate::codec::parse_as;
use crate::context::{ReadContext, WriteContext};
use crate::error::{CodecResultExt, Result, StoreResultExt, TranslateError};
use crate::handler::{dedup_keys, key_only_node, ElementWriter, ListReader};
use crate::mapping::Settings;
use crate::reconcile::{relocate, Relocation, WriteMode};
use crate::underlay::{junos, Scope};
use crate::validate;

/// BGP neighbors onto `bgp/group/neighbor`.
///
/// The underlay address of a neighbor includes its group, so the canonical `peer-group` is
/// mandatory and a group change moves the neighbor. The group must already exist. A new
/// neighbor is written with `put`; a changed one in the same group is merged so that children
/// the mapping does not own survive. `peer-type` sets the `type` of the group.
#[derive(Debug, Clone)]
pub struct JunosNeighbor {
    settings: Settings,
}

impl JunosNeighbor {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    fn target(&self, path: &TreePath, neighbor: &Neighbor) -> Result<(TreePath, TreePath)> {
        let scope = self.settings.scope(path)?;
        let group = neighbor.peer_group.as_deref().ok_or_else(|| {
            TranslateError::validation(path, "peer-group is required for neighbors on this device")
        })?;
        Ok((
            junos::group(scope, group),
            junos::neighbor(scope, group, &neighbor.address.to_string()),
        ))
    }
}

/// Merge the group `type` implied by the neighbor's peer type, if it has one.
fn write_group_type(
    path: &TreePath,
    group: &TreePath,
    neighbor: &Neighbor,
    ctx: &WriteContext<'_>,
) -> Result<()> {
    let Some(peer_type) = neighbor.peer_type else {
        return Ok(());
    };
    ctx.store
        .merge(
            group,
            ConfigNode::new("group").with_leaf("type", junos::group_type(peer_type)),
        )
        .or_write_failed(path)
}

fn render(neighbor: &Neighbor) -> ConfigNode {
    let mut node = ConfigNode::new("neighbor")
        .with_leaf("name", neighbor.address.to_string())
        .with_opt_leaf("description", neighbor.description.as_deref())
        .with_opt_leaf("peer-as", neighbor.peer_as)
        .with_opt_leaf("authentication-key", neighbor.auth_password.as_deref());
    if neighbor.enabled == Some(false) {
        node = node.with_child(ConfigNode::new("disable"));
    }
    node
}

/// `(group, neighbor)` pairs of the BGP container, in document order.
fn members(bgp: &ConfigNode) -> impl Iterator<Item = (&ConfigNode, &ConfigNode)> {
    bgp.get_children("group").into_iter().flat_map(|group| {
        group
            .get_children("neighbor")
            .into_iter()
            .map(move |neighbor| (group, neighbor))
    })
}

impl ListReader for JunosNeighbor {
    fn list(&self) -> &'static str {
        "neighbor"
    }

    fn location(&self) -> &'static [&'static str] {
        &["bgp", "neighbors"]
    }

    fn enumerate(&self, parent: &TreePath, ctx: &ReadContext<'_>) -> Result<Vec<Key>> {
        let scope = self.settings.scope(parent)?;
        let Some(bgp) = ctx.read(parent, &junos::bgp(scope))? else {
            return Ok(Vec::new());
        };
        Ok(dedup_keys(
            members(&bgp)
                .filter_map(|(_, neighbor)| neighbor.leaf_text("name"))
                .map(|address| Key::single("neighbor-address", address)),
        ))
    }

    fn hydrate(&self, path: &TreePath, ctx: &ReadContext<'_>) -> Result<ConfigNode> {
        let key = path.key_of("neighbor")?;
        let address = path.key_value("neighbor", "neighbor-address")?;
        let scope: Scope<'_> = self.settings.scope(path)?;
        let Some(bgp) = ctx.read(path, &junos::bgp(scope))? else {
            return Ok(key_only_node("neighbor", key));
        };
        let found = members(&bgp).find(|(_, node)| node.leaf_text("name") == Some(address));
        let Some((group, node)) = found else {
            return Ok(key_only_node("neighbor", key));
        };
        let (Some(group_name), Ok(parsed)) = (group.leaf_text("name"), address.parse()) else {
            return Ok(key_only_node("neighbor", key));
        };

        let mut neighbor = Neighbor::new(parsed);
        neighbor.peer_group = Some(group_name.to_string());
        neighbor.peer_type = group.leaf_text("type").and_then(junos::peer_type);
        neighbor.peer_as = node.leaf_text("peer-as").and_then(|v| parse_as(v).ok());
        neighbor.description = node.leaf_text("description").map(str::to_string);
        neighbor.auth_password = node.leaf_text("authentication-key").map(str::to_string);
        neighbor.enabled = Some(node.get_child("disable").is_none());
        Ok(neighbor.to_node())
    }
}

impl ElementWriter for JunosNeighbor {
    fn write(&self, path: &TreePath, after: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        let neighbor = Neighbor::from_node(after).or_invalid(path)?;
        let (group, target) = self.target(path, &neighbor)?;
        validate::underlay_exists(ctx.store, path, &group)?;
        ctx.store.put(&target, render(&neighbor)).or_write_failed(path)?;
        write_group_type(path, &group, &neighbor, ctx)
    }

    /// A changed group moves the neighbor. Otherwise the owned fields are merged in place and
    /// cleared ones removed.
    fn update(
        &self,
        path: &TreePath,
        before: &ConfigNode,
        after: &ConfigNode,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let old = Neighbor::from_node(before).or_invalid(path)?;
        let new = Neighbor::from_node(after).or_invalid(path)?;
        let (group, target) = self.target(path, &new)?;
        if old.peer_group == new.peer_group {
            validate::underlay_exists(ctx.store, path, &group)?;
            ctx.store
                .safe_merge(&target, Some(&render(&old)), render(&new))
                .or_write_failed(path)?;
            return write_group_type(path, &group, &new, ctx);
        }
        let Some(old_group) = old.peer_group.as_deref() else {
            // Never written to the underlay.
            return self.write(path, after, ctx);
        };
        debug!(
            path = %path,
            from = old_group,
            to = new.peer_group.as_deref().unwrap_or_default(),
            "neighbor changes group"
        );
        let scope = self.settings.scope(path)?;
        relocate(
            ctx.store,
            path,
            Relocation {
                anchor: Some(group.clone()),
                from: junos::neighbor(scope, old_group, &old.address.to_string()),
                to: target,
                node: render(&new),
                mode: WriteMode::Replace,
                carry_over: false,
            },
        )?;
        write_group_type(path, &group, &new, ctx)
    }

    fn delete(&self, path: &TreePath, before: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        let neighbor = Neighbor::from_node(before).or_invalid(path)?;
        let (_, target) = self.target(path, &neighbor)?;
        ctx.store.delete(&target).or_write_failed(path)
    }
}

#[cfg(test)]
mod tests {
    use config_tree_core::{parse, ConfigNode};
    use pretty_assertions::assert_eq;

    use super::JunosNeighbor;
    use crate::canonical;
    use crate::context::{ReadContext, WriteContext};
    use crate::error::TranslateError;
    use crate::handler::{read_list, ElementWriter};
    use crate::mapping::Settings;
    use crate::store::{Datastore, MemoryStore, StoreOp, UnderlayAccess};
    use crate::underlay::{junos, Scope};

    fn store() -> MemoryStore {
        let underlay = parse(
            br#"<data><configuration><protocols><bgp>
  <group><name>A</name><type>external</type>
    <neighbor><name>10.0.0.1</name><peer-as>65001</peer-as><description>upstream</description>
      <family><inet><unicast/></inet></family></neighbor>
  </group>
  <group><name>B</name></group>
</bgp></protocols></configuration></data>"#,
        )
        .expect("parse");
        MemoryStore::seeded(underlay, junos::key_fields_registry())
    }

    fn neighbor(group: &str) -> ConfigNode {
        parse(
            format!(
                "<neighbor><neighbor-address>10.0.0.1</neighbor-address><config>\
                 <neighbor-address>10.0.0.1</neighbor-address><peer-as>65001</peer-as>\
                 <peer-group>{group}</peer-group></config></neighbor>"
            )
            .as_bytes(),
        )
        .expect("parse")
    }

    fn path() -> config_tree_core::TreePath {
        canonical::neighbor("default", "default", "10.0.0.1")
    }

    #[test]
    fn reads_group_membership() {
        let store = store();
        let ctx = ReadContext::new(&store, Datastore::Config);
        let list = read_list(
            &JunosNeighbor::new(Settings::default()),
            &canonical::bgp_neighbors("default", "default"),
            &ctx,
        )
        .expect("read");
        let neighbors = list.get_children("neighbor");
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].get_text(&["config", "peer-group"]), Some("A"));
        assert_eq!(neighbors[0].get_text(&["config", "peer-as"]), Some("65001"));
        assert_eq!(neighbors[0].get_text(&["config", "description"]), Some("upstream"));
        assert_eq!(neighbors[0].get_text(&["config", "enabled"]), Some("true"));
        assert_eq!(neighbors[0].get_text(&["config", "peer-type"]), Some("EXTERNAL"));
    }

    #[test]
    fn same_group_update_merges_and_keeps_family() {
        let store = store();
        let tree = ConfigNode::new("data");
        let ctx = WriteContext::new(&store, &tree, &tree);
        let mut before = neighbor("A");
        if let Some(config) = before.get_child_mut("config") {
            config.set_leaf("description", "upstream");
        }

        JunosNeighbor::new(Settings::default())
            .update(&path(), &before, &neighbor("A"), &ctx)
            .expect("update");

        let mutations = store.mutations().expect("journal");
        assert!(mutations.iter().all(|call| call.op != StoreOp::Put));
        let node = store
            .read(&junos::neighbor(Scope::Default, "A", "10.0.0.1"), Datastore::Config)
            .expect("read")
            .expect("neighbor");
        assert!(node.get_child("family").is_some());
        assert_eq!(node.leaf_text("description"), None);
        assert_eq!(node.leaf_text("peer-as"), Some("65001"));
    }

    #[test]
    fn same_group_update_requires_group() {
        let underlay = parse(
            br#"<data><configuration><protocols><bgp><group><name>B</name></group></bgp></protocols></configuration></data>"#,
        )
        .expect("parse");
        let store = MemoryStore::seeded(underlay, junos::key_fields_registry());
        let tree = ConfigNode::new("data");
        let mut after = neighbor("A");
        if let Some(config) = after.get_child_mut("config") {
            config.set_leaf("description", "changed");
        }

        let err = JunosNeighbor::new(Settings::default())
            .update(&path(), &neighbor("A"), &after, &WriteContext::new(&store, &tree, &tree))
            .expect_err("group A missing");
        assert!(matches!(err, TranslateError::ValidationFailed { .. }));
        assert!(store.mutations().expect("journal").is_empty());
    }

    #[test]
    fn peer_type_sets_group_type() {
        let store = store();
        let tree = ConfigNode::new("data");
        let ctx = WriteContext::new(&store, &tree, &tree);
        let mut internal = neighbor("B");
        if let Some(config) = internal.get_child_mut("config") {
            config.set_leaf("peer-type", "INTERNAL");
            config.set_leaf("neighbor-address", "10.0.0.2");
        }
        internal.set_leaf("neighbor-address", "10.0.0.2");
        let address = canonical::neighbor("default", "default", "10.0.0.2");

        JunosNeighbor::new(Settings::default())
            .write(&address, &internal, &ctx)
            .expect("write");

        let group = store
            .read(&junos::group(Scope::Default, "B"), Datastore::Config)
            .expect("read")
            .expect("group");
        assert_eq!(group.leaf_text("type"), Some("internal"));
        assert!(group.get_child("neighbor").is_some());
    }

    #[test]
    fn group_change_moves_neighbor() {
        let store = store();
        let tree = ConfigNode::new("data");
        let ctx = WriteContext::new(&store, &tree, &tree);

        JunosNeighbor::new(Settings::default())
            .update(&path(), &neighbor("A"), &neighbor("B"), &ctx)
            .expect("move");

        let mutations = store.mutations().expect("journal");
        let ops: Vec<_> = mutations.iter().map(|call| call.op).collect();
        assert_eq!(ops, vec![StoreOp::Delete, StoreOp::Put]);
        assert!(mutations[0].path.to_string().contains("group[name=A]"));
        assert!(mutations[1].path.to_string().contains("group[name=B]"));
    }

    #[test]
    fn missing_group_fails_before_mutation() {
        let store = store();
        let tree = ConfigNode::new("data");
        let ctx = WriteContext::new(&store, &tree, &tree);
        let handler = JunosNeighbor::new(Settings::default());

        let err = handler
            .update(&path(), &neighbor("A"), &neighbor("C"), &ctx)
            .expect_err("no group C");
        assert!(matches!(err, TranslateError::ValidationFailed { .. }));

        let mut ungrouped = neighbor("A");
        if let Some(config) = ungrouped.get_child_mut("config") {
            config.children.retain(|leaf| leaf.tag != "peer-group");
        }
        let err = handler
            .write(&path(), &ungrouped, &ctx)
            .expect_err("group required");
        assert!(matches!(err, TranslateError::ValidationFailed { .. }));
        assert!(store.mutations().expect("journal").is_empty());
    }
}
