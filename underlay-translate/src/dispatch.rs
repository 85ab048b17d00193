//! Several mutually exclusive underlay subsystems behind one canonical list.
//!
//! Entries are evaluated in registration order. Reads union the keys of every claiming
//! entry; writes go to the first entry whose [`Check`] claims the element.

use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};

use config_tree_core::{ConfigNode, Key, TreePath};
use tracing::{debug, warn};

use crate::checks::{Check, PassThrough};
use crate::context::{ReadContext, WriteContext};
use crate::error::{Result, TranslateError};
use crate::handler::{key_only_node, ElementWriter, ListReader};

/// Variant of an elementary handler inside a composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerTag {
    Bgp,
    Ospf,
    Static,
    DefaultInstance,
    VrfInstance,
    PassThrough,
}

impl Display for HandlerTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandlerTag::Bgp => "bgp",
            HandlerTag::Ospf => "ospf",
            HandlerTag::Static => "static",
            HandlerTag::DefaultInstance => "default-instance",
            HandlerTag::VrfInstance => "vrf-instance",
            HandlerTag::PassThrough => "pass-through",
        };
        f.write_str(name)
    }
}

/// One (check, reader, writer) record.
pub struct DispatchEntry {
    pub tag: HandlerTag,
    pub check: Box<dyn Check>,
    pub reader: Option<Box<dyn ListReader>>,
    pub writer: Option<Box<dyn ElementWriter>>,
}

impl DispatchEntry {
    pub fn new(tag: HandlerTag, check: impl Check + 'static) -> Self {
        Self {
            tag,
            check: Box::new(check),
            reader: None,
            writer: None,
        }
    }

    pub fn reader(mut self, reader: impl ListReader + 'static) -> Self {
        self.reader = Some(Box::new(reader));
        self
    }

    pub fn writer(mut self, writer: impl ElementWriter + 'static) -> Self {
        self.writer = Some(Box::new(writer));
        self
    }
}

/// Ordered dispatch table for one canonical list.
pub struct CompositeHandler {
    location: &'static [&'static str],
    list: &'static str,
    entries: Vec<DispatchEntry>,
}

impl CompositeHandler {
    pub fn new(location: &'static [&'static str], list: &'static str) -> Self {
        Self {
            location,
            list,
            entries: Vec::new(),
        }
    }

    pub fn with(mut self, entry: DispatchEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Register a catch-all entry that accepts unclaimed writes as no-ops.
    pub fn with_pass_through(self) -> Self {
        self.with(DispatchEntry::new(HandlerTag::PassThrough, PassThrough))
    }

    pub fn tags(&self) -> Vec<HandlerTag> {
        self.entries.iter().map(|entry| entry.tag).collect()
    }

    /// Tags of every entry whose check claims the element.
    pub fn claimants(
        &self,
        path: &TreePath,
        ctx: Option<&WriteContext<'_>>,
        is_delete: bool,
    ) -> Vec<HandlerTag> {
        self.entries
            .iter()
            .filter(|entry| entry.check.claims(path, ctx, is_delete))
            .map(|entry| entry.tag)
            .collect()
    }

    fn claiming(
        &self,
        path: &TreePath,
        ctx: Option<&WriteContext<'_>>,
        is_delete: bool,
    ) -> Result<&DispatchEntry> {
        let claimants = self.claimants(path, ctx, is_delete);
        let real: Vec<_> = claimants
            .iter()
            .filter(|tag| **tag != HandlerTag::PassThrough)
            .collect();
        if real.len() > 1 {
            warn!(path = %path, claimants = ?real, "more than one handler claims element");
        }
        self.entries
            .iter()
            .find(|entry| entry.check.claims(path, ctx, is_delete))
            .ok_or_else(|| TranslateError::UnsupportedElement { path: path.clone() })
    }

    fn writer_for(
        &self,
        path: &TreePath,
        ctx: &WriteContext<'_>,
        is_delete: bool,
    ) -> Result<Option<&dyn ElementWriter>> {
        let entry = self.claiming(path, Some(ctx), is_delete)?;
        debug!(path = %path, handler = %entry.tag, "dispatching write");
        Ok(entry.writer.as_deref())
    }
}

impl ListReader for CompositeHandler {
    fn list(&self) -> &'static str {
        self.list
    }

    fn location(&self) -> &'static [&'static str] {
        self.location
    }

    fn enumerate(&self, parent: &TreePath, ctx: &ReadContext<'_>) -> Result<Vec<Key>> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for entry in &self.entries {
            let Some(reader) = entry.reader.as_deref() else {
                continue;
            };
            if !entry.check.claims(parent, None, false) {
                continue;
            }
            for key in reader.enumerate(parent, ctx)? {
                if !seen.insert(key.clone()) {
                    return Err(TranslateError::KeyCollision {
                        path: parent.clone(),
                        key,
                    });
                }
                keys.push(key);
            }
        }
        Ok(keys)
    }

    fn hydrate(&self, path: &TreePath, ctx: &ReadContext<'_>) -> Result<ConfigNode> {
        let reader = self
            .entries
            .iter()
            .filter(|entry| entry.check.claims(path, None, false))
            .find_map(|entry| entry.reader.as_deref());
        match reader {
            Some(reader) => reader.hydrate(path, ctx),
            None => {
                let key = path.key_of(self.list)?;
                Ok(key_only_node(self.list, key))
            }
        }
    }
}

impl ElementWriter for CompositeHandler {
    fn write(&self, path: &TreePath, after: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        match self.writer_for(path, ctx, false)? {
            Some(writer) => writer.write(path, after, ctx),
            None => Ok(()),
        }
    }

    fn update(
        &self,
        path: &TreePath,
        before: &ConfigNode,
        after: &ConfigNode,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        match self.writer_for(path, ctx, false)? {
            Some(writer) => writer.update(path, before, after, ctx),
            None => Ok(()),
        }
    }

    fn delete(&self, path: &TreePath, before: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        match self.writer_for(path, ctx, true)? {
            Some(writer) => writer.delete(path, before, ctx),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use config_tree_core::{ConfigNode, Key, TreePath};

    use super::{CompositeHandler, DispatchEntry, HandlerTag};
    use crate::checks::{Check, ProtocolCheck};
    use crate::context::{ReadContext, WriteContext};
    use crate::error::{Result, TranslateError};
    use crate::handler::{ElementWriter, ListReader};
    use crate::store::{Datastore, MemoryStore, UnderlayAccess};

    struct Always;

    impl Check for Always {
        fn claims(&self, _: &TreePath, _: Option<&WriteContext<'_>>, _: bool) -> bool {
            true
        }
    }

    struct Fixed(&'static str);

    impl ListReader for Fixed {
        fn list(&self) -> &'static str {
            "protocol"
        }

        fn location(&self) -> &'static [&'static str] {
            &["protocols"]
        }

        fn enumerate(&self, _: &TreePath, _: &ReadContext<'_>) -> Result<Vec<Key>> {
            Ok(vec![Key::single("identifier", self.0).with("name", "default")])
        }

        fn hydrate(&self, path: &TreePath, _: &ReadContext<'_>) -> Result<ConfigNode> {
            let key = path.key_of("protocol")?;
            Ok(crate::handler::key_only_node("protocol", key))
        }
    }

    struct Marker(&'static str);

    impl ElementWriter for Marker {
        fn write(&self, _: &TreePath, _: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
            let path = TreePath::root().child(self.0);
            ctx.store
                .merge(&path, ConfigNode::new(self.0))
                .map_err(|source| TranslateError::WriteFailed { path, source })
        }

        fn delete(&self, _: &TreePath, _: &ConfigNode, _: &WriteContext<'_>) -> Result<()> {
            Ok(())
        }
    }

    fn protocols() -> TreePath {
        "/network-instances/network-instance[name=default]/protocols"
            .parse()
            .expect("path")
    }

    fn protocol(identifier: &str) -> TreePath {
        protocols().child_keyed(
            "protocol",
            Key::single("identifier", identifier).with("name", "default"),
        )
    }

    fn composite() -> CompositeHandler {
        CompositeHandler::new(&["protocols"], "protocol")
            .with(
                DispatchEntry::new(HandlerTag::Bgp, ProtocolCheck::new("BGP"))
                    .reader(Fixed("BGP"))
                    .writer(Marker("bgp")),
            )
            .with(
                DispatchEntry::new(HandlerTag::Ospf, ProtocolCheck::new("OSPF"))
                    .reader(Fixed("OSPF"))
                    .writer(Marker("ospf")),
            )
    }

    #[test]
    fn read_unions_keys_in_entry_order() {
        let store = MemoryStore::default();
        let ctx = ReadContext::new(&store, Datastore::Config);
        let keys = composite().enumerate(&protocols(), &ctx).expect("enumerate");
        let ids: Vec<_> = keys.iter().filter_map(|k| k.get("identifier")).collect();
        assert_eq!(ids, vec!["BGP", "OSPF"]);
    }

    #[test]
    fn overlapping_readers_collide() {
        let handler = CompositeHandler::new(&["protocols"], "protocol")
            .with(DispatchEntry::new(HandlerTag::Bgp, Always).reader(Fixed("BGP")))
            .with(DispatchEntry::new(HandlerTag::Static, Always).reader(Fixed("BGP")));
        let store = MemoryStore::default();
        let ctx = ReadContext::new(&store, Datastore::Config);

        let err = handler.enumerate(&protocols(), &ctx).expect_err("collision");
        assert!(matches!(err, TranslateError::KeyCollision { .. }));
    }

    #[test]
    fn checks_are_disjoint_per_element() {
        let handler = composite();
        let tree = ConfigNode::new("data");
        let store = MemoryStore::default();
        let ctx = WriteContext::new(&store, &tree, &tree);

        assert_eq!(
            handler.claimants(&protocol("BGP"), Some(&ctx), false),
            vec![HandlerTag::Bgp]
        );
        assert_eq!(
            handler.claimants(&protocol("OSPF"), Some(&ctx), true),
            vec![HandlerTag::Ospf]
        );
        assert!(handler.claimants(&protocol("ISIS"), Some(&ctx), false).is_empty());
    }

    #[test]
    fn write_goes_to_first_claimant() {
        let handler = composite();
        let tree = ConfigNode::new("data");
        let store = MemoryStore::default();
        let ctx = WriteContext::new(&store, &tree, &tree);

        handler
            .write(&protocol("OSPF"), &ConfigNode::new("protocol"), &ctx)
            .expect("write");
        let mutations = store.mutations().expect("journal");
        assert_eq!(mutations.len(), 1);
        assert_eq!(mutations[0].path.to_string(), "/ospf");
    }

    #[test]
    fn unclaimed_write_is_unsupported_without_pass_through() {
        let tree = ConfigNode::new("data");
        let store = MemoryStore::default();
        let ctx = WriteContext::new(&store, &tree, &tree);
        let node = ConfigNode::new("protocol");

        let err = composite()
            .write(&protocol("ISIS"), &node, &ctx)
            .expect_err("unsupported");
        assert!(matches!(err, TranslateError::UnsupportedElement { .. }));

        composite()
            .with_pass_through()
            .write(&protocol("ISIS"), &node, &ctx)
            .expect("pass-through");
        assert!(store.calls().expect("journal").is_empty());
    }
}
