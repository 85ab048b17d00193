//! Canonical list name to handler table for one device profile.

use std::collections::BTreeMap;
use std::sync::Arc;

use config_tree_core::{ConfigNode, Step, TreePath};
use tracing::debug;

use crate::context::{ChangeSet, ReadContext, WriteContext};
use crate::error::{Result, TranslateError};
use crate::handler::{self, ElementWriter, ListReader};
use crate::mapping::{junos, xr};
use crate::profile::{DeviceProfile, ProfileLoadError, UnderlayFlavor};
use crate::store::UnderlayAccess;

/// Canonical lists each flavor can translate.
pub fn supported_lists(flavor: UnderlayFlavor) -> &'static [&'static str] {
    match flavor {
        UnderlayFlavor::Xr => &[
            "protocol",
            "global",
            "neighbor",
            "peer-group",
            "afi-safi",
            "aggregate",
            "area",
            "interface",
            "max-metric",
            "static",
            "next-hop",
            "ext-community-set",
        ],
        UnderlayFlavor::Junos => &["protocol", "neighbor", "aggregate"],
    }
}

/// Handlers of one canonical list at one location.
struct Slot {
    location: &'static [&'static str],
    reader: Arc<dyn ListReader>,
    writer: Option<Arc<dyn ElementWriter>>,
}

impl Slot {
    /// True when the steps of `parent` end with the slot location.
    fn serves(&self, parent: &[Step]) -> bool {
        parent.len() >= self.location.len()
            && parent[parent.len() - self.location.len()..]
                .iter()
                .zip(self.location)
                .all(|(step, name)| step.node == *name)
    }
}

/// Readers and writers keyed by canonical list node name and the steps above it.
///
/// A list may have a reader without a writer (`next-hop` is read-only); writing it is
/// unsupported. Two handlers may share a list name when their locations differ.
#[derive(Default)]
pub struct Registry {
    slots: BTreeMap<&'static str, Vec<Slot>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every list the profile enables.
    pub fn for_profile(profile: &DeviceProfile) -> std::result::Result<Self, ProfileLoadError> {
        let supported = supported_lists(profile.underlay);
        if let Some(unknown) = profile
            .enabled_handlers
            .iter()
            .find(|list| !supported.contains(&list.as_str()))
        {
            return Err(ProfileLoadError::UnknownHandler {
                list: unknown.clone(),
                flavor: profile.underlay,
            });
        }

        let settings = profile.settings();
        let mut registry = Registry::new();
        match profile.underlay {
            UnderlayFlavor::Xr => {
                registry.register(Arc::new(xr::protocol_handler(&settings)));
                registry.register(Arc::new(xr::XrBgpGlobal::new(settings.clone())));
                registry.register(Arc::new(xr::neighbor_handler(&settings)));
                registry.register(Arc::new(xr::XrPeerGroup::new(settings.clone())));
                registry.register_reader(Arc::new(xr::XrNeighborAfiSafi::new(settings.clone())));
                registry.register(Arc::new(xr::XrAggregate::new(settings.clone())));
                registry.register(Arc::new(xr::XrArea::new(settings.clone())));
                registry.register(Arc::new(xr::XrAreaInterface::new(settings.clone())));
                registry.register(Arc::new(xr::XrMaxMetric::new(settings.clone())));
                registry.register(Arc::new(xr::XrStaticRoute::new(settings.clone())));
                registry.register_reader(Arc::new(xr::XrNextHop::new(settings.clone())));
                registry.register(Arc::new(xr::XrRouteTargetSet));
            }
            UnderlayFlavor::Junos => {
                registry.register(Arc::new(junos::protocol_handler(&settings)));
                registry.register(Arc::new(junos::JunosNeighbor::new(settings.clone())));
                registry.register(Arc::new(junos::JunosAggregate::new(settings.clone())));
            }
        }
        registry.slots.retain(|list, _| profile.enables(list));
        Ok(registry)
    }

    /// Register a handler that both reads and writes its list.
    pub fn register<H>(&mut self, handler: Arc<H>)
    where
        H: ListReader + ElementWriter + 'static,
    {
        let writer: Arc<dyn ElementWriter> = handler.clone();
        self.insert(handler, Some(writer));
    }

    pub fn register_reader(&mut self, reader: Arc<dyn ListReader>) {
        self.insert(reader, None);
    }

    fn insert(&mut self, reader: Arc<dyn ListReader>, writer: Option<Arc<dyn ElementWriter>>) {
        let location = reader.location();
        let slots = self.slots.entry(reader.list()).or_default();
        slots.retain(|slot| slot.location != location);
        slots.push(Slot {
            location,
            reader,
            writer,
        });
    }

    /// Most specific slot of `list` serving `parent`.
    fn slot(&self, parent: &TreePath, list: &str) -> Option<&Slot> {
        self.slots
            .get(list)?
            .iter()
            .filter(|slot| slot.serves(parent.steps()))
            .max_by_key(|slot| slot.location.len())
    }

    /// Registered list names, sorted.
    pub fn lists(&self) -> Vec<&'static str> {
        self.slots.keys().copied().collect()
    }

    /// True when some handler of `list` writes.
    pub fn is_writable(&self, list: &str) -> bool {
        self.slots
            .get(list)
            .is_some_and(|slots| slots.iter().any(|slot| slot.writer.is_some()))
    }

    /// Rebuild the canonical `list` under `parent` from the underlay.
    pub fn read_list(&self, parent: &TreePath, list: &str, ctx: &ReadContext<'_>) -> Result<ConfigNode> {
        let slot = self
            .slot(parent, list)
            .ok_or_else(|| TranslateError::UnsupportedElement {
                path: parent.child(list),
            })?;
        handler::read_list(slot.reader.as_ref(), parent, ctx)
    }

    /// Dispatch one element change to the writer of the list the path ends in.
    pub fn apply_change(&self, path: &TreePath, change: &ChangeSet, ctx: &WriteContext<'_>) -> Result<()> {
        let list = path.last().map(|step| step.node.as_str()).unwrap_or_default();
        let writer = self
            .slot(&path.parent(), list)
            .and_then(|slot| slot.writer.as_ref())
            .ok_or_else(|| TranslateError::UnsupportedElement { path: path.clone() })?;
        debug!(path = %path, kind = ?change.kind(), "applying change");
        handler::apply_change(writer.as_ref(), path, change, ctx)
    }

    /// Apply the change of the element at `path` between two full canonical trees.
    pub fn apply(
        &self,
        path: &TreePath,
        before: &ConfigNode,
        after: &ConfigNode,
        store: &dyn UnderlayAccess,
    ) -> Result<()> {
        let change = ChangeSet::between(path, before, after);
        let ctx = WriteContext::new(store, before, after);
        self.apply_change(path, &change, &ctx)
    }
}
