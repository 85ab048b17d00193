use config_tree_core::{ConfigNode, Key, TreePath};

use crate::canonical::{self, Area, AreaInterface, MaxMetric, MaxMetricInclude};
use crate::codec::AreaId;
use crate::context::{ReadContext, WriteContext};
use crate::error::{CodecResultExt, Result, StoreResultExt};
use crate::handler::{key_only_node, ElementWriter, ListReader};
use crate::mapping::{children_at, protocol_node, Settings};
use crate::underlay::{xr, Scope};

/// OSPF `protocol` entries onto `ospf/processes/process`.
#[derive(Debug, Clone)]
pub struct XrOspfProtocol {
    settings: Settings,
}

impl XrOspfProtocol {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

/// True when `process` carries configuration for `scope`.
fn serves(process: &ConfigNode, scope: Scope<'_>) -> bool {
    match scope {
        Scope::Default => true,
        Scope::Vrf(name) => children_at(process, &["vrfs"], "vrf")
            .iter()
            .any(|vrf| vrf.leaf_text("vrf-name") == Some(name)),
    }
}

impl ListReader for XrOspfProtocol {
    fn list(&self) -> &'static str {
        canonical::PROTOCOL
    }

    fn location(&self) -> &'static [&'static str] {
        &["protocols"]
    }

    fn enumerate(&self, parent: &TreePath, ctx: &ReadContext<'_>) -> Result<Vec<Key>> {
        let scope = self.settings.scope(parent)?;
        let Some(processes) = ctx.read(parent, &xr::OSPF_PROCESSES)? else {
            return Ok(Vec::new());
        };
        Ok(processes
            .get_children("process")
            .into_iter()
            .filter(|process| serves(process, scope))
            .filter_map(|process| process.leaf_text("process-name"))
            .map(|name| canonical::protocol_key(canonical::OSPF, name))
            .collect())
    }

    fn hydrate(&self, path: &TreePath, _ctx: &ReadContext<'_>) -> Result<ConfigNode> {
        Ok(protocol_node(path.key_of(canonical::PROTOCOL)?))
    }
}

impl ElementWriter for XrOspfProtocol {
    fn write(&self, path: &TreePath, _after: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        let (_, process) = canonical::protocol_scope(path)?;
        ctx.store
            .merge(
                &xr::ospf_process(process),
                ConfigNode::new("process").with_leaf("start", "true"),
            )
            .or_write_failed(path)
    }

    fn delete(&self, path: &TreePath, _before: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        let (_, process) = canonical::protocol_scope(path)?;
        let target = match self.settings.scope(path)? {
            Scope::Default => xr::ospf_process(process),
            Scope::Vrf(vrf) => xr::ospf_process(process)
                .child("vrfs")
                .child_keyed("vrf", Key::single("vrf-name", vrf)),
        };
        ctx.store.safe_delete(&target).or_write_failed(path)
    }
}

/// `ospfv2/areas/area` onto `area-area-id` (numeric ids) or `area-address` (dotted ids).
#[derive(Debug, Clone)]
pub struct XrArea {
    settings: Settings,
}

impl XrArea {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    fn target(&self, path: &TreePath, area: &AreaId) -> Result<TreePath> {
        let (_, process) = canonical::protocol_scope(path)?;
        Ok(xr::area(process, self.settings.scope(path)?, area))
    }
}

impl ListReader for XrArea {
    fn list(&self) -> &'static str {
        "area"
    }

    fn location(&self) -> &'static [&'static str] {
        &["ospfv2", "areas"]
    }

    fn enumerate(&self, parent: &TreePath, ctx: &ReadContext<'_>) -> Result<Vec<Key>> {
        let (_, process) = canonical::protocol_scope(parent)?;
        let scope = self.settings.scope(parent)?;
        let Some(areas) = ctx.read(parent, &xr::area_addresses(process, scope))? else {
            return Ok(Vec::new());
        };
        let numeric = areas
            .get_children("area-area-id")
            .into_iter()
            .filter_map(|area| area.leaf_text("area-id"));
        let dotted = areas
            .get_children("area-address")
            .into_iter()
            .filter_map(|area| area.leaf_text("address"));
        Ok(numeric
            .chain(dotted)
            .map(|id| Key::single("identifier", id))
            .collect())
    }

    fn hydrate(&self, path: &TreePath, ctx: &ReadContext<'_>) -> Result<ConfigNode> {
        let key = path.key_of("area")?;
        let identifier = AreaId::parse(path.key_value("area", "identifier")?).or_invalid(path)?;
        let present = ctx.read(path, &self.target(path, &identifier)?)?.is_some();
        Ok(if present {
            Area { identifier }.to_node()
        } else {
            key_only_node("area", key)
        })
    }
}

impl ElementWriter for XrArea {
    fn write(&self, path: &TreePath, after: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        let area = Area::from_node(after).or_invalid(path)?;
        let (list, _) = xr::area_tags(&area.identifier);
        ctx.store
            .merge(
                &self.target(path, &area.identifier)?,
                ConfigNode::new(list).with_leaf("running", "true"),
            )
            .or_write_failed(path)
    }

    fn delete(&self, path: &TreePath, before: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        let area = Area::from_node(before).or_invalid(path)?;
        ctx.store
            .delete(&self.target(path, &area.identifier)?)
            .or_write_failed(path)
    }
}

/// `areas/area/interfaces/interface` onto the `name-scope` entries of the underlay area.
#[derive(Debug, Clone)]
pub struct XrAreaInterface {
    settings: Settings,
}

impl XrAreaInterface {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    fn area(&self, path: &TreePath) -> Result<(String, AreaId)> {
        let (_, process) = canonical::protocol_scope(path)?;
        let area = AreaId::parse(path.key_value("area", "identifier")?).or_invalid(path)?;
        Ok((process.to_string(), area))
    }

    fn target(&self, path: &TreePath, interface: &str) -> Result<TreePath> {
        let (process, area) = self.area(path)?;
        Ok(xr::name_scope(&process, self.settings.scope(path)?, &area, interface))
    }
}

fn render_interface(interface: &AreaInterface) -> ConfigNode {
    ConfigNode::new("name-scope")
        .with_leaf("running", "true")
        .with_opt_leaf("cost", interface.metric)
}

impl ListReader for XrAreaInterface {
    fn list(&self) -> &'static str {
        "interface"
    }

    fn location(&self) -> &'static [&'static str] {
        &["area", "interfaces"]
    }

    fn enumerate(&self, parent: &TreePath, ctx: &ReadContext<'_>) -> Result<Vec<Key>> {
        let (process, area) = self.area(parent)?;
        let scopes = xr::area(&process, self.settings.scope(parent)?, &area).child("name-scopes");
        let Some(scopes) = ctx.read(parent, &scopes)? else {
            return Ok(Vec::new());
        };
        Ok(scopes
            .get_children("name-scope")
            .into_iter()
            .filter_map(|scope| scope.leaf_text("interface-name"))
            .map(|name| Key::single("id", name))
            .collect())
    }

    fn hydrate(&self, path: &TreePath, ctx: &ReadContext<'_>) -> Result<ConfigNode> {
        let key = path.key_of("interface")?;
        let id = path.key_value("interface", "id")?;
        let Some(scope) = ctx.read(path, &self.target(path, id)?)? else {
            return Ok(key_only_node("interface", key));
        };
        Ok(AreaInterface {
            id: id.to_string(),
            metric: scope.leaf_text("cost").and_then(|cost| cost.parse().ok()),
        }
        .to_node())
    }
}

impl ElementWriter for XrAreaInterface {
    fn write(&self, path: &TreePath, after: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        let interface = AreaInterface::from_node(after).or_invalid(path)?;
        ctx.store
            .merge(&self.target(path, &interface.id)?, render_interface(&interface))
            .or_write_failed(path)
    }

    /// A dropped metric removes the cost; other name-scope settings stay.
    fn update(
        &self,
        path: &TreePath,
        before: &ConfigNode,
        after: &ConfigNode,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let old = AreaInterface::from_node(before).or_invalid(path)?;
        let new = AreaInterface::from_node(after).or_invalid(path)?;
        ctx.store
            .safe_merge(
                &self.target(path, &new.id)?,
                Some(&render_interface(&old)),
                render_interface(&new),
            )
            .or_write_failed(path)
    }

    fn delete(&self, path: &TreePath, before: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        let interface = AreaInterface::from_node(before).or_invalid(path)?;
        ctx.store
            .delete(&self.target(path, &interface.id)?)
            .or_write_failed(path)
    }
}

/// Underlay flag of each max-metric include.
fn include_flag(include: MaxMetricInclude) -> &'static str {
    match include {
        MaxMetricInclude::Stub => "include-stub",
        MaxMetricInclude::Type2External => "external-lsa",
        MaxMetricInclude::SummaryLsa => "summary-lsa",
    }
}

/// `ospfv2/global/timers/max-metric` onto `max-metric/max-metric-on-startup` of the process
/// scope.
#[derive(Debug, Clone)]
pub struct XrMaxMetric {
    settings: Settings,
}

impl XrMaxMetric {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    fn target(&self, path: &TreePath) -> Result<TreePath> {
        let (_, process) = canonical::protocol_scope(path)?;
        Ok(xr::max_metric_on_startup(process, self.settings.scope(path)?))
    }

    fn render(&self, path: &TreePath, element: &ConfigNode) -> Result<ConfigNode> {
        let max_metric = MaxMetric::from_node(element).or_invalid(path)?;
        Ok(max_metric
            .include
            .into_iter()
            .fold(ConfigNode::new("max-metric-on-startup"), |node, include| {
                node.with_leaf(include_flag(include), "true")
            }))
    }
}

impl ListReader for XrMaxMetric {
    fn list(&self) -> &'static str {
        "max-metric"
    }

    fn location(&self) -> &'static [&'static str] {
        &["ospfv2", "global", "timers"]
    }

    fn enumerate(&self, parent: &TreePath, ctx: &ReadContext<'_>) -> Result<Vec<Key>> {
        let present = ctx.read(parent, &self.target(parent)?)?.is_some();
        Ok(present.then(Key::default).into_iter().collect())
    }

    fn hydrate(&self, path: &TreePath, ctx: &ReadContext<'_>) -> Result<ConfigNode> {
        let Some(node) = ctx.read(path, &self.target(path)?)? else {
            return Ok(ConfigNode::new("max-metric"));
        };
        let include = MaxMetricInclude::ALL
            .into_iter()
            .filter(|include| node.leaf_text(include_flag(*include)) == Some("true"))
            .collect();
        Ok(MaxMetric { include }.to_node())
    }
}

impl ElementWriter for XrMaxMetric {
    fn write(&self, path: &TreePath, after: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        ctx.store
            .merge(&self.target(path)?, self.render(path, after)?)
            .or_write_failed(path)
    }

    fn update(
        &self,
        path: &TreePath,
        before: &ConfigNode,
        after: &ConfigNode,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let before = self.render(path, before)?;
        ctx.store
            .safe_merge(&self.target(path)?, Some(&before), self.render(path, after)?)
            .or_write_failed(path)
    }

    fn delete(&self, path: &TreePath, _before: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        ctx.store.delete(&self.target(path)?).or_write_failed(path)
    }
}
