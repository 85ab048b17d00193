use config_tree_core::{ConfigNode, Key, TreePath};

use crate::canonical::Aggregate;
use crate::codec::IpPrefix;
use crate::context::{ReadContext, WriteContext};
use crate::error::{CodecResultExt, Result, StoreResultExt, TranslateError};
use crate::handler::{dedup_keys, key_only_node, ElementWriter, ListReader};
use crate::mapping::Settings;
use crate::underlay::{junos, Scope};

/// `local-aggregates/aggregate` of a VRF onto `routing-options/aggregate/route` of its
/// routing instance. The default instance has no aggregates.
#[derive(Debug, Clone)]
pub struct JunosAggregate {
    settings: Settings,
}

impl JunosAggregate {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    fn vrf<'p>(&self, path: &'p TreePath) -> Result<Option<&'p str>> {
        Ok(match self.settings.scope(path)? {
            Scope::Default => None,
            Scope::Vrf(vrf) => Some(vrf),
        })
    }

    fn target(&self, path: &TreePath, aggregate: &Aggregate) -> Result<TreePath> {
        let vrf = self.vrf(path)?.ok_or_else(|| {
            TranslateError::validation(path, "aggregates are only supported in VRF routing instances")
        })?;
        Ok(junos::aggregate_route(vrf, &aggregate.prefix.to_string()))
    }
}

fn render(aggregate: &Aggregate) -> ConfigNode {
    let mut node = ConfigNode::new("route").with_leaf("name", aggregate.prefix.to_string());
    if aggregate.summary_only == Some(true) {
        node = node.with_child(ConfigNode::new("summary-only"));
    }
    aggregate
        .policies
        .iter()
        .fold(node, |node, policy| node.with_leaf("policy", policy.as_str()))
}

fn parse_underlay(prefix: IpPrefix, route: &ConfigNode) -> Aggregate {
    Aggregate {
        prefix,
        summary_only: route.get_child("summary-only").map(|_| true),
        policies: route
            .get_children("policy")
            .into_iter()
            .filter_map(|policy| policy.text.clone())
            .collect(),
    }
}

impl ListReader for JunosAggregate {
    fn list(&self) -> &'static str {
        "aggregate"
    }

    fn location(&self) -> &'static [&'static str] {
        &["local-aggregates"]
    }

    fn enumerate(&self, parent: &TreePath, ctx: &ReadContext<'_>) -> Result<Vec<Key>> {
        let Some(vrf) = self.vrf(parent)? else {
            return Ok(Vec::new());
        };
        let Some(routes) = ctx.read(parent, &junos::aggregate_routes(vrf))? else {
            return Ok(Vec::new());
        };
        Ok(dedup_keys(
            routes
                .get_children("route")
                .into_iter()
                .filter_map(|route| IpPrefix::parse(route.leaf_text("name")?).ok())
                .map(|prefix| Key::single("prefix", prefix.to_string())),
        ))
    }

    fn hydrate(&self, path: &TreePath, ctx: &ReadContext<'_>) -> Result<ConfigNode> {
        let key = path.key_of("aggregate")?;
        let prefix = IpPrefix::parse(path.key_value("aggregate", "prefix")?).or_invalid(path)?;
        let Some(vrf) = self.vrf(path)? else {
            return Ok(key_only_node("aggregate", key));
        };
        let route = ctx.read(path, &junos::aggregate_route(vrf, &prefix.to_string()))?;
        Ok(match route {
            Some(route) => parse_underlay(prefix, &route).to_node(),
            None => key_only_node("aggregate", key),
        })
    }
}

impl ElementWriter for JunosAggregate {
    fn write(&self, path: &TreePath, after: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        let aggregate = Aggregate::from_node(after).or_invalid(path)?;
        ctx.store
            .merge(&self.target(path, &aggregate)?, render(&aggregate))
            .or_write_failed(path)
    }

    /// Dropped policies and a cleared `summary-only` are removed.
    fn update(
        &self,
        path: &TreePath,
        before: &ConfigNode,
        after: &ConfigNode,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let old = Aggregate::from_node(before).or_invalid(path)?;
        let new = Aggregate::from_node(after).or_invalid(path)?;
        ctx.store
            .safe_merge(&self.target(path, &new)?, Some(&render(&old)), render(&new))
            .or_write_failed(path)
    }

    fn delete(&self, path: &TreePath, before: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()> {
        let aggregate = Aggregate::from_node(before).or_invalid(path)?;
        ctx.store
            .delete(&self.target(path, &aggregate)?)
            .or_write_failed(path)
    }
}
