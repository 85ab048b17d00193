use config_tree_core::ConfigNode;

use super::{parse_field, required};
use crate::codec::{AreaId, CodecError};

/// `ospfv2/areas/area`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    pub identifier: AreaId,
}

impl Area {
    pub fn from_node(node: &ConfigNode) -> Result<Self, CodecError> {
        Ok(Self {
            identifier: AreaId::parse(required(node, "identifier")?)?,
        })
    }

    pub fn to_node(&self) -> ConfigNode {
        let id = self.identifier.to_string();
        ConfigNode::new("area")
            .with_leaf("identifier", id.as_str())
            .with_child(ConfigNode::new("config").with_leaf("identifier", id))
    }
}

/// `areas/area/interfaces/interface`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaInterface {
    pub id: String,
    /// Interface cost.
    pub metric: Option<u32>,
}

impl AreaInterface {
    pub fn from_node(node: &ConfigNode) -> Result<Self, CodecError> {
        Ok(Self {
            id: required(node, "id")?.to_string(),
            metric: parse_field::<u32>(node, "metric")?,
        })
    }

    pub fn to_node(&self) -> ConfigNode {
        ConfigNode::new("interface")
            .with_leaf("id", self.id.as_str())
            .with_child(
                ConfigNode::new("config")
                    .with_leaf("id", self.id.as_str())
                    .with_opt_leaf("metric", self.metric),
            )
    }
}

/// LSA kinds advertised with maximum metric on startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxMetricInclude {
    Stub,
    Type2External,
    SummaryLsa,
}

impl MaxMetricInclude {
    pub const ALL: [MaxMetricInclude; 3] = [
        MaxMetricInclude::Stub,
        MaxMetricInclude::Type2External,
        MaxMetricInclude::SummaryLsa,
    ];

    pub fn from_canonical(value: &str) -> Result<Self, CodecError> {
        let identity = value.rsplit(':').next().unwrap_or(value);
        MaxMetricInclude::ALL
            .into_iter()
            .find(|include| include.canonical() == identity)
            .ok_or_else(|| CodecError::Field {
                field: "include",
                value: value.to_string(),
            })
    }

    pub fn canonical(self) -> &'static str {
        match self {
            MaxMetricInclude::Stub => "MAX_METRIC_INCLUDE_STUB",
            MaxMetricInclude::Type2External => "MAX_METRIC_INCLUDE_TYPE2_EXTERNAL",
            MaxMetricInclude::SummaryLsa => "MAX_METRIC_SUMMARY_LSA",
        }
    }
}

/// `ospfv2/global/timers/max-metric`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaxMetric {
    pub include: Vec<MaxMetricInclude>,
}

impl MaxMetric {
    pub fn from_node(node: &ConfigNode) -> Result<Self, CodecError> {
        let include = node
            .get_child("config")
            .map(|config| config.get_children("include"))
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| entry.text.as_deref())
            .map(MaxMetricInclude::from_canonical)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { include })
    }

    pub fn to_node(&self) -> ConfigNode {
        let config = self
            .include
            .iter()
            .fold(ConfigNode::new("config"), |config, include| {
                config.with_leaf("include", include.canonical())
            });
        ConfigNode::new("max-metric").with_child(config)
    }
}

#[cfg(test)]
mod tests {
    use config_tree_core::parse;

    use super::{AreaInterface, MaxMetric, MaxMetricInclude};

    #[test]
    fn max_metric_reads_prefixed_identities() {
        let node = parse(
            br#"<max-metric><config>
  <include>oc-ospf-types:MAX_METRIC_INCLUDE_STUB</include>
  <include>MAX_METRIC_SUMMARY_LSA</include>
</config></max-metric>"#,
        )
        .expect("parse");
        let max_metric = MaxMetric::from_node(&node).expect("max-metric");
        assert_eq!(
            max_metric.include,
            vec![MaxMetricInclude::Stub, MaxMetricInclude::SummaryLsa]
        );
        assert_eq!(MaxMetric::from_node(&max_metric.to_node()), Ok(max_metric));
    }

    #[test]
    fn interface_metric_is_optional() {
        let node = parse(b"<interface><id>Loopback0</id></interface>").expect("parse");
        let interface = AreaInterface::from_node(&node).expect("interface");
        assert_eq!(interface.metric, None);
        assert!(AreaInterface::from_node(
            &parse(b"<interface><id>Gi0</id><config><metric>x</metric></config></interface>")
                .expect("parse")
        )
        .is_err());
    }
}
