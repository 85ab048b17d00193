//! Applicability predicates deciding which elementary handler owns an element.

use config_tree_core::TreePath;

use crate::canonical::{self, InstanceType};
use crate::context::WriteContext;

/// Predicate over (path, change context, is_delete).
///
/// Reads evaluate checks without a context; a check that cannot decide from the path alone
/// must claim.
pub trait Check: Send + Sync {
    fn claims(&self, path: &TreePath, ctx: Option<&WriteContext<'_>>, is_delete: bool) -> bool;
}

/// Claims elements of one protocol type, read from the `protocol` key.
#[derive(Debug, Clone)]
pub struct ProtocolCheck {
    identifier: &'static str,
}

impl ProtocolCheck {
    pub fn new(identifier: &'static str) -> Self {
        Self { identifier }
    }
}

impl Check for ProtocolCheck {
    fn claims(&self, path: &TreePath, _ctx: Option<&WriteContext<'_>>, _is_delete: bool) -> bool {
        match path.key_of(canonical::PROTOCOL) {
            Ok(key) => key.get(canonical::IDENTIFIER) == Some(self.identifier),
            Err(_) => true,
        }
    }
}

/// Claims elements inside either the default network instance or VRF instances.
///
/// The instance type comes from the canonical `config/type` leaf when a write context is
/// available (the before-tree for deletes), otherwise from the instance name.
#[derive(Debug, Clone)]
pub struct NetworkInstanceCheck {
    want: InstanceType,
    default_name: String,
}

impl NetworkInstanceCheck {
    pub fn default_instance(default_name: impl Into<String>) -> Self {
        Self {
            want: InstanceType::Default,
            default_name: default_name.into(),
        }
    }

    pub fn vrf(default_name: impl Into<String>) -> Self {
        Self {
            want: InstanceType::Vrf,
            default_name: default_name.into(),
        }
    }
}

impl Check for NetworkInstanceCheck {
    fn claims(&self, path: &TreePath, ctx: Option<&WriteContext<'_>>, is_delete: bool) -> bool {
        let Ok(name) = path.key_value(canonical::NETWORK_INSTANCE, canonical::NAME) else {
            return true;
        };
        let declared = ctx
            .and_then(|ctx| ctx.read_for(&canonical::network_instance(name), is_delete))
            .and_then(|ni| ni.get_text(&["config", "type"]))
            .and_then(InstanceType::from_canonical);
        let actual = declared.unwrap_or(if name == self.default_name {
            InstanceType::Default
        } else {
            InstanceType::Vrf
        });
        actual == self.want
    }
}

/// Catch-all; accepts anything. Registered last to turn unclaimed writes into no-ops.
#[derive(Debug, Clone, Copy)]
pub struct PassThrough;

impl Check for PassThrough {
    fn claims(&self, _path: &TreePath, _ctx: Option<&WriteContext<'_>>, _is_delete: bool) -> bool {
        true
    }
}
