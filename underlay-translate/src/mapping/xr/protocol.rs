use config_tree_core::{ConfigNode, Key, TreePath};

use super::{as_subtrees, scope_node, XrOspfProtocol};
use crate::canonical;
use crate::checks::ProtocolCheck;
use crate::context::ReadContext;
use crate::dispatch::{CompositeHandler, DispatchEntry, HandlerTag};
use crate::error::Result;
use crate::handler::ListReader;
use crate::mapping::{protocol_node, Settings};
use crate::underlay::{xr, Scope};

/// Name of the single static routing protocol instance.
pub const STATIC_PROTOCOL_NAME: &str = "default";

/// `protocol` list: BGP instances, OSPF processes and the static router behind one list.
///
/// BGP and static protocol entries carry no underlay configuration of their own; writing them
/// succeeds without store calls and their content is handled by the child lists.
pub fn protocol_handler(settings: &Settings) -> CompositeHandler {
    CompositeHandler::new(&["protocols"], canonical::PROTOCOL)
        .with(
            DispatchEntry::new(HandlerTag::Bgp, ProtocolCheck::new(canonical::BGP))
                .reader(BgpInstances {
                    settings: settings.clone(),
                }),
        )
        .with(
            DispatchEntry::new(HandlerTag::Ospf, ProtocolCheck::new(canonical::OSPF))
                .reader(XrOspfProtocol::new(settings.clone()))
                .writer(XrOspfProtocol::new(settings.clone())),
        )
        .with(
            DispatchEntry::new(HandlerTag::Static, ProtocolCheck::new(canonical::STATIC)).reader(
                StaticRouter {
                    settings: settings.clone(),
                },
            ),
        )
}

/// BGP instances that configure the network instance.
#[derive(Debug, Clone)]
struct BgpInstances {
    settings: Settings,
}

impl ListReader for BgpInstances {
    fn list(&self) -> &'static str {
        canonical::PROTOCOL
    }

    fn location(&self) -> &'static [&'static str] {
        &["protocols"]
    }

    fn enumerate(&self, parent: &TreePath, ctx: &ReadContext<'_>) -> Result<Vec<Key>> {
        let scope = self.settings.scope(parent)?;
        let Some(bgp) = ctx.read(parent, &xr::BGP)? else {
            return Ok(Vec::new());
        };
        Ok(bgp
            .get_children("instance")
            .into_iter()
            .filter(|instance| {
                as_subtrees(instance)
                    .into_iter()
                    .any(|(_, four_byte)| scope_node(four_byte, scope).is_some())
            })
            .filter_map(|instance| instance.leaf_text("instance-name"))
            .map(|name| canonical::protocol_key(canonical::BGP, name))
            .collect())
    }

    fn hydrate(&self, path: &TreePath, _ctx: &ReadContext<'_>) -> Result<ConfigNode> {
        Ok(protocol_node(path.key_of(canonical::PROTOCOL)?))
    }
}

/// The static router, present once per network instance that has static configuration.
#[derive(Debug, Clone)]
struct StaticRouter {
    settings: Settings,
}

impl ListReader for StaticRouter {
    fn list(&self) -> &'static str {
        canonical::PROTOCOL
    }

    fn location(&self) -> &'static [&'static str] {
        &["protocols"]
    }

    fn enumerate(&self, parent: &TreePath, ctx: &ReadContext<'_>) -> Result<Vec<Key>> {
        let scope: Scope<'_> = self.settings.scope(parent)?;
        Ok(ctx
            .read(parent, &xr::static_scope(scope))?
            .map(|_| canonical::protocol_key(canonical::STATIC, STATIC_PROTOCOL_NAME))
            .into_iter()
            .collect())
    }

    fn hydrate(&self, path: &TreePath, _ctx: &ReadContext<'_>) -> Result<ConfigNode> {
        Ok(protocol_node(path.key_of(canonical::PROTOCOL)?))
    }
}
