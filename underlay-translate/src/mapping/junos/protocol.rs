use config_tree_core::{ConfigNode, Key, TreePath};

use crate::canonical;
use crate::checks::ProtocolCheck;
use crate::context::ReadContext;
use crate::dispatch::{CompositeHandler, DispatchEntry, HandlerTag};
use crate::error::Result;
use crate::handler::ListReader;
use crate::mapping::{protocol_node, Settings};
use crate::underlay::junos;

/// `protocol` list; only BGP is modeled, other protocol types are unsupported.
pub fn protocol_handler(settings: &Settings) -> CompositeHandler {
    CompositeHandler::new(&["protocols"], canonical::PROTOCOL).with(
        DispatchEntry::new(HandlerTag::Bgp, ProtocolCheck::new(canonical::BGP)).reader(
            BgpProtocol {
                settings: settings.clone(),
            },
        ),
    )
}

/// One BGP protocol per routing instance that has a `protocols/bgp` container.
#[derive(Debug, Clone)]
struct BgpProtocol {
    settings: Settings,
}

impl ListReader for BgpProtocol {
    fn list(&self) -> &'static str {
        canonical::PROTOCOL
    }

    fn location(&self) -> &'static [&'static str] {
        &["protocols"]
    }

    fn enumerate(&self, parent: &TreePath, ctx: &ReadContext<'_>) -> Result<Vec<Key>> {
        let scope = self.settings.scope(parent)?;
        Ok(ctx
            .read(parent, &junos::bgp(scope))?
            .map(|_| canonical::protocol_key(canonical::BGP, &self.settings.bgp_instance))
            .into_iter()
            .collect())
    }

    fn hydrate(&self, path: &TreePath, _ctx: &ReadContext<'_>) -> Result<ConfigNode> {
        Ok(protocol_node(path.key_of(canonical::PROTOCOL)?))
    }
}

#[cfg(test)]
mod tests {
    use config_tree_core::{parse, ConfigNode};

    use super::protocol_handler;
    use crate::canonical;
    use crate::context::{ReadContext, WriteContext};
    use crate::error::TranslateError;
    use crate::handler::{read_list, ElementWriter};
    use crate::mapping::Settings;
    use crate::store::{Datastore, MemoryStore};
    use crate::underlay::junos;

    #[test]
    fn bgp_is_the_only_protocol() {
        let underlay = parse(
            br#"<data><configuration>
  <protocols><bgp><group><name>EXT</name></group></bgp></protocols>
  <routing-instances><instance><name>CUST</name></instance></routing-instances>
</configuration></data>"#,
        )
        .expect("parse");
        let store = MemoryStore::seeded(underlay, junos::key_fields_registry());
        let ctx = ReadContext::new(&store, Datastore::Config);
        let handler = protocol_handler(&Settings::default());

        let default = read_list(&handler, &canonical::protocols("default"), &ctx).expect("read");
        assert_eq!(default.get_children("protocol").len(), 1);
        let vrf = read_list(&handler, &canonical::protocols("CUST"), &ctx).expect("read");
        assert!(vrf.children.is_empty());

        let tree = ConfigNode::new("data");
        let write = WriteContext::new(&store, &tree, &tree);
        let err = handler
            .write(
                &canonical::protocol("default", canonical::OSPF, "1"),
                &ConfigNode::new("protocol"),
                &write,
            )
            .expect_err("unsupported");
        assert!(matches!(err, TranslateError::UnsupportedElement { .. }));
    }
}
