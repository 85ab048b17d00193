//! Underlay schema layouts: path builders and list-key registries per device family.

pub mod junos;
pub mod xr;

use std::fmt::{self, Display, Formatter};

/// Routing context an underlay subtree belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope<'a> {
    /// The global routing table.
    Default,
    /// A named VRF or routing instance.
    Vrf(&'a str),
}

impl<'a> Scope<'a> {
    /// Scope of a canonical network instance.
    pub fn of(instance: &'a str, default_instance: &str) -> Self {
        if instance == default_instance {
            Scope::Default
        } else {
            Scope::Vrf(instance)
        }
    }
}

impl Display for Scope<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Default => f.write_str("default"),
            Scope::Vrf(name) => write!(f, "vrf {name}"),
        }
    }
}
