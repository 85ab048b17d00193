//! Translation and reconciliation between a vendor-neutral network configuration model and
//! vendor underlay schemas.
//!
//! A canonical (OpenConfig-shaped) element is read back from, or written to, a device's
//! underlay configuration through a remote hierarchical store. Nothing here owns device state:
//! every operation is a sequence of blocking [`store::UnderlayAccess`] calls.
//!
//! # Architecture
//!
//! ## Contracts
//!
//! - [`store`]: Store access contract and the journaling in-memory store
//! - [`handler`]: Reader and writer contracts of one canonical list
//! - [`context`]: Read and write contexts, per-element change sets
//! - [`error`]: Error taxonomy
//!
//! ## Engine
//!
//! - [`codec`]: Identity values between canonical and underlay key shapes
//! - [`checks`]: Applicability predicates
//! - [`dispatch`]: Several underlay subsystems behind one canonical list
//! - [`reconcile`]: Delete-then-create moves for identity changes
//! - [`validate`]: Pre-write checks against sibling canonical state
//!
//! ## Models and mappings
//!
//! - [`canonical`]: Typed canonical entities and their paths
//! - [`underlay`]: Underlay layouts per device family
//! - [`mapping`]: Concrete readers and writers per device family
//! - [`profile`]: Device profiles (TOML)
//! - [`registry`]: Canonical list name to handler table
//! - [`report`]: Terminal and JSON rendering of store journals
//!
//! # Example
//!
//! ```ignore
//! use config_tree_core::parse_file;
//! use underlay_translate::profile::load_profile;
//! use underlay_translate::registry::Registry;
//! use underlay_translate::store::MemoryStore;
//!
//! let profile = load_profile("xr6")?;
//! let registry = Registry::for_profile(&profile)?;
//! let store = MemoryStore::seeded(parse_file("underlay.xml")?, profile.underlay.key_fields());
//! let path = "/network-instances/network-instance[name=default]/protocols/protocol[identifier=BGP][name=default]/bgp/neighbors/neighbor[neighbor-address=10.1.0.4]".parse()?;
//! registry.apply(&path, &before, &after, &store)?;
//! ```

pub mod canonical;
pub mod checks;
pub mod codec;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod mapping;
pub mod profile;
pub mod reconcile;
pub mod registry;
pub mod report;
pub mod store;
pub mod underlay;
pub mod validate;
