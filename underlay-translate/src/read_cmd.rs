use anyhow::{Context, Result};
use config_tree_core::{parse_file, write, TreePath};
use underlay_translate::context::ReadContext;
use underlay_translate::profile::load_profile_with_source;
use underlay_translate::registry::Registry;
use underlay_translate::store::{Datastore, MemoryStore};

use crate::cli::ReadArgs;

pub fn run_read(args: ReadArgs) -> Result<()> {
    let (profile, _) =
        load_profile_with_source(&args.profile.profile, args.profile.profiles_dir.as_deref())
            .with_context(|| format!("failed to load profile {}", args.profile.profile))?;
    let registry = Registry::for_profile(&profile)?;

    let underlay = parse_file(&args.underlay)
        .with_context(|| format!("failed to parse {}", args.underlay.display()))?;
    let mut store = MemoryStore::seeded(underlay, profile.underlay.key_fields());
    let datastore = match &args.operational {
        Some(path) => {
            let applied = parse_file(path)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            store = store.with_operational(applied);
            Datastore::Operational
        }
        None => Datastore::Config,
    };

    let parent: TreePath = args
        .parent
        .parse()
        .with_context(|| format!("invalid canonical path `{}`", args.parent))?;
    let ctx = ReadContext::new(&store, datastore);
    let list = registry.read_list(&parent, &args.list, &ctx)?;

    let xml = write(&list).context("failed to render canonical list")?;
    println!("{}", String::from_utf8_lossy(&xml));
    Ok(())
}
