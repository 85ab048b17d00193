use anyhow::{bail, Context, Result};
use config_tree_core::{parse_file, write_file, TreePath};
use tracing::{info, warn};
use underlay_translate::context::ChangeSet;
use underlay_translate::profile::load_profile_with_source;
use underlay_translate::registry::Registry;
use underlay_translate::report::{
    render_journal, render_outcomes, render_summary, ApplyReport, ElementOutcome,
};
use underlay_translate::store::{Datastore, MemoryStore};

use crate::cli::{ApplyArgs, OutputFormat};
use crate::path_guard::ensure_not_an_input;

pub fn run_apply(args: ApplyArgs) -> Result<()> {
    if let Some(output) = &args.output {
        ensure_not_an_input(output, &[&args.underlay, &args.before, &args.after])?;
    }

    let (profile, source) =
        load_profile_with_source(&args.profile.profile, args.profile.profiles_dir.as_deref())
            .with_context(|| format!("failed to load profile {}", args.profile.profile))?;
    let registry = Registry::for_profile(&profile)?;

    let underlay = parse_file(&args.underlay)
        .with_context(|| format!("failed to parse {}", args.underlay.display()))?;
    let before = parse_file(&args.before)
        .with_context(|| format!("failed to parse {}", args.before.display()))?;
    let after = parse_file(&args.after)
        .with_context(|| format!("failed to parse {}", args.after.display()))?;

    let paths = args
        .paths
        .iter()
        .map(|raw| {
            raw.parse::<TreePath>()
                .with_context(|| format!("invalid canonical path `{raw}`"))
        })
        .collect::<Result<Vec<_>>>()?;

    let store = MemoryStore::seeded(underlay, profile.underlay.key_fields());
    let mut elements = Vec::new();
    for path in paths {
        let change = ChangeSet::between(&path, &before, &after).kind();
        // A failed element does not stop the ones after it.
        let error = match registry.apply(&path, &before, &after, &store) {
            Ok(()) => None,
            Err(err) => {
                warn!(path = %path, error = %err, "element not applied");
                Some(err.to_string())
            }
        };
        elements.push(ElementOutcome {
            path,
            change,
            error,
        });
    }

    let report = ApplyReport {
        profile: args.profile.profile.clone(),
        profile_source: source,
        elements,
        calls: store.calls()?,
    };

    match args.format {
        OutputFormat::Text => {
            let journal = render_journal(&report.calls, args.show_reads);
            if !journal.is_empty() {
                println!("{journal}");
            }
            println!("{}", render_outcomes(&report.elements));
            println!("{}", render_summary(&report));
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if let Some(output) = &args.output {
        let result = store.snapshot(Datastore::Config)?;
        write_file(&result, output)
            .with_context(|| format!("failed to write {}", output.display()))?;
        info!(output = %output.display(), "wrote underlay");
    }

    let failures = report.failures();
    if failures > 0 {
        bail!("{failures} of {} element(s) failed", report.elements.len());
    }
    Ok(())
}
