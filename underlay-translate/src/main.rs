use anyhow::Result;
use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use underlay_translate::profile::{load_profile, EMBEDDED_PROFILES};
use underlay_translate::registry::supported_lists;

mod apply_cmd;
mod cli;
mod path_guard;
mod read_cmd;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::WARN
        })
        .init();

    match cli.command {
        Command::Apply(args) => apply_cmd::run_apply(args),
        Command::Read(args) => read_cmd::run_read(args),
        Command::Profiles => run_profiles(),
    }
}

fn run_profiles() -> Result<()> {
    for name in EMBEDDED_PROFILES {
        let profile = load_profile(name)?;
        let lists = if profile.enabled_handlers.is_empty() {
            supported_lists(profile.underlay).join(",")
        } else {
            profile.enabled_handlers.join(",")
        };
        println!(
            "{name} underlay={} lists={lists} description={}",
            profile.underlay,
            profile.description.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
