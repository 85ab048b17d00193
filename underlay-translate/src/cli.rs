use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "underlay-translate")]
#[command(about = "Replay canonical network configuration changes against a device underlay")]
pub struct Cli {
    /// Log dispatch decisions and store calls to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Apply canonical element changes to an underlay and print the store calls.
    Apply(ApplyArgs),
    /// Rebuild one canonical list from an underlay.
    Read(ReadArgs),
    /// List the device profiles compiled into the binary.
    Profiles,
}

#[derive(Parser, Debug)]
pub struct ProfileArgs {
    /// Device profile name, e.g. `xr6`.
    #[arg(long)]
    pub profile: String,
    /// Directory searched for `<profile>.toml` before the embedded profiles.
    #[arg(long)]
    pub profiles_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,
    /// Underlay configuration XML the in-memory store is seeded from.
    #[arg(long)]
    pub underlay: PathBuf,
    /// Canonical configuration before the transaction.
    #[arg(long)]
    pub before: PathBuf,
    /// Canonical configuration after the transaction.
    #[arg(long)]
    pub after: PathBuf,
    /// Canonical element to reconcile; repeat for several, applied in order.
    #[arg(long = "path", required = true)]
    pub paths: Vec<String>,
    /// Write the resulting underlay XML here.
    #[arg(long)]
    pub output: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Include reads in the printed journal.
    #[arg(long)]
    pub show_reads: bool,
}

#[derive(Parser, Debug)]
pub struct ReadArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,
    #[arg(long)]
    pub underlay: PathBuf,
    /// Applied-state XML; reads target it when given.
    #[arg(long)]
    pub operational: Option<PathBuf>,
    /// Canonical path of the list container, e.g. `/network-instances/network-instance[name=default]/protocols`.
    #[arg(long)]
    pub parent: String,
    /// Canonical list node name, e.g. `protocol`.
    #[arg(long)]
    pub list: String,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}
