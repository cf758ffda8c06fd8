use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use svctree_core::SvctreeConfig;
use svctree_state::NodeStore;

mod commands;

#[derive(Parser)]
#[command(
    name = "svctree",
    about = "svctree — service tree export/import and status propagation",
    version,
    group = ArgGroup::new("mode").required(true).args(["export", "import", "propagate"]),
)]
struct Cli {
    /// Export the full tree to PATH
    #[arg(short = 'e', long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Import a tree from PATH
    #[arg(short = 'i', long, value_name = "PATH")]
    import: Option<PathBuf>,

    /// Run one batch propagation pass over the tree
    #[arg(short = 'p', long)]
    propagate: bool,

    /// Configuration file
    #[arg(short, long, default_value = "svctree.toml")]
    config: PathBuf,

    /// Create nodes through the management API instead of the store
    /// (overrides import.via_api in the config)
    #[arg(long)]
    via_api: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("svctree=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = SvctreeConfig::from_file(&cli.config)?;
    let store = NodeStore::open(config.store.path.as_ref())?;

    if let Some(path) = cli.export {
        commands::export::run(&store, &path)
    } else if let Some(path) = cli.import {
        commands::import::run(&store, &config, &path, cli.via_api)
    } else {
        commands::propagate::run(&store)
    }
}
