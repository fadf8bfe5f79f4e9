//! CLI module for the refrain binary.

mod args;
mod commands;

pub use args::{Cli, Commands};

use refrain::io::store::JsonlStore;
use refrain::Result;

/// Dispatch the parsed command line.
///
/// Returns the stage name alongside any error so the caller can surface a
/// single line naming where the failure happened.
pub fn run(cli: &Cli) -> std::result::Result<(), (&'static str, refrain::RefrainError)> {
    let stage = stage_name(&cli.command);
    run_inner(cli).map_err(|err| (stage, err))
}

fn stage_name(command: &Commands) -> &'static str {
    match command {
        Commands::Ingest(_) => "ingest",
        Commands::Index(_) => "index",
        Commands::Synth(_) => "synth",
        Commands::Serve(_) => "serve",
    }
}

fn run_inner(cli: &Cli) -> Result<()> {
    let store = JsonlStore::open(&cli.data_dir)?;
    let config = commands::load_config(cli, &store)?;

    match &cli.command {
        Commands::Ingest(args) => commands::ingest_command(args, &store, &config),
        Commands::Index(args) => commands::index_command(args, &store, &config),
        Commands::Synth(args) => commands::synth_command(args, &store, &config),
        Commands::Serve(args) => commands::serve_command(args, &store),
    }
}
