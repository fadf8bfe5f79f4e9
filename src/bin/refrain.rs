//! Refrain CLI - structural redundancy discovery.

use clap::Parser;

mod cli;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err((stage, err)) = cli::run(&cli) {
        eprintln!("refrain {stage}: {err}");
        std::process::exit(err.exit_code());
    }
}
