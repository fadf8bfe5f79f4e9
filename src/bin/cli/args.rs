//! CLI argument structures for the refrain binary.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Structural redundancy discovery across polyglot codebases
#[derive(Parser)]
#[command(name = "refrain")]
#[command(version = VERSION)]
#[command(about = "Discover near-duplicate code and recurring patterns across languages")]
#[command(long_about = "
Refrain ingests source trees, clusters near-duplicate fragments with
MinHash/LSH, and mines recurring n-gram, subsequence, and structural
patterns from the clustered corpus.

Typical session:

  refrain ingest ./src --recursive
  refrain index
  refrain synth
  refrain synth --type ngram --type lcs
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (YAML) overriding stored and default settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Root directory of the on-disk store
    #[arg(long, global = true, default_value = "data")]
    pub data_dir: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Walk source paths and append extracted snippets to the store
    Ingest(IngestArgs),

    /// Cluster ingested snippets via MinHash/LSH similarity
    Index(IndexArgs),

    /// Mine patterns from the clustered corpus
    Synth(SynthArgs),

    /// Serve the stored data over HTTP (external collaborator)
    Serve(ServeArgs),
}

/// Arguments for `refrain ingest`.
#[derive(Args)]
pub struct IngestArgs {
    /// Files or directories to ingest
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Descend into subdirectories
    #[arg(long)]
    pub recursive: bool,

    /// Comma-separated extension filter (defaults to the configured set)
    #[arg(long, value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,
}

/// Arguments for `refrain index`.
#[derive(Args)]
pub struct IndexArgs {
    /// Override the number of LSH bands
    #[arg(long)]
    pub bands: Option<usize>,

    /// Override the signature rows per band
    #[arg(long)]
    pub rows: Option<usize>,

    /// Skip the pre-cluster de-duplication pass
    #[arg(long)]
    pub no_dedup: bool,
}

/// Arguments for `refrain synth`.
#[derive(Args)]
pub struct SynthArgs {
    /// Pattern tier to mine (repeatable; all tiers when omitted)
    #[arg(long = "type", value_name = "TYPE", value_parser = ["ngram", "lcs", "ast"])]
    pub types: Vec<String>,
}

/// Arguments for `refrain serve`.
#[derive(Args)]
pub struct ServeArgs {
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Host to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
}
