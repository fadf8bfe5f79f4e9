//! Command implementations for the refrain binary.

use refrain::core::config::RefrainConfig;
use refrain::core::pipeline::{IngestStage, IndexStage, SynthStage, CONFIG_SIDECAR};
use refrain::core::records::PatternKind;
use refrain::io::store::JsonlStore;
use refrain::{RefrainError, Result};

use super::args::{Cli, IngestArgs, IndexArgs, ServeArgs, SynthArgs};

/// Resolve the effective configuration.
///
/// Precedence: `--config` file, then the store's persisted sidecar (which
/// pins the hash seed a dataset was built with), then defaults.
pub fn load_config(cli: &Cli, store: &JsonlStore) -> Result<RefrainConfig> {
    if let Some(path) = &cli.config {
        return RefrainConfig::from_yaml_file(path);
    }

    if let Some(stored) = store.read_sidecar::<RefrainConfig>(CONFIG_SIDECAR)? {
        stored.validate()?;
        return Ok(stored);
    }

    Ok(RefrainConfig::default())
}

/// `refrain ingest`
pub fn ingest_command(args: &IngestArgs, store: &JsonlStore, config: &RefrainConfig) -> Result<()> {
    let extensions = match &args.extensions {
        Some(list) => list.iter().map(|e| normalize_extension(e)).collect(),
        None => config.extract.extensions.clone(),
    };

    let stats =
        IngestStage::new(store, config).run_with_options(&args.paths, args.recursive, &extensions)?;

    println!(
        "ingested {} snippets from {} files ({} skipped)",
        stats.snippets_created, stats.files_processed, stats.files_skipped
    );
    let mut languages: Vec<_> = stats.languages.iter().collect();
    languages.sort();
    for (language, count) in languages {
        println!("  {language}: {count}");
    }
    Ok(())
}

/// `refrain index`
pub fn index_command(args: &IndexArgs, store: &JsonlStore, config: &RefrainConfig) -> Result<()> {
    let mut config = config.clone();
    if let Some(bands) = args.bands {
        config.lsh.bands = bands;
    }
    if let Some(rows) = args.rows {
        config.lsh.rows_per_band = rows;
    }
    config.validate()?;

    let stats = IndexStage::new(store, &config)
        .with_dedup(!args.no_dedup)
        .run()?;

    println!(
        "indexed {} snippets into {} clusters (mean size {:.1})",
        stats.snippets_kept, stats.clusters_created, stats.mean_cluster_size
    );
    println!(
        "  {} duplicates dropped, {} candidate pairs, {} verified",
        stats.duplicates_dropped, stats.candidate_pairs, stats.verified_pairs
    );
    Ok(())
}

/// `refrain synth`
pub fn synth_command(args: &SynthArgs, store: &JsonlStore, config: &RefrainConfig) -> Result<()> {
    let kinds: Vec<PatternKind> = args
        .types
        .iter()
        .map(|t| {
            t.parse::<PatternKind>()
                .map_err(RefrainError::validation)
        })
        .collect::<Result<_>>()?;

    let stats = SynthStage::new(store, config).run(&kinds)?;

    println!("synthesized {} patterns", stats.total_patterns);
    let mut by_kind: Vec<_> = stats.patterns_by_kind.iter().collect();
    by_kind.sort();
    for (kind, count) in by_kind {
        println!("  {kind}: {count}");
    }
    Ok(())
}

/// `refrain serve`
///
/// The HTTP surface ships as a separate service that reads this store;
/// this build only validates the request and points at it.
pub fn serve_command(args: &ServeArgs, _store: &JsonlStore) -> Result<()> {
    Err(RefrainError::unsupported(format!(
        "the HTTP surface is served by the companion UI service; \
         point it at this store to listen on {}:{}",
        args.host, args.port
    )))
}

/// Normalize a user-supplied extension to dotted lowercase form.
fn normalize_extension(ext: &str) -> String {
    let trimmed = ext.trim().trim_start_matches('.');
    format!(".{}", trimmed.to_ascii_lowercase())
}
