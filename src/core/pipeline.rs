//! Pipeline stages: ingest, index, synthesize.
//!
//! Stages are strictly sequential over the store and each one is
//! separately re-runnable: `EMPTY → INGESTED → INDEXED → SYNTHESISED`.
//! A stage may be cancelled between record boundaries; the log then holds
//! a prefix of the intended output, which is a legal state for the next
//! run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::core::config::RefrainConfig;
use crate::core::errors::{RefrainError, Result};
use crate::core::records::{Cluster, IndexStats, IngestStats, PatternKind, Snippet, SynthesisStats};
use crate::detectors::cluster::{ClusterBuilder, Deduplicator};
use crate::detectors::lsh::{LshContext, LshIndex};
use crate::detectors::patterns;
use crate::extract::SnippetExtractor;
use crate::io::store::{Dataset, JsonlStore};
use crate::lang::registry::{language_for_path, Language};
use crate::lang::tokenizer::Tokenizer;

/// Directories never descended into during ingestion.
pub const SKIPPED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "dist",
    "build",
    "__pycache__",
    ".vscode",
    "target",
];

/// Sidecar key for the persisted configuration.
pub const CONFIG_SIDECAR: &str = "config";

/// Sidecar key for index stage statistics.
pub const INDEX_STATS_SIDECAR: &str = "indexStats";

/// Sidecar key for synthesis stage statistics.
pub const SYNTH_STATS_SIDECAR: &str = "synthesisStats";

/// Where a store stands in the stage sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No snippets ingested yet
    Empty,
    /// Snippets present, no clusters
    Ingested,
    /// Clusters present, no patterns
    Indexed,
    /// Patterns present
    Synthesised,
}

/// Determine the store's pipeline state from its record counts.
pub fn pipeline_state(store: &JsonlStore) -> Result<PipelineState> {
    if store.record_count(Dataset::Snippets)? == 0 {
        return Ok(PipelineState::Empty);
    }
    if store.record_count(Dataset::Clusters)? == 0 {
        return Ok(PipelineState::Ingested);
    }
    if store.record_count(Dataset::Patterns)? == 0 {
        return Ok(PipelineState::Indexed);
    }
    Ok(PipelineState::Synthesised)
}

/// Ingest stage: walk sources, extract snippets, tokenize, sign, append.
pub struct IngestStage<'a> {
    store: &'a JsonlStore,
    config: &'a RefrainConfig,
}

impl<'a> IngestStage<'a> {
    /// Create the stage over a store and configuration.
    pub fn new(store: &'a JsonlStore, config: &'a RefrainConfig) -> Self {
        Self { store, config }
    }

    /// Ingest the given paths recursively with configured extensions.
    pub fn run(&self, paths: &[PathBuf]) -> Result<IngestStats> {
        self.run_with_options(paths, true, &self.config.extract.extensions)
    }

    /// Ingest with explicit recursion and extension overrides.
    ///
    /// Per-file failures are logged, counted as skipped, and never abort
    /// the batch. Appends are incremental: existing snippet records stay.
    pub fn run_with_options(
        &self,
        paths: &[PathBuf],
        recursive: bool,
        extensions: &[String],
    ) -> Result<IngestStats> {
        let files = discover_files(paths, recursive, extensions);
        info!(files = files.len(), "ingest: discovered source files");

        let context = LshContext::new(&self.config.lsh);
        let extractor = SnippetExtractor::new(self.config.extract.clone());
        let tokenizer = Tokenizer::new();

        let mut stats = IngestStats::default();
        let mut pending: Vec<Snippet> = Vec::new();

        for file in files {
            let language = language_for_path(&file);
            if language == Language::Unknown {
                debug!(file = %file.display(), "skipping file with unknown language");
                stats.files_skipped += 1;
                continue;
            }

            let content = match std::fs::read_to_string(&file) {
                Ok(content) => content,
                Err(e) => {
                    warn!(file = %file.display(), "skipping unreadable file: {e}");
                    stats.files_skipped += 1;
                    continue;
                }
            };

            let mut snippets =
                extractor.extract(&content, language, &file.to_string_lossy());
            for snippet in &mut snippets {
                let (tokens, folded) = tokenizer.process(&snippet.content, language);
                snippet.tokens = tokens;
                snippet.normalized = folded;
            }
            // A size-passing fragment can still normalise to nothing
            // (comment-only bodies); those carry no comparable signal.
            snippets.retain(|s| !s.tokens.is_empty());

            stats.files_processed += 1;
            pending.extend(snippets);
        }

        // Signature generation is the one parallel fan-out; results come
        // back in input order so the log stays deterministic.
        let token_seqs: Vec<Vec<String>> =
            pending.iter().map(|s| s.tokens.clone()).collect();
        let signatures = context.signatures_batch(&token_seqs);
        for (snippet, signature) in pending.iter_mut().zip(signatures) {
            snippet.signature = signature;
        }

        for snippet in &pending {
            self.store.append(Dataset::Snippets, snippet)?;
            *stats
                .languages
                .entry(snippet.language.name().to_string())
                .or_insert(0) += 1;
            stats.snippets_created += 1;
        }

        self.store.write_sidecar(CONFIG_SIDECAR, self.config)?;

        info!(
            processed = stats.files_processed,
            skipped = stats.files_skipped,
            snippets = stats.snippets_created,
            "ingest complete"
        );
        Ok(stats)
    }
}

/// Index stage: de-duplicate, generate candidates, cluster, rewrite logs.
pub struct IndexStage<'a> {
    store: &'a JsonlStore,
    config: &'a RefrainConfig,
    dedup_enabled: bool,
}

impl<'a> IndexStage<'a> {
    /// Create the stage over a store and configuration.
    pub fn new(store: &'a JsonlStore, config: &'a RefrainConfig) -> Self {
        Self {
            store,
            config,
            dedup_enabled: true,
        }
    }

    /// Disable the pre-cluster de-duplication pass.
    pub fn with_dedup(mut self, enabled: bool) -> Self {
        self.dedup_enabled = enabled;
        self
    }

    /// Cluster the ingested snippets.
    ///
    /// Rewrites the snippets log (cluster ids attached, duplicates gone)
    /// and recreates the clusters log. There is no cross-log transaction;
    /// a cancellation between the two rewrites leaves snippets current
    /// and clusters stale, which a re-run repairs.
    pub fn run(&self) -> Result<IndexStats> {
        let mut snippets: Vec<Snippet> = self.store.scan_all(Dataset::Snippets)?;
        if snippets.is_empty() {
            return Err(RefrainError::empty_dataset(Dataset::Snippets.name()));
        }

        let mut stats = IndexStats {
            snippets_in: snippets.len(),
            ..IndexStats::default()
        };

        let context = LshContext::new(&self.config.lsh);

        // Stored signatures are reused when they match the configured
        // family; a bands/rows override forces regeneration.
        let expected_len = context.signature_len();
        if snippets.iter().any(|s| s.signature.len() != expected_len) {
            info!("regenerating signatures for configured banding scheme");
            let token_seqs: Vec<Vec<String>> =
                snippets.iter().map(|s| s.tokens.clone()).collect();
            let signatures = context.signatures_batch(&token_seqs);
            for (snippet, signature) in snippets.iter_mut().zip(signatures) {
                snippet.signature = signature;
            }
        }

        let mut index = LshIndex::new(&self.config.lsh);
        let mut kept = if self.dedup_enabled {
            let outcome = Deduplicator::new(self.config.lsh.similarity_threshold)
                .dedup(snippets, &mut index);
            stats.duplicates_dropped = outcome.dropped;
            outcome.kept
        } else {
            for snippet in &snippets {
                index.insert(snippet.id.clone(), snippet.signature.clone());
            }
            snippets
        };
        stats.snippets_kept = kept.len();

        stats.candidate_pairs = index.candidate_pairs().len();
        stats.verified_pairs = index
            .verified_pairs(self.config.lsh.cluster_threshold)
            .len();

        let clusters = ClusterBuilder::new(
            self.config.lsh.cluster_threshold,
            self.config.lsh.min_cluster_size,
        )
        .build(&index, &kept);

        let membership: HashMap<&str, &str> = clusters
            .iter()
            .flat_map(|c| c.snippet_ids.iter().map(move |id| (id.as_str(), c.id.as_str())))
            .collect();
        for snippet in &mut kept {
            snippet.cluster_id = membership.get(snippet.id.as_str()).map(|id| (*id).to_string());
        }

        stats.clusters_created = clusters.len();
        stats.mean_cluster_size = if clusters.is_empty() {
            0.0
        } else {
            clusters.iter().map(Cluster::size).sum::<usize>() as f64 / clusters.len() as f64
        };

        self.store.clear(Dataset::Snippets)?;
        for snippet in &kept {
            self.store.append(Dataset::Snippets, snippet)?;
        }

        self.store.clear(Dataset::Clusters)?;
        for cluster in &clusters {
            self.store.append(Dataset::Clusters, cluster)?;
        }

        self.store.write_sidecar(INDEX_STATS_SIDECAR, &stats)?;
        self.store.write_sidecar(CONFIG_SIDECAR, self.config)?;

        info!(
            kept = stats.snippets_kept,
            dropped = stats.duplicates_dropped,
            clusters = stats.clusters_created,
            "index complete"
        );
        Ok(stats)
    }
}

/// Synthesis stage: mine patterns from snippets and clusters.
pub struct SynthStage<'a> {
    store: &'a JsonlStore,
    config: &'a RefrainConfig,
}

impl<'a> SynthStage<'a> {
    /// Create the stage over a store and configuration.
    pub fn new(store: &'a JsonlStore, config: &'a RefrainConfig) -> Self {
        Self { store, config }
    }

    /// Mine the requested tiers (all when empty) and rewrite the patterns
    /// log in ranked order.
    ///
    /// Requires ingested snippets; tolerates an empty cluster log (the
    /// LCS tier simply mines nothing).
    pub fn run(&self, kinds: &[PatternKind]) -> Result<SynthesisStats> {
        let snippets: Vec<Snippet> = self.store.scan_all(Dataset::Snippets)?;
        if snippets.is_empty() {
            return Err(RefrainError::empty_dataset(Dataset::Snippets.name()));
        }
        let clusters: Vec<Cluster> = self.store.scan_all(Dataset::Clusters)?;

        let mined = patterns::mine(&snippets, &clusters, kinds, &self.config.synth);

        let mut stats = SynthesisStats {
            total_patterns: mined.len(),
            ..SynthesisStats::default()
        };
        for pattern in &mined {
            *stats
                .patterns_by_kind
                .entry(pattern.kind.name().to_string())
                .or_insert(0) += 1;
        }

        self.store.clear(Dataset::Patterns)?;
        for pattern in &mined {
            self.store.append(Dataset::Patterns, pattern)?;
        }

        self.store.write_sidecar(SYNTH_STATS_SIDECAR, &stats)?;

        info!(patterns = stats.total_patterns, "synthesis complete");
        Ok(stats)
    }
}

/// Discover candidate files under the given paths.
///
/// Directories are walked in a deterministic pre-order (children sorted by
/// file name) with the fixed skip list applied; non-recursive mode only
/// takes a directory's direct children.
pub fn discover_files(paths: &[PathBuf], recursive: bool, extensions: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            if has_allowed_extension(path, extensions) {
                files.push(path.clone());
            }
            continue;
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        let walker = WalkDir::new(path)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_skipped_dir(entry.path()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("walk error under {}: {e}", path.display());
                    continue;
                }
            };
            if entry.file_type().is_file() && has_allowed_extension(entry.path(), extensions) {
                files.push(entry.into_path());
            }
        }
    }

    files
}

/// Whether a path's final component is on the skip list.
fn is_skipped_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

/// Whether a path carries one of the allowed extensions.
fn has_allowed_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let dotted = format!(".{}", ext.to_ascii_lowercase());
    extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(&dotted))
}
