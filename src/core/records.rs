//! Record types persisted in the append-only store.
//!
//! Records are plain serde data; relations between them are by id only.
//! Clusters never hold snippet handles, so there are no cyclic references
//! anywhere in the model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use uuid::Uuid;

use crate::lang::registry::Language;

/// A code fragment extracted from a source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snippet {
    /// Opaque identifier, unique within a dataset
    pub id: String,

    /// Raw fragment content
    pub content: String,

    /// Language detected from the originating file's extension
    pub language: Language,

    /// Originating file path
    pub file_path: String,

    /// First line of the fragment (1-based, inclusive)
    pub start_line: usize,

    /// Last line of the fragment (1-based, inclusive)
    pub end_line: usize,

    /// SHA-256 hex digest of the raw content
    pub content_hash: String,

    /// Ordered, normalised token sequence
    pub tokens: Vec<String>,

    /// Keyword-folded normalised text, kept for LCS mining
    pub normalized: String,

    /// MinHash signature (length = bands × rows)
    pub signature: Vec<u32>,

    /// Cluster membership, attached once during indexing
    pub cluster_id: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Snippet {
    /// Create a snippet with a fresh id and timestamp.
    ///
    /// Token sequence and signature are filled in by the ingest stage after
    /// tokenization.
    pub fn new(
        content: String,
        language: Language,
        file_path: String,
        start_line: usize,
        end_line: usize,
    ) -> Self {
        let content_hash = content_digest(&content);
        Self {
            id: Uuid::new_v4().to_string(),
            content,
            language,
            file_path,
            start_line,
            end_line,
            content_hash,
            tokens: Vec::new(),
            normalized: String::new(),
            signature: Vec::new(),
            cluster_id: None,
            created_at: Utc::now(),
        }
    }

    /// Number of source lines the snippet spans.
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }
}

/// SHA-256 hex digest of a content string.
pub fn content_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// An equivalence class of similar snippets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cluster {
    /// Opaque identifier
    pub id: String,

    /// Member snippet ids, in component-visit order
    pub snippet_ids: Vec<String>,

    /// Member maximising mean intra-cluster similarity
    pub centroid_id: String,

    /// Mean pairwise Jaccard estimate within the cluster (1.0 for singletons)
    pub similarity: f64,

    /// Languages present among members, sorted and deduplicated
    pub languages: Vec<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Cluster {
    /// Create a cluster with a fresh id and timestamp.
    pub fn new(
        snippet_ids: Vec<String>,
        centroid_id: String,
        similarity: f64,
        mut languages: Vec<String>,
    ) -> Self {
        languages.sort();
        languages.dedup();
        Self {
            id: Uuid::new_v4().to_string(),
            snippet_ids,
            centroid_id,
            similarity,
            languages,
            created_at: Utc::now(),
        }
    }

    /// Number of member snippets.
    pub fn size(&self) -> usize {
        self.snippet_ids.len()
    }
}

/// The three pattern mining tiers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    /// Recurring contiguous token window
    NGram,

    /// Longest common subsequence shared within a cluster pair
    Lcs,

    /// Regex-canonicalised declaration or control-flow shape
    Ast,
}

impl PatternKind {
    /// All tiers, in mining order.
    pub const ALL: [PatternKind; 3] = [PatternKind::NGram, PatternKind::Lcs, PatternKind::Ast];

    /// Stable lowercase name matching the serde tag.
    pub fn name(&self) -> &'static str {
        match self {
            PatternKind::NGram => "ngram",
            PatternKind::Lcs => "lcs",
            PatternKind::Ast => "ast",
        }
    }
}

impl std::str::FromStr for PatternKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ngram" => Ok(PatternKind::NGram),
            "lcs" => Ok(PatternKind::Lcs),
            "ast" => Ok(PatternKind::Ast),
            other => Err(format!("unknown pattern kind: {other}")),
        }
    }
}

/// A recurring token sequence or structural shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pattern {
    /// Opaque identifier
    pub id: String,

    /// Mining tier that produced the pattern
    pub kind: PatternKind,

    /// Textual form of the pattern
    pub content: String,

    /// Cross-snippet support count
    pub frequency: usize,

    /// Contributing snippet ids, sorted
    pub snippet_ids: Vec<String>,

    /// Languages of the contributing snippets, sorted and deduplicated
    pub languages: Vec<String>,

    /// Support ratio in [0, 1]
    pub confidence: f64,
}

impl Pattern {
    /// Create a pattern with a fresh id; snippet and language sets are
    /// sorted for stable output.
    pub fn new(
        kind: PatternKind,
        content: String,
        frequency: usize,
        mut snippet_ids: Vec<String>,
        mut languages: Vec<String>,
        confidence: f64,
    ) -> Self {
        snippet_ids.sort();
        snippet_ids.dedup();
        languages.sort();
        languages.dedup();
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            content,
            frequency,
            snippet_ids,
            languages,
            confidence,
        }
    }
}

/// Ingest stage statistics, persisted as a metadata sidecar.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestStats {
    /// Source files successfully processed
    pub files_processed: usize,

    /// Files skipped (unreadable, undetected language, no snippets)
    pub files_skipped: usize,

    /// Snippet records appended
    pub snippets_created: usize,

    /// Snippet count per language
    pub languages: HashMap<String, usize>,
}

/// Index stage statistics, persisted as a metadata sidecar.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    /// Snippets read from the log
    pub snippets_in: usize,

    /// Snippets surviving de-duplication
    pub snippets_kept: usize,

    /// Snippets dropped as exact or near duplicates
    pub duplicates_dropped: usize,

    /// Candidate pairs emitted by LSH bucketing
    pub candidate_pairs: usize,

    /// Pairs passing signature verification
    pub verified_pairs: usize,

    /// Clusters written
    pub clusters_created: usize,

    /// Mean cluster size (0.0 when no clusters)
    pub mean_cluster_size: f64,
}

/// Synthesis stage statistics, persisted as a metadata sidecar.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthesisStats {
    /// Patterns written per tier name
    pub patterns_by_kind: HashMap<String, usize>,

    /// Total patterns written
    pub total_patterns: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_hash_is_stable() {
        let a = Snippet::new(
            "function add(a,b){ return a+b }".to_string(),
            Language::JavaScript,
            "a.js".to_string(),
            1,
            1,
        );
        let b = Snippet::new(
            "function add(a,b){ return a+b }".to_string(),
            Language::JavaScript,
            "b.js".to_string(),
            4,
            4,
        );
        assert_eq!(a.content_hash, b.content_hash);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn cluster_languages_are_sorted_and_deduped() {
        let cluster = Cluster::new(
            vec!["s1".into(), "s2".into()],
            "s1".into(),
            0.9,
            vec!["python".into(), "javascript".into(), "python".into()],
        );
        assert_eq!(cluster.languages, vec!["javascript", "python"]);
        assert_eq!(cluster.size(), 2);
    }

    #[test]
    fn pattern_kind_parses_case_insensitively() {
        assert_eq!("NGram".parse::<PatternKind>().unwrap(), PatternKind::NGram);
        assert_eq!("lcs".parse::<PatternKind>().unwrap(), PatternKind::Lcs);
        assert!("tree".parse::<PatternKind>().is_err());
    }

    #[test]
    fn pattern_json_kind_tag_is_lowercase() {
        let pattern = Pattern::new(
            PatternKind::NGram,
            "if err return".to_string(),
            2,
            vec!["s2".into(), "s1".into()],
            vec!["go".into()],
            0.5,
        );
        let json = serde_json::to_string(&pattern).unwrap();
        assert!(json.contains("\"kind\":\"ngram\""));
        // snippet ids sorted on construction
        assert_eq!(pattern.snippet_ids, vec!["s1", "s2"]);
    }
}
