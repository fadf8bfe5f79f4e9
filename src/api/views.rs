//! Read-only aggregation views over the store.
//!
//! These are the data contracts the external HTTP collaborator serves to
//! the browser UI. Everything here reads through [`JsonlStore`] and never
//! mutates; wire field names are camelCase.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::core::records::{Cluster, Pattern, PatternKind, Snippet};
use crate::core::errors::Result;
use crate::io::store::{Dataset, JsonlStore};

/// Number of preview lines shown per cluster.
const PREVIEW_LINES: usize = 3;

/// Cap on patterns returned by a query.
const PATTERN_QUERY_CAP: usize = 100;

/// Corpus-wide statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusStats {
    /// Total stored snippets
    pub total_snippets: usize,

    /// Total stored clusters
    pub total_clusters: usize,

    /// Total stored patterns
    pub total_patterns: usize,

    /// Snippet count per language name
    pub language_breakdown: HashMap<String, usize>,

    /// Mean cluster size (0.0 when no clusters)
    pub avg_cluster_size: f64,
}

/// A cluster joined with its members and the patterns touching them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterView {
    /// The cluster record
    pub cluster: Cluster,

    /// Member snippet records, in cluster order
    pub snippets: Vec<Snippet>,

    /// Patterns whose snippet set intersects the membership
    pub patterns: Vec<Pattern>,

    /// First lines of the first member, for listings
    pub preview: String,
}

/// Compute corpus-wide statistics.
pub fn corpus_stats(store: &JsonlStore) -> Result<CorpusStats> {
    let mut total_snippets = 0usize;
    let mut language_breakdown: HashMap<String, usize> = HashMap::new();
    for snippet in store.scan::<Snippet>(Dataset::Snippets)? {
        total_snippets += 1;
        *language_breakdown
            .entry(snippet.language.name().to_string())
            .or_insert(0) += 1;
    }

    let clusters: Vec<Cluster> = store.scan_all(Dataset::Clusters)?;
    let avg_cluster_size = if clusters.is_empty() {
        0.0
    } else {
        clusters.iter().map(Cluster::size).sum::<usize>() as f64 / clusters.len() as f64
    };

    Ok(CorpusStats {
        total_snippets,
        total_clusters: clusters.len(),
        total_patterns: store.record_count(Dataset::Patterns)?,
        language_breakdown,
        avg_cluster_size,
    })
}

/// Build views for every stored cluster.
pub fn cluster_views(store: &JsonlStore) -> Result<Vec<ClusterView>> {
    let clusters: Vec<Cluster> = store.scan_all(Dataset::Clusters)?;
    let snippets: Vec<Snippet> = store.scan_all(Dataset::Snippets)?;
    let patterns: Vec<Pattern> = store.scan_all(Dataset::Patterns)?;

    let by_id: HashMap<&str, &Snippet> =
        snippets.iter().map(|s| (s.id.as_str(), s)).collect();

    Ok(clusters
        .into_iter()
        .map(|cluster| assemble_view(cluster, &by_id, &patterns))
        .collect())
}

/// Build the view for one cluster, if it exists.
pub fn cluster_view(store: &JsonlStore, id: &str) -> Result<Option<ClusterView>> {
    let Some(cluster) = store.get_by_id::<Cluster>(Dataset::Clusters, id)? else {
        return Ok(None);
    };

    let snippets: Vec<Snippet> = store.scan_all(Dataset::Snippets)?;
    let patterns: Vec<Pattern> = store.scan_all(Dataset::Patterns)?;
    let by_id: HashMap<&str, &Snippet> =
        snippets.iter().map(|s| (s.id.as_str(), s)).collect();

    Ok(Some(assemble_view(cluster, &by_id, &patterns)))
}

/// Fetch one snippet record.
pub fn snippet_view(store: &JsonlStore, id: &str) -> Result<Option<Snippet>> {
    store.get_by_id(Dataset::Snippets, id)
}

/// Patterns filtered by tier, ranked by frequency × confidence, capped.
pub fn patterns_by_kind(store: &JsonlStore, kind: Option<PatternKind>) -> Result<Vec<Pattern>> {
    let mut patterns: Vec<Pattern> = store
        .scan::<Pattern>(Dataset::Patterns)?
        .filter(|p| kind.map_or(true, |k| p.kind == k))
        .collect();

    patterns.sort_by(|a, b| {
        let score_a = a.frequency as f64 * a.confidence;
        let score_b = b.frequency as f64 * b.confidence;
        score_b
            .partial_cmp(&score_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.content.cmp(&b.content))
    });
    patterns.truncate(PATTERN_QUERY_CAP);

    Ok(patterns)
}

/// Join a cluster with its member records and intersecting patterns.
fn assemble_view(
    cluster: Cluster,
    by_id: &HashMap<&str, &Snippet>,
    patterns: &[Pattern],
) -> ClusterView {
    let members: Vec<Snippet> = cluster
        .snippet_ids
        .iter()
        .filter_map(|id| by_id.get(id.as_str()).map(|s| (*s).clone()))
        .collect();

    let member_ids: HashSet<&str> = cluster.snippet_ids.iter().map(String::as_str).collect();
    let touching: Vec<Pattern> = patterns
        .iter()
        .filter(|p| p.snippet_ids.iter().any(|id| member_ids.contains(id.as_str())))
        .cloned()
        .collect();

    let preview = members
        .first()
        .map(|snippet| {
            snippet
                .content
                .lines()
                .take(PREVIEW_LINES)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    ClusterView {
        cluster,
        snippets: members,
        patterns: touching,
        preview,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::registry::Language;
    use tempfile::TempDir;

    fn seeded_store() -> (TempDir, JsonlStore, Snippet, Snippet, Cluster) {
        let dir = TempDir::new().unwrap();
        let store = JsonlStore::open(dir.path()).unwrap();

        let mut a = Snippet::new(
            "function add(a, b) {\n  return a + b;\n}\n// tail".to_string(),
            Language::JavaScript,
            "a.js".to_string(),
            1,
            4,
        );
        a.tokens = vec!["function".into(), "add".into(), "return".into()];
        let mut b = Snippet::new(
            "def add(a, b):\n    return a + b".to_string(),
            Language::Python,
            "b.py".to_string(),
            1,
            2,
        );
        b.tokens = vec!["def".into(), "add".into(), "return".into()];

        let cluster = Cluster::new(
            vec![a.id.clone(), b.id.clone()],
            a.id.clone(),
            0.85,
            vec!["javascript".into(), "python".into()],
        );
        a.cluster_id = Some(cluster.id.clone());
        b.cluster_id = Some(cluster.id.clone());

        store.append(Dataset::Snippets, &a).unwrap();
        store.append(Dataset::Snippets, &b).unwrap();
        store.append(Dataset::Clusters, &cluster).unwrap();

        let pattern = Pattern::new(
            PatternKind::NGram,
            "function add return".to_string(),
            2,
            vec![a.id.clone(), b.id.clone()],
            vec!["javascript".into(), "python".into()],
            1.0,
        );
        store.append(Dataset::Patterns, &pattern).unwrap();

        (dir, store, a, b, cluster)
    }

    #[test]
    fn stats_aggregate_counts_and_languages() {
        let (_dir, store, ..) = seeded_store();
        let stats = corpus_stats(&store).unwrap();
        assert_eq!(stats.total_snippets, 2);
        assert_eq!(stats.total_clusters, 1);
        assert_eq!(stats.total_patterns, 1);
        assert_eq!(stats.language_breakdown["javascript"], 1);
        assert_eq!(stats.language_breakdown["python"], 1);
        assert_eq!(stats.avg_cluster_size, 2.0);
    }

    #[test]
    fn cluster_view_joins_members_and_patterns() {
        let (_dir, store, a, _b, cluster) = seeded_store();
        let view = cluster_view(&store, &cluster.id).unwrap().unwrap();
        assert_eq!(view.snippets.len(), 2);
        assert_eq!(view.patterns.len(), 1);
        assert!(view.preview.starts_with("function add"));
        assert_eq!(view.preview.lines().count(), 3);
        assert_eq!(view.snippets[0].id, a.id);

        assert!(cluster_view(&store, "missing").unwrap().is_none());
    }

    #[test]
    fn pattern_query_filters_by_kind() {
        let (_dir, store, a, b, _cluster) = seeded_store();
        let lcs = Pattern::new(
            PatternKind::Lcs,
            "add return".to_string(),
            2,
            vec![a.id, b.id],
            vec!["javascript".into(), "python".into()],
            0.8,
        );
        store.append(Dataset::Patterns, &lcs).unwrap();

        let all = patterns_by_kind(&store, None).unwrap();
        assert_eq!(all.len(), 2);
        // frequency × confidence ranks the ngram (2.0) over the lcs (1.6)
        assert_eq!(all[0].kind, PatternKind::NGram);

        let only_lcs = patterns_by_kind(&store, Some(PatternKind::Lcs)).unwrap();
        assert_eq!(only_lcs.len(), 1);
        assert_eq!(only_lcs[0].kind, PatternKind::Lcs);
    }

    #[test]
    fn stats_camel_case_on_the_wire() {
        let (_dir, store, ..) = seeded_store();
        let stats = corpus_stats(&store).unwrap();
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"totalSnippets\""));
        assert!(json.contains("\"languageBreakdown\""));
        assert!(json.contains("\"avgClusterSize\""));
    }
}
