//! Clustering: turn verified similar pairs into equivalence classes.
//!
//! Verified pairs form an undirected similarity graph; connected
//! components become clusters. Membership is transitive: two members
//! need a path of threshold-passing edges between them, not a direct
//! edge. The centroid is the member with the highest mean similarity to
//! the rest.

use petgraph::graphmap::UnGraphMap;
use tracing::debug;

use crate::core::records::{Cluster, Snippet};
use crate::detectors::lsh::{estimated_jaccard, CandidatePair, LshIndex};

/// Builds clusters from an LSH index and its snippet slots.
#[derive(Debug, Clone)]
pub struct ClusterBuilder {
    cluster_threshold: f64,
    min_cluster_size: usize,
    emit_singletons: bool,
}

impl ClusterBuilder {
    /// Create a builder with the edge-admission threshold and minimum
    /// emitted size.
    pub fn new(cluster_threshold: f64, min_cluster_size: usize) -> Self {
        Self {
            cluster_threshold,
            min_cluster_size,
            emit_singletons: false,
        }
    }

    /// Also emit singleton components as size-1 clusters (similarity 1.0
    /// by convention). The synthesis stage tolerates either choice.
    pub fn with_singletons(mut self, emit: bool) -> Self {
        self.emit_singletons = emit;
        self
    }

    /// Build clusters over the indexed snippets.
    ///
    /// `snippets` is slot-aligned with the index. Clusters are labelled in
    /// the order their component's seed snippet is first visited.
    pub fn build(&self, index: &LshIndex, snippets: &[Snippet]) -> Vec<Cluster> {
        let verified = index.verified_pairs(self.cluster_threshold);
        debug!(
            verified = verified.len(),
            threshold = self.cluster_threshold,
            "building similarity graph"
        );

        let components = connected_components(index.len(), &verified);

        let mut clusters = Vec::new();
        for component in components {
            if component.len() < self.min_cluster_size {
                if !(self.emit_singletons && component.len() == 1) {
                    continue;
                }
            }

            let (centroid_slot, mean_similarity) = centroid_of(index, &component);
            let snippet_ids = component
                .iter()
                .map(|&slot| snippets[slot].id.clone())
                .collect();
            let languages = component
                .iter()
                .map(|&slot| snippets[slot].language.name().to_string())
                .collect();

            clusters.push(Cluster::new(
                snippet_ids,
                snippets[centroid_slot].id.clone(),
                mean_similarity,
                languages,
            ));
        }

        clusters
    }
}

/// Enumerate connected components by iterative DFS.
///
/// Components come out in the order their seed node is first visited;
/// nodes within a component come out in DFS visit order. Both orders are
/// deterministic for a fixed insertion sequence.
pub fn connected_components(
    node_count: usize,
    edges: &[(CandidatePair, f64)],
) -> Vec<Vec<usize>> {
    let mut graph: UnGraphMap<usize, f64> = UnGraphMap::new();
    for node in 0..node_count {
        graph.add_node(node);
    }
    for (pair, similarity) in edges {
        graph.add_edge(pair.left, pair.right, *similarity);
    }

    let mut visited = vec![false; node_count];
    let mut components = Vec::new();

    for seed in 0..node_count {
        if visited[seed] {
            continue;
        }

        let mut component = Vec::new();
        let mut stack = vec![seed];
        visited[seed] = true;

        while let Some(node) = stack.pop() {
            component.push(node);
            for neighbor in graph.neighbors(node) {
                if !visited[neighbor] {
                    visited[neighbor] = true;
                    stack.push(neighbor);
                }
            }
        }

        components.push(component);
    }

    components
}

/// Select the centroid slot and mean pairwise similarity of a component.
///
/// The centroid maximises mean similarity to the other members, ties
/// broken by first occurrence. Singletons score 1.0 by convention.
fn centroid_of(index: &LshIndex, component: &[usize]) -> (usize, f64) {
    if component.len() == 1 {
        return (component[0], 1.0);
    }

    let mut best_slot = component[0];
    let mut best_mean = f64::MIN;
    let mut pair_sum = 0.0;
    let mut pair_count = 0usize;

    for (i, &slot) in component.iter().enumerate() {
        let mut sum = 0.0;
        for (j, &other) in component.iter().enumerate() {
            if i == j {
                continue;
            }
            let similarity =
                estimated_jaccard(index.signature_of(slot), index.signature_of(other));
            sum += similarity;
            if i < j {
                pair_sum += similarity;
                pair_count += 1;
            }
        }
        let mean = sum / (component.len() - 1) as f64;
        if mean > best_mean {
            best_mean = mean;
            best_slot = slot;
        }
    }

    (best_slot, pair_sum / pair_count as f64)
}

/// Outcome of the de-duplication pass.
#[derive(Debug)]
pub struct DedupOutcome {
    /// Snippets surviving de-duplication, in input order
    pub kept: Vec<Snippet>,

    /// Count of dropped duplicates
    pub dropped: usize,
}

/// Pre-cluster de-duplication: exact content-hash drop, then
/// LSH-candidate drop at the similarity threshold.
///
/// The pass compares each incoming snippet against the already-kept set,
/// so it is order-sensitive: different input orders can keep different
/// representatives. Callers stream snippets in file-walk order.
#[derive(Debug)]
pub struct Deduplicator {
    similarity_threshold: f64,
}

impl Deduplicator {
    /// Create a de-duplicator with the duplicate-admission threshold.
    pub fn new(similarity_threshold: f64) -> Self {
        Self {
            similarity_threshold,
        }
    }

    /// Filter near-duplicates out of a snippet batch.
    ///
    /// The snippets must already carry signatures generated under one
    /// hash family. The kept set is what enters clustering.
    pub fn dedup(&self, snippets: Vec<Snippet>, index: &mut LshIndex) -> DedupOutcome {
        let mut seen_hashes: ahash::AHashSet<String> = ahash::AHashSet::new();
        let mut kept = Vec::with_capacity(snippets.len());
        let mut dropped = 0usize;

        for snippet in snippets {
            if !seen_hashes.insert(snippet.content_hash.clone()) {
                debug!(id = %snippet.id, "dropping exact duplicate");
                dropped += 1;
                continue;
            }

            let near_duplicate = index.query(&snippet.signature).into_iter().any(|slot| {
                estimated_jaccard(index.signature_of(slot), &snippet.signature)
                    >= self.similarity_threshold
            });
            if near_duplicate {
                debug!(id = %snippet.id, "dropping near duplicate");
                dropped += 1;
                continue;
            }

            index.insert(snippet.id.clone(), snippet.signature.clone());
            kept.push(snippet);
        }

        DedupOutcome { kept, dropped }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::LshConfig;
    use crate::detectors::lsh::LshContext;
    use crate::lang::registry::Language;

    fn snippet(content: &str, language: Language, ctx: &LshContext) -> Snippet {
        let mut s = Snippet::new(
            content.to_string(),
            language,
            "test.src".to_string(),
            1,
            content.lines().count().max(1),
        );
        s.tokens = content.split_whitespace().map(str::to_lowercase).collect();
        s.signature = ctx.signature(&s.tokens);
        s
    }

    fn config() -> LshConfig {
        LshConfig {
            bands: 10,
            rows_per_band: 2,
            ..LshConfig::default()
        }
    }

    #[test]
    fn identical_snippets_cluster_together() {
        let cfg = config();
        let ctx = LshContext::new(&cfg);
        let a = snippet("function add one two return total", Language::JavaScript, &ctx);
        let b = snippet("function add one two return total", Language::JavaScript, &ctx);
        let snippets = vec![a, b];

        let mut index = LshIndex::new(&cfg);
        for s in &snippets {
            index.insert(s.id.clone(), s.signature.clone());
        }

        let clusters = ClusterBuilder::new(0.7, 2).build(&index, &snippets);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].size(), 2);
        assert_eq!(clusters[0].similarity, 1.0);
        assert!(clusters[0].snippet_ids.contains(&clusters[0].centroid_id));
    }

    #[test]
    fn dissimilar_snippets_stay_apart() {
        let cfg = config();
        let ctx = LshContext::new(&cfg);
        let snippets = vec![
            snippet("alpha beta gamma delta epsilon zeta", Language::Python, &ctx),
            snippet("uno dos tres cuatro cinco seis", Language::Python, &ctx),
        ];

        let mut index = LshIndex::new(&cfg);
        for s in &snippets {
            index.insert(s.id.clone(), s.signature.clone());
        }

        let clusters = ClusterBuilder::new(0.7, 2).build(&index, &snippets);
        assert!(clusters.is_empty());
    }

    #[test]
    fn transitive_membership_through_bridge() {
        // a ~ b and b ~ c suffice; a and c need no direct edge.
        let components = connected_components(
            3,
            &[
                (CandidatePair { left: 0, right: 1 }, 0.9),
                (CandidatePair { left: 1, right: 2 }, 0.8),
            ],
        );
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].len(), 3);
    }

    #[test]
    fn component_order_follows_first_visit() {
        let components = connected_components(
            4,
            &[
                (CandidatePair { left: 2, right: 3 }, 0.9),
                (CandidatePair { left: 0, right: 1 }, 0.9),
            ],
        );
        // Seeded from node 0 first, so the 0-1 component labels first.
        assert_eq!(components[0][0], 0);
        assert_eq!(components[1][0], 2);
    }

    #[test]
    fn cluster_records_language_union() {
        let cfg = config();
        let ctx = LshContext::new(&cfg);
        let snippets = vec![
            snippet("shared tokens here for both sides", Language::Python, &ctx),
            snippet("shared tokens here for both sides", Language::JavaScript, &ctx),
        ];

        let mut index = LshIndex::new(&cfg);
        for s in &snippets {
            index.insert(s.id.clone(), s.signature.clone());
        }

        let clusters = ClusterBuilder::new(0.7, 2).build(&index, &snippets);
        assert_eq!(clusters[0].languages, vec!["javascript", "python"]);
    }

    #[test]
    fn singleton_emission_is_optional() {
        let cfg = config();
        let ctx = LshContext::new(&cfg);
        let snippets = vec![snippet(
            "lonely snippet with no peers at all",
            Language::Go,
            &ctx,
        )];

        let mut index = LshIndex::new(&cfg);
        index.insert(snippets[0].id.clone(), snippets[0].signature.clone());

        let dropped = ClusterBuilder::new(0.7, 2).build(&index, &snippets);
        assert!(dropped.is_empty());

        let emitted = ClusterBuilder::new(0.7, 2)
            .with_singletons(true)
            .build(&index, &snippets);
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].similarity, 1.0);
        assert_eq!(emitted[0].centroid_id, snippets[0].id);
    }

    #[test]
    fn exact_duplicates_are_dropped_by_hash() {
        let cfg = config();
        let ctx = LshContext::new(&cfg);
        let snippets = vec![
            snippet("function add one two return total", Language::JavaScript, &ctx),
            snippet("function add one two return total", Language::JavaScript, &ctx),
        ];

        let mut index = LshIndex::new(&cfg);
        let outcome = Deduplicator::new(0.8).dedup(snippets, &mut index);
        assert_eq!(outcome.kept.len(), 1);
        assert_eq!(outcome.dropped, 1);
    }

    #[test]
    fn near_duplicates_are_dropped_by_similarity() {
        let cfg = config();
        let ctx = LshContext::new(&cfg);
        let first = snippet(
            "function add one two return total sum value",
            Language::JavaScript,
            &ctx,
        );
        // One token differs; shingle overlap stays high.
        let second = snippet(
            "function add one two return total sum other",
            Language::JavaScript,
            &ctx,
        );
        let distinct = snippet(
            "completely different words appear in this body",
            Language::JavaScript,
            &ctx,
        );

        let mut index = LshIndex::new(&cfg);
        let outcome =
            Deduplicator::new(0.5).dedup(vec![first, second, distinct], &mut index);
        assert_eq!(outcome.kept.len(), 2);
        assert_eq!(outcome.dropped, 1);
    }
}
