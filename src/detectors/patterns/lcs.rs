//! LCS tier: longest common subsequences shared within clusters.
//!
//! Pairs are drawn within each cluster only, so the quadratic cost is
//! bounded by cluster size rather than corpus size. Identical LCS content
//! arising from different pairs is coalesced: snippet sets union and the
//! frequency is the size of the unioned set.

use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::core::config::SynthConfig;
use crate::core::records::{Cluster, Pattern, PatternKind, Snippet};

/// Confidence assigned to every LCS pattern, by convention.
const LCS_CONFIDENCE: f64 = 0.8;

/// Per-content accumulation state.
#[derive(Debug, Default)]
struct LcsSupport {
    snippet_ids: Vec<String>,
    languages: Vec<String>,
}

/// Mine LCS patterns from every snippet pair within every cluster.
///
/// Emits patterns whose subsequence is at least `min_lcs_tokens` long.
/// A pattern's snippet set holds every member that contributed through
/// some pair; with a single contributing pair the frequency is 2.
pub fn mine_lcs(snippets: &[Snippet], clusters: &[Cluster], config: &SynthConfig) -> Vec<Pattern> {
    let by_id: AHashMap<&str, &Snippet> =
        snippets.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut support: BTreeMap<String, LcsSupport> = BTreeMap::new();

    for cluster in clusters {
        for (i, left_id) in cluster.snippet_ids.iter().enumerate() {
            for right_id in cluster.snippet_ids.iter().skip(i + 1) {
                let (Some(left), Some(right)) =
                    (by_id.get(left_id.as_str()), by_id.get(right_id.as_str()))
                else {
                    continue;
                };

                let common = longest_common_subsequence(&left.tokens, &right.tokens);
                if common.len() < config.min_lcs_tokens {
                    continue;
                }

                let entry = support.entry(common.join(" ")).or_default();
                entry.snippet_ids.push(left.id.clone());
                entry.snippet_ids.push(right.id.clone());
                entry.languages.push(left.language.name().to_string());
                entry.languages.push(right.language.name().to_string());
            }
        }
    }

    support
        .into_iter()
        .map(|(content, s)| {
            let mut pattern = Pattern::new(
                PatternKind::Lcs,
                content,
                0,
                s.snippet_ids,
                s.languages,
                LCS_CONFIDENCE,
            );
            // Frequency is the coalesced snippet support.
            pattern.frequency = pattern.snippet_ids.len();
            pattern
        })
        .collect()
}

/// Longest common subsequence of two token sequences.
///
/// Standard O(m·n) dynamic-programming table with backtrack; ties prefer
/// the left sequence's earlier tokens, which keeps output deterministic.
pub fn longest_common_subsequence(a: &[String], b: &[String]) -> Vec<String> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let (m, n) = (a.len(), b.len());
    let mut table = vec![vec![0usize; n + 1]; m + 1];

    for i in 1..=m {
        for j in 1..=n {
            table[i][j] = if a[i - 1] == b[j - 1] {
                table[i - 1][j - 1] + 1
            } else {
                table[i - 1][j].max(table[i][j - 1])
            };
        }
    }

    let mut out = Vec::with_capacity(table[m][n]);
    let (mut i, mut j) = (m, n);
    while i > 0 && j > 0 {
        if a[i - 1] == b[j - 1] {
            out.push(a[i - 1].clone());
            i -= 1;
            j -= 1;
        } else if table[i - 1][j] >= table[i][j - 1] {
            i -= 1;
        } else {
            j -= 1;
        }
    }

    out.reverse();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SynthConfig;
    use crate::lang::registry::Language;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| (*w).to_string()).collect()
    }

    fn snippet(id: &str, words: &[&str]) -> Snippet {
        let mut s = Snippet::new(words.join(" "), Language::Python, "t.py".to_string(), 1, 1);
        s.id = id.to_string();
        s.tokens = tokens(words);
        s
    }

    fn cluster_of(ids: &[&str]) -> Cluster {
        Cluster::new(
            ids.iter().map(|i| (*i).to_string()).collect(),
            ids[0].to_string(),
            0.9,
            vec!["python".to_string()],
        )
    }

    #[test]
    fn lcs_of_interleaved_sequences() {
        let a = tokens(&["aa", "bb", "cc", "dd", "ee"]);
        let b = tokens(&["zz", "aa", "cc", "xx", "ee"]);
        assert_eq!(longest_common_subsequence(&a, &b), tokens(&["aa", "cc", "ee"]));
    }

    #[test]
    fn lcs_of_disjoint_sequences_is_empty() {
        let a = tokens(&["aa", "bb"]);
        let b = tokens(&["cc", "dd"]);
        assert!(longest_common_subsequence(&a, &b).is_empty());
    }

    #[test]
    fn pair_emits_pattern_with_frequency_two() {
        let config = SynthConfig::default();
        let snippets = vec![
            snippet("s1", &["aa", "bb", "cc", "dd", "ee"]),
            snippet("s2", &["zz", "aa", "cc", "xx", "ee"]),
        ];
        let clusters = vec![cluster_of(&["s1", "s2"])];

        let patterns = mine_lcs(&snippets, &clusters, &config);
        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert_eq!(p.content, "aa cc ee");
        assert_eq!(p.frequency, 2);
        assert_eq!(p.snippet_ids, vec!["s1", "s2"]);
        assert_eq!(p.confidence, 0.8);
    }

    #[test]
    fn short_overlap_is_not_emitted() {
        let config = SynthConfig::default();
        let snippets = vec![
            snippet("s1", &["aa", "bb", "qq", "rr"]),
            snippet("s2", &["aa", "bb", "ss", "tt"]),
        ];
        let clusters = vec![cluster_of(&["s1", "s2"])];
        assert!(mine_lcs(&snippets, &clusters, &config).is_empty());
    }

    #[test]
    fn identical_content_from_pairs_is_coalesced() {
        let config = SynthConfig::default();
        // Three members sharing the same token core: the three pairs all
        // produce "aa bb cc", which must coalesce to one pattern spanning
        // all three snippets.
        let snippets = vec![
            snippet("s1", &["aa", "bb", "cc", "xx"]),
            snippet("s2", &["aa", "bb", "cc", "yy"]),
            snippet("s3", &["aa", "bb", "cc", "zz"]),
        ];
        let clusters = vec![cluster_of(&["s1", "s2", "s3"])];

        let patterns = mine_lcs(&snippets, &clusters, &config);
        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert_eq!(p.content, "aa bb cc");
        assert_eq!(p.frequency, 3);
        assert_eq!(p.snippet_ids, vec!["s1", "s2", "s3"]);
    }

    #[test]
    fn pairs_only_within_clusters() {
        let config = SynthConfig::default();
        let snippets = vec![
            snippet("s1", &["aa", "bb", "cc", "dd"]),
            snippet("s2", &["aa", "bb", "cc", "ee"]),
        ];
        // No clusters: no pairs, no patterns, however similar the corpus.
        assert!(mine_lcs(&snippets, &[], &config).is_empty());
    }

    #[test]
    fn missing_member_records_are_tolerated() {
        let config = SynthConfig::default();
        let snippets = vec![snippet("s1", &["aa", "bb", "cc", "dd"])];
        let clusters = vec![cluster_of(&["s1", "ghost"])];
        assert!(mine_lcs(&snippets, &clusters, &config).is_empty());
    }
}
