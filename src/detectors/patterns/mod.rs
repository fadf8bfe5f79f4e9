//! Pattern mining: three tiers of recurring structure.
//!
//! The tiers share little code, so they are dispatched over the
//! [`PatternKind`] sum type rather than a trait hierarchy. Mining is
//! re-runnable: the same snippet/cluster datasets produce the same
//! pattern set up to ordering ties.

pub mod lcs;
pub mod ngram;
pub mod structural;

use tracing::debug;

use crate::core::config::SynthConfig;
use crate::core::records::{Cluster, Pattern, PatternKind, Snippet};

/// Mine the requested tiers and rank the combined result.
///
/// An empty `kinds` slice mines every tier. Ranking is by descending
/// frequency, then descending language diversity, then descending snippet
/// count, with a final content tie-break for stable output.
pub fn mine(
    snippets: &[Snippet],
    clusters: &[Cluster],
    kinds: &[PatternKind],
    config: &SynthConfig,
) -> Vec<Pattern> {
    let selected: &[PatternKind] = if kinds.is_empty() {
        &PatternKind::ALL
    } else {
        kinds
    };

    let mut patterns = Vec::new();
    for kind in selected {
        let mined = match kind {
            PatternKind::NGram => ngram::mine_ngrams(snippets, config),
            PatternKind::Lcs => lcs::mine_lcs(snippets, clusters, config),
            PatternKind::Ast => structural::mine_structural(snippets, config),
        };
        debug!(kind = kind.name(), count = mined.len(), "tier mined");
        patterns.extend(mined);
    }

    rank(&mut patterns);
    patterns
}

/// Rank patterns in place: frequency, cross-language spread, snippet
/// support, then content.
pub fn rank(patterns: &mut [Pattern]) {
    patterns.sort_by(|a, b| {
        b.frequency
            .cmp(&a.frequency)
            .then_with(|| b.languages.len().cmp(&a.languages.len()))
            .then_with(|| b.snippet_ids.len().cmp(&a.snippet_ids.len()))
            .then_with(|| a.content.cmp(&b.content))
    });
}
