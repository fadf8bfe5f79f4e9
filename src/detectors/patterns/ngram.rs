//! N-gram tier: recurring contiguous token windows.

use std::collections::BTreeMap;

use crate::core::config::SynthConfig;
use crate::core::records::{Pattern, PatternKind, Snippet};

/// Per-ngram accumulation state.
#[derive(Debug, Default)]
struct NgramSupport {
    snippet_ids: Vec<String>,
    languages: Vec<String>,
}

/// Slide a length-n window over every snippet's token sequence and emit
/// each ngram supported by at least `min_frequency` snippets.
///
/// Frequency is cross-snippet support (multiple occurrences inside one
/// snippet count once); confidence is support over the global snippet
/// count.
pub fn mine_ngrams(snippets: &[Snippet], config: &SynthConfig) -> Vec<Pattern> {
    let population = snippets.len();
    if population == 0 {
        return Vec::new();
    }

    // BTreeMap keeps tied output deterministic without a later sort pass.
    let mut support: BTreeMap<String, NgramSupport> = BTreeMap::new();

    for snippet in snippets {
        if snippet.tokens.len() < config.ngram_size {
            continue;
        }
        let mut seen_here: ahash::AHashSet<&[String]> = ahash::AHashSet::new();
        for window in snippet.tokens.windows(config.ngram_size) {
            if !seen_here.insert(window) {
                continue;
            }
            let entry = support.entry(window.join(" ")).or_default();
            entry.snippet_ids.push(snippet.id.clone());
            entry.languages.push(snippet.language.name().to_string());
        }
    }

    support
        .into_iter()
        .filter(|(_, s)| s.snippet_ids.len() >= config.min_frequency)
        .map(|(content, s)| {
            let frequency = s.snippet_ids.len();
            let confidence = frequency as f64 / population as f64;
            Pattern::new(
                PatternKind::NGram,
                content,
                frequency,
                s.snippet_ids,
                s.languages,
                confidence,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SynthConfig;
    use crate::lang::registry::Language;

    fn snippet(words: &[&str], language: Language) -> Snippet {
        let mut s = Snippet::new(
            words.join(" "),
            language,
            "test.src".to_string(),
            1,
            1,
        );
        s.tokens = words.iter().map(|w| (*w).to_string()).collect();
        s
    }

    #[test]
    fn shared_run_emits_one_pattern() {
        let config = SynthConfig::default();
        let snippets = vec![
            snippet(&["if", "err", "return", "err"], Language::Go),
            snippet(&["if", "err", "return", "err"], Language::Go),
            snippet(&["totally", "unrelated", "words", "here"], Language::Go),
        ];

        let patterns = mine_ngrams(&snippets, &config);
        let contents: Vec<&str> = patterns.iter().map(|p| p.content.as_str()).collect();
        assert!(contents.contains(&"if err return"));
        assert!(contents.contains(&"err return err"));
        for p in &patterns {
            assert_eq!(p.frequency, 2);
            assert_eq!(p.snippet_ids.len(), 2);
            assert!((p.confidence - 2.0 / 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn repeats_within_one_snippet_count_once() {
        let config = SynthConfig::default();
        let snippets = vec![
            snippet(
                &["go", "go", "go", "go", "go", "go"],
                Language::JavaScript,
            ),
            snippet(&["go", "go", "go"], Language::JavaScript),
        ];

        let patterns = mine_ngrams(&snippets, &config);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].content, "go go go");
        assert_eq!(patterns[0].frequency, 2);
    }

    #[test]
    fn below_threshold_is_dropped() {
        let config = SynthConfig::default();
        let snippets = vec![
            snippet(&["one", "two", "three"], Language::Python),
            snippet(&["four", "five", "six"], Language::Python),
        ];
        assert!(mine_ngrams(&snippets, &config).is_empty());
    }

    #[test]
    fn short_token_lists_are_skipped() {
        let config = SynthConfig::default();
        let snippets = vec![
            snippet(&["ab", "cd"], Language::Python),
            snippet(&["ab", "cd"], Language::Python),
        ];
        assert!(mine_ngrams(&snippets, &config).is_empty());
    }

    #[test]
    fn languages_union_across_snippets() {
        let config = SynthConfig::default();
        let snippets = vec![
            snippet(&["add", "return", "total"], Language::Python),
            snippet(&["add", "return", "total"], Language::JavaScript),
        ];
        let patterns = mine_ngrams(&snippets, &config);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].languages, vec!["javascript", "python"]);
    }
}
