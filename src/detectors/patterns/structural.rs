//! Structural tier: regex-canonicalised declaration and control shapes.
//!
//! Identifiers are erased to `ID`, parameter lists stripped, and
//! conditions collapsed to `(CONDITION)`, leaving only the skeletal shape
//! of a declaration or control head. Canonical forms are per-language:
//! `function ID()` and `def ID()` are distinct shapes, so cross-language
//! patterns come from the n-gram and LCS tiers, not from here.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::config::SynthConfig;
use crate::core::records::{Pattern, PatternKind, Snippet};
use crate::lang::registry::Language;

static FUNCTION_SIG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(function|def|func|fn|fun)\s+[A-Za-z_$][\w$]*\s*(?:\([^)]*\))?")
        .expect("function signature regex")
});

static BRACE_FLOW_HEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(if|while|for|switch|catch)\s*\([^)]*\)").expect("brace flow head regex")
});

static BARE_FLOW_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(try|finally)\b").expect("bare flow head regex"));

static INDENT_FLOW_HEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(if|while|for|try|except|finally)\b[^:\n]*:")
        .expect("indent flow head regex")
});

static CLASS_EXTENDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bclass\s+[A-Za-z_$][\w$]*\s+extends\s+[A-Za-z_$][\w$]*")
        .expect("class extends regex")
});

static CLASS_PAREN_BASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bclass\s+[A-Za-z_]\w*\s*\(\s*[A-Za-z_][\w.]*").expect("class base regex")
});

static CLASS_PLAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bclass\s+[A-Za-z_$][\w$]*").expect("class regex"));

/// Per-shape accumulation state.
#[derive(Debug, Default)]
struct ShapeSupport {
    snippet_ids: Vec<String>,
    languages: Vec<String>,
}

/// Mine canonical structural shapes across all snippets.
///
/// Counts each shape once per snippet; emits shapes supported by at least
/// `min_frequency` snippets with confidence support/population.
pub fn mine_structural(snippets: &[Snippet], config: &SynthConfig) -> Vec<Pattern> {
    let population = snippets.len();
    if population == 0 {
        return Vec::new();
    }

    let mut support: BTreeMap<String, ShapeSupport> = BTreeMap::new();

    for snippet in snippets {
        let mut forms = canonical_forms(&snippet.content, snippet.language);
        forms.sort();
        forms.dedup();
        for form in forms {
            let entry = support.entry(form).or_default();
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
                PatternKind::Ast,
                content,
                frequency,
                s.snippet_ids,
                s.languages,
                confidence,
            )
        })
        .collect()
}

/// Extract every canonical structural form from raw snippet content.
pub fn canonical_forms(content: &str, language: Language) -> Vec<String> {
    let mut forms = Vec::new();

    for capture in FUNCTION_SIG.captures_iter(content) {
        forms.push(format!("{} ID()", &capture[1]));
    }

    // Class shapes, most specific first; a match is claimed by one form.
    let extends_count = CLASS_EXTENDS.find_iter(content).count()
        + if language == Language::Python {
            CLASS_PAREN_BASE.find_iter(content).count()
        } else {
            0
        };
    let plain_count = CLASS_PLAIN.find_iter(content).count();
    for _ in 0..extends_count {
        forms.push("class ID extends ID".to_string());
    }
    for _ in 0..plain_count.saturating_sub(extends_count) {
        forms.push("class ID".to_string());
    }

    if language.is_indent_delimited() || language == Language::Ruby {
        for capture in INDENT_FLOW_HEAD.captures_iter(content) {
            forms.push(format!("{} CONDITION:", &capture[1]));
        }
    } else {
        for capture in BRACE_FLOW_HEAD.captures_iter(content) {
            forms.push(format!("{} (CONDITION)", &capture[1]));
        }
        for capture in BARE_FLOW_HEAD.captures_iter(content) {
            forms.push(capture[1].to_string());
        }
    }

    forms
}
