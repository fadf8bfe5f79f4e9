//! Normalising tokenizer.
//!
//! Surface syntax is scrubbed so semantically similar code across dialects
//! produces comparable token bags: comments out, string literals emptied,
//! whitespace collapsed, common declaration keywords folded to shared
//! stand-ins. The tokenizer never fails; adversarial input degrades to an
//! empty token list at worst.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::lang::registry::{info_for, Language};

static DOUBLE_QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(?:[^"\\]|\\.)*""#).expect("double-quote literal regex"));

static SINGLE_QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'(?:[^'\\]|\\.)*'").expect("single-quote literal regex"));

static VAR_KEYWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:var|let|const)\b").expect("var keyword regex"));

static FUNC_KEYWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:function|def)\b").expect("func keyword regex"));

static CLASS_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bclass\b").expect("class keyword regex"));

static ASYNC_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\basync\b").expect("async keyword regex"));

static TOKEN_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]+").expect("token split regex"));

/// Language-aware normalising tokenizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tokenizer;

impl Tokenizer {
    /// Create a tokenizer.
    pub fn new() -> Self {
        Self
    }

    /// Normalise source text for a language.
    ///
    /// In order: single-line comments, block comments, string literals
    /// (replaced with empty placeholders so their contents cannot affect
    /// similarity), whitespace collapse. Normalisation is idempotent.
    pub fn normalize(&self, content: &str, language: Language) -> String {
        let info = info_for(language);

        let mut text = strip_line_comments(content, info.comments.line_prefixes);
        for (open, close) in info.comments.block_delimiters {
            text = strip_block_comments(&text, open, close);
        }

        let text = DOUBLE_QUOTED.replace_all(&text, "\"\"");
        let text = SINGLE_QUOTED.replace_all(&text, "''");

        collapse_whitespace(&text)
    }

    /// Fold common declaration keywords to shared uppercase stand-ins.
    ///
    /// This view is kept alongside the token list for LCS mining; the
    /// token list itself is derived from the unfolded normalisation.
    pub fn fold_keywords(&self, normalized: &str) -> String {
        let text = VAR_KEYWORDS.replace_all(normalized, "VAR");
        let text = FUNC_KEYWORDS.replace_all(&text, "FUNC");
        let text = CLASS_KEYWORD.replace_all(&text, "CLASS");
        ASYNC_KEYWORD.replace_all(&text, "ASYNC").into_owned()
    }

    /// Split normalised text into the ordered token sequence.
    ///
    /// Tokens shorter than two characters and pure integers are dropped;
    /// survivors are lowercased, insertion order preserved.
    pub fn tokenize(&self, normalized: &str) -> Vec<String> {
        TOKEN_SPLIT
            .split(normalized)
            .filter(|token| token.len() >= 2)
            .filter(|token| !token.bytes().all(|b| b.is_ascii_digit()))
            .map(str::to_lowercase)
            .collect()
    }

    /// Normalise, fold, and tokenize in one pass.
    ///
    /// Returns the token sequence and the keyword-folded view.
    pub fn process(&self, content: &str, language: Language) -> (Vec<String>, String) {
        let normalized = self.normalize(content, language);
        let folded = self.fold_keywords(&normalized);
        let tokens = self.tokenize(&normalized);
        (tokens, folded)
    }
}

/// Remove comments running from a prefix to end of line.
fn strip_line_comments(content: &str, prefixes: &[&str]) -> String {
    if prefixes.is_empty() {
        return content.to_string();
    }

    let mut out = String::with_capacity(content.len());
    for line in content.lines() {
        let cut = prefixes
            .iter()
            .filter_map(|prefix| line.find(prefix))
            .min()
            .unwrap_or(line.len());
        out.push_str(&line[..cut]);
        out.push('\n');
    }
    out
}

/// Remove non-nested block comments between delimiters.
fn strip_block_comments(content: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find(open) {
        out.push_str(&rest[..start]);
        // Unterminated comment swallows the remainder of the file.
        match rest[start + open.len()..].find(close) {
            Some(end) => {
                out.push(' ');
                rest = &rest[start + open.len() + end + close.len()..];
            }
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Collapse all whitespace runs into single spaces.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_slash_comments() {
        let tok = Tokenizer::new();
        let out = tok.normalize(
            "let x = 1; // trailing\n/* block\n spanning */ let y = 2;",
            Language::JavaScript,
        );
        assert!(!out.contains("trailing"));
        assert!(!out.contains("spanning"));
        assert!(out.contains("let y = 2;"));
    }

    #[test]
    fn strips_hash_comments_for_python() {
        let tok = Tokenizer::new();
        let out = tok.normalize("x = 1  # note\ny = 2", Language::Python);
        assert!(!out.contains("note"));
        assert!(out.contains("y = 2"));
    }

    #[test]
    fn sql_dashes_and_html_arrows() {
        let tok = Tokenizer::new();
        let sql = tok.normalize("SELECT 1 -- pick one\nFROM t", Language::Sql);
        assert!(!sql.contains("pick"));

        let html = tok.normalize("<div><!-- hidden --><p>hi</p></div>", Language::Html);
        assert!(!html.contains("hidden"));
        assert!(html.contains("<p>hi</p>"));
    }

    #[test]
    fn empties_string_literals() {
        let tok = Tokenizer::new();
        let out = tok.normalize(
            r#"log("different text here"); log('and more');"#,
            Language::JavaScript,
        );
        assert!(!out.contains("different"));
        assert!(out.contains(r#"log("")"#));
        assert!(out.contains("log('')"));
    }

    #[test]
    fn normalization_is_idempotent() {
        let tok = Tokenizer::new();
        let source = "function add(a, b) { // sum\n  return a + b; /* done */ }\n";
        let once = tok.normalize(source, Language::JavaScript);
        let twice = tok.normalize(&once, Language::JavaScript);
        assert_eq!(once, twice);
        assert_eq!(tok.tokenize(&once), tok.tokenize(&twice));
    }

    #[test]
    fn folds_keywords() {
        let tok = Tokenizer::new();
        let folded = tok.fold_keywords("const x = async function f() { class Y {} }");
        assert_eq!(folded, "VAR x = ASYNC FUNC f() { CLASS Y {} }");
        // already-folded text is left alone
        assert_eq!(tok.fold_keywords(&folded), folded);
    }

    #[test]
    fn tokenize_drops_short_and_numeric() {
        let tok = Tokenizer::new();
        let tokens = tok.tokenize("Foo x 42 bar_baz 7a if");
        assert_eq!(tokens, vec!["foo", "bar_baz", "7a", "if"]);
    }

    #[test]
    fn tokenize_drops_pure_integers_only() {
        let tok = Tokenizer::new();
        let tokens = tok.tokenize("add 100 200 total100");
        assert_eq!(tokens, vec!["add", "total100"]);
    }

    #[test]
    fn unterminated_block_comment_swallows_tail() {
        let tok = Tokenizer::new();
        let out = tok.normalize("int a; /* open forever\nint b;", Language::C);
        assert!(out.contains("int a;"));
        assert!(!out.contains("int b;"));
    }

    #[test]
    fn unknown_language_passes_through() {
        let tok = Tokenizer::new();
        let out = tok.normalize("# not a comment here", Language::Unknown);
        assert!(out.contains("not a comment here"));
    }
}
