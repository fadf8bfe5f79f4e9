//! Snippet extraction: cut a file into function/class-sized fragments.
//!
//! The extractor is heuristic and lossy. Its only contract is that
//! emitted fragments are syntactically plausible units and that line
//! ranges are correct relative to the source. Brace languages are cut by
//! matching a declaration line against a per-family regex and scanning for
//! the closing `}` at or left of the opening indentation; indentation
//! languages are cut by the first dedent. Files with no recognisable
//! declarations fall back to a single whole-file snippet when short
//! enough.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::config::ExtractConfig;
use crate::core::records::Snippet;
use crate::lang::registry::Language;

static PYTHON_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:async\s+)?def\s+[A-Za-z_]\w*|^\s*class\s+[A-Za-z_]\w*")
        .expect("python declaration regex")
});

static RUBY_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:def|class|module)\s+[A-Za-z_]\w*").expect("ruby declaration regex")
});

static JS_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*[A-Za-z_$][\w$]*\s*\(|^\s*(?:export\s+)?class\s+[A-Za-z_$][\w$]*|^\s*(?:const|let|var)\s+[A-Za-z_$][\w$]*\s*=\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*=>)",
    )
    .expect("javascript declaration regex")
});

static GO_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*func\s+(?:\([^)]*\)\s*)?[A-Za-z_]\w*\s*\(").expect("go declaration regex")
});

static RUST_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:unsafe\s+)?fn\s+[A-Za-z_]\w*|^\s*(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum|trait|impl)\b",
    )
    .expect("rust declaration regex")
});

static FUN_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:(?:public|private|protected|internal|open|override|static|final|suspend)\s+)*(?:fun|func)\s+[A-Za-z_]\w*\s*\(|^\s*(?:(?:public|private|internal|open|final|data)\s+)*(?:class|struct|object)\s+[A-Za-z_]\w*",
    )
    .expect("fun/func declaration regex")
});

static SCALA_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:(?:private|protected|override|final|implicit)\s+)*(?:def\s+[A-Za-z_]\w*|(?:case\s+)?class\s+[A-Za-z_]\w*|object\s+[A-Za-z_]\w*|trait\s+[A-Za-z_]\w*)",
    )
    .expect("scala declaration regex")
});

static C_LIKE_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:(?:public|private|protected|internal|static|final|abstract|virtual|override|inline|constexpr|unsigned|signed|extern)\s+)*(?:(?:class|struct|interface|enum)\s+[A-Za-z_]\w*|[A-Za-z_][\w:<>\[\],\s\*&]*[\w>\]\*&]\s+[A-Za-z_]\w*\s*\()",
    )
    .expect("c-like declaration regex")
});

/// Keywords that start statements, not declarations; used to reject
/// regex false positives in the c-like family.
const CONTROL_KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "switch", "return", "do", "case", "catch", "throw", "new",
    "delete", "sizeof", "typedef",
];

/// Heuristic snippet extractor.
#[derive(Debug, Clone)]
pub struct SnippetExtractor {
    config: ExtractConfig,
}

impl SnippetExtractor {
    /// Create an extractor with the given configuration.
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    /// Cut a file into snippets, emitted in file order.
    pub fn extract(&self, content: &str, language: Language, file_path: &str) -> Vec<Snippet> {
        let lines: Vec<&str> = content.lines().collect();
        if lines.is_empty() {
            return Vec::new();
        }

        let ranges = if language.is_indent_delimited() || language == Language::Ruby {
            indent_ranges(&lines, language)
        } else {
            brace_ranges(&lines, language)
        };

        let mut snippets = Vec::new();
        if ranges.is_empty() {
            if lines.len() <= self.config.max_whole_file_lines {
                self.push_range(&mut snippets, &lines, 1, lines.len(), language, file_path);
            }
            return snippets;
        }

        for (start, end) in ranges {
            self.push_range(&mut snippets, &lines, start, end, language, file_path);
        }
        snippets
    }

    /// Materialise a line range into a snippet, applying the size filter.
    fn push_range(
        &self,
        out: &mut Vec<Snippet>,
        lines: &[&str],
        start: usize,
        end: usize,
        language: Language,
        file_path: &str,
    ) {
        let content = lines[start - 1..end].join("\n");
        let significant = content.chars().filter(|c| !c.is_whitespace()).count();
        if significant <= self.config.min_snippet_chars {
            return;
        }

        out.push(Snippet::new(
            content,
            language,
            file_path.to_string(),
            start,
            end,
        ));
    }
}

/// Does this line open a declaration for the given language?
fn is_declaration(line: &str, language: Language) -> bool {
    let matched = match language {
        Language::Python => PYTHON_DECL.is_match(line),
        Language::Ruby => RUBY_DECL.is_match(line),
        Language::JavaScript | Language::TypeScript | Language::Php => JS_DECL.is_match(line),
        Language::Go => GO_DECL.is_match(line),
        Language::Rust => RUST_DECL.is_match(line),
        Language::Kotlin | Language::Swift => FUN_DECL.is_match(line),
        Language::Scala => SCALA_DECL.is_match(line),
        Language::Java | Language::CSharp | Language::Cpp | Language::C => {
            C_LIKE_DECL.is_match(line) && !line.trim_end().ends_with(';')
        }
        Language::Html | Language::Css | Language::Sql | Language::Unknown => false,
    };

    if !matched {
        return false;
    }

    // Reject statement lines the loose c-like regex can match.
    let first_word = line
        .trim_start()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .next()
        .unwrap_or("");
    !CONTROL_KEYWORDS.contains(&first_word)
}

/// Leading whitespace width of a line.
fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Find `(start, end)` 1-based inclusive line ranges for brace languages.
///
/// A snippet runs from a declaration line to the first following line
/// whose trimmed content is a closing brace at indentation no deeper than
/// the opener. Scanning resumes past each snippet, so nested declarations
/// are absorbed into their parent.
fn brace_ranges(lines: &[&str], language: Language) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if !is_declaration(lines[i], language) {
            i += 1;
            continue;
        }

        let open_indent = indent_of(lines[i]);
        let mut end = lines.len();
        for (j, line) in lines.iter().enumerate().skip(i + 1) {
            let trimmed = line.trim();
            if (trimmed == "}" || trimmed == "};") && indent_of(line) <= open_indent {
                end = j + 1;
                break;
            }
        }

        ranges.push((i + 1, end));
        i = end;
    }

    ranges
}

/// Find line ranges for indentation-delimited languages.
///
/// A snippet runs from a `def`/`class` line until the next non-blank line
/// at indentation no deeper than the opener, with a minimum body of three
/// lines to avoid premature cuts on decorated or commented headers.
fn indent_ranges(lines: &[&str], language: Language) -> Vec<(usize, usize)> {
    const MIN_SNIPPET_LINES: usize = 3;

    let mut ranges = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if !is_declaration(lines[i], language) {
            i += 1;
            continue;
        }

        let open_indent = indent_of(lines[i]);
        let mut end = lines.len();
        for (j, line) in lines.iter().enumerate().skip(i + 1) {
            if line.trim().is_empty() {
                continue;
            }
            if indent_of(line) <= open_indent && (j - i) >= MIN_SNIPPET_LINES {
                end = j;
                break;
            }
        }

        // Trim trailing blank lines off the fragment.
        while end > i + 1 && lines[end - 1].trim().is_empty() {
            end -= 1;
        }

        ranges.push((i + 1, end));
        i = end;
    }

    ranges
}
