//! Language registry: extension mapping and per-language metadata.
//!
//! Detection is by file extension only; content sniffing is deliberately
//! not used. Unknown extensions yield [`Language::Unknown`], which the
//! ingest stage filters out.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Closed vocabulary of detected languages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// JavaScript (.js, .jsx, .mjs)
    JavaScript,
    /// TypeScript (.ts, .tsx)
    TypeScript,
    /// Python (.py)
    Python,
    /// Java (.java)
    Java,
    /// C++ (.cpp, .cc, .cxx, .hpp)
    Cpp,
    /// C (.c, .h)
    C,
    /// Go (.go)
    Go,
    /// Rust (.rs)
    Rust,
    /// Ruby (.rb)
    Ruby,
    /// PHP (.php)
    Php,
    /// C# (.cs)
    CSharp,
    /// Swift (.swift)
    Swift,
    /// Kotlin (.kt, .kts)
    Kotlin,
    /// Scala (.scala)
    Scala,
    /// HTML (.html, .htm)
    Html,
    /// CSS (.css)
    Css,
    /// SQL (.sql)
    Sql,
    /// Undetected extension; filtered out upstream
    Unknown,
}

/// Comment syntax shared by a family of languages.
#[derive(Debug, Clone, Copy)]
pub struct CommentStyle {
    /// Prefixes that start a comment running to end of line
    pub line_prefixes: &'static [&'static str],

    /// Open/close delimiter pairs for block comments
    pub block_delimiters: &'static [(&'static str, &'static str)],
}

const C_FAMILY_COMMENTS: CommentStyle = CommentStyle {
    line_prefixes: &["//"],
    block_delimiters: &[("/*", "*/")],
};

const HASH_COMMENTS: CommentStyle = CommentStyle {
    line_prefixes: &["#"],
    block_delimiters: &[],
};

const PHP_COMMENTS: CommentStyle = CommentStyle {
    line_prefixes: &["//", "#"],
    block_delimiters: &[("/*", "*/")],
};

const SQL_COMMENTS: CommentStyle = CommentStyle {
    line_prefixes: &["--"],
    block_delimiters: &[("/*", "*/")],
};

const HTML_COMMENTS: CommentStyle = CommentStyle {
    line_prefixes: &[],
    block_delimiters: &[("<!--", "-->")],
};

const CSS_COMMENTS: CommentStyle = CommentStyle {
    line_prefixes: &[],
    block_delimiters: &[("/*", "*/")],
};

const NO_COMMENTS: CommentStyle = CommentStyle {
    line_prefixes: &[],
    block_delimiters: &[],
};

/// Metadata describing one registered language.
#[derive(Debug, Clone, Copy)]
pub struct LanguageInfo {
    /// The language tag
    pub language: Language,

    /// Supported file extensions (without leading dots)
    pub extensions: &'static [&'static str],

    /// Comment syntax for the normalisation pass
    pub comments: CommentStyle,

    /// Declaration/flow keywords.
    ///
    /// Kept for future token filtering; the tokenizer does not consult
    /// these today.
    pub keywords: &'static [&'static str],
}

const REGISTERED_LANGUAGES: &[LanguageInfo] = &[
    LanguageInfo {
        language: Language::JavaScript,
        extensions: &["js", "jsx", "mjs"],
        comments: C_FAMILY_COMMENTS,
        keywords: &["function", "var", "let", "const", "class", "async", "await", "return"],
    },
    LanguageInfo {
        language: Language::TypeScript,
        extensions: &["ts", "tsx"],
        comments: C_FAMILY_COMMENTS,
        keywords: &["function", "let", "const", "class", "interface", "type", "async", "return"],
    },
    LanguageInfo {
        language: Language::Python,
        extensions: &["py"],
        comments: HASH_COMMENTS,
        keywords: &["def", "class", "return", "lambda", "async", "await", "import"],
    },
    LanguageInfo {
        language: Language::Java,
        extensions: &["java"],
        comments: C_FAMILY_COMMENTS,
        keywords: &["class", "interface", "public", "private", "static", "void", "return"],
    },
    LanguageInfo {
        language: Language::Cpp,
        extensions: &["cpp", "cc", "cxx", "hpp"],
        comments: C_FAMILY_COMMENTS,
        keywords: &["class", "struct", "template", "namespace", "void", "return"],
    },
    LanguageInfo {
        language: Language::C,
        extensions: &["c", "h"],
        comments: C_FAMILY_COMMENTS,
        keywords: &["struct", "typedef", "static", "void", "return"],
    },
    LanguageInfo {
        language: Language::Go,
        extensions: &["go"],
        comments: C_FAMILY_COMMENTS,
        keywords: &["func", "type", "struct", "interface", "defer", "return"],
    },
    LanguageInfo {
        language: Language::Rust,
        extensions: &["rs"],
        comments: C_FAMILY_COMMENTS,
        keywords: &["fn", "struct", "enum", "impl", "trait", "let", "mut", "return"],
    },
    LanguageInfo {
        language: Language::Ruby,
        extensions: &["rb"],
        comments: HASH_COMMENTS,
        keywords: &["def", "class", "module", "end", "return", "lambda"],
    },
    LanguageInfo {
        language: Language::Php,
        extensions: &["php"],
        comments: PHP_COMMENTS,
        keywords: &["function", "class", "public", "private", "static", "return"],
    },
    LanguageInfo {
        language: Language::CSharp,
        extensions: &["cs"],
        comments: C_FAMILY_COMMENTS,
        keywords: &["class", "interface", "public", "private", "static", "void", "return"],
    },
    LanguageInfo {
        language: Language::Swift,
        extensions: &["swift"],
        comments: C_FAMILY_COMMENTS,
        keywords: &["func", "class", "struct", "enum", "let", "var", "return"],
    },
    LanguageInfo {
        language: Language::Kotlin,
        extensions: &["kt", "kts"],
        comments: C_FAMILY_COMMENTS,
        keywords: &["fun", "class", "object", "val", "var", "return"],
    },
    LanguageInfo {
        language: Language::Scala,
        extensions: &["scala"],
        comments: C_FAMILY_COMMENTS,
        keywords: &["def", "class", "object", "trait", "val", "var", "return"],
    },
    LanguageInfo {
        language: Language::Html,
        extensions: &["html", "htm"],
        comments: HTML_COMMENTS,
        keywords: &[],
    },
    LanguageInfo {
        language: Language::Css,
        extensions: &["css"],
        comments: CSS_COMMENTS,
        keywords: &[],
    },
    LanguageInfo {
        language: Language::Sql,
        extensions: &["sql"],
        comments: SQL_COMMENTS,
        keywords: &["select", "insert", "update", "delete", "create", "table", "where"],
    },
];

/// Return the languages that are compiled into this build.
pub fn registered_languages() -> &'static [LanguageInfo] {
    REGISTERED_LANGUAGES
}

/// Detect the language for a file path by extension.
pub fn language_for_path(path: &Path) -> Language {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return Language::Unknown;
    };
    language_for_extension(ext)
}

/// Detect the language for an extension (with or without leading dot).
pub fn language_for_extension(ext: &str) -> Language {
    let target = ext.trim_start_matches('.').to_ascii_lowercase();
    REGISTERED_LANGUAGES
        .iter()
        .find(|info| info.extensions.iter().any(|e| *e == target))
        .map_or(Language::Unknown, |info| info.language)
}

/// Look up registry metadata for a language.
///
/// Returns a silent no-comment style for [`Language::Unknown`] so callers
/// never have to special-case it.
pub fn info_for(language: Language) -> LanguageInfo {
    REGISTERED_LANGUAGES
        .iter()
        .copied()
        .find(|info| info.language == language)
        .unwrap_or(LanguageInfo {
            language: Language::Unknown,
            extensions: &[],
            comments: NO_COMMENTS,
            keywords: &[],
        })
}

impl Language {
    /// Stable lowercase name matching the serde tag.
    pub fn name(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::CSharp => "csharp",
            Language::Swift => "swift",
            Language::Kotlin => "kotlin",
            Language::Scala => "scala",
            Language::Html => "html",
            Language::Css => "css",
            Language::Sql => "sql",
            Language::Unknown => "unknown",
        }
    }

    /// Whether the language uses indentation rather than braces to close
    /// declaration bodies.
    pub fn is_indent_delimited(&self) -> bool {
        matches!(self, Language::Python)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_detection() {
        assert_eq!(
            language_for_path(Path::new("src/main.py")),
            Language::Python
        );
        assert_eq!(
            language_for_path(Path::new("src/app.jsx")),
            Language::JavaScript
        );
        assert_eq!(
            language_for_path(Path::new("src/lib.rs")),
            Language::Rust
        );
        assert_eq!(
            language_for_path(Path::new("schema.SQL")),
            Language::Sql
        );
        assert_eq!(language_for_path(Path::new("README")), Language::Unknown);
        assert_eq!(
            language_for_path(Path::new("notes.txt")),
            Language::Unknown
        );
    }

    #[test]
    fn test_extension_with_dot() {
        assert_eq!(language_for_extension(".go"), Language::Go);
        assert_eq!(language_for_extension("kt"), Language::Kotlin);
    }

    #[test]
    fn registry_covers_seventeen_languages() {
        assert_eq!(registered_languages().len(), 17);
    }

    #[test]
    fn unknown_language_has_silent_comment_style() {
        let info = info_for(Language::Unknown);
        assert!(info.comments.line_prefixes.is_empty());
        assert!(info.comments.block_delimiters.is_empty());
    }

    #[test]
    fn serde_tag_matches_name() {
        for info in registered_languages() {
            let json = serde_json::to_string(&info.language).unwrap();
            assert_eq!(json, format!("\"{}\"", info.language.name()));
        }
    }
}
