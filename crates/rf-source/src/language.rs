//! Source languages
//!
//! Maps file extensions to tree-sitter grammars.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Supported source languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rust,
    Go,
}

impl Language {
    /// All supported languages
    pub const ALL: [Language; 2] = [Language::Rust, Language::Go];

    /// Get file extensions for this language
    #[inline]
    #[must_use]
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Rust => &["rs"],
            Language::Go => &["go"],
        }
    }

    /// Detect language from file extension
    #[inline]
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.') {
            "rs" => Some(Language::Rust),
            "go" => Some(Language::Go),
            _ => None,
        }
    }

    /// Detect language from a file path
    #[inline]
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Get the tree-sitter grammar
    #[inline]
    #[must_use]
    pub fn grammar(&self) -> tree_sitter::Language {
        match self {
            Language::Rust => tree_sitter_rust::LANGUAGE.into(),
            Language::Go => tree_sitter_go::LANGUAGE.into(),
        }
    }

    /// Parse source text into a syntax tree
    ///
    /// Syntax errors do not fail the parse; they show up as ERROR and MISSING
    /// nodes in the returned tree.
    ///
    /// # Errors
    /// Returns error if the grammar cannot be loaded or the parser gives up
    pub fn parse(&self, source: &str) -> Result<tree_sitter::Tree, ParseError> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&self.grammar())
            .map_err(|e| ParseError::ParserInit(e.to_string()))?;

        parser.parse(source, None).ok_or(ParseError::ParseFailed(*self))
    }

    /// Node kinds that count as identifiers when matching references
    #[inline]
    #[must_use]
    pub fn identifier_kinds(&self) -> &'static [&'static str] {
        match self {
            Language::Rust | Language::Go => &["identifier", "type_identifier", "field_identifier"],
        }
    }

    /// Node kinds of string literals, whose text may span lines
    #[inline]
    #[must_use]
    pub fn literal_kinds(&self) -> &'static [&'static str] {
        match self {
            Language::Rust => &["string_literal", "raw_string_literal"],
            Language::Go => &["interpreted_string_literal", "raw_string_literal"],
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Language::Rust => "Rust",
            Language::Go => "Go",
        };
        write!(f, "{name}")
    }
}

/// Parse error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("parser initialization failed: {0}")]
    ParserInit(String),

    #[error("{0} parser gave up")]
    ParseFailed(Language),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_from_extension() {
        assert_eq!(Language::from_extension("rs"), Some(Language::Rust));
        assert_eq!(Language::from_extension(".go"), Some(Language::Go));
        assert_eq!(Language::from_extension("py"), None);
    }

    #[test]
    fn language_from_path() {
        assert_eq!(Language::from_path(Path::new("src/lib.rs")), Some(Language::Rust));
        assert_eq!(Language::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn parse_reports_errors_in_tree() {
        let tree = Language::Rust.parse("fn broken( {").unwrap();
        assert!(tree.root_node().has_error());

        let tree = Language::Go.parse("package p\n\nfunc f() {}\n").unwrap();
        assert!(!tree.root_node().has_error());
    }
}
