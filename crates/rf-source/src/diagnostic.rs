//! Diagnostics recorded against a snapshot

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

/// Position of a diagnostic in a source file (1-based line and column)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub path: PathBuf,
    pub line: usize,
    pub column: usize,
}

impl Location {
    /// Location of a byte offset in `text`
    #[must_use]
    pub fn from_offset(path: &Path, text: &str, offset: usize) -> Self {
        let offset = offset.min(text.len());
        let before = text.get(..offset).unwrap_or(text);
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        Self {
            path: path.to_path_buf(),
            line,
            column: offset - line_start + 1,
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path.display(), self.line, self.column)
    }
}

/// A semantic or syntax error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Where the problem is, when it is tied to source text
    pub location: Option<Location>,
    pub message: String,
}

impl Diagnostic {
    /// Diagnostic at a source location
    #[inline]
    #[must_use]
    pub fn at(location: Location, message: impl Into<String>) -> Self {
        Self {
            location: Some(location),
            message: message.into(),
        }
    }

    /// Diagnostic without a source location
    #[inline]
    #[must_use]
    pub fn general(message: impl Into<String>) -> Self {
        Self {
            location: None,
            message: message.into(),
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{location}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_from_offset() {
        let text = "fn a() {}\nfn b() {}\n";
        let loc = Location::from_offset(Path::new("lib.rs"), text, 13);
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 4);
        assert_eq!(loc.to_string(), "lib.rs:2:4");
    }

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic::general("rm: cannot find Foo");
        assert_eq!(d.to_string(), "rm: cannot find Foo");

        let d = Diagnostic::at(
            Location::from_offset(Path::new("a.go"), "x", 0),
            "syntax error",
        );
        assert_eq!(d.to_string(), "a.go:1:1: syntax error");
    }
}
