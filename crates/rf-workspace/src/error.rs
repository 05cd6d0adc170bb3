//! Error types for the workspace layer
//!
//! Covers the three boundaries of a snapshot chain:
//! - Load (files or pending edits → checked snapshot)
//! - Edit (applying buffered text edits)
//! - Write (snapshot → files on disk)

use std::ops::Range;
use std::path::PathBuf;

use rf_source::ParseError;

/// Errors while applying buffered edits to a text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    /// Two edits touch the same bytes
    #[error("overlapping edits at bytes {first:?} and {second:?}")]
    Overlap {
        first: Range<usize>,
        second: Range<usize>,
    },

    /// Edit reaches past the end of the text
    #[error("edit range {range:?} out of bounds (text is {len} bytes)")]
    OutOfBounds { range: Range<usize>, len: usize },

    /// Edit boundary falls inside a UTF-8 sequence
    #[error("edit range {range:?} splits a character")]
    NotCharBoundary { range: Range<usize> },
}

/// An [`EditError`] tied to the file it happened in
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {source}", path.display())]
pub struct PendingEditError {
    pub path: PathBuf,
    #[source]
    pub source: EditError,
}

/// Failure of the load operation itself (not a diagnostic)
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// File read failed
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed
    #[error("walking {}: {source}", root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// File exceeds the configured size limit
    #[error("{}: file too large ({size} bytes, max {max})", path.display())]
    FileTooLarge { path: PathBuf, size: u64, max: u64 },

    /// Nothing to refactor
    #[error("no source files found in {}", .0.display())]
    NoSources(PathBuf),

    /// Pending edits could not be applied
    #[error("applying edits: {0}")]
    Edit(#[from] PendingEditError),

    /// Edits created a file no supported language claims
    #[error("{}: not a supported source file", .0.display())]
    UnsupportedFile(PathBuf),

    /// Parser failure (not a syntax error, which is a diagnostic)
    #[error("parsing {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

impl LoadError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors while persisting a snapshot
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// Pending edits could not be applied
    #[error("applying edits: {0}")]
    Edit(#[from] PendingEditError),

    /// Creating directories or the temporary file failed
    #[error("writing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Renaming the temporary file into place failed
    #[error("replacing {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
}

impl WriteError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors reading `rf.toml`
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File read failed
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid TOML or unknown keys
    #[error("parsing {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
