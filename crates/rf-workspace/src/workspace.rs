//! Source discovery and the first load

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use rf_source::Language;
use walkdir::WalkDir;

use crate::config::WorkspaceConfig;
use crate::error::{ConfigError, LoadError};
use crate::loader::Loader;
use crate::snapshot::{Origin, Original, Snapshot};

/// A directory tree of source files
///
/// Opening a workspace performs no I/O; files are read on [`Loader::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
    config: WorkspaceConfig,
}

impl Workspace {
    /// Workspace at `root` with default configuration
    #[must_use]
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self::with_config(root, WorkspaceConfig::default())
    }

    /// Workspace at `root` with explicit configuration
    #[must_use]
    pub fn with_config(root: impl Into<PathBuf>, config: WorkspaceConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Workspace at `root` configured from its `rf.toml`
    ///
    /// # Errors
    ///
    /// Returns error if `rf.toml` exists but is invalid.
    pub fn discover(root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let root = root.into();
        let config = WorkspaceConfig::discover(&root)?;
        Ok(Self { root, config })
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// Source files under the root, relative to it, in path order
    ///
    /// # Errors
    ///
    /// Returns error if traversal fails or a file exceeds the size limit.
    pub fn source_files(&self) -> Result<Vec<(PathBuf, Language)>, LoadError> {
        let mut out = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || !self.config.is_excluded(&e.file_name().to_string_lossy())
            });

        for entry in walker {
            let entry = entry.map_err(|source| LoadError::Walk {
                root: self.root.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(language) = Language::from_path(entry.path()) else {
                continue;
            };
            if !self.config.includes(language) {
                continue;
            }

            let size = entry
                .metadata()
                .map_err(|source| LoadError::Walk {
                    root: self.root.clone(),
                    source,
                })?
                .len();
            if size > self.config.max_file_size {
                return Err(LoadError::FileTooLarge {
                    path: entry.path().to_path_buf(),
                    size,
                    max: self.config.max_file_size,
                });
            }

            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(entry.path())
                .to_path_buf();
            out.push((relative, language));
        }
        Ok(out)
    }
}

impl Loader for Workspace {
    fn load(&self) -> Result<Snapshot, LoadError> {
        let files = self.source_files()?;
        tracing::info!(root = %self.root.display(), files = files.len(), "loading workspace");

        let mut originals = IndexMap::with_capacity(files.len());
        let mut sources = Vec::with_capacity(files.len());
        for (path, language) in files {
            let full = self.root.join(&path);
            let text =
                std::fs::read_to_string(&full).map_err(|e| LoadError::io_error(&full, e))?;
            originals.insert(path.clone(), Original::new(text.clone()));
            sources.push((path, language, text));
        }

        let origin = Arc::new(Origin {
            root: self.root.clone(),
            files: originals,
        });
        Snapshot::build(origin, sources, 0)
    }
}
