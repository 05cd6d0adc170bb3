//! Checked snapshots
//!
//! A [`Snapshot`] is one fully loaded and checked state of the workspace
//! plus the edits queued against it. Snapshots are never mutated in
//! place by a load: reloading produces the next snapshot from the pending
//! view, and the previous one stays valid as a fallback.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::io::Write as _;
use std::ops::Range;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use rf_source::{
    collect_items, literal_rows, syntax_diagnostics, ContentHash, Diagnostic, FileId, ItemArena,
    ItemId, ItemKind, ItemPath, Language, Location, ParseError, PendingReceiver,
};

use crate::check;
use crate::diff::unified_diff;
use crate::edit::{apply_edits, TextEdit};
use crate::error::{LoadError, PendingEditError, WriteError};
use crate::format;
use crate::loader::Loader;

/// Which text of a snapshot to look at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Text as it was when the snapshot was loaded
    Loaded,
    /// Loaded text with all queued edits applied
    Pending,
}

/// One parsed source file
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path relative to the workspace root
    pub path: PathBuf,
    pub language: Language,
    pub text: String,
    pub hash: ContentHash,
    pub tree: tree_sitter::Tree,
}

impl SourceFile {
    /// Parse `text` as `language`
    ///
    /// # Errors
    ///
    /// Returns error if the parser cannot be set up. Syntax errors are not
    /// errors here; they show up as ERROR nodes in the tree.
    pub fn parse(path: PathBuf, language: Language, text: String) -> Result<Self, ParseError> {
        let tree = language.parse(&text)?;
        let hash = ContentHash::compute(text.as_bytes());
        Ok(Self {
            path,
            language,
            text,
            hash,
            tree,
        })
    }
}

/// The unit of work commands operate on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Final component of the workspace root
    pub name: String,
    /// Every loaded source file
    pub files: Vec<FileId>,
}

/// State shared by every snapshot of one chain
#[derive(Debug)]
pub(crate) struct Origin {
    pub(crate) root: PathBuf,
    /// Each file as first read from disk
    pub(crate) files: IndexMap<PathBuf, Original>,
}

impl Origin {
    fn text(&self, path: &Path) -> &str {
        self.files.get(path).map_or("", |o| o.text.as_str())
    }

    fn hash(&self, path: &Path) -> ContentHash {
        self.files
            .get(path)
            .map_or_else(|| ContentHash::compute(b""), |o| o.hash)
    }
}

#[derive(Debug)]
pub(crate) struct Original {
    pub(crate) text: String,
    pub(crate) hash: ContentHash,
}

impl Original {
    pub(crate) fn new(text: String) -> Self {
        let hash = ContentHash::compute(text.as_bytes());
        Self { text, hash }
    }
}

/// A loaded, checked workspace state and the edits queued against it
#[derive(Debug, Clone)]
pub struct Snapshot {
    origin: Arc<Origin>,
    files: Vec<SourceFile>,
    items: ItemArena,
    diagnostics: Vec<Diagnostic>,
    edits: IndexMap<PathBuf, Vec<TextEdit>>,
    target: Target,
    generation: usize,
}

impl Snapshot {
    pub(crate) fn build(
        origin: Arc<Origin>,
        sources: Vec<(PathBuf, Language, String)>,
        generation: usize,
    ) -> Result<Self, LoadError> {
        if sources.is_empty() {
            return Err(LoadError::NoSources(origin.root.clone()));
        }

        let mut files = Vec::with_capacity(sources.len());
        let mut items = ItemArena::new();
        let mut diagnostics = Vec::new();
        let mut receivers = Vec::new();

        for (index, (path, language, text)) in sources.into_iter().enumerate() {
            let file = SourceFile::parse(path.clone(), language, text)
                .map_err(|source| LoadError::Parse { path, source })?;
            let id = FileId(u32::try_from(index).unwrap_or(u32::MAX));
            diagnostics.extend(syntax_diagnostics(&file.tree, &file.text, &file.path));
            receivers.extend(collect_items(&file.tree, &file.text, id, language, &mut items));
            files.push(file);
        }

        link_receivers(&files, &mut items, &receivers);
        diagnostics.extend(check::duplicate_declarations(&files, &items));

        let name = origin
            .root
            .file_name()
            .map_or_else(|| ".".to_string(), |n| n.to_string_lossy().into_owned());
        let target = Target {
            name,
            files: (0..files.len())
                .map(|i| FileId(u32::try_from(i).unwrap_or(u32::MAX)))
                .collect(),
        };

        let snapshot = Self {
            origin,
            files,
            items,
            diagnostics,
            edits: IndexMap::new(),
            target,
            generation,
        };
        tracing::debug!(
            generation,
            files = snapshot.files.len(),
            items = snapshot.items.len(),
            errors = snapshot.error_count(),
            fingerprint = %snapshot.fingerprint().short(),
            "built snapshot"
        );
        Ok(snapshot)
    }

    /// Workspace root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.origin.root
    }

    /// Number of loads since the workspace was first read
    #[inline]
    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Current unit of work
    #[inline]
    #[must_use]
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Loaded source files, indexed by [`FileId`]
    #[inline]
    #[must_use]
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Get file by id
    #[inline]
    #[must_use]
    pub fn file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.index())
    }

    /// Find a loaded file by its workspace-relative path
    #[must_use]
    pub fn file_by_path(&self, path: &Path) -> Option<(FileId, &SourceFile)> {
        self.files
            .iter()
            .position(|f| f.path == path)
            .map(|i| (FileId(u32::try_from(i).unwrap_or(u32::MAX)), &self.files[i]))
    }

    /// Declarations of the loaded text
    #[inline]
    #[must_use]
    pub fn items(&self) -> &ItemArena {
        &self.items
    }

    /// Declarations named by `path`
    #[must_use]
    pub fn resolve(&self, path: &ItemPath) -> Vec<ItemId> {
        self.items.resolve(path)
    }

    /// Loaded text covered by `range` of the item's file
    #[must_use]
    pub fn slice(&self, id: ItemId, range: Range<usize>) -> &str {
        self.items
            .get(id)
            .and_then(|item| self.file(item.file))
            .and_then(|file| file.text.get(range))
            .unwrap_or("")
    }

    /// Location of an item's name
    #[must_use]
    pub fn location(&self, id: ItemId) -> Option<Location> {
        let item = self.items.get(id)?;
        let file = self.file(item.file)?;
        Some(Location::from_offset(
            &file.path,
            &file.text,
            item.name_span.start,
        ))
    }

    // -- Diagnostics --

    /// Number of diagnostics recorded against this snapshot
    #[inline]
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    /// Diagnostics recorded against this snapshot
    #[inline]
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Record a diagnostic
    pub fn report(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(%diagnostic, "reported");
        self.diagnostics.push(diagnostic);
    }

    /// Record a diagnostic without a location
    pub fn error(&mut self, message: impl Into<String>) {
        self.report(Diagnostic::general(message));
    }

    /// Record a diagnostic at an item's name
    pub fn error_at(&mut self, id: ItemId, message: impl Into<String>) {
        match self.location(id) {
            Some(location) => self.report(Diagnostic::at(location, message)),
            None => self.error(message),
        }
    }

    // -- Edits --

    /// Queue an edit against the loaded text of `path`
    pub fn edit(&mut self, path: impl Into<PathBuf>, edit: TextEdit) {
        self.edits.entry(path.into()).or_default().push(edit);
    }

    /// Queue a replacement
    pub fn replace(&mut self, path: impl Into<PathBuf>, range: Range<usize>, text: impl Into<String>) {
        self.edit(path, TextEdit::replace(range, text));
    }

    /// Queue an insertion
    pub fn insert(&mut self, path: impl Into<PathBuf>, offset: usize, text: impl Into<String>) {
        self.edit(path, TextEdit::insert(offset, text));
    }

    /// Queue a deletion
    pub fn delete(&mut self, path: impl Into<PathBuf>, range: Range<usize>) {
        self.edit(path, TextEdit::delete(range));
    }

    /// Queue text at the end of `path`
    ///
    /// A path that is not loaded names a new file. It must be relative,
    /// stay inside the workspace and not exist on disk yet; otherwise a
    /// diagnostic is recorded and nothing is queued.
    pub fn append(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        let path = path.into();
        let end = match self.file_by_path(&path) {
            Some((_, file)) => file.text.len(),
            None => {
                if let Some(problem) = self.new_file_problem(&path) {
                    self.error(format!("{}: {problem}", path.display()));
                    return;
                }
                0
            }
        };
        self.edit(path, TextEdit::insert(end, text));
    }

    fn new_file_problem(&self, path: &Path) -> Option<&'static str> {
        let inside = path.components().next().is_some()
            && path.components().all(|c| matches!(c, Component::Normal(_)));
        if !inside {
            return Some("file path must be relative to the workspace root");
        }
        if !self.edits.contains_key(path) && self.origin.root.join(path).exists() {
            return Some("file exists but is not part of the workspace");
        }
        None
    }

    /// Whether any edit is queued
    #[inline]
    #[must_use]
    pub fn has_edits(&self) -> bool {
        self.edits.values().any(|e| !e.is_empty())
    }

    /// Paths with queued edits, in the order they were first edited
    pub fn edited_paths(&self) -> impl Iterator<Item = &Path> {
        self.edits.keys().map(PathBuf::as_path)
    }

    /// Text of `path` in the given view
    ///
    /// Returns `None` for a path that is neither loaded nor edited.
    ///
    /// # Errors
    ///
    /// Returns error if the queued edits for `path` conflict.
    pub fn text(&self, path: &Path, view: View) -> Result<Option<Cow<'_, str>>, PendingEditError> {
        let loaded = self.file_by_path(path).map(|(_, f)| f.text.as_str());
        let edits = match view {
            View::Loaded => None,
            View::Pending => self.edits.get(path).filter(|e| !e.is_empty()),
        };
        match (loaded, edits) {
            (None, None) => Ok(None),
            (Some(text), None) => Ok(Some(Cow::Borrowed(text))),
            (loaded, Some(edits)) => apply_edits(loaded.unwrap_or(""), edits)
                .map(|t| Some(Cow::Owned(t)))
                .map_err(|source| PendingEditError {
                    path: path.to_path_buf(),
                    source,
                }),
        }
    }

    /// Rewrite every edited file into canonical layout
    ///
    /// The queued edits of each file collapse into one whole-file
    /// replacement; a file whose normalized text equals its loaded text
    /// ends up with no edits.
    ///
    /// # Errors
    ///
    /// Returns error if the queued edits of a file conflict.
    pub fn normalize(&mut self) -> Result<(), PendingEditError> {
        let paths: Vec<PathBuf> = self.edits.keys().cloned().collect();
        for path in paths {
            let normalized = match self.text(&path, View::Pending)? {
                Some(pending) => normalize_source(&path, &pending),
                None => continue,
            };
            let loaded_len = self.file_by_path(&path).map_or(0, |(_, f)| f.text.len());
            let unchanged = self
                .file_by_path(&path)
                .is_some_and(|(_, f)| f.text == normalized);

            let edits = self.edits.entry(path).or_default();
            edits.clear();
            if !unchanged {
                edits.push(TextEdit::replace(0..loaded_len, normalized));
            }
        }
        self.edits.retain(|_, e| !e.is_empty());
        Ok(())
    }

    /// All paths this snapshot knows about, in sorted order
    fn known_paths(&self) -> BTreeSet<&Path> {
        self.origin
            .files
            .keys()
            .map(PathBuf::as_path)
            .chain(self.files.iter().map(|f| f.path.as_path()))
            .chain(self.edits.keys().map(PathBuf::as_path))
            .collect()
    }

    /// Files whose text in `view` differs from what was first read from disk
    fn changed_files(&self, view: View) -> Result<Vec<(PathBuf, String)>, PendingEditError> {
        let mut out = Vec::new();
        for path in self.known_paths() {
            let Some(current) = self.text(path, view)? else {
                continue;
            };
            let hash = match (&current, self.file_by_path(path)) {
                (Cow::Borrowed(_), Some((_, file))) => file.hash,
                _ => ContentHash::compute(current.as_bytes()),
            };
            if hash != self.origin.hash(path) {
                out.push((path.to_path_buf(), current.into_owned()));
            }
        }
        Ok(out)
    }

    /// Unified diff from the on-disk originals to `view`
    ///
    /// # Errors
    ///
    /// Returns error if queued edits conflict (pending view only).
    pub fn diff(&self, view: View) -> Result<String, PendingEditError> {
        let mut out = String::new();
        for (path, current) in self.changed_files(view)? {
            out.push_str(&unified_diff(&path, self.origin.text(&path), &current));
        }
        Ok(out)
    }

    /// Write every changed file of `view` back to disk
    ///
    /// Each file is written to a temporary sibling and renamed into place.
    /// Returns the workspace-relative paths written.
    ///
    /// # Errors
    ///
    /// Returns error if edits conflict or a file cannot be written.
    pub fn write(&self, view: View) -> Result<Vec<PathBuf>, WriteError> {
        let mut written = Vec::new();
        for (path, text) in self.changed_files(view)? {
            let full = self.origin.root.join(&path);
            write_atomic(&full, &text)?;
            tracing::info!(path = %path.display(), "wrote");
            written.push(path);
        }
        Ok(written)
    }

    /// Load the pending view as the next snapshot
    ///
    /// # Errors
    ///
    /// See [`Loader::load`].
    #[inline]
    pub fn reload(&self) -> Result<Snapshot, LoadError> {
        self.load()
    }

    /// Hash over the loaded text of every file and its path
    #[must_use]
    pub fn fingerprint(&self) -> ContentHash {
        let per_file: Vec<ContentHash> = self
            .files
            .iter()
            .map(|f| {
                let mut bytes = f.path.to_string_lossy().into_owned().into_bytes();
                bytes.push(0);
                bytes.extend_from_slice(f.hash.as_bytes());
                ContentHash::compute(&bytes)
            })
            .collect();
        ContentHash::combine(&per_file)
    }
}

impl Loader for Snapshot {
    /// Load and check the pending view as the next snapshot
    fn load(&self) -> Result<Snapshot, LoadError> {
        let mut sources = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let text = self
                .text(&file.path, View::Pending)?
                .map_or_else(String::new, Cow::into_owned);
            sources.push((file.path.clone(), file.language, text));
        }
        for path in self.edits.keys() {
            if self.file_by_path(path).is_some() {
                continue;
            }
            let language =
                Language::from_path(path).ok_or_else(|| LoadError::UnsupportedFile(path.clone()))?;
            let text = self
                .text(path, View::Pending)?
                .map_or_else(String::new, Cow::into_owned);
            sources.push((path.clone(), language, text));
        }
        Snapshot::build(Arc::clone(&self.origin), sources, self.generation + 1)
    }
}

/// Attach each Go method to the named type it receives, when that type is
/// declared in the same package directory
fn link_receivers(files: &[SourceFile], items: &mut ItemArena, receivers: &[PendingReceiver]) {
    let dir_of = |items: &ItemArena, id: ItemId| {
        items
            .get(id)
            .and_then(|item| files.get(item.file.index()))
            .and_then(|f| f.path.parent())
            .map(Path::to_path_buf)
    };

    let arena: &ItemArena = items;
    let links: Vec<(ItemId, ItemId)> = receivers
        .iter()
        .filter_map(|pending| {
            let dir = dir_of(arena, pending.method);
            arena
                .top_level()
                .find(|&ty| {
                    arena[ty].kind == ItemKind::Type
                        && arena[ty].name == pending.type_name
                        && dir_of(arena, ty) == dir
                })
                .map(|ty| (pending.method, ty))
        })
        .collect();

    for (method, ty) in links {
        items.set_outer(method, Some(ty));
    }
}

/// Normalize `text`, leaving the rows of multi-line string literals alone
///
/// Text that cannot be parsed is left as it is.
fn normalize_source(path: &Path, text: &str) -> String {
    let Some(language) = Language::from_path(path) else {
        return text.to_string();
    };
    match language.parse(text) {
        Ok(tree) => format::normalize(text, &literal_rows(&tree, language)),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "left unnormalized");
            text.to_string()
        }
    }
}

fn write_atomic(path: &Path, text: &str) -> Result<(), WriteError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| WriteError::io_error(dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| WriteError::io_error(path, e))?;
    tmp.write_all(text.as_bytes())
        .map_err(|e| WriteError::io_error(path, e))?;
    tmp.persist(path).map_err(|source| WriteError::Persist {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
