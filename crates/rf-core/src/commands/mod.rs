//! Built-in script commands
//!
//! | command  | arguments            | effect |
//! |----------|----------------------|--------|
//! | `debug`  | `key[=value]...`     | set session debug options |
//! | `add`    | `PATH TEXT`          | insert text after a declaration or at the end of a file |
//! | `rm`     | `PATH...`            | remove declarations |
//! | `mv`     | `PATH NAME`          | rename a declaration and its references |
//! | `mv`     | `PATH FILE`          | move top-level declarations to another file |
//! | `inline` | `PATH...`            | replace uses of a constant with its value and remove it |
//!
//! Handlers report every failure as a diagnostic on the snapshot.

pub mod add;
pub mod debug;
pub mod inline;
pub mod mv;
pub mod rm;

use std::collections::BTreeMap;
use std::ops::Range;
use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use rf_source::{references, FileId, ItemId, ItemKind, ItemPath, Language, Occurrence};
use rf_workspace::Snapshot;

const IDENT_PATTERN: &str = r"^[\p{L}_][\p{L}\p{Nd}_]*$";

static IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(IDENT_PATTERN).expect("identifier pattern must compile"));

/// Whether `name` is a valid identifier in both supported languages
pub(crate) fn is_ident(name: &str) -> bool {
    IDENT.is_match(name)
}

/// Whether a command argument names a source file rather than a declaration
pub(crate) fn is_file_arg(arg: &str) -> bool {
    Language::from_path(Path::new(arg)).is_some()
}

/// Workspace-relative path named by a file argument, without `./` parts
///
/// Absolute paths and `..` are reported and rejected.
pub(crate) fn file_arg(snapshot: &mut Snapshot, arg: &str) -> Option<PathBuf> {
    let mut path = PathBuf::new();
    for component in Path::new(arg).components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => path.push(part),
            _ => {
                snapshot.error(format!("{arg}: file path must be relative to the workspace root"));
                return None;
            }
        }
    }
    Some(path)
}

/// Parse a declaration path, reporting failures
pub(crate) fn parse_path(snapshot: &mut Snapshot, arg: &str) -> Option<ItemPath> {
    match arg.parse::<ItemPath>() {
        Ok(path) => Some(path),
        Err(err) => {
            snapshot.error(format!("invalid path {arg:?}: {err}"));
            None
        }
    }
}

/// Resolve a declaration path, reporting when nothing matches
pub(crate) fn resolve(snapshot: &mut Snapshot, path: &ItemPath) -> Vec<ItemId> {
    let found = snapshot.resolve(path);
    if found.is_empty() {
        snapshot.error(format!("cannot find {path}"));
    }
    found
}

/// First match that is an actual declaration, preferring it over `impl` blocks
pub(crate) fn primary(snapshot: &Snapshot, found: &[ItemId]) -> Option<ItemId> {
    found
        .iter()
        .copied()
        .find(|&id| snapshot.items()[id].kind != ItemKind::Impl)
        .or_else(|| found.first().copied())
}

/// Workspace-relative path of the file declaring `id`
pub(crate) fn file_path(snapshot: &Snapshot, id: ItemId) -> Option<PathBuf> {
    let item = snapshot.items().get(id)?;
    snapshot.file(item.file).map(|f| f.path.clone())
}

/// Extend `range` to whole lines when nothing else shares those lines
///
/// The trailing newline is included so removal leaves no empty line.
pub(crate) fn whole_lines(text: &str, range: Range<usize>) -> Range<usize> {
    let line_start = text[..range.start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[range.end..]
        .find('\n')
        .map_or(text.len(), |i| range.end + i + 1);

    let before_blank = text[line_start..range.start].trim().is_empty();
    let after_blank = text[range.end..line_end].trim().is_empty();
    match (before_blank, after_blank) {
        (true, true) => line_start..line_end,
        (true, false) => line_start..range.end,
        (false, _) => range,
    }
}

/// Leading whitespace of the line containing `offset`
pub(crate) fn indent_at(text: &str, offset: usize) -> &str {
    let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line = &text[line_start..];
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..width]
}

/// Strip one pair of surrounding backticks
pub(crate) fn unquote(text: &str) -> &str {
    text.strip_prefix('`')
        .and_then(|t| t.strip_suffix('`'))
        .unwrap_or(text)
}

/// Drop ranges that lie inside another range of the same file
pub(crate) fn outermost(mut ranges: Vec<Range<usize>>) -> Vec<Range<usize>> {
    ranges.sort_by_key(|r| (r.start, std::cmp::Reverse(r.end)));
    let mut out: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match out.last() {
            Some(last) if range.end <= last.end => {}
            _ => out.push(range),
        }
    }
    out
}

/// Files in which references to `id` are looked for
///
/// Rust items are visible crate-wide; Go items only inside their package
/// directory.
pub(crate) fn scope_files(snapshot: &Snapshot, id: ItemId) -> Vec<FileId> {
    let Some(home) = snapshot.file(snapshot.items()[id].file) else {
        return Vec::new();
    };
    let home_dir = home.path.parent();
    snapshot
        .target()
        .files
        .iter()
        .copied()
        .filter(|&f| {
            snapshot.file(f).is_some_and(|file| {
                file.language == home.language
                    && (home.language == Language::Rust || file.path.parent() == home_dir)
            })
        })
        .collect()
}

/// Identifier occurrences of `name` in `files`, grouped by file path
///
/// `keep` decides per occurrence whether it is included.
pub(crate) fn occurrences(
    snapshot: &Snapshot,
    files: &[FileId],
    name: &str,
    mut keep: impl FnMut(&Occurrence) -> bool,
) -> BTreeMap<PathBuf, Vec<Range<usize>>> {
    let mut out: BTreeMap<PathBuf, Vec<Range<usize>>> = BTreeMap::new();
    for &id in files {
        let Some(file) = snapshot.file(id) else {
            continue;
        };
        for reference in references(&file.tree, &file.text, file.language, name) {
            if keep(&reference.occurrence) {
                out.entry(file.path.clone()).or_default().push(reference.range);
            }
        }
    }
    out
}
