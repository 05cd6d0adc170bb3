//! `mv PATH NEWNAME` and `mv PATH FILE`

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use rf_source::{ItemId, ItemPath, Language, Occurrence};
use rf_workspace::Snapshot;

use super::{
    file_arg, file_path, is_file_arg, is_ident, occurrences, parse_path, primary, resolve,
    scope_files, whole_lines,
};
use crate::registry::CommandContext;

pub fn run(ctx: &mut CommandContext<'_>, args: &str) {
    let snapshot = &mut *ctx.snapshot;
    let fields: Vec<&str> = args.split_whitespace().collect();
    let [from, to] = fields[..] else {
        snapshot.error("usage: mv old new");
        return;
    };

    let Some(path) = parse_path(snapshot, from) else {
        return;
    };
    let found = resolve(snapshot, &path);
    if found.is_empty() {
        return;
    }

    if is_file_arg(to) {
        if let Some(dest) = file_arg(snapshot, to) {
            move_to_file(snapshot, &path, &found, &dest);
        }
        return;
    }
    if is_ident(to) {
        rename(snapshot, &path, &found, to);
        return;
    }
    // `mv T.old T.new` renames within the same owner
    match to.parse::<ItemPath>() {
        Ok(dest) if dest.parent() == path.parent() && dest.last().is_some_and(is_ident) => {
            let name = dest.last().unwrap_or_default().to_string();
            rename(snapshot, &path, &found, &name);
        }
        _ => snapshot.error(format!("cannot move {path} to {to}")),
    }
}

/// Rename the declarations in `found` and every reference to them
fn rename(snapshot: &mut Snapshot, path: &ItemPath, found: &[ItemId], new_name: &str) {
    let Some(old_name) = path.last().map(str::to_string) else {
        return;
    };
    if old_name == new_name {
        return;
    }
    let Some(decl) = primary(snapshot, found) else {
        return;
    };

    let new_path = path
        .parent()
        .map_or_else(|| ItemPath::single(new_name), |p| p.child(new_name));
    if let Some(other) = snapshot
        .resolve(&new_path)
        .into_iter()
        .find(|&other| same_scope(snapshot, decl, other))
    {
        let at = snapshot
            .location(other)
            .map_or_else(String::new, |loc| format!(" at {loc}"));
        snapshot.error_at(decl, format!("cannot rename {path}: {new_name} already declared{at}"));
        return;
    }

    let mut edits: BTreeMap<PathBuf, BTreeSet<(usize, usize)>> = BTreeMap::new();
    for &id in found {
        if let Some(file) = file_path(snapshot, id) {
            let span = &snapshot.items()[id].name_span;
            edits.entry(file).or_default().insert((span.start, span.end));
        }
    }

    let owner = path.parent().and_then(|p| p.last().map(str::to_string));
    let files = scope_files(snapshot, decl);
    let uses = occurrences(snapshot, &files, &old_name, |occurrence| match (&owner, occurrence) {
        (None, Occurrence::Plain | Occurrence::Qualified(_)) => true,
        (Some(_), Occurrence::Member) => true,
        (Some(owner), Occurrence::Qualified(qualifier)) => {
            let last = qualifier.rsplit("::").next().unwrap_or(qualifier);
            last == owner || last == "Self"
        }
        _ => false,
    });
    for (file, ranges) in uses {
        let set = edits.entry(file).or_default();
        set.extend(ranges.into_iter().map(|r| (r.start, r.end)));
    }

    tracing::debug!(%path, new_name, files = edits.len(), "rename");
    for (file, ranges) in edits {
        for (start, end) in ranges {
            snapshot.replace(file.clone(), start..end, new_name);
        }
    }
}

/// Whether `other` would clash with `decl` after a rename
fn same_scope(snapshot: &Snapshot, decl: ItemId, other: ItemId) -> bool {
    let items = snapshot.items();
    if items[decl].outer.is_some() {
        // resolve already matched the same owner
        return true;
    }
    let (Some(a), Some(b)) = (
        snapshot.file(items[decl].file),
        snapshot.file(items[other].file),
    ) else {
        return false;
    };
    match a.language {
        Language::Rust => a.path == b.path,
        Language::Go => a.path.parent() == b.path.parent(),
    }
}

/// Move top-level declarations to the end of `dest`
fn move_to_file(snapshot: &mut Snapshot, path: &ItemPath, found: &[ItemId], dest: &Path) {
    if !path.is_top_level() {
        let items = snapshot.items();
        let enclosing = items.path_of(items.top_item(found[0]));
        let message = format!(
            "cannot move {path}: only top-level declarations can move to a file (declared in {enclosing})"
        );
        snapshot.error_at(found[0], message);
        return;
    }
    let Some(dest_language) = Language::from_path(dest) else {
        return;
    };

    let mut moved = String::new();
    let mut removals = Vec::new();
    let mut header = None;

    let mut ids = found.to_vec();
    ids.sort_by_key(|&id| (snapshot.items()[id].file, snapshot.items()[id].span.start));

    for id in ids {
        let item = &snapshot.items()[id];
        let Some(source) = snapshot.file(item.file) else {
            continue;
        };
        if source.language != dest_language {
            let message = format!(
                "cannot move {path} from {} to {}: different languages",
                source.path.display(),
                dest.display()
            );
            snapshot.error_at(id, message);
            return;
        }
        if source.path == dest {
            snapshot.error_at(id, format!("{path} is already in {}", dest.display()));
            return;
        }
        if source.language == Language::Go && source.path.parent() != dest.parent() {
            let message = format!("cannot move {path} to {}: different package", dest.display());
            snapshot.error_at(id, message);
            return;
        }

        let range = whole_lines(&source.text, item.span.clone());
        moved.push('\n');
        moved.push_str(source.text[range.clone()].trim_end());
        moved.push('\n');
        if header.is_none() && source.language == Language::Go {
            header = go_package_clause(source);
        }
        removals.push((source.path.clone(), range));
    }

    if snapshot.file_by_path(dest).is_none() {
        if let Some(clause) = header {
            moved.insert_str(0, &format!("{clause}\n"));
        }
    }

    tracing::debug!(%path, dest = %dest.display(), "move");
    for (file, range) in removals {
        snapshot.delete(file, range);
    }
    snapshot.append(dest.to_path_buf(), moved);
}

fn go_package_clause(file: &rf_workspace::SourceFile) -> Option<String> {
    let root = file.tree.root_node();
    (0..root.named_child_count())
        .filter_map(|i| root.named_child(i))
        .find(|n| n.kind() == "package_clause")
        .and_then(|n| n.utf8_text(file.text.as_bytes()).ok())
        .map(str::to_string)
}
