//! `inline PATH...`

use std::ops::Range;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use rf_source::{ItemKind, Occurrence};
use rf_workspace::Snapshot;

use super::{file_path, occurrences, parse_path, resolve, scope_files, whole_lines};
use crate::registry::CommandContext;

/// Values that need no parentheses when substituted
const ATOM_PATTERN: &str =
    r#"^(?:[\p{L}\p{Nd}_.]+|"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|`[^`]*`)$"#;

static ATOM: Lazy<Regex> =
    Lazy::new(|| Regex::new(ATOM_PATTERN).expect("atom pattern must compile"));

/// Replace every use of a constant with its value, then remove it
pub fn run(ctx: &mut CommandContext<'_>, args: &str) {
    let snapshot = &mut *ctx.snapshot;
    if args.trim().is_empty() {
        snapshot.error("usage: inline path...");
        return;
    }

    for arg in args.split_whitespace() {
        let Some(path) = parse_path(snapshot, arg) else {
            continue;
        };
        let found = resolve(snapshot, &path);
        let [id] = found[..] else {
            if found.len() > 1 {
                snapshot.error(format!("ambiguous path {path}"));
            }
            continue;
        };

        let item = &snapshot.items()[id];
        if !matches!(item.kind, ItemKind::Const | ItemKind::Static | ItemKind::Var) {
            let kind = item.kind.describe();
            snapshot.error_at(id, format!("cannot inline {kind} {path}"));
            continue;
        }
        let Some(value_range) = item.value.clone() else {
            snapshot.error_at(id, format!("cannot inline {path}: no single value"));
            continue;
        };
        let name = item.name.clone();
        let span = item.span.clone();
        let Some(home) = file_path(snapshot, id) else {
            continue;
        };

        let value = snapshot.slice(id, value_range).trim().to_string();
        let value = if ATOM.is_match(&value) {
            value
        } else {
            format!("({value})")
        };

        let files = scope_files(snapshot, id);
        let uses = occurrences(snapshot, &files, &name, |occurrence| {
            !matches!(occurrence, Occurrence::Member)
        });

        let mut replacements = Vec::new();
        for (file, ranges) in uses {
            for range in ranges {
                if file == home && span.start <= range.start && range.end <= span.end {
                    continue;
                }
                let range = with_qualifier(snapshot, &file, range);
                replacements.push((file.clone(), range));
            }
        }
        for (file, range) in replacements {
            snapshot.replace(file, range, value.clone());
        }

        let Some((_, source)) = snapshot.file_by_path(&home) else {
            continue;
        };
        let removal = whole_lines(&source.text, span);
        snapshot.delete(home, removal);
    }
}

/// Widen a path-qualified occurrence (`limits::MAX`) to include its path
fn with_qualifier(snapshot: &Snapshot, file: &Path, range: Range<usize>) -> Range<usize> {
    let Some((_, source)) = snapshot.file_by_path(file) else {
        return range;
    };
    let node = source
        .tree
        .root_node()
        .descendant_for_byte_range(range.start, range.end);
    match node.and_then(|n| n.parent()) {
        Some(parent) if parent.kind() == "scoped_identifier" => parent.byte_range(),
        _ => range,
    }
}
