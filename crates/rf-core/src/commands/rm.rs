//! `rm PATH...`

use std::collections::BTreeMap;
use std::ops::Range;
use std::path::PathBuf;

use super::{file_path, outermost, parse_path, resolve, whole_lines};
use crate::registry::CommandContext;

/// Remove each named declaration, with its attributes and doc comments
///
/// A Rust type path also matches its `impl` blocks, which go with it.
pub fn run(ctx: &mut CommandContext<'_>, args: &str) {
    let snapshot = &mut *ctx.snapshot;
    if args.trim().is_empty() {
        snapshot.error("usage: rm path...");
        return;
    }

    let mut removals: BTreeMap<PathBuf, Vec<Range<usize>>> = BTreeMap::new();
    for arg in args.split_whitespace() {
        let Some(path) = parse_path(snapshot, arg) else {
            continue;
        };
        for id in resolve(snapshot, &path) {
            let Some(file) = file_path(snapshot, id) else {
                continue;
            };
            let Some((_, source)) = snapshot.file_by_path(&file) else {
                continue;
            };
            let range = whole_lines(&source.text, snapshot.items()[id].span.clone());
            removals.entry(file).or_default().push(range);
        }
    }

    for (file, ranges) in removals {
        for range in outermost(ranges) {
            snapshot.delete(file.clone(), range);
        }
    }
}
