//! `add PATH TEXT`
//!
//! With a declaration path, TEXT goes on the lines after that declaration,
//! indented like it. With a file path, TEXT is appended to the file, which
//! is created when it does not exist yet.

use super::{file_arg, file_path, indent_at, is_file_arg, parse_path, primary, resolve, unquote};
use crate::registry::CommandContext;

pub fn run(ctx: &mut CommandContext<'_>, args: &str) {
    let snapshot = &mut *ctx.snapshot;
    let (target, text) = match args.split_once(char::is_whitespace) {
        Some((target, text)) if !text.trim().is_empty() => (target, unquote(text.trim())),
        _ => {
            snapshot.error("usage: add path text");
            return;
        }
    };

    if is_file_arg(target) {
        if let Some(file) = file_arg(snapshot, target) {
            snapshot.append(file, format!("\n{text}\n"));
        }
        return;
    }

    let Some(path) = parse_path(snapshot, target) else {
        return;
    };
    let found = resolve(snapshot, &path);
    let Some(id) = primary(snapshot, &found) else {
        return;
    };
    let Some(file) = file_path(snapshot, id) else {
        return;
    };

    let item = &snapshot.items()[id];
    let top_level = item.outer.is_none();
    let span = item.span.clone();
    let Some((_, source)) = snapshot.file_by_path(&file) else {
        return;
    };

    let indent = indent_at(&source.text, span.start);
    let mut insertion = String::from(if top_level { "\n\n" } else { "\n" });
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            insertion.push('\n');
        }
        if !line.is_empty() {
            insertion.push_str(indent);
            insertion.push_str(line);
        }
    }

    // after the declaration's last line
    let at = source.text[span.end..]
        .find('\n')
        .map_or(source.text.len(), |i| span.end + i);
    snapshot.insert(file, at, insertion);
}
