//! Canonical layout applied to edited files
//!
//! Edits leave gaps behind (a removed declaration keeps its surrounding
//! blank lines). Normalizing tidies the whitespace they leave without
//! touching anything else: rows inside multi-line string literals are kept
//! byte for byte, and the file keeps its line ending.

use std::ops::Range;

/// Normalize whitespace layout
///
/// - trailing whitespace on each line is stripped
/// - leading blank lines are dropped
/// - runs of blank lines collapse to one
/// - the text ends with exactly one newline (empty text stays empty)
///
/// Rows in `verbatim` (0-based, as reported by
/// [`rf_source::literal_rows`]) are copied unchanged. Lines end in `\r\n`
/// when the first line of `text` does.
#[must_use]
pub fn normalize(text: &str, verbatim: &[Range<usize>]) -> String {
    let eol = line_ending(text);
    let mut out = String::with_capacity(text.len());
    let mut pending_blank = false;

    for (row, raw) in text.split_inclusive('\n').enumerate() {
        let keep = verbatim.iter().any(|rows| rows.contains(&row));
        let line = if keep { raw } else { raw.trim_end() };
        if line.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if pending_blank {
            out.push_str(eol);
            pending_blank = false;
        }
        out.push_str(line);
        if !keep || !line.ends_with('\n') {
            out.push_str(eol);
        }
    }

    out
}

fn line_ending(text: &str) -> &'static str {
    match text.split_once('\n') {
        Some((first, _)) if first.ends_with('\r') => "\r\n",
        _ => "\n",
    }
}
