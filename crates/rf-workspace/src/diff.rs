//! Line-based unified diff

use std::path::Path;

use similar::TextDiff;

/// Lines of context around each change
pub const CONTEXT_LINES: usize = 3;

/// Unified diff of `old` and `new`, labelled with `path`
///
/// Returns an empty string when the texts are equal. A missing original
/// is expressed by passing an empty `old`.
#[must_use]
pub fn unified_diff(path: &Path, old: &str, new: &str) -> String {
    if old == new {
        return String::new();
    }

    let label = path.display();
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(CONTEXT_LINES)
        .header(&format!("a/{label}"), &format!("b/{label}"))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn diff(old: &str, new: &str) -> String {
        unified_diff(Path::new("src/lib.rs"), old, new)
    }

    #[test]
    fn equal_texts_have_no_diff() {
        assert_eq!(diff("a\nb\n", "a\nb\n"), "");
    }

    #[test]
    fn single_change_with_context() {
        let old = "1\n2\n3\n4\n5\n6\n7\n8\n9\n";
        let new = "1\n2\n3\n4\nfive\n6\n7\n8\n9\n";
        assert_eq!(
            diff(old, new),
            "--- a/src/lib.rs\n+++ b/src/lib.rs\n@@ -2,7 +2,7 @@\n 2\n 3\n 4\n-5\n+five\n 6\n 7\n 8\n"
        );
    }

    #[test]
    fn distant_changes_make_separate_hunks() {
        let old: String = (1..=20).map(|i| format!("{i}\n")).collect();
        let new: String = (1..=20)
            .map(|i| match i {
                2 => "two\n".to_string(),
                19 => "nineteen\n".to_string(),
                _ => format!("{i}\n"),
            })
            .collect();
        let out = diff(&old, &new);
        assert_eq!(out.matches("@@ -").count(), 2);
        assert!(out.contains("@@ -1,5 +1,5 @@\n"));
        assert!(out.contains("@@ -16,5 +16,5 @@\n"));
    }

    #[test]
    fn large_file_with_changes_at_both_ends() {
        let old: String = (0..12_000).map(|i| format!("line {i}\n")).collect();
        let new = old
            .replacen("line 0\n", "first\n", 1)
            .replacen("line 11999\n", "last\n", 1);
        let out = diff(&old, &new);

        assert_eq!(out.matches("@@ -").count(), 2);
        assert!(out.contains("-line 0\n+first\n"));
        assert!(out.contains("-line 11999\n+last\n"));
        assert!(out.len() < 400);
    }

    #[test]
    fn deletion_only() {
        let out = diff("a\nb\nc\n", "a\nc\n");
        assert_eq!(
            out,
            "--- a/src/lib.rs\n+++ b/src/lib.rs\n@@ -1,3 +1,2 @@\n a\n-b\n c\n"
        );
    }

    #[test]
    fn new_file() {
        let out = diff("", "x\n");
        assert_eq!(out, "--- a/src/lib.rs\n+++ b/src/lib.rs\n@@ -0,0 +1 @@\n+x\n");
    }

    #[test]
    fn missing_final_newline_marked() {
        let out = diff("a", "a\n");
        assert!(out.contains("-a\n\\ No newline at end of file\n+a\n"));
    }
}
