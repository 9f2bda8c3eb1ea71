//! Unified diff previews.
//!
//! Built on the `similar` crate's line diff.

use similar::TextDiff;

/// Header label for the pre-change side.
pub const ORIGINAL_LABEL: &str = "Original";

/// Header label for the post-change side.
pub const MODIFIED_LABEL: &str = "Modified";

/// Render a unified diff between two line sequences.
///
/// Lines keep their terminators, as produced by
/// [`LineBuffer::lines`](crate::LineBuffer::lines). Identical inputs give an
/// empty string.
pub fn create_diff_preview(original: &[String], modified: &[String], context: usize) -> String {
    unified_diff(&original.concat(), &modified.concat(), context)
}

/// Render a unified diff between two texts.
pub fn unified_diff(original: &str, modified: &str, context: usize) -> String {
    if original == modified {
        return String::new();
    }
    TextDiff::from_lines(original, modified)
        .unified_diff()
        .context_radius(context)
        .header(ORIGINAL_LABEL, MODIFIED_LABEL)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_headers_and_hunk() {
        let diff = create_diff_preview(&lines(&["a\n", "b\n", "c\n"]), &lines(&["a\n", "hello\n", "c\n"]), 3);

        assert!(diff.starts_with("--- Original\n+++ Modified\n"));
        assert!(diff.contains("@@ -1,3 +1,3 @@"));
        assert!(diff.contains("-b\n"));
        assert!(diff.contains("+hello\n"));
        assert!(diff.contains(" a\n"));
    }

    #[test]
    fn test_no_changes() {
        let content = lines(&["same\n"]);
        assert!(create_diff_preview(&content, &content, 3).is_empty());
    }

    #[test]
    fn test_context_radius() {
        let original: Vec<String> = (1..=10).map(|i| format!("{}\n", i)).collect();
        let mut modified = original.clone();
        modified[9] = "ten\n".to_string();

        let diff = create_diff_preview(&original, &modified, 1);
        assert!(diff.contains(" 9\n"));
        assert!(!diff.contains(" 8\n"));
    }
}
