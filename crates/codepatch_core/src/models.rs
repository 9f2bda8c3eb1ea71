//! Data model for patch sessions.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A fenced code excerpt taken from annotated suggestion text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionBlock {
    /// Language tag after the opening fence, `"text"` when absent.
    pub language: String,
    /// Code between the fences, without the final newline.
    pub code: String,
    /// Byte offset of the opening fence in the source text.
    pub offset: usize,
    /// Byte offset just past the closing fence.
    pub end: usize,
}

/// Where and how a block should be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeIntent {
    FunctionReplace { name: String },
    ClassReplace { name: String },
    /// 1-based line number.
    LineReplace { line: usize },
    /// Inclusive 1-based range.
    BlockReplace { from: usize, to: usize },
    /// 1-based line number.
    InsertAfter { line: usize },
}

impl ChangeIntent {
    /// Short label for the kind of change.
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeIntent::FunctionReplace { .. } => "function_replace",
            ChangeIntent::ClassReplace { .. } => "class_replace",
            ChangeIntent::LineReplace { .. } => "line_replace",
            ChangeIntent::BlockReplace { .. } => "block_replace",
            ChangeIntent::InsertAfter { .. } => "insert_after",
        }
    }
}

impl fmt::Display for ChangeIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeIntent::FunctionReplace { name } => write!(f, "replace function {}", name),
            ChangeIntent::ClassReplace { name } => write!(f, "replace class {}", name),
            ChangeIntent::LineReplace { line } => write!(f, "replace line {}", line),
            ChangeIntent::BlockReplace { from, to } => write!(f, "replace lines {}-{}", from, to),
            ChangeIntent::InsertAfter { line } => write!(f, "insert after line {}", line),
        }
    }
}

/// A resolved edit, ready to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub intent: ChangeIntent,
    pub code: String,
    pub language: String,
}

impl Change {
    pub fn new(intent: ChangeIntent, code: impl Into<String>) -> Self {
        Self {
            intent,
            code: code.into(),
            language: "text".to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// 0-based half-open span of the buffer that a change replaced.
///
/// Insertions report an empty span (`start == end`) at the insertion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedRange {
    pub start: usize,
    pub end: usize,
}

impl ChangedRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Outcome of applying one change to a line buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyResult {
    pub intent: ChangeIntent,
    pub success: bool,
    pub changed_range: Option<ChangedRange>,
    pub error: Option<String>,
}

impl ApplyResult {
    pub fn applied(intent: ChangeIntent, range: ChangedRange) -> Self {
        Self {
            intent,
            success: true,
            changed_range: Some(range),
            error: None,
        }
    }

    pub fn failed(intent: ChangeIntent, error: impl Into<String>) -> Self {
        Self {
            intent,
            success: false,
            changed_range: None,
            error: Some(error.into()),
        }
    }
}

/// Outcome of a full patch session over one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOutcome {
    pub success: bool,
    pub applied_changes: Vec<ApplyResult>,
    pub backup_path: Option<PathBuf>,
    pub error: Option<String>,
}

impl PatchOutcome {
    /// Session-level failure.
    pub fn failure(error: impl Into<String>, backup_path: Option<PathBuf>) -> Self {
        Self {
            success: false,
            applied_changes: Vec::new(),
            backup_path,
            error: Some(error.into()),
        }
    }

    /// Number of changes that were applied.
    pub fn applied_count(&self) -> usize {
        self.applied_changes.iter().filter(|r| r.success).count()
    }

    /// Number of changes that failed.
    pub fn failed_count(&self) -> usize {
        self.applied_changes.iter().filter(|r| !r.success).count()
    }
}

/// Result of a dry run: what would change, without touching the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchPreview {
    pub changes: Vec<ApplyResult>,
    pub diff: String,
    pub modified: String,
}

impl PatchPreview {
    pub fn has_changes(&self) -> bool {
        self.changes.iter().any(|r| r.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_serializes_with_kind_tag() {
        let intent = ChangeIntent::BlockReplace { from: 3, to: 5 };
        let json = serde_json::to_string(&intent).unwrap();
        assert_eq!(json, r#"{"kind":"block_replace","from":3,"to":5}"#);
        assert_eq!(intent.kind(), "block_replace");
    }

    #[test]
    fn test_intent_display() {
        assert_eq!(
            ChangeIntent::FunctionReplace { name: "f".into() }.to_string(),
            "replace function f"
        );
        assert_eq!(ChangeIntent::InsertAfter { line: 4 }.to_string(), "insert after line 4");
    }

    #[test]
    fn test_outcome_counts() {
        let intent = ChangeIntent::LineReplace { line: 1 };
        let outcome = PatchOutcome {
            success: true,
            applied_changes: vec![
                ApplyResult::applied(intent.clone(), ChangedRange::new(0, 1)),
                ApplyResult::failed(intent, "Line 9 out of range"),
            ],
            backup_path: None,
            error: None,
        };
        assert_eq!(outcome.applied_count(), 1);
        assert_eq!(outcome.failed_count(), 1);
    }
}
