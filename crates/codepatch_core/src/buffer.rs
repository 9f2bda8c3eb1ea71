//! Line-oriented text buffer and the edit operations applied to it.

use regex::Regex;
use tracing::debug;

use crate::error::{PatchError, PatchResult};
use crate::models::{Change, ChangeIntent, ChangedRange};

const FUNCTION_MODIFIERS: &str = r"pub(?:\([^)]*\))?|async|export|default|static|public|private|protected|unsafe|const|inline|virtual|override";
const CLASS_MODIFIERS: &str = r"pub(?:\([^)]*\))?|export|default|abstract|final|public|private|sealed|data";

/// A file held as lines, each keeping its own terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineBuffer {
    lines: Vec<String>,
    line_ending: &'static str,
}

impl LineBuffer {
    pub fn from_text(text: &str) -> Self {
        let lines: Vec<String> = text.split_inclusive('\n').map(str::to_string).collect();
        let line_ending = match lines.iter().find(|l| l.ends_with('\n')) {
            Some(line) if line.ends_with("\r\n") => "\r\n",
            _ => "\n",
        };
        Self { lines, line_ending }
    }

    pub fn from_lines(lines: Vec<String>) -> Self {
        Self::from_text(&lines.concat())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_ending(&self) -> &'static str {
        self.line_ending
    }

    pub fn to_text(&self) -> String {
        self.lines.concat()
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    /// Apply one change. On error the buffer is left as it was.
    pub fn apply(&mut self, change: &Change) -> PatchResult<ChangedRange> {
        debug!("Applying change: {}", change.intent);
        match &change.intent {
            ChangeIntent::FunctionReplace { name } => {
                let header = function_header(name)?;
                let (start, end) = self
                    .definition_span(&header)
                    .ok_or_else(|| PatchError::FunctionNotFound(name.clone()))?;
                Ok(self.splice(start, end, &change.code))
            }
            ChangeIntent::ClassReplace { name } => {
                let header = class_header(name)?;
                let (start, end) = self
                    .definition_span(&header)
                    .ok_or_else(|| PatchError::ClassNotFound(name.clone()))?;
                Ok(self.splice(start, end, &change.code))
            }
            ChangeIntent::LineReplace { line } => self.replace_line(*line, &change.code),
            ChangeIntent::BlockReplace { from, to } => self.replace_block(*from, *to, &change.code),
            ChangeIntent::InsertAfter { line } => self.insert_after(*line, &change.code),
        }
    }

    /// Replace 1-based line `line` with the trimmed code.
    pub fn replace_line(&mut self, line: usize, code: &str) -> PatchResult<ChangedRange> {
        if line < 1 || line > self.lines.len() {
            return Err(PatchError::LineOutOfRange(line));
        }
        let replacement = self.code_lines(code.trim_end(), true).concat();
        self.lines[line - 1] = replacement;
        Ok(ChangedRange::new(line - 1, line))
    }

    /// Replace the inclusive 1-based range `from..=to`.
    pub fn replace_block(&mut self, from: usize, to: usize, code: &str) -> PatchResult<ChangedRange> {
        if from < 1 || to > self.lines.len() || from > to {
            return Err(PatchError::InvalidRange { from, to });
        }
        Ok(self.splice(from - 1, to, code))
    }

    /// Insert code after 1-based line `line`.
    pub fn insert_after(&mut self, line: usize, code: &str) -> PatchResult<ChangedRange> {
        if line < 1 || line > self.lines.len() {
            return Err(PatchError::LineOutOfRange(line));
        }
        let anchor = &mut self.lines[line - 1];
        let anchor_terminated = anchor.ends_with('\n');
        if !anchor_terminated {
            anchor.push_str(self.line_ending);
        }
        let new_lines = self.code_lines(code, line < self.lines.len() || anchor_terminated);
        self.lines.splice(line..line, new_lines);
        Ok(ChangedRange::new(line, line))
    }

    /// Span `[start, end)` of the definition whose header matches `header`.
    ///
    /// The body runs until the next non-blank line indented no deeper than the
    /// header. A closing delimiter at the header's indentation is part of it.
    fn definition_span(&self, header: &Regex) -> Option<(usize, usize)> {
        let start = self.lines.iter().position(|line| header.is_match(line))?;
        let indent = indentation(&self.lines[start]);

        let mut end = self.lines.len();
        for (i, line) in self.lines.iter().enumerate().skip(start + 1) {
            if is_blank(line) {
                continue;
            }
            let line_indent = indentation(line);
            if line_indent <= indent {
                end = if line_indent == indent && is_closing_delimiter(line) {
                    i + 1
                } else {
                    i
                };
                break;
            }
        }
        debug!("Definition span: lines {}..{}", start, end);
        Some((start, end))
    }

    fn splice(&mut self, start: usize, end: usize, code: &str) -> ChangedRange {
        let span_terminated = end == start || self.lines[end - 1].ends_with('\n');
        let terminate = end < self.lines.len() || span_terminated;
        let new_lines = self.code_lines(code, terminate);
        self.lines.splice(start..end, new_lines);
        ChangedRange::new(start, end)
    }

    /// Split replacement code into lines, adding a terminator to the last one
    /// when `terminate` is set. In a CRLF buffer every terminator becomes `\r\n`.
    fn code_lines(&self, code: &str, terminate: bool) -> Vec<String> {
        let mut lines: Vec<String> = code.split_inclusive('\n').map(str::to_string).collect();
        if self.line_ending == "\r\n" {
            for line in lines.iter_mut().filter(|l| l.ends_with('\n') && !l.ends_with("\r\n")) {
                line.pop();
                line.push_str("\r\n");
            }
        }
        if terminate {
            if let Some(last) = lines.last_mut() {
                if !last.ends_with('\n') {
                    last.push_str(self.line_ending);
                }
            }
        }
        lines
    }
}

/// Leading whitespace character count. Tabs count as one.
pub fn indentation(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn is_closing_delimiter(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with(['}', ']', ')']) || trimmed == "end" || trimmed.starts_with("end;")
}

fn function_header(name: &str) -> PatchResult<Regex> {
    let pattern = format!(
        r"^\s*(?:(?:{})\s+)*(?:def|fn|function|func)\s+{}\s*[(<]",
        FUNCTION_MODIFIERS,
        regex::escape(name)
    );
    Ok(Regex::new(&pattern)?)
}

fn class_header(name: &str) -> PatchResult<Regex> {
    let pattern = format!(
        r"^\s*(?:(?:{})\s+)*(?:class|struct|enum|trait|interface)\s+{}\b",
        CLASS_MODIFIERS,
        regex::escape(name)
    );
    Ok(Regex::new(&pattern)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(lines: &[&str]) -> LineBuffer {
        LineBuffer::from_lines(lines.iter().map(|l| l.to_string()).collect())
    }

    #[test]
    fn test_function_replace_python() {
        let mut buf = buffer(&["def f():\n", "    pass\n", "\n", "def g():\n", "    pass\n"]);
        let change = Change::new(
            ChangeIntent::FunctionReplace { name: "f".into() },
            "def f():\n    return 1\n",
        );
        let range = buf.apply(&change).unwrap();
        assert_eq!(range, ChangedRange::new(0, 3));
        assert_eq!(buf.lines(), ["def f():\n", "    return 1\n", "def g():\n", "    pass\n"]);
    }

    #[test]
    fn test_function_replace_unterminated_code_does_not_fuse_lines() {
        let mut buf = buffer(&["def f():\n", "    pass\n", "def g():\n", "    pass\n"]);
        let change = Change::new(
            ChangeIntent::FunctionReplace { name: "f".into() },
            "def f():\n    return 2",
        );
        buf.apply(&change).unwrap();
        assert_eq!(buf.lines(), ["def f():\n", "    return 2\n", "def g():\n", "    pass\n"]);
    }

    #[test]
    fn test_nested_method_ends_at_dedent() {
        let mut buf = buffer(&[
            "class A:\n",
            "    def run(self):\n",
            "        x = 1\n",
            "\n",
            "        return x\n",
            "    def stop(self):\n",
            "        pass\n",
        ]);
        let change = Change::new(
            ChangeIntent::FunctionReplace { name: "run".into() },
            "    def run(self):\n        return 0\n",
        );
        assert_eq!(buf.apply(&change).unwrap(), ChangedRange::new(1, 5));
        assert_eq!(buf.lines()[2], "        return 0\n");
        assert_eq!(buf.lines()[3], "    def stop(self):\n");
    }

    #[test]
    fn test_function_replace_rust_includes_closing_brace() {
        let mut buf = buffer(&[
            "pub fn add(a: i32, b: i32) -> i32 {\n",
            "    a + b\n",
            "}\n",
            "\n",
            "fn main() {}\n",
        ]);
        let change = Change::new(
            ChangeIntent::FunctionReplace { name: "add".into() },
            "pub fn add(a: i32, b: i32) -> i32 {\n    b + a\n}",
        );
        assert_eq!(buf.apply(&change).unwrap(), ChangedRange::new(0, 3));
        assert_eq!(
            buf.to_text(),
            "pub fn add(a: i32, b: i32) -> i32 {\n    b + a\n}\n\nfn main() {}\n"
        );
    }

    #[test]
    fn test_function_not_found() {
        let mut buf = buffer(&["def f():\n", "    pass\n"]);
        let before = buf.clone();
        let change = Change::new(ChangeIntent::FunctionReplace { name: "missing".into() }, "x");
        let err = buf.apply(&change).unwrap_err();
        assert_eq!(err.to_string(), "Function missing not found");
        assert_eq!(buf, before);
    }

    #[test]
    fn test_name_prefix_does_not_match() {
        let mut buf = buffer(&["def fetch_all():\n", "    pass\n"]);
        let change = Change::new(ChangeIntent::FunctionReplace { name: "fetch".into() }, "x");
        assert!(buf.apply(&change).is_err());
    }

    #[test]
    fn test_class_replace_to_eof() {
        let mut buf = buffer(&["import os\n", "class Config(Base):\n", "    a = 1\n", "    b = 2\n"]);
        let change = Change::new(
            ChangeIntent::ClassReplace { name: "Config".into() },
            "class Config(Base):\n    a = 3\n",
        );
        assert_eq!(buf.apply(&change).unwrap(), ChangedRange::new(1, 4));
        assert_eq!(buf.lines(), ["import os\n", "class Config(Base):\n", "    a = 3\n"]);
    }

    #[test]
    fn test_class_not_found() {
        let mut buf = buffer(&["x = 1\n"]);
        let change = Change::new(ChangeIntent::ClassReplace { name: "Nope".into() }, "x");
        assert_eq!(buf.apply(&change).unwrap_err().to_string(), "Class Nope not found");
    }

    #[test]
    fn test_line_replace() {
        let mut buf = buffer(&["a\n", "b\n", "c\n"]);
        let change = Change::new(ChangeIntent::LineReplace { line: 2 }, "hello   ");
        assert_eq!(buf.apply(&change).unwrap(), ChangedRange::new(1, 2));
        assert_eq!(buf.lines(), ["a\n", "hello\n", "c\n"]);
    }

    #[test]
    fn test_range_validation_leaves_buffer_untouched() {
        let mut buf = buffer(&["1\n", "2\n", "3\n", "4\n", "5\n", "6\n"]);
        let before = buf.clone();
        let len = buf.len();

        assert!(buf.apply(&Change::new(ChangeIntent::LineReplace { line: 0 }, "x")).is_err());
        assert!(buf.apply(&Change::new(ChangeIntent::LineReplace { line: len + 1 }, "x")).is_err());
        let err = buf
            .apply(&Change::new(ChangeIntent::BlockReplace { from: 5, to: 3 }, "x"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid line range: 5-3");
        assert!(buf.apply(&Change::new(ChangeIntent::InsertAfter { line: 0 }, "x")).is_err());
        assert_eq!(buf, before);
    }

    #[test]
    fn test_block_replace_changes_line_count() {
        let mut buf = buffer(&["a\n", "b\n", "c\n", "d\n"]);
        let change = Change::new(ChangeIntent::BlockReplace { from: 2, to: 3 }, "x\ny\nz");
        assert_eq!(buf.apply(&change).unwrap(), ChangedRange::new(1, 3));
        assert_eq!(buf.lines(), ["a\n", "x\n", "y\n", "z\n", "d\n"]);
    }

    #[test]
    fn test_insert_after() {
        let mut buf = buffer(&["a\n", "b\n"]);
        let change = Change::new(ChangeIntent::InsertAfter { line: 1 }, "new");
        assert_eq!(buf.apply(&change).unwrap(), ChangedRange::new(1, 1));
        assert_eq!(buf.lines(), ["a\n", "new\n", "b\n"]);
    }

    #[test]
    fn test_insert_after_unterminated_last_line() {
        let mut buf = LineBuffer::from_text("a\nb");
        buf.apply(&Change::new(ChangeIntent::InsertAfter { line: 2 }, "c")).unwrap();
        assert_eq!(buf.to_text(), "a\nb\nc");
    }

    #[test]
    fn test_crlf_preserved() {
        let mut buf = LineBuffer::from_text("a\r\nb\r\nc\r\n");
        assert_eq!(buf.line_ending(), "\r\n");
        buf.apply(&Change::new(ChangeIntent::LineReplace { line: 2 }, "x")).unwrap();
        assert_eq!(buf.to_text(), "a\r\nx\r\nc\r\n");
    }

    #[test]
    fn test_crlf_normalizes_multiline_replacement() {
        let mut buf = LineBuffer::from_text("a\r\nb\r\nc\r\n");
        buf.apply(&Change::new(ChangeIntent::BlockReplace { from: 2, to: 2 }, "x\ny"))
            .unwrap();
        assert_eq!(buf.to_text(), "a\r\nx\r\ny\r\nc\r\n");

        buf.apply(&Change::new(ChangeIntent::InsertAfter { line: 1 }, "i\nj\r\nk"))
            .unwrap();
        assert_eq!(buf.to_text(), "a\r\ni\r\nj\r\nk\r\nx\r\ny\r\nc\r\n");

        buf.apply(&Change::new(ChangeIntent::LineReplace { line: 1 }, "p\nq"))
            .unwrap();
        assert!(!buf.to_text().replace("\r\n", "").contains('\n'));
    }

    #[test]
    fn test_lf_buffer_keeps_lf_replacement() {
        let mut buf = LineBuffer::from_text("a\nb\n");
        buf.apply(&Change::new(ChangeIntent::BlockReplace { from: 1, to: 1 }, "x\ny"))
            .unwrap();
        assert_eq!(buf.to_text(), "x\ny\nb\n");
    }

    #[test]
    fn test_indentation_counts_characters() {
        assert_eq!(indentation("    x"), 4);
        assert_eq!(indentation("\tx"), 1);
        assert_eq!(indentation("x"), 0);
    }
}
