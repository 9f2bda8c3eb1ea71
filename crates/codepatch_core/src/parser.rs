//! Suggestion parsing: fenced code blocks and the instructions that target them.
//!
//! Recognized instruction phrases (case-insensitive), in priority order:
//!
//! - `replace [the] function|method NAME with`, `update [the] function|method NAME to`,
//!   `function|method NAME should be`
//! - `replace [the] class NAME with`, `update [the] class NAME to`, `class NAME should be`
//! - `change|update line N to`, `replace line N with`, `line N should be`
//! - `replace line(s) A-B with`, `update|change line(s) A-B to`
//! - `add|insert [after] line N`

use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::debug;

use crate::config::PairingPolicy;
use crate::models::{Change, ChangeIntent, SuggestionBlock};

const FENCE_PATTERN: &str = r"(?s)```([\w+#.-]*)[ \t]*\r?\n(.*?)\r?\n```";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntentKind {
    Function,
    Class,
    Line,
    Block,
    Insert,
}

const INTENT_PATTERNS: &[(IntentKind, &str)] = &[
    (IntentKind::Function, r"(?i)\breplace\s+(?:the\s+)?(?:function|method)\s+(\w+)\s+with:?"),
    (IntentKind::Function, r"(?i)\bupdate\s+(?:the\s+)?(?:function|method)\s+(\w+)\s+to:?"),
    (IntentKind::Function, r"(?i)\b(?:function|method)\s+(\w+)\s+should\s+be:?"),
    (IntentKind::Class, r"(?i)\breplace\s+(?:the\s+)?class\s+(\w+)\s+with:?"),
    (IntentKind::Class, r"(?i)\bupdate\s+(?:the\s+)?class\s+(\w+)\s+to:?"),
    (IntentKind::Class, r"(?i)\bclass\s+(\w+)\s+should\s+be:?"),
    (IntentKind::Line, r"(?i)\bchange\s+line\s+(\d+)\s+to:?"),
    (IntentKind::Line, r"(?i)\bupdate\s+line\s+(\d+)\s+to:?"),
    (IntentKind::Line, r"(?i)\breplace\s+line\s+(\d+)\s+with:?"),
    (IntentKind::Line, r"(?i)\bline\s+(\d+)\s+should\s+be:?"),
    (IntentKind::Block, r"(?i)\breplace\s+lines?\s+(\d+)\s*-\s*(\d+)\s+with:?"),
    (IntentKind::Block, r"(?i)\bupdate\s+lines?\s+(\d+)\s*-\s*(\d+)\s+to:?"),
    (IntentKind::Block, r"(?i)\bchange\s+lines?\s+(\d+)\s*-\s*(\d+)\s+to:?"),
    (IntentKind::Insert, r"(?i)\badd\s+(?:after\s+)?line\s+(\d+):?"),
    (IntentKind::Insert, r"(?i)\binsert\s+(?:after\s+)?line\s+(\d+):?"),
];

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(FENCE_PATTERN).expect("fence pattern is valid"))
}

fn intent_regexes() -> &'static [(IntentKind, Regex)] {
    static INTENTS: OnceLock<Vec<(IntentKind, Regex)>> = OnceLock::new();
    INTENTS.get_or_init(|| {
        INTENT_PATTERNS
            .iter()
            .map(|(kind, pattern)| (*kind, Regex::new(pattern).expect("intent pattern is valid")))
            .collect()
    })
}

/// An instruction phrase found in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct IntentMatch {
    intent: ChangeIntent,
    end: usize,
    priority: usize,
}

/// Parser for annotated suggestion text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuggestionParser {
    pairing: PairingPolicy,
}

impl SuggestionParser {
    pub fn new(pairing: PairingPolicy) -> Self {
        Self { pairing }
    }

    /// Extract every terminated fenced block, in document order.
    pub fn extract_blocks(text: &str) -> Vec<SuggestionBlock> {
        fence_regex()
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let language = caps
                    .get(1)
                    .map(|m| m.as_str())
                    .filter(|s| !s.is_empty())
                    .unwrap_or("text");
                let code = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
                Some(SuggestionBlock {
                    language: language.to_string(),
                    code: code.to_string(),
                    offset: whole.start(),
                    end: whole.end(),
                })
            })
            .collect()
    }

    /// First instruction in the text, by pattern priority then position.
    pub fn resolve_first_intent(text: &str) -> Option<ChangeIntent> {
        intent_regexes().iter().find_map(|(kind, re)| {
            re.captures_iter(text)
                .find_map(|caps| intent_from_captures(*kind, &caps))
        })
    }

    /// Instruction ending closest to `window.end`, searched within `window`.
    ///
    /// Ties on position go to the higher-priority pattern.
    pub fn resolve_nearest_intent(text: &str, window: std::ops::Range<usize>) -> Option<ChangeIntent> {
        let region = text.get(window)?;

        let mut best: Option<IntentMatch> = None;
        for (priority, (kind, re)) in intent_regexes().iter().enumerate() {
            for caps in re.captures_iter(region) {
                let Some(intent) = intent_from_captures(*kind, &caps) else {
                    continue;
                };
                let end = caps.get(0).map(|m| m.end()).unwrap_or_default();
                let better = match &best {
                    None => true,
                    Some(current) => end > current.end || (end == current.end && priority < current.priority),
                };
                if better {
                    best = Some(IntentMatch { intent, end, priority });
                }
            }
        }
        best.map(|m| m.intent)
    }

    /// Resolve every block with an intent into a change.
    ///
    /// Blocks without a resolvable instruction are dropped.
    pub fn parse(&self, text: &str) -> Vec<Change> {
        let blocks = Self::extract_blocks(text);
        debug!("Found {} code block(s) in suggestions", blocks.len());

        let first = match self.pairing {
            PairingPolicy::FirstMatch => Self::resolve_first_intent(text),
            PairingPolicy::NearestPreceding => None,
        };

        let mut changes = Vec::new();
        let mut previous_end = 0;
        for block in blocks {
            let intent = match self.pairing {
                PairingPolicy::FirstMatch => first.clone(),
                PairingPolicy::NearestPreceding => {
                    Self::resolve_nearest_intent(text, previous_end..block.offset)
                }
            };
            previous_end = block.end;

            match intent {
                Some(intent) => {
                    debug!("Block at offset {} resolved to: {}", block.offset, intent);
                    changes.push(Change::new(intent, block.code).with_language(block.language));
                }
                None => debug!("No instruction for block at offset {}, skipping", block.offset),
            }
        }
        changes
    }
}

fn intent_from_captures(kind: IntentKind, caps: &Captures<'_>) -> Option<ChangeIntent> {
    let first = caps.get(1)?.as_str();
    let intent = match kind {
        IntentKind::Function => ChangeIntent::FunctionReplace { name: first.to_string() },
        IntentKind::Class => ChangeIntent::ClassReplace { name: first.to_string() },
        IntentKind::Line => ChangeIntent::LineReplace { line: first.parse().ok()? },
        IntentKind::Block => ChangeIntent::BlockReplace {
            from: first.parse().ok()?,
            to: caps.get(2)?.as_str().parse().ok()?,
        },
        IntentKind::Insert => ChangeIntent::InsertAfter { line: first.parse().ok()? },
    };
    Some(intent)
}
