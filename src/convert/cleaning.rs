//! Post-processing rules for converted Markdown.
//!
//! Each rule is a self-contained function over the document's lines that
//! returns how many changes it made. Rules run in table order.
//!
//! ## Adding new rules
//!
//! 1. Write a function with signature `fn(&mut Vec<String>) -> usize`
//! 2. Add a `CleaningRule` entry to `ALL_RULES`

use std::sync::LazyLock;

use regex::Regex;

/// Matches a backslash-escaped `*` or `_`.
static EMPHASIS_ESCAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\([*_])").expect("hardcoded emphasis escape regex"));

/// Matches an opening or closing code fence.
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s{0,3}(```|~~~)").expect("hardcoded fence regex"));

/// A cleaning rule that transforms Markdown lines.
pub struct CleaningRule {
    pub name: &'static str,
    pub description: &'static str,
    pub apply: fn(&mut Vec<String>) -> usize,
}

/// All registered cleaning rules, applied in order.
static ALL_RULES: &[CleaningRule] = &[
    CleaningRule {
        name: "emphasis_escapes",
        description: "Unescape \\* and \\_ outside code",
        apply: rule_emphasis_escapes,
    },
    CleaningRule {
        name: "blank_lines",
        description: "Collapse consecutive blank lines to one",
        apply: rule_blank_lines,
    },
    CleaningRule {
        name: "edge_blank_lines",
        description: "Trim leading and trailing blank lines",
        apply: rule_edge_blank_lines,
    },
];

/// Run all cleaning rules. The result ends with exactly one newline.
pub fn clean_markdown(input: &str) -> String {
    let _span = tracing::info_span!("clean_markdown").entered();

    let mut lines: Vec<String> = input.lines().map(|l| l.to_string()).collect();

    for rule in ALL_RULES {
        let count = (rule.apply)(&mut lines);
        if count > 0 {
            tracing::debug!(
                rule = rule.name,
                description = rule.description,
                changes = count,
                "Cleaning rule applied"
            );
        }
    }

    let mut result = lines.join("\n");
    result.push('\n');
    result
}

/// Rule 1: `\*` and `\_` become `*` and `_`, except inside fenced code
/// blocks and inline code spans.
#[allow(clippy::ptr_arg)] // Signature matches CleaningRule.apply fn pointer type
fn rule_emphasis_escapes(lines: &mut Vec<String>) -> usize {
    let mut in_fence = false;
    let mut changed = 0;

    for line in lines.iter_mut() {
        if FENCE_RE.is_match(line) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence || !line.contains('\\') {
            continue;
        }

        // Even-indexed segments lie outside inline code spans.
        let new = line
            .split('`')
            .enumerate()
            .map(|(i, segment)| {
                if i % 2 == 0 {
                    EMPHASIS_ESCAPE_RE.replace_all(segment, "$1").into_owned()
                } else {
                    segment.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("`");
        if new != *line {
            *line = new;
            changed += 1;
        }
    }
    changed
}

/// Rule 2: collapse runs of blank lines outside code fences to one.
fn rule_blank_lines(lines: &mut Vec<String>) -> usize {
    let mut result = Vec::with_capacity(lines.len());
    let mut in_fence = false;
    let mut previous_blank = false;
    let mut collapsed = 0;

    for line in lines.drain(..) {
        if FENCE_RE.is_match(&line) {
            in_fence = !in_fence;
        }
        let blank = line.trim().is_empty();
        if blank && previous_blank && !in_fence {
            collapsed += 1;
            continue;
        }
        previous_blank = blank;
        result.push(line);
    }

    *lines = result;
    collapsed
}

/// Rule 3: drop blank lines at the start and end of the document.
fn rule_edge_blank_lines(lines: &mut Vec<String>) -> usize {
    let before = lines.len();
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    let leading = lines.iter().take_while(|l| l.trim().is_empty()).count();
    lines.drain(..leading);
    before - lines.len()
}
