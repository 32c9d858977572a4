//! Depth-counting scanner primitives.
//!
//! Brace, bracket and statement matching shared by the event locator, the
//! region extractor and the splice validator. A single non-greedy regex
//! cannot find the end of `promote { atomic { if (c) { x = 1; } } }`, so
//! every block boundary in this crate goes through these functions.
//!
//! Braces inside `//` and `/* */` comments never change the depth.

use std::ops::Range;

/// Outcome of a whole-text brace audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BraceBalance {
    /// Every `{` has a matching `}`.
    Balanced,
    /// A `}` appeared with no open block; offset of the offending byte.
    UnmatchedClose { at: usize },
    /// Text ended with `depth` blocks still open.
    Unclosed { depth: usize },
}

impl BraceBalance {
    pub fn is_balanced(&self) -> bool {
        matches!(self, BraceBalance::Balanced)
    }
}

impl std::fmt::Display for BraceBalance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BraceBalance::Balanced => write!(f, "balanced"),
            BraceBalance::UnmatchedClose { at } => write!(f, "unmatched '}}' at offset {}", at),
            BraceBalance::Unclosed { depth } => write!(f, "{} unclosed '{{'", depth),
        }
    }
}

/// Byte ranges covered by comments, in source order.
#[derive(Debug, Clone, Default)]
pub struct CommentMap {
    spans: Vec<Range<usize>>,
}

impl CommentMap {
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut spans = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            match skip_comment(bytes, i) {
                Some(end) => {
                    spans.push(i..end);
                    i = end;
                }
                None => i += 1,
            }
        }
        Self { spans }
    }

    /// Whether `pos` lies inside a comment.
    pub fn contains(&self, pos: usize) -> bool {
        self.span_containing(pos).is_some()
    }

    /// The comment covering `pos`, if any.
    pub fn span_containing(&self, pos: usize) -> Option<Range<usize>> {
        let idx = self.spans.partition_point(|span| span.end <= pos);
        self.spans
            .get(idx)
            .filter(|span| span.start <= pos)
            .cloned()
    }
}

fn line_end(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |p| from + p)
}

fn block_comment_end(bytes: &[u8], from: usize) -> usize {
    let body = from + 2;
    if body >= bytes.len() {
        return bytes.len();
    }
    bytes[body..]
        .windows(2)
        .position(|w| w == b"*/")
        .map_or(bytes.len(), |p| body + p + 2)
}

/// If a comment starts at `i`, the offset just past it.
fn skip_comment(bytes: &[u8], i: usize) -> Option<usize> {
    if bytes.get(i) != Some(&b'/') {
        return None;
    }
    match bytes.get(i + 1) {
        Some(b'/') => Some(line_end(bytes, i)),
        Some(b'*') => Some(block_comment_end(bytes, i)),
        _ => None,
    }
}

/// Offset of the `}` closing the `{` at `open`.
///
/// Returns `None` when `open` is not a `{` or the block never closes.
pub fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        if let Some(next) = skip_comment(bytes, i) {
            i = next;
            continue;
        }
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Offset of the `[` opening the `]` at `close`, scanning backwards.
pub fn matching_open_bracket(text: &str, close: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(close) != Some(&b']') {
        return None;
    }

    let mut depth = 0usize;
    let mut i = close + 1;
    while i > 0 {
        i -= 1;
        match bytes[i] {
            b']' => depth += 1,
            b'[' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Offset of the `]` closing the `[` at `open`.
pub fn matching_close_bracket(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'[') {
        return None;
    }

    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Offset of the `;` terminating the statement that starts at `start`.
///
/// Semicolons nested in `()`, `[]` or `{}` do not count. Returns `None` if
/// the statement runs out of its enclosing block or the text ends first.
pub fn statement_end(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        if let Some(next) = skip_comment(bytes, i) {
            i = next;
            continue;
        }
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
            }
            b';' if depth == 0 => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// First offset at or after `pos` that is neither whitespace nor comment.
pub fn skip_trivia(text: &str, pos: usize) -> usize {
    let bytes = text.as_bytes();
    let mut i = pos;
    while i < bytes.len() {
        if let Some(next) = skip_comment(bytes, i) {
            i = next;
        } else if bytes[i].is_ascii_whitespace() {
            i += 1;
        } else {
            break;
        }
    }
    i
}

/// Audit the brace structure of a whole text.
pub fn brace_balance(text: &str) -> BraceBalance {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        if let Some(next) = skip_comment(bytes, i) {
            i = next;
            continue;
        }
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                if depth == 0 {
                    return BraceBalance::UnmatchedClose { at: i };
                }
                depth -= 1;
            }
            _ => {}
        }
        i += 1;
    }

    if depth == 0 {
        BraceBalance::Balanced
    } else {
        BraceBalance::Unclosed { depth }
    }
}
