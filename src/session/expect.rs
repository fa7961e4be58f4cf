//! Expect Patterns
//!
//! Patterns the session layer waits for in accumulated PTY output, and the
//! events a bounded wait can produce. Matching is re-run against the whole
//! accumulated buffer each time a chunk arrives, pexpect-style: the first
//! pattern (by slice order) with a match wins.

use once_cell::sync::Lazy;
use regex::Regex;

// An operational prompt is a line ending in '>' (clish) or '#' (expert),
// possibly with trailing spaces or a carriage return from the PTY.
static OPERATIONAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[>#][ \t\r]*\z").expect("static regex")
});

// The restricted shell only; an expert '#' prompt must not satisfy this.
static CLISH_PROMPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r">[ \t\r]*\z").expect("static regex")
});

/// A pattern to wait for in session output
#[derive(Debug, Clone)]
pub enum Expect {
    /// A line ending in `>` or `#` — the device is ready for a command
    Operational,
    /// A line ending in `>` only — the restricted clish shell
    ClishPrompt,
    /// A literal substring, e.g. a configured password prompt
    Literal(String),
    /// An arbitrary compiled pattern
    Pattern(Regex),
}

impl Expect {
    /// Span `(start, end)` of the first match in `buf`, if any.
    pub fn find(&self, buf: &str) -> Option<(usize, usize)> {
        match self {
            Expect::Operational => OPERATIONAL_RE.find(buf).map(|m| (m.start(), buf.len())),
            Expect::ClishPrompt => CLISH_PROMPT_RE.find(buf).map(|m| (m.start(), buf.len())),
            Expect::Literal(text) => buf
                .find(text.as_str())
                .map(|start| (start, start + text.len())),
            Expect::Pattern(re) => re.find(buf).map(|m| (m.start(), m.end())),
        }
    }
}

/// Result of a bounded multi-pattern wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectEvent {
    /// The pattern at `index` matched; `before` is the text observed
    /// before the match.
    Matched { index: usize, before: String },
    /// End-of-stream before any pattern matched
    Eof { before: String },
    /// The timeout elapsed before any pattern matched
    TimedOut { before: String },
}

impl ExpectEvent {
    /// The captured text regardless of how the wait ended
    pub fn before(&self) -> &str {
        match self {
            ExpectEvent::Matched { before, .. }
            | ExpectEvent::Eof { before }
            | ExpectEvent::TimedOut { before } => before,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, ExpectEvent::Matched { .. })
    }
}

/// Find the first matching pattern in `buf`, slice order breaking ties.
/// Returns `(pattern index, match start, match end)`.
pub fn first_match(patterns: &[Expect], buf: &str) -> Option<(usize, usize, usize)> {
    patterns.iter().enumerate().find_map(|(index, pattern)| {
        pattern.find(buf).map(|(start, end)| (index, start, end))
    })
}
