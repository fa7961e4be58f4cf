//! Template Parser
//!
//! Converts raw template text into an ordered sequence of typed blocks.
//! Parsing is total: malformed directives fall back to documented defaults
//! and unknown `::` directives are consumed silently, so any input yields
//! a template.
//!
//! Grammar (line-oriented, lines trimmed first):
//!
//! - blank lines and `#` comments are discarded
//! - `::Sleep <seconds>` emits a sleep block (default 1 on a bad count)
//! - `::ExpertMode command=<id> prompt='<text>' [<password>]
//!   expert-prompt='<text>'` opens a privileged block
//! - `::ExpertModeEnd command=<id> prompt='<text>'` closes it; without a
//!   matching open expert block it is a no-op
//! - any other `::` line is reserved and ignored
//! - everything else is a literal command for the currently open block

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Block, ExpertBlock, Template};

static SLEEP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^::Sleep\s+(\d+)$").expect("static regex")
});
static EXPERT_BEGIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^::ExpertMode\b").expect("static regex")
});
static EXPERT_END_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^::ExpertModeEnd\b").expect("static regex")
});
static COMMAND_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"command=(\S+)").expect("static regex")
});
static PROMPT_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"prompt='([^']+)'").expect("static regex")
});
static EXPERT_PROMPT_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"expert-prompt='([^']+)'").expect("static regex")
});
// The expert password sits between the prompt='...' value and the
// expert-prompt= attribute, either quoted or bare.
static PASSWORD_QUOTED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"prompt='[^']*'\s+'([^']+)'\s+expert-prompt").expect("static regex")
});
static PASSWORD_BARE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"prompt='[^']*'\s+([^\s'][^\s]*)\s+expert-prompt").expect("static regex")
});

/// The currently open accumulator block.
///
/// Made explicit (rather than a hidden mutable default-dict) so the parser
/// is a straightforward fold over input lines.
#[derive(Debug)]
enum OpenBlock {
    Clish { items: Vec<String> },
    Expert(ExpertBlock),
}

impl OpenBlock {
    fn fresh() -> Self {
        OpenBlock::Clish { items: Vec::new() }
    }

    fn push_item(&mut self, line: &str) {
        match self {
            OpenBlock::Clish { items } => items.push(line.to_string()),
            OpenBlock::Expert(block) => block.items.push(line.to_string()),
        }
    }

    fn has_items(&self) -> bool {
        match self {
            OpenBlock::Clish { items } => !items.is_empty(),
            OpenBlock::Expert(block) => !block.items.is_empty(),
        }
    }

    fn into_block(self) -> Block {
        match self {
            OpenBlock::Clish { items } => Block::Clish { items },
            OpenBlock::Expert(block) => Block::Expert(block),
        }
    }
}

/// Parser state threaded through the line fold
#[derive(Debug)]
struct ParserState {
    blocks: Vec<Block>,
    open: OpenBlock,
}

impl ParserState {
    fn new() -> Self {
        Self {
            blocks: Vec::new(),
            open: OpenBlock::fresh(),
        }
    }

    /// Append the open block to the output if it has any items, then
    /// reset to a fresh clish accumulator.
    fn flush(&mut self) {
        let open = std::mem::replace(&mut self.open, OpenBlock::fresh());
        if open.has_items() {
            self.blocks.push(open.into_block());
        }
    }
}

fn attr<'a>(re: &Regex, line: &'a str) -> Option<&'a str> {
    re.captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn parse_sleep(line: &str) -> Block {
    // An unparseable count defaults to one second.
    let seconds = SLEEP_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .unwrap_or(1);
    Block::Sleep { seconds }
}

fn parse_expert_begin(line: &str) -> ExpertBlock {
    let mut block = ExpertBlock::default();
    if let Some(cmd) = attr(&COMMAND_ATTR_RE, line) {
        block.enter_cmd = cmd.to_string();
    }
    if let Some(prompt) = attr(&PROMPT_ATTR_RE, line) {
        block.pre_password_prompt = prompt.to_string();
    }
    if let Some(prompt) = attr(&EXPERT_PROMPT_ATTR_RE, line) {
        block.expert_prompt = prompt.to_string();
    }
    if let Some(password) = attr(&PASSWORD_QUOTED_RE, line) {
        block.password = password.to_string();
    } else if let Some(password) = attr(&PASSWORD_BARE_RE, line) {
        block.password = password.to_string();
    }
    block
}

/// Parse template text into an ordered block sequence.
///
/// This is a pure, total function: it never fails, and parsing the same
/// text twice yields structurally equal templates.
pub fn parse(text: &str) -> Template {
    let mut state = ParserState::new();

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with("::Sleep ") {
            state.flush();
            state.blocks.push(parse_sleep(line));
        } else if EXPERT_END_RE.is_match(line) {
            // An end with no matching open expert block is a no-op.
            if let OpenBlock::Expert(ref mut block) = state.open {
                if let Some(cmd) = attr(&COMMAND_ATTR_RE, line) {
                    block.exit_cmd = cmd.to_string();
                }
                if let Some(prompt) = attr(&PROMPT_ATTR_RE, line) {
                    block.exit_prompt = prompt.to_string();
                }
                let open = std::mem::replace(&mut state.open, OpenBlock::fresh());
                state.blocks.push(open.into_block());
            }
        } else if EXPERT_BEGIN_RE.is_match(line) {
            state.flush();
            state.open = OpenBlock::Expert(parse_expert_begin(line));
        } else if line.starts_with("::") {
            // Reserved for future directives.
            continue;
        } else {
            state.open.push_item(line);
        }
    }

    // An unterminated expert block still executes, with its default exit
    // command and prompt; existing templates rely on this.
    state.flush();
    Template::new(state.blocks)
}
