//! Template Block Model
//!
//! Represents one unit of templated work: a run of clish commands, a timed
//! pause, or a privileged-mode excursion. Blocks are produced by the template
//! parser and never mutated afterwards.
//!
//! ## Security Note
//!
//! `ExpertBlock` may carry an expert password parsed from the template. The
//! password field is excluded from serialization so the dry-run JSON emission
//! and any log output never contain it in cleartext.

use serde::{Deserialize, Serialize};

/// A privileged-mode excursion: enter expert mode, run commands, exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpertBlock {
    /// Command that enters expert mode
    pub enter_cmd: String,

    /// Prompt expected before the expert password is sent
    pub pre_password_prompt: String,

    /// Prompt signalling the expert shell is ready
    pub expert_prompt: String,

    /// Block-local expert password; empty means "resolve via fallback chain"
    #[serde(skip)]
    pub password: String,

    /// Commands to run inside expert mode, in order
    pub items: Vec<String>,

    /// Command that leaves expert mode
    pub exit_cmd: String,

    /// Prompt expected after leaving expert mode
    pub exit_prompt: String,
}

impl Default for ExpertBlock {
    fn default() -> Self {
        Self {
            enter_cmd: "expert".to_string(),
            pre_password_prompt: "password:".to_string(),
            expert_prompt: "#".to_string(),
            password: String::new(),
            items: Vec::new(),
            exit_cmd: "exit".to_string(),
            exit_prompt: ">".to_string(),
        }
    }
}

/// One unit of templated work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    /// A run of commands executed at the restricted clish prompt
    Clish { items: Vec<String> },
    /// A timed pause; no transport interaction
    Sleep { seconds: u64 },
    /// A privileged-mode excursion
    Expert(ExpertBlock),
}

impl Block {
    /// Human-readable block kind for log and error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Clish { .. } => "clish",
            Block::Sleep { .. } => "sleep",
            Block::Expert(_) => "expert",
        }
    }
}

/// An ordered sequence of blocks; order is execution order.
///
/// Built once per run by the parser and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Template {
    blocks: Vec<Block>,
}

impl Template {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }
}

impl<'a> IntoIterator for &'a Template {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}
