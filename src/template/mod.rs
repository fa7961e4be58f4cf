//! Template Mini-Language
//!
//! Line-oriented parsing of configuration templates into ordered
//! [`Block`](crate::models::Block) sequences.

pub mod parser;

pub use parser::parse;
