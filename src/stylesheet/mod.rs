//! A minimal, lossless stylesheet tree.
//!
//! This module handles:
//! - Splitting stylesheet text into rules, at-rules, declarations and comments
//! - Preserving every byte of whitespace so untouched input prints back as-is
//! - Stable node ids for tracking which nodes a pass has already rewritten

pub mod parser;
pub mod types;

pub use parser::parse_stylesheet;
pub use types::{
	AtRule, Block, Declaration, IdAllocator, Node, NodeData, NodeId, StyleRule, Stylesheet,
};

impl Stylesheet {
	/// Parse stylesheet text. See [`parse_stylesheet`].
	pub fn parse(input: &str) -> crate::Result<Self> {
		parse_stylesheet(input)
	}
}
