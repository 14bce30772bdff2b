//! Filtering and rewriting rules.
//!
//! This module handles:
//! - Include/exclude pattern lists for property and unit names
//! - Scanning values for numeric unit tokens
//! - Rewriting those tokens through a processor
//! - File and selector exclusion

pub mod exclude;
pub mod matcher;
pub mod rewriter;
pub mod scanner;

pub use exclude::{ExcludeRule, SelectorRule, is_blacklisted_selector, should_exclude_file};
pub use matcher::{Pattern, PatternMatcher};
pub use rewriter::{
	Identity, NodeContext, NodeKind, Processor, ProcessorError, Scalar, TokenRewriter,
	TransformResult, ZeroUnit, from_fn, round_to_precision, try_from_fn,
};
pub use scanner::{DEFAULT_UNITS, NumericToken, NumericTokenScanner, Token, UnitVocabulary};
