//! Applying the rewrite rules to a whole stylesheet.
//!
//! This module handles:
//! - Compiling options into an immutable, shareable engine
//! - Gating each declaration and at-rule on file, property and selector rules
//! - Writing results back in place or as a sibling copy

pub mod builtin;
pub mod context;

pub use builtin::ScaleProcessor;
pub use context::{PassContext, ProcessReport};

use crate::error::Result;
use crate::rules::exclude::{
	ExcludeRule, SelectorRule, is_blacklisted_selector, should_exclude_file,
};
use crate::rules::matcher::PatternMatcher;
use crate::rules::rewriter::{Identity, NodeContext, NodeKind, Processor, TokenRewriter, ZeroUnit};
use crate::rules::scanner::{NumericTokenScanner, UnitVocabulary};
use crate::stylesheet::{AtRule, Declaration, IdAllocator, Node, NodeData, NodeId, Stylesheet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// The only at-rule whose parameters are rewritten.
pub const MEDIA_AT_RULE: &str = "media";

/// Engine configuration.
#[derive(Clone)]
pub struct Options {
	/// Called for every eligible numeric token.
	pub processor: Arc<dyn Processor>,

	/// Fractional digits kept after rewriting.
	pub unit_precision: u32,

	/// Declarations under a matching selector are skipped.
	pub selector_black_list: Vec<SelectorRule>,

	/// Property names to process.
	pub prop_list: Vec<String>,

	/// Unit names to process.
	pub unit_list: Vec<String>,

	/// Units recognized in addition to the defaults.
	pub custom_unit_list: Vec<String>,

	/// Rewrite in place, or append a rewritten copy after the original.
	pub replace: bool,

	/// Rewrite `@media` parameters.
	pub media_query: bool,

	/// Documents whose path matches are skipped entirely.
	pub exclude: Option<ExcludeRule>,

	/// How values that round to zero are written.
	pub zero_unit: ZeroUnit,
}

impl Default for Options {
	fn default() -> Self {
		Options {
			processor: Arc::new(Identity),
			unit_precision: 5,
			selector_black_list: Vec::new(),
			prop_list: vec!["*".to_string()],
			unit_list: vec!["*".to_string()],
			custom_unit_list: Vec::new(),
			replace: true,
			media_query: false,
			exclude: Some(ExcludeRule::default_rule()),
			zero_unit: ZeroUnit::default(),
		}
	}
}

impl Options {
	pub fn with_processor(mut self, processor: impl Processor + 'static) -> Self {
		self.processor = Arc::new(processor);
		self
	}
}

impl fmt::Debug for Options {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Options")
			.field("unit_precision", &self.unit_precision)
			.field("selector_black_list", &self.selector_black_list)
			.field("prop_list", &self.prop_list)
			.field("unit_list", &self.unit_list)
			.field("custom_unit_list", &self.custom_unit_list)
			.field("replace", &self.replace)
			.field("media_query", &self.media_query)
			.field("exclude", &self.exclude)
			.field("zero_unit", &self.zero_unit)
			.finish_non_exhaustive()
	}
}

/// Compiled options. Immutable after construction and safe to share between
/// threads; every [`Engine::process`] call keeps its own pass state.
pub struct Engine {
	processor: Arc<dyn Processor>,
	rewriter: TokenRewriter,
	props: PatternMatcher,
	selector_black_list: Vec<SelectorRule>,
	exclude: Option<ExcludeRule>,
	replace: bool,
	media_query: bool,
}

impl Engine {
	/// Compile the pattern lists and the token scanner.
	pub fn new(options: Options) -> Result<Self> {
		let units = PatternMatcher::compile(&options.unit_list);
		let vocabulary = UnitVocabulary::build(&options.custom_unit_list, &units);
		if vocabulary.is_empty() {
			tracing::debug!("unit vocabulary is empty; no values will be rewritten");
		}

		let scanner = NumericTokenScanner::build(vocabulary)?;

		Ok(Engine {
			processor: options.processor,
			rewriter: TokenRewriter::new(scanner, options.unit_precision, options.zero_unit),
			props: PatternMatcher::compile(&options.prop_list),
			selector_black_list: options.selector_black_list,
			exclude: options.exclude,
			replace: options.replace,
			media_query: options.media_query,
		})
	}

	/// Rewrite a single value string, for hosts that keep their own tree.
	pub fn rewrite_value(&self, value: &str, node: &NodeContext<'_>) -> Result<String> {
		self.rewriter.rewrite(value, self.processor.as_ref(), node)
	}

	/// Whether declarations of `prop` are eligible.
	pub fn is_prop_selected(&self, prop: &str) -> bool {
		self.props.matches(prop)
	}

	/// Whether a document at `file` would be skipped.
	pub fn is_file_excluded(&self, file: Option<&Path>) -> bool {
		should_exclude_file(file, self.exclude.as_ref())
	}

	/// Run one pass over `sheet`.
	pub fn process(&self, sheet: &mut Stylesheet, file: Option<&Path>) -> Result<ProcessReport> {
		let mut pass = PassContext::new(file, self.is_file_excluded(file));

		if pass.is_excluded() {
			tracing::debug!(file = ?file, "file excluded");
			return Ok(pass.into_report());
		}

		let (nodes, ids) = sheet.parts_mut();
		self.walk(nodes, None, ids, &mut pass)?;

		Ok(pass.into_report())
	}

	fn walk(
		&self,
		nodes: &mut Vec<Node>,
		selector: Option<&str>,
		ids: &mut IdAllocator,
		pass: &mut PassContext<'_>,
	) -> Result<()> {
		let mut index = 0;

		while index < nodes.len() {
			let id = nodes[index].id;

			match &mut nodes[index].data {
				NodeData::Declaration(decl) => {
					if let Some(copy) = self.visit_declaration(id, decl, selector, pass)? {
						let copy_id = ids.next_id();
						pass.mark(copy_id);
						let before = nodes[index].before.clone();
						nodes.insert(
							index + 1,
							Node {
								id: copy_id,
								before,
								data: NodeData::Declaration(copy),
							},
						);
					}
				}
				NodeData::Rule(rule) => {
					self.walk(&mut rule.block.children, Some(rule.selector.as_str()), ids, pass)?;
				}
				NodeData::AtRule(at_rule) => {
					self.visit_at_rule(id, at_rule, pass)?;
					if let Some(block) = &mut at_rule.block {
						self.walk(&mut block.children, None, ids, pass)?;
					}
				}
				NodeData::Comment(_) => {}
			}

			index += 1;
		}

		Ok(())
	}

	/// Rewrite one declaration. Returns the copy to insert after it when not
	/// replacing in place.
	///
	/// The processed marker is checked before the value is rewritten, so the
	/// processor is never called for a node already handled in this pass
	/// (such as the copy appended when not replacing).
	fn visit_declaration(
		&self,
		id: NodeId,
		decl: &mut Declaration,
		selector: Option<&str>,
		pass: &mut PassContext<'_>,
	) -> Result<Option<Declaration>> {
		if pass.is_processed(id) {
			tracing::trace!(prop = %decl.prop, "already processed");
			return Ok(None);
		}

		if !self.rewriter.scanner().has_numeric_token(&decl.value) {
			return Ok(None);
		}

		if !self.props.matches(&decl.prop) {
			tracing::trace!(prop = %decl.prop, "property not selected");
			return Ok(None);
		}

		if is_blacklisted_selector(selector, &self.selector_black_list) {
			tracing::trace!(prop = %decl.prop, selector = ?selector, "selector blacklisted");
			return Ok(None);
		}

		let node = NodeContext {
			kind: NodeKind::Declaration { prop: &decl.prop },
			selector,
			file: pass.file(),
		};
		let value = self.rewrite_value(&decl.value, &node)?;
		tracing::debug!(prop = %decl.prop, from = %decl.value, to = %value, "rewrote declaration");

		pass.mark(id);

		if self.replace {
			decl.value = value;
			pass.report_mut().declarations_rewritten += 1;
			return Ok(None);
		}

		let mut copy = decl.clone();
		copy.value = value;
		// The original is no longer last, so it needs a terminator.
		if !decl.semicolon {
			decl.trailing.clear();
			decl.semicolon = true;
		}
		pass.report_mut().declarations_cloned += 1;

		Ok(Some(copy))
	}

	fn visit_at_rule(&self, id: NodeId, at_rule: &mut AtRule, pass: &mut PassContext<'_>) -> Result<()> {
		if !self.media_query || at_rule.name != MEDIA_AT_RULE || pass.is_processed(id) {
			return Ok(());
		}

		if !self.rewriter.scanner().has_numeric_token(&at_rule.params) {
			return Ok(());
		}

		let node = NodeContext {
			kind: NodeKind::AtRule {
				name: &at_rule.name,
			},
			selector: None,
			file: pass.file(),
		};
		let params = self.rewrite_value(&at_rule.params, &node)?;
		tracing::debug!(name = %at_rule.name, from = %at_rule.params, to = %params, "rewrote at-rule");

		pass.mark(id);
		at_rule.params = params;
		pass.report_mut().at_rules_rewritten += 1;

		Ok(())
	}
}
