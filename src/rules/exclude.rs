use crate::error::{Result, UnitError};
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Pattern used when no file exclusion is configured.
pub const DEFAULT_EXCLUDE_PATTERN: &str = "(?i)node_modules";

/// Decides whether a whole document is skipped, based on its path.
#[derive(Clone)]
pub enum ExcludeRule {
	/// Caller-supplied predicate over the path.
	Predicate(Arc<dyn Fn(&Path) -> bool + Send + Sync>),
	/// Path contains this text.
	Contains(String),
	/// Path matches this regex anywhere.
	Pattern(Regex),
}

impl ExcludeRule {
	pub fn predicate<F>(f: F) -> Self
	where
		F: Fn(&Path) -> bool + Send + Sync + 'static,
	{
		ExcludeRule::Predicate(Arc::new(f))
	}

	pub fn pattern(pattern: &str) -> Result<Self> {
		compile_regex(pattern).map(ExcludeRule::Pattern)
	}

	/// The `node_modules` rule applied by default.
	pub fn default_rule() -> Self {
		ExcludeRule::Pattern(
			Regex::new(DEFAULT_EXCLUDE_PATTERN).expect("default exclude pattern is valid"),
		)
	}

	fn is_match(&self, path: &Path) -> bool {
		match self {
			ExcludeRule::Predicate(f) => f(path),
			ExcludeRule::Contains(text) => path.to_string_lossy().contains(text.as_str()),
			ExcludeRule::Pattern(regex) => regex.is_match(&path.to_string_lossy()),
		}
	}
}

impl fmt::Debug for ExcludeRule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ExcludeRule::Predicate(_) => f.write_str("Predicate(..)"),
			ExcludeRule::Contains(text) => f.debug_tuple("Contains").field(text).finish(),
			ExcludeRule::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
		}
	}
}

/// Check if a document should be skipped. A document without a path is
/// never excluded, and neither is any document when no rule is set.
pub fn should_exclude_file(path: Option<&Path>, rule: Option<&ExcludeRule>) -> bool {
	match (path, rule) {
		(Some(path), Some(rule)) => rule.is_match(path),
		_ => false,
	}
}

/// One entry of the selector blacklist.
#[derive(Debug, Clone)]
pub enum SelectorRule {
	/// Selector contains this text.
	Contains(String),
	/// Selector matches this regex anywhere.
	Pattern(Regex),
}

impl SelectorRule {
	pub fn pattern(pattern: &str) -> Result<Self> {
		compile_regex(pattern).map(SelectorRule::Pattern)
	}

	fn is_match(&self, selector: &str) -> bool {
		match self {
			SelectorRule::Contains(text) => selector.contains(text.as_str()),
			SelectorRule::Pattern(regex) => regex.is_match(selector),
		}
	}
}

/// Check if `selector` hits any blacklist entry. Nodes without a selector
/// are never blacklisted.
pub fn is_blacklisted_selector(selector: Option<&str>, blacklist: &[SelectorRule]) -> bool {
	selector.is_some_and(|selector| blacklist.iter().any(|rule| rule.is_match(selector)))
}

fn compile_regex(pattern: &str) -> Result<Regex> {
	Regex::new(pattern).map_err(|source| UnitError::InvalidRegex {
		pattern: pattern.to_string(),
		source,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_rule_excludes_node_modules() {
		let rule = ExcludeRule::default_rule();
		assert!(should_exclude_file(
			Some(Path::new("/app/node_modules/lib/a.css")),
			Some(&rule)
		));
		assert!(should_exclude_file(
			Some(Path::new("/app/Node_Modules/a.css")),
			Some(&rule)
		));
		assert!(!should_exclude_file(Some(Path::new("/app/src/a.css")), Some(&rule)));
	}

	#[test]
	fn test_missing_path_never_excludes() {
		let rule = ExcludeRule::predicate(|_| true);
		assert!(!should_exclude_file(None, Some(&rule)));
		assert!(!should_exclude_file(None, Some(&ExcludeRule::default_rule())));
	}

	#[test]
	fn test_no_rule_never_excludes() {
		assert!(!should_exclude_file(Some(Path::new("/app/node_modules/a.css")), None));
	}

	#[test]
	fn test_contains_and_predicate_rules() {
		let contains = ExcludeRule::Contains("vendor".into());
		assert!(should_exclude_file(Some(Path::new("/a/vendor/b.css")), Some(&contains)));
		assert!(!should_exclude_file(Some(Path::new("/a/src/b.css")), Some(&contains)));

		let predicate = ExcludeRule::predicate(|path| path.extension().is_some_and(|e| e == "scss"));
		assert!(should_exclude_file(Some(Path::new("a.scss")), Some(&predicate)));
		assert!(!should_exclude_file(Some(Path::new("a.css")), Some(&predicate)));
	}

	#[test]
	fn test_invalid_pattern() {
		match ExcludeRule::pattern("[invalid").unwrap_err() {
			UnitError::InvalidRegex { pattern, .. } => assert_eq!(pattern, "[invalid"),
			other => panic!("Expected InvalidRegex error, got {other:?}"),
		}
	}

	#[test]
	fn test_selector_blacklist() {
		let blacklist = vec![
			SelectorRule::Contains(".ignore".into()),
			SelectorRule::pattern("^body$").unwrap(),
		];
		assert!(is_blacklisted_selector(Some(".ignore-me a"), &blacklist));
		assert!(is_blacklisted_selector(Some("body"), &blacklist));
		assert!(!is_blacklisted_selector(Some("body .x"), &blacklist));
		assert!(!is_blacklisted_selector(None, &blacklist));
		assert!(!is_blacklisted_selector(Some(".ignore"), &[]));
	}
}
