//! Include/exclude name filtering from glob-like pattern lists.

/// The syntactic shape of a single pattern string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
	/// `*` on its own.
	Wildcard,
	/// `foo`
	Exact(String),
	/// `*foo*`
	Contain(String),
	/// `foo*`
	StartWith(String),
	/// `*foo`
	EndWith(String),
	/// `!foo`
	NotExact(String),
	/// `!*foo*`
	NotContain(String),
	/// `!foo*`
	NotStartWith(String),
	/// `!*foo`
	NotEndWith(String),
}

impl Pattern {
	/// Classify a raw pattern string. Returns `None` for strings that fit no
	/// shape (empty, a bare `!`, or a `*` in the middle of the text).
	pub fn classify(raw: &str) -> Option<Self> {
		if raw == "*" {
			return Some(Pattern::Wildcard);
		}

		if let Some(rest) = raw.strip_prefix('!') {
			return match split_stars(rest) {
				(true, Some(inner), true) if !inner.is_empty() => {
					Some(Pattern::NotContain(inner.to_string()))
				}
				(true, Some(inner), false) if !inner.is_empty() => {
					Some(Pattern::NotEndWith(inner.to_string()))
				}
				(false, Some(inner), true) if !inner.is_empty() => {
					Some(Pattern::NotStartWith(inner.to_string()))
				}
				(false, Some(inner), false) if !inner.is_empty() => {
					Some(Pattern::NotExact(inner.to_string()))
				}
				_ => None,
			};
		}

		match split_stars(raw) {
			(true, Some(inner), true) if !inner.is_empty() => Some(Pattern::Contain(inner.to_string())),
			(true, Some(inner), false) if !inner.is_empty() => Some(Pattern::EndWith(inner.to_string())),
			(false, Some(inner), true) if !inner.is_empty() && !inner.contains('!') => {
				Some(Pattern::StartWith(inner.to_string()))
			}
			(false, Some(inner), false) if !inner.is_empty() && !inner.contains('!') => {
				Some(Pattern::Exact(inner.to_string()))
			}
			_ => None,
		}
	}
}

/// Split off a leading and trailing `*`. The middle is `None` when it still
/// contains a `*`.
fn split_stars(raw: &str) -> (bool, Option<&str>, bool) {
	let (leading, rest) = match raw.strip_prefix('*') {
		Some(rest) => (true, rest),
		None => (false, raw),
	};
	let (inner, trailing) = match rest.strip_suffix('*') {
		Some(inner) => (inner, true),
		None => (rest, false),
	};

	if inner.contains('*') {
		(leading, None, trailing)
	} else {
		(leading, Some(inner), trailing)
	}
}

/// A compiled membership predicate over names (property names or unit names).
#[derive(Debug, Clone, Default)]
pub struct PatternMatcher {
	match_all: bool,
	has_wildcard: bool,
	exact: Vec<String>,
	contain: Vec<String>,
	start_with: Vec<String>,
	end_with: Vec<String>,
	not_exact: Vec<String>,
	not_contain: Vec<String>,
	not_start_with: Vec<String>,
	not_end_with: Vec<String>,
}

impl PatternMatcher {
	/// Compile a pattern list. Entries that fit no shape are ignored.
	pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Self {
		let mut matcher = PatternMatcher::default();

		for raw in patterns {
			match Pattern::classify(raw.as_ref()) {
				Some(Pattern::Wildcard) => matcher.has_wildcard = true,
				Some(Pattern::Exact(s)) => matcher.exact.push(s),
				Some(Pattern::Contain(s)) => matcher.contain.push(s),
				Some(Pattern::StartWith(s)) => matcher.start_with.push(s),
				Some(Pattern::EndWith(s)) => matcher.end_with.push(s),
				Some(Pattern::NotExact(s)) => matcher.not_exact.push(s),
				Some(Pattern::NotContain(s)) => matcher.not_contain.push(s),
				Some(Pattern::NotStartWith(s)) => matcher.not_start_with.push(s),
				Some(Pattern::NotEndWith(s)) => matcher.not_end_with.push(s),
				None => tracing::trace!(pattern = raw.as_ref(), "ignoring unrecognized pattern"),
			}
		}

		// A lone `*` short-circuits before any veto is looked at.
		matcher.match_all = matcher.has_wildcard && patterns.len() == 1;
		matcher
	}

	/// A matcher equivalent to `["*"]`.
	pub fn match_all() -> Self {
		Self::compile(&["*"])
	}

	/// Check whether `name` is selected by this pattern list.
	pub fn matches(&self, name: &str) -> bool {
		if self.match_all {
			return true;
		}

		let included = self.has_wildcard
			|| self.exact.iter().any(|m| m == name)
			|| self.contain.iter().any(|m| name.contains(m.as_str()))
			|| self.start_with.iter().any(|m| name.starts_with(m.as_str()))
			|| self.end_with.iter().any(|m| name.ends_with(m.as_str()));

		let excluded = self.not_exact.iter().any(|m| m == name)
			|| self.not_contain.iter().any(|m| name.contains(m.as_str()))
			|| self.not_start_with.iter().any(|m| name.starts_with(m.as_str()))
			|| self.not_end_with.iter().any(|m| name.ends_with(m.as_str()));

		included && !excluded
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_classify_shapes() {
		assert_eq!(Pattern::classify("*"), Some(Pattern::Wildcard));
		assert_eq!(Pattern::classify("width"), Some(Pattern::Exact("width".into())));
		assert_eq!(Pattern::classify("*pad*"), Some(Pattern::Contain("pad".into())));
		assert_eq!(Pattern::classify("margin*"), Some(Pattern::StartWith("margin".into())));
		assert_eq!(Pattern::classify("*width"), Some(Pattern::EndWith("width".into())));
		assert_eq!(Pattern::classify("!height"), Some(Pattern::NotExact("height".into())));
		assert_eq!(Pattern::classify("!*pad*"), Some(Pattern::NotContain("pad".into())));
		assert_eq!(Pattern::classify("!border*"), Some(Pattern::NotStartWith("border".into())));
		assert_eq!(Pattern::classify("!*radius"), Some(Pattern::NotEndWith("radius".into())));
	}

	#[test]
	fn test_classify_rejects_malformed() {
		assert_eq!(Pattern::classify(""), None);
		assert_eq!(Pattern::classify("!"), None);
		assert_eq!(Pattern::classify("!*"), None);
		assert_eq!(Pattern::classify("**"), None);
		assert_eq!(Pattern::classify("a*b"), None);
		assert_eq!(Pattern::classify("a!b"), None);
	}

	#[test]
	fn test_lone_wildcard_matches_everything() {
		let matcher = PatternMatcher::compile(&["*"]);
		assert!(matcher.matches("width"));
		assert!(matcher.matches(""));
		assert!(matcher.matches("--custom-prop"));
	}

	#[test]
	fn test_empty_list_matches_nothing() {
		let matcher = PatternMatcher::compile::<&str>(&[]);
		assert!(!matcher.matches("width"));
		assert!(!matcher.matches("px"));
	}

	#[test]
	fn test_wildcard_with_veto() {
		let matcher = PatternMatcher::compile(&["*", "!x"]);
		assert!(!matcher.matches("x"));
		assert!(matcher.matches("y"));
		assert!(matcher.matches("xx"));
	}

	#[test]
	fn test_exact_and_partial_includes() {
		let matcher = PatternMatcher::compile(&["width", "*pad*", "margin*", "*-top"]);
		assert!(matcher.matches("width"));
		assert!(!matcher.matches("min-width"));
		assert!(matcher.matches("padding-left"));
		assert!(matcher.matches("margin-left"));
		assert!(matcher.matches("border-top"));
		assert!(!matcher.matches("height"));
	}

	#[test]
	fn test_negations_veto_includes() {
		let matcher = PatternMatcher::compile(&["*", "!*pad*", "!border*", "!*radius", "!height"]);
		assert!(matcher.matches("width"));
		assert!(!matcher.matches("padding"));
		assert!(!matcher.matches("border-width"));
		assert!(!matcher.matches("outline-radius"));
		assert!(!matcher.matches("height"));
		assert!(matcher.matches("line-height"));
	}

	#[test]
	fn test_end_with_uses_real_suffix() {
		let matcher = PatternMatcher::compile(&["*ab"]);
		assert!(matcher.matches("abab"));
		assert!(!matcher.matches("a"));
	}

	#[test]
	fn test_matches_is_deterministic() {
		let matcher = PatternMatcher::compile(&["font*", "!font-weight"]);
		for _ in 0..3 {
			assert!(matcher.matches("font-size"));
			assert!(!matcher.matches("font-weight"));
		}
	}
}
