//! Lexical scanning for numeric unit tokens.
//!
//! The scanner is a single alternation regex. Quoted strings, `url(...)` and
//! `var(...)` calls are matched first so the global scan steps over them; the
//! last alternative captures a number followed directly by a known unit.

use crate::error::{Result, UnitError};
use crate::rules::matcher::PatternMatcher;
use regex::{CaptureMatches, Regex};
use std::ops::Range;

/// Units recognized without any configuration.
pub const DEFAULT_UNITS: &[&str] = &[
	"px", "pt", "pc", "cm", "mm", "in", "%", "em", "rem", "ch", "vh", "vw", "vmin", "vmax", "ex",
];

/// The ordered set of unit suffixes eligible for rewriting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitVocabulary {
	units: Vec<String>,
}

impl UnitVocabulary {
	/// Build the vocabulary from the default units plus `custom` entries,
	/// restricted to the units selected by `unit_filter`.
	///
	/// Custom entries must consist only of ASCII letters or `%`; anything else
	/// is dropped.
	pub fn build<S: AsRef<str>>(custom: &[S], unit_filter: &PatternMatcher) -> Self {
		let mut units: Vec<String> = DEFAULT_UNITS.iter().map(|u| u.to_string()).collect();

		for unit in custom.iter().map(AsRef::as_ref) {
			if !is_valid_unit(unit) {
				tracing::warn!(unit, "ignoring invalid custom unit");
				continue;
			}
			if !units.iter().any(|u| u == unit) {
				units.push(unit.to_string());
			}
		}

		units.retain(|unit| unit_filter.matches(unit));

		UnitVocabulary { units }
	}

	pub fn units(&self) -> &[String] {
		&self.units
	}

	pub fn is_empty(&self) -> bool {
		self.units.is_empty()
	}

	pub fn contains(&self, unit: &str) -> bool {
		self.units.iter().any(|u| u == unit)
	}
}

fn is_valid_unit(unit: &str) -> bool {
	!unit.is_empty() && unit.chars().all(|c| c.is_ascii_alphabetic() || c == '%')
}

/// One match of the scanner against an input string.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
	/// A quoted string, `url(...)` or `var(...)` span. Emitted unchanged.
	Skip { text: &'a str, span: Range<usize> },
	/// A number immediately followed by a vocabulary unit.
	Numeric(NumericToken<'a>),
}

impl Token<'_> {
	pub fn span(&self) -> Range<usize> {
		match self {
			Token::Skip { span, .. } => span.clone(),
			Token::Numeric(numeric) => numeric.span.clone(),
		}
	}
}

/// A numeric value with its unit suffix.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericToken<'a> {
	/// The number exactly as written (`12`, `.5`, `3.25`).
	pub number: &'a str,
	pub unit: &'a str,
	pub span: Range<usize>,
}

impl NumericToken<'_> {
	/// The parsed value. Falls back to `0` if the text is not a number.
	pub fn value(&self) -> f64 {
		self.number.parse().unwrap_or(0.0)
	}
}

/// Compiled scanner for one unit vocabulary. Immutable once built.
#[derive(Debug, Clone)]
pub struct NumericTokenScanner {
	regex: Regex,
	vocabulary: UnitVocabulary,
}

impl NumericTokenScanner {
	/// Compile the scanner regex for `vocabulary`.
	pub fn build(vocabulary: UnitVocabulary) -> Result<Self> {
		let mut pattern = String::from(r#""[^"]+"|'[^']+'|url\([^)]+\)|var\([^)]+\)"#);

		// With no units there is nothing to capture, but spans are still skipped.
		if !vocabulary.is_empty() {
			let units = vocabulary
				.units()
				.iter()
				.map(|unit| regex::escape(unit))
				.collect::<Vec<_>>()
				.join("|");
			pattern.push_str(&format!(r"|([0-9]*\.?[0-9]+)({units})"));
		}

		let regex = Regex::new(&pattern).map_err(|source| UnitError::InvalidRegex {
			pattern: pattern.clone(),
			source,
		})?;

		Ok(NumericTokenScanner { regex, vocabulary })
	}

	pub fn vocabulary(&self) -> &UnitVocabulary {
		&self.vocabulary
	}

	/// Scan `value` from its start. Each call returns an independent iterator.
	pub fn tokens<'a>(&'a self, value: &'a str) -> Tokens<'a> {
		Tokens {
			captures: self.regex.captures_iter(value),
		}
	}

	/// Whether `value` holds at least one rewritable token.
	pub fn has_numeric_token(&self, value: &str) -> bool {
		self.tokens(value)
			.any(|token| matches!(token, Token::Numeric(_)))
	}
}

/// Iterator over the tokens of one input string.
pub struct Tokens<'a> {
	captures: CaptureMatches<'a, 'a>,
}

impl<'a> Iterator for Tokens<'a> {
	type Item = Token<'a>;

	fn next(&mut self) -> Option<Self::Item> {
		let caps = self.captures.next()?;
		let whole = caps.get(0)?;

		let token = match (caps.get(1), caps.get(2)) {
			(Some(number), Some(unit)) => Token::Numeric(NumericToken {
				number: number.as_str(),
				unit: unit.as_str(),
				span: whole.range(),
			}),
			_ => Token::Skip {
				text: whole.as_str(),
				span: whole.range(),
			},
		};

		Some(token)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn default_scanner() -> NumericTokenScanner {
		let vocabulary = UnitVocabulary::build::<&str>(&[], &PatternMatcher::match_all());
		NumericTokenScanner::build(vocabulary).unwrap()
	}

	fn numeric<'a>(scanner: &'a NumericTokenScanner, value: &'a str) -> Vec<(&'a str, &'a str)> {
		scanner
			.tokens(value)
			.filter_map(|token| match token {
				Token::Numeric(n) => Some((n.number, n.unit)),
				Token::Skip { .. } => None,
			})
			.collect()
	}

	#[test]
	fn test_vocabulary_defaults() {
		let vocabulary = UnitVocabulary::build::<&str>(&[], &PatternMatcher::match_all());
		assert_eq!(vocabulary.units().len(), DEFAULT_UNITS.len());
		assert!(vocabulary.contains("rem"));
		assert!(vocabulary.contains("%"));
	}

	#[test]
	fn test_vocabulary_filters_custom_units() {
		let vocabulary = UnitVocabulary::build(
			&["custom", "rpx", "px", "", "  ", "1x", "a.b", "fr"],
			&PatternMatcher::match_all(),
		);
		assert!(vocabulary.contains("custom"));
		assert!(vocabulary.contains("rpx"));
		assert!(vocabulary.contains("fr"));
		assert!(!vocabulary.contains("1x"));
		assert!(!vocabulary.contains("a.b"));
		assert!(!vocabulary.contains(""));
		assert_eq!(vocabulary.units().iter().filter(|u| *u == "px").count(), 1);
	}

	#[test]
	fn test_vocabulary_restricted_by_unit_list() {
		let vocabulary =
			UnitVocabulary::build(&["custom"], &PatternMatcher::compile(&["px", "custom"]));
		assert_eq!(vocabulary.units(), &["px".to_string(), "custom".to_string()]);

		let empty = UnitVocabulary::build::<&str>(&[], &PatternMatcher::compile::<&str>(&[]));
		assert!(empty.is_empty());
	}

	#[test]
	fn test_scans_numbers_with_units() {
		let scanner = default_scanner();
		assert_eq!(
			numeric(&scanner, "10px .5em 1.25rem 100%"),
			vec![("10", "px"), (".5", "em"), ("1.25", "rem"), ("100", "%")]
		);
	}

	#[test]
	fn test_unknown_units_and_bare_numbers_are_ignored() {
		let scanner = default_scanner();
		assert!(numeric(&scanner, "1 2fr 300ms").is_empty());
	}

	#[test]
	fn test_skips_quoted_and_function_spans() {
		let scanner = default_scanner();
		let value = r#""10px" '20px' url(img-30px.png) var(--gap-40px) 50px"#;
		assert_eq!(numeric(&scanner, value), vec![("50", "px")]);

		let skipped: Vec<_> = scanner
			.tokens(value)
			.filter_map(|token| match token {
				Token::Skip { text, .. } => Some(text),
				Token::Numeric(_) => None,
			})
			.collect();
		assert_eq!(
			skipped,
			vec![r#""10px""#, "'20px'", "url(img-30px.png)", "var(--gap-40px)"]
		);
	}

	#[test]
	fn test_empty_vocabulary_still_skips_spans() {
		let vocabulary = UnitVocabulary::build::<&str>(&[], &PatternMatcher::compile::<&str>(&[]));
		let scanner = NumericTokenScanner::build(vocabulary).unwrap();
		assert!(!scanner.has_numeric_token("10px"));
		assert_eq!(scanner.tokens("'a' 10px").count(), 1);
	}

	#[test]
	fn test_repeated_scans_start_fresh() {
		let scanner = default_scanner();
		assert!(scanner.has_numeric_token("1px"));
		assert!(scanner.has_numeric_token("1px"));
		assert_eq!(numeric(&scanner, "2px"), vec![("2", "px")]);
	}

	#[test]
	fn test_non_ascii_digits_are_not_numbers() {
		let scanner = default_scanner();
		assert!(numeric(&scanner, "\u{0661}\u{0660}px \u{0968}em").is_empty());
		assert!(!scanner.has_numeric_token("\u{0661}\u{0660}px"));
		assert_eq!(numeric(&scanner, "\u{0661}5px"), vec![("5", "px")]);
	}

	#[test]
	fn test_numeric_token_value() {
		let scanner = default_scanner();
		let values: Vec<f64> = scanner
			.tokens("12px .5em")
			.filter_map(|token| match token {
				Token::Numeric(n) => Some(n.value()),
				Token::Skip { .. } => None,
			})
			.collect();
		assert_eq!(values, vec![12.0, 0.5]);
	}
}
