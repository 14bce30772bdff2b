use crate::error::{Result, UnitError};
use crate::rules::scanner::{NumericToken, NumericTokenScanner, Token};
use serde::Deserialize;
use std::path::Path;

/// Error type a fallible processor may return.
pub type ProcessorError = Box<dyn std::error::Error + Send + Sync>;

/// What kind of node a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind<'a> {
	/// A declaration value, with its property name.
	Declaration { prop: &'a str },
	/// At-rule parameters, with the at-rule name (without `@`).
	AtRule { name: &'a str },
	/// A bare value with no surrounding node.
	Value,
}

/// The node and document a token was found in, handed to the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeContext<'a> {
	pub kind: NodeKind<'a>,

	/// Selector of the enclosing rule, if the node sits directly inside one.
	pub selector: Option<&'a str>,

	/// Path of the document being processed.
	pub file: Option<&'a Path>,
}

impl NodeContext<'_> {
	/// Context for a value that is not attached to any node.
	pub fn detached() -> Self {
		NodeContext {
			kind: NodeKind::Value,
			selector: None,
			file: None,
		}
	}
}

/// The value inside a shaped processor result.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
	Number(f64),
	Text(String),
}

impl Scalar {
	fn to_number(&self) -> f64 {
		match self {
			Scalar::Number(n) => *n,
			Scalar::Text(text) => parse_float(text),
		}
	}
}

/// What a processor returns for one token.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformResult {
	/// A new value; the unit is kept.
	Number(f64),
	/// A numeric string; its leading number is the new value, the unit is kept.
	Text(String),
	/// A new value and optionally a new unit.
	Shaped {
		value: Option<Scalar>,
		unit: Option<String>,
	},
	/// Leave the token as it was.
	Unrecognized,
}

impl TransformResult {
	pub fn shaped(value: f64, unit: impl Into<String>) -> Self {
		TransformResult::Shaped {
			value: Some(Scalar::Number(value)),
			unit: Some(unit.into()),
		}
	}

	/// Resolve this result against the token it replaces.
	pub fn normalize(&self, value: f64, unit: &str) -> (f64, String) {
		match self {
			TransformResult::Number(n) => (or_zero(*n), unit.to_string()),
			TransformResult::Text(text) => (or_zero(parse_float(text)), unit.to_string()),
			TransformResult::Shaped {
				value: new_value,
				unit: new_unit,
			} => {
				let number = new_value.as_ref().map(Scalar::to_number).map_or(0.0, or_zero);
				let unit = match new_unit {
					Some(u) if !u.is_empty() => u.clone(),
					_ => unit.to_string(),
				};
				(number, unit)
			}
			TransformResult::Unrecognized => (value, unit.to_string()),
		}
	}
}

impl From<f64> for TransformResult {
	fn from(value: f64) -> Self {
		TransformResult::Number(value)
	}
}

impl From<&str> for TransformResult {
	fn from(value: &str) -> Self {
		TransformResult::Text(value.to_string())
	}
}

impl From<String> for TransformResult {
	fn from(value: String) -> Self {
		TransformResult::Text(value)
	}
}

impl From<Option<f64>> for TransformResult {
	fn from(value: Option<f64>) -> Self {
		value.map_or(TransformResult::Unrecognized, TransformResult::Number)
	}
}

/// NaN and zero both collapse to zero.
fn or_zero(n: f64) -> f64 {
	if n.is_nan() || n == 0.0 { 0.0 } else { n }
}

/// Parse the leading number of `text` the way lenient string-to-number
/// conversions do: leading whitespace is skipped, trailing garbage is ignored,
/// and no number at all yields NaN.
pub fn parse_float(text: &str) -> f64 {
	let s = text.trim_start();
	let bytes = s.as_bytes();
	let mut end = 0;

	if matches!(bytes.first(), Some(b'+' | b'-')) {
		end = 1;
	}

	if s[end..].starts_with("Infinity") {
		return if s.starts_with('-') {
			f64::NEG_INFINITY
		} else {
			f64::INFINITY
		};
	}

	let int_start = end;
	while end < bytes.len() && bytes[end].is_ascii_digit() {
		end += 1;
	}
	let mut digits = end - int_start;

	if end < bytes.len() && bytes[end] == b'.' {
		let frac_start = end + 1;
		let mut frac_end = frac_start;
		while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
			frac_end += 1;
		}
		if digits > 0 || frac_end > frac_start {
			digits += frac_end - frac_start;
			end = frac_end;
		}
	}

	if digits == 0 {
		return f64::NAN;
	}

	if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
		let mut exp_end = end + 1;
		if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
			exp_end += 1;
		}
		let exp_digits = exp_end;
		while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
			exp_end += 1;
		}
		if exp_end > exp_digits {
			end = exp_end;
		}
	}

	s[..end].parse().unwrap_or(f64::NAN)
}

/// Callback that decides the replacement for each numeric token.
pub trait Processor: Send + Sync {
	fn process(
		&self,
		value: f64,
		unit: &str,
		node: &NodeContext<'_>,
	) -> std::result::Result<TransformResult, ProcessorError>;
}

/// Returns every token unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Processor for Identity {
	fn process(
		&self,
		value: f64,
		_unit: &str,
		_node: &NodeContext<'_>,
	) -> std::result::Result<TransformResult, ProcessorError> {
		Ok(TransformResult::Number(value))
	}
}

/// Processor backed by an infallible closure. See [`from_fn`].
pub struct FnProcessor<F>(F);

impl<F> Processor for FnProcessor<F>
where
	F: Fn(f64, &str, &NodeContext<'_>) -> TransformResult + Send + Sync,
{
	fn process(
		&self,
		value: f64,
		unit: &str,
		node: &NodeContext<'_>,
	) -> std::result::Result<TransformResult, ProcessorError> {
		Ok((self.0)(value, unit, node))
	}
}

/// Processor backed by a fallible closure. See [`try_from_fn`].
pub struct TryFnProcessor<F>(F);

impl<F> Processor for TryFnProcessor<F>
where
	F: Fn(f64, &str, &NodeContext<'_>) -> std::result::Result<TransformResult, ProcessorError>
		+ Send
		+ Sync,
{
	fn process(
		&self,
		value: f64,
		unit: &str,
		node: &NodeContext<'_>,
	) -> std::result::Result<TransformResult, ProcessorError> {
		(self.0)(value, unit, node)
	}
}

/// Wrap a closure as a processor.
pub fn from_fn<F>(f: F) -> FnProcessor<F>
where
	F: Fn(f64, &str, &NodeContext<'_>) -> TransformResult + Send + Sync,
{
	FnProcessor(f)
}

/// Wrap a fallible closure as a processor. An error aborts the rewrite.
pub fn try_from_fn<F>(f: F) -> TryFnProcessor<F>
where
	F: Fn(f64, &str, &NodeContext<'_>) -> std::result::Result<TransformResult, ProcessorError>
		+ Send
		+ Sync,
{
	TryFnProcessor(f)
}

/// How a value that rounds to zero is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroUnit {
	/// `0px` becomes `0`.
	#[default]
	Drop,
	/// `0px` stays `0px`.
	Keep,
}

/// Precision beyond which `10^(precision + 1)` is no longer finite.
const MAX_PRECISION: u32 = 308;

/// Round to `precision` fractional digits.
///
/// The value is first truncated (floored) at one extra digit, then that digit
/// is rounded half-up. Negative values therefore round towards positive
/// infinity on ties, and truncation can shave values just under a tie.
/// Values too large to shift are returned unchanged.
pub fn round_to_precision(number: f64, precision: u32) -> f64 {
	let multiplier = 10f64.powi(precision.min(MAX_PRECISION) as i32 + 1);
	let whole = (number * multiplier).floor();
	let rounded = ((whole / 10.0) + 0.5).floor() * 10.0 / multiplier;

	if rounded.is_finite() { rounded } else { number }
}

/// Serialize a rounded value and its unit.
pub fn format_value(number: f64, unit: &str, zero_unit: ZeroUnit) -> String {
	if number == 0.0 {
		return match zero_unit {
			ZeroUnit::Drop => "0".to_string(),
			ZeroUnit::Keep => format!("0{unit}"),
		};
	}

	format!("{number}{unit}")
}

/// Applies a processor to every eligible token of a value string.
#[derive(Debug, Clone)]
pub struct TokenRewriter {
	scanner: NumericTokenScanner,
	precision: u32,
	zero_unit: ZeroUnit,
}

impl TokenRewriter {
	pub fn new(scanner: NumericTokenScanner, precision: u32, zero_unit: ZeroUnit) -> Self {
		TokenRewriter {
			scanner,
			precision,
			zero_unit,
		}
	}

	pub fn scanner(&self) -> &NumericTokenScanner {
		&self.scanner
	}

	/// Rewrite `value`, leaving everything but numeric tokens as written.
	pub fn rewrite(
		&self,
		value: &str,
		processor: &dyn Processor,
		node: &NodeContext<'_>,
	) -> Result<String> {
		let mut output = String::with_capacity(value.len());
		let mut last = 0;

		for token in self.scanner.tokens(value) {
			let span = token.span();
			output.push_str(&value[last..span.start]);

			match token {
				Token::Skip { text, .. } => output.push_str(text),
				Token::Numeric(numeric) => {
					output.push_str(&self.rewrite_token(&numeric, processor, node)?);
				}
			}

			last = span.end;
		}

		output.push_str(&value[last..]);
		Ok(output)
	}

	fn rewrite_token(
		&self,
		token: &NumericToken<'_>,
		processor: &dyn Processor,
		node: &NodeContext<'_>,
	) -> Result<String> {
		let value = token.value();
		let result =
			processor
				.process(value, token.unit, node)
				.map_err(|source| UnitError::ProcessorFailed {
					value,
					unit: token.unit.to_string(),
					source,
				})?;

		let (number, unit) = result.normalize(value, token.unit);
		if !number.is_finite() {
			tracing::warn!(value, unit = token.unit, "processor returned a non-finite value");
			return Ok(format_value(
				round_to_precision(value, self.precision),
				token.unit,
				self.zero_unit,
			));
		}

		Ok(format_value(
			round_to_precision(number, self.precision),
			&unit,
			self.zero_unit,
		))
	}
}
