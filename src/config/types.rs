use crate::engine::{Options, ScaleProcessor};
use crate::error::Result;
use crate::rules::exclude::{ExcludeRule, SelectorRule};
use crate::rules::rewriter::{Identity, Processor, ZeroUnit};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level configuration from a `.unitproc.toml` file.
///
/// Every key is optional; missing keys take the engine defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
	/// Fractional digits kept after rewriting.
	pub unit_precision: Option<u32>,

	/// Selectors whose declarations are skipped.
	#[serde(default)]
	pub selector_black_list: Vec<SelectorEntry>,

	/// Property name patterns. Kept raw so malformed lists can fall back.
	pub prop_list: Option<toml::Value>,

	/// Unit name patterns. Kept raw so malformed lists can fall back.
	pub unit_list: Option<toml::Value>,

	/// Extra units. Kept raw so malformed lists can fall back.
	pub custom_unit_list: Option<toml::Value>,

	/// Rewrite in place (true) or add a rewritten copy (false).
	pub replace: Option<bool>,

	/// Rewrite `@media` parameters.
	pub media_query: Option<bool>,

	/// File exclusion: a substring, `{ regex = "..." }`, or `false`.
	pub exclude: Option<ExcludeSetting>,

	/// `"drop"` writes zero as `0`, `"keep"` writes `0px`.
	pub zero_unit: Option<ZeroUnit>,

	/// Built-in processor applied to every token.
	#[serde(default)]
	pub processor: ProcessorConfig,
}

/// One selector blacklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SelectorEntry {
	Contains(String),
	Pattern { regex: String },
}

/// The `exclude` key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ExcludeSetting {
	/// `true` keeps the default rule, `false` disables exclusion.
	Enabled(bool),
	Contains(String),
	Pattern { regex: String },
}

/// The `[processor]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProcessorConfig {
	/// Leave values as they are (only precision and zero handling apply).
	#[default]
	Identity,
	/// Multiply values of `units` (all units if empty) by `factor`, writing
	/// them with unit `to` if given.
	Scale {
		factor: f64,
		#[serde(default)]
		units: Vec<String>,
		to: Option<String>,
	},
}

/// A loaded configuration with its source path for debugging/display.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
	/// The parsed configuration.
	pub config: Config,

	/// The path this config was loaded from.
	pub path: PathBuf,
}

impl Config {
	/// Check that the config compiles into engine options.
	pub fn validate(&self) -> Result<()> {
		self.to_options().map(|_| ())
	}

	/// Build engine options. Malformed lists fall back to their defaults;
	/// invalid regexes are errors.
	pub fn to_options(&self) -> Result<Options> {
		let defaults = Options::default();

		let selector_black_list = self
			.selector_black_list
			.iter()
			.map(|entry| match entry {
				SelectorEntry::Contains(text) => Ok(SelectorRule::Contains(text.clone())),
				SelectorEntry::Pattern { regex } => SelectorRule::pattern(regex),
			})
			.collect::<Result<Vec<_>>>()?;

		let exclude = match &self.exclude {
			None | Some(ExcludeSetting::Enabled(true)) => defaults.exclude.clone(),
			Some(ExcludeSetting::Enabled(false)) => None,
			Some(ExcludeSetting::Contains(text)) => Some(ExcludeRule::Contains(text.clone())),
			Some(ExcludeSetting::Pattern { regex }) => Some(ExcludeRule::pattern(regex)?),
		};

		let processor: Arc<dyn Processor> = match &self.processor {
			ProcessorConfig::Identity => Arc::new(Identity),
			ProcessorConfig::Scale { factor, units, to } => Arc::new(ScaleProcessor {
				factor: *factor,
				units: units.clone(),
				to: to.clone(),
			}),
		};

		Ok(Options {
			processor,
			unit_precision: self.unit_precision.unwrap_or(defaults.unit_precision),
			selector_black_list,
			prop_list: string_list("prop-list", self.prop_list.as_ref(), &defaults.prop_list),
			unit_list: string_list("unit-list", self.unit_list.as_ref(), &defaults.unit_list),
			custom_unit_list: string_list(
				"custom-unit-list",
				self.custom_unit_list.as_ref(),
				&defaults.custom_unit_list,
			),
			replace: self.replace.unwrap_or(defaults.replace),
			media_query: self.media_query.unwrap_or(defaults.media_query),
			exclude,
			zero_unit: self.zero_unit.unwrap_or(defaults.zero_unit),
		})
	}
}

/// Read a list of strings, dropping non-string entries. Anything other than
/// an array yields `default`.
fn string_list(key: &str, value: Option<&toml::Value>, default: &[String]) -> Vec<String> {
	match value {
		None => default.to_vec(),
		Some(toml::Value::Array(items)) => items
			.iter()
			.filter_map(|item| match item {
				toml::Value::String(s) => Some(s.clone()),
				other => {
					tracing::warn!(key, entry = %other, "ignoring non-string list entry");
					None
				}
			})
			.collect(),
		Some(other) => {
			tracing::warn!(key, value = %other, "expected an array; using the default");
			default.to_vec()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_string_list_fallbacks() {
		let default = vec!["*".to_string()];

		assert_eq!(string_list("k", None, &default), default);
		assert_eq!(
			string_list("k", Some(&toml::Value::String("width".into())), &default),
			default
		);

		let mixed = toml::Value::Array(vec![
			toml::Value::String("width".into()),
			toml::Value::Integer(3),
			toml::Value::String("!height".into()),
		]);
		assert_eq!(
			string_list("k", Some(&mixed), &default),
			vec!["width".to_string(), "!height".to_string()]
		);

		let empty = toml::Value::Array(Vec::new());
		assert!(string_list("k", Some(&empty), &default).is_empty());
	}

	#[test]
	fn test_default_config_gives_default_options() {
		let options = Config::default().to_options().unwrap();
		assert_eq!(options.unit_precision, 5);
		assert_eq!(options.prop_list, vec!["*".to_string()]);
		assert_eq!(options.unit_list, vec!["*".to_string()]);
		assert!(options.replace);
		assert!(!options.media_query);
		assert!(options.exclude.is_some());
		assert_eq!(options.zero_unit, ZeroUnit::Drop);
	}

	#[test]
	fn test_exclude_disabled() {
		let config = Config {
			exclude: Some(ExcludeSetting::Enabled(false)),
			..Default::default()
		};
		assert!(config.to_options().unwrap().exclude.is_none());
	}

	#[test]
	fn test_invalid_selector_regex_fails_validation() {
		let config = Config {
			selector_black_list: vec![SelectorEntry::Pattern {
				regex: "(unclosed".into(),
			}],
			..Default::default()
		};
		assert!(config.validate().is_err());
	}
}
