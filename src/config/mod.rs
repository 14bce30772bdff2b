//! Configuration loading and parsing for unit-processor.
//!
//! This module handles:
//! - TOML config file parsing
//! - Directory cascade discovery
//! - Turning a config into engine options

pub mod cascade;
pub mod parser;
pub mod types;

pub use cascade::{
	CONFIG_FILE_NAME, NO_USER_CONFIG_ENV_VAR, discover_config, load_config_file, user_config_path,
};
pub use parser::{parse_config_file, parse_config_str};
pub use types::{Config, ExcludeSetting, LoadedConfig, ProcessorConfig, SelectorEntry};

/// Template written by `unitproc --init`.
pub fn generate_init_template() -> String {
	r#"# unitproc configuration
# Values shown are the defaults unless noted.

# Fractional digits kept after rewriting.
unit-precision = 5

# Properties to process. Supports prefix*, *suffix, *contains* and ! negation.
prop-list = ["*"]

# Units to process, with the same pattern syntax.
unit-list = ["*"]

# Extra units recognized besides px, rem, em, %, vw, ...
custom-unit-list = []

# Rewrite in place; false appends a rewritten copy after each declaration.
replace = true

# Also rewrite @media parameters.
media-query = false

# How zero is written: "drop" gives 0, "keep" gives 0px.
zero-unit = "drop"

# Skip declarations under matching selectors (text or { regex = "..." }).
selector-black-list = []

# Files to skip: a path substring, { regex = "..." }, or false.
exclude = { regex = "(?i)node_modules" }

# Example (not a default): convert px to rem.
[processor]
type = "scale"
factor = 0.0625
units = ["px"]
to = "rem"
"#
	.to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::PathBuf;

	#[test]
	fn test_init_template_is_valid() {
		let config = parse_config_str(&generate_init_template(), &PathBuf::from("init.toml")).unwrap();
		assert_eq!(config.unit_precision, Some(5));
		assert!(matches!(config.processor, ProcessorConfig::Scale { .. }));
	}
}
