use crate::config::parser::parse_config_file;
use crate::config::types::LoadedConfig;
use crate::error::{Result, UnitError};
use std::path::{Path, PathBuf};

/// Name of the config file looked up in each directory.
pub const CONFIG_FILE_NAME: &str = ".unitproc.toml";

/// Environment variable that, if truthy, skips the `~/.unitproc.toml` fallback.
pub const NO_USER_CONFIG_ENV_VAR: &str = "UNITPROC_NO_USER_CONFIG";

/// Find the config that applies to `start_dir`.
///
/// The lookup order is:
/// 1. `.unitproc.toml` in `start_dir`, then in each parent directory
/// 2. ~/.unitproc.toml (unless disabled through the environment)
///
/// The first file found wins; configs are not merged.
pub fn discover_config(start_dir: &Path) -> Result<Option<LoadedConfig>> {
	for dir in start_dir.ancestors() {
		let config_path = dir.join(CONFIG_FILE_NAME);

		if config_path.is_file() {
			return load_config_file(&config_path).map(Some);
		}
	}

	load_user_config()
}

/// Load a config from an explicit path.
pub fn load_config_file(path: &Path) -> Result<LoadedConfig> {
	let config = parse_config_file(path)?;
	tracing::debug!(path = %path.display(), "loaded config");
	Ok(LoadedConfig {
		config,
		path: path.to_path_buf(),
	})
}

/// Load the user's ~/.unitproc.toml if it exists and isn't disabled.
fn load_user_config() -> Result<Option<LoadedConfig>> {
	if is_env_truthy(NO_USER_CONFIG_ENV_VAR) {
		return Ok(None);
	}

	let user_config_path = user_config_path()?;

	if user_config_path.is_file() {
		load_config_file(&user_config_path).map(Some)
	} else {
		Ok(None)
	}
}

/// Check if an environment variable is set to a truthy value.
fn is_env_truthy(var_name: &str) -> bool {
	match std::env::var(var_name) {
		Ok(value) => {
			let lower = value.to_lowercase();
			!value.is_empty() && lower != "0" && lower != "false" && lower != "no"
		}
		Err(_) => false,
	}
}

/// Get the path to the user's config file.
pub fn user_config_path() -> Result<PathBuf> {
	let home_dir = dirs::home_dir().ok_or(UnitError::HomeDirectoryNotFound)?;
	Ok(home_dir.join(CONFIG_FILE_NAME))
}
