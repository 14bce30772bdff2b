use std::path::PathBuf;

/// Library-level structured errors for unit-processor.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum UnitError {
	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid regex pattern: {pattern}")]
	InvalidRegex {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Processor failed on {value}{unit}")]
	ProcessorFailed {
		value: f64,
		unit: String,
		#[source]
		source: Box<dyn std::error::Error + Send + Sync>,
	},

	#[error("Failed to parse stylesheet at byte {offset}: {message}")]
	StylesheetParse { offset: usize, message: String },

	#[error("Failed to read input: {path}")]
	InputReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,
}

/// Result type alias using UnitError.
pub type Result<T> = std::result::Result<T, UnitError>;
