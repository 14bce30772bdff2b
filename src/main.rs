use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use unit_processor::config::{
	CONFIG_FILE_NAME, LoadedConfig, ProcessorConfig, discover_config, generate_init_template,
	load_config_file, user_config_path,
};
use unit_processor::engine::{Engine, Options, ScaleProcessor};
use unit_processor::stylesheet::Stylesheet;

#[derive(Parser)]
#[command(name = "unitproc")]
#[command(
	author,
	version,
	about = "Rewrite numeric unit values in stylesheets"
)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	/// Create a template .unitproc.toml in the current directory
	#[arg(long)]
	init: bool,

	/// Overwrite existing .unitproc.toml when using --init
	#[arg(long, requires = "init")]
	force: bool,

	/// Use this config file instead of discovering one
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Rewrite files in place instead of printing them
	#[arg(short, long)]
	write: bool,

	/// Fractional digits kept after rewriting
	#[arg(long, value_name = "DIGITS")]
	precision: Option<u32>,

	/// Also rewrite @media parameters
	#[arg(long)]
	media_query: bool,

	/// Append a rewritten copy after each declaration instead of replacing it
	#[arg(long)]
	no_replace: bool,

	/// Multiply values by this factor
	#[arg(long, value_name = "FACTOR")]
	scale: Option<f64>,

	/// Only scale these units (repeatable)
	#[arg(long = "from-unit", value_name = "UNIT", requires = "scale")]
	from_units: Vec<String>,

	/// Write scaled values with this unit
	#[arg(long, value_name = "UNIT", requires = "scale")]
	to_unit: Option<String>,

	/// Log what gets rewritten
	#[arg(short, long)]
	verbose: bool,

	/// Stylesheets to process; reads stdin when none are given or for '-'
	files: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
	/// Configuration management commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display the effective configuration and where it came from
	Show,
	/// Check the config file for errors without processing anything
	Validate,
}

fn main() -> ExitCode {
	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();
	init_logging(cli.verbose);

	// Handle --init
	if cli.init {
		return handle_init(cli.force);
	}

	// Handle subcommands
	if let Some(command) = &cli.command {
		return match command {
			Commands::Config { action } => match action {
				ConfigAction::Show => handle_config_show(&cli),
				ConfigAction::Validate => handle_config_validate(&cli),
			},
		};
	}

	handle_process(&cli)
}

fn init_logging(verbose: bool) {
	let filter = if verbose {
		EnvFilter::new("debug")
	} else {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
	};

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}

fn handle_init(force: bool) -> Result<ExitCode> {
	let config_path = PathBuf::from(CONFIG_FILE_NAME);

	if config_path.exists() && !force {
		anyhow::bail!("{CONFIG_FILE_NAME} already exists. Use --force to overwrite.");
	}

	std::fs::write(&config_path, generate_init_template())
		.with_context(|| format!("Failed to write {}", config_path.display()))?;

	println!("Created {CONFIG_FILE_NAME}");
	Ok(ExitCode::SUCCESS)
}

fn load_config(cli: &Cli) -> Result<Option<LoadedConfig>> {
	if let Some(path) = &cli.config {
		return load_config_file(path)
			.map(Some)
			.with_context(|| format!("Failed to load config: {}", path.display()));
	}

	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	discover_config(&cwd).context("Failed to discover config file")
}

/// Config file options with command-line overrides applied.
fn build_options(cli: &Cli, loaded: Option<&LoadedConfig>) -> Result<Options> {
	let mut options = match loaded {
		Some(loaded) => loaded
			.config
			.to_options()
			.with_context(|| format!("Invalid config: {}", loaded.path.display()))?,
		None => Options::default(),
	};

	if let Some(precision) = cli.precision {
		options.unit_precision = precision;
	}
	if cli.media_query {
		options.media_query = true;
	}
	if cli.no_replace {
		options.replace = false;
	}
	if let Some(factor) = cli.scale {
		options = options.with_processor(ScaleProcessor {
			factor,
			units: cli.from_units.clone(),
			to: cli.to_unit.clone(),
		});
	}

	Ok(options)
}

/// The processor in effect: `--scale` wins over the config file.
fn effective_processor(cli: &Cli, loaded: Option<&LoadedConfig>) -> ProcessorConfig {
	match cli.scale {
		Some(factor) => ProcessorConfig::Scale {
			factor,
			units: cli.from_units.clone(),
			to: cli.to_unit.clone(),
		},
		None => loaded
			.map(|loaded| loaded.config.processor.clone())
			.unwrap_or_default(),
	}
}

fn handle_config_show(cli: &Cli) -> Result<ExitCode> {
	let loaded = load_config(cli)?;

	match &loaded {
		Some(loaded) => println!("# Source: {}\n", loaded.path.display()),
		None => println!("# No configuration file found; using defaults.\n"),
	}

	let options = build_options(cli, loaded.as_ref())?;
	println!("unit-precision: {}", options.unit_precision);
	println!("prop-list: {:?}", options.prop_list);
	println!("unit-list: {:?}", options.unit_list);
	println!("custom-unit-list: {:?}", options.custom_unit_list);
	println!("replace: {}", options.replace);
	println!("media-query: {}", options.media_query);
	println!("zero-unit: {:?}", options.zero_unit);
	println!("selector-black-list: {:?}", options.selector_black_list);
	match &options.exclude {
		Some(rule) => println!("exclude: {rule:?}"),
		None => println!("exclude: none"),
	}
	println!("processor: {:?}", effective_processor(cli, loaded.as_ref()));

	// Show user config path
	if let Ok(user_path) = user_config_path() {
		println!("\nUser config path: {}", user_path.display());
		if user_path.exists() {
			println!("  (exists)");
		} else {
			println!("  (not found)");
		}
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_config_validate(cli: &Cli) -> Result<ExitCode> {
	match load_config(cli) {
		Ok(None) => {
			println!("No configuration file found.");
			Ok(ExitCode::SUCCESS)
		}
		Ok(Some(loaded)) => {
			println!("Configuration is valid: {}", loaded.path.display());
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Configuration error: {e:#}");
			Ok(ExitCode::FAILURE)
		}
	}
}

fn handle_process(cli: &Cli) -> Result<ExitCode> {
	let loaded = load_config(cli)?;
	let options = build_options(cli, loaded.as_ref())?;
	let engine = Engine::new(options).context("Failed to compile options")?;

	if cli.files.is_empty() {
		process_stdin(&engine)?;
		return Ok(ExitCode::SUCCESS);
	}

	for file in &cli.files {
		if file == Path::new("-") {
			process_stdin(&engine)?;
		} else {
			process_file(&engine, file, cli.write)?;
		}
	}

	Ok(ExitCode::SUCCESS)
}

fn process_stdin(engine: &Engine) -> Result<()> {
	let mut input = String::new();
	std::io::stdin()
		.read_to_string(&mut input)
		.context("Failed to read stdin")?;

	let output = process_text(engine, &input, None)?;
	std::io::stdout()
		.write_all(output.as_bytes())
		.context("Failed to write stdout")?;
	Ok(())
}

fn process_file(engine: &Engine, path: &Path, write: bool) -> Result<()> {
	let input = std::fs::read_to_string(path)
		.map_err(|source| unit_processor::UnitError::InputReadError {
			path: path.to_path_buf(),
			source,
		})
		.with_context(|| format!("Failed to process {}", path.display()))?;

	let output = process_text(engine, &input, Some(path))
		.with_context(|| format!("Failed to process {}", path.display()))?;

	if write {
		if output != input {
			std::fs::write(path, &output)
				.with_context(|| format!("Failed to write {}", path.display()))?;
			tracing::info!(path = %path.display(), "rewrote file");
		}
	} else {
		std::io::stdout()
			.write_all(output.as_bytes())
			.context("Failed to write stdout")?;
	}

	Ok(())
}

fn process_text(engine: &Engine, input: &str, path: Option<&Path>) -> Result<String> {
	let mut sheet = Stylesheet::parse(input)?;
	let report = engine.process(&mut sheet, path)?;

	if report.excluded {
		tracing::info!(path = ?path, "skipped excluded file");
	} else {
		tracing::debug!(?report, "processed stylesheet");
	}

	Ok(sheet.to_string())
}
