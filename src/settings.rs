//! Configuration discovery.
//!
//! Finds `usd-names.json` by searching upward from a directory and applies
//! the `USD_NAMES_ENABLE_TRANSCODING` environment override.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::transcoding::TranscodingFormat;
use crate::Config;

/// Name of the settings file searched for.
pub const SETTINGS_FILE_NAME: &str = "usd-names.json";

/// Environment variable that overrides `transcoding-enabled`.
pub const TRANSCODING_ENV_VAR: &str = "USD_NAMES_ENABLE_TRANSCODING";

/// Resolved configuration and where it came from
#[derive(Debug, Clone)]
pub struct Settings {
	pub config: Config,
	/// Path to the settings file that was found
	pub settings_path: Option<PathBuf>,
}

/// Find the settings file by searching upward from a starting directory.
///
/// Returns `None` if no settings file is found.
pub fn find_settings(start_dir: &Path) -> Option<PathBuf> {
	start_dir
		.ancestors()
		.map(|dir| dir.join(SETTINGS_FILE_NAME))
		.find(|path| path.is_file())
}

/// Read a settings file on top of the default configuration.
///
/// Recognized keys:
/// - `transcoding-enabled`: bool
/// - `identifier-format`: `"ascii"` or `"utf8-xid"`
///
/// Other keys are ignored.
pub fn load_settings(settings_path: &Path) -> Result<Config> {
	let content = fs::read_to_string(settings_path)
		.with_context(|| format!("Failed to read {}", settings_path.display()))?;

	let json: Value = serde_json::from_str(&content)
		.with_context(|| format!("Failed to parse {}", settings_path.display()))?;

	parse_settings(&json).with_context(|| format!("Invalid settings in {}", settings_path.display()))
}

fn parse_settings(json: &Value) -> Result<Config> {
	let Some(object) = json.as_object() else {
		bail!("expected a JSON object at the top level");
	};

	let mut config = Config::default();

	if let Some(value) = object.get("transcoding-enabled") {
		config.transcoding_enabled = value
			.as_bool()
			.with_context(|| format!("'transcoding-enabled' must be a boolean, found {}", value))?;
	}

	if let Some(value) = object.get("identifier-format") {
		let format = value
			.as_str()
			.with_context(|| format!("'identifier-format' must be a string, found {}", value))?;
		config.format = format.parse::<TranscodingFormat>().map_err(anyhow::Error::msg)?;
	}

	Ok(config)
}

/// Parse a boolean setting value the way environment settings are written.
pub fn parse_bool_setting(value: &str) -> Result<bool> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		other => bail!("'{}' is not a boolean setting value", other),
	}
}

/// Apply the transcoding environment override, if set.
pub fn apply_env_override(mut config: Config, value: Option<&str>) -> Result<Config> {
	if let Some(value) = value {
		config.transcoding_enabled = parse_bool_setting(value)
			.with_context(|| format!("Invalid value for {}", TRANSCODING_ENV_VAR))?;
	}
	Ok(config)
}

/// Resolve the configuration for a working directory.
///
/// Settings file (if any) first, then the environment override.
pub fn resolve_settings(start_dir: &Path) -> Result<Settings> {
	let settings_path = find_settings(start_dir);
	let config = match &settings_path {
		Some(path) => load_settings(path)?,
		None => Config::default(),
	};

	let env_value = std::env::var(TRANSCODING_ENV_VAR).ok();
	let config = apply_env_override(config, env_value.as_deref())?;

	Ok(Settings {
		config,
		settings_path,
	})
}
