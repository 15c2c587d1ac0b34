//! Configuration for the courier portal host.
//!
//! Configuration is read from TOML. Values may reference environment variables
//! with `${VAR}` or `${VAR:-default}`, and a file may pull in other files with
//! `include = ["feeds.toml"]`. Every top-level section must be defined in
//! exactly one file.

mod loader;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Top-level portal configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this portal instance.
	pub portal: PortalConfig,
	/// Notification timing.
	#[serde(default)]
	pub notifications: NotificationConfig,
	/// Order feeds to subscribe to.
	pub feed: FeedConfig,
}

/// Identity of the portal instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortalConfig {
	/// Name used in log lines.
	pub id: String,
	/// Client whose orders this portal shows.
	#[serde(default)]
	pub client_id: Option<String>,
}

/// Notification timing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
	/// How long an auto-expiring notification stays visible.
	#[serde(default = "default_notification_timeout_ms")]
	pub timeout_ms: u64,
	/// How often the host sweeps expired notifications.
	#[serde(default = "default_sweep_interval_ms")]
	pub sweep_interval_ms: u64,
}

impl Default for NotificationConfig {
	fn default() -> Self {
		Self {
			timeout_ms: default_notification_timeout_ms(),
			sweep_interval_ms: default_sweep_interval_ms(),
		}
	}
}

fn default_notification_timeout_ms() -> u64 {
	5000
}

fn default_sweep_interval_ms() -> u64 {
	250
}

/// Order feed configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
	/// Map of feed implementation names to their configurations.
	/// Each implementation validates its own table.
	pub implementations: HashMap<String, toml::Value>,
}

/// Replaces `${VAR}` and `${VAR:-default}` with environment values.
///
/// Inputs larger than 1MB are rejected.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut missing = None;
	let resolved = re.replace_all(input, |caps: &regex::Captures<'_>| {
		let var_name = &caps[1];
		match (std::env::var(var_name), caps.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				missing.get_or_insert_with(|| var_name.to_string());
				String::new()
			},
		}
	});

	if let Some(var_name) = missing {
		return Err(ConfigError::Validation(format!(
			"Environment variable '{}' not found",
			var_name
		)));
	}

	Ok(resolved.into_owned())
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
		let file_name = path.file_name().ok_or_else(|| {
			ConfigError::Validation(format!("Invalid path: {}", path.display()))
		})?;

		let mut loader = loader::ConfigLoader::new(base_dir);
		loader.load_config(file_name).await
	}

	/// Builds a configuration from a parsed TOML document whose environment
	/// references are already resolved.
	pub(crate) fn from_value(value: toml::Value) -> Result<Self, ConfigError> {
		let config: Config = value.try_into()?;
		config.validate()?;
		Ok(config)
	}

	/// Validates cross-field constraints that serde cannot express.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.portal.id.trim().is_empty() {
			return Err(ConfigError::Validation("Portal ID cannot be empty".into()));
		}

		if self.notifications.timeout_ms == 0 {
			return Err(ConfigError::Validation(
				"notifications.timeout_ms must be greater than 0".into(),
			));
		}
		if self.notifications.timeout_ms > 600_000 {
			return Err(ConfigError::Validation(
				"notifications.timeout_ms cannot exceed 600000 (10 minutes)".into(),
			));
		}
		if self.notifications.sweep_interval_ms == 0 {
			return Err(ConfigError::Validation(
				"notifications.sweep_interval_ms must be greater than 0".into(),
			));
		}
		if self.notifications.sweep_interval_ms > self.notifications.timeout_ms {
			return Err(ConfigError::Validation(format!(
				"notifications.sweep_interval_ms ({}) cannot exceed timeout_ms ({})",
				self.notifications.sweep_interval_ms, self.notifications.timeout_ms
			)));
		}

		if self.feed.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one feed implementation must be configured".into(),
			));
		}
		for (name, table) in &self.feed.implementations {
			if !table.is_table() {
				return Err(ConfigError::Validation(format!(
					"Feed implementation '{}' must be a table",
					name
				)));
			}
		}

		Ok(())
	}
}

/// Parses a TOML string, resolving environment variables and validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
