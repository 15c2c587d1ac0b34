//! Loader for configurations split across several files.
//!
//! A file may list other files in a top-level `include` key. Included files are
//! resolved relative to the including file's directory, merged section by
//! section, and must not redefine a section that was already loaded.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Configuration loader that handles multi-file configurations with includes.
pub struct ConfigLoader {
	/// Base path for resolving relative includes
	base_path: PathBuf,
	/// Canonical paths already read, to detect include cycles
	loaded_files: HashSet<PathBuf>,
	/// File each top-level section came from, for error reporting
	section_sources: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	pub fn new(base_path: impl AsRef<Path>) -> Self {
		Self {
			base_path: base_path.as_ref().to_path_buf(),
			loaded_files: HashSet::new(),
			section_sources: HashMap::new(),
		}
	}

	/// Loads a configuration file and all its includes.
	pub async fn load_config(
		&mut self,
		config_path: impl AsRef<Path>,
	) -> Result<Config, ConfigError> {
		let config_path = self.resolve_path(config_path)?;
		let content = self.load_file(&config_path).await?;
		let mut root: toml::Value = toml::from_str(&content)?;

		let includes = extract_includes(&root)?;
		if includes.is_empty() {
			return Config::from_value(root);
		}

		if let Some(table) = root.as_table_mut() {
			table.remove("include");
			for key in table.keys() {
				self.section_sources
					.insert(key.clone(), config_path.clone());
			}
		}

		for include in includes {
			let include_path = self.resolve_path(&include)?;
			let include_content = self.load_file(&include_path).await?;
			let included: toml::Value = toml::from_str(&include_content)?;
			self.merge_sections(&mut root, included, &include_path)?;
		}

		Config::from_value(root)
	}

	/// Reads a file once, resolving environment variables.
	async fn load_file(&mut self, path: &Path) -> Result<String, ConfigError> {
		let canonical = tokio::fs::canonicalize(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Cannot resolve path {}: {}", path.display(), e),
			))
		})?;

		if !self.loaded_files.insert(canonical.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				canonical.display()
			)));
		}

		let content = tokio::fs::read_to_string(&canonical).await?;
		resolve_env_vars(&content)
	}

	fn merge_sections(
		&mut self,
		root: &mut toml::Value,
		included: toml::Value,
		source: &Path,
	) -> Result<(), ConfigError> {
		let toml::Value::Table(included) = included else {
			return Ok(());
		};
		if included.contains_key("include") {
			return Err(ConfigError::Validation(format!(
				"Nested include in {} is not supported",
				source.display()
			)));
		}

		let Some(root) = root.as_table_mut() else {
			return Ok(());
		};
		for (key, value) in included {
			if let Some(existing) = self.section_sources.get(&key) {
				return Err(ConfigError::Validation(format!(
					"Duplicate section '{}' found in {} and {}. \
					Each top-level section must be unique across all configuration files.",
					key,
					existing.display(),
					source.display()
				)));
			}
			self.section_sources.insert(key.clone(), source.to_path_buf());
			root.insert(key, value);
		}

		Ok(())
	}

	fn resolve_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
		let path = path.as_ref();
		let resolved = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.base_path.join(path)
		};

		if !resolved.exists() {
			return Err(ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Configuration file not found: {}", resolved.display()),
			)));
		}

		Ok(resolved)
	}
}

/// Reads `include = "a.toml"` or `include = ["a.toml", "b.toml"]`.
fn extract_includes(root: &toml::Value) -> Result<Vec<PathBuf>, ConfigError> {
	match root.get("include") {
		None => Ok(Vec::new()),
		Some(toml::Value::String(path)) => Ok(vec![PathBuf::from(path)]),
		Some(toml::Value::Array(items)) => items
			.iter()
			.map(|item| {
				item.as_str().map(PathBuf::from).ok_or_else(|| {
					ConfigError::Validation("Include array must contain only strings".into())
				})
			})
			.collect(),
		Some(_) => Err(ConfigError::Validation(
			"Include must be a string or array of strings".into(),
		)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::TempDir;

	const PORTAL: &str = "[portal]\nid = \"client-portal\"\n";
	const FEED: &str = "[feed.implementations.file]\npath = \"orders.jsonl\"\n";

	#[tokio::test]
	async fn test_single_file() {
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join("portal.toml"), format!("{}{}", PORTAL, FEED)).unwrap();

		let config = Config::from_file(dir.path().join("portal.toml")).await.unwrap();
		assert_eq!(config.portal.id, "client-portal");
	}

	#[tokio::test]
	async fn test_includes_are_merged() {
		let dir = TempDir::new().unwrap();
		fs::write(
			dir.path().join("portal.toml"),
			format!("include = [\"feeds.toml\"]\n{}", PORTAL),
		)
		.unwrap();
		fs::write(dir.path().join("feeds.toml"), FEED).unwrap();

		let config = Config::from_file(dir.path().join("portal.toml")).await.unwrap();
		assert!(config.feed.implementations.contains_key("file"));
	}

	#[tokio::test]
	async fn test_duplicate_sections_rejected() {
		let dir = TempDir::new().unwrap();
		fs::write(
			dir.path().join("portal.toml"),
			format!("include = \"more.toml\"\n{}{}", PORTAL, FEED),
		)
		.unwrap();
		fs::write(dir.path().join("more.toml"), PORTAL).unwrap();

		let err = Config::from_file(dir.path().join("portal.toml"))
			.await
			.unwrap_err();
		assert!(err.to_string().contains("Duplicate section 'portal'"));
	}

	#[tokio::test]
	async fn test_self_include_detected() {
		let dir = TempDir::new().unwrap();
		fs::write(
			dir.path().join("portal.toml"),
			format!("include = [\"portal.toml\"]\n{}{}", PORTAL, FEED),
		)
		.unwrap();

		let err = Config::from_file(dir.path().join("portal.toml"))
			.await
			.unwrap_err();
		assert!(err.to_string().contains("Circular include"));
	}

	#[tokio::test]
	async fn test_env_values_are_resolved_once() {
		std::env::set_var("COURIER_LOADER_PORTAL_ID", "portal-${NOT_A_COURIER_VAR}");
		let dir = TempDir::new().unwrap();
		let portal = "[portal]\nid = \"${COURIER_LOADER_PORTAL_ID}\"\n";
		fs::write(dir.path().join("single.toml"), format!("{}{}", portal, FEED)).unwrap();
		fs::write(
			dir.path().join("split.toml"),
			format!("include = [\"feeds.toml\"]\n{}", portal),
		)
		.unwrap();
		fs::write(dir.path().join("feeds.toml"), FEED).unwrap();

		for file in ["single.toml", "split.toml"] {
			let config = Config::from_file(dir.path().join(file)).await.unwrap();
			assert_eq!(config.portal.id, "portal-${NOT_A_COURIER_VAR}");
		}
	}

	#[tokio::test]
	async fn test_missing_include() {
		let dir = TempDir::new().unwrap();
		fs::write(
			dir.path().join("portal.toml"),
			format!("include = [\"absent.toml\"]\n{}{}", PORTAL, FEED),
		)
		.unwrap();

		let err = Config::from_file(dir.path().join("portal.toml"))
			.await
			.unwrap_err();
		assert!(matches!(err, ConfigError::Io(_)));
	}
}
