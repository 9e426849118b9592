//! Runtime settings supplied by the host at startup.
//!
//! Settings are TOML with kebab-case keys; every key is optional:
//!
//! ```toml
//! resource-dir = "/usr/share/courier/resources"
//! uri-schemes = ["courier"]
//! debounce-ms = 1
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings load error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read {}: {error}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		error: std::io::Error,
	},
	#[error("invalid settings: {0}")]
	Parse(#[from] toml::de::Error),
}

/// Host-provided settings shared by every registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RuntimeSettings {
	/// Base directory relative resource paths are joined against.
	pub resource_dir: PathBuf,
	/// Schemes whose `<scheme>://` values are used as URIs instead of paths.
	pub uri_schemes: Vec<String>,
	/// Window in which change notifications coalesce.
	pub debounce_ms: u64,
}

impl Default for RuntimeSettings {
	fn default() -> Self {
		Self {
			resource_dir: PathBuf::from("."),
			uri_schemes: vec!["courier".to_string()],
			debounce_ms: 1,
		}
	}
}

impl RuntimeSettings {
	/// Parses settings from a TOML string.
	pub fn parse(input: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(input)?)
	}

	/// Loads settings from a TOML file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::parse(&content)
	}

	pub fn debounce(&self) -> Duration {
		Duration::from_millis(self.debounce_ms)
	}
}
