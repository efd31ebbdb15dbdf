//! Scheduler configuration.
//!
//! ```toml
//! thread_name = "lexa-parser"
//! filing_tier = "low"
//! max_batch = 256
//! normalization = "nfd"
//! event_capacity = 256
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

use crate::host::IdleTier;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Error parsing TOML syntax or field types.
	#[error("failed to parse scheduler config: {0}")]
	Parse(#[from] toml::de::Error),

	/// A value parsed but is out of range.
	#[error("invalid value for '{field}': {reason}")]
	Invalid {
		field: &'static str,
		reason: &'static str,
	},
}

/// Unicode normalization applied to word forms before parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
	/// Canonical decomposition, the form engines compile their tables in.
	#[default]
	Nfd,
	/// Pass forms through untouched.
	#[serde(rename = "none")]
	Verbatim,
}

impl Normalization {
	pub fn apply(self, text: &str) -> String {
		match self {
			Self::Nfd => text.trim().nfd().collect(),
			Self::Verbatim => text.trim().to_string(),
		}
	}
}

/// Scheduler settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
	/// Name of the dedicated engine thread.
	pub thread_name: String,
	/// Idle tier the filer schedules its batches on.
	pub filing_tier: IdleTier,
	/// Upper bound on wordforms filed in one host transaction.
	pub max_batch: usize,
	pub normalization: Normalization,
	/// Buffer size of the `WordformFiled` broadcast channel.
	pub event_capacity: usize,
}

impl Default for SchedulerConfig {
	fn default() -> Self {
		Self {
			thread_name: "lexa-parser".to_string(),
			filing_tier: IdleTier::Low,
			max_batch: 256,
			normalization: Normalization::Nfd,
			event_capacity: 256,
		}
	}
}

impl SchedulerConfig {
	/// Parses and validates a TOML document. Missing fields take defaults.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads, parses and validates a TOML file.
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let config = Self::from_toml_str(&input)?;
		tracing::debug!(path = %path.display(), ?config, "config.loaded");
		Ok(config)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.max_batch == 0 {
			return Err(ConfigError::Invalid {
				field: "max_batch",
				reason: "must be at least 1",
			});
		}
		if self.event_capacity == 0 {
			return Err(ConfigError::Invalid {
				field: "event_capacity",
				reason: "must be at least 1",
			});
		}
		if self.thread_name.trim().is_empty() {
			return Err(ConfigError::Invalid {
				field: "thread_name",
				reason: "must not be empty",
			});
		}
		Ok(())
	}
}
