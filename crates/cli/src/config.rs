//! CLI configuration file and resolved settings.
//!
//! `config.json` lives in `<config dir>/azguard/`, next to `sessions.json`
//! which holds the persisted session ids. Command-line flags override the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use azguard::{DEFAULT_RELAY_URL, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::error::Result;

pub const DEFAULT_SCOPE: &str = "azguard-cli";
pub const DEFAULT_DAPP_NAME: &str = "azguard-cli";

/// Contents of `config.json`. Every field is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub endpoint: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timeout_ms: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub dapp_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub dapp_url: Option<String>,
}

impl CliConfig {
	/// Loads `path`, or the default config when the file does not exist.
	pub fn load(path: &Path) -> Result<Self> {
		if !path.exists() {
			return Ok(Self::default());
		}
		let content = fs::read_to_string(path)
			.with_context(|| format!("reading config {}", path.display()))?;
		let config: Self = serde_json::from_str(&content)
			.with_context(|| format!("parsing config {}", path.display()))?;
		Ok(config)
	}

	/// Overwrites fields that are set in `other`.
	pub fn merge(&mut self, other: &CliConfig) {
		if other.endpoint.is_some() {
			self.endpoint = other.endpoint.clone();
		}
		if other.scope.is_some() {
			self.scope = other.scope.clone();
		}
		if other.timeout_ms.is_some() {
			self.timeout_ms = other.timeout_ms;
		}
		if other.dapp_name.is_some() {
			self.dapp_name = other.dapp_name.clone();
		}
		if other.dapp_url.is_some() {
			self.dapp_url = other.dapp_url.clone();
		}
	}

	/// Flags given on the command line, as a config layer.
	pub fn from_flags(cli: &Cli) -> Self {
		Self {
			endpoint: cli.endpoint.clone(),
			scope: cli.scope.clone(),
			timeout_ms: cli.timeout_ms,
			..Default::default()
		}
	}
}

/// Default location of `config.json`.
pub fn default_config_path() -> PathBuf {
	dirs::config_dir()
		.unwrap_or_else(|| PathBuf::from("."))
		.join("azguard")
		.join("config.json")
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
	pub endpoint: String,
	pub scope: String,
	pub timeout: Duration,
	pub dapp_name: String,
	pub dapp_url: Option<String>,
	pub sessions_path: PathBuf,
}

impl Settings {
	/// Reads the config file and layers the command-line flags over it.
	pub fn load(cli: &Cli) -> Result<Self> {
		let config_path = cli.config.clone().unwrap_or_else(default_config_path);
		let mut config = CliConfig::load(&config_path)?;
		config.merge(&CliConfig::from_flags(cli));
		Ok(Self::resolve(config, &config_path))
	}

	pub fn resolve(config: CliConfig, config_path: &Path) -> Self {
		let sessions_path = config_path
			.parent()
			.map(|dir| dir.join("sessions.json"))
			.unwrap_or_else(|| PathBuf::from("sessions.json"));

		Self {
			endpoint: config.endpoint.unwrap_or_else(|| DEFAULT_RELAY_URL.to_string()),
			scope: config.scope.unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
			timeout: config
				.timeout_ms
				.map(Duration::from_millis)
				.unwrap_or(DEFAULT_TIMEOUT),
			dapp_name: config.dapp_name.unwrap_or_else(|| DEFAULT_DAPP_NAME.to_string()),
			dapp_url: config.dapp_url,
			sessions_path,
		}
	}
}
