//! Configuration module for the bridge orchestrator.
//!
//! Loads orchestrator configuration from a TOML file and validates it
//! before any connection is opened. Chains are declared as an ordered
//! `[[chains]]` array because the `all` selection mode iterates targets in
//! declaration order. The signing key is never part of the file; it is
//! supplied out-of-band through the `PRIVATE_KEY` environment variable.

use bridge_types::{ChainProfile, SecretString};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Environment variable holding the operator signing key.
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

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
	/// Error that occurs when the signing key is missing from the environment.
	#[error("Missing secret: {0} is not set")]
	MissingSecret(&'static str),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the orchestrator.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	/// Key of the hub chain: the fixed end of every directional mode.
	pub hub: String,
	/// Ordered list of supported chains. The first entry matching `hub` is
	/// the hub; every other chain is a spoke.
	pub chains: Vec<ChainProfile>,
	/// Pricing service endpoints.
	pub quote: QuoteConfig,
	/// Transfer constants.
	#[serde(default)]
	pub transfer: TransferConfig,
	/// Display refresh settings.
	#[serde(default)]
	pub refresh: RefreshConfig,
}

/// Pricing service endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteConfig {
	/// Route quote endpoint (signed route authorization).
	pub route_url: String,
	/// Fallback fee endpoint, queried when the route response carries no fee.
	pub fee_url: String,
	/// HTTP ceiling for each pricing call, in seconds.
	#[serde(default = "default_quote_timeout_secs")]
	pub timeout_secs: u64,
}

fn default_quote_timeout_secs() -> u64 {
	20
}

/// Transfer constants shared by all chains.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferConfig {
	/// Static fee baseline passed to the bridge fee view, as a decimal
	/// token amount.
	#[serde(default = "default_static_fee")]
	pub static_fee: String,
	/// Decimals of the bridged token.
	#[serde(default = "default_token_decimals")]
	pub token_decimals: u8,
	/// Finality threshold used when the quote does not specify one and for
	/// the fallback fee query.
	#[serde(default = "default_finality")]
	pub default_finality: u32,
	/// Hook data used when the quote does not specify any.
	#[serde(default = "default_hook_data")]
	pub default_hook_data: String,
	/// Seconds added to the route deadline to form the permit deadline,
	/// tolerating clock and latency skew.
	#[serde(default = "default_permit_buffer")]
	pub permit_deadline_buffer_secs: u64,
}

fn default_static_fee() -> String {
	"0.1".to_string()
}

fn default_token_decimals() -> u8 {
	6
}

fn default_finality() -> u32 {
	1000
}

fn default_hook_data() -> String {
	"0x00".to_string()
}

fn default_permit_buffer() -> u64 {
	6000
}

impl Default for TransferConfig {
	fn default() -> Self {
		Self {
			static_fee: default_static_fee(),
			token_decimals: default_token_decimals(),
			default_finality: default_finality(),
			default_hook_data: default_hook_data(),
			permit_deadline_buffer_secs: default_permit_buffer(),
		}
	}
}

/// Display refresh settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
	/// Interval of the background wallet/balance refresh task, in seconds.
	#[serde(default = "default_refresh_interval")]
	pub interval_secs: u64,
}

fn default_refresh_interval() -> u64 {
	15
}

impl Default for RefreshConfig {
	fn default() -> Self {
		Self {
			interval_secs: default_refresh_interval(),
		}
	}
}

impl Config {
	/// Loads and validates configuration from a TOML file.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let contents = std::fs::read_to_string(path)?;
		Self::from_toml_str(&contents)
	}

	/// Parses and validates configuration from a TOML string.
	pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
		let config: Config = toml::from_str(contents)?;
		config.validate()?;
		Ok(config)
	}

	/// Validates cross-field constraints not expressible in serde.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.chains.is_empty() {
			return Err(ConfigError::Validation(
				"at least one chain must be configured".to_string(),
			));
		}
		let mut seen = HashSet::new();
		for chain in &self.chains {
			if chain.key.trim().is_empty() {
				return Err(ConfigError::Validation(
					"chain key must not be empty".to_string(),
				));
			}
			if !seen.insert(chain.key.as_str()) {
				return Err(ConfigError::Validation(format!(
					"duplicate chain key '{}'",
					chain.key
				)));
			}
			if chain.rpc_url.trim().is_empty() {
				return Err(ConfigError::Validation(format!(
					"chain '{}' has an empty rpc_url",
					chain.key
				)));
			}
		}
		if !seen.contains(self.hub.as_str()) {
			return Err(ConfigError::Validation(format!(
				"hub '{}' is not among the configured chains",
				self.hub
			)));
		}
		if self.chains.len() < 2 {
			return Err(ConfigError::Validation(
				"at least one spoke chain is required besides the hub".to_string(),
			));
		}
		if self.quote.route_url.trim().is_empty() || self.quote.fee_url.trim().is_empty() {
			return Err(ConfigError::Validation(
				"quote route_url and fee_url must be set".to_string(),
			));
		}
		if self.quote.timeout_secs == 0 {
			return Err(ConfigError::Validation(
				"quote timeout_secs must be positive".to_string(),
			));
		}
		Ok(())
	}

	/// Returns the hub chain profile.
	pub fn hub_profile(&self) -> &ChainProfile {
		// validate() guarantees the hub key exists
		self.chains
			.iter()
			.find(|c| c.key == self.hub)
			.expect("hub key validated at load time")
	}

	/// Returns the spoke chain keys in declaration order.
	pub fn spoke_keys(&self) -> Vec<String> {
		self.chains
			.iter()
			.filter(|c| c.key != self.hub)
			.map(|c| c.key.clone())
			.collect()
	}
}

/// Reads the operator signing key from the environment.
///
/// Absence is a fatal startup condition.
pub fn required_private_key() -> Result<SecretString, ConfigError> {
	match std::env::var(PRIVATE_KEY_ENV) {
		Ok(key) if !key.trim().is_empty() => Ok(SecretString::new(key)),
		_ => Err(ConfigError::MissingSecret(PRIVATE_KEY_ENV)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const SAMPLE: &str = r#"
hub = "sepolia"

[[chains]]
key = "sepolia"
label = "Ethereum Sepolia"
chain_id = 11155111
domain = 0
rpc_url = "https://rpc.sepolia.example"
token_address = "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"
bridge_address = "0xC42f6bcb48aFf823a7252e244FE499CF726b4Fa0"
explorer_tx_url = "https://sepolia.etherscan.io/tx/"
native_symbol = "ETH"

[[chains]]
key = "optimism"
label = "Optimism Sepolia"
chain_id = 11155420
domain = 2
rpc_url = "https://rpc.op.example"
token_address = "0x5fd84259d66Cd46123540766Be93DFE6D43130D7"
bridge_address = "0xf2474BdFDC5567c54dA34c499ef41E49c680Af73"
explorer_tx_url = "https://sepolia-optimistic.etherscan.io/tx/"
native_symbol = "ETH"

[quote]
route_url = "https://pricing.example/route"
fee_url = "https://pricing.example/fees"
"#;

	#[test]
	fn parses_sample_config() {
		let config = Config::from_toml_str(SAMPLE).unwrap();
		assert_eq!(config.hub, "sepolia");
		assert_eq!(config.chains.len(), 2);
		assert_eq!(config.quote.timeout_secs, 20);
		assert_eq!(config.transfer.permit_deadline_buffer_secs, 6000);
		assert_eq!(config.transfer.default_finality, 1000);
		assert_eq!(config.refresh.interval_secs, 15);
		assert_eq!(config.spoke_keys(), vec!["optimism".to_string()]);
		assert_eq!(config.hub_profile().chain_id, 11155111);
	}

	#[test]
	fn rejects_unknown_hub() {
		let bad = SAMPLE.replace("hub = \"sepolia\"", "hub = \"mars\"");
		let err = Config::from_toml_str(&bad).unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));
	}

	#[test]
	fn rejects_duplicate_chain_keys() {
		let bad = SAMPLE.replace("key = \"optimism\"", "key = \"sepolia\"");
		let err = Config::from_toml_str(&bad).unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));
	}

	#[test]
	fn preserves_chain_order() {
		let config = Config::from_toml_str(SAMPLE).unwrap();
		let keys: Vec<_> = config.chains.iter().map(|c| c.key.as_str()).collect();
		assert_eq!(keys, vec!["sepolia", "optimism"]);
	}
}
