//! Configuration module for the Aptos counter dApp.
//!
//! This module resolves, once at startup, which network the dApp talks to,
//! which endpoints the chain client uses and which contract addresses are
//! deployed on each network. The result is a single [`Config`] value that is
//! passed by reference to the resolver and client constructors.
//!
//! Configuration can be read from the process environment
//! ([`Config::from_env`]) or from a TOML file with `${VAR}` /
//! `${VAR:-default}` substitution ([`Config::from_file`]).

mod endpoints;

pub use endpoints::{default_endpoints, resolve_endpoints, EndpointOverrides, Endpoints};

use dapp_types::{
	is_valid_address, BaseNetwork, ContractAddresses, NetworkId, COUNTER_MODULE,
};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Variable selecting the network.
pub const NETWORK_VAR: &str = "NETWORK";
/// Variable overriding the fullnode URL.
pub const NODE_URL_VAR: &str = "APTOS_NODE_URL";
/// Variable overriding the faucet URL.
pub const FAUCET_URL_VAR: &str = "APTOS_FAUCET_URL";
/// Variable overriding the indexer URL.
pub const INDEXER_URL_VAR: &str = "APTOS_INDEXER_URL";

/// Prefix used by the generated front-end `.env` files.
const PUBLIC_PREFIX: &str = "NEXT_PUBLIC_";

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
		// Extract just the message without the huge input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Returns the environment variable holding the package address of `network`.
///
/// Movement networks share the variables of the base network they alias to.
pub fn package_variable(network: NetworkId) -> &'static str {
	match network.base_network() {
		BaseNetwork::Devnet => "DEVNET_PACKAGE_ID",
		BaseNetwork::Testnet => "TESTNET_PACKAGE_ID",
		BaseNetwork::Mainnet => "MAINNET_PACKAGE_ID",
	}
}

/// Main configuration structure of the dApp.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
	/// Network selected for this process.
	#[serde(default)]
	pub network: NetworkId,
	/// Explicit endpoint overrides for the selected network.
	#[serde(default)]
	pub endpoints: EndpointOverrides,
	/// Contract address table per network.
	#[serde(default, deserialize_with = "deserialize_contracts")]
	pub contracts: HashMap<NetworkId, ContractAddresses>,
}

/// Result of [`Config::debug_report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractConfigReport {
	pub network: NetworkId,
	pub contract_address: String,
	pub is_valid: bool,
}

/// Deserializes the contract tables keyed by network name.
///
/// TOML table keys are strings, so they are parsed into [`NetworkId`] here.
fn deserialize_contracts<'de, D>(
	deserializer: D,
) -> Result<HashMap<NetworkId, ContractAddresses>, D::Error>
where
	D: Deserializer<'de>,
{
	let string_map: HashMap<String, ContractAddresses> = HashMap::deserialize(deserializer)?;
	let mut result = HashMap::new();

	for (key, value) in string_map {
		let network = key.parse::<NetworkId>().map_err(serde::de::Error::custom)?;
		result.insert(network, value);
	}

	Ok(result)
}

/// Largest configuration text accepted for `${VAR}` substitution.
const MAX_CONFIG_SIZE: usize = 1024 * 1024;

/// Expands `${VAR}` and `${VAR:-fallback}` references in configuration text
/// using the process environment.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	substitute_vars(input, |name| std::env::var(name).ok())
}

/// Expands variable references in `input` with values from `lookup`.
///
/// A reference without a fallback whose variable is unset is an error.
pub(crate) fn substitute_vars<F>(input: &str, lookup: F) -> Result<String, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	if input.len() > MAX_CONFIG_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration is {} bytes, the limit for variable substitution is {}",
			input.len(),
			MAX_CONFIG_SIZE
		)));
	}

	let pattern = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Invalid variable pattern: {}", e)))?;

	let mut output = String::with_capacity(input.len());
	let mut copied = 0;

	for captures in pattern.captures_iter(input) {
		let (Some(reference), Some(name)) = (captures.get(0), captures.get(1)) else {
			continue;
		};

		let value = match (lookup(name.as_str()), captures.get(2)) {
			(Some(value), _) => value,
			(None, Some(fallback)) => fallback.as_str().to_string(),
			(None, None) => {
				return Err(ConfigError::Validation(format!(
					"Configuration references unset variable {}",
					name.as_str()
				)))
			}
		};

		output.push_str(&input[copied..reference.start()]);
		output.push_str(&value);
		copied = reference.end();
	}
	output.push_str(&input[copied..]);

	Ok(output)
}

impl Config {
	/// Builds the configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_vars(|name| std::env::var(name).ok())
	}

	/// Builds the configuration from an arbitrary variable lookup.
	///
	/// Every variable is also looked up with the `NEXT_PUBLIC_` prefix; the
	/// unprefixed spelling wins when both are set. Empty values count as unset.
	pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let read = |name: &str| -> Option<String> {
			[name.to_string(), format!("{}{}", PUBLIC_PREFIX, name)]
				.iter()
				.find_map(|key| {
					lookup(key)
						.map(|value| value.trim().to_string())
						.filter(|value| !value.is_empty())
				})
		};

		let network = match read(NETWORK_VAR) {
			Some(value) => value
				.parse::<NetworkId>()
				.map_err(|e| ConfigError::Validation(e.to_string()))?,
			None => NetworkId::default(),
		};

		let endpoints = EndpointOverrides {
			node_url: read(NODE_URL_VAR),
			faucet_url: read(FAUCET_URL_VAR),
			indexer_url: read(INDEXER_URL_VAR),
		};

		let contracts = NetworkId::ALL
			.into_iter()
			.map(|id| {
				let address = read(package_variable(id)).unwrap_or_default();
				(id, ContractAddresses::new().with(COUNTER_MODULE, address))
			})
			.collect();

		let config = Self {
			network,
			endpoints,
			contracts,
		};
		config.validate()?;

		tracing::debug!(network = %config.network, "Loaded configuration from environment");
		Ok(config)
	}

	/// Loads configuration from a TOML file, resolving environment variables.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = tokio::fs::read_to_string(path).await?;
		let config: Config = content.parse()?;

		tracing::debug!(path = %path.display(), network = %config.network, "Loaded configuration file");
		Ok(config)
	}

	/// Returns the contract table of a network given by name.
	///
	/// Unrecognized names and networks without configured addresses yield an
	/// empty table, so every lookup returns the empty placeholder. This never
	/// fails; callers decide what to do with undeployed contracts.
	pub fn resolve(&self, network: &str) -> ContractAddresses {
		match network.parse::<NetworkId>() {
			Ok(id) => self.resolve_network(id),
			Err(e) => {
				tracing::warn!(error = %e, "No contract addresses for unrecognized network");
				ContractAddresses::new()
			}
		}
	}

	/// Returns the contract table of `network`.
	///
	/// Movement networks without their own table use the table of the base
	/// network they alias to.
	pub fn resolve_network(&self, network: NetworkId) -> ContractAddresses {
		self.contracts
			.get(&network)
			.or_else(|| {
				network
					.is_movement()
					.then(|| self.contracts.get(&NetworkId::from(network.base_network())))
					.flatten()
			})
			.cloned()
			.unwrap_or_default()
	}

	/// Returns the contract table of the selected network.
	pub fn contracts(&self) -> ContractAddresses {
		self.resolve_network(self.network)
	}

	/// Returns the endpoints of the selected network with overrides applied.
	pub fn endpoints(&self) -> Endpoints {
		resolve_endpoints(self.network, &self.endpoints)
	}

	/// Reports whether the counter contract is configured for the selected network.
	pub fn debug_report(&self) -> ContractConfigReport {
		let contracts = self.contracts();
		let contract_address = contracts.get(COUNTER_MODULE).to_string();
		let is_valid = contracts.is_deployed(COUNTER_MODULE);

		tracing::info!(network = %self.network, "Contract configuration");
		for base in [NetworkId::Devnet, NetworkId::Testnet, NetworkId::Mainnet] {
			tracing::info!(
				variable = package_variable(base),
				address = self.resolve_network(base).get(COUNTER_MODULE),
				"Package address"
			);
		}
		tracing::info!(counter_module = %contract_address, is_valid, "Counter module");

		if !is_valid {
			tracing::warn!(
				"Contract not configured, set {}=\"0xYOUR_CONTRACT_ADDRESS_HERE\"",
				package_variable(self.network)
			);
		}

		ContractConfigReport {
			network: self.network,
			contract_address,
			is_valid,
		}
	}

	/// Validates endpoint overrides and contract addresses.
	fn validate(&self) -> Result<(), ConfigError> {
		for (name, url) in self.endpoints.iter() {
			if !(url.starts_with("http://") || url.starts_with("https://")) {
				return Err(ConfigError::Validation(format!(
					"Endpoint {} must be an http(s) URL, got '{}'",
					name, url
				)));
			}
		}

		for (network, table) in &self.contracts {
			for (name, address) in table.iter() {
				let address = address.trim();
				if !address.is_empty() && !is_valid_address(address) {
					return Err(ConfigError::Validation(format!(
						"Invalid address '{}' for {} on {}",
						address, name, network
					)));
				}
			}
		}

		Ok(())
	}
}

/// Parses configuration from a TOML string.
///
/// Environment variables are resolved first and the configuration is
/// validated after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let mut config: Config = toml::from_str(&resolved)?;
		config.endpoints = config.endpoints.normalized();
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |name| map.get(name).cloned()
	}

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("DAPP_TEST_HOST", "localhost");
		std::env::set_var("DAPP_TEST_PORT", "8080");

		let input = "node_url = \"http://${DAPP_TEST_HOST}:${DAPP_TEST_PORT}/v1\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "node_url = \"http://localhost:8080/v1\"");

		std::env::remove_var("DAPP_TEST_HOST");
		std::env::remove_var("DAPP_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${DAPP_MISSING_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");

		let empty = resolve_env_vars("value = \"${DAPP_MISSING_VAR:-}\"").unwrap();
		assert_eq!(empty, "value = \"\"");
	}

	#[test]
	fn test_substitution_uses_lookup() {
		let lookup = vars(&[("DAPP_PACKAGE", "0xcafe")]);
		let input = "a = \"${DAPP_PACKAGE}\"\nb = \"${DAPP_NODE:-https://node}/v1\"";
		assert_eq!(
			substitute_vars(input, lookup).unwrap(),
			"a = \"0xcafe\"\nb = \"https://node/v1\""
		);
	}

	#[test]
	fn test_substitution_rejects_oversized_input() {
		let input = "x".repeat(MAX_CONFIG_SIZE + 1);
		assert!(matches!(
			substitute_vars(&input, |_| None),
			Err(ConfigError::Validation(_))
		));
	}

	#[test]
	fn test_missing_env_var_error() {
		let result = resolve_env_vars("value = \"${DAPP_MISSING_VAR}\"");
		assert!(result.unwrap_err().to_string().contains("DAPP_MISSING_VAR"));
	}

	#[test]
	fn test_unset_package_variable_resolves_to_placeholder() {
		let config = Config::from_vars(vars(&[("NETWORK", "testnet")])).unwrap();

		let contracts = config.resolve("testnet");
		assert_eq!(contracts.get(COUNTER_MODULE), "");
		assert!(!contracts.is_deployed(COUNTER_MODULE));
	}

	#[test]
	fn test_network_defaults_to_devnet() {
		let config = Config::from_vars(vars(&[])).unwrap();
		assert_eq!(config.network, NetworkId::Devnet);
		assert_eq!(
			config.endpoints().node_url,
			"https://fullnode.devnet.aptoslabs.com/v1"
		);
	}

	#[test]
	fn test_public_prefix_fallback_and_precedence() {
		let config = Config::from_vars(vars(&[
			("NEXT_PUBLIC_NETWORK", "testnet"),
			("NEXT_PUBLIC_TESTNET_PACKAGE_ID", "0xaaa"),
			("TESTNET_PACKAGE_ID", "0xbbb"),
			("NEXT_PUBLIC_MAINNET_PACKAGE_ID", "0xccc"),
		]))
		.unwrap();

		assert_eq!(config.network, NetworkId::Testnet);
		assert_eq!(config.contracts().get(COUNTER_MODULE), "0xbbb");
		assert_eq!(config.resolve("mainnet").get(COUNTER_MODULE), "0xccc");
	}

	#[test]
	fn test_movement_networks_share_base_package_variables() {
		let config = Config::from_vars(vars(&[
			("NETWORK", "movement-testnet"),
			("TESTNET_PACKAGE_ID", "0xabc"),
			("APTOS_NODE_URL", "https://aptos.testnet.porto.movementlabs.xyz/v1"),
		]))
		.unwrap();

		assert_eq!(config.contracts().get(COUNTER_MODULE), "0xabc");
		assert_eq!(
			config.endpoints().node_url,
			"https://aptos.testnet.porto.movementlabs.xyz/v1"
		);
		assert_eq!(package_variable(NetworkId::MovementMainnet), "MAINNET_PACKAGE_ID");
	}

	#[test]
	fn test_unknown_network_variable_is_rejected() {
		let err = Config::from_vars(vars(&[("NETWORK", "localnet")])).unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));
		assert!(err.to_string().contains("localnet"));
	}

	#[test]
	fn test_resolve_unknown_network_fails_closed() {
		let config = Config::from_vars(vars(&[("TESTNET_PACKAGE_ID", "0xabc")])).unwrap();
		let contracts = config.resolve("not-a-network");
		assert!(contracts.is_empty());
		assert_eq!(contracts.get(COUNTER_MODULE), "");
	}

	#[test]
	fn test_invalid_override_url_is_rejected() {
		let err = Config::from_vars(vars(&[("APTOS_NODE_URL", "fullnode.local")])).unwrap_err();
		assert!(err.to_string().contains("node_url"));
	}

	#[test]
	fn test_invalid_package_address_is_rejected() {
		let err = Config::from_vars(vars(&[("DEVNET_PACKAGE_ID", "not-hex")])).unwrap_err();
		assert!(err.to_string().contains("not-hex"));
	}

	#[test]
	fn test_toml_config_with_env_vars() {
		std::env::set_var("DAPP_TEST_TESTNET_PACKAGE", "0xee65");

		let config_str = r#"
network = "movement-testnet"

[endpoints]
node_url = "https://aptos.testnet.porto.movementlabs.xyz/v1"
faucet_url = "${DAPP_TEST_FAUCET:-}"

[contracts.testnet]
CounterModule = "${DAPP_TEST_TESTNET_PACKAGE}"

[contracts.mainnet]
CounterModule = ""
"#;

		let config: Config = config_str.parse().unwrap();
		assert_eq!(config.network, NetworkId::MovementTestnet);
		assert!(config.endpoints.faucet_url.is_none());
		// movement-testnet has no table of its own and falls back to testnet
		assert_eq!(config.contracts().get(COUNTER_MODULE), "0xee65");
		assert!(!config.resolve("mainnet").is_deployed(COUNTER_MODULE));

		std::env::remove_var("DAPP_TEST_TESTNET_PACKAGE");
	}

	#[test]
	fn test_toml_unknown_network_key_rejected() {
		let config_str = r#"
[contracts.localnet]
CounterModule = "0x2"
"#;
		let err = Config::from_str(config_str).unwrap_err();
		assert!(matches!(err, ConfigError::Parse(_)));
	}

	#[test]
	fn test_debug_report_flags_placeholder_address() {
		let config = Config::from_vars(vars(&[("DEVNET_PACKAGE_ID", "0x1")])).unwrap();
		let report = config.debug_report();
		assert_eq!(report.network, NetworkId::Devnet);
		assert_eq!(report.contract_address, "0x1");
		assert!(!report.is_valid);

		let config = Config::from_vars(vars(&[("DEVNET_PACKAGE_ID", "0xcafe")])).unwrap();
		assert!(config.debug_report().is_valid);
	}

	#[tokio::test]
	async fn test_from_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("dapp.toml");
		tokio::fs::write(
			&path,
			"network = \"mainnet\"\n[contracts.mainnet]\nCounterModule = \"0xbeef\"\n",
		)
		.await
		.unwrap();

		let config = Config::from_file(&path).await.unwrap();
		assert_eq!(config.network, NetworkId::Mainnet);
		assert_eq!(config.contracts().get(COUNTER_MODULE), "0xbeef");
		assert!(config.endpoints().faucet_url.is_none());
	}

	#[tokio::test]
	async fn test_from_missing_file() {
		let err = Config::from_file("/nonexistent/dapp.toml").await.unwrap_err();
		assert!(matches!(err, ConfigError::Io(_)));
	}
}
