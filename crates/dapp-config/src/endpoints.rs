//! Endpoint selection for the supported networks.
//!
//! Each network has built-in node, faucet and indexer endpoints. Explicit
//! overrides from the configuration take precedence over the defaults, which
//! lets a testnet-shaped setup point at an alternate compatible network.

use dapp_types::NetworkId;
use serde::{Deserialize, Serialize};

/// Endpoints used to construct the chain client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
	/// Fullnode REST API base URL (ends with `/v1`).
	pub node_url: String,
	/// Faucet base URL, absent on networks without a faucet.
	pub faucet_url: Option<String>,
	/// Indexer GraphQL URL, absent when the network has no hosted indexer.
	pub indexer_url: Option<String>,
}

/// Explicit endpoint overrides.
///
/// Empty strings are treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointOverrides {
	#[serde(default)]
	pub node_url: Option<String>,
	#[serde(default)]
	pub faucet_url: Option<String>,
	#[serde(default)]
	pub indexer_url: Option<String>,
}

impl EndpointOverrides {
	/// Drops overrides that are empty or whitespace-only.
	pub(crate) fn normalized(self) -> Self {
		fn keep(value: Option<String>) -> Option<String> {
			value
				.map(|v| v.trim().to_string())
				.filter(|v| !v.is_empty())
		}

		Self {
			node_url: keep(self.node_url),
			faucet_url: keep(self.faucet_url),
			indexer_url: keep(self.indexer_url),
		}
	}

	/// Iterates over the configured overrides as `(name, url)` pairs.
	pub(crate) fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
		[
			("node_url", self.node_url.as_deref()),
			("faucet_url", self.faucet_url.as_deref()),
			("indexer_url", self.indexer_url.as_deref()),
		]
		.into_iter()
		.filter_map(|(name, url)| url.map(|u| (name, u)))
	}
}

/// Returns the built-in endpoints of a network.
pub fn default_endpoints(network: NetworkId) -> Endpoints {
	let (node, faucet, indexer) = match network {
		NetworkId::Devnet => (
			"https://fullnode.devnet.aptoslabs.com/v1",
			Some("https://faucet.devnet.aptoslabs.com"),
			Some("https://api.devnet.aptoslabs.com/v1/graphql"),
		),
		NetworkId::Testnet => (
			"https://fullnode.testnet.aptoslabs.com/v1",
			Some("https://faucet.testnet.aptoslabs.com"),
			Some("https://api.testnet.aptoslabs.com/v1/graphql"),
		),
		NetworkId::Mainnet => (
			"https://fullnode.mainnet.aptoslabs.com/v1",
			None,
			Some("https://api.mainnet.aptoslabs.com/v1/graphql"),
		),
		NetworkId::MovementTestnet => (
			"https://aptos.testnet.porto.movementlabs.xyz/v1",
			Some("https://faucet.testnet.porto.movementlabs.xyz"),
			None,
		),
		NetworkId::MovementMainnet => ("https://mainnet.movementnetwork.xyz/v1", None, None),
	};

	Endpoints {
		node_url: node.to_string(),
		faucet_url: faucet.map(str::to_string),
		indexer_url: indexer.map(str::to_string),
	}
}

/// Applies overrides on top of the defaults of `network`.
///
/// Each override replaces the corresponding default independently.
pub fn resolve_endpoints(network: NetworkId, overrides: &EndpointOverrides) -> Endpoints {
	let defaults = default_endpoints(network);

	Endpoints {
		node_url: overrides.node_url.clone().unwrap_or(defaults.node_url),
		faucet_url: overrides.faucet_url.clone().or(defaults.faucet_url),
		indexer_url: overrides.indexer_url.clone().or(defaults.indexer_url),
	}
}
