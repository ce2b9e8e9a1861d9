//! Network configuration types for the counter dApp.
//!
//! This module defines the enumerated set of supported networks, the base
//! network each one aliases to for wallet purposes, and the table mapping
//! logical contract names to deployed addresses.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Logical contract name of the counter Move module.
pub const COUNTER_MODULE: &str = "CounterModule";

/// Well-known null address used as the "not deployed yet" sentinel.
pub const PLACEHOLDER_ADDRESS: &str = "0x1";

/// Returned when a string does not name a supported network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown network '{0}' (expected one of: devnet, testnet, mainnet, movement-testnet, movement-mainnet)")]
pub struct ParseNetworkError(pub String);

/// Networks the dApp can be pointed at.
///
/// The movement variants are alternate networks that expose an
/// Aptos-compatible API and are presented to wallets as testnet/mainnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkId {
	#[default]
	Devnet,
	Testnet,
	Mainnet,
	MovementTestnet,
	MovementMainnet,
}

/// The three networks wallet libraries know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseNetwork {
	Devnet,
	Testnet,
	Mainnet,
}

impl NetworkId {
	/// All supported networks, in declaration order.
	pub const ALL: [NetworkId; 5] = [
		NetworkId::Devnet,
		NetworkId::Testnet,
		NetworkId::Mainnet,
		NetworkId::MovementTestnet,
		NetworkId::MovementMainnet,
	];

	/// Returns the kebab-case identifier of this network.
	pub fn as_str(&self) -> &'static str {
		match self {
			NetworkId::Devnet => "devnet",
			NetworkId::Testnet => "testnet",
			NetworkId::Mainnet => "mainnet",
			NetworkId::MovementTestnet => "movement-testnet",
			NetworkId::MovementMainnet => "movement-mainnet",
		}
	}

	/// Returns the base network this network aliases to for wallet purposes.
	pub fn base_network(&self) -> BaseNetwork {
		match self {
			NetworkId::Devnet => BaseNetwork::Devnet,
			NetworkId::Testnet | NetworkId::MovementTestnet => BaseNetwork::Testnet,
			NetworkId::Mainnet | NetworkId::MovementMainnet => BaseNetwork::Mainnet,
		}
	}

	/// Whether this is one of the alternate (non-Aptos) networks.
	pub fn is_movement(&self) -> bool {
		matches!(self, NetworkId::MovementTestnet | NetworkId::MovementMainnet)
	}
}

impl BaseNetwork {
	pub fn as_str(&self) -> &'static str {
		match self {
			BaseNetwork::Devnet => "devnet",
			BaseNetwork::Testnet => "testnet",
			BaseNetwork::Mainnet => "mainnet",
		}
	}
}

impl From<BaseNetwork> for NetworkId {
	fn from(base: BaseNetwork) -> Self {
		match base {
			BaseNetwork::Devnet => NetworkId::Devnet,
			BaseNetwork::Testnet => NetworkId::Testnet,
			BaseNetwork::Mainnet => NetworkId::Mainnet,
		}
	}
}

impl fmt::Display for NetworkId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl fmt::Display for BaseNetwork {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for NetworkId {
	type Err = ParseNetworkError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let normalized = s.trim().to_ascii_lowercase();
		NetworkId::ALL
			.into_iter()
			.find(|network| network.as_str() == normalized)
			.ok_or_else(|| ParseNetworkError(s.to_string()))
	}
}

/// Returns true when the address denotes "no contract deployed".
///
/// Empty, whitespace-only and the null address `0x1` all count as placeholders.
pub fn is_placeholder_address(address: &str) -> bool {
	let trimmed = address.trim();
	trimmed.is_empty() || trimmed == PLACEHOLDER_ADDRESS
}

/// Mapping from logical contract name to deployed address.
///
/// Lookups never fail: an unknown name resolves to the empty string, which
/// callers must treat as "not deployed".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractAddresses(HashMap<String, String>);

impl ContractAddresses {
	/// Creates an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds or replaces the address of a contract, returning the table.
	pub fn with(mut self, name: impl Into<String>, address: impl Into<String>) -> Self {
		self.insert(name, address);
		self
	}

	pub fn insert(&mut self, name: impl Into<String>, address: impl Into<String>) {
		self.0.insert(name.into(), address.into());
	}

	/// Returns the address of a contract, or `""` when it is not configured.
	pub fn get(&self, name: &str) -> &str {
		self.0.get(name).map(String::as_str).unwrap_or("")
	}

	/// Whether the contract has a non-placeholder address.
	pub fn is_deployed(&self, name: &str) -> bool {
		!is_placeholder_address(self.get(name))
	}

	/// Iterates over `(name, address)` pairs.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl FromIterator<(String, String)> for ContractAddresses {
	fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}
