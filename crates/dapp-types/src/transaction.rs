//! Transaction types for the counter dApp.
//!
//! This module defines the payload handed to the wallet for signing, the
//! pending handle the wallet returns, the confirmed outcome the chain client
//! produces, and the options that control how confirmation is awaited.

use crate::utils::with_0x_prefix;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Entry function call payload.
///
/// The same shape is used for view function requests. Once built it is not
/// modified; a lifecycle wrapper invocation consumes exactly one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
	/// Fully qualified function, `<address>::<module>::<function>`.
	pub function: String,
	/// Move type arguments.
	#[serde(default)]
	pub type_arguments: Vec<String>,
	/// JSON-encoded function arguments.
	#[serde(default)]
	pub arguments: Vec<serde_json::Value>,
}

impl TransactionRequest {
	/// Creates a request calling `function` in `module` published at `module_address`.
	pub fn entry_function(module_address: &str, module: &str, function: &str) -> Self {
		Self {
			function: format!("{}::{}::{}", module_address, module, function),
			type_arguments: Vec::new(),
			arguments: Vec::new(),
		}
	}

	pub fn with_type_argument(mut self, type_argument: impl Into<String>) -> Self {
		self.type_arguments.push(type_argument.into());
		self
	}

	pub fn with_argument(mut self, argument: impl Into<serde_json::Value>) -> Self {
		self.arguments.push(argument.into());
		self
	}

	/// Returns the address part of the function identifier.
	pub fn module_address(&self) -> &str {
		self.function.split("::").next().unwrap_or_default()
	}
}

/// Transaction hash as a `0x`-prefixed hex string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionHash(String);

impl TransactionHash {
	pub fn new(hash: impl AsRef<str>) -> Self {
		Self(with_0x_prefix(hash.as_ref().trim()).to_lowercase())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for TransactionHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for TransactionHash {
	fn from(s: &str) -> Self {
		Self::new(s)
	}
}

impl From<String> for TransactionHash {
	fn from(s: String) -> Self {
		Self::new(s)
	}
}

/// Handle for a submitted but unconfirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
	pub hash: TransactionHash,
	#[serde(default)]
	pub sender: Option<String>,
	#[serde(default)]
	pub sequence_number: Option<u64>,
}

impl PendingTransaction {
	pub fn new(hash: impl Into<TransactionHash>) -> Self {
		Self {
			hash: hash.into(),
			sender: None,
			sequence_number: None,
		}
	}
}

/// Confirmed transaction record produced by the chain client.
///
/// Passed by value to lifecycle callbacks and never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutcome {
	pub hash: TransactionHash,
	/// Ledger version assigned to the transaction.
	pub version: u64,
	/// Whether the Move VM executed the transaction without aborting.
	pub success: bool,
	pub vm_status: String,
	pub gas_used: u64,
	pub sender: String,
	/// Block timestamp in microseconds.
	pub timestamp: u64,
}

/// Options controlling how a submitted transaction is awaited.
///
/// Every field falls back to its default when omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOptions {
	/// Treat an on-chain abort as a failure.
	#[serde(default = "default_true")]
	pub check_success: bool,
	/// Block until the indexer has observed the transaction.
	#[serde(default = "default_true")]
	pub wait_for_indexer: bool,
	/// Maximum seconds to wait for confirmation.
	#[serde(default = "default_timeout_secs")]
	pub timeout_secs: u64,
}

fn default_true() -> bool {
	true
}

fn default_timeout_secs() -> u64 {
	30
}

impl Default for TransactionOptions {
	fn default() -> Self {
		Self {
			check_success: true,
			wait_for_indexer: true,
			timeout_secs: default_timeout_secs(),
		}
	}
}

impl TransactionOptions {
	pub fn with_check_success(mut self, check_success: bool) -> Self {
		self.check_success = check_success;
		self
	}

	pub fn with_wait_for_indexer(mut self, wait_for_indexer: bool) -> Self {
		self.wait_for_indexer = wait_for_indexer;
		self
	}

	pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
		self.timeout_secs = timeout_secs;
		self
	}

	pub fn timeout(&self) -> std::time::Duration {
		std::time::Duration::from_secs(self.timeout_secs)
	}
}
