//! Chain client module for the counter dApp.
//!
//! This module handles confirmation of submitted transactions and the
//! read-only queries the dApp needs (view functions, account info, balance).
//! It provides an abstraction over the ledger API so the lifecycle wrapper
//! and read paths can be exercised against mocks.

use async_trait::async_trait;
use dapp_types::{
	truncate_id, AccountInfo, PendingTransaction, TransactionHash, TransactionOptions,
	TransactionOutcome, TransactionRequest,
};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod aptos;
}

/// Errors that can occur during chain client operations.
#[derive(Debug, Error)]
pub enum ClientError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// The requested resource does not exist on chain.
	#[error("Not found: {0}")]
	NotFound(String),
	/// The transaction was not confirmed in time. Its outcome is unknown.
	#[error("Timed out after {timeout_secs}s waiting for transaction {hash}")]
	Timeout {
		hash: TransactionHash,
		timeout_secs: u64,
	},
	/// The transaction was committed but aborted during execution.
	#[error("Transaction {hash} failed: {vm_status}")]
	TransactionFailed {
		hash: TransactionHash,
		vm_status: String,
	},
	/// The node answered with something that could not be decoded.
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
	/// The selected network has no faucet.
	#[error("No faucet configured for this network")]
	FaucetUnavailable,
}

/// Trait defining the interface for chain client implementations.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ChainClientInterface: Send + Sync {
	/// Waits for a submitted transaction to reach a final outcome.
	///
	/// Fails with [`ClientError::Timeout`] after `options.timeout_secs`, and
	/// with [`ClientError::TransactionFailed`] for aborted transactions when
	/// `options.check_success` is set. With `options.wait_for_indexer` the
	/// call also waits until the indexer has processed the transaction.
	async fn wait_for_outcome(
		&self,
		pending: &PendingTransaction,
		options: &TransactionOptions,
	) -> Result<TransactionOutcome, ClientError>;

	/// Executes a view function and returns its JSON results.
	async fn view(&self, request: &TransactionRequest)
		-> Result<Vec<serde_json::Value>, ClientError>;

	/// Reads the account resource of an address.
	async fn get_account_info(&self, address: &str) -> Result<AccountInfo, ClientError>;

	/// Returns the APT balance of an address in octas.
	async fn get_balance(&self, address: &str) -> Result<u64, ClientError>;

	/// Requests test funds from the network faucet.
	async fn fund_account(
		&self,
		address: &str,
		amount: u64,
	) -> Result<Vec<TransactionHash>, ClientError>;
}

/// Service that wraps a chain client implementation.
///
/// The service is the handle passed to the lifecycle wrapper and the read
/// paths. It adds logging around the underlying implementation.
pub struct ChainClient {
	implementation: Box<dyn ChainClientInterface>,
}

impl ChainClient {
	/// Creates a new ChainClient with the specified implementation.
	pub fn new(implementation: Box<dyn ChainClientInterface>) -> Self {
		Self { implementation }
	}

	/// Waits for a submitted transaction to reach a final outcome.
	pub async fn wait_for_outcome(
		&self,
		pending: &PendingTransaction,
		options: &TransactionOptions,
	) -> Result<TransactionOutcome, ClientError> {
		tracing::debug!(
			tx_hash = %truncate_id(pending.hash.as_str()),
			check_success = options.check_success,
			wait_for_indexer = options.wait_for_indexer,
			timeout_secs = options.timeout_secs,
			"Waiting for transaction"
		);

		let outcome = self.implementation.wait_for_outcome(pending, options).await?;
		tracing::info!(
			tx_hash = %truncate_id(outcome.hash.as_str()),
			version = outcome.version,
			success = outcome.success,
			"Confirmed"
		);
		Ok(outcome)
	}

	/// Executes a view function.
	pub async fn view(
		&self,
		request: &TransactionRequest,
	) -> Result<Vec<serde_json::Value>, ClientError> {
		self.implementation.view(request).await
	}

	/// Reads the account resource of an address.
	pub async fn get_account_info(&self, address: &str) -> Result<AccountInfo, ClientError> {
		self.implementation.get_account_info(address).await
	}

	/// Returns the APT balance of an address in octas.
	pub async fn get_balance(&self, address: &str) -> Result<u64, ClientError> {
		self.implementation.get_balance(address).await
	}

	/// Requests test funds from the network faucet.
	pub async fn fund_account(
		&self,
		address: &str,
		amount: u64,
	) -> Result<Vec<TransactionHash>, ClientError> {
		let hashes = self.implementation.fund_account(address, amount).await?;
		tracing::info!(address = %truncate_id(address), amount, transactions = hashes.len(), "Funded account");
		Ok(hashes)
	}
}
