//! Wallet signing capability for the counter dApp.
//!
//! The wallet is an external collaborator: it owns the signing identity,
//! may ask the user for approval and submits the signed transaction to the
//! ledger. This crate defines the boundary the lifecycle wrapper depends on
//! and a thin service that wraps one implementation.

use async_trait::async_trait;
use dapp_types::{truncate_id, PendingTransaction, TransactionRequest};
use thiserror::Error;

/// Errors that can occur during wallet operations.
#[derive(Debug, Error)]
pub enum WalletError {
	/// The user declined the request in the wallet.
	#[error("User rejected the request: {0}")]
	Rejected(String),
	/// Signing or submission failed.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// Error that occurs when interacting with the wallet implementation.
	#[error("Implementation error: {0}")]
	Implementation(String),
}

/// Trait defining the interface for wallet implementations.
///
/// Implementations sign the request with the connected account and submit it,
/// returning the pending handle without waiting for confirmation.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait WalletInterface: Send + Sync {
	/// Returns the address of the connected account.
	async fn address(&self) -> Result<String, WalletError>;

	/// Signs and submits a transaction.
	///
	/// May fail when the user rejects the request or the payload is malformed.
	async fn sign_and_submit(
		&self,
		request: &TransactionRequest,
	) -> Result<PendingTransaction, WalletError>;
}

/// Service that manages wallet operations.
///
/// This struct wraps an underlying wallet implementation.
pub struct WalletService {
	implementation: Box<dyn WalletInterface>,
}

impl WalletService {
	/// Creates a new WalletService with the specified implementation.
	pub fn new(implementation: Box<dyn WalletInterface>) -> Self {
		Self { implementation }
	}

	/// Retrieves the address of the connected account.
	pub async fn get_address(&self) -> Result<String, WalletError> {
		self.implementation.address().await
	}

	/// Signs and submits a transaction through the wallet.
	pub async fn sign_and_submit(
		&self,
		request: &TransactionRequest,
	) -> Result<PendingTransaction, WalletError> {
		tracing::debug!(function = %request.function, "Requesting wallet signature");

		match self.implementation.sign_and_submit(request).await {
			Ok(pending) => {
				tracing::info!(
					tx_hash = %truncate_id(pending.hash.as_str()),
					function = %request.function,
					"Submitted transaction"
				);
				Ok(pending)
			}
			Err(e) => {
				tracing::warn!(function = %request.function, error = %e, "Wallet did not submit transaction");
				Err(e)
			}
		}
	}
}
