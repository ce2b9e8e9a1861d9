//! Normalized errors of the transaction lifecycle.

use dapp_client::ClientError;
use dapp_types::TransactionHash;
use dapp_wallet::WalletError;
use thiserror::Error;

/// Single error value produced by a failed execution.
///
/// Every failure inside `execute` is normalized into one of these variants,
/// stored as the executor's last error and handed to the `on_error` callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
	/// The pre-flight check rejected the operation. Nothing was submitted.
	#[error("Validation failed: {0}")]
	Validation(String),
	/// The wallet rejected or failed to sign and submit the transaction.
	#[error("Submission failed: {0}")]
	Submission(String),
	/// No outcome arrived in time. The transaction may still land on chain.
	#[error("Timed out after {timeout_secs}s waiting for transaction {hash}, outcome unknown")]
	ConfirmationTimeout {
		hash: TransactionHash,
		timeout_secs: u64,
	},
	/// The transaction was committed but aborted during execution.
	#[error("Transaction {hash} aborted on chain: {vm_status}")]
	OnChainFailure {
		hash: TransactionHash,
		vm_status: String,
	},
	/// Any other failure while waiting for the outcome.
	#[error("Confirmation failed: {0}")]
	Confirmation(String),
}

impl ExecutionError {
	/// Hash of the submitted transaction, when the failure happened after submission.
	pub fn transaction_hash(&self) -> Option<&TransactionHash> {
		match self {
			ExecutionError::ConfirmationTimeout { hash, .. }
			| ExecutionError::OnChainFailure { hash, .. } => Some(hash),
			_ => None,
		}
	}

	/// Whether the transaction may or may not have been applied.
	pub fn is_outcome_unknown(&self) -> bool {
		matches!(self, ExecutionError::ConfirmationTimeout { .. })
	}
}

impl From<WalletError> for ExecutionError {
	fn from(err: WalletError) -> Self {
		ExecutionError::Submission(err.to_string())
	}
}

impl From<ClientError> for ExecutionError {
	fn from(err: ClientError) -> Self {
		match err {
			ClientError::Timeout { hash, timeout_secs } => {
				ExecutionError::ConfirmationTimeout { hash, timeout_secs }
			}
			ClientError::TransactionFailed { hash, vm_status } => {
				ExecutionError::OnChainFailure { hash, vm_status }
			}
			other => ExecutionError::Confirmation(other.to_string()),
		}
	}
}
