//! Read-only queries for the counter and accounts.
//!
//! None of these calls fail: errors are logged and mapped to an empty value
//! (`None`, `false` or `0`) so display code can render partial data.

use super::counter::COUNTER_MODULE_NAME;
use dapp_client::ChainClient;
use dapp_types::{
	truncate_id, AccountInfo, ContractAddresses, CounterData, TransactionRequest, UserProfile,
	COUNTER_MODULE,
};
use std::sync::Arc;

/// Counter and account reads against one network.
pub struct CounterQueries {
	client: Arc<ChainClient>,
	contracts: ContractAddresses,
}

impl CounterQueries {
	pub fn new(client: Arc<ChainClient>, contracts: ContractAddresses) -> Self {
		Self { client, contracts }
	}

	/// Address of the counter module, or `None` while it is not deployed.
	fn counter_address(&self) -> Option<&str> {
		if self.contracts.is_deployed(COUNTER_MODULE) {
			Some(self.contracts.get(COUNTER_MODULE))
		} else {
			tracing::warn!("Counter contract not deployed yet, deploy it and set its address");
			None
		}
	}

	fn view_request(module_address: &str, function: &str, account: &str) -> TransactionRequest {
		TransactionRequest::entry_function(module_address, COUNTER_MODULE_NAME, function)
			.with_argument(account)
	}

	/// Returns the counter value of `account`.
	pub async fn get_counter_value(&self, account: &str) -> Option<u64> {
		let module_address = self.counter_address()?;
		let request = Self::view_request(module_address, "get_counter", account);

		match self.client.view(&request).await {
			Ok(values) => {
				let value = values.first().and_then(parse_u64);
				if value.is_none() {
					tracing::error!(account = %truncate_id(account), ?values, "Unexpected counter value");
				}
				value
			}
			Err(e) => {
				tracing::error!(account = %truncate_id(account), error = %e, "Failed to fetch counter value");
				None
			}
		}
	}

	/// Whether `account` has published a counter.
	pub async fn is_counter_initialized(&self, account: &str) -> bool {
		let Some(module_address) = self.counter_address() else {
			return false;
		};
		let request = Self::view_request(module_address, "is_initialized", account);

		match self.client.view(&request).await {
			Ok(values) => values
				.first()
				.and_then(serde_json::Value::as_bool)
				.unwrap_or(false),
			Err(e) => {
				tracing::error!(account = %truncate_id(account), error = %e, "Failed to check counter initialization");
				false
			}
		}
	}

	pub async fn get_account_info(&self, account: &str) -> Option<AccountInfo> {
		match self.client.get_account_info(account).await {
			Ok(info) => Some(info),
			Err(e) => {
				tracing::error!(account = %truncate_id(account), error = %e, "Failed to fetch account info");
				None
			}
		}
	}

	/// APT balance in octas, `0` when it cannot be read.
	pub async fn get_account_apt_balance(&self, account: &str) -> u64 {
		match self.client.get_balance(account).await {
			Ok(balance) => balance,
			Err(e) => {
				tracing::error!(account = %truncate_id(account), error = %e, "Failed to fetch APT balance");
				0
			}
		}
	}

	pub async fn check_account_exists(&self, account: &str) -> bool {
		self.get_account_info(account).await.is_some()
	}

	/// Loads everything the profile view shows for `account`.
	pub async fn load_user_profile(&self, account: &str) -> UserProfile {
		let (apt_balance, account_info, counter_data) = tokio::join!(
			self.get_account_apt_balance(account),
			self.get_account_info(account),
			self.load_counter_data(account),
		);

		UserProfile {
			address: account.to_string(),
			apt_balance,
			counter_data,
			account_info,
		}
	}

	async fn load_counter_data(&self, account: &str) -> Option<CounterData> {
		if !self.contracts.is_deployed(COUNTER_MODULE) {
			return None;
		}

		let is_initialized = self.is_counter_initialized(account).await;
		let value = if is_initialized {
			self.get_counter_value(account).await.unwrap_or(0)
		} else {
			0
		};

		Some(CounterData {
			value,
			is_initialized,
			owner: account.to_string(),
		})
	}
}

/// View results encode `u64` as a decimal string; plain numbers are accepted too.
fn parse_u64(value: &serde_json::Value) -> Option<u64> {
	match value {
		serde_json::Value::String(s) => s.parse().ok(),
		other => other.as_u64(),
	}
}
