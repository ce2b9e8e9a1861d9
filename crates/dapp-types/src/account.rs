//! Account types for read-only chain queries.

use serde::{Deserialize, Serialize};

/// On-chain account resource summary.
///
/// Mirrors the fields the fullnode returns for `GET /accounts/{address}`,
/// with the sequence number decoded from its string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
	/// Next sequence number the account will use.
	pub sequence_number: u64,
	/// Authentication key bound to the account.
	pub authentication_key: String,
}

/// Counter state stored under an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterData {
	pub value: u64,
	pub is_initialized: bool,
	pub owner: String,
}

/// Aggregated view of a user for display purposes.
///
/// `counter_data` is `None` when the counter contract is not deployed on the
/// selected network or could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
	pub address: String,
	/// Balance in octas.
	pub apt_balance: u64,
	pub counter_data: Option<CounterData>,
	pub account_info: Option<AccountInfo>,
}
