//! Counter entry function builders.
//!
//! Each builder targets `<CounterModule>::counter::<function>` and takes no
//! Move arguments; the signer is the account that submits the transaction.

use dapp_types::{ContractAddresses, TransactionRequest, COUNTER_MODULE};

/// Move module name of the counter contract.
pub const COUNTER_MODULE_NAME: &str = "counter";

fn counter_call(contracts: &ContractAddresses, function: &str) -> TransactionRequest {
	TransactionRequest::entry_function(contracts.get(COUNTER_MODULE), COUNTER_MODULE_NAME, function)
}

/// Publishes a counter resource under the signer.
pub fn build_initialize_counter_tx(contracts: &ContractAddresses, _params: ()) -> TransactionRequest {
	counter_call(contracts, "initialize")
}

pub fn build_increment_counter_tx(contracts: &ContractAddresses, _params: ()) -> TransactionRequest {
	counter_call(contracts, "increment")
}

pub fn build_decrement_counter_tx(contracts: &ContractAddresses, _params: ()) -> TransactionRequest {
	counter_call(contracts, "decrement")
}

/// Sets the signer's counter back to zero.
pub fn build_reset_counter_tx(contracts: &ContractAddresses, _params: ()) -> TransactionRequest {
	counter_call(contracts, "reset")
}
