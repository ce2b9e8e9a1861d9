//! Contract bindings for the counter dApp.
//!
//! Transaction builders turn parameters into [`TransactionRequest`]s against
//! the contract table of the selected network. [`TxFactory`] binds that table
//! once so the builders can be handed to a
//! [`TransactionExecutor`](crate::TransactionExecutor) as plain `Fn(P)` values.

pub mod counter;
pub mod query;

use dapp_config::Config;
use dapp_types::{ContractAddresses, TransactionRequest};

/// Binds builder functions to a resolved contract table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxFactory {
	contracts: ContractAddresses,
}

impl TxFactory {
	/// Creates a factory for the network selected in `config`.
	pub fn new(config: &Config) -> Self {
		Self::from_contracts(config.contracts())
	}

	pub fn from_contracts(contracts: ContractAddresses) -> Self {
		Self { contracts }
	}

	pub fn contracts(&self) -> &ContractAddresses {
		&self.contracts
	}

	/// Wraps `builder` into a closure that only takes the call parameters.
	///
	/// The closure owns a copy of the contract table, so it stays valid
	/// independently of the factory.
	pub fn create<P, F>(&self, builder: F) -> impl Fn(P) -> TransactionRequest + Send + Sync + Clone
	where
		F: Fn(&ContractAddresses, P) -> TransactionRequest + Send + Sync + Clone,
	{
		let contracts = self.contracts.clone();
		move |params| builder(&contracts, params)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use dapp_types::{NetworkId, COUNTER_MODULE};
	use std::collections::HashMap;

	#[test]
	fn test_create_binds_contract_table() {
		let factory =
			TxFactory::from_contracts(ContractAddresses::new().with(COUNTER_MODULE, "0xcafe"));
		let build = factory.create(|contracts: &ContractAddresses, amount: u64| {
			TransactionRequest::entry_function(contracts.get(COUNTER_MODULE), "counter", "add")
				.with_argument(amount)
		});

		let request = build(3);
		assert_eq!(request.function, "0xcafe::counter::add");
		assert_eq!(request.arguments, vec![serde_json::json!(3)]);
	}

	#[test]
	fn test_new_uses_selected_network() {
		let vars: HashMap<&str, &str> = [
			("NETWORK", "testnet"),
			("TESTNET_PACKAGE_ID", "0xbeef"),
			("DEVNET_PACKAGE_ID", "0xcafe"),
		]
		.into_iter()
		.collect();
		let config = Config::from_vars(|name| vars.get(name).map(|v| v.to_string())).unwrap();
		assert_eq!(config.network, NetworkId::Testnet);

		let factory = TxFactory::new(&config);
		assert_eq!(factory.contracts().get(COUNTER_MODULE), "0xbeef");
	}
}
