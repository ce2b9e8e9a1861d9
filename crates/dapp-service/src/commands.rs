//! Subcommands of the dApp tool.

use clap::Subcommand;
use dapp_client::ChainClient;
use dapp_config::Config;
use dapp_core::CounterQueries;
use dapp_types::{
	format_apt_balance, is_valid_address, PendingTransaction, TransactionOptions,
};
use serde_json::json;
use std::sync::Arc;

/// One octa is 1e-8 APT; the default funds 1 APT.
const DEFAULT_FUND_AMOUNT: u64 = 100_000_000;

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Show the contract configuration of the selected network
	Config,
	/// Show balance, account and counter state of an address
	Profile { address: String },
	/// Show the counter of an address
	Counter { address: String },
	/// Wait for a submitted transaction and print its outcome
	Wait {
		hash: String,
		/// Seconds to wait before giving up
		#[arg(long, default_value_t = 30)]
		timeout_secs: u64,
		/// Report aborted transactions instead of failing
		#[arg(long)]
		no_check_success: bool,
		/// Do not wait for the indexer to catch up
		#[arg(long)]
		no_wait_for_indexer: bool,
	},
	/// Request test funds from the network faucet
	Fund {
		address: String,
		/// Amount in octas
		#[arg(long, default_value_t = DEFAULT_FUND_AMOUNT)]
		amount: u64,
	},
}

fn checked_address(address: &str) -> Result<&str, Box<dyn std::error::Error>> {
	if is_valid_address(address) {
		Ok(address)
	} else {
		Err(format!("Invalid account address '{}'", address).into())
	}
}

/// Runs `command` and returns its JSON output.
pub async fn run(
	command: Command,
	config: &Config,
	client: Arc<ChainClient>,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
	let queries = CounterQueries::new(client.clone(), config.contracts());

	let output = match command {
		Command::Config => serde_json::to_value(config.debug_report())?,
		Command::Profile { address } => {
			let profile = queries.load_user_profile(checked_address(&address)?).await;
			let mut value = serde_json::to_value(&profile)?;
			value["apt_balance_formatted"] = json!(format_apt_balance(profile.apt_balance));
			value
		}
		Command::Counter { address } => {
			let address = checked_address(&address)?;
			let initialized = queries.is_counter_initialized(address).await;
			let value = if initialized {
				queries.get_counter_value(address).await
			} else {
				None
			};
			json!({
				"address": address,
				"initialized": initialized,
				"value": value,
			})
		}
		Command::Wait {
			hash,
			timeout_secs,
			no_check_success,
			no_wait_for_indexer,
		} => {
			let options = TransactionOptions::default()
				.with_timeout_secs(timeout_secs)
				.with_check_success(!no_check_success)
				.with_wait_for_indexer(!no_wait_for_indexer);
			let outcome = client
				.wait_for_outcome(&PendingTransaction::new(hash), &options)
				.await?;
			serde_json::to_value(outcome)?
		}
		Command::Fund { address, amount } => {
			let hashes = client.fund_account(checked_address(&address)?, amount).await?;
			json!({
				"address": address,
				"amount": amount,
				"transactions": hashes,
			})
		}
	};

	Ok(output)
}
