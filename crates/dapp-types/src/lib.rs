//! Common types module for the Aptos counter dApp.
//!
//! This module defines the data types shared by the configuration resolver,
//! the wallet and chain client capabilities, and the transaction lifecycle
//! wrapper. It provides a centralized location for shared types to ensure
//! consistency across all crates of the workspace.

/// Account types returned by read-only chain queries.
pub mod account;
/// Network identifiers and per-network contract address tables.
pub mod networks;
/// Transaction payloads, pending handles, outcomes and confirmation options.
pub mod transaction;
/// Utility functions for address and amount formatting.
pub mod utils;

// Re-export all types for convenient access
pub use account::*;
pub use networks::{
	is_placeholder_address, BaseNetwork, ContractAddresses, NetworkId, ParseNetworkError,
	COUNTER_MODULE, PLACEHOLDER_ADDRESS,
};
pub use transaction::*;
pub use utils::{
	format_apt_balance, format_transaction_hash, is_valid_address, truncate_address,
	truncate_id, with_0x_prefix, without_0x_prefix,
};
