//! Core engine of the counter dApp.
//!
//! This crate ties the wallet and chain client capabilities together:
//! - [`executor`] runs write transactions through their lifecycle and
//!   exposes loading/error/success state for UI binding
//! - [`contracts`] builds counter transactions and performs the read paths

pub mod contracts;
pub mod executor;

pub use contracts::counter::{
	build_decrement_counter_tx, build_increment_counter_tx, build_initialize_counter_tx,
	build_reset_counter_tx,
};
pub use contracts::query::CounterQueries;
pub use contracts::TxFactory;
pub use executor::{ExecutionError, TransactionChain, TransactionExecutor, WrapperState};
