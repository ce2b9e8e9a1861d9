//! Command-line entry point of the counter dApp.
//!
//! Resolves the network configuration, connects to the fullnode of the
//! selected network and runs one read or confirmation command, printing its
//! result as JSON.

use clap::Parser;
use dapp_client::implementations::aptos::AptosRestClient;
use dapp_client::ChainClient;
use dapp_config::Config;
use std::path::PathBuf;
use std::sync::Arc;

mod commands;

use commands::Command;

/// Command-line arguments for the dApp tool.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to a TOML configuration file, the environment is used when omitted
	#[arg(short, long, global = true)]
	config: Option<PathBuf>,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info", global = true)]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	let config = match &args.config {
		Some(path) => Config::from_file(path).await?,
		None => Config::from_env()?,
	};
	let endpoints = config.endpoints();
	tracing::info!(
		network = %config.network,
		node_url = %endpoints.node_url,
		"Loaded configuration"
	);

	let client = Arc::new(ChainClient::new(Box::new(AptosRestClient::new(&endpoints)?)));

	let output = commands::run(args.command, &config, client).await?;
	println!("{}", serde_json::to_string_pretty(&output)?);

	Ok(())
}
