//! Aptos fullnode REST implementation of the chain client.
//!
//! Talks to the fullnode `/v1` API for transactions, view functions and
//! accounts, to the faucet for test funds, and to the indexer GraphQL API
//! when a caller asks to wait for indexing.

use crate::{ChainClientInterface, ClientError};
use async_trait::async_trait;
use dapp_config::Endpoints;
use dapp_types::{
	truncate_id, AccountInfo, PendingTransaction, TransactionHash, TransactionOptions,
	TransactionOutcome, TransactionRequest,
};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;

/// Interval between two confirmation polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Timeout of a single HTTP request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// View function returning the coin balance of an account.
const COIN_BALANCE_FUNCTION: &str = "0x1::coin::balance";

/// Coin type of the native token.
const APT_COIN_TYPE: &str = "0x1::aptos_coin::AptosCoin";

const PROCESSOR_STATUS_QUERY: &str =
	"query ProcessorStatus { processor_status { processor last_success_version } }";

/// Transaction as returned by `GET /transactions/by_hash/{hash}`.
#[derive(Debug, Deserialize)]
struct RawTransaction {
	#[serde(rename = "type")]
	kind: String,
	hash: String,
	#[serde(default)]
	version: Option<String>,
	#[serde(default)]
	success: Option<bool>,
	#[serde(default)]
	vm_status: Option<String>,
	#[serde(default)]
	gas_used: Option<String>,
	#[serde(default)]
	sender: Option<String>,
	#[serde(default)]
	timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAccount {
	sequence_number: String,
	authentication_key: String,
}

/// REST client for an Aptos-compatible fullnode.
pub struct AptosRestClient {
	http: reqwest::Client,
	node_url: String,
	faucet_url: Option<String>,
	indexer_url: Option<String>,
	poll_interval: Duration,
}

impl AptosRestClient {
	/// Creates a client for the given endpoints.
	pub fn new(endpoints: &Endpoints) -> Result<Self, ClientError> {
		for url in std::iter::once(&endpoints.node_url)
			.chain(endpoints.faucet_url.iter())
			.chain(endpoints.indexer_url.iter())
		{
			reqwest::Url::parse(url)
				.map_err(|e| ClientError::Network(format!("Invalid URL '{}': {}", url, e)))?;
		}

		let http = reqwest::Client::builder()
			.timeout(REQUEST_TIMEOUT)
			.build()
			.map_err(|e| ClientError::Network(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self {
			http,
			node_url: endpoints.node_url.trim_end_matches('/').to_string(),
			faucet_url: endpoints
				.faucet_url
				.as_ref()
				.map(|u| u.trim_end_matches('/').to_string()),
			indexer_url: endpoints.indexer_url.clone(),
			poll_interval: DEFAULT_POLL_INTERVAL,
		})
	}

	/// Overrides the confirmation poll interval.
	pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
		self.poll_interval = poll_interval;
		self
	}

	fn node_endpoint(&self, path: &str) -> String {
		format!("{}/{}", self.node_url, path.trim_start_matches('/'))
	}

	/// Fetches a transaction, returning `None` while it is unknown or pending.
	async fn fetch_transaction(
		&self,
		hash: &TransactionHash,
	) -> Result<Option<TransactionOutcome>, ClientError> {
		let url = self.node_endpoint(&format!("transactions/by_hash/{}", hash));
		let response = self
			.http
			.get(&url)
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Failed to get transaction: {}", e)))?;

		if response.status() == reqwest::StatusCode::NOT_FOUND {
			return Ok(None);
		}

		let value = json_body(response).await?;
		parse_outcome(value)
	}

	/// Waits until the indexer has processed `version` or the deadline passes.
	async fn wait_for_indexer(
		&self,
		indexer_url: &str,
		hash: &TransactionHash,
		version: u64,
		deadline: Instant,
		timeout_secs: u64,
	) -> Result<(), ClientError> {
		loop {
			let indexed = self.indexer_version(indexer_url).await?;
			if indexed.is_some_and(|v| v >= version) {
				tracing::debug!(version, "Indexer caught up");
				return Ok(());
			}

			if Instant::now() >= deadline {
				return Err(ClientError::Timeout {
					hash: hash.clone(),
					timeout_secs,
				});
			}
			tokio::time::sleep_until((Instant::now() + self.poll_interval).min(deadline)).await;
		}
	}

	async fn indexer_version(&self, indexer_url: &str) -> Result<Option<u64>, ClientError> {
		let response = self
			.http
			.post(indexer_url)
			.json(&serde_json::json!({ "query": PROCESSOR_STATUS_QUERY }))
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Failed to query indexer: {}", e)))?;

		let value = json_body(response).await?;
		parse_indexer_version(&value)
	}
}

/// Reads a JSON body, turning non-success statuses into errors.
async fn json_body(response: reqwest::Response) -> Result<serde_json::Value, ClientError> {
	let status = response.status();
	let body = response
		.text()
		.await
		.map_err(|e| ClientError::Network(format!("Failed to read response: {}", e)))?;

	if !status.is_success() {
		let message = serde_json::from_str::<serde_json::Value>(&body)
			.ok()
			.and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
			.unwrap_or(body);
		return Err(ClientError::Network(format!("{}: {}", status, message)));
	}

	serde_json::from_str(&body)
		.map_err(|e| ClientError::InvalidResponse(format!("Malformed JSON: {}", e)))
}

fn parse_u64(field: &str, value: Option<&str>) -> Result<u64, ClientError> {
	match value {
		None => Ok(0),
		Some(raw) => raw
			.parse()
			.map_err(|_| ClientError::InvalidResponse(format!("Invalid {}: '{}'", field, raw))),
	}
}

/// Decodes a fullnode transaction, `None` for pending transactions.
pub(crate) fn parse_outcome(
	value: serde_json::Value,
) -> Result<Option<TransactionOutcome>, ClientError> {
	let raw: RawTransaction = serde_json::from_value(value)
		.map_err(|e| ClientError::InvalidResponse(format!("Unexpected transaction: {}", e)))?;

	if raw.kind == "pending_transaction" {
		return Ok(None);
	}

	let version = raw.version.as_deref().ok_or_else(|| {
		ClientError::InvalidResponse(format!("Committed transaction {} has no version", raw.hash))
	})?;

	Ok(Some(TransactionOutcome {
		hash: TransactionHash::new(&raw.hash),
		version: parse_u64("version", Some(version))?,
		success: raw.success.unwrap_or(false),
		vm_status: raw.vm_status.unwrap_or_default(),
		gas_used: parse_u64("gas_used", raw.gas_used.as_deref())?,
		sender: raw.sender.unwrap_or_default(),
		timestamp: parse_u64("timestamp", raw.timestamp.as_deref())?,
	}))
}

/// Returns the lowest `last_success_version` across indexer processors.
pub(crate) fn parse_indexer_version(
	value: &serde_json::Value,
) -> Result<Option<u64>, ClientError> {
	if let Some(errors) = value.get("errors") {
		return Err(ClientError::Network(format!("Indexer error: {}", errors)));
	}

	let statuses = value
		.pointer("/data/processor_status")
		.and_then(|v| v.as_array())
		.ok_or_else(|| ClientError::InvalidResponse("Missing processor_status".into()))?;

	let versions = statuses
		.iter()
		.filter_map(|status| status.get("last_success_version"))
		.map(|v| match v {
			serde_json::Value::Number(n) => n.as_u64(),
			serde_json::Value::String(s) => s.parse().ok(),
			_ => None,
		})
		.collect::<Option<Vec<u64>>>()
		.ok_or_else(|| ClientError::InvalidResponse("Invalid last_success_version".into()))?;

	Ok(versions.into_iter().min())
}

#[async_trait]
impl ChainClientInterface for AptosRestClient {
	async fn wait_for_outcome(
		&self,
		pending: &PendingTransaction,
		options: &TransactionOptions,
	) -> Result<TransactionOutcome, ClientError> {
		let hash = &pending.hash;
		let deadline = Instant::now() + options.timeout();

		let outcome = loop {
			if let Some(outcome) = self.fetch_transaction(hash).await? {
				break outcome;
			}

			if Instant::now() >= deadline {
				return Err(ClientError::Timeout {
					hash: hash.clone(),
					timeout_secs: options.timeout_secs,
				});
			}

			tracing::trace!(tx_hash = %truncate_id(hash.as_str()), "Transaction pending");
			tokio::time::sleep_until((Instant::now() + self.poll_interval).min(deadline)).await;
		};

		if options.check_success && !outcome.success {
			return Err(ClientError::TransactionFailed {
				hash: outcome.hash,
				vm_status: outcome.vm_status,
			});
		}

		if options.wait_for_indexer {
			match &self.indexer_url {
				Some(indexer_url) => {
					self.wait_for_indexer(
						indexer_url,
						hash,
						outcome.version,
						deadline,
						options.timeout_secs,
					)
					.await?;
				}
				None => {
					tracing::debug!("No indexer configured, skipping indexer wait");
				}
			}
		}

		Ok(outcome)
	}

	async fn view(
		&self,
		request: &TransactionRequest,
	) -> Result<Vec<serde_json::Value>, ClientError> {
		let response = self
			.http
			.post(self.node_endpoint("view"))
			.json(request)
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Failed to call view function: {}", e)))?;

		match json_body(response).await? {
			serde_json::Value::Array(values) => Ok(values),
			other => Err(ClientError::InvalidResponse(format!(
				"View function returned non-array: {}",
				other
			))),
		}
	}

	async fn get_account_info(&self, address: &str) -> Result<AccountInfo, ClientError> {
		let response = self
			.http
			.get(self.node_endpoint(&format!("accounts/{}", address)))
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Failed to get account: {}", e)))?;

		if response.status() == reqwest::StatusCode::NOT_FOUND {
			return Err(ClientError::NotFound(format!("Account {}", address)));
		}

		let raw: RawAccount = serde_json::from_value(json_body(response).await?)
			.map_err(|e| ClientError::InvalidResponse(format!("Unexpected account: {}", e)))?;

		Ok(AccountInfo {
			sequence_number: parse_u64("sequence_number", Some(&raw.sequence_number))?,
			authentication_key: raw.authentication_key,
		})
	}

	async fn get_balance(&self, address: &str) -> Result<u64, ClientError> {
		let request = TransactionRequest {
			function: COIN_BALANCE_FUNCTION.to_string(),
			type_arguments: vec![APT_COIN_TYPE.to_string()],
			arguments: vec![serde_json::Value::String(address.to_string())],
		};

		let values = self.view(&request).await?;
		match values.first() {
			Some(serde_json::Value::String(amount)) => parse_u64("balance", Some(amount)),
			Some(serde_json::Value::Number(amount)) => amount
				.as_u64()
				.ok_or_else(|| ClientError::InvalidResponse(format!("Invalid balance: {}", amount))),
			other => Err(ClientError::InvalidResponse(format!(
				"Unexpected balance result: {:?}",
				other
			))),
		}
	}

	async fn fund_account(
		&self,
		address: &str,
		amount: u64,
	) -> Result<Vec<TransactionHash>, ClientError> {
		let faucet_url = self
			.faucet_url
			.as_ref()
			.ok_or(ClientError::FaucetUnavailable)?;

		let response = self
			.http
			.post(format!("{}/mint", faucet_url))
			.query(&[("amount", amount.to_string()), ("address", address.to_string())])
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Failed to reach faucet: {}", e)))?;

		let hashes: Vec<String> = serde_json::from_value(json_body(response).await?)
			.map_err(|e| ClientError::InvalidResponse(format!("Unexpected faucet response: {}", e)))?;

		Ok(hashes.into_iter().map(TransactionHash::new).collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn endpoints(faucet: Option<&str>) -> Endpoints {
		Endpoints {
			node_url: "http://127.0.0.1:8080/v1/".to_string(),
			faucet_url: faucet.map(str::to_string),
			indexer_url: None,
		}
	}

	#[test]
	fn test_parse_committed_transaction() {
		let value = json!({
			"type": "user_transaction",
			"hash": "0xABC",
			"version": "12345",
			"success": true,
			"vm_status": "Executed successfully",
			"gas_used": "6",
			"sender": "0x42",
			"timestamp": "1700000000000000"
		});

		let outcome = parse_outcome(value).unwrap().unwrap();
		assert_eq!(outcome.hash.as_str(), "0xabc");
		assert_eq!(outcome.version, 12345);
		assert!(outcome.success);
		assert_eq!(outcome.gas_used, 6);
		assert_eq!(outcome.timestamp, 1_700_000_000_000_000);
	}

	#[test]
	fn test_parse_pending_transaction() {
		let value = json!({ "type": "pending_transaction", "hash": "0xabc" });
		assert!(parse_outcome(value).unwrap().is_none());
	}

	#[test]
	fn test_parse_aborted_transaction() {
		let value = json!({
			"type": "user_transaction",
			"hash": "0xabc",
			"version": "9",
			"success": false,
			"vm_status": "Move abort in 0xcafe::counter: E_NOT_INITIALIZED(0x1)",
			"gas_used": "3"
		});

		let outcome = parse_outcome(value).unwrap().unwrap();
		assert!(!outcome.success);
		assert!(outcome.vm_status.contains("E_NOT_INITIALIZED"));
		assert_eq!(outcome.sender, "");
	}

	#[test]
	fn test_parse_rejects_bad_version() {
		let value = json!({ "type": "user_transaction", "hash": "0xabc", "version": "x" });
		assert!(matches!(
			parse_outcome(value),
			Err(ClientError::InvalidResponse(_))
		));
	}

	#[test]
	fn test_parse_indexer_version_takes_minimum() {
		let value = json!({
			"data": {
				"processor_status": [
					{ "processor": "default_processor", "last_success_version": 120 },
					{ "processor": "fungible_asset_processor", "last_success_version": "100" }
				]
			}
		});
		assert_eq!(parse_indexer_version(&value).unwrap(), Some(100));

		let empty = json!({ "data": { "processor_status": [] } });
		assert_eq!(parse_indexer_version(&empty).unwrap(), None);

		let failed = json!({ "errors": [{ "message": "boom" }] });
		assert!(parse_indexer_version(&failed).is_err());
	}

	#[test]
	fn test_new_rejects_invalid_url() {
		let result = AptosRestClient::new(&Endpoints {
			node_url: "not a url".to_string(),
			faucet_url: None,
			indexer_url: None,
		});
		assert!(matches!(result, Err(ClientError::Network(_))));
	}

	#[test]
	fn test_node_endpoint_joins_paths() {
		let client = AptosRestClient::new(&endpoints(None)).unwrap();
		assert_eq!(
			client.node_endpoint("/transactions/by_hash/0xabc"),
			"http://127.0.0.1:8080/v1/transactions/by_hash/0xabc"
		);
	}

	#[tokio::test]
	async fn test_fund_without_faucet() {
		let client = AptosRestClient::new(&endpoints(None)).unwrap();
		let result = client.fund_account("0x42", 100).await;
		assert!(matches!(result, Err(ClientError::FaucetUnavailable)));
	}

	mod http {
		use super::*;
		use std::sync::atomic::{AtomicUsize, Ordering};
		use wiremock::matchers::{method, path};
		use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

		const POLL: Duration = Duration::from_millis(10);
		const TX_PATH: &str = "/v1/transactions/by_hash/0xabc";

		/// Answers with each template in turn, repeating the last one.
		struct Sequence {
			responses: Vec<ResponseTemplate>,
			calls: AtomicUsize,
		}

		impl Sequence {
			fn new(responses: Vec<ResponseTemplate>) -> Self {
				Self {
					responses,
					calls: AtomicUsize::new(0),
				}
			}
		}

		impl Respond for Sequence {
			fn respond(&self, _request: &Request) -> ResponseTemplate {
				let call = self.calls.fetch_add(1, Ordering::SeqCst);
				self.responses[call.min(self.responses.len() - 1)].clone()
			}
		}

		fn committed(success: bool, version: u64) -> ResponseTemplate {
			ResponseTemplate::new(200).set_body_json(json!({
				"type": "user_transaction",
				"hash": "0xabc",
				"version": version.to_string(),
				"success": success,
				"vm_status": if success { "Executed successfully" } else { "Move abort" },
				"gas_used": "4",
				"sender": "0x42",
				"timestamp": "1"
			}))
		}

		fn pending_body() -> ResponseTemplate {
			ResponseTemplate::new(200)
				.set_body_json(json!({ "type": "pending_transaction", "hash": "0xabc" }))
		}

		fn not_found() -> ResponseTemplate {
			ResponseTemplate::new(404).set_body_json(json!({ "message": "Transaction not found" }))
		}

		fn indexed(version: u64) -> ResponseTemplate {
			ResponseTemplate::new(200).set_body_json(json!({
				"data": { "processor_status": [
					{ "processor": "default_processor", "last_success_version": version }
				] }
			}))
		}

		fn client(server: &MockServer, indexer: bool) -> AptosRestClient {
			let endpoints = Endpoints {
				node_url: format!("{}/v1", server.uri()),
				faucet_url: None,
				indexer_url: indexer.then(|| format!("{}/graphql", server.uri())),
			};
			AptosRestClient::new(&endpoints).unwrap().with_poll_interval(POLL)
		}

		fn options() -> TransactionOptions {
			TransactionOptions::default()
				.with_wait_for_indexer(false)
				.with_timeout_secs(5)
		}

		#[tokio::test]
		async fn test_keeps_polling_until_committed() {
			let server = MockServer::start().await;
			Mock::given(method("GET"))
				.and(path(TX_PATH))
				.respond_with(Sequence::new(vec![not_found(), pending_body(), committed(true, 7)]))
				.expect(3)
				.mount(&server)
				.await;

			let outcome = client(&server, false)
				.wait_for_outcome(&PendingTransaction::new("0xabc"), &options())
				.await
				.unwrap();

			assert_eq!(outcome.version, 7);
			assert!(outcome.success);
		}

		#[tokio::test]
		async fn test_times_out_at_deadline() {
			let server = MockServer::start().await;
			Mock::given(method("GET"))
				.and(path(TX_PATH))
				.respond_with(not_found())
				.mount(&server)
				.await;

			let result = client(&server, false)
				.wait_for_outcome(
					&PendingTransaction::new("0xabc"),
					&options().with_timeout_secs(1),
				)
				.await;

			match result {
				Err(ClientError::Timeout { hash, timeout_secs }) => {
					assert_eq!(hash.as_str(), "0xabc");
					assert_eq!(timeout_secs, 1);
				}
				other => panic!("unexpected result: {other:?}"),
			}
		}

		#[tokio::test]
		async fn test_aborted_transaction_fails_when_checked() {
			let server = MockServer::start().await;
			Mock::given(method("GET"))
				.and(path(TX_PATH))
				.respond_with(committed(false, 9))
				.mount(&server)
				.await;
			let client = client(&server, false);
			let pending = PendingTransaction::new("0xabc");

			let checked = client.wait_for_outcome(&pending, &options()).await;
			assert!(matches!(
				checked,
				Err(ClientError::TransactionFailed { ref vm_status, .. }) if vm_status == "Move abort"
			));

			let unchecked = client
				.wait_for_outcome(&pending, &options().with_check_success(false))
				.await
				.unwrap();
			assert!(!unchecked.success);
		}

		#[tokio::test]
		async fn test_waits_for_indexer_to_reach_version() {
			let server = MockServer::start().await;
			Mock::given(method("GET"))
				.and(path(TX_PATH))
				.respond_with(committed(true, 42))
				.mount(&server)
				.await;
			Mock::given(method("POST"))
				.and(path("/graphql"))
				.respond_with(Sequence::new(vec![indexed(10), indexed(41), indexed(42)]))
				.expect(3)
				.mount(&server)
				.await;

			let outcome = client(&server, true)
				.wait_for_outcome(
					&PendingTransaction::new("0xabc"),
					&options().with_wait_for_indexer(true),
				)
				.await
				.unwrap();

			assert_eq!(outcome.version, 42);
		}

		#[tokio::test]
		async fn test_indexer_wait_skipped_without_indexer() {
			let server = MockServer::start().await;
			Mock::given(method("GET"))
				.and(path(TX_PATH))
				.respond_with(committed(true, 42))
				.expect(1)
				.mount(&server)
				.await;
			Mock::given(method("POST"))
				.and(path("/graphql"))
				.respond_with(indexed(42))
				.expect(0)
				.mount(&server)
				.await;

			let outcome = client(&server, false)
				.wait_for_outcome(
					&PendingTransaction::new("0xabc"),
					&options().with_wait_for_indexer(true),
				)
				.await
				.unwrap();

			assert_eq!(outcome.version, 42);
		}

		#[tokio::test]
		async fn test_missing_account_is_not_found() {
			let server = MockServer::start().await;
			Mock::given(method("GET"))
				.and(path("/v1/accounts/0x404"))
				.respond_with(
					ResponseTemplate::new(404).set_body_json(json!({ "message": "Account not found" })),
				)
				.mount(&server)
				.await;
			Mock::given(method("GET"))
				.and(path("/v1/accounts/0x42"))
				.respond_with(ResponseTemplate::new(200).set_body_json(json!({
					"sequence_number": "12",
					"authentication_key": "0x42"
				})))
				.mount(&server)
				.await;
			let client = client(&server, false);

			assert!(matches!(
				client.get_account_info("0x404").await,
				Err(ClientError::NotFound(_))
			));
			let info = client.get_account_info("0x42").await.unwrap();
			assert_eq!(info.sequence_number, 12);
		}

		#[tokio::test]
		async fn test_balance_reads_coin_view() {
			let server = MockServer::start().await;
			Mock::given(method("POST"))
				.and(path("/v1/view"))
				.respond_with(ResponseTemplate::new(200).set_body_json(json!(["150000000"])))
				.expect(1)
				.mount(&server)
				.await;

			let balance = client(&server, false).get_balance("0x42").await.unwrap();
			assert_eq!(balance, 150_000_000);

			let requests = server.received_requests().await.unwrap();
			let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
			assert_eq!(body["function"], "0x1::coin::balance");
			assert_eq!(body["type_arguments"], json!(["0x1::aptos_coin::AptosCoin"]));
			assert_eq!(body["arguments"], json!(["0x42"]));
		}

		#[tokio::test]
		async fn test_view_rejects_non_array() {
			let server = MockServer::start().await;
			Mock::given(method("POST"))
				.and(path("/v1/view"))
				.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": 1 })))
				.mount(&server)
				.await;

			let request = TransactionRequest::entry_function("0xcafe", "counter", "get_counter");
			assert!(matches!(
				client(&server, false).view(&request).await,
				Err(ClientError::InvalidResponse(_))
			));
		}
	}
}
