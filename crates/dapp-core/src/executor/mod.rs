//! Transaction lifecycle wrapper.
//!
//! A [`TransactionExecutor`] is bound to one transaction builder. Each
//! [`TransactionExecutor::invoke`] builds a request and returns a
//! [`TransactionChain`] on which callbacks are registered before
//! [`TransactionChain::execute`] runs the sequence:
//!
//! 1. mark the executor as loading and clear the previous result
//! 2. run the `before_execute` pre-flight check
//! 3. ask the wallet to sign and submit the request
//! 4. wait for the outcome, bounded by `timeout_secs`
//! 5. call exactly one of `on_success` / `on_error`
//! 6. call `on_settled`
//! 7. clear the loading flag
//!
//! Errors never escape `execute`; they are normalized into
//! [`ExecutionError`], stored in the executor state and passed to `on_error`.
//!
//! The state is owned by the executor and shared by all chains it creates.
//! Executions on one executor must not overlap: a second `execute` before the
//! first has settled races on the same loading/error/success fields.

mod error;

pub use error::ExecutionError;

use dapp_client::ChainClient;
use dapp_types::{truncate_id, TransactionOptions, TransactionOutcome, TransactionRequest};
use dapp_wallet::WalletService;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::instrument;

type BeforeExecuteFn<'a> = Box<dyn FnOnce() -> BoxFuture<'a, anyhow::Result<bool>> + Send + 'a>;
type SuccessFn<'a> =
	Box<dyn FnOnce(TransactionOutcome) -> BoxFuture<'a, anyhow::Result<()>> + Send + 'a>;
type ErrorFn<'a> = Box<dyn FnOnce(ExecutionError) -> anyhow::Result<()> + Send + 'a>;
type SettledFn<'a> =
	Box<dyn FnOnce(Option<TransactionOutcome>) -> BoxFuture<'a, anyhow::Result<()>> + Send + 'a>;

/// Aggregate status of an executor, meant for UI binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrapperState {
	pub is_loading: bool,
	pub last_error: Option<ExecutionError>,
	pub last_success: bool,
}

/// Executes write transactions produced by one builder.
pub struct TransactionExecutor<A, F> {
	builder: F,
	options: TransactionOptions,
	wallet: Arc<WalletService>,
	client: Arc<ChainClient>,
	state: watch::Sender<WrapperState>,
	_args: PhantomData<fn(A)>,
}

impl<A, F> TransactionExecutor<A, F>
where
	F: Fn(A) -> TransactionRequest,
{
	/// Creates an executor for `builder` with default [`TransactionOptions`].
	pub fn new(builder: F, wallet: Arc<WalletService>, client: Arc<ChainClient>) -> Self {
		let (state, _) = watch::channel(WrapperState::default());
		Self {
			builder,
			options: TransactionOptions::default(),
			wallet,
			client,
			state,
			_args: PhantomData,
		}
	}

	/// Replaces the confirmation options used by every execution.
	pub fn with_options(mut self, options: TransactionOptions) -> Self {
		self.options = options;
		self
	}

	pub fn options(&self) -> &TransactionOptions {
		&self.options
	}

	/// Builds a request from `args` and returns a chain to configure and execute it.
	pub fn invoke(&self, args: A) -> TransactionChain<'_> {
		TransactionChain {
			request: (self.builder)(args),
			options: self.options,
			wallet: &self.wallet,
			client: &self.client,
			state: &self.state,
			before_execute: None,
			on_success: None,
			on_error: None,
			on_settled: None,
		}
	}

	/// Returns a snapshot of the current state.
	pub fn state(&self) -> WrapperState {
		self.state.borrow().clone()
	}

	pub fn is_loading(&self) -> bool {
		self.state.borrow().is_loading
	}

	/// Subscribes to state changes.
	pub fn subscribe(&self) -> watch::Receiver<WrapperState> {
		self.state.subscribe()
	}

	/// Clears error, success and loading flags.
	///
	/// Call it when the surface using the executor closes, when the signing
	/// account changes, or before reusing the executor for a new interaction.
	/// Must not be called while an execution is in flight.
	pub fn reset(&self) {
		self.state.send_replace(WrapperState::default());
	}
}

/// Clears the loading flag when dropped.
///
/// Covers the normal exit of `execute` as well as a dropped future.
struct LoadingGuard<'a>(&'a watch::Sender<WrapperState>);

impl Drop for LoadingGuard<'_> {
	fn drop(&mut self) {
		self.0.send_modify(|state| state.is_loading = false);
	}
}

/// Callbacks and request of a single execution.
///
/// Each registration replaces the previous one for the same phase.
#[must_use = "a transaction chain does nothing until `execute` is called"]
pub struct TransactionChain<'a> {
	request: TransactionRequest,
	options: TransactionOptions,
	wallet: &'a WalletService,
	client: &'a ChainClient,
	state: &'a watch::Sender<WrapperState>,
	before_execute: Option<BeforeExecuteFn<'a>>,
	on_success: Option<SuccessFn<'a>>,
	on_error: Option<ErrorFn<'a>>,
	on_settled: Option<SettledFn<'a>>,
}

impl<'a> TransactionChain<'a> {
	/// Registers the pre-flight check.
	///
	/// Returning `Ok(false)` or an error aborts the execution with
	/// [`ExecutionError::Validation`] before anything is signed.
	pub fn before_execute<C, Fut>(mut self, callback: C) -> Self
	where
		C: FnOnce() -> Fut + Send + 'a,
		Fut: Future<Output = anyhow::Result<bool>> + Send + 'a,
	{
		self.before_execute = Some(Box::new(move || callback().boxed()));
		self
	}

	/// Registers the callback invoked with the outcome of a successful execution.
	pub fn on_success<C, Fut>(mut self, callback: C) -> Self
	where
		C: FnOnce(TransactionOutcome) -> Fut + Send + 'a,
		Fut: Future<Output = anyhow::Result<()>> + Send + 'a,
	{
		self.on_success = Some(Box::new(move |outcome| callback(outcome).boxed()));
		self
	}

	/// Registers the callback invoked with the error of a failed execution.
	///
	/// Unlike the other callbacks it is synchronous and meant for immediate
	/// reporting; follow-up async work belongs in `on_settled`.
	pub fn on_error<C>(mut self, callback: C) -> Self
	where
		C: FnOnce(ExecutionError) -> anyhow::Result<()> + Send + 'a,
	{
		self.on_error = Some(Box::new(callback));
		self
	}

	/// Registers the callback invoked once after every execution.
	///
	/// Receives the outcome when one was confirmed, `None` otherwise.
	pub fn on_settled<C, Fut>(mut self, callback: C) -> Self
	where
		C: FnOnce(Option<TransactionOutcome>) -> Fut + Send + 'a,
		Fut: Future<Output = anyhow::Result<()>> + Send + 'a,
	{
		self.on_settled = Some(Box::new(move |outcome| callback(outcome).boxed()));
		self
	}

	/// Returns the request this chain will submit.
	pub fn request(&self) -> &TransactionRequest {
		&self.request
	}

	/// Runs the transaction and its callbacks.
	///
	/// Returns the confirmed outcome on success. Failures are reported
	/// through `on_error` and the executor state only. Failing or panicking
	/// callbacks are logged and do not change which branch ran, nor prevent
	/// `on_settled` and the loading reset.
	#[instrument(skip_all, fields(function = %self.request.function))]
	pub async fn execute(self) -> Option<TransactionOutcome> {
		let TransactionChain {
			request,
			options,
			wallet,
			client,
			state,
			before_execute,
			on_success,
			on_error,
			on_settled,
		} = self;

		if state.borrow().is_loading {
			tracing::warn!("Execution started while another one is still in flight");
		}
		state.send_modify(|s| {
			s.is_loading = true;
			s.last_error = None;
			s.last_success = false;
		});
		let _loading = LoadingGuard(state);

		let outcome = match submit_and_confirm(&request, &options, wallet, client, before_execute)
			.await
		{
			Ok(outcome) => {
				state.send_modify(|s| s.last_success = true);
				if let Some(callback) = on_success {
					let value = outcome.clone();
					run_callback("on_success", async move { callback(value).await }).await;
				}
				Some(outcome)
			}
			Err(error) => {
				tracing::error!(error = %error, "Transaction failed");
				state.send_modify(|s| s.last_error = Some(error.clone()));
				if let Some(callback) = on_error {
					match std::panic::catch_unwind(AssertUnwindSafe(move || callback(error))) {
						Ok(Ok(())) => {}
						Ok(Err(e)) => tracing::warn!(phase = "on_error", error = %e, "Callback failed"),
						Err(_) => tracing::error!(phase = "on_error", "Callback panicked"),
					}
				}
				None
			}
		};

		if let Some(callback) = on_settled {
			let value = outcome.clone();
			run_callback("on_settled", async move { callback(value).await }).await;
		}

		outcome
	}
}

/// Pre-flight, signing, submission and confirmation.
async fn submit_and_confirm(
	request: &TransactionRequest,
	options: &TransactionOptions,
	wallet: &WalletService,
	client: &ChainClient,
	before_execute: Option<BeforeExecuteFn<'_>>,
) -> Result<TransactionOutcome, ExecutionError> {
	if let Some(callback) = before_execute {
		match AssertUnwindSafe(async move { callback().await })
			.catch_unwind()
			.await
		{
			Ok(Ok(true)) => {}
			Ok(Ok(false)) => {
				return Err(ExecutionError::Validation(
					"before_execute rejected the transaction".to_string(),
				))
			}
			Ok(Err(e)) => return Err(ExecutionError::Validation(e.to_string())),
			Err(_) => {
				return Err(ExecutionError::Validation(
					"before_execute panicked".to_string(),
				))
			}
		}
	}

	let pending = wallet.sign_and_submit(request).await?;

	// The client enforces the timeout too, this bounds clients that never answer.
	let outcome = match tokio::time::timeout(
		options.timeout(),
		client.wait_for_outcome(&pending, options),
	)
	.await
	{
		Ok(result) => result?,
		Err(_) => {
			tracing::warn!(
				tx_hash = %truncate_id(pending.hash.as_str()),
				timeout_secs = options.timeout_secs,
				"Confirmation timed out"
			);
			return Err(ExecutionError::ConfirmationTimeout {
				hash: pending.hash,
				timeout_secs: options.timeout_secs,
			});
		}
	};

	if options.check_success && !outcome.success {
		return Err(ExecutionError::OnChainFailure {
			hash: outcome.hash,
			vm_status: outcome.vm_status,
		});
	}

	Ok(outcome)
}

/// Awaits a user callback, logging errors and panics instead of propagating them.
async fn run_callback<Fut>(phase: &'static str, callback: Fut)
where
	Fut: Future<Output = anyhow::Result<()>>,
{
	match AssertUnwindSafe(callback).catch_unwind().await {
		Ok(Ok(())) => {}
		Ok(Err(e)) => tracing::warn!(phase, error = %e, "Callback failed"),
		Err(_) => tracing::error!(phase, "Callback panicked"),
	}
}
