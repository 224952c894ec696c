//! Transfer executor for the bridge orchestrator.
//!
//! Turns a (source chain, destination chain, amount, recipient) tuple into
//! a confirmed on-chain transfer. Each invocation walks a fixed pipeline:
//! quote, fee computation, permit signing, dry-run simulation, submission,
//! confirmation. A failure at any step is caught at this boundary,
//! classified, reported through the status sink and converted into a
//! failed outcome; the caller decides whether to continue.
//!
//! Chain access goes through the [`ChainOps`] trait so the pipeline's
//! ordering guarantees (simulation always precedes submission, balances are
//! read before and after) are testable without a network.

use alloy_primitives::{Address, FixedBytes, U256};
use async_trait::async_trait;
use bridge_permit::{PermitError, PermitInterface};
use bridge_quote::{QuoteError, QuoteInterface};
use bridge_registry::RegistryError;
use bridge_types::{
	format_units, pad_address, with_0x_prefix, ChainProfile, PermitParams, StatusEvent, StatusKind,
	StatusSink, TransferConfirmation, TransferOutcome, TransferParams, TransferRequest,
	TransferStats,
};
use std::sync::Arc;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod evm;
}

/// Errors that can occur during a single transfer attempt.
#[derive(Debug, Error)]
pub enum TransferError {
	/// Chain resolution or RPC read failure.
	#[error("Chain error: {0}")]
	Registry(#[from] RegistryError),
	/// The pricing service failed to produce a usable quote.
	#[error("Quote error: {0}")]
	Quote(#[from] QuoteError),
	/// The permit could not be produced.
	#[error("Permit error: {0}")]
	Permit(#[from] PermitError),
	/// A bridge fee or limit view call failed.
	#[error("Fee read failed: {0}")]
	Fee(String),
	/// The dry-run reverted; carries the decoded reason when available.
	#[error("Simulation failed: {0}")]
	Simulation(String),
	/// The real transaction could not be sent.
	#[error("Submission failed: {0}")]
	Submission(String),
	/// The transaction was sent but never confirmed successfully.
	#[error("Confirmation failed: {0}")]
	Confirmation(String),
}

impl TransferError {
	/// Short classification used in outcomes and counters.
	pub fn kind(&self) -> &'static str {
		match self {
			TransferError::Registry(_) => "chain",
			TransferError::Quote(_) => "quote",
			TransferError::Permit(_) => "permit",
			TransferError::Fee(_) => "fee",
			TransferError::Simulation(_) => "simulation",
			TransferError::Submission(_) => "submission",
			TransferError::Confirmation(_) => "confirmation",
		}
	}
}

/// Receipt details returned by a confirmation wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReceipt {
	/// Hash of the included transaction.
	pub hash: FixedBytes<32>,
	/// Block the transaction was included in.
	pub block_number: u64,
	/// Whether execution succeeded.
	pub success: bool,
}

/// Trait defining the chain operations the executor needs.
///
/// Implemented over alloy providers in production and by scripted mocks in
/// tests.
#[async_trait]
pub trait ChainOps: Send + Sync {
	/// The shared operator address.
	fn operator(&self) -> Address;

	/// Resolves a chain profile by key.
	fn profile(&self, chain_key: &str) -> Result<ChainProfile, TransferError>;

	/// Reads the bridged-token balance of an account.
	async fn token_balance(
		&self,
		chain_key: &str,
		account: Address,
	) -> Result<U256, TransferError>;

	/// Reads the bridge contract's maximum fee for the given amount and
	/// static fee baseline. View call, no side effects.
	async fn max_fee(
		&self,
		chain_key: &str,
		amount: U256,
		static_fee: U256,
	) -> Result<U256, TransferError>;

	/// Reads the bridge contract's configured native gas-drop ceiling.
	async fn max_native_gas_drop(&self, chain_key: &str) -> Result<U256, TransferError>;

	/// Dry-runs the bridge transfer call with the exact payload and value.
	async fn simulate(
		&self,
		chain_key: &str,
		params: &TransferParams,
		permit: &PermitParams,
		value: U256,
	) -> Result<(), TransferError>;

	/// Sends the real transaction and returns its hash immediately.
	async fn submit(
		&self,
		chain_key: &str,
		params: &TransferParams,
		permit: &PermitParams,
		value: U256,
	) -> Result<FixedBytes<32>, TransferError>;

	/// Awaits on-chain inclusion of a submitted transaction. No local
	/// timeout: blocks until the network finalizes or errors.
	async fn confirm(
		&self,
		chain_key: &str,
		tx_hash: FixedBytes<32>,
	) -> Result<ChainReceipt, TransferError>;
}

/// Constants governing every transfer.
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
	/// Static fee baseline passed to the bridge fee view, in token base
	/// units.
	pub static_fee: U256,
	/// Seconds added to the route deadline to form the permit deadline.
	pub permit_deadline_buffer_secs: u64,
	/// Decimals of the bridged token, for log formatting.
	pub token_decimals: u8,
}

/// Executes single transfers end-to-end.
pub struct TransferExecutor {
	ops: Arc<dyn ChainOps>,
	quotes: Arc<dyn QuoteInterface>,
	permits: Arc<dyn PermitInterface>,
	settings: ExecutorSettings,
	sink: Arc<dyn StatusSink>,
	stats: Arc<TransferStats>,
}

impl TransferExecutor {
	pub fn new(
		ops: Arc<dyn ChainOps>,
		quotes: Arc<dyn QuoteInterface>,
		permits: Arc<dyn PermitInterface>,
		settings: ExecutorSettings,
		sink: Arc<dyn StatusSink>,
		stats: Arc<TransferStats>,
	) -> Self {
		Self {
			ops,
			quotes,
			permits,
			settings,
			sink,
			stats,
		}
	}

	/// Shared transfer counters.
	pub fn stats(&self) -> &Arc<TransferStats> {
		&self.stats
	}

	/// Best-effort read of the source chain's gas-drop ceiling, used for
	/// the advisory pre-transfer check. A failed read is logged and
	/// swallowed; the contract remains the final authority.
	pub async fn gas_drop_ceiling(&self, chain_key: &str) -> Option<U256> {
		match self.ops.max_native_gas_drop(chain_key).await {
			Ok(ceiling) => Some(ceiling),
			Err(e) => {
				tracing::debug!(chain = %chain_key, "gas-drop ceiling read failed: {}", e);
				None
			}
		}
	}

	/// Executes one transfer. Never returns an error: failures are
	/// classified into the outcome and counted.
	pub async fn execute(
		&self,
		source_key: &str,
		dest_key: &str,
		request: &TransferRequest,
	) -> TransferOutcome {
		match self.run(source_key, dest_key, request).await {
			Ok(confirmation) => TransferOutcome::Confirmed(confirmation),
			Err(e) => {
				self.stats.record_failed();
				let reason = e.to_string();
				self.emit(
					StatusKind::Error,
					format!("{} -> {}: {}", source_key, dest_key, reason),
				);
				TransferOutcome::Failed {
					kind: e.kind(),
					reason,
				}
			}
		}
	}

	async fn run(
		&self,
		source_key: &str,
		dest_key: &str,
		request: &TransferRequest,
	) -> Result<TransferConfirmation, TransferError> {
		let source = self.ops.profile(source_key)?;
		let dest = self.ops.profile(dest_key)?;

		let sender = self.ops.operator();
		let recipient = request.recipient.unwrap_or(sender);

		self.emit(
			StatusKind::Send,
			format!("from {} to {}", source.label, dest.label),
		);
		self.emit(
			StatusKind::Info,
			format!(
				"amount {} to {}",
				format_units(request.amount, self.settings.token_decimals),
				recipient
			),
		);

		self.note_balance(&source, sender, "before").await;
		self.note_balance(&dest, recipient, "before").await;

		// QUOTED
		let quote = self.quotes.fetch_route(source.domain, dest.domain).await?;

		// FEE_COMPUTED: total native value attached to the transaction
		let gas_drop = U256::from(request.gas_drop);
		let fee_native = U256::from(quote.fee_u64);
		let tx_value = fee_native + gas_drop;
		self.emit(
			StatusKind::Gas,
			format!(
				"fee(native) {} {} | gasDrop {} {} | value {} {}",
				format_units(fee_native, 18),
				source.native_symbol,
				format_units(gas_drop, 18),
				source.native_symbol,
				format_units(tx_value, 18),
				source.native_symbol
			),
		);

		// PERMIT_SIGNED: deadline tolerates clock/latency skew between
		// quote issuance and on-chain execution. The route deadline is
		// remote input, so the add must not overflow.
		let permit_deadline = quote
			.route_deadline
			.saturating_add(self.settings.permit_deadline_buffer_secs);
		let permit = self
			.permits
			.sign_permit(
				source_key,
				sender,
				source.bridge_address,
				request.amount,
				permit_deadline,
			)
			.await?;

		let max_fee = self
			.ops
			.max_fee(source_key, request.amount, self.settings.static_fee)
			.await?;

		let params = TransferParams {
			amount: request.amount,
			max_fee,
			fee: quote.fee_u64,
			deadline: quote.route_deadline,
			gas_drop_amount: request.gas_drop,
			destination_domain: dest.domain,
			min_finality_threshold: quote.min_finality_threshold,
			recipient: pad_address(recipient),
			aux_recipient: FixedBytes::ZERO,
			is_native: true,
			hook_data: quote.hook_data.clone(),
			signature: quote.signature.clone(),
		};
		let permit_params = PermitParams {
			value: request.amount,
			deadline: U256::from(permit.deadline),
			signature: permit.signature.clone(),
		};

		// SIMULATED: any revert aborts before gas is spent
		self.ops
			.simulate(source_key, &params, &permit_params, tx_value)
			.await?;

		// SUBMITTED
		let tx_hash = self
			.ops
			.submit(source_key, &params, &permit_params, tx_value)
			.await?;
		self.stats.begin_pending();
		let hash_str = with_0x_prefix(&hex::encode(tx_hash));
		self.emit(StatusKind::Pending, format!("tx {}", hash_str));
		self.emit(StatusKind::Info, source.explorer_link(&hash_str));

		// CONFIRMED
		let receipt = self.ops.confirm(source_key, tx_hash).await?;
		if !receipt.success {
			return Err(TransferError::Confirmation(
				"transaction reverted on-chain".to_string(),
			));
		}
		self.stats.record_completed();
		let receipt_str = with_0x_prefix(&hex::encode(receipt.hash));
		self.emit(StatusKind::Success, format!("mined {}", receipt_str));
		self.emit(StatusKind::Info, source.explorer_link(&receipt_str));

		self.note_balance(&source, sender, "after").await;
		self.note_balance(&dest, recipient, "after").await;

		if !request.delay.is_zero() {
			self.emit(
				StatusKind::Info,
				format!("waiting {}s before next transfer", request.delay.as_secs()),
			);
			tokio::time::sleep(request.delay).await;
		}

		Ok(TransferConfirmation {
			tx_hash,
			receipt_hash: receipt.hash,
		})
	}

	/// Best-effort balance note. A read failure degrades the log only.
	async fn note_balance(&self, chain: &ChainProfile, account: Address, stage: &str) {
		match self.ops.token_balance(&chain.key, account).await {
			Ok(balance) => self.emit(
				StatusKind::Info,
				format!(
					"{} balance {}: {}",
					chain.label,
					stage,
					format_units(balance, self.settings.token_decimals)
				),
			),
			Err(e) => {
				tracing::warn!(chain = %chain.key, "balance read failed: {}", e);
				self.emit(
					StatusKind::Warning,
					format!("{} balance {} unavailable", chain.label, stage),
				);
			}
		}
	}

	fn emit(&self, kind: StatusKind, message: String) {
		self.sink.emit(StatusEvent::new(kind, message));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::Bytes;
	use bridge_types::RouteQuote;
	use std::sync::Mutex;
	use std::time::Duration;

	const BUFFER_SECS: u64 = 6000;

	fn profile(key: &str, domain: u32) -> ChainProfile {
		ChainProfile {
			key: key.to_string(),
			label: format!("{} testnet", key),
			chain_id: 1,
			domain,
			rpc_url: "http://localhost:8545".to_string(),
			token_address: Address::repeat_byte(0x01),
			bridge_address: Address::repeat_byte(0x02),
			explorer_tx_url: "https://example.com/tx/".to_string(),
			native_symbol: "ETH".to_string(),
		}
	}

	#[derive(Default)]
	struct MockOps {
		calls: Mutex<Vec<String>>,
		simulate_revert: Option<String>,
		balance_fails: bool,
		values_seen: Mutex<Vec<U256>>,
	}

	impl MockOps {
		fn calls(&self) -> Vec<String> {
			self.calls.lock().unwrap().clone()
		}

		fn record(&self, call: impl Into<String>) {
			self.calls.lock().unwrap().push(call.into());
		}
	}

	#[async_trait]
	impl ChainOps for MockOps {
		fn operator(&self) -> Address {
			Address::repeat_byte(0xaa)
		}

		fn profile(&self, chain_key: &str) -> Result<ChainProfile, TransferError> {
			match chain_key {
				"sepolia" => Ok(profile("sepolia", 0)),
				"optimism" => Ok(profile("optimism", 2)),
				other => Err(TransferError::Registry(RegistryError::UnknownChain(
					other.to_string(),
				))),
			}
		}

		async fn token_balance(
			&self,
			chain_key: &str,
			_account: Address,
		) -> Result<U256, TransferError> {
			self.record(format!("balance:{}", chain_key));
			if self.balance_fails {
				Err(TransferError::Registry(RegistryError::Rpc(
					"balance read refused".to_string(),
				)))
			} else {
				Ok(U256::from(5_000_000u64))
			}
		}

		async fn max_fee(
			&self,
			chain_key: &str,
			_amount: U256,
			_static_fee: U256,
		) -> Result<U256, TransferError> {
			self.record(format!("max_fee:{}", chain_key));
			Ok(U256::from(150_000u64))
		}

		async fn max_native_gas_drop(&self, chain_key: &str) -> Result<U256, TransferError> {
			self.record(format!("ceiling:{}", chain_key));
			Ok(U256::from(1_000_000_000u64))
		}

		async fn simulate(
			&self,
			_chain_key: &str,
			_params: &TransferParams,
			_permit: &PermitParams,
			value: U256,
		) -> Result<(), TransferError> {
			self.record("simulate");
			self.values_seen.lock().unwrap().push(value);
			match &self.simulate_revert {
				Some(reason) => Err(TransferError::Simulation(reason.clone())),
				None => Ok(()),
			}
		}

		async fn submit(
			&self,
			_chain_key: &str,
			_params: &TransferParams,
			_permit: &PermitParams,
			value: U256,
		) -> Result<FixedBytes<32>, TransferError> {
			self.record("submit");
			self.values_seen.lock().unwrap().push(value);
			Ok(FixedBytes::repeat_byte(0x11))
		}

		async fn confirm(
			&self,
			_chain_key: &str,
			tx_hash: FixedBytes<32>,
		) -> Result<ChainReceipt, TransferError> {
			self.record("confirm");
			Ok(ChainReceipt {
				hash: tx_hash,
				block_number: 42,
				success: true,
			})
		}
	}

	struct MockQuotes {
		result: Result<RouteQuote, &'static str>,
	}

	#[async_trait]
	impl QuoteInterface for MockQuotes {
		async fn fetch_route(
			&self,
			_source_domain: u32,
			_destination_domain: u32,
		) -> Result<RouteQuote, QuoteError> {
			match &self.result {
				Ok(quote) => Ok(quote.clone()),
				Err("timeout") => Err(QuoteError::Timeout),
				Err(other) => Err(QuoteError::Unavailable(other.to_string())),
			}
		}
	}

	#[derive(Default)]
	struct MockPermits {
		deadlines: Mutex<Vec<u64>>,
	}

	#[async_trait]
	impl PermitInterface for MockPermits {
		async fn sign_permit(
			&self,
			_chain_key: &str,
			_owner: Address,
			_spender: Address,
			_amount: U256,
			deadline: u64,
		) -> Result<bridge_types::PermitAuthorization, PermitError> {
			self.deadlines.lock().unwrap().push(deadline);
			Ok(bridge_types::PermitAuthorization {
				signature: Bytes::from(vec![0x01; 65]),
				nonce: U256::from(7u64),
				deadline,
				domain_version: "2",
			})
		}
	}

	struct NullSink;

	impl StatusSink for NullSink {
		fn emit(&self, _event: StatusEvent) {}
	}

	fn quote_fixture() -> RouteQuote {
		RouteQuote {
			signature: Bytes::from(vec![0xde, 0xad]),
			fee_u64: 1_000,
			min_finality_threshold: 1000,
			hook_data: Bytes::from(vec![0u8]),
			route_deadline: 1_900_000_000,
		}
	}

	fn request() -> TransferRequest {
		TransferRequest {
			amount: U256::from(1_000_000_000u64),
			recipient: None,
			gas_drop: 0,
			delay: Duration::ZERO,
		}
	}

	fn executor(
		ops: Arc<MockOps>,
		quotes: MockQuotes,
		permits: Arc<MockPermits>,
	) -> TransferExecutor {
		TransferExecutor::new(
			ops,
			Arc::new(quotes),
			permits,
			ExecutorSettings {
				static_fee: U256::from(100_000u64),
				permit_deadline_buffer_secs: BUFFER_SECS,
				token_decimals: 6,
			},
			Arc::new(NullSink),
			Arc::new(TransferStats::new()),
		)
	}

	#[tokio::test]
	async fn successful_transfer_walks_the_pipeline_in_order() {
		let ops = Arc::new(MockOps::default());
		let exec = executor(
			ops.clone(),
			MockQuotes {
				result: Ok(quote_fixture()),
			},
			Arc::new(MockPermits::default()),
		);

		let outcome = exec.execute("sepolia", "optimism", &request()).await;
		assert!(outcome.is_confirmed());
		assert_eq!(
			ops.calls(),
			vec![
				"balance:sepolia",
				"balance:optimism",
				"max_fee:sepolia",
				"simulate",
				"submit",
				"confirm",
				"balance:sepolia",
				"balance:optimism",
			]
		);
		assert_eq!(exec.stats().completed(), 1);
		assert_eq!(exec.stats().failed(), 0);
		assert_eq!(exec.stats().pending(), 0);
	}

	#[tokio::test]
	async fn simulation_failure_blocks_submission() {
		let ops = Arc::new(MockOps {
			simulate_revert: Some("insufficient fee".to_string()),
			..Default::default()
		});
		let exec = executor(
			ops.clone(),
			MockQuotes {
				result: Ok(quote_fixture()),
			},
			Arc::new(MockPermits::default()),
		);

		let outcome = exec.execute("sepolia", "optimism", &request()).await;
		match outcome {
			TransferOutcome::Failed { kind, reason } => {
				assert_eq!(kind, "simulation");
				assert!(reason.contains("insufficient fee"));
			}
			other => panic!("expected failure, got {:?}", other),
		}
		let calls = ops.calls();
		assert!(calls.contains(&"simulate".to_string()));
		assert!(!calls.contains(&"submit".to_string()));
		assert_eq!(exec.stats().failed(), 1);
	}

	#[tokio::test]
	async fn permit_deadline_is_route_deadline_plus_buffer() {
		let ops = Arc::new(MockOps::default());
		let permits = Arc::new(MockPermits::default());
		let exec = executor(
			ops,
			MockQuotes {
				result: Ok(quote_fixture()),
			},
			permits.clone(),
		);

		exec.execute("sepolia", "optimism", &request()).await;
		let deadlines = permits.deadlines.lock().unwrap();
		assert_eq!(deadlines.as_slice(), &[1_900_000_000 + BUFFER_SECS]);
	}

	#[tokio::test]
	async fn oversized_route_deadline_saturates_the_permit_deadline() {
		let mut quote = quote_fixture();
		quote.route_deadline = u64::MAX;
		let permits = Arc::new(MockPermits::default());
		let exec = executor(
			Arc::new(MockOps::default()),
			MockQuotes { result: Ok(quote) },
			permits.clone(),
		);

		let outcome = exec.execute("sepolia", "optimism", &request()).await;
		assert!(outcome.is_confirmed());
		let deadlines = permits.deadlines.lock().unwrap();
		assert_eq!(deadlines.as_slice(), &[u64::MAX]);
	}

	#[tokio::test]
	async fn transaction_value_is_quote_fee_plus_gas_drop() {
		let ops = Arc::new(MockOps::default());
		let exec = executor(
			ops.clone(),
			MockQuotes {
				result: Ok(quote_fixture()),
			},
			Arc::new(MockPermits::default()),
		);

		let mut req = request();
		req.gas_drop = 2_500;
		exec.execute("sepolia", "optimism", &req).await;
		let values = ops.values_seen.lock().unwrap();
		// Same value for simulation and submission
		assert_eq!(values.as_slice(), &[U256::from(3_500u64), U256::from(3_500u64)]);
	}

	#[tokio::test]
	async fn quote_timeout_is_a_classified_failure() {
		let ops = Arc::new(MockOps::default());
		let exec = executor(
			ops.clone(),
			MockQuotes {
				result: Err("timeout"),
			},
			Arc::new(MockPermits::default()),
		);

		let outcome = exec.execute("sepolia", "optimism", &request()).await;
		match outcome {
			TransferOutcome::Failed { kind, .. } => assert_eq!(kind, "quote"),
			other => panic!("expected failure, got {:?}", other),
		}
		assert!(!ops.calls().contains(&"simulate".to_string()));
		assert_eq!(exec.stats().failed(), 1);
	}

	#[tokio::test]
	async fn balance_read_failure_does_not_abort_the_transfer() {
		let ops = Arc::new(MockOps {
			balance_fails: true,
			..Default::default()
		});
		let exec = executor(
			ops,
			MockQuotes {
				result: Ok(quote_fixture()),
			},
			Arc::new(MockPermits::default()),
		);

		let outcome = exec.execute("sepolia", "optimism", &request()).await;
		assert!(outcome.is_confirmed());
	}

	#[tokio::test]
	async fn unknown_chain_is_a_classified_failure() {
		let ops = Arc::new(MockOps::default());
		let exec = executor(
			ops,
			MockQuotes {
				result: Ok(quote_fixture()),
			},
			Arc::new(MockPermits::default()),
		);

		let outcome = exec.execute("sepolia", "mars", &request()).await;
		match outcome {
			TransferOutcome::Failed { kind, .. } => assert_eq!(kind, "chain"),
			other => panic!("expected failure, got {:?}", other),
		}
	}
}
