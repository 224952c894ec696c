//! Scheduling engine for the bridge orchestrator.
//!
//! Expands a validated round plan into an ordered sequence of transfer
//! invocations: rounds times the round's target set, strictly sequential.
//! Selection is `all` (registry order), `random(count)` (re-sampled
//! without replacement every round) or an explicit list. A per-transfer
//! failure is counted and logged but never aborts the round or the run.

use alloy_primitives::U256;
use async_trait::async_trait;
use bridge_executor::TransferExecutor;
use bridge_types::{ChainSelection, RoundPlan, TransferOutcome, TransferRequest};
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur before a run starts.
#[derive(Debug, Error)]
pub enum PlanError {
	/// The plan failed validation; nothing was executed.
	#[error("Invalid plan: {0}")]
	Invalid(String),
}

/// Trait the scheduler drives transfers through.
///
/// Implemented by [`TransferExecutor`]; tests substitute a scripted mock
/// to check round and selection accounting without chain I/O.
#[async_trait]
pub trait TransferRunner: Send + Sync {
	/// Executes one transfer; failures are classified into the outcome.
	async fn run_transfer(
		&self,
		source_key: &str,
		dest_key: &str,
		request: &TransferRequest,
	) -> TransferOutcome;

	/// Best-effort read of a chain's native gas-drop ceiling.
	async fn gas_drop_ceiling(&self, chain_key: &str) -> Option<U256>;
}

#[async_trait]
impl TransferRunner for TransferExecutor {
	async fn run_transfer(
		&self,
		source_key: &str,
		dest_key: &str,
		request: &TransferRequest,
	) -> TransferOutcome {
		self.execute(source_key, dest_key, request).await
	}

	async fn gas_drop_ceiling(&self, chain_key: &str) -> Option<U256> {
		TransferExecutor::gas_drop_ceiling(self, chain_key).await
	}
}

/// Which end of every transfer in a run is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
	/// The fixed chain is the source; targets are destinations.
	FromFixed,
	/// The fixed chain is the destination; targets are sources.
	ToFixed,
}

/// Totals for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
	pub attempted: u64,
	pub completed: u64,
	pub failed: u64,
}

/// Sequences transfers across rounds and chain selections.
pub struct Scheduler {
	runner: Arc<dyn TransferRunner>,
	/// Chains available as the non-fixed end, in registry order.
	available: Vec<String>,
}

impl Scheduler {
	pub fn new(runner: Arc<dyn TransferRunner>, available: Vec<String>) -> Self {
		Self { runner, available }
	}

	/// Parses a user selection string against the available chain set.
	///
	/// Accepts `all`, `random`, or a comma-separated list of chain keys.
	/// The list is deduplicated preserving order; an unknown or empty
	/// selection is rejected here, before any network call.
	pub fn parse_selection(
		input: &str,
		random_count: usize,
		available: &[String],
	) -> Result<ChainSelection, PlanError> {
		let input = input.trim().to_lowercase();
		if input.is_empty() {
			return Err(PlanError::Invalid("selection must not be empty".to_string()));
		}
		if input == "all" {
			return Ok(ChainSelection::All);
		}
		if input == "random" {
			return Ok(ChainSelection::Random(random_count.max(1)));
		}
		let mut seen = HashSet::new();
		let mut keys = Vec::new();
		for part in input.split(',') {
			let part = part.trim();
			if part.is_empty() {
				continue;
			}
			if !available.iter().any(|k| k == part) {
				return Err(PlanError::Invalid(format!("unknown chain key '{}'", part)));
			}
			if seen.insert(part.to_string()) {
				keys.push(part.to_string());
			}
		}
		if keys.is_empty() {
			return Err(PlanError::Invalid(
				"selection resolved to no chains".to_string(),
			));
		}
		Ok(ChainSelection::Explicit(keys))
	}

	/// Validates a plan against this scheduler's available chain set.
	pub fn validate_plan(&self, plan: &RoundPlan) -> Result<(), PlanError> {
		if plan.amount.is_zero() {
			return Err(PlanError::Invalid("amount must be positive".to_string()));
		}
		if plan.rounds == 0 {
			return Err(PlanError::Invalid(
				"round count must be a positive integer".to_string(),
			));
		}
		match &plan.selection {
			ChainSelection::All => {}
			ChainSelection::Random(_) => {}
			ChainSelection::Explicit(keys) => {
				if keys.is_empty() {
					return Err(PlanError::Invalid(
						"explicit selection must not be empty".to_string(),
					));
				}
				for key in keys {
					if !self.available.iter().any(|k| k == key) {
						return Err(PlanError::Invalid(format!("unknown chain key '{}'", key)));
					}
				}
			}
		}
		Ok(())
	}

	/// Runs a plan with the fixed chain as source of every transfer.
	pub async fn run_fixed_source(
		&self,
		source_key: &str,
		plan: &RoundPlan,
	) -> Result<RunSummary, PlanError> {
		self.run_rounds(Direction::FromFixed, source_key, plan).await
	}

	/// Runs a plan with the fixed chain as destination of every transfer.
	pub async fn run_fixed_destination(
		&self,
		dest_key: &str,
		plan: &RoundPlan,
	) -> Result<RunSummary, PlanError> {
		self.run_rounds(Direction::ToFixed, dest_key, plan).await
	}

	/// Runs a plan in the chosen direction with a forced random selection
	/// of `count` chains per round.
	pub async fn run_random(
		&self,
		direction: Direction,
		fixed_key: &str,
		count: usize,
		plan: &RoundPlan,
	) -> Result<RunSummary, PlanError> {
		let mut plan = plan.clone();
		plan.selection = ChainSelection::Random(count);
		self.run_rounds(direction, fixed_key, &plan).await
	}

	async fn run_rounds(
		&self,
		direction: Direction,
		fixed_key: &str,
		plan: &RoundPlan,
	) -> Result<RunSummary, PlanError> {
		self.validate_plan(plan)?;

		let mut summary = RunSummary::default();
		for round in 1..=plan.rounds {
			let targets = self.targets_for_round(&plan.selection);
			tracing::info!(
				round,
				rounds = plan.rounds,
				targets = %targets.join(", "),
				"starting round"
			);

			for target in &targets {
				let (source_key, dest_key) = match direction {
					Direction::FromFixed => (fixed_key, target.as_str()),
					Direction::ToFixed => (target.as_str(), fixed_key),
				};

				self.advisory_gas_drop_check(source_key, plan.gas_drop_wei)
					.await;

				let request = TransferRequest {
					amount: plan.amount,
					recipient: None,
					gas_drop: plan.gas_drop_wei,
					delay: Duration::from_secs(plan.delay_secs),
				};
				summary.attempted += 1;
				match self.runner.run_transfer(source_key, dest_key, &request).await {
					TransferOutcome::Confirmed(_) => summary.completed += 1,
					TransferOutcome::Failed { kind, reason } => {
						summary.failed += 1;
						tracing::error!(
							source = %source_key,
							dest = %dest_key,
							kind,
							"transfer failed: {}",
							reason
						);
					}
				}
			}
		}
		Ok(summary)
	}

	/// Non-blocking advisory check: warns when the requested gas-drop
	/// exceeds the source chain's configured ceiling, then proceeds. The
	/// contract is the final authority and may reject or clamp.
	async fn advisory_gas_drop_check(&self, source_key: &str, gas_drop_wei: u64) {
		if let Some(ceiling) = self.runner.gas_drop_ceiling(source_key).await {
			if !ceiling.is_zero() && U256::from(gas_drop_wei) > ceiling {
				tracing::warn!(
					chain = %source_key,
					gas_drop = gas_drop_wei,
					ceiling = %ceiling,
					"requested gas-drop exceeds on-chain ceiling"
				);
			}
		}
	}

	fn targets_for_round(&self, selection: &ChainSelection) -> Vec<String> {
		match selection {
			ChainSelection::All => self.available.clone(),
			ChainSelection::Explicit(keys) => keys.clone(),
			ChainSelection::Random(count) => {
				let count = (*count).clamp(1, self.available.len().max(1));
				self.available
					.choose_multiple(&mut rand::thread_rng(), count)
					.cloned()
					.collect()
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::FixedBytes;
	use bridge_types::TransferConfirmation;
	use std::sync::Mutex;

	struct MockRunner {
		calls: Mutex<Vec<(String, String)>>,
		fail_dest: Option<String>,
	}

	impl MockRunner {
		fn new() -> Self {
			Self {
				calls: Mutex::new(Vec::new()),
				fail_dest: None,
			}
		}

		fn failing_on(dest: &str) -> Self {
			Self {
				calls: Mutex::new(Vec::new()),
				fail_dest: Some(dest.to_string()),
			}
		}

		fn calls(&self) -> Vec<(String, String)> {
			self.calls.lock().unwrap().clone()
		}
	}

	#[async_trait]
	impl TransferRunner for MockRunner {
		async fn run_transfer(
			&self,
			source_key: &str,
			dest_key: &str,
			_request: &TransferRequest,
		) -> TransferOutcome {
			self.calls
				.lock()
				.unwrap()
				.push((source_key.to_string(), dest_key.to_string()));
			if self.fail_dest.as_deref() == Some(dest_key) {
				TransferOutcome::Failed {
					kind: "quote",
					reason: "scripted failure".to_string(),
				}
			} else {
				TransferOutcome::Confirmed(TransferConfirmation {
					tx_hash: FixedBytes::repeat_byte(0x11),
					receipt_hash: FixedBytes::repeat_byte(0x11),
				})
			}
		}

		async fn gas_drop_ceiling(&self, _chain_key: &str) -> Option<U256> {
			Some(U256::from(1_000_000u64))
		}
	}

	fn spokes() -> Vec<String> {
		vec![
			"optimism".to_string(),
			"arbitrum".to_string(),
			"base".to_string(),
			"unichain".to_string(),
		]
	}

	fn plan(selection: ChainSelection, rounds: u32) -> RoundPlan {
		RoundPlan {
			amount: U256::from(1_000_000u64),
			rounds,
			delay_secs: 0,
			gas_drop_wei: 0,
			selection,
		}
	}

	#[tokio::test]
	async fn attempts_rounds_times_selection_size() {
		let runner = Arc::new(MockRunner::new());
		let scheduler = Scheduler::new(runner.clone(), spokes());
		let plan = plan(
			ChainSelection::Explicit(vec!["optimism".to_string(), "base".to_string()]),
			3,
		);
		let summary = scheduler.run_fixed_source("sepolia", &plan).await.unwrap();
		assert_eq!(summary.attempted, 6);
		assert_eq!(summary.completed + summary.failed, summary.attempted);
		assert_eq!(runner.calls().len(), 6);
	}

	#[tokio::test]
	async fn failures_do_not_abort_the_round_or_run() {
		let runner = Arc::new(MockRunner::failing_on("arbitrum"));
		let scheduler = Scheduler::new(runner.clone(), spokes());
		let plan = plan(ChainSelection::All, 2);
		let summary = scheduler.run_fixed_source("sepolia", &plan).await.unwrap();
		assert_eq!(summary.attempted, 8);
		assert_eq!(summary.failed, 2);
		assert_eq!(summary.completed, 6);
		// Every pair was still attempted, in registry order
		let calls = runner.calls();
		assert_eq!(calls[0], ("sepolia".to_string(), "optimism".to_string()));
		assert_eq!(calls[1], ("sepolia".to_string(), "arbitrum".to_string()));
		assert_eq!(calls[2], ("sepolia".to_string(), "base".to_string()));
	}

	#[tokio::test]
	async fn fixed_destination_swaps_the_pair() {
		let runner = Arc::new(MockRunner::new());
		let scheduler = Scheduler::new(runner.clone(), spokes());
		let plan = plan(ChainSelection::Explicit(vec!["base".to_string()]), 1);
		scheduler.run_fixed_destination("sepolia", &plan).await.unwrap();
		assert_eq!(
			runner.calls(),
			vec![("base".to_string(), "sepolia".to_string())]
		);
	}

	#[tokio::test]
	async fn unknown_chain_key_fails_before_any_transfer() {
		let runner = Arc::new(MockRunner::new());
		let scheduler = Scheduler::new(runner.clone(), spokes());
		let plan = plan(
			ChainSelection::Explicit(vec!["optimism".to_string(), "mars".to_string()]),
			1,
		);
		let err = scheduler.run_fixed_source("sepolia", &plan).await.unwrap_err();
		assert!(matches!(err, PlanError::Invalid(_)));
		assert!(runner.calls().is_empty());
	}

	#[tokio::test]
	async fn zero_amount_fails_before_any_transfer() {
		let runner = Arc::new(MockRunner::new());
		let scheduler = Scheduler::new(runner.clone(), spokes());
		let mut bad = plan(ChainSelection::All, 1);
		bad.amount = U256::ZERO;
		assert!(scheduler.run_fixed_source("sepolia", &bad).await.is_err());
		assert!(runner.calls().is_empty());
	}

	#[tokio::test]
	async fn random_selection_never_repeats_within_a_round() {
		let runner = Arc::new(MockRunner::new());
		let scheduler = Scheduler::new(runner.clone(), spokes());
		let plan = plan(ChainSelection::Random(3), 1);
		scheduler.run_fixed_source("sepolia", &plan).await.unwrap();
		let calls = runner.calls();
		assert_eq!(calls.len(), 3);
		let unique: HashSet<_> = calls.iter().map(|(_, d)| d.clone()).collect();
		assert_eq!(unique.len(), 3);
	}

	#[tokio::test]
	async fn random_count_is_clamped_to_available_chains() {
		let runner = Arc::new(MockRunner::new());
		let scheduler = Scheduler::new(runner.clone(), spokes());
		let oversized = plan(ChainSelection::Random(10), 1);
		let summary = scheduler
			.run_fixed_source("sepolia", &oversized)
			.await
			.unwrap();
		assert_eq!(summary.attempted, 4);

		let runner = Arc::new(MockRunner::new());
		let scheduler = Scheduler::new(runner.clone(), spokes());
		let undersized = plan(ChainSelection::Random(0), 1);
		let summary = scheduler
			.run_fixed_source("sepolia", &undersized)
			.await
			.unwrap();
		assert_eq!(summary.attempted, 1);
	}

	#[tokio::test]
	async fn run_random_forces_random_selection() {
		let runner = Arc::new(MockRunner::new());
		let scheduler = Scheduler::new(runner.clone(), spokes());
		let plan = plan(ChainSelection::All, 2);
		let summary = scheduler
			.run_random(Direction::ToFixed, "sepolia", 2, &plan)
			.await
			.unwrap();
		assert_eq!(summary.attempted, 4);
		assert!(runner.calls().iter().all(|(_, d)| d == "sepolia"));
	}

	#[test]
	fn parse_selection_all_and_random() {
		let available = spokes();
		assert_eq!(
			Scheduler::parse_selection("all", 2, &available).unwrap(),
			ChainSelection::All
		);
		assert_eq!(
			Scheduler::parse_selection("random", 2, &available).unwrap(),
			ChainSelection::Random(2)
		);
		assert_eq!(
			Scheduler::parse_selection("random", 0, &available).unwrap(),
			ChainSelection::Random(1)
		);
	}

	#[test]
	fn parse_selection_deduplicates_preserving_order() {
		let available = spokes();
		let selection =
			Scheduler::parse_selection("base, optimism ,base", 0, &available).unwrap();
		assert_eq!(
			selection,
			ChainSelection::Explicit(vec!["base".to_string(), "optimism".to_string()])
		);
	}

	#[test]
	fn parse_selection_rejects_bad_input() {
		let available = spokes();
		assert!(Scheduler::parse_selection("", 0, &available).is_err());
		assert!(Scheduler::parse_selection("   ", 0, &available).is_err());
		assert!(Scheduler::parse_selection("optimism,mars", 0, &available).is_err());
		assert!(Scheduler::parse_selection(",,", 0, &available).is_err());
	}

	#[tokio::test]
	async fn all_selection_follows_registry_order() {
		let runner = Arc::new(MockRunner::new());
		let scheduler = Scheduler::new(runner.clone(), spokes());
		let plan = plan(ChainSelection::All, 1);
		scheduler.run_fixed_source("sepolia", &plan).await.unwrap();
		let dests: Vec<_> = runner.calls().into_iter().map(|(_, d)| d).collect();
		assert_eq!(dests, spokes());
	}
}
