//! Round plan and chain selection types for the scheduling engine.

use alloy_primitives::U256;

/// How the target chain set for a round is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainSelection {
	/// Every available chain, in registry order.
	All,
	/// A without-replacement uniform random sample of the given size,
	/// re-sampled independently every round. The size is clamped to
	/// [1, number of available chains] at validation time.
	Random(usize),
	/// An explicit, deduplicated, order-preserving list of chain keys.
	Explicit(Vec<String>),
}

/// User intent for one scheduling run.
///
/// Validated once before execution begins; invalid input aborts before any
/// chain I/O.
#[derive(Debug, Clone)]
pub struct RoundPlan {
	/// Amount per transfer in token base units. Must be positive.
	pub amount: U256,
	/// Number of rounds to execute. Must be at least one.
	pub rounds: u32,
	/// Delay between transfers in seconds.
	pub delay_secs: u64,
	/// Destination-chain native gas-drop per transfer, in wei.
	pub gas_drop_wei: u64,
	/// Target chain selection applied each round.
	pub selection: ChainSelection,
}
