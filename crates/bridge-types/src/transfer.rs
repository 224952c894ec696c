//! Transfer payload and outcome types.
//!
//! `TransferParams` mirrors the bridge contract's transfer tuple and is
//! built fresh per transfer from the route quote, the permit and user
//! input. `TransferOutcome` is the terminal result of one attempt and is
//! used only for counters and logging.

use alloy_primitives::{Address, Bytes, FixedBytes, U256};
use std::time::Duration;

/// The full on-chain transfer call payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferParams {
	/// Amount of the bridged token in base units.
	pub amount: U256,
	/// Maximum token-denominated fee the contract may deduct.
	pub max_fee: U256,
	/// Native protocol fee from the route quote.
	pub fee: u64,
	/// Route quote deadline in unix seconds.
	pub deadline: u64,
	/// Destination-chain native gas-drop amount in wei.
	pub gas_drop_amount: u64,
	/// Bridge-protocol routing domain of the destination chain.
	pub destination_domain: u32,
	/// Minimum confirmation depth required by the route.
	pub min_finality_threshold: u32,
	/// Recipient address, left-padded to 32 bytes.
	pub recipient: FixedBytes<32>,
	/// Auxiliary recipient field for non-EVM destinations; always zero here.
	pub aux_recipient: FixedBytes<32>,
	/// Whether the fee is paid in the native asset. Always true for this flow.
	pub is_native: bool,
	/// Opaque hook data passed through from the quote.
	pub hook_data: Bytes,
	/// Route authorization signature from the quote.
	pub signature: Bytes,
}

/// The permit sub-payload accompanying the transfer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitParams {
	/// Approved token amount in base units.
	pub value: U256,
	/// Permit deadline in unix seconds.
	pub deadline: U256,
	/// The permit signature.
	pub signature: Bytes,
}

/// User input for one transfer invocation.
#[derive(Debug, Clone)]
pub struct TransferRequest {
	/// Amount to bridge in token base units.
	pub amount: U256,
	/// Recipient on the destination chain; defaults to the sender.
	pub recipient: Option<Address>,
	/// Destination-chain native gas-drop in wei.
	pub gas_drop: u64,
	/// Pause after the transfer completes, pacing subsequent transfers.
	pub delay: Duration,
}

/// Identifying hashes of a confirmed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfirmation {
	/// Hash captured at submission time.
	pub tx_hash: FixedBytes<32>,
	/// Hash from the inclusion receipt.
	pub receipt_hash: FixedBytes<32>,
}

/// Terminal result of one transfer attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
	/// The transfer was submitted and confirmed on-chain.
	Confirmed(TransferConfirmation),
	/// The transfer failed at some stage of the pipeline.
	Failed {
		/// Short classification of the failure (e.g. "quote", "simulation").
		kind: &'static str,
		/// Human-readable reason, preferring decoded revert text.
		reason: String,
	},
}

impl TransferOutcome {
	/// Returns true for a confirmed transfer.
	pub fn is_confirmed(&self) -> bool {
		matches!(self, TransferOutcome::Confirmed(_))
	}
}
