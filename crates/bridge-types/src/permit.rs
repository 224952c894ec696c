//! Off-chain permit authorization types.

use alloy_primitives::{Bytes, U256};

/// An EIP-2612 style signed approval for the bridge contract.
///
/// Created once per transfer and consumed exactly once by the on-chain
/// call. The nonce is the token contract's per-owner counter at signing
/// time; it is not reserved locally, so a permit built from a stale nonce
/// is rejected on-chain rather than pre-empted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitAuthorization {
	/// The typed-data signature (65 bytes).
	pub signature: Bytes,
	/// Owner permit nonce at signing time.
	pub nonce: U256,
	/// Unix seconds deadline, set to the route deadline plus a fixed buffer.
	pub deadline: u64,
	/// Permit domain version the token accepted ("1" or "2").
	pub domain_version: &'static str,
}
