//! Route quote types returned by the pricing service.

use alloy_primitives::Bytes;

/// A signed, time-bounded authorization for one transfer route.
///
/// Fetched per transfer for a (source domain, destination domain) pair and
/// never cached: the signature is only valid until `route_deadline`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteQuote {
	/// Route authorization signature from the pricing service.
	pub signature: Bytes,
	/// Protocol fee in native wei; added to the transaction value and passed
	/// through as the uint64 fee parameter.
	pub fee_u64: u64,
	/// Minimum confirmation depth the destination side requires.
	pub min_finality_threshold: u32,
	/// Opaque hook data passed through to the bridge call.
	pub hook_data: Bytes,
	/// Unix seconds after which the quote is void.
	pub route_deadline: u64,
}
