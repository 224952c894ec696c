//! Unit conversion and formatting helpers.
//!
//! Amounts move through the system in token base units (`U256`); these
//! helpers convert between the decimal strings users type, base units, and
//! the formats used in logs.

use alloy_primitives::{Address, FixedBytes, U256};

/// Parses a decimal amount string into base units with the given number of
/// decimals. Returns `None` for malformed input or excess fractional digits.
pub fn parse_units(amount: &str, decimals: u8) -> Option<U256> {
	let amount = amount.trim();
	if amount.is_empty() || amount.starts_with('-') {
		return None;
	}
	let (whole, frac) = match amount.split_once('.') {
		Some((w, f)) => (w, f),
		None => (amount, ""),
	};
	if frac.len() > decimals as usize {
		return None;
	}
	let whole: U256 = if whole.is_empty() {
		U256::ZERO
	} else {
		whole.parse().ok()?
	};
	let scale = U256::from(10u64).pow(U256::from(decimals));
	let mut value = whole.checked_mul(scale)?;
	if !frac.is_empty() {
		let frac_value: U256 = frac.parse().ok()?;
		let frac_scale = U256::from(10u64).pow(U256::from(decimals as usize - frac.len()));
		value = value.checked_add(frac_value.checked_mul(frac_scale)?)?;
	}
	Some(value)
}

/// Formats base units as a decimal string, trimming trailing fractional
/// zeros.
pub fn format_units(value: U256, decimals: u8) -> String {
	let scale = U256::from(10u64).pow(U256::from(decimals));
	let whole = value / scale;
	let frac = value % scale;
	if frac.is_zero() {
		return whole.to_string();
	}
	let frac = format!("{:0>width$}", frac, width = decimals as usize);
	let frac = frac.trim_end_matches('0');
	format!("{}.{}", whole, frac)
}

/// Converts a gwei amount to wei.
pub fn gwei_to_wei(gwei: u64) -> u128 {
	gwei as u128 * 1_000_000_000
}

/// Left-pads an address to 32 bytes for the bridge recipient fields.
pub fn pad_address(address: Address) -> FixedBytes<32> {
	let mut out = [0u8; 32];
	out[12..].copy_from_slice(address.as_slice());
	FixedBytes::from(out)
}

/// Ensures a hex string carries a 0x prefix.
pub fn with_0x_prefix(s: &str) -> String {
	if s.starts_with("0x") || s.starts_with("0X") {
		s.to_string()
	} else {
		format!("0x{}", s)
	}
}

/// Strips a 0x prefix from a hex string if present.
pub fn without_0x_prefix(s: &str) -> &str {
	s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s)
}
