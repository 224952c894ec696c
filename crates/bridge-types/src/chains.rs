//! Chain configuration types for multi-chain bridge operations.
//!
//! This module defines the per-chain facts the orchestrator needs: RPC
//! endpoint, token and bridge contract addresses, the protocol routing
//! domain, and display metadata. Profiles are loaded once from static
//! configuration and never mutated afterwards.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Configuration for a single supported chain.
///
/// # Fields
///
/// * `key` - Unique symbolic identifier (e.g. "sepolia", "optimism")
/// * `label` - Human-readable chain name for logs and the balance table
/// * `chain_id` - Numeric EVM chain id, used in the permit domain separator
/// * `domain` - Bridge-protocol routing domain id, distinct from `chain_id`
/// * `rpc_url` - HTTP(S) RPC endpoint for chain interaction
/// * `token_address` - Address of the bridged token contract
/// * `bridge_address` - Address of the bridge contract
/// * `explorer_tx_url` - Prefix for rendering transaction links
/// * `native_symbol` - Native asset symbol (e.g. "ETH")
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChainProfile {
	pub key: String,
	pub label: String,
	pub chain_id: u64,
	pub domain: u32,
	pub rpc_url: String,
	pub token_address: Address,
	pub bridge_address: Address,
	pub explorer_tx_url: String,
	pub native_symbol: String,
}

impl ChainProfile {
	/// Renders the explorer link for a transaction hash string.
	pub fn explorer_link(&self, tx_hash: &str) -> String {
		format!("{}{}", self.explorer_tx_url, tx_hash)
	}
}

/// Snapshot of the operator wallet on the hub chain.
///
/// Feeds the periodic display refresh; read-only and best-effort, so stale
/// values while a transfer is in flight are acceptable.
#[derive(Debug, Clone)]
pub struct WalletSnapshot {
	/// The operator address.
	pub address: Address,
	/// Native balance in wei.
	pub native_balance: U256,
	/// Current gas price in wei.
	pub gas_price: u128,
	/// Transaction count (account nonce) of the operator.
	pub tx_count: u64,
	/// Label of the chain the snapshot was taken on.
	pub network_label: String,
	/// Native asset symbol of that chain.
	pub native_symbol: String,
}

/// One row of the per-chain token balance table.
///
/// `balance` is `None` when the read failed; the row is still rendered so
/// the table shape stays stable across refreshes.
#[derive(Debug, Clone)]
pub struct TokenBalanceRow {
	/// Chain key the balance was read on.
	pub chain_key: String,
	/// Human-readable chain label.
	pub label: String,
	/// Token balance in base units, if the read succeeded.
	pub balance: Option<U256>,
}
