//! Alloy-based chain operations for the transfer executor.
//!
//! Implements [`ChainOps`] over the chain registry's providers: fee and
//! limit view calls, eth_call dry-runs, transaction submission through the
//! wallet-backed provider, and a receipt poll for confirmation.

use crate::{ChainOps, ChainReceipt, TransferError};
use alloy_primitives::{Address, FixedBytes, U256};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use bridge_registry::ChainRegistry;
use bridge_types::{ChainProfile, PermitParams, TransferParams};
use std::sync::Arc;

sol! {
	struct BridgeTransferParams {
		uint256 amount;
		uint256 maxFee;
		uint64 fee;
		uint64 deadline;
		uint64 gasDropAmount;
		uint32 destinationDomain;
		uint32 minFinalityThreshold;
		bytes32 recipient;
		bytes32 auxRecipient;
		bool isNative;
		bytes hookData;
		bytes signature;
	}

	struct BridgePermitParams {
		uint256 value;
		uint256 deadline;
		bytes signature;
	}

	function transferV2WithPermit(
		BridgeTransferParams _params,
		BridgePermitParams _permitParams
	) external payable;

	function getFee(uint256 amount, uint256 staticFee) external view returns (uint256);

	function state() external view returns (
		address signer,
		uint32 nonce,
		uint32 maxUSDCGasDrop,
		uint16 feeBP,
		bool reentrancyLock,
		bool paused,
		uint128 maxNativeGasDrop,
		uint128 lastFeeWithdrawTimestamp
	);
}

/// Selector of the standard `Error(string)` revert.
const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Poll interval while waiting for a receipt.
const RECEIPT_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(7);

/// Chain operations backed by the registry's alloy providers.
pub struct AlloyChainOps {
	registry: Arc<ChainRegistry>,
}

impl AlloyChainOps {
	pub fn new(registry: Arc<ChainRegistry>) -> Self {
		Self { registry }
	}

	fn transfer_request(
		&self,
		profile: &ChainProfile,
		params: &TransferParams,
		permit: &PermitParams,
		value: U256,
	) -> TransactionRequest {
		let call = transferV2WithPermitCall {
			_params: to_sol_params(params),
			_permitParams: BridgePermitParams {
				value: permit.value,
				deadline: permit.deadline,
				signature: permit.signature.clone(),
			},
		};
		TransactionRequest::default()
			.from(self.registry.operator())
			.to(profile.bridge_address)
			.input(call.abi_encode().into())
			.value(value)
	}
}

fn to_sol_params(params: &TransferParams) -> BridgeTransferParams {
	BridgeTransferParams {
		amount: params.amount,
		maxFee: params.max_fee,
		fee: params.fee,
		deadline: params.deadline,
		gasDropAmount: params.gas_drop_amount,
		destinationDomain: params.destination_domain,
		minFinalityThreshold: params.min_finality_threshold,
		recipient: params.recipient,
		auxRecipient: params.aux_recipient,
		isNative: params.is_native,
		hookData: params.hook_data.clone(),
		signature: params.signature.clone(),
	}
}

/// Decodes an ABI-encoded `Error(string)` payload.
fn decode_error_string(data: &[u8]) -> Option<String> {
	if data.len() < 68 || data[..4] != ERROR_STRING_SELECTOR {
		return None;
	}
	let body = &data[4..];
	let offset = U256::from_be_slice(&body[..32]).try_into().ok()?;
	let len_start: usize = offset;
	if body.len() < len_start + 32 {
		return None;
	}
	let len: usize = U256::from_be_slice(&body[len_start..len_start + 32])
		.try_into()
		.ok()?;
	let text_start = len_start + 32;
	if body.len() < text_start + len {
		return None;
	}
	String::from_utf8(body[text_start..text_start + len].to_vec()).ok()
}

/// Extracts a short revert reason from an RPC error message.
///
/// JSON-RPC errors carry the revert payload as a hex blob somewhere in the
/// message; when an `Error(string)` payload is found it is decoded,
/// otherwise the raw message is returned.
fn revert_reason(message: &str) -> String {
	if let Some(pos) = message.find("0x08c379a0") {
		let hex_run: String = message[pos + 2..]
			.chars()
			.take_while(|c| c.is_ascii_hexdigit())
			.collect();
		if let Ok(data) = hex::decode(&hex_run) {
			if let Some(reason) = decode_error_string(&data) {
				return reason;
			}
		}
	}
	message.trim().to_string()
}

#[async_trait]
impl ChainOps for AlloyChainOps {
	fn operator(&self) -> Address {
		self.registry.operator()
	}

	fn profile(&self, chain_key: &str) -> Result<ChainProfile, TransferError> {
		Ok(self.registry.get(chain_key)?.profile.clone())
	}

	async fn token_balance(
		&self,
		chain_key: &str,
		account: Address,
	) -> Result<U256, TransferError> {
		Ok(self.registry.token_balance(chain_key, account).await?)
	}

	async fn max_fee(
		&self,
		chain_key: &str,
		amount: U256,
		static_fee: U256,
	) -> Result<U256, TransferError> {
		let handle = self.registry.get(chain_key)?;
		let call = getFeeCall {
			amount,
			staticFee: static_fee,
		};
		let request = TransactionRequest::default()
			.to(handle.profile.bridge_address)
			.input(call.abi_encode().into());
		let out = handle
			.provider
			.call(&request)
			.await
			.map_err(|e| TransferError::Fee(format!("getFee call failed: {}", e)))?;
		let decoded = getFeeCall::abi_decode_returns(&out, true)
			.map_err(|e| TransferError::Fee(format!("bad getFee response: {}", e)))?;
		Ok(decoded._0)
	}

	async fn max_native_gas_drop(&self, chain_key: &str) -> Result<U256, TransferError> {
		let handle = self.registry.get(chain_key)?;
		let request = TransactionRequest::default()
			.to(handle.profile.bridge_address)
			.input(stateCall {}.abi_encode().into());
		let out = handle
			.provider
			.call(&request)
			.await
			.map_err(|e| TransferError::Fee(format!("state call failed: {}", e)))?;
		let decoded = stateCall::abi_decode_returns(&out, true)
			.map_err(|e| TransferError::Fee(format!("bad state response: {}", e)))?;
		Ok(U256::from(decoded.maxNativeGasDrop))
	}

	async fn simulate(
		&self,
		chain_key: &str,
		params: &TransferParams,
		permit: &PermitParams,
		value: U256,
	) -> Result<(), TransferError> {
		let handle = self.registry.get(chain_key)?;
		let request = self.transfer_request(&handle.profile, params, permit, value);
		handle
			.provider
			.call(&request)
			.await
			.map(|_| ())
			.map_err(|e| TransferError::Simulation(revert_reason(&e.to_string())))
	}

	async fn submit(
		&self,
		chain_key: &str,
		params: &TransferParams,
		permit: &PermitParams,
		value: U256,
	) -> Result<FixedBytes<32>, TransferError> {
		let handle = self.registry.get(chain_key)?;
		let request = self.transfer_request(&handle.profile, params, permit, value);
		let pending = handle
			.signer_provider
			.send_transaction(request)
			.await
			.map_err(|e| TransferError::Submission(revert_reason(&e.to_string())))?;
		let tx_hash = *pending.tx_hash();
		tracing::info!(
			chain = %chain_key,
			tx_hash = %tx_hash,
			"submitted bridge transfer"
		);
		Ok(tx_hash)
	}

	async fn confirm(
		&self,
		chain_key: &str,
		tx_hash: FixedBytes<32>,
	) -> Result<ChainReceipt, TransferError> {
		let handle = self.registry.get(chain_key)?;

		// No local deadline: wait until the network includes or errors
		loop {
			match handle.provider.get_transaction_receipt(tx_hash).await {
				Ok(Some(receipt)) => {
					return Ok(ChainReceipt {
						hash: receipt.transaction_hash,
						block_number: receipt.block_number.unwrap_or(0),
						success: receipt.status(),
					});
				}
				Ok(None) => {
					tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
				}
				Err(e) => {
					return Err(TransferError::Confirmation(format!(
						"failed to get receipt: {}",
						e
					)));
				}
			}
		}
	}
}
