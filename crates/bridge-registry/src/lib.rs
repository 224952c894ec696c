//! Chain registry for the bridge orchestrator.
//!
//! Holds one read provider and one wallet-backed signing provider per
//! configured chain, all bound to the single operator key. The registry is
//! built eagerly at startup and never mutated afterwards; every other
//! component resolves chains through it.

use alloy_network::EthereumWallet;
use alloy_primitives::{Address, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{sol, SolCall};
use alloy_transport_http::Http;
use bridge_types::{ChainProfile, SecretString, TokenBalanceRow, WalletSnapshot};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

sol! {
	function name() external view returns (string);
	function nonces(address owner) external view returns (uint256);
	function balanceOf(address account) external view returns (uint256);
}

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
	/// The requested chain key is not configured.
	#[error("Unknown chain: {0}")]
	UnknownChain(String),
	/// A provider could not be constructed from the configuration.
	#[error("Connection error: {0}")]
	Connection(String),
	/// An RPC read failed.
	#[error("RPC error: {0}")]
	Rpc(String),
}

type HttpProvider = Arc<dyn Provider<Http<reqwest::Client>> + Send + Sync>;

/// Connection handles for one chain.
pub struct ChainHandle {
	/// Static chain facts.
	pub profile: ChainProfile,
	/// Read-only provider.
	pub provider: HttpProvider,
	/// Wallet-backed provider used for transaction submission.
	pub signer_provider: HttpProvider,
}

/// Fixed registry of per-chain clients, keyed by chain identifier.
pub struct ChainRegistry {
	/// Chain keys in configuration order.
	order: Vec<String>,
	handles: HashMap<String, ChainHandle>,
	/// Address derived from the shared operator key.
	operator: Address,
}

impl ChainRegistry {
	/// Builds clients for every configured chain, all sharing the operator
	/// key. Fails if the key or any RPC URL is malformed; no network call is
	/// made here.
	pub fn new(chains: &[ChainProfile], private_key: &SecretString) -> Result<Self, RegistryError> {
		let signer: PrivateKeySigner = private_key.with_exposed(|key| {
			key.parse()
				.map_err(|_| RegistryError::Connection("invalid private key format".to_string()))
		})?;
		let operator = signer.address();

		let mut order = Vec::with_capacity(chains.len());
		let mut handles = HashMap::new();

		for profile in chains {
			let url: reqwest::Url = profile.rpc_url.parse().map_err(|e| {
				RegistryError::Connection(format!(
					"invalid RPC URL for chain '{}': {}",
					profile.key, e
				))
			})?;

			let chain_signer = signer.clone().with_chain_id(Some(profile.chain_id));
			let wallet = EthereumWallet::from(chain_signer);

			let provider = ProviderBuilder::new().on_http(url.clone());
			let signer_provider = ProviderBuilder::new()
				.with_recommended_fillers()
				.wallet(wallet)
				.on_http(url);

			order.push(profile.key.clone());
			handles.insert(
				profile.key.clone(),
				ChainHandle {
					profile: profile.clone(),
					provider: Arc::new(provider) as HttpProvider,
					signer_provider: Arc::new(signer_provider) as HttpProvider,
				},
			);
		}

		Ok(Self {
			order,
			handles,
			operator,
		})
	}

	/// Resolves a chain handle by key.
	pub fn get(&self, key: &str) -> Result<&ChainHandle, RegistryError> {
		self.handles
			.get(key)
			.ok_or_else(|| RegistryError::UnknownChain(key.to_string()))
	}

	/// Chain keys in configuration order.
	pub fn keys(&self) -> &[String] {
		&self.order
	}

	/// The address of the shared operator identity.
	pub fn operator(&self) -> Address {
		self.operator
	}

	async fn call_token(&self, key: &str, call_data: Vec<u8>) -> Result<Vec<u8>, RegistryError> {
		let handle = self.get(key)?;
		let request = TransactionRequest::default()
			.to(handle.profile.token_address)
			.input(call_data.into());
		let out = handle
			.provider
			.call(&request)
			.await
			.map_err(|e| RegistryError::Rpc(format!("token call on '{}' failed: {}", key, e)))?;
		Ok(out.to_vec())
	}

	/// Reads the token contract's human-readable name.
	pub async fn token_name(&self, key: &str) -> Result<String, RegistryError> {
		let out = self.call_token(key, nameCall {}.abi_encode()).await?;
		let decoded = nameCall::abi_decode_returns(&out, true)
			.map_err(|e| RegistryError::Rpc(format!("bad name() response: {}", e)))?;
		Ok(decoded._0)
	}

	/// Reads the owner's current permit nonce on the token contract.
	///
	/// Point-in-time value; not reserved or locked.
	pub async fn permit_nonce(&self, key: &str, owner: Address) -> Result<U256, RegistryError> {
		let out = self
			.call_token(key, noncesCall { owner }.abi_encode())
			.await?;
		let decoded = noncesCall::abi_decode_returns(&out, true)
			.map_err(|e| RegistryError::Rpc(format!("bad nonces() response: {}", e)))?;
		Ok(decoded._0)
	}

	/// Reads a token balance.
	pub async fn token_balance(&self, key: &str, account: Address) -> Result<U256, RegistryError> {
		let out = self
			.call_token(key, balanceOfCall { account }.abi_encode())
			.await?;
		let decoded = balanceOfCall::abi_decode_returns(&out, true)
			.map_err(|e| RegistryError::Rpc(format!("bad balanceOf() response: {}", e)))?;
		Ok(decoded._0)
	}

	/// Reads a native balance.
	pub async fn native_balance(&self, key: &str, account: Address) -> Result<U256, RegistryError> {
		let handle = self.get(key)?;
		handle
			.provider
			.get_balance(account)
			.await
			.map_err(|e| RegistryError::Rpc(format!("failed to get balance on '{}': {}", key, e)))
	}

	/// Reads the current gas price.
	pub async fn gas_price(&self, key: &str) -> Result<u128, RegistryError> {
		let handle = self.get(key)?;
		handle
			.provider
			.get_gas_price()
			.await
			.map_err(|e| RegistryError::Rpc(format!("failed to get gas price on '{}': {}", key, e)))
	}

	/// Reads the operator's transaction count.
	pub async fn tx_count(&self, key: &str, account: Address) -> Result<u64, RegistryError> {
		let handle = self.get(key)?;
		handle
			.provider
			.get_transaction_count(account)
			.await
			.map_err(|e| RegistryError::Rpc(format!("failed to get tx count on '{}': {}", key, e)))
	}

	/// Takes a wallet snapshot on the given chain for the display refresh.
	pub async fn wallet_snapshot(&self, key: &str) -> Result<WalletSnapshot, RegistryError> {
		let handle = self.get(key)?;
		let address = self.operator;
		let native_balance = self.native_balance(key, address).await?;
		let gas_price = self.gas_price(key).await?;
		let tx_count = self.tx_count(key, address).await?;
		Ok(WalletSnapshot {
			address,
			native_balance,
			gas_price,
			tx_count,
			network_label: handle.profile.label.clone(),
			native_symbol: handle.profile.native_symbol.clone(),
		})
	}

	/// Reads the operator's token balance on every chain, best-effort.
	///
	/// A failed read degrades the row to `None` instead of failing the
	/// whole table.
	pub async fn token_table(&self, account: Address) -> Vec<TokenBalanceRow> {
		let mut rows = Vec::with_capacity(self.order.len());
		for key in &self.order {
			let label = self
				.handles
				.get(key)
				.map(|h| h.profile.label.clone())
				.unwrap_or_else(|| key.clone());
			let balance = match self.token_balance(key, account).await {
				Ok(balance) => Some(balance),
				Err(e) => {
					tracing::warn!(chain = %key, "balance read failed: {}", e);
					None
				}
			};
			rows.push(TokenBalanceRow {
				chain_key: key.clone(),
				label,
				balance,
			});
		}
		rows
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	// Well-known hardhat test key
	const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	fn profile(key: &str, chain_id: u64) -> ChainProfile {
		ChainProfile {
			key: key.to_string(),
			label: format!("{} testnet", key),
			chain_id,
			domain: 0,
			rpc_url: "http://localhost:8545".to_string(),
			token_address: Address::ZERO,
			bridge_address: Address::ZERO,
			explorer_tx_url: "https://example.com/tx/".to_string(),
			native_symbol: "ETH".to_string(),
		}
	}

	#[test]
	fn builds_registry_and_derives_operator() {
		let chains = vec![profile("sepolia", 11155111), profile("optimism", 11155420)];
		let registry = ChainRegistry::new(&chains, &SecretString::from(TEST_KEY)).unwrap();
		assert_eq!(registry.keys(), &["sepolia".to_string(), "optimism".to_string()]);
		assert_eq!(
			registry.operator(),
			"0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
				.parse::<Address>()
				.unwrap()
		);
	}

	#[test]
	fn unknown_chain_is_an_error() {
		let chains = vec![profile("sepolia", 11155111), profile("base", 84532)];
		let registry = ChainRegistry::new(&chains, &SecretString::from(TEST_KEY)).unwrap();
		let err = registry.get("mars").err().unwrap();
		assert!(matches!(err, RegistryError::UnknownChain(k) if k == "mars"));
	}

	#[test]
	fn rejects_malformed_key() {
		let chains = vec![profile("sepolia", 11155111), profile("base", 84532)];
		let err = ChainRegistry::new(&chains, &SecretString::from("not-a-key"))
			.err()
			.unwrap();
		assert!(matches!(err, RegistryError::Connection(_)));
	}
}
