//! Permit signer for the bridge orchestrator.
//!
//! Produces the EIP-2612 typed-data approval that authorizes the bridge
//! contract to pull tokens from the operator. Tokens disagree on the permit
//! domain version, so signing is attempted with version "2" first and
//! retried once with version "1" before giving up.

use alloy_primitives::{Address, B256, U256};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{sol, Eip712Domain, SolStruct};
use async_trait::async_trait;
use bridge_registry::ChainRegistry;
use bridge_types::{PermitAuthorization, SecretString};
use std::borrow::Cow;
use std::sync::Arc;
use thiserror::Error;

sol! {
	struct Permit {
		address owner;
		address spender;
		uint256 value;
		uint256 nonce;
		uint256 deadline;
	}
}

/// Errors that can occur while producing a permit.
#[derive(Debug, Error)]
pub enum PermitError {
	/// A required on-chain read (token name, nonce) failed.
	#[error("Permit precondition read failed: {0}")]
	Read(String),
	/// Both domain versions were rejected by the signer.
	#[error("Permit signing failed: {0}")]
	SigningFailed(String),
}

/// Trait defining the interface for permit producers.
#[async_trait]
pub trait PermitInterface: Send + Sync {
	/// Signs a permit for `spender` to pull `amount` from `owner`, valid
	/// until `deadline` (unix seconds).
	async fn sign_permit(
		&self,
		chain_key: &str,
		owner: Address,
		spender: Address,
		amount: U256,
		deadline: u64,
	) -> Result<PermitAuthorization, PermitError>;
}

/// EIP-712 permit signer bound to the shared operator key.
pub struct Eip712PermitSigner {
	registry: Arc<ChainRegistry>,
	signer: PrivateKeySigner,
}

impl Eip712PermitSigner {
	pub fn new(
		registry: Arc<ChainRegistry>,
		private_key: &SecretString,
	) -> Result<Self, PermitError> {
		let signer: PrivateKeySigner = private_key.with_exposed(|key| {
			key.parse()
				.map_err(|_| PermitError::SigningFailed("invalid private key format".to_string()))
		})?;
		Ok(Self { registry, signer })
	}
}

/// Builds the typed-data signing hash for one permit domain version.
fn permit_digest(
	token_name: &str,
	version: &'static str,
	chain_id: u64,
	token_address: Address,
	permit: &Permit,
) -> B256 {
	let domain = Eip712Domain {
		name: Some(Cow::Owned(token_name.to_string())),
		version: Some(Cow::Borrowed(version)),
		chain_id: Some(U256::from(chain_id)),
		verifying_contract: Some(token_address),
		salt: None,
	};
	permit.eip712_signing_hash(&domain)
}

#[async_trait]
impl PermitInterface for Eip712PermitSigner {
	async fn sign_permit(
		&self,
		chain_key: &str,
		owner: Address,
		spender: Address,
		amount: U256,
		deadline: u64,
	) -> Result<PermitAuthorization, PermitError> {
		let handle = self
			.registry
			.get(chain_key)
			.map_err(|e| PermitError::Read(e.to_string()))?;
		let token_address = handle.profile.token_address;
		let chain_id = handle.profile.chain_id;

		let token_name = self
			.registry
			.token_name(chain_key)
			.await
			.map_err(|e| PermitError::Read(e.to_string()))?;
		let nonce = self
			.registry
			.permit_nonce(chain_key, owner)
			.await
			.map_err(|e| PermitError::Read(e.to_string()))?;

		let permit = Permit {
			owner,
			spender,
			value: amount,
			nonce,
			deadline: U256::from(deadline),
		};

		// Version "2" is the common case; fall back to "1" for tokens whose
		// permit domain differs.
		let mut last_error = None;
		for version in ["2", "1"] {
			let digest = permit_digest(&token_name, version, chain_id, token_address, &permit);
			match self.signer.sign_hash(&digest).await {
				Ok(signature) => {
					return Ok(PermitAuthorization {
						signature: signature.as_bytes().to_vec().into(),
						nonce,
						deadline,
						domain_version: version,
					});
				}
				Err(e) => {
					tracing::debug!(
						chain = %chain_key,
						version,
						"permit signing attempt failed: {}",
						e
					);
					last_error = Some(e);
				}
			}
		}

		Err(PermitError::SigningFailed(
			last_error
				.map(|e| e.to_string())
				.unwrap_or_else(|| "no signing attempt was made".to_string()),
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	fn sample_permit(owner: Address) -> Permit {
		Permit {
			owner,
			spender: Address::repeat_byte(0x22),
			value: U256::from(1_000_000u64),
			nonce: U256::from(3u64),
			deadline: U256::from(1_900_006_000u64),
		}
	}

	#[test]
	fn digest_depends_on_domain_version() {
		let owner = Address::repeat_byte(0x11);
		let permit = sample_permit(owner);
		let token = Address::repeat_byte(0x33);
		let v2 = permit_digest("USD Coin", "2", 11155111, token, &permit);
		let v1 = permit_digest("USD Coin", "1", 11155111, token, &permit);
		assert_ne!(v2, v1);
	}

	#[test]
	fn digest_is_deterministic() {
		let owner = Address::repeat_byte(0x11);
		let permit = sample_permit(owner);
		let token = Address::repeat_byte(0x33);
		let a = permit_digest("USD Coin", "2", 11155111, token, &permit);
		let b = permit_digest("USD Coin", "2", 11155111, token, &permit);
		assert_eq!(a, b);
	}

	#[tokio::test]
	async fn signs_a_65_byte_signature() {
		let signer: PrivateKeySigner = TEST_KEY.parse().unwrap();
		let permit = sample_permit(signer.address());
		let digest = permit_digest(
			"USD Coin",
			"2",
			11155111,
			Address::repeat_byte(0x33),
			&permit,
		);
		let signature = signer.sign_hash(&digest).await.unwrap();
		assert_eq!(signature.as_bytes().len(), 65);
	}
}
