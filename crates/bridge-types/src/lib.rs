//! Common types module for the bridge orchestrator.
//!
//! This module defines the core data types and structures shared by all
//! orchestrator components: chain configuration, route quotes, permit
//! authorizations, transfer payloads and outcomes, round plans, status
//! events, and helpers for unit conversion.

/// Per-chain connection and contract configuration.
pub mod chains;
/// Status events and transfer counters exposed to the display collaborator.
pub mod events;
/// Off-chain permit authorization types.
pub mod permit;
/// Round plan and chain selection types for the scheduling engine.
pub mod plan;
/// Route quote types returned by the pricing service.
pub mod quote;
/// Secure string type for private key material.
pub mod secret_string;
/// Transfer payload and outcome types.
pub mod transfer;
/// Unit conversion and formatting helpers.
pub mod units;

pub use chains::{ChainProfile, TokenBalanceRow, WalletSnapshot};
pub use events::{StatusEvent, StatusKind, StatusSink, TransferStats};
pub use permit::PermitAuthorization;
pub use plan::{ChainSelection, RoundPlan};
pub use quote::RouteQuote;
pub use secret_string::SecretString;
pub use transfer::{
	PermitParams, TransferConfirmation, TransferOutcome, TransferParams, TransferRequest,
};
pub use units::{
	format_units, gwei_to_wei, pad_address, parse_units, with_0x_prefix, without_0x_prefix,
};
