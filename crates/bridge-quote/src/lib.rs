//! Quote service for the bridge orchestrator.
//!
//! Fetches a signed route authorization and fee parameters from the remote
//! pricing service for a (source domain, destination domain) pair. The
//! upstream API is inconsistent about field naming, so every logical value
//! is extracted through an ordered list of candidate names, first present
//! and non-null wins. This is a compatibility shim, not an ambiguity to
//! resolve.
//!
//! No retry happens at this layer and quotes are never cached: route
//! signatures are time-sensitive and fetched fresh for every transfer.

use alloy_primitives::Bytes;
use async_trait::async_trait;
use bridge_types::RouteQuote;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Candidate field names for the fee in the route response.
const ROUTE_FEE_FIELDS: &[&str] = &["feeU64", "fee"];
/// Candidate field names for the route deadline.
const DEADLINE_FIELDS: &[&str] = &[
	"deadline",
	"expireAt",
	"expiry",
	"expiration",
	"params.deadline",
];
/// Candidate field names for the finality threshold.
const FINALITY_FIELDS: &[&str] = &["minFinalityThreshold", "minFinality"];
/// Candidate field names for the fee in the fallback response.
const FALLBACK_FEE_FIELDS: &[&str] = &["feeU64", "burnFee", "nativeFee", "fee"];

/// Errors that can occur while fetching a route quote.
#[derive(Debug, Error)]
pub enum QuoteError {
	/// The pricing service did not return a usable route.
	#[error("Quote unavailable: {0}")]
	Unavailable(String),
	/// No fee could be resolved from the route response or the fallback
	/// fee endpoint.
	#[error("Fee unresolved after route and fallback queries")]
	FeeUnresolved,
	/// The HTTP call exceeded the configured ceiling.
	#[error("Quote request timed out")]
	Timeout,
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
}

/// Trait defining the interface for route quote sources.
#[async_trait]
pub trait QuoteInterface: Send + Sync {
	/// Fetches a signed route quote for the given domain pair.
	async fn fetch_route(
		&self,
		source_domain: u32,
		destination_domain: u32,
	) -> Result<RouteQuote, QuoteError>;
}

/// HTTP implementation of the quote interface.
pub struct HttpQuoteService {
	client: reqwest::Client,
	route_url: String,
	fee_url: String,
	default_finality: u32,
	default_hook_data: Bytes,
}

impl HttpQuoteService {
	/// Creates a quote service with a bounded per-request timeout.
	pub fn new(
		route_url: String,
		fee_url: String,
		timeout: Duration,
		default_finality: u32,
		default_hook_data: Bytes,
	) -> Result<Self, QuoteError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| QuoteError::Network(format!("failed to build HTTP client: {}", e)))?;
		Ok(Self {
			client,
			route_url,
			fee_url,
			default_finality,
			default_hook_data,
		})
	}

	async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, QuoteError> {
		let response = self
			.client
			.get(url)
			.query(query)
			.send()
			.await
			.map_err(map_reqwest_error)?;
		response.json::<Value>().await.map_err(map_reqwest_error)
	}
}

fn map_reqwest_error(e: reqwest::Error) -> QuoteError {
	if e.is_timeout() {
		QuoteError::Timeout
	} else {
		QuoteError::Network(e.to_string())
	}
}

#[async_trait]
impl QuoteInterface for HttpQuoteService {
	async fn fetch_route(
		&self,
		source_domain: u32,
		destination_domain: u32,
	) -> Result<RouteQuote, QuoteError> {
		let query = [
			("localDomain", source_domain.to_string()),
			("destinationDomain", destination_domain.to_string()),
			("isNative", "true".to_string()),
			("isV2", "true".to_string()),
		];
		let response = self.get_json(&self.route_url, &query).await?;
		let parsed = parse_route(&response, self.default_finality, &self.default_hook_data)?;

		let fee_u64 = match parsed.fee {
			Some(fee) => fee,
			None => {
				// Exactly one fallback query before giving up
				tracing::debug!(
					source_domain,
					destination_domain,
					"route response carried no fee, querying fallback endpoint"
				);
				let query = [
					("localDomain", source_domain.to_string()),
					("destinationDomain", destination_domain.to_string()),
					("threshold", self.default_finality.to_string()),
				];
				let fallback = self.get_json(&self.fee_url, &query).await?;
				fallback_fee(&fallback).ok_or(QuoteError::FeeUnresolved)?
			}
		};

		Ok(RouteQuote {
			signature: parsed.signature,
			fee_u64,
			min_finality_threshold: parsed.min_finality_threshold,
			hook_data: parsed.hook_data,
			route_deadline: parsed.route_deadline,
		})
	}
}

/// Route response after tolerant extraction, before fee resolution.
#[derive(Debug)]
struct ParsedRoute {
	signature: Bytes,
	fee: Option<u64>,
	min_finality_threshold: u32,
	hook_data: Bytes,
	route_deadline: u64,
}

fn parse_route(
	response: &Value,
	default_finality: u32,
	default_hook_data: &Bytes,
) -> Result<ParsedRoute, QuoteError> {
	let signature = first_field(response, &["signature"])
		.and_then(Value::as_str)
		.ok_or_else(|| QuoteError::Unavailable("route signature not found".to_string()))?;
	let signature = parse_hex_bytes(signature)
		.ok_or_else(|| QuoteError::Unavailable("route signature is not valid hex".to_string()))?;

	let route_deadline = field_u64(response, DEADLINE_FIELDS)
		.ok_or_else(|| QuoteError::Unavailable("route deadline not found".to_string()))?;

	let fee = field_u64(response, ROUTE_FEE_FIELDS);
	let min_finality_threshold =
		field_u64(response, FINALITY_FIELDS).map_or(default_finality, |v| v as u32);
	// hookData may be covered by the route signature, so a present but
	// malformed value is an error rather than a silent substitution
	let hook_data = match first_field(response, &["hookData"]) {
		Some(value) => value
			.as_str()
			.and_then(parse_hex_bytes)
			.ok_or_else(|| QuoteError::Unavailable("route hookData is not valid hex".to_string()))?,
		None => default_hook_data.clone(),
	};

	Ok(ParsedRoute {
		signature,
		fee,
		min_finality_threshold,
		hook_data,
		route_deadline,
	})
}

fn fallback_fee(response: &Value) -> Option<u64> {
	field_u64(response, FALLBACK_FEE_FIELDS)
}

/// Resolves a possibly dotted path ("params.deadline") inside a JSON value.
fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
	let mut current = value;
	for segment in path.split('.') {
		current = current.get(segment)?;
	}
	Some(current)
}

/// Returns the first present, non-null candidate field.
fn first_field<'a>(value: &'a Value, names: &[&str]) -> Option<&'a Value> {
	names
		.iter()
		.filter_map(|name| lookup(value, name))
		.find(|v| !v.is_null())
}

/// Extracts an unsigned integer that may be encoded as a number or a
/// numeric string.
fn field_u64(value: &Value, names: &[&str]) -> Option<u64> {
	let v = first_field(value, names)?;
	match v {
		Value::Number(n) => n.as_u64(),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

fn parse_hex_bytes(s: &str) -> Option<Bytes> {
	let stripped = s.strip_prefix("0x").unwrap_or(s);
	hex::decode(stripped).ok().map(Bytes::from)
}
