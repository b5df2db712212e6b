//! Wire model for the `getTokenAccounts` JSON-RPC method.

// self
use crate::{
	_prelude::*,
	error::FetchError,
	id::{Address, Mint},
};

/// JSON-RPC method paginated by the fetcher.
pub const METHOD: &str = "getTokenAccounts";

const JSONRPC_VERSION: &str = "2.0";
const REQUEST_ID: &str = "holder-overlap";

/// Request body for one page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GetTokenAccountsRequest {
	/// Protocol version, always `2.0`.
	pub jsonrpc: String,
	/// Correlation identifier.
	pub id: String,
	/// Method name, always [`METHOD`].
	pub method: String,
	/// Page selector.
	pub params: GetTokenAccountsParams,
}
impl GetTokenAccountsRequest {
	/// Builds the request for `page` of `mint`.
	pub fn new(mint: &Mint, page: u32, limit: u32) -> Self {
		Self {
			jsonrpc: JSONRPC_VERSION.into(),
			id: REQUEST_ID.into(),
			method: METHOD.into(),
			params: GetTokenAccountsParams { page, limit, mint: mint.clone() },
		}
	}

	/// Serializes the request into a JSON body.
	pub fn to_body(&self) -> serde_json::Result<Vec<u8>> {
		serde_json::to_vec(self)
	}
}

/// `params` object of [`GetTokenAccountsRequest`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTokenAccountsParams {
	/// One-based page index.
	pub page: u32,
	/// Records per page.
	pub limit: u32,
	/// Mint whose accounts are listed.
	pub mint: Mint,
}

/// Response envelope.
#[derive(Clone, Debug, Deserialize)]
pub struct GetTokenAccountsResponse {
	/// Page payload; absent once the listing is exhausted on some providers.
	#[serde(default)]
	pub result: Option<TokenAccountsPage>,
	/// JSON-RPC error object.
	#[serde(default)]
	pub error: Option<RpcErrorObject>,
}

/// `result` object of [`GetTokenAccountsResponse`].
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TokenAccountsPage {
	/// Token accounts on this page.
	#[serde(default)]
	pub token_accounts: Vec<AccountRecord>,
}

/// One on-chain token account.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AccountRecord {
	/// Token account address.
	pub address: String,
	/// Mint of the account.
	pub mint: String,
	/// Wallet owning the account.
	pub owner: Address,
	/// Raw (undecimalized) balance.
	#[serde(deserialize_with = "amount::deserialize")]
	pub amount: u64,
}

/// JSON-RPC error object.
#[derive(Clone, Debug, Deserialize)]
pub struct RpcErrorObject {
	/// Error code.
	pub code: i64,
	/// Human-readable message.
	#[serde(default)]
	pub message: String,
}

/// Decodes a 2xx body for `page` of `mint` into its account records.
///
/// An absent `result` and an empty account list both decode to an empty vector.
pub fn decode_page(mint: &Mint, page: u32, body: &[u8]) -> Result<Vec<AccountRecord>, FetchError> {
	let de = &mut serde_json::Deserializer::from_slice(body);
	let response: GetTokenAccountsResponse = serde_path_to_error::deserialize(de)
		.map_err(|source| FetchError::MalformedPage { mint: mint.clone(), page, source })?;

	if let Some(err) = response.error {
		return Err(FetchError::Rpc { mint: mint.clone(), page, code: err.code, message: err.message });
	}

	Ok(response.result.map(|result| result.token_accounts).unwrap_or_default())
}

mod amount {
	// crates.io
	use serde::{Deserializer, de::Error as _};
	// self
	use crate::_prelude::*;

	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Amount {
		Number(u64),
		Text(String),
	}

	pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
	where
		D: Deserializer<'de>,
	{
		match Amount::deserialize(deserializer)? {
			Amount::Number(value) => Ok(value),
			Amount::Text(text) => text.trim().parse().map_err(D::Error::custom),
		}
	}
}
