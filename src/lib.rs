//! Rate-limited token holder scanner: paginate `getTokenAccounts` under a hard request quota,
//! then aggregate per-mint holder maps into cross-token views (intersection or ranked threshold).

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod aggregate;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod id;
pub mod obs;
pub mod queue;
pub mod rpc;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// crates.io
	use parking_lot::Mutex;
	// self
	use crate::{
		http::{HttpFuture, HttpResponse, RpcHttpClient},
		rpc::GetTokenAccountsRequest,
	};

	/// Transport failure emitted by [`ScriptedHttpClient`] once its script runs dry.
	#[derive(Debug, ThisError)]
	#[error("Scripted transport has no response left for page {page}.")]
	pub struct ScriptExhausted {
		/// Page that was requested past the end of the script.
		pub page: u32,
	}

	/// In-process [`RpcHttpClient`] that replays a fixed list of responses and records every
	/// decoded request body.
	#[derive(Clone, Debug, Default)]
	pub struct ScriptedHttpClient {
		script: Arc<Mutex<VecDeque<HttpResponse>>>,
		requests: Arc<Mutex<Vec<GetTokenAccountsRequest>>>,
	}
	impl ScriptedHttpClient {
		/// Builds a client that answers requests with `responses`, in order.
		pub fn new(responses: impl IntoIterator<Item = HttpResponse>) -> Self {
			Self {
				script: Arc::new(Mutex::new(responses.into_iter().collect())),
				requests: Default::default(),
			}
		}

		/// Returns every request observed so far.
		pub fn requests(&self) -> Vec<GetTokenAccountsRequest> {
			self.requests.lock().clone()
		}

		/// Returns the page index of every request observed so far.
		pub fn pages(&self) -> Vec<u32> {
			self.requests.lock().iter().map(|request| request.params.page).collect()
		}
	}
	impl RpcHttpClient for ScriptedHttpClient {
		type TransportError = ScriptExhausted;

		fn post_json(&self, _url: Url, body: Vec<u8>) -> HttpFuture<'static, ScriptExhausted> {
			let script = self.script.clone();
			let requests = self.requests.clone();

			Box::pin(async move {
				let request: GetTokenAccountsRequest = serde_json::from_slice(&body)
					.expect("Scripted client should only receive getTokenAccounts bodies.");
				let page = request.params.page;

				requests.lock().push(request);

				script.lock().pop_front().ok_or(ScriptExhausted { page })
			})
		}
	}

	/// Builds a 200 response carrying the provided `(owner, amount)` account records.
	pub fn page_of(mint: &str, accounts: &[(&str, u64)]) -> HttpResponse {
		let token_accounts = accounts
			.iter()
			.enumerate()
			.map(|(idx, (owner, amount))| {
				serde_json::json!({
					"address": format!("{mint}-account-{idx}"),
					"mint": mint,
					"owner": owner,
					"amount": amount,
				})
			})
			.collect::<Vec<_>>();
		let body = serde_json::json!({
			"jsonrpc": "2.0",
			"id": "holder-overlap",
			"result": { "token_accounts": token_accounts },
		});

		HttpResponse::new(200, body.to_string())
	}

	/// Builds a 200 response whose account list is empty.
	pub fn empty_page() -> HttpResponse {
		HttpResponse::new(200, r#"{"jsonrpc":"2.0","id":"holder-overlap","result":{"token_accounts":[]}}"#)
	}

	/// Builds a bare status response (429, 500, ...).
	pub fn status(code: u16) -> HttpResponse {
		HttpResponse::new(code, "")
	}

	/// Configuration pointing at a dummy endpoint with the cooldowns zeroed out.
	pub fn fast_config() -> crate::config::ScanConfig {
		crate::config::ScanConfig::builder(
			Url::parse("http://rpc.invalid/").expect("Dummy endpoint should parse."),
		)
		.requests_per_second(1_000)
		.quota_cooldown(std::time::Duration::ZERO)
		.token_pause(std::time::Duration::ZERO)
		.build()
		.expect("Fast test configuration should be valid.")
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap, HashSet},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration,
	};

	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
