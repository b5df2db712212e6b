//! Transport primitives for `getTokenAccounts` calls.
//!
//! [`RpcHttpClient`] is the scanner's only dependency on an HTTP stack. The fetcher hands each
//! request future to the admission queue, which runs it on its own task, so implementations
//! must return `'static + Send` futures that own whatever state they need.

// self
use crate::_prelude::*;

/// Boxed future returned by [`RpcHttpClient::post_json`].
pub type HttpFuture<'a, E> = Pin<Box<dyn Future<Output = Result<HttpResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of POSTing a JSON-RPC body.
pub trait RpcHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// POSTs `body` (already serialized JSON) to `url` and returns the raw response.
	///
	/// Non-2xx statuses are not errors at this layer; they are returned in
	/// [`HttpResponse::status`] so the fetcher can tell quota throttling apart from fatal
	/// failures.
	fn post_json(&self, url: Url, body: Vec<u8>) -> HttpFuture<'static, Self::TransportError>;
}

/// Status and body of one HTTP exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Status used by upstream quota enforcement.
	pub const TOO_MANY_REQUESTS: u16 = 429;

	/// Creates a response from its parts.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, body: body.into() }
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns `true` when upstream throttled the request.
	pub fn is_rate_limited(&self) -> bool {
		self.status == Self::TOO_MANY_REQUESTS
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client with the given per-request timeout.
	pub fn with_timeout(timeout: Duration) -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder().timeout(timeout).build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl RpcHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn post_json(&self, url: Url, body: Vec<u8>) -> HttpFuture<'static, ReqwestError> {
		let client = self.0.clone();

		Box::pin(async move {
			let response = client
				.post(url)
				.header(reqwest::header::CONTENT_TYPE, "application/json")
				.body(body)
				.send()
				.await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok(HttpResponse { status, body })
		})
	}
}
