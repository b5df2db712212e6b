//! Scanner-level error types shared across the queue, fetcher, and aggregation engine.

// self
use crate::{_prelude::*, id::Mint};

/// Scanner-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical scanner error exposed by public APIs.
///
/// Every variant is fatal for the aggregation run that produced it. Rate-limited pages are
/// retried inside the fetcher and never surface here.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem, detected before any network activity.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Upstream answered with a response the fetcher cannot continue from.
	#[error(transparent)]
	Fetch(#[from] FetchError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The admission dispatcher stopped before delivering a task outcome.
	#[error("Admission queue closed before the task outcome was delivered.")]
	QueueClosed,
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Endpoint URL is not an absolute HTTP(S) URL.
	#[error("Endpoint must use http or https: {url}.")]
	InvalidEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Page size outside the range accepted by `getTokenAccounts`.
	#[error("Page size must be between 1 and {max}, got {page_size}.")]
	InvalidPageSize {
		/// Rejected page size.
		page_size: u32,
		/// Largest accepted page size.
		max: u32,
	},
	/// Request ceiling must allow at least one request per second.
	#[error("Request rate must be at least one request per second.")]
	InvalidRequestRate,
	/// The admission queue was built outside a Tokio runtime.
	#[error("Admission queue requires a running Tokio runtime.")]
	MissingRuntime,

	/// No token was requested.
	#[error("At least one token must be requested.")]
	NoTokens,
	/// The same mint was requested twice.
	#[error("Token `{mint}` was requested more than once.")]
	DuplicateToken {
		/// Repeated mint.
		mint: Mint,
	},
	/// Threshold is zero or larger than the number of requested tokens.
	#[error("Minimum token count {min_tokens} must be between 1 and the {token_count} requested tokens.")]
	ThresholdOutOfRange {
		/// Requested minimum token count.
		min_tokens: usize,
		/// Number of tokens in the request.
		token_count: usize,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Fatal page failures. The in-progress token fetch is discarded when one is raised.
#[derive(Debug, ThisError)]
pub enum FetchError {
	/// Upstream returned a non-success status other than 429.
	#[error("Page {page} of `{mint}` failed with HTTP {status}: {body_preview}.")]
	Status {
		/// Mint being fetched.
		mint: Mint,
		/// Page index that failed.
		page: u32,
		/// HTTP status code.
		status: u16,
		/// Truncated response body.
		body_preview: String,
	},
	/// The page request could not be serialized.
	#[error("Page {page} request for `{mint}` could not be encoded.")]
	EncodeRequest {
		/// Mint being fetched.
		mint: Mint,
		/// Page index that failed.
		page: u32,
		/// Serializer failure.
		#[source]
		source: serde_json::Error,
	},
	/// Upstream responded with JSON that does not match the `getTokenAccounts` shape.
	#[error("Page {page} of `{mint}` returned malformed JSON.")]
	MalformedPage {
		/// Mint being fetched.
		mint: Mint,
		/// Page index that failed.
		page: u32,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Upstream embedded a JSON-RPC error object in a successful response.
	#[error("Page {page} of `{mint}` returned JSON-RPC error {code}: {message}.")]
	Rpc {
		/// Mint being fetched.
		mint: Mint,
		/// Page index that failed.
		page: u32,
		/// JSON-RPC error code.
		code: i64,
		/// JSON-RPC error message.
		message: String,
	},
	/// The configured quota retry cap was reached on a single page.
	#[error("Page {page} of `{mint}` stayed rate limited after {attempts} attempts.")]
	QuotaExhausted {
		/// Mint being fetched.
		mint: Mint,
		/// Page index that kept hitting the quota.
		page: u32,
		/// Attempts made, including the first.
		attempts: u32,
	},
}
impl FetchError {
	const BODY_PREVIEW_LIMIT: usize = 256;

	pub(crate) fn status(mint: &Mint, page: u32, status: u16, body: &[u8]) -> Self {
		let text = String::from_utf8_lossy(body);
		let body_preview = if text.chars().count() <= Self::BODY_PREVIEW_LIMIT {
			text.into_owned()
		} else {
			let mut buf = text.chars().take(Self::BODY_PREVIEW_LIMIT).collect::<String>();

			buf.push('…');

			buf
		};

		Self::Status { mint: mint.clone(), page, status, body_preview }
	}

	/// Returns the mint whose fetch failed.
	pub fn mint(&self) -> &Mint {
		match self {
			Self::Status { mint, .. }
			| Self::EncodeRequest { mint, .. }
			| Self::MalformedPage { mint, .. }
			| Self::Rpc { mint, .. }
			| Self::QuotaExhausted { mint, .. } => mint,
		}
	}
}

/// Transport-level failures reported by an [`RpcHttpClient`](crate::http::RpcHttpClient).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the RPC endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
