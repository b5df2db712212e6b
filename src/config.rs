//! Scanner configuration: endpoint, page size, request ceiling, and the fixed pauses used by
//! the fetcher and aggregation engine.
//!
//! [`ScanConfig`] is deserializable so callers can embed it in their own config files; values
//! obtained that way should be checked with [`ScanConfig::validate`]. [`ScanConfigBuilder`]
//! validates on [`build`](ScanConfigBuilder::build).

// self
use crate::{_prelude::*, error::ConfigError};

/// Settings shared by the admission queue, holder fetcher, and aggregator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
	/// JSON-RPC endpoint serving `getTokenAccounts`.
	pub endpoint: Url,
	/// API key appended as the `api-key` query parameter.
	#[serde(default)]
	pub api_key: Option<String>,
	/// Records requested per page.
	#[serde(default = "ScanConfig::default_page_size")]
	pub page_size: u32,
	/// Outbound request ceiling enforced by the admission queue.
	#[serde(default = "ScanConfig::default_requests_per_second")]
	pub requests_per_second: u32,
	/// Pause before re-issuing a rate-limited page, in milliseconds.
	#[serde(default = "ScanConfig::default_quota_cooldown_ms")]
	pub quota_cooldown_ms: u64,
	/// Upper bound on retries of one rate-limited page; `None` retries forever.
	#[serde(default)]
	pub max_quota_retries: Option<u32>,
	/// Pause between consecutive token fetches, in milliseconds.
	#[serde(default = "ScanConfig::default_token_pause_ms")]
	pub token_pause_ms: u64,
}
impl ScanConfig {
	/// Largest page size accepted by `getTokenAccounts`.
	pub const MAX_PAGE_SIZE: u32 = 1_000;

	/// Creates a new builder for the provided endpoint.
	pub fn builder(endpoint: Url) -> ScanConfigBuilder {
		ScanConfigBuilder::new(endpoint)
	}

	/// Validates invariants for the configuration.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if !matches!(self.endpoint.scheme(), "http" | "https") {
			return Err(ConfigError::InvalidEndpoint { url: self.endpoint.to_string() });
		}
		if self.page_size == 0 || self.page_size > Self::MAX_PAGE_SIZE {
			return Err(ConfigError::InvalidPageSize {
				page_size: self.page_size,
				max: Self::MAX_PAGE_SIZE,
			});
		}
		if self.requests_per_second == 0 {
			return Err(ConfigError::InvalidRequestRate);
		}

		Ok(())
	}

	/// Endpoint with the API key (if any) attached.
	pub fn request_url(&self) -> Url {
		let mut url = self.endpoint.clone();

		if let Some(key) = self.api_key.as_deref() {
			url.query_pairs_mut().append_pair("api-key", key);
		}

		url
	}

	/// Cooldown applied before retrying a rate-limited page.
	pub fn quota_cooldown(&self) -> Duration {
		Duration::from_millis(self.quota_cooldown_ms)
	}

	/// Courtesy pause applied between tokens.
	pub fn token_pause(&self) -> Duration {
		Duration::from_millis(self.token_pause_ms)
	}

	fn default_page_size() -> u32 {
		Self::MAX_PAGE_SIZE
	}

	fn default_requests_per_second() -> u32 {
		8
	}

	fn default_quota_cooldown_ms() -> u64 {
		1_000
	}

	fn default_token_pause_ms() -> u64 {
		100
	}
}

/// Builder for [`ScanConfig`] values.
#[derive(Debug)]
pub struct ScanConfigBuilder {
	config: ScanConfig,
}
impl ScanConfigBuilder {
	/// Creates a builder seeded with the default limits.
	pub fn new(endpoint: Url) -> Self {
		Self {
			config: ScanConfig {
				endpoint,
				api_key: None,
				page_size: ScanConfig::default_page_size(),
				requests_per_second: ScanConfig::default_requests_per_second(),
				quota_cooldown_ms: ScanConfig::default_quota_cooldown_ms(),
				max_quota_retries: None,
				token_pause_ms: ScanConfig::default_token_pause_ms(),
			},
		}
	}

	/// Sets the API key.
	pub fn api_key(mut self, key: impl Into<String>) -> Self {
		self.config.api_key = Some(key.into());

		self
	}

	/// Overrides the page size (defaults to 1000).
	pub fn page_size(mut self, page_size: u32) -> Self {
		self.config.page_size = page_size;

		self
	}

	/// Overrides the request ceiling (defaults to 8 per second).
	pub fn requests_per_second(mut self, rate: u32) -> Self {
		self.config.requests_per_second = rate;

		self
	}

	/// Overrides the quota cooldown (defaults to one second).
	pub fn quota_cooldown(mut self, cooldown: Duration) -> Self {
		self.config.quota_cooldown_ms = duration_ms(cooldown);

		self
	}

	/// Caps retries per rate-limited page. Unbounded unless set; `0` fails on the first 429.
	pub fn max_quota_retries(mut self, retries: u32) -> Self {
		self.config.max_quota_retries = Some(retries);

		self
	}

	/// Overrides the inter-token pause (defaults to 100 ms).
	pub fn token_pause(mut self, pause: Duration) -> Self {
		self.config.token_pause_ms = duration_ms(pause);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ScanConfig, ConfigError> {
		self.config.validate()?;

		Ok(self.config)
	}
}

fn duration_ms(duration: Duration) -> u64 {
	u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
