//! Aggregation engine: fetch several tokens in order and select holders across them.
//!
//! Tokens are fetched strictly one after another, with a short courtesy pause between them.
//! Any fatal fetch error fails the whole run; a summary built from a subset of the requested
//! tokens is never returned. Request validation (empty list, duplicates, threshold range)
//! happens before the first page is requested.

mod summary;

pub use summary::*;

// crates.io
use tokio::time;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	fetch::{HolderFetcher, HolderSet},
	http::RpcHttpClient,
	id::Mint,
	obs::{self, OpKind, OpOutcome, OpSpan},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Aggregator specialized for the crate's default reqwest transport.
pub type ReqwestAggregator = Aggregator<ReqwestHttpClient>;

/// One token to fetch, optionally priced for value ranking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenQuery {
	/// Token mint.
	pub mint: Mint,
	/// USD price of one raw unit.
	#[serde(default)]
	pub unit_price_usd: Option<f64>,
}
impl TokenQuery {
	/// Creates an unpriced query.
	pub fn new(mint: Mint) -> Self {
		Self { mint, unit_price_usd: None }
	}

	/// Attaches a unit price.
	pub fn with_unit_price(mut self, price: f64) -> Self {
		self.unit_price_usd = Some(price);

		self
	}
}
impl From<Mint> for TokenQuery {
	fn from(mint: Mint) -> Self {
		Self::new(mint)
	}
}

/// Drives a [`HolderFetcher`] over a token list and applies a selection policy.
pub struct Aggregator<C>
where
	C: ?Sized + RpcHttpClient,
{
	/// Fetcher used for every token.
	pub fetcher: HolderFetcher<C>,
}
impl<C> Aggregator<C>
where
	C: ?Sized + RpcHttpClient,
{
	/// Wraps an existing fetcher.
	pub fn new(fetcher: HolderFetcher<C>) -> Self {
		Self { fetcher }
	}

	/// Fetches every requested token in order, failing on the first fatal error.
	pub async fn fetch_all(&self, tokens: &[TokenQuery]) -> Result<Vec<HolderSet>> {
		validate_tokens(tokens)?;

		self.fetch_validated(tokens).await
	}

	/// Returns the addresses holding every requested token.
	pub async fn intersection(&self, tokens: &[TokenQuery]) -> Result<IntersectionReport> {
		const KIND: OpKind = OpKind::Intersection;

		let span = OpSpan::new(KIND, "intersection");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				validate_tokens(tokens)?;

				let sets = self.fetch_validated(tokens).await?;

				Ok(intersect(&sets))
			})
			.await;

		record_result(KIND, &result);

		result
	}

	/// Returns the addresses holding at least `min_tokens` of the requested tokens, ranked by
	/// descending total USD value.
	pub async fn threshold(
		&self,
		tokens: &[TokenQuery],
		min_tokens: usize,
	) -> Result<ThresholdReport> {
		const KIND: OpKind = OpKind::Threshold;

		let span = OpSpan::new(KIND, "threshold");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				validate_tokens(tokens)?;
				validate_threshold(min_tokens, tokens.len())?;

				let mut summary = CrossTokenSummary::default();

				for set in self.fetch_validated(tokens).await? {
					summary.merge(&set);
				}

				Ok(summary.qualify(min_tokens))
			})
			.await;

		record_result(KIND, &result);

		result
	}

	async fn fetch_validated(&self, tokens: &[TokenQuery]) -> Result<Vec<HolderSet>> {
		let pause = self.fetcher.config.token_pause();
		let mut sets = Vec::with_capacity(tokens.len());

		for (idx, token) in tokens.iter().enumerate() {
			if idx > 0 && !pause.is_zero() {
				time::sleep(pause).await;
			}

			sets.push(self.fetcher.fetch_holders(&token.mint, token.unit_price_usd).await?);
		}

		Ok(sets)
	}
}
impl<C> Clone for Aggregator<C>
where
	C: ?Sized + RpcHttpClient,
{
	fn clone(&self) -> Self {
		Self { fetcher: self.fetcher.clone() }
	}
}
impl<C> Debug for Aggregator<C>
where
	C: ?Sized + RpcHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Aggregator").field("fetcher", &self.fetcher).finish()
	}
}

fn validate_tokens(tokens: &[TokenQuery]) -> Result<(), ConfigError> {
	if tokens.is_empty() {
		return Err(ConfigError::NoTokens);
	}

	let mut seen = HashSet::with_capacity(tokens.len());

	for token in tokens {
		if !seen.insert(&token.mint) {
			return Err(ConfigError::DuplicateToken { mint: token.mint.clone() });
		}
	}

	Ok(())
}

fn validate_threshold(min_tokens: usize, token_count: usize) -> Result<(), ConfigError> {
	if min_tokens == 0 || min_tokens > token_count {
		Err(ConfigError::ThresholdOutOfRange { min_tokens, token_count })
	} else {
		Ok(())
	}
}

fn record_result<T>(kind: OpKind, result: &Result<T>) {
	match result {
		Ok(_) => obs::record_op_outcome(kind, OpOutcome::Success),
		Err(_) => obs::record_op_outcome(kind, OpOutcome::Failure),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, config::ScanConfig, error::FetchError, queue::AdmissionQueue};

	fn query(mint: &str, price: f64) -> TokenQuery {
		TokenQuery::new(Mint::new(mint).expect("Mint fixture should be valid.")).with_unit_price(price)
	}

	fn aggregator(client: ScriptedHttpClient, config: ScanConfig) -> Aggregator<ScriptedHttpClient> {
		let queue = AdmissionQueue::from_config(&config).expect("Queue should start inside a runtime.");

		Aggregator::new(HolderFetcher::with_http_client(config, queue, client))
	}

	#[tokio::test]
	async fn threshold_above_token_count_fails_before_fetching() {
		let client = ScriptedHttpClient::default();
		let tokens = [query("MintA", 1.0), query("MintB", 1.0), query("MintC", 1.0)];
		let err = aggregator(client.clone(), fast_config())
			.threshold(&tokens, 5)
			.await
			.expect_err("Threshold above the token count should be rejected.");

		assert!(matches!(
			err,
			Error::Config(ConfigError::ThresholdOutOfRange { min_tokens: 5, token_count: 3 })
		));
		assert!(client.requests().is_empty());
	}

	#[tokio::test]
	async fn duplicate_and_empty_requests_are_rejected() {
		let client = ScriptedHttpClient::default();
		let aggregator = aggregator(client.clone(), fast_config());
		let err = aggregator
			.intersection(&[query("MintA", 1.0), query("MintA", 2.0)])
			.await
			.expect_err("Duplicate mints should be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::DuplicateToken { .. })));

		let err = aggregator.fetch_all(&[]).await.expect_err("Empty requests should be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::NoTokens)));

		let err = aggregator
			.threshold(&[query("MintA", 1.0)], 0)
			.await
			.expect_err("A zero threshold should be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::ThresholdOutOfRange { .. })));
		assert!(client.requests().is_empty());
	}

	#[tokio::test]
	async fn fatal_error_on_later_token_fails_the_run() {
		let client = ScriptedHttpClient::new([
			page_of("MintA", &[("x", 100)]),
			empty_page(),
			status(500),
		]);
		let err = aggregator(client.clone(), fast_config())
			.threshold(&[query("MintA", 1.0), query("MintB", 1.0)], 1)
			.await
			.expect_err("A fatal fetch on the second token should fail the run.");

		match err {
			Error::Fetch(FetchError::Status { mint, page, status, .. }) => {
				assert_eq!(mint.as_ref(), "MintB");
				assert_eq!(page, 1);
				assert_eq!(status, 500);
			},
			other => panic!("Unexpected error: {other:?}."),
		}

		assert_eq!(client.pages(), [1, 2, 1]);
	}

	#[tokio::test(start_paused = true)]
	async fn tokens_are_separated_by_the_courtesy_pause() {
		let client = ScriptedHttpClient::new([empty_page(), empty_page(), empty_page()]);
		let config = ScanConfig::builder(Url::parse("http://rpc.invalid/").expect("URL should parse."))
			.requests_per_second(1_000)
			.token_pause(Duration::from_millis(100))
			.build()
			.expect("Config should be valid.");
		let start = tokio::time::Instant::now();
		let sets = aggregator(client, config)
			.fetch_all(&[query("MintA", 1.0), query("MintB", 1.0), query("MintC", 1.0)])
			.await
			.expect("Empty tokens should fetch successfully.");

		assert_eq!(sets.len(), 3);
		assert!(start.elapsed() >= Duration::from_millis(200));
	}
}
