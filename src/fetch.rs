//! Holder fetcher: paginates `getTokenAccounts` for one mint through the admission queue.
//!
//! [`HolderFetcher::fetch_holders`] requests pages 1, 2, 3, … in order and stops at the first
//! page whose account list is empty (or absent). A 429 response re-issues the same page after
//! the configured cooldown without touching the accumulated balances; by default there is no
//! cap on those retries, so a persistently exhausted quota stalls the fetch. Any other failure
//! discards the partial accumulation and is returned to the caller.

mod holders;
mod metrics;

pub use holders::{HolderBalance, HolderSet};
pub use metrics::FetchMetrics;

// crates.io
use tokio::time;
// self
use crate::{
	_prelude::*,
	config::ScanConfig,
	error::{FetchError, TransportError},
	fetch::holders::HolderAccumulator,
	http::RpcHttpClient,
	id::Mint,
	obs::{self, OpKind, OpOutcome, OpSpan, PageOutcome},
	queue::AdmissionQueue,
	rpc::{self, AccountRecord, GetTokenAccountsRequest},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Fetcher specialized for the crate's default reqwest transport.
pub type ReqwestHolderFetcher = HolderFetcher<ReqwestHttpClient>;

/// Retrieves complete holder sets, one mint at a time.
///
/// The fetcher owns its transport and shares an [`AdmissionQueue`] with whoever else the caller
/// hands the same queue to, so the request ceiling holds across fetchers.
pub struct HolderFetcher<C>
where
	C: ?Sized + RpcHttpClient,
{
	/// Transport used for every page request.
	pub http_client: Arc<C>,
	/// Queue every page request is routed through.
	pub queue: AdmissionQueue,
	/// Endpoint, page size, and retry settings.
	pub config: Arc<ScanConfig>,
	/// Shared counters for page outcomes.
	pub metrics: Arc<FetchMetrics>,
}
impl<C> HolderFetcher<C>
where
	C: ?Sized + RpcHttpClient,
{
	/// Creates a fetcher that reuses the caller-provided transport and queue.
	pub fn with_http_client(
		config: ScanConfig,
		queue: AdmissionQueue,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			queue,
			config: Arc::new(config),
			metrics: Default::default(),
		}
	}

	/// Fetches every holder of `mint`, valuing balances at `unit_price_usd` when supplied.
	pub async fn fetch_holders(&self, mint: &Mint, unit_price_usd: Option<f64>) -> Result<HolderSet> {
		const KIND: OpKind = OpKind::FetchHolders;

		let span = OpSpan::new(KIND, "fetch_holders");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.paginate(mint, unit_price_usd)).await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => {
				self.metrics.record_failure();
				obs::record_op_outcome(KIND, OpOutcome::Failure);
			},
		}

		result
	}

	async fn paginate(&self, mint: &Mint, unit_price_usd: Option<f64>) -> Result<HolderSet> {
		let url = self.config.request_url();
		let mut accumulator = HolderAccumulator::default();
		let mut page = 1;

		while let Some(records) = self.fetch_page(&url, mint, page).await? {
			accumulator.extend(&records);

			page += 1;
		}

		Ok(accumulator.finish(mint.clone(), unit_price_usd, page - 1))
	}

	/// Fetches one page, retrying it while upstream reports 429. `None` marks the end of data.
	async fn fetch_page(
		&self,
		url: &Url,
		mint: &Mint,
		page: u32,
	) -> Result<Option<Vec<AccountRecord>>> {
		let body = GetTokenAccountsRequest::new(mint, page, self.config.page_size)
			.to_body()
			.map_err(|source| {
				self.page_failed(mint, page);

				FetchError::EncodeRequest { mint: mint.clone(), page, source }
			})?;
		let mut attempts = 0_u32;

		loop {
			attempts += 1;
			self.metrics.record_request();

			let client = self.http_client.clone();
			let (url, body) = (url.clone(), body.clone());
			let response = self
				.queue
				.submit(move || client.post_json(url, body))
				.await?
				.map_err(|err| {
					self.page_failed(mint, page);

					TransportError::network(err)
				})?;

			if response.is_rate_limited() {
				obs::trace_page(mint, page, PageOutcome::RateLimited, 0);
				obs::record_page_outcome(PageOutcome::RateLimited);
				self.metrics.record_rate_limited();

				if self.config.max_quota_retries.is_some_and(|max| attempts > max) {
					self.page_failed(mint, page);

					return Err(FetchError::QuotaExhausted { mint: mint.clone(), page, attempts }.into());
				}

				time::sleep(self.config.quota_cooldown()).await;

				continue;
			}
			if !response.is_success() {
				self.page_failed(mint, page);

				return Err(FetchError::status(mint, page, response.status, &response.body).into());
			}

			let records = rpc::decode_page(mint, page, &response.body).inspect_err(|_| {
				self.page_failed(mint, page);
			})?;

			if records.is_empty() {
				obs::trace_page(mint, page, PageOutcome::Exhausted, 0);
				obs::record_page_outcome(PageOutcome::Exhausted);

				return Ok(None);
			}

			obs::trace_page(mint, page, PageOutcome::Records, records.len());
			obs::record_page_outcome(PageOutcome::Records);
			self.metrics.record_page(records.len());

			return Ok(Some(records));
		}
	}

	fn page_failed(&self, mint: &Mint, page: u32) {
		obs::trace_page(mint, page, PageOutcome::Failed, 0);
		obs::record_page_outcome(PageOutcome::Failed);
	}
}
#[cfg(feature = "reqwest")]
impl HolderFetcher<ReqwestHttpClient> {
	/// Creates a fetcher backed by a default reqwest client.
	pub fn new(config: ScanConfig, queue: AdmissionQueue) -> Self {
		Self::with_http_client(config, queue, ReqwestHttpClient::default())
	}
}
impl<C> Clone for HolderFetcher<C>
where
	C: ?Sized + RpcHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			queue: self.queue.clone(),
			config: self.config.clone(),
			metrics: self.metrics.clone(),
		}
	}
}
impl<C> Debug for HolderFetcher<C>
where
	C: ?Sized + RpcHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HolderFetcher")
			.field("endpoint", &self.config.endpoint.as_str())
			.field("page_size", &self.config.page_size)
			.field("queue", &self.queue)
			.finish()
	}
}
