// std
use std::{collections::HashMap, sync::Arc, time::Duration};
// crates.io
use parking_lot::Mutex;
use tokio::time::Instant;
use url::Url;
// self
use holder_overlap::{
	aggregate::{Aggregator, TokenQuery},
	config::ScanConfig,
	error::{Error, FetchError},
	fetch::HolderFetcher,
	http::{HttpFuture, HttpResponse, RpcHttpClient},
	id::Mint,
	queue::AdmissionQueue,
	rpc::GetTokenAccountsRequest,
};

#[derive(Debug, thiserror::Error)]
#[error("Fake upstream is unreachable.")]
struct Unreachable;

#[derive(Default)]
struct Ledger {
	// mint -> pages of (owner, amount)
	pages: HashMap<String, Vec<Vec<(String, u64)>>>,
	// (mint, page) -> remaining 429 answers
	throttled: HashMap<(String, u32), u32>,
	// (mint, page) -> fatal status
	broken: HashMap<(String, u32), u16>,
	calls: Vec<(String, u32, Instant)>,
}

/// In-process `getTokenAccounts` upstream.
#[derive(Clone, Default)]
struct FakeUpstream {
	ledger: Arc<Mutex<Ledger>>,
}
impl FakeUpstream {
	fn with_pages(self, mint: &str, pages: &[&[(&str, u64)]]) -> Self {
		self.ledger.lock().pages.insert(
			mint.into(),
			pages
				.iter()
				.map(|page| page.iter().map(|(owner, amount)| ((*owner).into(), *amount)).collect())
				.collect(),
		);

		self
	}

	fn throttle(self, mint: &str, page: u32, times: u32) -> Self {
		self.ledger.lock().throttled.insert((mint.into(), page), times);

		self
	}

	fn break_page(self, mint: &str, page: u32, status: u16) -> Self {
		self.ledger.lock().broken.insert((mint.into(), page), status);

		self
	}

	fn calls(&self) -> Vec<(String, u32)> {
		self.ledger.lock().calls.iter().map(|(mint, page, _)| (mint.clone(), *page)).collect()
	}

	fn call_times(&self) -> Vec<Instant> {
		self.ledger.lock().calls.iter().map(|(_, _, at)| *at).collect()
	}

	fn answer(&self, request: GetTokenAccountsRequest) -> HttpResponse {
		let mut ledger = self.ledger.lock();
		let mint = request.params.mint.as_ref().to_owned();
		let page = request.params.page;

		ledger.calls.push((mint.clone(), page, Instant::now()));

		if let Some(remaining) = ledger.throttled.get_mut(&(mint.clone(), page))
			&& *remaining > 0
		{
			*remaining -= 1;

			return HttpResponse::new(429, "Too Many Requests");
		}
		if let Some(status) = ledger.broken.get(&(mint.clone(), page)) {
			return HttpResponse::new(*status, "Internal Server Error");
		}

		let accounts = ledger
			.pages
			.get(&mint)
			.and_then(|pages| pages.get(page as usize - 1))
			.cloned()
			.unwrap_or_default()
			.into_iter()
			.enumerate()
			.map(|(idx, (owner, amount))| {
				serde_json::json!({
					"address": format!("{mint}-{page}-{idx}"),
					"mint": mint,
					"owner": owner,
					"amount": amount.to_string(),
				})
			})
			.collect::<Vec<_>>();
		let body = serde_json::json!({
			"jsonrpc": "2.0",
			"id": "fake",
			"result": { "total": accounts.len(), "token_accounts": accounts },
		});

		HttpResponse::new(200, body.to_string())
	}
}
impl RpcHttpClient for FakeUpstream {
	type TransportError = Unreachable;

	fn post_json(&self, _url: Url, body: Vec<u8>) -> HttpFuture<'static, Unreachable> {
		let upstream = self.clone();

		Box::pin(async move {
			let request = serde_json::from_slice(&body).map_err(|_| Unreachable)?;

			Ok(upstream.answer(request))
		})
	}
}

fn config(rps: u32) -> ScanConfig {
	ScanConfig::builder(Url::parse("http://rpc.invalid/").expect("Endpoint fixture should parse."))
		.requests_per_second(rps)
		.quota_cooldown(Duration::from_millis(1_000))
		.token_pause(Duration::from_millis(100))
		.build()
		.expect("Scan config fixture should be valid.")
}

fn aggregator(upstream: &FakeUpstream, config: ScanConfig) -> Aggregator<FakeUpstream> {
	let queue = AdmissionQueue::from_config(&config).expect("Queue should start inside a runtime.");

	Aggregator::new(HolderFetcher::with_http_client(config, queue, upstream.clone()))
}

fn mint(value: &str) -> Mint {
	Mint::new(value).expect("Mint fixture should be valid.")
}

fn query(value: &str, price: f64) -> TokenQuery {
	TokenQuery::new(mint(value)).with_unit_price(price)
}

#[tokio::test(start_paused = true)]
async fn rate_limited_page_is_retried_without_advancing() {
	let upstream = FakeUpstream::default()
		.with_pages("MintA", &[&[("x", 10)], &[("x", 5), ("y", 3)]])
		.throttle("MintA", 2, 2);
	let set = aggregator(&upstream, config(8))
		.fetcher
		.fetch_holders(&mint("MintA"), None)
		.await
		.expect("Throttled pages should eventually succeed.");

	assert_eq!(
		upstream.calls().into_iter().map(|(_, page)| page).collect::<Vec<_>>(),
		[1, 2, 2, 2, 3],
	);
	assert_eq!(set.get("x").map(|holder| holder.balance), Some(15));
	assert_eq!(set.get("y").map(|holder| holder.balance), Some(3));
	assert_eq!(set.pages, 2);

	let times = upstream.call_times();

	assert!(times[2] - times[1] >= Duration::from_secs(1), "Cooldown was not applied.");
	assert!(times[3] - times[2] >= Duration::from_secs(1), "Cooldown was not applied.");
}

#[tokio::test(start_paused = true)]
async fn pagination_stops_at_the_first_empty_page() {
	let upstream = FakeUpstream::default().with_pages("MintA", &[&[("x", 1)], &[], &[("tardy", 9)]]);
	let set = aggregator(&upstream, config(8))
		.fetcher
		.fetch_holders(&mint("MintA"), None)
		.await
		.expect("Fetch should succeed.");

	assert_eq!(upstream.calls().len(), 2);
	assert!(!set.contains("tardy"));
}

#[tokio::test(start_paused = true)]
async fn server_errors_abort_the_whole_run() {
	let upstream = FakeUpstream::default()
		.with_pages("MintA", &[&[("x", 1)]])
		.with_pages("MintB", &[&[("x", 1)], &[("y", 1)]])
		.break_page("MintB", 2, 500);
	let err = aggregator(&upstream, config(8))
		.intersection(&[query("MintA", 1.0), query("MintB", 1.0)])
		.await
		.expect_err("A 500 should fail the aggregation.");

	match &err {
		Error::Fetch(FetchError::Status { mint, page, status, .. }) => {
			assert_eq!(mint.as_ref(), "MintB");
			assert_eq!(*page, 2);
			assert_eq!(*status, 500);
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	assert!(err.to_string().contains("500"));
	assert_eq!(upstream.calls().last().map(|(_, page)| *page), Some(2));
}

#[tokio::test(start_paused = true)]
async fn overlapping_holders_scenario() {
	let upstream = FakeUpstream::default()
		.with_pages("MintA", &[&[("x", 100), ("y", 50)]])
		.with_pages("MintB", &[&[("x", 30), ("z", 10)]]);
	let aggregator = aggregator(&upstream, config(8));
	let tokens = [query("MintA", 1.0), query("MintB", 2.0)];
	let intersection =
		aggregator.intersection(&tokens).await.expect("Intersection should succeed.");

	assert_eq!(intersection.addresses().map(|address| address.as_ref()).collect::<Vec<_>>(), ["x"]);

	let threshold = aggregator.threshold(&tokens, 1).await.expect("Threshold should succeed.");
	let ranked = threshold
		.holders
		.iter()
		.map(|holder| (holder.address.as_ref(), holder.token_count, holder.total_value_usd))
		.collect::<Vec<_>>();

	assert_eq!(ranked, [("x", 2, 160.0), ("y", 1, 50.0), ("z", 1, 20.0)]);

	let strict = aggregator.threshold(&tokens, 2).await.expect("Threshold should succeed.");

	assert_eq!(strict.addresses().map(|address| address.as_ref()).collect::<Vec<_>>(), ["x"]);
}

#[tokio::test(start_paused = true)]
async fn outbound_rate_holds_across_tokens() {
	let upstream = FakeUpstream::default()
		.with_pages("MintA", &[&[("a", 1)], &[("b", 1)], &[("c", 1)], &[("d", 1)]])
		.with_pages("MintB", &[&[("a", 1)], &[("e", 1)], &[("f", 1)]]);
	let sets = aggregator(&upstream, config(2))
		.fetch_all(&[query("MintA", 1.0), query("MintB", 1.0)])
		.await
		.expect("Fetch should succeed.");

	assert_eq!(sets.len(), 2);

	let times = upstream.call_times();

	assert_eq!(times.len(), 9);

	for pair in times.windows(3) {
		assert!(pair[2] - pair[0] >= Duration::from_secs(1), "Request ceiling was exceeded.");
	}
}
