//! Scans a live `getTokenAccounts` endpoint and prints the holders shared across several mints.
//!
//! Configure it through the environment:
//!
//! - `HOLDER_OVERLAP_RPC_URL`: JSON-RPC endpoint (required).
//! - `HOLDER_OVERLAP_API_KEY`: appended as the `api-key` query parameter (optional).
//! - `HOLDER_OVERLAP_MINTS`: comma separated `mint` or `mint=unit_price_usd` entries (required).
//! - `HOLDER_OVERLAP_MIN_TOKENS`: threshold; the intersection is printed when unset.

// std
use std::env;
// crates.io
use color_eyre::{Result, eyre::eyre};
use url::Url;
// self
use holder_overlap::{
	aggregate::{Aggregator, TokenQuery},
	config::ScanConfig,
	fetch::ReqwestHolderFetcher,
	id::Mint,
	queue::AdmissionQueue,
};

fn parse_tokens(raw: &str) -> Result<Vec<TokenQuery>> {
	raw.split(',')
		.map(str::trim)
		.filter(|entry| !entry.is_empty())
		.map(|entry| -> Result<TokenQuery> {
			let query = match entry.split_once('=') {
				Some((mint, price)) => TokenQuery::new(Mint::new(mint.trim())?)
					.with_unit_price(price.trim().parse()?),
				None => TokenQuery::new(Mint::new(entry)?),
			};

			Ok(query)
		})
		.collect()
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let endpoint = env::var("HOLDER_OVERLAP_RPC_URL")
		.map_err(|_| eyre!("HOLDER_OVERLAP_RPC_URL must be set."))?;
	let tokens = parse_tokens(
		&env::var("HOLDER_OVERLAP_MINTS").map_err(|_| eyre!("HOLDER_OVERLAP_MINTS must be set."))?,
	)?;
	let mut builder = ScanConfig::builder(Url::parse(&endpoint)?);

	if let Ok(key) = env::var("HOLDER_OVERLAP_API_KEY") {
		builder = builder.api_key(key);
	}

	let config = builder.build()?;
	let queue = AdmissionQueue::from_config(&config)?;
	let aggregator = Aggregator::new(ReqwestHolderFetcher::new(config, queue.clone()));

	match env::var("HOLDER_OVERLAP_MIN_TOKENS") {
		Ok(min) => {
			let report = aggregator.threshold(&tokens, min.parse()?).await?;

			println!("{}", serde_json::to_string_pretty(&report)?);
		},
		Err(_) => {
			let report = aggregator.intersection(&tokens).await?;

			println!("{}", serde_json::to_string_pretty(&report)?);
		},
	}

	let metrics = &aggregator.fetcher.metrics;

	eprintln!(
		"Issued {} requests ({} rate limited) across {} pages; queue stats: {:?}.",
		metrics.requests(),
		metrics.rate_limited(),
		metrics.pages(),
		queue.stats(),
	);

	Ok(())
}
