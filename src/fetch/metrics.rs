// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for holder fetches.
#[derive(Debug, Default)]
pub struct FetchMetrics {
	requests: AtomicU64,
	pages: AtomicU64,
	records: AtomicU64,
	rate_limited: AtomicU64,
	failures: AtomicU64,
}
impl FetchMetrics {
	/// Returns the number of page requests issued, retries included.
	pub fn requests(&self) -> u64 {
		self.requests.load(Ordering::Relaxed)
	}

	/// Returns the number of non-empty pages accumulated.
	pub fn pages(&self) -> u64 {
		self.pages.load(Ordering::Relaxed)
	}

	/// Returns the number of account records accumulated.
	pub fn records(&self) -> u64 {
		self.records.load(Ordering::Relaxed)
	}

	/// Returns the number of rate-limited responses.
	pub fn rate_limited(&self) -> u64 {
		self.rate_limited.load(Ordering::Relaxed)
	}

	/// Returns the number of token fetches that failed.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_request(&self) {
		self.requests.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_page(&self, records: usize) {
		self.pages.fetch_add(1, Ordering::Relaxed);
		self.records.fetch_add(records as u64, Ordering::Relaxed);
	}

	pub(crate) fn record_rate_limited(&self) {
		self.rate_limited.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
