//! Optional observability helpers for scanner operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `holder_overlap.op` with the `op` and
//!   `stage` fields, plus one event per fetched page.
//! - Enable `metrics` to increment the `holder_overlap_op_total` counter (labeled by `op` +
//!   `outcome`) and the `holder_overlap_page_total` counter (labeled by `outcome`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Scanner operations observed by the obs layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Paginated holder fetch for one mint.
	FetchHolders,
	/// Intersection policy run.
	Intersection,
	/// Threshold-with-ranking policy run.
	Threshold,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::FetchHolders => "fetch_holders",
			OpKind::Intersection => "intersection",
			OpKind::Threshold => "threshold",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Classification of one page response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PageOutcome {
	/// Page carried account records.
	Records,
	/// Page was empty; pagination ends.
	Exhausted,
	/// Upstream throttled the request; the same page is retried.
	RateLimited,
	/// Fatal failure; the token fetch is abandoned.
	Failed,
}
impl PageOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			PageOutcome::Records => "records",
			PageOutcome::Exhausted => "exhausted",
			PageOutcome::RateLimited => "rate_limited",
			PageOutcome::Failed => "failed",
		}
	}
}
impl Display for PageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
