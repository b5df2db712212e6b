// self
use crate::obs::{OpKind, OpOutcome, PageOutcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_op_outcome(kind: OpKind, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"holder_overlap_op_total",
			"op" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records a page outcome via the global metrics recorder (when enabled).
pub fn record_page_outcome(outcome: PageOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("holder_overlap_page_total", "outcome" => outcome.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}
