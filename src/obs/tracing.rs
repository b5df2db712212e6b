// self
use crate::{
	_prelude::*,
	id::Mint,
	obs::{OpKind, PageOutcome},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by scanner operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("holder_overlap.op", op = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits one event describing a page response.
pub fn trace_page(mint: &Mint, page: u32, outcome: PageOutcome, records: usize) {
	#[cfg(feature = "tracing")]
	{
		let mint = mint.as_ref();

		match outcome {
			PageOutcome::RateLimited =>
				tracing::warn!(mint, page, outcome = outcome.as_str(), "page rate limited, retrying"),
			PageOutcome::Failed => tracing::error!(mint, page, outcome = outcome.as_str(), "page failed"),
			PageOutcome::Records | PageOutcome::Exhausted =>
				tracing::debug!(mint, page, outcome = outcome.as_str(), records, "page fetched"),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (mint, page, outcome, records);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = OpSpan::new(OpKind::FetchHolders, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[test]
	fn trace_page_noop_without_subscriber() {
		let mint = Mint::new("MintA").expect("Mint fixture should be valid.");

		trace_page(&mint, 1, PageOutcome::RateLimited, 0);
	}
}
