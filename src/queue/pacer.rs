// std
use std::{num::NonZeroU32, time::Instant as StdInstant};
// crates.io
use governor::{
	Quota, RateLimiter,
	clock::Clock,
	middleware::NoOpMiddleware,
	state::{InMemoryState, NotKeyed},
};
use tokio::time::{self, Instant};
// self
use crate::_prelude::*;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, TokioClock, NoOpMiddleware<StdInstant>>;

/// [`Clock`] backed by Tokio's clock, so a paused runtime also pauses the limiter.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioClock;
impl Clock for TokioClock {
	type Instant = StdInstant;

	fn now(&self) -> StdInstant {
		Instant::now().into_std()
	}
}

/// Admission pacing owned by the dispatch loop.
///
/// A GCRA limiter with `Quota::per_second(ceiling)` gates every dispatch, and the loop sleeps
/// [`Pacer::spacing`] after each one. The spacing is rounded up to the nanosecond, so any
/// `ceiling + 1` consecutive dispatches span at least one second.
pub struct Pacer {
	limiter: DirectLimiter,
	clock: TokioClock,
	ceiling: NonZeroU32,
	spacing: Duration,
}
impl Pacer {
	/// Creates a pacer admitting `ceiling` dispatches per second.
	pub fn new(ceiling: NonZeroU32) -> Self {
		let clock = TokioClock;

		Self {
			limiter: RateLimiter::direct_with_clock(Quota::per_second(ceiling), clock),
			clock,
			ceiling,
			spacing: Duration::from_nanos(1_000_000_000_u64.div_ceil(u64::from(ceiling.get()))),
		}
	}

	/// Dispatch ceiling per second.
	pub fn ceiling(&self) -> NonZeroU32 {
		self.ceiling
	}

	/// Pause applied after each dispatch.
	pub fn spacing(&self) -> Duration {
		self.spacing
	}

	/// Waits until the limiter admits one dispatch and returns how many times it had to wait.
	pub async fn admit(&self) -> u32 {
		let mut waits = 0;

		while let Err(not_until) = self.limiter.check() {
			waits += 1;

			time::sleep(not_until.wait_time_from(self.clock.now())).await;
		}

		waits
	}
}
impl Debug for Pacer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Pacer")
			.field("ceiling", &self.ceiling)
			.field("spacing", &self.spacing)
			.finish()
	}
}
