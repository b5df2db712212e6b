//! Admission queue that serializes outbound requests against a fixed per-second ceiling.
//!
//! [`AdmissionQueue::submit`] enqueues a zero-argument async task and returns a future for its
//! outcome. A dedicated dispatch task drains the FIFO in submission order, waits for the
//! [`Pacer`]'s rate limiter before each dispatch, and sleeps for the fixed spacing afterwards.
//! Dispatched tasks run on their own Tokio tasks, so in-flight network waits overlap while
//! dispatch itself stays strictly sequential. A task's failure is delivered to its caller only;
//! the dispatcher keeps draining the queue.

mod pacer;

pub use pacer::{Pacer, TokioClock};

// std
use std::{
	num::NonZeroU32,
	sync::atomic::{AtomicU64, Ordering},
};
// crates.io
use tokio::{
	sync::{mpsc, oneshot},
	time,
};
// self
use crate::{_prelude::*, config::ScanConfig, error::ConfigError};

/// Boxed future returned by [`AdmissionQueue::submit`].
pub type AdmissionFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;

type Job = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

/// Handle to a rate-limited FIFO dispatcher.
///
/// Cloning the handle shares the same dispatcher and ceiling. The dispatcher stops once every
/// handle has been dropped and the remaining tasks have been dispatched.
#[derive(Clone)]
pub struct AdmissionQueue {
	sender: mpsc::UnboundedSender<Job>,
	counters: Arc<QueueCounters>,
	ceiling: u32,
}
impl AdmissionQueue {
	/// Spawns a dispatcher on the current Tokio runtime enforcing `requests_per_second`.
	pub fn new(requests_per_second: u32) -> Result<Self> {
		let ceiling = NonZeroU32::new(requests_per_second).ok_or(ConfigError::InvalidRequestRate)?;
		let runtime =
			tokio::runtime::Handle::try_current().map_err(|_| ConfigError::MissingRuntime)?;
		let (sender, receiver) = mpsc::unbounded_channel();
		let counters = Arc::<QueueCounters>::default();

		runtime.spawn(dispatch(receiver, Pacer::new(ceiling), counters.clone()));

		Ok(Self { sender, counters, ceiling: requests_per_second })
	}

	/// Spawns a dispatcher using [`ScanConfig::requests_per_second`].
	pub fn from_config(config: &ScanConfig) -> Result<Self> {
		Self::new(config.requests_per_second)
	}

	/// Enqueues `task` and returns a future resolving to its output.
	///
	/// The task is never polled on the caller's context; it starts only once the dispatcher
	/// admits it. The returned future fails with [`Error::QueueClosed`] if the dispatcher is gone
	/// or the task was dropped before completing.
	pub fn submit<F, Fut, T>(&self, task: F) -> AdmissionFuture<T>
	where
		F: 'static + Send + FnOnce() -> Fut,
		Fut: 'static + Send + Future<Output = T>,
		T: 'static + Send,
	{
		let (tx, rx) = oneshot::channel();
		let job: Job = Box::new(move || -> Pin<Box<dyn Future<Output = ()> + Send>> {
			Box::pin(async move {
				let _ = tx.send(task().await);
			})
		});

		// A closed channel drops the job and its sender, which the receiver reports below.
		let _ = self.sender.send(job);

		Box::pin(async move { rx.await.map_err(|_| Error::QueueClosed) })
	}

	/// Configured dispatch ceiling per second.
	pub fn ceiling(&self) -> u32 {
		self.ceiling
	}

	/// Returns a snapshot of the dispatcher counters.
	pub fn stats(&self) -> QueueStats {
		self.counters.snapshot()
	}
}
impl Debug for AdmissionQueue {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AdmissionQueue")
			.field("ceiling", &self.ceiling)
			.field("stats", &self.stats())
			.finish()
	}
}

/// Point-in-time view of the dispatcher counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueStats {
	/// Tasks taken off the FIFO by the dispatcher.
	pub received: u64,
	/// Tasks handed to the runtime.
	pub dispatched: u64,
	/// Times the rate limiter made the dispatcher wait.
	pub throttled: u64,
}

// Written only by the dispatch loop.
#[derive(Debug, Default)]
struct QueueCounters {
	received: AtomicU64,
	dispatched: AtomicU64,
	throttled: AtomicU64,
}
impl QueueCounters {
	fn snapshot(&self) -> QueueStats {
		QueueStats {
			received: self.received.load(Ordering::Relaxed),
			dispatched: self.dispatched.load(Ordering::Relaxed),
			throttled: self.throttled.load(Ordering::Relaxed),
		}
	}
}

async fn dispatch(
	mut receiver: mpsc::UnboundedReceiver<Job>,
	pacer: Pacer,
	counters: Arc<QueueCounters>,
) {
	while let Some(job) = receiver.recv().await {
		counters.received.fetch_add(1, Ordering::Relaxed);

		let waits = pacer.admit().await;

		counters.throttled.fetch_add(u64::from(waits), Ordering::Relaxed);
		tokio::spawn(job());
		counters.dispatched.fetch_add(1, Ordering::Relaxed);

		time::sleep(pacer.spacing()).await;
	}
}
