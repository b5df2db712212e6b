// std
use std::{sync::Arc, time::Duration};
// crates.io
use parking_lot::Mutex;
use tokio::time::{self, Instant};
// self
use holder_overlap::{error::Error, queue::AdmissionQueue};

#[tokio::test(start_paused = true)]
async fn dispatches_never_exceed_the_ceiling_within_one_second() {
	const CEILING: usize = 4;

	let queue = AdmissionQueue::new(CEILING as u32).expect("Queue should start inside a runtime.");
	let stamps = Arc::new(Mutex::new(Vec::new()));
	let outcomes = (0..13)
		.map(|_| {
			let stamps = stamps.clone();

			queue.submit(move || async move { stamps.lock().push(Instant::now()) })
		})
		.collect::<Vec<_>>();

	for outcome in outcomes {
		outcome.await.expect("Task outcome should be delivered.");
	}

	let stamps = stamps.lock().clone();

	assert_eq!(stamps.len(), 13);

	for pair in stamps.windows(CEILING + 1) {
		assert!(
			pair[CEILING] - pair[0] >= Duration::from_secs(1),
			"More than {CEILING} dispatches landed inside one second.",
		);
	}
	for pair in stamps.windows(2) {
		assert!(pair[1] - pair[0] >= Duration::from_millis(250), "Dispatch spacing was not honored.");
	}
}

#[tokio::test(start_paused = true)]
async fn tasks_start_in_submission_order() {
	let queue = AdmissionQueue::new(50).expect("Queue should start inside a runtime.");
	let started = Arc::new(Mutex::new(Vec::new()));
	let outcomes = (0..20)
		.map(|idx| {
			let started = started.clone();

			queue.submit(move || async move {
				started.lock().push(idx);

				// Later tasks finish first; start order must still follow submission.
				time::sleep(Duration::from_millis(200 - idx * 10)).await;

				idx
			})
		})
		.collect::<Vec<_>>();

	for (expected, outcome) in outcomes.into_iter().enumerate() {
		assert_eq!(outcome.await.expect("Task outcome should be delivered."), expected as u64);
	}

	assert_eq!(*started.lock(), (0..20).collect::<Vec<u64>>());
}

#[tokio::test(start_paused = true)]
async fn failed_tasks_do_not_stall_the_queue() {
	let queue = AdmissionQueue::new(10).expect("Queue should start inside a runtime.");
	let failing = queue.submit(|| async { Err::<u32, &str>("upstream exploded") });
	let panicking = queue.submit(|| async {
		if true {
			panic!("Task panicked on purpose.");
		}

		0_u32
	});
	let healthy = queue.submit(|| async { Ok::<u32, &str>(7) });

	assert_eq!(failing.await.expect("Failed task outcome should be delivered."), Err("upstream exploded"));
	assert!(matches!(panicking.await, Err(Error::QueueClosed)));
	assert_eq!(healthy.await.expect("Healthy task outcome should be delivered."), Ok(7));
	assert_eq!(queue.stats().dispatched, 3);
}

#[tokio::test(start_paused = true)]
async fn idle_queue_refills_its_quota() {
	let queue = AdmissionQueue::new(2).expect("Queue should start inside a runtime.");

	for _ in 0..2 {
		queue.submit(|| async {}).await.expect("Task outcome should be delivered.");
	}

	time::sleep(Duration::from_secs(2)).await;

	let start = Instant::now();

	queue.submit(|| async {}).await.expect("Task outcome should be delivered.");

	assert!(start.elapsed() < Duration::from_millis(10));
	assert_eq!(queue.stats().throttled, 0);
}
