//! Behavioural tests for the bounded task pool

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agon_queue::TaskPool;
use futures::future::join_all;
use proptest::prelude::*;

/// Tracks how many instrumented tasks are inside their critical section
#[derive(Default)]
struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Peak concurrency and the order in which tasks entered their critical section
async fn run_instrumented(width: usize, durations: Vec<u64>) -> (usize, Vec<usize>) {
    let pool = TaskPool::new(width);
    let gauge = Arc::new(Gauge::default());
    let starts = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = durations
        .into_iter()
        .enumerate()
        .map(|(i, ms)| {
            let gauge = gauge.clone();
            let starts = starts.clone();
            pool.submit(async move {
                gauge.enter();
                starts.lock().unwrap().push(i);
                tokio::time::sleep(Duration::from_millis(ms)).await;
                gauge.exit();
            })
        })
        .collect();

    for result in join_all(handles).await {
        result.expect("task completes");
    }
    let starts = starts.lock().unwrap().clone();
    (gauge.peak.load(Ordering::SeqCst), starts)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn saturates_width_and_starts_queued_tasks_in_order(
        (width, durations) in (1usize..5).prop_flat_map(|width| {
            (Just(width), proptest::collection::vec(1u64..4, width + 1..=width * 4))
        }),
    ) {
        // Single-threaded so that dequeue order is also the order tasks first run
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let submitted = durations.len();
        let (peak, starts) = runtime.block_on(run_instrumented(width, durations));

        prop_assert_eq!(peak, width);
        prop_assert_eq!(starts.len(), submitted);
        prop_assert!(starts[..width].iter().all(|&i| i < width));
        let queued: Vec<usize> = starts.iter().copied().filter(|&i| i >= width).collect();
        prop_assert_eq!(queued, (width..submitted).collect::<Vec<_>>());
    }
}

#[tokio::test]
async fn test_single_slot_completes_in_submission_order() {
    let pool = TaskPool::new(1);
    let order = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = [10u64, 5, 1]
        .into_iter()
        .enumerate()
        .map(|(i, ms)| {
            let order = order.clone();
            pool.submit(async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                order.lock().unwrap().push(i);
            })
        })
        .collect();

    join_all(handles).await;
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
}

#[tokio::test]
async fn test_queued_work_starts_fifo() {
    let pool = TaskPool::new(2);
    let started = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let started = started.clone();
            pool.submit(async move {
                started.lock().unwrap().push(i);
                tokio::time::sleep(Duration::from_millis(3)).await;
                i
            })
        })
        .collect();

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(results, (0..8).collect::<Vec<_>>());

    // Both slots pull from the same queue, so start order is submission order
    let started = started.lock().unwrap().clone();
    assert_eq!(started, (0..8).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_wider_pool_overlaps_work() {
    let (peak, _) = run_instrumented(3, vec![20; 6]).await;
    assert_eq!(peak, 3);
}

#[tokio::test]
async fn test_failures_do_not_cancel_siblings() {
    let pool = TaskPool::new(2);
    let handles: Vec<_> = (0..6)
        .map(|i| {
            pool.submit(async move {
                if i % 3 == 0 {
                    Err(format!("task {} failed", i))
                } else {
                    Ok(i)
                }
            })
        })
        .collect();

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(results.iter().filter(|r| r.is_err()).count(), 2);
    assert_eq!(results[4], Ok(4));
}
