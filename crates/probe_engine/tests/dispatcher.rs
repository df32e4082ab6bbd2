use std::sync::Arc;
use std::time::Duration;

use probe_core::WorkItem;
use probe_engine::{BatchGovernor, DispatchError, Dispatcher, RunState, SteadyGovernor};
use tokio::sync::mpsc;
use tokio::time::Instant;

fn items(n: usize) -> Vec<WorkItem> {
    (0..n).map(|i| WorkItem::new(format!("id{i}"))).collect()
}

#[tokio::test(start_paused = true)]
async fn admits_in_input_order_then_closes_queue() {
    let (tx, mut rx) = mpsc::channel(16);
    let run_state = Arc::new(RunState::new(5));
    let dispatcher = Dispatcher::new(
        Box::new(SteadyGovernor::new(Duration::from_millis(10))),
        tx,
        run_state.clone(),
    );

    let report = dispatcher.run(items(5)).await.unwrap();
    assert_eq!(report.admitted, 5);
    assert_eq!(report.pauses, 4);
    assert_eq!(run_state.admitted(), 5);
    assert_eq!(run_state.pending(), 0);
    assert_eq!(run_state.produced(), 0);
    assert!(!run_state.is_completed());

    let mut received = Vec::new();
    while let Some(item) = rx.recv().await {
        received.push(item);
    }
    assert_eq!(received, items(5));
}

#[tokio::test(start_paused = true)]
async fn empty_input_only_closes_queue() {
    let (tx, mut rx) = mpsc::channel::<WorkItem>(1);
    let dispatcher = Dispatcher::new(
        Box::new(BatchGovernor::new(3, Duration::from_secs(1))),
        tx,
        Arc::new(RunState::new(0)),
    );

    let report = dispatcher.run(Vec::new()).await.unwrap();
    assert_eq!(report.admitted, 0);
    assert_eq!(report.pauses, 0);
    assert!(rx.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn bounded_queue_applies_backpressure() {
    let (tx, mut rx) = mpsc::channel(1);
    let run_state = Arc::new(RunState::new(3));
    let dispatcher = Dispatcher::new(
        Box::new(SteadyGovernor::new(Duration::ZERO)),
        tx,
        run_state.clone(),
    );

    let handle = tokio::spawn(dispatcher.run(items(3)));
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
    // One item fits in the queue; the dispatcher is parked on the second.
    assert_eq!(run_state.admitted(), 1);
    assert_eq!(run_state.pending(), 2);

    let mut received = 0;
    while rx.recv().await.is_some() {
        received += 1;
    }
    assert_eq!(received, 3);
    assert_eq!(handle.await.unwrap().unwrap().admitted, 3);
}

#[tokio::test(start_paused = true)]
async fn reports_undelivered_items_when_consumers_are_gone() {
    let (tx, rx) = mpsc::channel(4);
    drop(rx);
    let dispatcher = Dispatcher::new(
        Box::new(SteadyGovernor::new(Duration::ZERO)),
        tx,
        Arc::new(RunState::new(3)),
    );

    let err = dispatcher.run(items(3)).await.unwrap_err();
    assert_eq!(err, DispatchError::QueueClosed { undelivered: 3 });
}

#[tokio::test(start_paused = true)]
async fn full_queue_does_not_shorten_the_next_interval() {
    let interval = Duration::from_secs(3);
    let (tx, mut rx) = mpsc::channel(1);
    let dispatcher = Dispatcher::new(
        Box::new(SteadyGovernor::new(interval)),
        tx,
        Arc::new(RunState::new(3)),
    );
    let handle = tokio::spawn(dispatcher.run(items(3)));

    // Slow consumer: the second item stays blocked on the full queue until here.
    tokio::time::sleep(Duration::from_millis(5_900)).await;
    let mut received_at = Vec::new();
    while rx.recv().await.is_some() {
        received_at.push(Instant::now());
    }
    handle.await.unwrap().unwrap();

    assert_eq!(received_at.len(), 3);
    assert!(
        received_at[2] - received_at[1] >= interval,
        "third item reached the queue {:?} after the second",
        received_at[2] - received_at[1]
    );
}
