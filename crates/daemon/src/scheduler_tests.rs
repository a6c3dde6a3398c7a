use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use todoat_core::Error;
use todoat_engine::CircuitState;

use super::*;

fn always_ok() -> SyncFn {
    Arc::new(|_ctx| -> SyncFuture { Box::pin(async { Ok(()) }) })
}

fn always_fails(message: &'static str) -> SyncFn {
    Arc::new(move |_ctx| -> SyncFuture { Box::pin(async move { Err(Error::Offline(message.into())) }) })
}

fn counting_failures(counter: Arc<AtomicU32>) -> SyncFn {
    Arc::new(move |_ctx| -> SyncFuture {
        let counter = counter.clone();
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(Error::Offline("down".into()))
        })
    })
}

#[tokio::test]
async fn circuit_opens_after_threshold_consecutive_failures_on_one_backend() {
    let entry = Arc::new(BackendEntry::new("broken", Duration::from_millis(1), always_fails("nope")));
    let scheduler = Scheduler::new(vec![entry.clone()], Duration::from_millis(1), None);

    for _ in 0..CircuitBreaker::<todoat_core::SystemClock>::DEFAULT_THRESHOLD {
        scheduler.perform_backend_sync(&entry).await;
    }

    assert_eq!(entry.circuit_state(), CircuitState::Open);
}

#[tokio::test]
async fn an_open_circuit_blocks_further_attempts_without_calling_the_backend() {
    let calls = Arc::new(AtomicU32::new(0));
    let entry = Arc::new(BackendEntry::new("broken", Duration::from_millis(1), counting_failures(calls.clone())));
    let scheduler = Scheduler::new(vec![entry.clone()], Duration::from_millis(1), None);

    for _ in 0..CircuitBreaker::<todoat_core::SystemClock>::DEFAULT_THRESHOLD {
        scheduler.perform_backend_sync(&entry).await;
    }
    assert_eq!(entry.circuit_state(), CircuitState::Open);
    let calls_before = calls.load(Ordering::SeqCst);

    let (outcome, _) = scheduler.perform_backend_sync(&entry).await;
    assert_eq!(outcome, SyncOutcome::Blocked);
    assert_eq!(calls.load(Ordering::SeqCst), calls_before, "blocked attempt must not invoke the backend");
}

#[tokio::test]
async fn all_backends_failing_for_the_cutoff_threshold_reports_shutdown() {
    let entries: Vec<_> = (0..5)
        .map(|i| Arc::new(BackendEntry::new(format!("backend-{i}"), Duration::from_millis(1), always_fails("down"))))
        .collect();
    let scheduler = Scheduler::new(entries, Duration::from_millis(1), None);
    let kernel = Box::leak(Box::new(ShutdownKernel::new()));

    let tripped = scheduler.run_pass(kernel, false).await;
    assert!(tripped, "five consecutive failures across one pass should trip the cutoff");
}

#[tokio::test]
async fn one_successful_backend_prevents_the_cutoff_from_tripping() {
    let mut entries = vec![Arc::new(BackendEntry::new("good", Duration::from_millis(1), always_ok()))];
    for i in 0..4 {
        entries.push(Arc::new(BackendEntry::new(format!("bad-{i}"), Duration::from_millis(1), always_fails("down"))));
    }
    let scheduler = Scheduler::new(entries, Duration::from_millis(1), None);
    let kernel = Box::leak(Box::new(ShutdownKernel::new()));

    let tripped = scheduler.run_pass(kernel, false).await;
    assert!(!tripped, "a partial success in the pass must not trip the cutoff");
}

#[tokio::test]
async fn notify_coalesces_concurrent_calls_into_a_single_pending_pass() {
    let entry = Arc::new(BackendEntry::new("one", Duration::from_secs(3600), always_ok()));
    let scheduler = Scheduler::new(vec![entry], Duration::from_secs(3600), None);

    scheduler.notify();
    scheduler.notify();
    scheduler.notify();

    let mut rx = scheduler.notify_rx.lock().take().expect("receiver available");
    assert!(rx.try_recv().is_ok(), "first notify should be queued");
    assert!(rx.try_recv().is_err(), "further notifies should have collapsed into the pending one");
}

#[tokio::test]
async fn successful_sync_updates_entry_bookkeeping() {
    let entry = Arc::new(BackendEntry::new("good", Duration::from_millis(1), always_ok()));
    let scheduler = Scheduler::new(vec![entry.clone()], Duration::from_millis(1), None);

    let (outcome, cutoff_outcome) = scheduler.perform_backend_sync(&entry).await;
    assert_eq!(outcome, SyncOutcome::Success);
    assert_eq!(cutoff_outcome, CutoffOutcome::Continue);
    assert_eq!(entry.sync_count(), 1);
    assert_eq!(entry.circuit_state(), CircuitState::Closed);
}

#[tokio::test]
async fn task_timeout_counts_as_a_failure_and_advances_the_circuit() {
    let slow: SyncFn = Arc::new(|_ctx| -> SyncFuture {
        Box::pin(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        })
    });
    let entry = Arc::new(BackendEntry::new("slow", Duration::from_millis(1), slow));
    let scheduler = Scheduler::new(vec![entry.clone()], Duration::from_millis(1), Some(Duration::from_millis(5)));

    let (outcome, _) = scheduler.perform_backend_sync(&entry).await;
    assert_eq!(outcome, SyncOutcome::Failure);
    assert_eq!(entry.circuit.failure_count(), 1);
}

#[tokio::test]
async fn task_timeout_fires_the_on_task_timeout_callback_with_name_and_elapsed() {
    let slow: SyncFn = Arc::new(|_ctx| -> SyncFuture {
        Box::pin(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        })
    });
    let entry = Arc::new(BackendEntry::new("slow", Duration::from_millis(1), slow));
    let scheduler = Scheduler::new(vec![entry.clone()], Duration::from_millis(1), Some(Duration::from_millis(5)));

    let seen: Arc<Mutex<Option<(String, Duration)>>> = Arc::new(Mutex::new(None));
    let seen_for_callback = seen.clone();
    scheduler.set_on_task_timeout(Arc::new(move |name, elapsed| {
        *seen_for_callback.lock() = Some((name.to_string(), elapsed));
    }));

    scheduler.perform_backend_sync(&entry).await;

    let (name, elapsed) = seen.lock().clone().expect("callback should have fired");
    assert_eq!(name, "slow");
    assert!(elapsed >= Duration::from_millis(5));
}

#[tokio::test]
async fn stuck_backends_reports_a_claim_older_than_stuck_timeout() {
    let (release_tx, release_rx) = tokio::sync::oneshot::channel();
    let release_rx = Arc::new(tokio::sync::Mutex::new(Some(release_rx)));
    let slow: SyncFn = Arc::new(move |_ctx| -> SyncFuture {
        let release_rx = release_rx.clone();
        Box::pin(async move {
            let rx = release_rx.lock().await.take().expect("sync_fn called once");
            let _ = rx.await;
            Ok(())
        })
    });
    let entry = Arc::new(BackendEntry::new("hung", Duration::from_millis(1), slow));
    // No task_timeout configured: the only thing that can notice a hang.
    let scheduler = Scheduler::new(vec![entry.clone()], Duration::from_millis(1), None);

    let running = {
        let scheduler = scheduler.clone();
        let entry = entry.clone();
        tokio::spawn(async move { scheduler.perform_backend_sync(&entry).await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(scheduler.stuck_backends(Duration::from_millis(10), true), vec!["hung".to_string()]);
    assert!(scheduler.stuck_backends(Duration::from_secs(3600), true).is_empty(), "not stuck against a longer timeout");

    let _ = release_tx.send(());
    running.await.expect("sync task");
    assert!(scheduler.stuck_backends(Duration::from_millis(10), true).is_empty(), "claim released once the sync completes");
}

#[tokio::test]
async fn on_task_timeout_is_not_fired_for_a_non_timeout_failure() {
    let calls = Arc::new(AtomicU32::new(0));
    let entry = Arc::new(BackendEntry::new("broken", Duration::from_millis(1), always_fails("offline")));
    let scheduler = Scheduler::new(vec![entry.clone()], Duration::from_millis(1), None);

    let calls_for_callback = calls.clone();
    scheduler.set_on_task_timeout(Arc::new(move |_name, _elapsed| {
        calls_for_callback.fetch_add(1, Ordering::SeqCst);
    }));

    scheduler.perform_backend_sync(&entry).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
