use std::sync::Arc;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::net::UnixStream;

use super::*;
use crate::scheduler::BackendEntry;

fn test_scheduler() -> Arc<Scheduler> {
    let entry = Arc::new(BackendEntry::new(
        "memory",
        Duration::from_secs(3600),
        Arc::new(|_ctx| -> crate::scheduler::SyncFuture { Box::pin(async { Ok(()) }) }),
    ));
    Scheduler::new(vec![entry], Duration::from_secs(3600), None)
}

async fn round_trip(socket_path: &Path, request: &Request) -> Response {
    let stream = UnixStream::connect(socket_path).await.expect("connect");
    let (read_half, mut write_half) = stream.into_split();
    write_message(&mut write_half, request).await.expect("write request");
    let mut reader = BufReader::new(read_half);
    read_message(&mut reader).await.expect("read response")
}

#[tokio::test]
async fn notify_request_acknowledges_and_wakes_the_scheduler() {
    let dir = tempfile::tempdir().expect("tempdir");
    let socket_path = dir.path().join("control.sock");
    let listener = Listener::bind(&socket_path).expect("bind");
    let scheduler = test_scheduler();
    let kernel = Box::leak(Box::new(ShutdownKernel::new()));

    let handle = tokio::spawn(listener.run(scheduler.clone(), kernel, Duration::from_secs(1)));

    let response = round_trip(&socket_path, &Request::Notify).await;
    assert_eq!(response, Response::Notify { ok: true, error: None });

    kernel.shutdown(Duration::from_secs(1)).await.expect("shutdown");
    handle.await.expect("listener task");
}

#[tokio::test]
async fn status_request_reports_the_scheduler_snapshot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let socket_path = dir.path().join("control.sock");
    let listener = Listener::bind(&socket_path).expect("bind");
    let scheduler = test_scheduler();
    let kernel = Box::leak(Box::new(ShutdownKernel::new()));

    let handle = tokio::spawn(listener.run(scheduler.clone(), kernel, Duration::from_secs(1)));

    let response = round_trip(&socket_path, &Request::Status).await;
    match response {
        Response::Status(snapshot) => {
            assert!(snapshot.running);
            assert!(snapshot.backends.contains_key("memory"));
        }
        other => panic!("expected a status response, got {other:?}"),
    }

    kernel.shutdown(Duration::from_secs(1)).await.expect("shutdown");
    handle.await.expect("listener task");
}

#[tokio::test]
async fn stop_request_triggers_graceful_shutdown() {
    let dir = tempfile::tempdir().expect("tempdir");
    let socket_path = dir.path().join("control.sock");
    let listener = Listener::bind(&socket_path).expect("bind");
    let scheduler = test_scheduler();
    let kernel = Box::leak(Box::new(ShutdownKernel::new()));

    let handle = tokio::spawn(listener.run(scheduler.clone(), kernel, Duration::from_secs(1)));

    let response = round_trip(&socket_path, &Request::Stop).await;
    assert_eq!(response, Response::Stop { ok: true });

    handle.await.expect("listener task should exit once the kernel shuts down");
    assert!(kernel.is_shutting_down());
}

#[tokio::test]
async fn requests_during_shutdown_are_rejected_except_status() {
    let dir = tempfile::tempdir().expect("tempdir");
    let socket_path = dir.path().join("control.sock");
    let listener = Listener::bind(&socket_path).expect("bind");
    let scheduler = test_scheduler();
    let kernel = Box::leak(Box::new(ShutdownKernel::new()));
    kernel.shutdown(Duration::from_secs(1)).await.expect("shutdown up front");

    let handle = tokio::spawn(listener.run(scheduler.clone(), kernel, Duration::from_secs(1)));
    tokio::task::yield_now().await;

    // The accept loop itself observes the already-cancelled token and exits
    // immediately, so there is nothing left to connect to.
    handle.await.expect("listener task");
    assert!(UnixStream::connect(&socket_path).await.is_err());
}

#[tokio::test]
async fn unknown_request_type_gets_the_documented_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let socket_path = dir.path().join("control.sock");
    let listener = Listener::bind(&socket_path).expect("bind");
    let scheduler = test_scheduler();
    let kernel = Box::leak(Box::new(ShutdownKernel::new()));

    let handle = tokio::spawn(listener.run(scheduler.clone(), kernel, Duration::from_secs(1)));

    let response = round_trip(&socket_path, &Request::Unknown).await;
    assert_eq!(response, Response::unknown_method());

    kernel.shutdown(Duration::from_secs(1)).await.expect("shutdown");
    handle.await.expect("listener task");
}
