mod common;

use common::{descriptor, loan_properties, FakeRuntime, Harness};
use decision_mcp_server::diagnostics::SyncEvent;
use decision_mcp_server::poll::{PollScheduler, TickOutcome};
use std::sync::Arc;
use std::time::Duration;

fn scheduler(h: &Harness, interval: Duration) -> PollScheduler {
    PollScheduler::new(h.sync.clone(), interval, Arc::new(h.reporter.clone()))
}

#[tokio::test]
async fn tick_during_a_running_pass_is_dropped() {
    let runtime = FakeRuntime::new();
    runtime.deploy("development", "loans/v1", descriptor("Loans", &[("approval", loan_properties())]));
    let h = Harness::new(runtime.clone(), &["development"]);
    let scheduler = scheduler(&h, Duration::from_secs(3600));

    runtime.hold_listing();
    let TickOutcome::Started(first) = scheduler.tick() else {
        panic!("first tick should start a pass");
    };
    while runtime.list_calls() == 0 {
        tokio::task::yield_now().await;
    }

    assert!(scheduler.is_busy());
    assert!(matches!(scheduler.tick(), TickOutcome::Skipped));
    assert_eq!(runtime.list_calls(), 1);
    assert_eq!(h.registry.revision().await, 0);

    runtime.release_listing();
    first.await.unwrap();
    assert!(!scheduler.is_busy());
    assert_eq!(h.names().await, vec!["Loans_approval"]);

    let TickOutcome::Started(next) = scheduler.tick() else {
        panic!("idle scheduler should start a pass");
    };
    next.await.unwrap();
    assert_eq!(runtime.list_calls(), 2);
}

#[tokio::test]
async fn failed_pass_is_reported_and_releases_the_latch() {
    let runtime = FakeRuntime::new();
    runtime.deploy("development", "svc", descriptor("svc", &[("approval", loan_properties())]));
    runtime.deploy("production", "svc", descriptor("svc", &[("approval", loan_properties())]));
    let h = Harness::new(runtime, &["development", "production"]);
    let scheduler = scheduler(&h, Duration::from_secs(3600));

    let TickOutcome::Started(pass) = scheduler.tick() else {
        panic!("tick should start a pass");
    };
    pass.await.unwrap();

    assert!(!scheduler.is_busy());
    assert!(h.registry.is_empty().await);
    assert!(matches!(
        h.reporter.events().as_slice(),
        [SyncEvent::PassFailed { .. }]
    ));
}

#[tokio::test]
async fn timer_polls_until_stopped() {
    let runtime = FakeRuntime::new();
    runtime.deploy("development", "loans/v1", descriptor("Loans", &[("approval", loan_properties())]));
    let h = Harness::new(runtime.clone(), &["development"]);
    let mut scheduler = scheduler(&h, Duration::from_millis(40));

    scheduler.start();
    assert_eq!(runtime.list_calls(), 0, "first tick waits one interval");
    tokio::time::sleep(Duration::from_millis(200)).await;
    scheduler.stop().await;
    assert!(runtime.list_calls() >= 1);
    assert_eq!(h.names().await, vec!["Loans_approval"]);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let settled = runtime.list_calls();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(runtime.list_calls(), settled);
}

#[tokio::test]
async fn panicking_pass_is_reported_and_releases_the_latch() {
    let runtime = FakeRuntime::new();
    runtime.deploy("development", "loans/v1", descriptor("Loans", &[("approval", loan_properties())]));
    runtime.panic_on_listing("development");
    let h = Harness::new(runtime.clone(), &["development"]);
    let scheduler = scheduler(&h, Duration::from_secs(3600));

    let TickOutcome::Started(pass) = scheduler.tick() else {
        panic!("tick should start a pass");
    };
    pass.await.unwrap();

    assert!(!scheduler.is_busy());
    assert!(h.registry.is_empty().await);
    match h.reporter.events().as_slice() {
        [SyncEvent::PassFailed { error }] => assert!(error.starts_with("pass panicked"), "{error}"),
        other => panic!("expected one failed pass, got {other:?}"),
    }
    let TickOutcome::Started(again) = scheduler.tick() else {
        panic!("released latch should admit the next pass");
    };
    again.await.unwrap();
    assert_eq!(h.reporter.events().len(), 2);
}
